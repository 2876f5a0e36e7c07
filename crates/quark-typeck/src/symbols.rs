//! The symbol table: fully-qualified registration and reference resolution.
//!
//! `add` indexes every declaration under its dotted fully-qualified name
//! (`::` joins a native function's target segment). `resolve` then walks
//! every file once, classifying each identifier's binding kind by searching
//! enclosing scopes: locals, the enclosing callable's parameters, the
//! enclosing class's members, enclosing namespaces, imported namespaces,
//! the root.

use indexmap::IndexMap;
use quark_common::Errors;
use quark_ast::expr::{Expression, NativeBlock, NativeChunk};
use quark_ast::item::{
    Declaration, Definition, Field, File, MethodBody, Param, TypeExpr, TypeParam,
};
use quark_ast::stmt::{Block, Statement};
use quark_ast::walk::{AnyNode, Parents};
use quark_ast::NodeId;
use rustc_hash::FxHashMap;

use crate::diagnostics::render_symbol_error;
use crate::error::SymbolError;

/// How one identifier use binds.
#[derive(Debug, Clone)]
pub enum Binding {
    Param(Param),
    Local(Declaration),
    Field(Field),
    /// `self` inside a class, interface or primitive.
    SelfRef { of: String },
    /// A primitive named in value position, acting as its reference wrapper.
    Boxed { of: String },
    /// A field whose declared value is an explicit `null`: semantically
    /// absent, references lower to a typed null.
    Nulled(Field),
    TypeParam { fq: String },
    Function { fq: String },
    Method { fq: String },
    /// A class or interface named in value position.
    Type { fq: String },
}

/// The definition index and the per-node resolution maps.
#[derive(Debug, Default)]
pub struct Symbols {
    /// Every definition, keyed by fully-qualified name, in registration
    /// order.
    pub definitions: IndexMap<String, Definition>,
    resolution: FxHashMap<NodeId, Binding>,
    type_targets: FxHashMap<NodeId, String>,
    parent_of: FxHashMap<String, String>,
    files: Vec<File>,
}

impl Symbols {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every declaration in `file`.
    pub fn add(&mut self, file: File, errors: &mut Errors) {
        for def in &file.definitions {
            self.register("", def, errors);
        }
        self.files.push(file);
    }

    fn register(&mut self, path: &str, def: &Definition, errors: &mut Errors) {
        let name = def.name().text.clone();
        let fq = match def {
            Definition::NativeFunction(_) if !path.is_empty() => format!("{path}::{name}"),
            _ if path.is_empty() => name.clone(),
            _ => format!("{path}.{name}"),
        };
        match def {
            Definition::Package(p) => {
                self.insert(&fq, path, def, errors);
                for file in &p.files {
                    for d in &file.definitions {
                        self.register(path, d, errors);
                    }
                }
            }
            Definition::Namespace(ns) => {
                // Same-named namespaces merge; the first registration wins
                // and later members land under the shared path.
                if !self.definitions.contains_key(&fq) {
                    self.insert(&fq, path, def, errors);
                }
                for d in &ns.definitions {
                    self.register(&fq, d, errors);
                }
            }
            Definition::Class(_) | Definition::Interface(_) | Definition::Primitive(_) => {
                self.insert(&fq, path, def, errors);
                self.register_type_params(&fq, def.type_params());
                for d in members_of(def) {
                    self.register(&fq, d, errors);
                }
            }
            Definition::Function(f) => {
                self.insert(&fq, path, def, errors);
                self.register_type_params(&fq, &f.type_params);
            }
            _ => {
                self.insert(&fq, path, def, errors);
            }
        }
    }

    fn register_type_params(&mut self, owner: &str, params: &[TypeParam]) {
        for p in params {
            let fq = format!("{owner}.{}", p.name.text);
            self.definitions
                .insert(fq.clone(), Definition::TypeParam(p.clone()));
            self.parent_of.insert(fq, owner.to_string());
        }
    }

    fn insert(&mut self, fq: &str, parent: &str, def: &Definition, errors: &mut Errors) {
        if self.definitions.contains_key(fq) {
            errors.add(render_symbol_error(&SymbolError::Duplicate {
                fq: fq.to_string(),
                span: def.span(),
            }));
            return;
        }
        self.definitions.insert(fq.to_string(), def.clone());
        if !parent.is_empty() {
            self.parent_of.insert(fq.to_string(), parent.to_string());
        }
    }

    /// Resolve every identifier in every added file.
    pub fn resolve(&mut self, errors: &mut Errors) {
        let files = std::mem::take(&mut self.files);
        let (resolution, type_targets) = {
            let mut r = Resolver::new(self, errors);
            for file in &files {
                r.file(file);
            }
            (r.resolution, r.type_targets)
        };
        self.resolution = resolution;
        self.type_targets = type_targets;
        self.files = files;
    }

    pub fn get(&self, fq: &str) -> Option<&Definition> {
        self.definitions.get(fq)
    }

    /// The binding recorded for an identifier node.
    pub fn binding(&self, id: NodeId) -> Option<&Binding> {
        self.resolution.get(&id)
    }

    /// The fully-qualified target recorded for a type reference node.
    pub fn type_target(&self, id: NodeId) -> Option<&String> {
        self.type_targets.get(&id)
    }

    pub fn parent_fq(&self, fq: &str) -> Option<&String> {
        self.parent_of.get(fq)
    }

    pub fn parent_def(&self, fq: &str) -> Option<&Definition> {
        self.definitions.get(self.parent_of.get(fq)?)
    }

    /// Structural parent queries over every added file.
    pub fn parents(&self) -> Parents<'_> {
        Parents::from_roots(self.files.iter().map(AnyNode::File))
    }

    /// Whether a definition is compiled at top level.
    ///
    /// Classes and interfaces always are; functions only with a body;
    /// methods only when the parent is a primitive, a body is present and a
    /// return type is declared.
    pub fn is_top(&self, fq: &str, def: &Definition) -> bool {
        match def {
            Definition::Class(_) | Definition::Interface(_) => true,
            Definition::Function(f) => f.body.is_some(),
            Definition::NativeFunction(f) => f.body.is_some(),
            Definition::Method(m) => {
                m.body.is_some()
                    && m.ty.is_some()
                    && matches!(self.parent_def(fq), Some(Definition::Primitive(_)))
            }
            _ => false,
        }
    }

    /// Formal type parameters of a definition, as refs named under it.
    pub fn formals(&self, fq: &str) -> Vec<crate::ty::Ref> {
        self.get(fq)
            .map(|d| {
                d.type_params()
                    .iter()
                    .map(|p| crate::ty::Ref::new(format!("{fq}.{}", p.name.text)))
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn members_of(def: &Definition) -> &[Definition] {
    match def {
        Definition::Class(c) => &c.members,
        Definition::Interface(i) => &i.members,
        Definition::Primitive(p) => &p.members,
        _ => &[],
    }
}

fn find_member<'d>(def: &'d Definition, name: &str) -> Option<&'d Definition> {
    members_of(def).iter().find(|m| m.name().text == name)
}

// ── Resolver ─────────────────────────────────────────────────────────────

struct Resolver<'a> {
    symbols: &'a Symbols,
    errors: &'a mut Errors,
    resolution: FxHashMap<NodeId, Binding>,
    type_targets: FxHashMap<NodeId, String>,
    /// Enclosing namespace segments.
    path: Vec<String>,
    /// Imported namespace paths of the current file.
    imports: Vec<String>,
    /// Enclosing class/interface/primitive fqnames, innermost last.
    types_stack: Vec<String>,
    /// Owners of in-scope formal type parameters, innermost last.
    tparam_owners: Vec<String>,
    /// Local scopes: parameters and declarations, innermost last.
    frames: Vec<FxHashMap<String, Binding>>,
}

impl<'a> Resolver<'a> {
    fn new(symbols: &'a Symbols, errors: &'a mut Errors) -> Self {
        Self {
            symbols,
            errors,
            resolution: FxHashMap::default(),
            type_targets: FxHashMap::default(),
            path: Vec::new(),
            imports: Vec::new(),
            types_stack: Vec::new(),
            tparam_owners: Vec::new(),
            frames: Vec::new(),
        }
    }

    fn file(&mut self, file: &File) {
        let imports = file
            .imports
            .iter()
            .map(|i| quark_ast::dotted(&i.path))
            .collect();
        let saved = std::mem::replace(&mut self.imports, imports);
        for def in &file.definitions {
            self.definition(def);
        }
        self.imports = saved;
    }

    fn definition(&mut self, def: &Definition) {
        match def {
            Definition::Package(p) => {
                for file in &p.files {
                    self.file(file);
                }
            }
            Definition::Namespace(ns) => {
                self.path.push(ns.name.text.clone());
                for d in &ns.definitions {
                    self.definition(d);
                }
                self.path.pop();
            }
            Definition::Class(_) | Definition::Interface(_) | Definition::Primitive(_) => {
                let fq = self.child_fq(&def.name().text);
                self.types_stack.push(fq);
                if let Definition::Class(c) = def {
                    for b in &c.bases {
                        self.type_expr(b);
                    }
                }
                if let Definition::Interface(i) = def {
                    for b in &i.bases {
                        self.type_expr(b);
                    }
                }
                for m in members_of(def) {
                    self.definition(m);
                }
                if let Definition::Primitive(p) = def {
                    for mapping in &p.mappings {
                        self.native_block(mapping);
                    }
                }
                self.types_stack.pop();
            }
            Definition::Function(f) => {
                let fq = self.child_fq(&f.name.text);
                if !f.type_params.is_empty() {
                    self.tparam_owners.push(fq);
                }
                self.type_expr(&f.ty);
                self.callable(&f.params, |r| {
                    if let Some(body) = &f.body {
                        r.block(body);
                    }
                });
                if !f.type_params.is_empty() {
                    self.tparam_owners.pop();
                }
            }
            Definition::NativeFunction(f) => {
                self.type_expr(&f.ty);
                self.callable(&f.params, |r| {
                    if let Some(body) = &f.body {
                        r.native_block(body);
                    }
                });
            }
            Definition::Method(m) => {
                if let Some(t) = &m.ty {
                    self.type_expr(t);
                }
                self.callable(&m.params, |r| match &m.body {
                    Some(MethodBody::Block(b)) => r.block(b),
                    Some(MethodBody::Native(b)) => r.native_block(b),
                    None => {}
                });
            }
            Definition::Field(f) => {
                self.type_expr(&f.ty);
                if let Some(v) = &f.value {
                    self.expression(v);
                }
            }
            Definition::TypeParam(_) => {}
        }
    }

    fn callable(&mut self, params: &[Param], body: impl FnOnce(&mut Self)) {
        let mut frame = FxHashMap::default();
        for p in params {
            self.type_expr(&p.ty);
            frame.insert(p.name.text.clone(), Binding::Param(p.clone()));
        }
        self.frames.push(frame);
        body(self);
        self.frames.pop();
    }

    fn block(&mut self, block: &Block) {
        self.frames.push(FxHashMap::default());
        for stmt in &block.statements {
            self.statement(stmt);
        }
        self.frames.pop();
    }

    fn statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::If(i) => {
                self.expression(&i.predicate);
                self.block(&i.consequence);
                if let Some(alt) = &i.alternative {
                    self.block(alt);
                }
            }
            Statement::While(w) => {
                self.expression(&w.condition);
                self.block(&w.body);
            }
            Statement::Switch(sw) => {
                self.expression(&sw.expr);
                for case in &sw.cases {
                    for e in &case.exprs {
                        self.expression(e);
                    }
                    self.block(&case.body);
                }
            }
            Statement::Local(l) => {
                let d = &l.declaration;
                self.type_expr(&d.ty);
                if let Some(v) = &d.value {
                    self.expression(v);
                }
                // Visible only after its own initializer.
                if let Some(frame) = self.frames.last_mut() {
                    frame.insert(d.name.text.clone(), Binding::Local(d.clone()));
                }
            }
            Statement::Assign(a) => {
                self.expression(&a.lhs);
                self.expression(&a.rhs);
            }
            Statement::Expr(e) => self.expression(&e.expr),
            Statement::Return(r) => {
                if let Some(e) = &r.expr {
                    self.expression(e);
                }
            }
            Statement::Break(_) | Statement::Continue(_) => {}
        }
    }

    fn expression(&mut self, expr: &Expression) {
        match expr {
            Expression::Var(v) => {
                if let Some(binding) = self.lookup_value(&v.name.text, v.span) {
                    self.resolution.insert(v.id, binding);
                } else {
                    let err = SymbolError::Unresolved {
                        name: v.name.text.clone(),
                        span: v.span,
                    };
                    self.errors.add(render_symbol_error(&err));
                }
            }
            Expression::Call(c) => {
                self.expression(&c.expr);
                for a in &c.args {
                    self.expression(a);
                }
            }
            Expression::Attr(a) => self.expression(&a.expr),
            Expression::List(l) => {
                for e in &l.elements {
                    self.expression(e);
                }
            }
            Expression::Map(m) => {
                for entry in &m.entries {
                    self.expression(&entry.key);
                    self.expression(&entry.value);
                }
            }
            Expression::Type(t) => self.type_expr(t),
            Expression::Number(_)
            | Expression::String(_)
            | Expression::Bool(_)
            | Expression::Null(_) => {}
        }
    }

    fn native_block(&mut self, block: &NativeBlock) {
        for chunk in &block.chunks {
            if let NativeChunk::Var(v) = chunk {
                if let Some(binding) = self.lookup_value(&v.name.text, v.span) {
                    self.resolution.insert(v.id, binding);
                } else {
                    let err = SymbolError::Unresolved {
                        name: v.name.text.clone(),
                        span: v.span,
                    };
                    self.errors.add(render_symbol_error(&err));
                }
            }
        }
    }

    fn child_fq(&self, name: &str) -> String {
        if self.path.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.path.join("."), name)
        }
    }

    // ── Lookup ─────────────────────────────────────────────────────────

    fn lookup_value(&mut self, name: &str, span: quark_common::Span) -> Option<Binding> {
        for frame in self.frames.iter().rev() {
            if let Some(b) = frame.get(name) {
                return Some(b.clone());
            }
        }
        if name == "self" {
            if let Some(of) = self.types_stack.last() {
                return Some(Binding::SelfRef { of: of.clone() });
            }
        }
        // Formal type parameters named in value position.
        for owner in self.types_stack.iter().chain(self.tparam_owners.iter()).rev() {
            let fq = format!("{owner}.{name}");
            if matches!(self.symbols.get(&fq), Some(Definition::TypeParam(_))) {
                return Some(Binding::TypeParam { fq });
            }
        }
        for owner in self.types_stack.iter().rev() {
            let Some(def) = self.symbols.get(owner) else {
                continue;
            };
            if let Some(member) = find_member(def, name) {
                return Some(member_binding(member, owner));
            }
        }
        // Namespace chain, innermost first, then the root.
        for depth in (0..=self.path.len()).rev() {
            let prefix = self.path[..depth].join(".");
            if let Some(b) = self.value_in(&prefix, name) {
                return Some(b);
            }
        }
        // Imported namespaces; more than one hit is ambiguous.
        let mut hits: Vec<(String, Binding)> = Vec::new();
        for imp in &self.imports {
            if let Some(b) = self.value_in(imp, name) {
                hits.push((imp.clone(), b));
            }
        }
        match hits.len() {
            0 => None,
            1 => Some(hits.remove(0).1),
            _ => {
                let err = SymbolError::Ambiguous {
                    name: name.to_string(),
                    candidates: hits.into_iter().map(|(ns, _)| ns).collect(),
                    span,
                };
                self.errors.add(render_symbol_error(&err));
                None
            }
        }
    }

    fn value_in(&self, prefix: &str, name: &str) -> Option<Binding> {
        let dotted = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        };
        if let Some(def) = self.symbols.get(&dotted) {
            return value_binding(def, &dotted);
        }
        if !prefix.is_empty() {
            let native = format!("{prefix}::{name}");
            if let Some(def) = self.symbols.get(&native) {
                return value_binding(def, &native);
            }
        }
        None
    }

    fn type_expr(&mut self, te: &TypeExpr) {
        for p in &te.params {
            self.type_expr(p);
        }
        let Some(first) = te.name.first() else {
            return;
        };
        let Some(mut fq) = self.lookup_type_head(&first.text, te.span) else {
            let err = SymbolError::Unresolved {
                name: te.path(),
                span: te.span,
            };
            self.errors.add(render_symbol_error(&err));
            return;
        };
        // Remaining segments walk namespaces down to a type.
        for seg in &te.name[1..] {
            fq = format!("{fq}.{}", seg.text);
        }
        if matches!(
            self.symbols.get(&fq),
            Some(
                Definition::Class(_)
                    | Definition::Interface(_)
                    | Definition::Primitive(_)
                    | Definition::TypeParam(_)
            )
        ) {
            self.type_targets.insert(te.id, fq);
        } else {
            let err = SymbolError::Unresolved {
                name: te.path(),
                span: te.span,
            };
            self.errors.add(render_symbol_error(&err));
        }
    }

    fn lookup_type_head(&mut self, name: &str, span: quark_common::Span) -> Option<String> {
        // Formal type parameters of enclosing types and callables.
        for owner in self.types_stack.iter().chain(self.tparam_owners.iter()).rev() {
            let fq = format!("{owner}.{name}");
            if matches!(self.symbols.get(&fq), Some(Definition::TypeParam(_))) {
                return Some(fq);
            }
        }
        for depth in (0..=self.path.len()).rev() {
            let prefix = self.path[..depth].join(".");
            let fq = if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{prefix}.{name}")
            };
            if matches!(
                self.symbols.get(&fq),
                Some(
                    Definition::Class(_)
                        | Definition::Interface(_)
                        | Definition::Primitive(_)
                        | Definition::Namespace(_)
                )
            ) {
                return Some(fq);
            }
        }
        let mut hits: Vec<String> = Vec::new();
        for imp in &self.imports {
            let fq = format!("{imp}.{name}");
            if matches!(
                self.symbols.get(&fq),
                Some(
                    Definition::Class(_)
                        | Definition::Interface(_)
                        | Definition::Primitive(_)
                        | Definition::Namespace(_)
                )
            ) {
                hits.push(fq);
            }
        }
        match hits.len() {
            0 => None,
            1 => Some(hits.remove(0)),
            _ => {
                let err = SymbolError::Ambiguous {
                    name: name.to_string(),
                    candidates: hits,
                    span,
                };
                self.errors.add(render_symbol_error(&err));
                None
            }
        }
    }
}

fn member_binding(member: &Definition, owner: &str) -> Binding {
    match member {
        Definition::Field(f) => {
            if matches!(f.value, Some(Expression::Null(_))) {
                Binding::Nulled(f.clone())
            } else {
                Binding::Field(f.clone())
            }
        }
        Definition::Method(m) => Binding::Method {
            fq: format!("{owner}.{}", m.name.text),
        },
        _ => Binding::Type {
            fq: format!("{owner}.{}", member.name().text),
        },
    }
}

fn value_binding(def: &Definition, fq: &str) -> Option<Binding> {
    match def {
        Definition::Function(_) | Definition::NativeFunction(_) => Some(Binding::Function {
            fq: fq.to_string(),
        }),
        Definition::Primitive(_) => Some(Binding::Boxed { of: fq.to_string() }),
        Definition::Class(_) | Definition::Interface(_) => Some(Binding::Type {
            fq: fq.to_string(),
        }),
        // Namespaces are not values.
        _ => None,
    }
}
