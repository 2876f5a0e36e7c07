//! The type checker: a syntax-directed walk over every body.
//!
//! Expression shapes determine expected member lookups; every expression
//! resolves to exactly one ref, recorded in the typespace's node map. When
//! an inferred type differs from its expected type but the inferred type's
//! member table carries a zero-argument coercion to the expected type, the
//! conversion map is populated instead of reporting a mismatch.

use quark_common::{Errors, Span};
use quark_ast::expr::{Expression, NativeBlock, NativeChunk};
use quark_ast::item::{Definition, Method, MethodBody, TypeExpr};
use quark_ast::stmt::{Block, Statement};

use crate::construct::resolve_type_expr;
use crate::diagnostics::render_type_error;
use crate::error::TypeError;
use crate::symbols::{Binding, Symbols};
use crate::ty::{Ref, ANY, BOOL, FLOAT, INT, LIST, MAP, STRING, VOID};
use crate::typespace::{Callable, TypeNode, Typespace};

/// Check every registered definition.
pub fn check_all(symbols: &Symbols, types: &mut Typespace, errors: &mut Errors) {
    let mut checker = Checker {
        symbols,
        types,
        errors,
    };
    for (fq, def) in &symbols.definitions {
        checker.definition(fq, def);
    }
}

struct Checker<'a> {
    symbols: &'a Symbols,
    types: &'a mut Typespace,
    errors: &'a mut Errors,
}

impl<'a> Checker<'a> {
    fn definition(&mut self, fq: &str, def: &Definition) {
        match def {
            Definition::Function(f) => {
                let Some(result) = self.resolve(&f.ty) else {
                    return;
                };
                if let Some(body) = &f.body {
                    self.block(body, &result);
                }
            }
            Definition::NativeFunction(f) => {
                if let Some(body) = &f.body {
                    self.native_block(body);
                }
            }
            Definition::Method(m) => self.method(fq, m),
            Definition::Field(f) => {
                let Some(declared) = self.resolve(&f.ty) else {
                    return;
                };
                if let Some(v) = &f.value {
                    self.check_expr(v, Some(&declared));
                }
            }
            Definition::Primitive(p) => {
                for mapping in &p.mappings {
                    self.native_block(mapping);
                }
            }
            _ => {}
        }
    }

    fn method(&mut self, fq: &str, m: &Method) {
        if matches!(self.symbols.parent_def(fq), Some(Definition::Interface(_))) {
            if m.ty.is_none() || m.body.is_some() {
                self.error(TypeError::InterfaceMethodShape {
                    name: m.name.text.clone(),
                    span: m.span,
                });
            }
            return;
        }
        let result = match &m.ty {
            Some(t) => match self.resolve(t) {
                Some(r) => r,
                None => return,
            },
            None => match self.symbols.parent_fq(fq) {
                Some(parent) => Ref::with(parent.clone(), self.symbols.formals(parent)),
                None => return,
            },
        };
        match &m.body {
            Some(MethodBody::Block(b)) => self.block(b, &result),
            Some(MethodBody::Native(b)) => self.native_block(b),
            None => {}
        }
    }

    fn native_block(&mut self, block: &NativeBlock) {
        for chunk in &block.chunks {
            if let NativeChunk::Var(v) = chunk {
                if let Some(binding) = self.symbols.binding(v.id).cloned() {
                    if let Some(r) = self.binding_ref(&binding) {
                        self.types.set_type(v.id, r);
                    }
                }
            }
        }
    }

    // ── Statements ─────────────────────────────────────────────────────

    fn block(&mut self, block: &Block, result: &Ref) {
        for stmt in &block.statements {
            self.statement(stmt, result);
        }
    }

    fn statement(&mut self, stmt: &Statement, result: &Ref) {
        match stmt {
            Statement::If(i) => {
                self.check_expr(&i.predicate, Some(&Ref::new(BOOL)));
                self.block(&i.consequence, result);
                if let Some(alt) = &i.alternative {
                    self.block(alt, result);
                }
            }
            Statement::While(w) => {
                self.check_expr(&w.condition, Some(&Ref::new(BOOL)));
                self.block(&w.body, result);
            }
            Statement::Switch(sw) => {
                let Some(scrutinee) = self.check_expr(&sw.expr, None) else {
                    return;
                };
                let eq_param = self.eq_param_type(&scrutinee, sw.expr.span());
                for case in &sw.cases {
                    for e in &case.exprs {
                        self.check_expr(e, eq_param.as_ref());
                    }
                    self.block(&case.body, result);
                }
            }
            Statement::Local(l) => {
                let d = &l.declaration;
                let Some(declared) = self.resolve(&d.ty) else {
                    return;
                };
                self.types.set_type(l.id, declared.clone());
                self.types.set_type(d.id, declared.clone());
                if let Some(v) = &d.value {
                    self.check_expr(v, Some(&declared));
                }
            }
            Statement::Assign(a) => {
                let Some(target) = self.check_expr(&a.lhs, None) else {
                    return;
                };
                self.check_expr(&a.rhs, Some(&target));
            }
            Statement::Expr(e) => {
                self.check_expr(&e.expr, None);
            }
            Statement::Return(r) => match &r.expr {
                Some(e) => {
                    self.check_expr(e, Some(result));
                }
                None => {
                    if result.name != VOID {
                        self.error(TypeError::Mismatch {
                            expected: result.clone(),
                            found: Ref::new(VOID),
                            span: r.span,
                        });
                    }
                }
            },
            Statement::Break(_) | Statement::Continue(_) => {}
        }
    }

    /// The parameter type of the scrutinee's `__eq__`, which every case
    /// expression checks against.
    fn eq_param_type(&mut self, scrutinee: &Ref, span: Span) -> Option<Ref> {
        let Some(member) = self.types.member_ref(scrutinee, "__eq__") else {
            self.error(TypeError::MissingMember {
                ty: scrutinee.clone(),
                member: "__eq__".to_string(),
                span,
            });
            return None;
        };
        match self.types.resolve(&member) {
            Some(TypeNode::Callable(c)) => c.params.first().cloned(),
            _ => None,
        }
    }

    // ── Expressions ────────────────────────────────────────────────────

    fn check_expr(&mut self, expr: &Expression, expected: Option<&Ref>) -> Option<Ref> {
        let inferred = self.infer(expr, expected)?;
        self.types.set_type(expr.id(), inferred.clone());
        if let Some(exp) = expected {
            if !self.compatible(&inferred, exp) {
                if let Some(conv) = self.conversion_between(&inferred, exp) {
                    self.types.conversions.insert(expr.id(), conv);
                } else {
                    self.error(TypeError::Mismatch {
                        expected: exp.clone(),
                        found: inferred.clone(),
                        span: expr.span(),
                    });
                }
            }
        }
        Some(inferred)
    }

    fn infer(&mut self, expr: &Expression, expected: Option<&Ref>) -> Option<Ref> {
        match expr {
            Expression::Var(v) => {
                let binding = self.symbols.binding(v.id).cloned()?;
                self.binding_ref(&binding)
            }
            Expression::Number(n) => {
                if n.is_float() {
                    if n.text.parse::<f64>().is_err() {
                        self.error(TypeError::BadLiteral {
                            text: n.text.clone(),
                            span: n.span,
                        });
                        return None;
                    }
                    Some(Ref::new(FLOAT))
                } else {
                    if n.text.parse::<i64>().is_err() {
                        self.error(TypeError::BadLiteral {
                            text: n.text.clone(),
                            span: n.span,
                        });
                        return None;
                    }
                    Some(Ref::new(INT))
                }
            }
            Expression::String(s) => {
                if s.unquote().is_none() {
                    self.error(TypeError::BadLiteral {
                        text: s.text.clone(),
                        span: s.span,
                    });
                    return None;
                }
                Some(Ref::new(STRING))
            }
            Expression::Bool(_) => Some(Ref::new(BOOL)),
            Expression::Null(n) => match expected {
                Some(exp) => {
                    if matches!(exp.name.as_str(), INT | FLOAT | BOOL) {
                        self.error(TypeError::Mismatch {
                            expected: exp.clone(),
                            found: Ref::new("null"),
                            span: n.span,
                        });
                        return None;
                    }
                    Some(exp.clone())
                }
                None => Some(Ref::new(ANY)),
            },
            Expression::List(l) => {
                let mut elem = expected
                    .filter(|e| e.name == LIST && e.params.len() == 1)
                    .map(|e| e.params[0].clone());
                for el in &l.elements {
                    match &elem {
                        Some(et) => {
                            let et = et.clone();
                            self.check_expr(el, Some(&et));
                        }
                        None => elem = self.check_expr(el, None),
                    }
                }
                Some(Ref::with(LIST, vec![elem.unwrap_or_else(|| Ref::new(ANY))]))
            }
            Expression::Map(m) => {
                let (mut key, mut value) = match expected {
                    Some(e) if e.name == MAP && e.params.len() == 2 => {
                        (Some(e.params[0].clone()), Some(e.params[1].clone()))
                    }
                    _ => (None, None),
                };
                for entry in &m.entries {
                    match &key {
                        Some(kt) => {
                            let kt = kt.clone();
                            self.check_expr(&entry.key, Some(&kt));
                        }
                        None => key = self.check_expr(&entry.key, None),
                    }
                    match &value {
                        Some(vt) => {
                            let vt = vt.clone();
                            self.check_expr(&entry.value, Some(&vt));
                        }
                        None => value = self.check_expr(&entry.value, None),
                    }
                }
                Some(Ref::with(
                    MAP,
                    vec![
                        key.unwrap_or_else(|| Ref::new(ANY)),
                        value.unwrap_or_else(|| Ref::new(ANY)),
                    ],
                ))
            }
            Expression::Attr(a) => {
                let recv = self.check_expr(&a.expr, None)?;
                match self.types.member_ref(&recv, &a.attr.text) {
                    Some(member) => Some(member),
                    None => {
                        self.error(TypeError::MissingMember {
                            ty: recv,
                            member: a.attr.text.clone(),
                            span: a.span,
                        });
                        None
                    }
                }
            }
            Expression::Call(c) => {
                let callee = match c.expr.as_ref() {
                    Expression::Type(te) => self.constructor_ref(te)?,
                    other => self.check_expr(other, None)?,
                };
                let callable = match self.types.resolve(&callee) {
                    Some(TypeNode::Callable(k)) => k,
                    _ => {
                        self.error(TypeError::NotCallable {
                            ty: callee,
                            span: c.span,
                        });
                        return None;
                    }
                };
                self.check_call(c, &callable)
            }
            Expression::Type(te) => self.resolve(te),
        }
    }

    fn check_call(&mut self, c: &quark_ast::expr::Call, callable: &Callable) -> Option<Ref> {
        if callable.params.len() != c.args.len() {
            self.error(TypeError::ArityMismatch {
                expected: callable.params.len(),
                found: c.args.len(),
                span: c.span,
            });
            return None;
        }
        for (arg, pty) in c.args.iter().zip(&callable.params) {
            self.check_expr(arg, Some(pty));
        }
        Some(callable.result.clone())
    }

    /// Resolve the constructor member addressed by a type in callee
    /// position, and re-key the node's type to it.
    fn constructor_ref(&mut self, te: &TypeExpr) -> Option<Ref> {
        let tref = self.resolve(te)?;
        let Some(TypeNode::Object(o)) = self.types.resolve(&tref) else {
            self.error(TypeError::NotCallable {
                ty: tref,
                span: te.span,
            });
            return None;
        };
        let simple = tref.name.rsplit('.').next().unwrap_or(&tref.name);
        let ctor = o
            .byname
            .get(simple)
            .or_else(|| o.byname.get("__init__"))
            .cloned();
        match ctor {
            Some(ctor) => {
                self.types.set_type(te.id, ctor.clone());
                Some(ctor)
            }
            None => {
                self.error(TypeError::MissingMember {
                    ty: tref,
                    member: "constructor".to_string(),
                    span: te.span,
                });
                None
            }
        }
    }

    // ── Support ────────────────────────────────────────────────────────

    fn resolve(&mut self, te: &TypeExpr) -> Option<Ref> {
        resolve_type_expr(self.symbols, self.types, te, self.errors)
    }

    fn binding_ref(&mut self, binding: &Binding) -> Option<Ref> {
        match binding {
            Binding::Param(p) => self.resolve(&p.ty),
            Binding::Local(d) => self.resolve(&d.ty),
            Binding::Field(f) | Binding::Nulled(f) => self.resolve(&f.ty),
            Binding::SelfRef { of } | Binding::Boxed { of } => {
                Some(Ref::with(of.clone(), self.symbols.formals(of)))
            }
            Binding::TypeParam { fq } => Some(Ref::new(fq.clone())),
            Binding::Function { fq } | Binding::Type { fq } => {
                Some(Ref::with(fq.clone(), self.symbols.formals(fq)))
            }
            Binding::Method { fq } => {
                let parent = self.symbols.parent_fq(fq)?;
                Some(Ref::with(fq.clone(), self.symbols.formals(parent)))
            }
        }
    }

    fn compatible(&self, found: &Ref, expected: &Ref) -> bool {
        if found == expected || expected.name == ANY {
            return true;
        }
        match self.types.resolve(found) {
            Some(TypeNode::Object(o)) => o.bases.iter().any(|b| self.compatible(b, expected)),
            _ => false,
        }
    }

    /// A coercion exists when the found type's own member table carries a
    /// zero-argument callable whose result is the expected type. Scanned in
    /// name order so the pick is deterministic.
    fn conversion_between(&self, found: &Ref, expected: &Ref) -> Option<String> {
        let TypeNode::Object(o) = self.types.resolve(found)? else {
            return None;
        };
        let mut names: Vec<&String> = o.byname.keys().collect();
        names.sort();
        for name in names {
            let member = &o.byname[name];
            if let Some(TypeNode::Callable(c)) = self.types.resolve(member) {
                if c.params.is_empty() && &c.result == expected {
                    return Some(name.clone());
                }
            }
        }
        None
    }

    fn error(&mut self, err: TypeError) {
        self.errors.add(render_type_error(&err));
    }
}
