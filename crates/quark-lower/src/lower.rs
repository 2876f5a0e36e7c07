//! The shape-directed AST-to-IR rewriter.
//!
//! Top-level lowering walks every `(definition, bindings)` pair the
//! typespace discovered; for each, a fresh [`Lowerer`] is installed with a
//! view over those bindings, so one surface definition may produce several
//! independent IR definitions with distinct mangled names.
//!
//! Per-compilation state is three slots: a stack of statement frames
//! (expression lowering that needs side effects synthesises statements
//! into the current frame, spliced in ahead of the containing statement),
//! a fresh-temp counter, and a running assertion count that retroactively
//! classifies the enclosing definition as test-bearing.
//!
//! Shape assertions in here are internal invariants: lowering only runs
//! on programs the checker passed, so a missing type or binding is a
//! compiler bug and fails loudly.

use quark_common::Errors;
use quark_ast::expr::{Expression, NativeBlock, NativeChunk, Var};
use quark_ast::item::{Class, Definition, Interface, Method, MethodBody, Param};
use quark_ast::stmt::{Block, Case, Statement};
use quark_ast::NodeId;
use quark_ir as ir;
use quark_typeck::instantiate::Instantiations;
use quark_typeck::symbols::{Binding, Symbols};
use quark_typeck::ty::{Bindings, Ref, ANY, BOOL, FLOAT, INT, SCALAR, STRING, VOID};
use quark_typeck::typespace::{TypeNode, Typespace, View};

use crate::mangle::{mangle, method_symbol};
use crate::native;

/// Lower every top-level instantiation into one IR package.
pub fn lower(
    symbols: &Symbols,
    types: &Typespace,
    insts: &Instantiations,
    package_name: &str,
    errors: &mut Errors,
) -> ir::Package {
    let mut definitions = Vec::new();
    for (fq, def) in &symbols.definitions {
        if !symbols.is_top(fq, def) {
            continue;
        }
        // Primitive methods are emitted once per instantiation of their
        // parent; everything else per instantiation of itself.
        let inst_key = match def {
            Definition::Method(_) => symbols
                .parent_fq(fq)
                .cloned()
                .unwrap_or_else(|| fq.clone()),
            _ => fq.clone(),
        };
        for (iref, bindings) in insts.of(&inst_key) {
            let mut lw = Lowerer {
                symbols,
                types,
                view: View::new(types, bindings.clone()),
                package: package_name.to_string(),
                errors: &mut *errors,
                asserts: 0,
                counter: 0,
                stack: Vec::new(),
            };
            definitions.push(lw.definition(fq, def, iref));
            debug_assert!(lw.stack.is_empty(), "unbalanced statement frames");
        }
    }
    ir::Package { definitions }
}

struct Lowerer<'a> {
    symbols: &'a Symbols,
    types: &'a Typespace,
    view: View<'a>,
    package: String,
    errors: &'a mut Errors,
    asserts: u32,
    counter: u32,
    stack: Vec<Vec<ir::Stmt>>,
}

impl<'a> Lowerer<'a> {
    // ── Definitions ────────────────────────────────────────────────────

    fn definition(&mut self, fq: &str, def: &Definition, iref: &Ref) -> ir::Def {
        match def {
            Definition::Function(f) => self.function(f, iref),
            Definition::NativeFunction(f) => self.native_function(fq, f),
            Definition::Class(c) => self.class(c, iref),
            Definition::Interface(i) => self.interface(i, iref),
            Definition::Method(m) => self.primitive_method(fq, m),
            _ => unreachable!("non-top definition reached lowering"),
        }
    }

    fn function(&mut self, f: &quark_ast::item::Function, iref: &Ref) -> ir::Def {
        self.asserts = 0;
        let ret = self.lower_ref_type(&self.ref_of(f.ty.id));
        let params = self.params(&f.params);
        let name = self.def_name(mangle(iref));
        let body = match &f.body {
            Some(b) => self.block(b),
            None => ir::Block::default(),
        };
        if self.asserts > 0 {
            ir::Def::Check(ir::Check { name, params, body })
        } else {
            ir::Def::Function(ir::Function {
                name,
                ret,
                params,
                body,
            })
        }
    }

    fn native_function(&mut self, fq: &str, f: &quark_ast::item::NativeFunction) -> ir::Def {
        let ret = self.lower_ref_type(&self.ref_of(f.ty.id));
        let params = self.params(&f.params);
        let name = self.def_name(mangle(&Ref::new(fq)));
        let body = f.body.as_ref().expect("native function without a body");
        let (context, template) = self.native_block(body);
        ir::Def::NativeFunction(ir::NativeFunction {
            name,
            ret,
            params,
            context,
            template,
        })
    }

    fn class(&mut self, c: &Class, iref: &Ref) -> ir::Def {
        self.asserts = 0;
        let name = self.def_name(mangle(iref));
        let bases = c
            .bases
            .iter()
            .map(|b| self.lower_ref_type(&self.ref_of(b.id)))
            .collect();
        let mut members = Vec::new();
        for member in &c.members {
            match member {
                Definition::Field(f) => members.push(ir::Member::Field(ir::Field {
                    name: f.name.text.clone(),
                    ty: self.lower_ref_type(&self.ref_of(f.id)),
                })),
                Definition::Method(m) => members.push(self.method(c, m)),
                _ => {}
            }
        }
        let class = |members| ir::Class {
            name,
            bases,
            members,
        };
        if self.asserts > 0 {
            let (constructors, rest): (Vec<_>, Vec<_>) = members
                .into_iter()
                .partition(|m| matches!(m, ir::Member::Constructor(_)));
            if !constructors.is_empty() {
                self.errors.warn(format!(
                    "test class `{}` cannot declare a constructor",
                    mangle(iref)
                ));
            }
            ir::Def::TestClass(class(rest))
        } else {
            ir::Def::Class(class(members))
        }
    }

    fn method(&mut self, parent: &Class, m: &Method) -> ir::Member {
        let before = self.asserts;
        let params = self.params(&m.params);
        let body = match &m.body {
            Some(MethodBody::Block(b)) => ir::FnBody::Block(self.block(b)),
            Some(MethodBody::Native(n)) => {
                let (context, template) = self.native_block(n);
                ir::FnBody::Native { context, template }
            }
            None => ir::FnBody::Block(ir::Block::default()),
        };
        match &m.ty {
            Some(t) => {
                let method = ir::Method {
                    name: m.name.text.clone(),
                    ret: self.lower_ref_type(&self.ref_of(t.id)),
                    params,
                    body,
                };
                if self.asserts > before {
                    ir::Member::TestMethod(method)
                } else {
                    ir::Member::Method(method)
                }
            }
            None => {
                let parent_ref = self.ref_of(parent.id);
                ir::Member::Constructor(ir::Constructor {
                    name: mangle(&parent_ref),
                    ret: self.lower_ref_type(&parent_ref),
                    params,
                    body,
                })
            }
        }
    }

    /// A primitive's method lowers to a free function named from the
    /// parent instantiation and the method's parameter types, with an
    /// explicit `self` parameter prepended (except for `__init__`).
    fn primitive_method(&mut self, fq: &str, m: &Method) -> ir::Def {
        self.asserts = 0;
        let parent = self
            .symbols
            .parent_def(fq)
            .expect("primitive method without a parent");
        let parent_ref = self.ref_of(parent.id());
        let member_ref = self.ref_of(m.id);
        let callable = match self.view.node_of(&member_ref) {
            Some(TypeNode::Callable(c)) => c,
            _ => unreachable!("primitive method without a callable entry"),
        };
        let name = self.def_name(method_symbol(&parent_ref, &callable.params, &m.name.text));
        let ret = self.lower_ref_type(&callable.result);
        let mut params = Vec::new();
        if m.name.text != "__init__" {
            params.push(ir::Param {
                name: "self".to_string(),
                ty: self.lower_ref_type(&parent_ref),
            });
        }
        params.extend(self.params(&m.params));
        match &m.body {
            Some(MethodBody::Native(n)) => {
                let (context, template) = self.native_block(n);
                ir::Def::NativeFunction(ir::NativeFunction {
                    name,
                    ret,
                    params,
                    context,
                    template,
                })
            }
            Some(MethodBody::Block(b)) => {
                let body = self.block(b);
                ir::Def::Function(ir::Function {
                    name,
                    ret,
                    params,
                    body,
                })
            }
            None => unreachable!("bodyless primitive method reached lowering"),
        }
    }

    fn interface(&mut self, i: &Interface, iref: &Ref) -> ir::Def {
        let name = self.def_name(mangle(iref));
        let mut messages = Vec::new();
        for member in &i.members {
            let Definition::Method(m) = member else {
                continue;
            };
            let Some(t) = &m.ty else { continue };
            messages.push(ir::Message {
                name: m.name.text.clone(),
                ret: self.lower_ref_type(&self.ref_of(t.id)),
                params: self.params(&m.params),
            });
        }
        ir::Def::Interface(ir::Interface { name, messages })
    }

    fn params(&mut self, params: &[Param]) -> Vec<ir::Param> {
        params
            .iter()
            .map(|p| ir::Param {
                name: p.name.text.clone(),
                ty: self.lower_ref_type(&self.ref_of(p.ty.id)),
            })
            .collect()
    }

    // ── Statements ─────────────────────────────────────────────────────

    fn block(&mut self, block: &Block) -> ir::Block {
        let mut stmts = Vec::new();
        for s in &block.statements {
            self.push();
            let lowered = self.statement(s);
            stmts.extend(self.pop());
            stmts.push(lowered);
        }
        ir::Block(stmts)
    }

    fn statement(&mut self, stmt: &Statement) -> ir::Stmt {
        match stmt {
            Statement::If(i) => ir::Stmt::If {
                predicate: self.expression(&i.predicate),
                consequence: self.block(&i.consequence),
                alternative: i
                    .alternative
                    .as_ref()
                    .map(|b| self.block(b))
                    .unwrap_or_default(),
            },
            Statement::While(w) => ir::Stmt::While {
                condition: self.expression(&w.condition),
                body: self.block(&w.body),
            },
            Statement::Switch(sw) => {
                let scrutinee = self.ref_of(sw.expr.id());
                let ty = self.lower_ref_type(&scrutinee);
                let tmp = self.temp(ty);
                let value = self.expression(&sw.expr);
                self.add(ir::Stmt::Assign {
                    target: ir::Expr::Var(tmp.clone()),
                    value,
                });
                self.cases(&scrutinee, &tmp, &sw.cases)
            }
            Statement::Local(l) => ir::Stmt::Local {
                name: l.declaration.name.text.clone(),
                ty: self.lower_ref_type(&self.ref_of(l.id)),
                value: l.declaration.value.as_ref().map(|v| self.expression(v)),
            },
            Statement::Assign(a) => self.assign(a),
            Statement::Expr(e) => ir::Stmt::Evaluate(self.expression(&e.expr)),
            Statement::Return(r) => {
                ir::Stmt::Return(r.expr.as_ref().map(|e| self.expression(e)))
            }
            Statement::Break(_) => ir::Stmt::Break,
            Statement::Continue(_) => ir::Stmt::Continue,
        }
    }

    /// Cases fold right-to-left into nested ifs; a case's tests fold into
    /// an `__or__` chain, which the boolean shortcut turns into `Or` nodes
    /// so short-circuit evaluation is preserved.
    fn cases(&mut self, scrutinee: &Ref, tmp: &str, cases: &[Case]) -> ir::Stmt {
        let Some((first, rest)) = cases.split_first() else {
            return ir::Stmt::If {
                predicate: ir::Expr::BoolLit(false),
                consequence: ir::Block::default(),
                alternative: ir::Block::default(),
            };
        };
        let predicate = self.case_test(scrutinee, tmp, &first.exprs);
        let consequence = self.block(&first.body);
        let alternative = if rest.is_empty() {
            ir::Block::default()
        } else {
            ir::Block(vec![self.cases(scrutinee, tmp, rest)])
        };
        ir::Stmt::If {
            predicate,
            consequence,
            alternative,
        }
    }

    fn case_test(&mut self, scrutinee: &Ref, tmp: &str, exprs: &[Expression]) -> ir::Expr {
        let (first, rest) = exprs
            .split_first()
            .expect("switch case without test expressions");
        let arg = self.expression(first);
        let test = self.send_to(scrutinee, ir::Expr::Var(tmp.to_string()), "__eq__", vec![arg]);
        if rest.is_empty() {
            test
        } else {
            let more = self.case_test(scrutinee, tmp, rest);
            self.send_to(&Ref::new(BOOL), test, "__or__", vec![more])
        }
    }

    fn assign(&mut self, a: &quark_ast::stmt::Assign) -> ir::Stmt {
        match &a.lhs {
            Expression::Var(v) => {
                let binding = self
                    .symbols
                    .binding(v.id)
                    .expect("unresolved assignment target")
                    .clone();
                match binding {
                    Binding::Field(f) | Binding::Nulled(f) => ir::Stmt::Set {
                        object: ir::Expr::This,
                        field: f.name.text.clone(),
                        value: self.expression(&a.rhs),
                    },
                    Binding::Param(_) | Binding::Local(_) => ir::Stmt::Assign {
                        target: ir::Expr::Var(v.name.text.clone()),
                        value: self.expression(&a.rhs),
                    },
                    _ => unreachable!("assignment to a non-storage binding"),
                }
            }
            Expression::Attr(at) => {
                let object = self.expression(&at.expr);
                ir::Stmt::Set {
                    object,
                    field: at.attr.text.clone(),
                    value: self.expression(&a.rhs),
                }
            }
            _ => unreachable!("unsupported assignment target shape"),
        }
    }

    // ── Expressions ────────────────────────────────────────────────────

    fn expression(&mut self, expr: &Expression) -> ir::Expr {
        let compiled = match expr {
            Expression::Var(v) => {
                let binding = self
                    .symbols
                    .binding(v.id)
                    .expect("unresolved variable reached lowering")
                    .clone();
                self.variable(&binding, v)
            }
            Expression::Number(n) => {
                if n.is_float() {
                    ir::Expr::FloatLit(n.text.parse().expect("checked float literal"))
                } else {
                    ir::Expr::IntLit(n.text.parse().expect("checked int literal"))
                }
            }
            Expression::String(s) => {
                ir::Expr::StringLit(s.unquote().expect("checked string literal"))
            }
            Expression::Bool(b) => ir::Expr::BoolLit(b.text == "true"),
            Expression::Null(n) => {
                let ty = self.ref_of(n.id);
                ir::Expr::Null(self.lower_ref_type(&ty))
            }
            Expression::List(l) => {
                let lref = self.ref_of(l.id);
                let ty = self.lower_ref_type(&lref);
                let tmp = self.temp(ty);
                let alloc = self.construct_value(&lref, Vec::new());
                self.add(ir::Stmt::Assign {
                    target: ir::Expr::Var(tmp.clone()),
                    value: alloc,
                });
                for element in &l.elements {
                    let arg = self.expression(element);
                    let append =
                        self.send_to(&lref, ir::Expr::Var(tmp.clone()), "append", vec![arg]);
                    self.add(ir::Stmt::Evaluate(append));
                }
                ir::Expr::Var(tmp)
            }
            Expression::Map(m) => {
                let mref = self.ref_of(m.id);
                let ty = self.lower_ref_type(&mref);
                let tmp = self.temp(ty);
                let alloc = self.construct_value(&mref, Vec::new());
                self.add(ir::Stmt::Assign {
                    target: ir::Expr::Var(tmp.clone()),
                    value: alloc,
                });
                for entry in &m.entries {
                    let key = self.expression(&entry.key);
                    let value = self.expression(&entry.value);
                    let set = self.send_to(
                        &mref,
                        ir::Expr::Var(tmp.clone()),
                        "__set__",
                        vec![key, value],
                    );
                    self.add(ir::Stmt::Evaluate(set));
                }
                ir::Expr::Var(tmp)
            }
            Expression::Attr(a) => {
                let receiver = self.expression(&a.expr);
                ir::Expr::Get(Box::new(receiver), a.attr.text.clone())
            }
            Expression::Call(c) => self.call(c),
            Expression::Type(t) => {
                let r = self.ref_of(t.id);
                ir::Expr::TypeRef(self.lower_ref_type(&r))
            }
        };
        self.convert(expr.id(), compiled)
    }

    /// Every compiled expression passes through here; when the conversion
    /// table names a coercion for the node, the compiled value is sent
    /// through it. Type descriptors, assertions and refs pass unchanged.
    fn convert(&mut self, id: NodeId, compiled: ir::Expr) -> ir::Expr {
        if matches!(
            compiled,
            ir::Expr::TypeRef(_)
                | ir::Expr::Boxed(_)
                | ir::Expr::AssertEqual(..)
                | ir::Expr::AssertNotEqual(..)
                | ir::Expr::Ref(_)
        ) {
            return compiled;
        }
        let Some(conversion) = self.types.conversions.get(&id).cloned() else {
            return compiled;
        };
        let source = self.ref_of(id);
        self.send_to(&source, compiled, &conversion, Vec::new())
    }

    fn call(&mut self, c: &quark_ast::expr::Call) -> ir::Expr {
        let callee = self.ref_of(c.expr.id());
        let args: Vec<ir::Expr> = c.args.iter().map(|a| self.expression(a)).collect();

        // A type in callee position is always a construction.
        if matches!(c.expr.as_ref(), Expression::Type(_)) {
            return self.constructor_call(&callee, args);
        }

        match self.symbols.get(&callee.name) {
            Some(Definition::Function(f)) if f.name.text == "assertEqual" => {
                self.asserts += 1;
                let mut it = args.into_iter();
                let a = it.next().expect("assertEqual arity");
                let b = it.next().expect("assertEqual arity");
                ir::Expr::AssertEqual(Box::new(a), Box::new(b))
            }
            Some(Definition::Function(f)) if f.name.text == "assertNotEqual" => {
                self.asserts += 1;
                let mut it = args.into_iter();
                let a = it.next().expect("assertNotEqual arity");
                let b = it.next().expect("assertNotEqual arity");
                ir::Expr::AssertNotEqual(Box::new(a), Box::new(b))
            }
            Some(Definition::Function(_)) | Some(Definition::NativeFunction(_)) => {
                ir::Expr::Invoke {
                    target: self.ref_addr(mangle(&callee)),
                    args,
                }
            }
            Some(Definition::Method(m)) => {
                if m.ty.is_none() {
                    return self.constructor_call(&callee, args);
                }
                let receiver = match c.expr.as_ref() {
                    Expression::Attr(a) => self.expression(&a.expr),
                    _ => ir::Expr::This,
                };
                self.call_member(&callee, receiver, args)
            }
            Some(Definition::Class(_)) | Some(Definition::Primitive(_)) => {
                self.construct_value(&callee, args)
            }
            // Synthesized constructor members have no backing declaration.
            _ => self.constructor_call(&callee, args),
        }
    }

    /// Dispatch a member call by the kind of the member's parent.
    fn call_member(&mut self, member: &Ref, receiver: ir::Expr, args: Vec<ir::Expr>) -> ir::Expr {
        let name = member
            .name
            .rsplit('.')
            .next()
            .expect("member ref without a name")
            .to_string();
        let parent_fq = self
            .symbols
            .parent_fq(&member.name)
            .expect("member ref without a parent")
            .clone();
        match self.symbols.get(&parent_fq) {
            Some(Definition::Primitive(_)) => {
                // The boolean shortcuts keep short-circuit evaluation.
                if parent_fq == BOOL && name == "__or__" {
                    let arg = args.into_iter().next().expect("__or__ arity");
                    return ir::Expr::Or(Box::new(receiver), Box::new(arg));
                }
                if parent_fq == BOOL && name == "__and__" {
                    let arg = args.into_iter().next().expect("__and__ arity");
                    return ir::Expr::And(Box::new(receiver), Box::new(arg));
                }
                let parent_ref = Ref::with(parent_fq, member.params.clone());
                let callable = match self.view.node_of(member) {
                    Some(TypeNode::Callable(k)) => k,
                    _ => unreachable!("member call without a callable entry"),
                };
                let mut all_args = vec![receiver];
                all_args.extend(args);
                ir::Expr::Invoke {
                    target: self.ref_addr(method_symbol(&parent_ref, &callable.params, &name)),
                    args: all_args,
                }
            }
            Some(Definition::Class(_)) | Some(Definition::Interface(_)) => ir::Expr::Send {
                receiver: Box::new(receiver),
                name,
                args,
            },
            _ => unreachable!("member call on a non-object parent"),
        }
    }

    /// Send through the receiver type's member table (used by synthesised
    /// sends: switch tests, collection building, conversions).
    fn send_to(
        &mut self,
        receiver_ty: &Ref,
        receiver: ir::Expr,
        name: &str,
        args: Vec<ir::Expr>,
    ) -> ir::Expr {
        let member = self
            .types
            .member_ref(receiver_ty, name)
            .unwrap_or_else(|| panic!("`{receiver_ty}` lost member `{name}` after checking"));
        self.call_member(&member, receiver, args)
    }

    /// Construct a value of `tref` through its constructor member.
    fn construct_value(&mut self, tref: &Ref, args: Vec<ir::Expr>) -> ir::Expr {
        let Some(TypeNode::Object(o)) = self.view.node_of(tref) else {
            unreachable!("construction of a non-object type");
        };
        let simple = tref.name.rsplit('.').next().unwrap_or(&tref.name);
        let ctor = o
            .byname
            .get(simple)
            .or_else(|| o.byname.get("__init__"))
            .cloned()
            .unwrap_or_else(|| panic!("`{tref}` has no constructor member"));
        self.constructor_call(&ctor, args)
    }

    /// A constructor call: primitives go through their lowered `__init__`
    /// free function, classes through `Construct`.
    fn constructor_call(&mut self, ctor: &Ref, args: Vec<ir::Expr>) -> ir::Expr {
        let callable = match self.view.node_of(ctor) {
            Some(TypeNode::Callable(c)) => c,
            _ => unreachable!("constructor without a callable entry"),
        };
        let result = callable.result.clone();
        match self.symbols.get(&result.name) {
            Some(Definition::Primitive(_)) => ir::Expr::Invoke {
                target: self.ref_addr(format!("{}___init__", mangle(&result))),
                args,
            },
            _ => ir::Expr::Construct {
                target: self.ref_addr(mangle(&result)),
                args,
            },
        }
    }

    /// Binding kind decides the IR shape of a variable reference.
    fn variable(&mut self, binding: &Binding, v: &Var) -> ir::Expr {
        match binding {
            Binding::Param(p) => ir::Expr::Var(p.name.text.clone()),
            Binding::Local(d) => ir::Expr::Var(d.name.text.clone()),
            Binding::Field(f) => {
                ir::Expr::Get(Box::new(ir::Expr::This), f.name.text.clone())
            }
            Binding::SelfRef { of } => match self.symbols.get(of) {
                Some(Definition::Primitive(_)) => ir::Expr::Var("self".to_string()),
                _ => ir::Expr::This,
            },
            Binding::Boxed { of } => {
                let r = Ref::with(of.clone(), self.symbols.formals(of)).bind(&self.view.bindings);
                let ty = self.lower_ref_type(&r);
                if ty.is_native() {
                    ir::Expr::Boxed(ty)
                } else {
                    ir::Expr::TypeRef(ty)
                }
            }
            Binding::Nulled(f) => {
                let ty = self.ref_of(f.ty.id);
                ir::Expr::Null(self.lower_ref_type(&ty))
            }
            Binding::TypeParam { fq } => {
                let bound = Ref::new(fq.clone()).bind(&self.view.bindings);
                ir::Expr::TypeRef(self.lower_ref_type(&bound))
            }
            Binding::Function { .. } => {
                let r = self.ref_of(v.id);
                ir::Expr::Ref(self.ref_addr(mangle(&r)))
            }
            Binding::Type { fq } => {
                let r = Ref::with(fq.clone(), self.symbols.formals(fq)).bind(&self.view.bindings);
                ir::Expr::TypeRef(self.lower_ref_type(&r))
            }
            Binding::Method { .. } => {
                unreachable!("method referenced as a value")
            }
        }
    }

    // ── Types ──────────────────────────────────────────────────────────

    fn lower_ref_type(&mut self, r: &Ref) -> ir::Type {
        match r.name.as_str() {
            INT => ir::Type::Int,
            FLOAT => ir::Type::Float,
            BOOL => ir::Type::Bool,
            STRING => ir::Type::String,
            VOID => ir::Type::Void,
            ANY => ir::Type::Any,
            SCALAR => ir::Type::Scalar,
            _ => match self.symbols.get(&r.name) {
                Some(Definition::Interface(_)) => {
                    ir::Type::Interface(self.ref_addr(mangle(r)))
                }
                Some(Definition::Primitive(p)) => {
                    // Mapping bodies are lowered under the instantiation's
                    // own bindings; the enclosing view is restored after.
                    let p = p.clone();
                    let mut child = Bindings::default();
                    for (formal, actual) in p.params.iter().zip(&r.params) {
                        child.insert(format!("{}.{}", r.name, formal.name.text), actual.clone());
                    }
                    let mappings = self.with_bindings(child, |lw| {
                        p.mappings
                            .iter()
                            .map(|m| {
                                let (context, template) = lw.native_block(m);
                                ir::NativeBlock { context, template }
                            })
                            .collect()
                    });
                    ir::Type::Primitive { mappings }
                }
                Some(Definition::Class(_)) => ir::Type::Class(self.ref_addr(mangle(r))),
                other => unreachable!("unlowerable type ref `{r}` ({other:?})"),
            },
        }
    }

    fn with_bindings<T>(&mut self, bindings: Bindings, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = std::mem::replace(&mut self.view.bindings, bindings);
        let out = f(self);
        self.view.bindings = saved;
        out
    }

    // ── Native templates ───────────────────────────────────────────────

    fn native_block(&mut self, block: &NativeBlock) -> (ir::TemplateContext, ir::TemplateText) {
        let mut context = Vec::new();
        let mut body = String::new();
        for chunk in &block.chunks {
            match chunk {
                NativeChunk::Fixed(f) => body.push_str(&native::escape(&f.text)),
                NativeChunk::Var(v) => {
                    body.push_str(&native::placeholder(&v.name.text));
                    let binding = self
                        .symbols
                        .binding(v.id)
                        .expect("unresolved native template variable")
                        .clone();
                    let compiled = self.variable(&binding, v);
                    let compiled = self.convert(v.id, compiled);
                    context.push((v.name.text.clone(), compiled));
                }
            }
        }
        let imports = block
            .imports
            .iter()
            .map(|i| ir::NativeImport {
                module: i.module.clone(),
                alias: i.alias.clone(),
            })
            .collect();
        (
            ir::TemplateContext(context),
            ir::TemplateText {
                target: block.target.clone(),
                imports,
                body,
            },
        )
    }

    // ── State ──────────────────────────────────────────────────────────

    fn ref_of(&self, id: NodeId) -> Ref {
        self.view
            .ref_of(id)
            .expect("untyped node reached lowering")
    }

    fn temp(&mut self, ty: ir::Type) -> String {
        let name = format!("temp{}", self.counter);
        self.counter += 1;
        self.add(ir::Stmt::Local {
            name: name.clone(),
            ty,
            value: None,
        });
        name
    }

    fn push(&mut self) {
        self.stack.push(Vec::new());
    }

    fn pop(&mut self) -> Vec<ir::Stmt> {
        self.stack.pop().expect("statement frame underflow")
    }

    fn add(&mut self, stmt: ir::Stmt) {
        self.stack
            .last_mut()
            .expect("no open statement frame")
            .push(stmt);
    }

    // ── Addressing ─────────────────────────────────────────────────────

    fn scope(&self) -> String {
        format!("{0}:{0}", self.package)
    }

    fn def_name(&self, name: String) -> ir::Name {
        ir::Name {
            package: self.scope(),
            name,
        }
    }

    fn ref_addr(&self, name: String) -> ir::Ref {
        ir::Ref {
            package: self.scope(),
            name,
        }
    }
}
