//! Type construction: one typespace entry per definition.
//!
//! Classes, interfaces and primitives become member-table objects (wrapped
//! in a template when generic); functions, methods and constructors become
//! callables. Member refs carry the parent's formal parameters so a view's
//! bindings flow through instantiation.

use quark_common::Errors;
use quark_ast::item::{Definition, Method, TypeExpr};

use crate::diagnostics::render_type_error;
use crate::error::TypeError;
use crate::symbols::Symbols;
use crate::ty::{Ref, WELL_KNOWN};
use crate::typespace::{Callable, Object, ObjectKind, TypeNode, Typespace};

/// Build typespace entries for every registered definition.
pub fn construct_all(symbols: &Symbols, types: &mut Typespace, errors: &mut Errors) {
    for (fq, def) in &symbols.definitions {
        construct(symbols, types, fq, def, errors);
    }
}

fn construct(
    symbols: &Symbols,
    types: &mut Typespace,
    fq: &str,
    def: &Definition,
    errors: &mut Errors,
) {
    match def {
        Definition::Class(_) | Definition::Interface(_) | Definition::Primitive(_) => {
            construct_object(symbols, types, fq, def, errors);
        }
        Definition::Function(f) => {
            let formals = symbols.formals(fq);
            let formal_names = formal_names(&formals);
            let params = param_refs(symbols, types, &f.params, errors);
            let Some(result) = resolve_type_expr(symbols, types, &f.ty, errors) else {
                return;
            };
            types.insert_node(
                fq,
                wrap_template(formal_names, TypeNode::Callable(Callable { params, result })),
            );
            types.set_type(f.id, Ref::with(fq, formals));
        }
        Definition::NativeFunction(f) => {
            let params = param_refs(symbols, types, &f.params, errors);
            let Some(result) = resolve_type_expr(symbols, types, &f.ty, errors) else {
                return;
            };
            types.insert_node(fq, TypeNode::Callable(Callable { params, result }));
            types.set_type(f.id, Ref::new(fq));
        }
        Definition::Method(m) => {
            construct_method(symbols, types, fq, m, errors);
        }
        // Fields are constructed with their parent; type parameters are
        // leaf refs with no entry of their own.
        Definition::Field(_)
        | Definition::TypeParam(_)
        | Definition::Namespace(_)
        | Definition::Package(_) => {}
    }
}

fn construct_object(
    symbols: &Symbols,
    types: &mut Typespace,
    fq: &str,
    def: &Definition,
    errors: &mut Errors,
) {
    let formals = symbols.formals(fq);
    let names = formal_names(&formals);
    let self_ref = Ref::with(fq, formals.clone());

    let (kind, members, bases) = match def {
        Definition::Class(c) => (ObjectKind::Class, &c.members, c.bases.as_slice()),
        Definition::Interface(i) => (ObjectKind::Interface, &i.members, i.bases.as_slice()),
        Definition::Primitive(p) => (ObjectKind::Primitive, &p.members, &[] as &[TypeExpr]),
        _ => unreachable!("object construction over a non-object definition"),
    };

    let mut byname = rustc_hash::FxHashMap::default();
    let mut has_constructor = false;
    for member in members.iter() {
        match member {
            Definition::Field(f) => {
                if let Some(r) = resolve_type_expr(symbols, types, &f.ty, errors) {
                    types.set_type(f.id, r.clone());
                    byname.insert(f.name.text.clone(), r);
                }
            }
            Definition::Method(m) => {
                if m.ty.is_none() {
                    has_constructor = true;
                }
                let member_fq = format!("{fq}.{}", m.name.text);
                byname.insert(m.name.text.clone(), Ref::with(member_fq, formals.clone()));
            }
            _ => {}
        }
    }

    // Classes without an explicit constructor get a synthesized
    // zero-argument one, so construction calls always have a callable to
    // resolve to.
    if matches!(kind, ObjectKind::Class) && !has_constructor {
        let simple = def.name().text.clone();
        let ctor_fq = format!("{fq}.{simple}");
        byname
            .entry(simple)
            .or_insert_with(|| Ref::with(ctor_fq.clone(), formals.clone()));
        types.insert_node(
            ctor_fq,
            wrap_template(
                names.clone(),
                TypeNode::Callable(Callable {
                    params: Vec::new(),
                    result: self_ref.clone(),
                }),
            ),
        );
    }

    if let Definition::Primitive(p) = def {
        if p.mappings.is_empty() && !WELL_KNOWN.contains(&fq) {
            errors.add(render_type_error(&TypeError::MissingTypeMapping {
                ty: fq.to_string(),
                span: def.span(),
            }));
        }
    }

    let base_refs = bases
        .iter()
        .filter_map(|b| resolve_type_expr(symbols, types, b, errors))
        .collect();

    types.insert_node(
        fq,
        wrap_template(
            names,
            TypeNode::Object(Object {
                kind,
                bases: base_refs,
                byname,
            }),
        ),
    );
    types.set_type(def.id(), self_ref);
}

fn construct_method(
    symbols: &Symbols,
    types: &mut Typespace,
    fq: &str,
    m: &Method,
    errors: &mut Errors,
) {
    let Some(parent_fq) = symbols.parent_fq(fq).cloned() else {
        return;
    };
    let parent_formals = symbols.formals(&parent_fq);
    let names = formal_names(&parent_formals);
    let params = param_refs(symbols, types, &m.params, errors);
    let result = match &m.ty {
        Some(t) => match resolve_type_expr(symbols, types, t, errors) {
            Some(r) => r,
            None => return,
        },
        // A method without a declared return type constructs its parent.
        None => Ref::with(parent_fq.clone(), parent_formals.clone()),
    };
    types.insert_node(
        fq,
        wrap_template(names, TypeNode::Callable(Callable { params, result })),
    );
    types.set_type(m.id, Ref::with(fq, parent_formals));
}

fn param_refs(
    symbols: &Symbols,
    types: &mut Typespace,
    params: &[quark_ast::item::Param],
    errors: &mut Errors,
) -> Vec<Ref> {
    params
        .iter()
        .filter_map(|p| resolve_type_expr(symbols, types, &p.ty, errors))
        .collect()
}

fn formal_names(formals: &[Ref]) -> Vec<String> {
    formals.iter().map(|r| r.name.clone()).collect()
}

fn wrap_template(params: Vec<String>, body: TypeNode) -> TypeNode {
    if params.is_empty() {
        body
    } else {
        TypeNode::Template {
            params,
            body: Box::new(body),
        }
    }
}

/// Resolve a written type reference to a `Ref`, memoised under the node's
/// identity. Explicit argument counts must match the target's formals.
pub fn resolve_type_expr(
    symbols: &Symbols,
    types: &mut Typespace,
    te: &TypeExpr,
    errors: &mut Errors,
) -> Option<Ref> {
    if let Some(r) = types.type_of(te.id) {
        return Some(r.clone());
    }
    let fq = symbols.type_target(te.id)?.clone();
    let mut args = Vec::with_capacity(te.params.len());
    for p in &te.params {
        args.push(resolve_type_expr(symbols, types, p, errors)?);
    }
    let formals = symbols
        .get(&fq)
        .map(|d| d.type_params().len())
        .unwrap_or(0);
    if args.len() != formals {
        errors.add(render_type_error(&TypeError::ArityMismatch {
            expected: formals,
            found: args.len(),
            span: te.span,
        }));
        return None;
    }
    let r = Ref::with(fq, args);
    types.set_type(te.id, r.clone());
    Some(r)
}
