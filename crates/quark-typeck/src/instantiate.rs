//! Instantiation discovery: the monomorphisation work-list.
//!
//! Seeds with the non-generic top-level definitions, then walks each
//! reached definition's subtree under its bindings, recording one
//! instantiation per structurally unique argument tuple seen on any
//! generic definition. The fixpoint ends when no new pairs appear.
//!
//! Each definition's instantiation list is sorted, so use-site order does
//! not influence the emitted package.

use std::collections::VecDeque;

use quark_ast::walk::{walk_dfs, AnyNode};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::symbols::Symbols;
use crate::ty::{Bindings, Ref};
use crate::typespace::Typespace;

/// Every `(definition, bindings)` pair reachable from top-level use.
#[derive(Debug, Default)]
pub struct Instantiations {
    map: FxHashMap<String, Vec<(Ref, Bindings)>>,
}

impl Instantiations {
    /// The instantiations of one definition. Non-generic definitions have
    /// their single ground entry; unused generics have none.
    pub fn of(&self, fq: &str) -> &[(Ref, Bindings)] {
        self.map.get(fq).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Run the discovery fixpoint.
pub fn discover(symbols: &Symbols, types: &Typespace) -> Instantiations {
    let mut insts = Instantiations::default();
    let mut seen: FxHashSet<Ref> = FxHashSet::default();
    let mut queue: VecDeque<(String, Bindings)> = VecDeque::new();

    for (fq, def) in &symbols.definitions {
        let generic = !def.type_params().is_empty();
        if !generic && symbols.is_top(fq, def) {
            queue.push_back((fq.clone(), Bindings::default()));
        }
        if !generic {
            use quark_ast::item::Definition::*;
            if matches!(
                def,
                Class(_) | Interface(_) | Primitive(_) | Function(_) | NativeFunction(_)
            ) {
                insts
                    .map
                    .entry(fq.clone())
                    .or_default()
                    .push((Ref::new(fq.clone()), Bindings::default()));
            }
        }
    }

    while let Some((fq, bindings)) = queue.pop_front() {
        let Some(def) = symbols.get(&fq) else {
            continue;
        };
        for node in walk_dfs(AnyNode::Definition(def)) {
            let Some(r) = types.type_of(node.id()) else {
                continue;
            };
            let bound = r.bind(&bindings);
            visit_refs(&bound, &mut |g| {
                if !is_instantiation(symbols, g) || contains_formal(symbols, g) {
                    return;
                }
                if seen.insert(g.clone()) {
                    let new_bindings = zip_bindings(symbols, g);
                    insts
                        .map
                        .entry(g.name.clone())
                        .or_default()
                        .push((g.clone(), new_bindings.clone()));
                    queue.push_back((g.name.clone(), new_bindings));
                }
            });
        }
    }

    for list in insts.map.values_mut() {
        list.sort_by(|a, b| a.0.cmp(&b.0));
        list.dedup_by(|a, b| a.0 == b.0);
    }
    insts
}

fn visit_refs(r: &Ref, f: &mut impl FnMut(&Ref)) {
    f(r);
    for p in &r.params {
        visit_refs(p, f);
    }
}

/// A ref is an instantiation when it names a generic definition and
/// supplies its full argument tuple.
fn is_instantiation(symbols: &Symbols, r: &Ref) -> bool {
    match symbols.get(&r.name) {
        Some(def) => {
            let formals = def.type_params().len();
            formals > 0 && r.params.len() == formals
        }
        None => false,
    }
}

/// Whether any leaf still names a formal type parameter (an open ref
/// inside a generic body, not a ground instantiation).
fn contains_formal(symbols: &Symbols, r: &Ref) -> bool {
    if matches!(
        symbols.get(&r.name),
        Some(quark_ast::item::Definition::TypeParam(_))
    ) {
        return true;
    }
    r.params.iter().any(|p| contains_formal(symbols, p))
}

fn zip_bindings(symbols: &Symbols, r: &Ref) -> Bindings {
    let mut bindings = Bindings::default();
    if let Some(def) = symbols.get(&r.name) {
        for (formal, actual) in def.type_params().iter().zip(&r.params) {
            bindings.insert(format!("{}.{}", r.name, formal.name.text), actual.clone());
        }
    }
    bindings
}
