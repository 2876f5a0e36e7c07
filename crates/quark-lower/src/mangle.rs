//! Name mangling.
//!
//! `mangle` encodes a ref into a single identifier: the dot-flattened base
//! name joined with each parameter's mangled form by `_`. Well-known
//! builtin refs keep fixed short names; everything else uses its literal
//! name. The result is deterministic: two calls on structurally equal refs
//! produce byte-identical output.

use quark_typeck::ty::{Ref, ANY, INT, LIST, MAP, SCALAR, STRING};

/// Mangle a ref into an identifier.
pub fn mangle(r: &Ref) -> String {
    mangle_parts(&r.name, &r.params)
}

/// Mangle a base name with an explicit parameter tuple.
pub fn mangle_parts(name: &str, params: &[Ref]) -> String {
    let mut parts = vec![flatten(name)];
    parts.extend(params.iter().map(|p| mangle_param(p).replace('.', "_")));
    parts.join("_")
}

/// The symbol of the free function lowered from a primitive method: the
/// method's parameter types sit between the mangled parent instantiation
/// and the method name, keeping overloads and specialisations apart.
/// `__init__` constructors use the fixed `<parent>___init__` form so call
/// sites can address them from the result type alone.
pub fn method_symbol(parent: &Ref, params: &[Ref], name: &str) -> String {
    if name == "__init__" {
        return format!("{}___init__", mangle(parent));
    }
    let mut all = parent.params.clone();
    all.extend(params.iter().cloned());
    format!("{}_{}", mangle_parts(&parent.name, &all), name)
}

// Native-target names keep only the segment after `::`.
fn flatten(name: &str) -> String {
    let name = name.rsplit("::").next().unwrap_or(name);
    name.replace('.', "_")
}

fn mangle_param(r: &Ref) -> String {
    let mut parts = vec![short_name(&r.name).to_string()];
    parts.extend(r.params.iter().map(|p| mangle_param(p).replace('.', "_")));
    parts.join("_")
}

fn short_name(name: &str) -> &str {
    match name {
        INT => "int",
        STRING => "String",
        ANY => "Any",
        SCALAR => "Scalar",
        LIST => "List",
        MAP => "Map",
        other => other,
    }
}
