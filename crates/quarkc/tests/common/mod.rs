//! Shared test support: the builtin `quark` namespace the scenarios
//! compile against, and shorthands for building expected IR.

#![allow(dead_code)]

use quark_ast::build::Builder;
use quark_ast::item::{Definition, File, MethodBody};
use quark_ir as ir;

pub const PKG: &str = "demo";

/// Compile a set of files under the test package name.
pub fn compile(files: Vec<File>) -> (quarkc::Compiler, ir::Package) {
    let mut c = quarkc::Compiler::new();
    for f in files {
        c.add(f);
    }
    c.check().expect("program should check");
    let pkg = c.compile(PKG).expect("program should lower");
    (c, pkg)
}

/// The builtin namespace: primitives with signature-only methods, except
/// where a native body is needed so the method is emitted (List and Map).
pub fn builtins(b: &mut Builder) -> File {
    let mut defs: Vec<Definition> = Vec::new();

    let members = vec![
        sig(b, "int", "__add__", &[("int", "other")]),
        sig(b, "int", "__sub__", &[("int", "other")]),
        sig(b, "int", "__mul__", &[("int", "other")]),
        sig(b, "bool", "__lt__", &[("int", "other")]),
        sig(b, "bool", "__eq__", &[("int", "other")]),
        sig(b, "float", "__to_float__", &[]),
        sig(b, "String", "toString", &[]),
    ];
    defs.push(b.primitive("int", vec![], members, vec![]).into());

    let members = vec![
        sig(b, "float", "__add__", &[("float", "other")]),
        sig(b, "bool", "__eq__", &[("float", "other")]),
        sig(b, "String", "toString", &[]),
    ];
    defs.push(b.primitive("float", vec![], members, vec![]).into());

    let members = vec![
        sig(b, "bool", "__eq__", &[("bool", "other")]),
        sig(b, "bool", "__or__", &[("bool", "other")]),
        sig(b, "bool", "__and__", &[("bool", "other")]),
        sig(b, "String", "toString", &[]),
    ];
    defs.push(b.primitive("bool", vec![], members, vec![]).into());

    let members = vec![
        sig(b, "bool", "__eq__", &[("String", "other")]),
        sig(b, "String", "toString", &[]),
    ];
    defs.push(b.primitive("String", vec![], members, vec![]).into());

    for name in ["void", "Any", "Scalar"] {
        defs.push(b.primitive(name, vec![], vec![], vec![]).into());
    }

    defs.push(list_primitive(b));
    defs.push(map_primitive(b));

    let a = b.ty("Any", vec![]);
    let pa = b.param(a, "expected");
    let a = b.ty("Any", vec![]);
    let pb = b.param(a, "actual");
    let v = b.ty("void", vec![]);
    defs.push(b.function(v, "assertEqual", vec![pa, pb], None).into());
    let a = b.ty("Any", vec![]);
    let pa = b.param(a, "expected");
    let a = b.ty("Any", vec![]);
    let pb = b.param(a, "actual");
    let v = b.ty("void", vec![]);
    defs.push(b.function(v, "assertNotEqual", vec![pa, pb], None).into());

    let ns = b.namespace("quark", defs);
    b.file("quark.q", vec![], vec![ns.into()])
}

fn list_primitive(b: &mut Builder) -> Definition {
    let t = b.tparam("T");

    let elem = b.ty("T", vec![]);
    let list_t = b.ty("List", vec![elem]);
    let list_init_chunk = b.fixed("list()");
    let init_body = MethodBody::Native(b.native_block("py", vec![], vec![list_init_chunk]));
    let init = b.method(Some(list_t), "__init__", vec![], Some(init_body));

    let v = b.ty("void", vec![]);
    let elem = b.ty("T", vec![]);
    let ep = b.param(elem, "element");
    let chunks = vec![
        b.native_var("self"),
        b.fixed(".append("),
        b.native_var("element"),
        b.fixed(")"),
    ];
    let append_body = MethodBody::Native(b.native_block("py", vec![], chunks));
    let append = b.method(Some(v), "append", vec![ep], Some(append_body));

    let list_mapping_chunk = b.fixed("list");
    let mapping = b.native_block("py", vec![], vec![list_mapping_chunk]);
    b.primitive("List", vec![t], vec![init.into(), append.into()], vec![mapping])
        .into()
}

fn map_primitive(b: &mut Builder) -> Definition {
    let k = b.tparam("K");
    let v = b.tparam("V");

    let kt = b.ty("K", vec![]);
    let vt = b.ty("V", vec![]);
    let map_kv = b.ty("Map", vec![kt, vt]);
    let dict_init_chunk = b.fixed("dict()");
    let init_body = MethodBody::Native(b.native_block("py", vec![], vec![dict_init_chunk]));
    let init = b.method(Some(map_kv), "__init__", vec![], Some(init_body));

    let void_t = b.ty("void", vec![]);
    let kt = b.ty("K", vec![]);
    let kp = b.param(kt, "key");
    let vt = b.ty("V", vec![]);
    let vp = b.param(vt, "value");
    let chunks = vec![
        b.native_var("self"),
        b.fixed("["),
        b.native_var("key"),
        b.fixed("] = "),
        b.native_var("value"),
    ];
    let set_body = MethodBody::Native(b.native_block("py", vec![], chunks));
    let set = b.method(Some(void_t), "__set__", vec![kp, vp], Some(set_body));

    let dict_mapping_chunk = b.fixed("dict");
    let mapping = b.native_block("py", vec![], vec![dict_mapping_chunk]);
    b.primitive("Map", vec![k, v], vec![init.into(), set.into()], vec![mapping])
        .into()
}

/// A signature-only method.
fn sig(b: &mut Builder, ret: &str, name: &str, params: &[(&str, &str)]) -> Definition {
    let mut ps = Vec::new();
    for (t, n) in params {
        let ty = b.ty(t, vec![]);
        ps.push(b.param(ty, n));
    }
    let ret = b.ty(ret, vec![]);
    b.method(Some(ret), name, ps, None).into()
}

// ── Expected-IR shorthands ──────────────────────────────────────────────

pub fn scope() -> String {
    format!("{PKG}:{PKG}")
}

pub fn name(sym: &str) -> ir::Name {
    ir::Name {
        package: scope(),
        name: sym.to_string(),
    }
}

pub fn rref(sym: &str) -> ir::Ref {
    ir::Ref {
        package: scope(),
        name: sym.to_string(),
    }
}

pub fn invoke(sym: &str, args: Vec<ir::Expr>) -> ir::Expr {
    ir::Expr::Invoke {
        target: rref(sym),
        args,
    }
}

pub fn send(receiver: ir::Expr, name: &str, args: Vec<ir::Expr>) -> ir::Expr {
    ir::Expr::Send {
        receiver: Box::new(receiver),
        name: name.to_string(),
        args,
    }
}

pub fn var(n: &str) -> ir::Expr {
    ir::Expr::Var(n.to_string())
}

pub fn int(v: i64) -> ir::Expr {
    ir::Expr::IntLit(v)
}

pub fn def_name(def: &ir::Def) -> &str {
    match def {
        ir::Def::Function(f) => &f.name.name,
        ir::Def::NativeFunction(f) => &f.name.name,
        ir::Def::Check(c) => &c.name.name,
        ir::Def::Class(c) | ir::Def::TestClass(c) => &c.name.name,
        ir::Def::Interface(i) => &i.name.name,
    }
}

pub fn find<'p>(pkg: &'p ir::Package, name: &str) -> &'p ir::Def {
    pkg.definitions
        .iter()
        .find(|d| def_name(d) == name)
        .unwrap_or_else(|| {
            panic!(
                "no definition `{name}`; package has {:?}",
                pkg.definitions.iter().map(def_name).collect::<Vec<_>>()
            )
        })
}
