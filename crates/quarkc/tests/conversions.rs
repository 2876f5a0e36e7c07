//! Implicit coercions: recorded during checking, applied exactly once
//! during lowering.

mod common;

use common::*;
use quark_ast::build::Builder;
use quark_ir as ir;

#[test]
fn literals_convert_to_the_expected_type() {
    let mut b = Builder::new();
    let std = builtins(&mut b);

    // float promote() { return 1; }
    let one = b.num("1");
    let ret = b.ret(Some(one));
    let body = b.block(vec![ret]);
    let ft = b.ty("float", vec![]);
    let f = b.function(ft, "promote", vec![], Some(body));
    let ns = b.namespace("app", vec![f.into()]);
    let import = b.import("quark");
    let file = b.file("app.q", vec![import], vec![ns.into()]);

    let (_, pkg) = compile(vec![std, file]);
    let ir::Def::Function(promote) = find(&pkg, "app_promote") else {
        panic!("expected a function");
    };
    // Wrapped in exactly one conversion invoke.
    assert_eq!(
        promote.body,
        ir::Block(vec![ir::Stmt::Return(Some(invoke(
            "quark_int___to_float__",
            vec![int(1)]
        )))])
    );
}

#[test]
fn call_arguments_convert_against_parameter_types() {
    let mut b = Builder::new();
    let std = builtins(&mut b);

    // float through(float x) { return x; }
    let x = b.var("x");
    let ret = b.ret(Some(x));
    let body = b.block(vec![ret]);
    let ft = b.ty("float", vec![]);
    let xt = b.ty("float", vec![]);
    let xp = b.param(xt, "x");
    let through = b.function(ft, "through", vec![xp], Some(body));

    // void go() { through(2); }
    let two = b.num("2");
    let callee = b.var("through");
    let call = b.call(callee, vec![two]);
    let stmt = b.estmt(call);
    let body = b.block(vec![stmt]);
    let v = b.ty("void", vec![]);
    let go = b.function(v, "go", vec![], Some(body));

    let ns = b.namespace("app", vec![through.into(), go.into()]);
    let import = b.import("quark");
    let file = b.file("app.q", vec![import], vec![ns.into()]);

    let (_, pkg) = compile(vec![std, file]);
    let ir::Def::Function(go) = find(&pkg, "app_go") else {
        panic!("expected a function");
    };
    assert_eq!(
        go.body,
        ir::Block(vec![ir::Stmt::Evaluate(invoke(
            "app_through",
            vec![invoke("quark_int___to_float__", vec![int(2)])]
        ))])
    );
}

#[test]
fn compatible_arguments_pass_unconverted() {
    let mut b = Builder::new();
    let std = builtins(&mut b);

    // float keep(float x) { return x; } void go() { keep(1.5); }
    let x = b.var("x");
    let ret = b.ret(Some(x));
    let body = b.block(vec![ret]);
    let ft = b.ty("float", vec![]);
    let xt = b.ty("float", vec![]);
    let xp = b.param(xt, "x");
    let keep = b.function(ft, "keep", vec![xp], Some(body));

    let lit = b.num("1.5");
    let callee = b.var("keep");
    let call = b.call(callee, vec![lit]);
    let stmt = b.estmt(call);
    let body = b.block(vec![stmt]);
    let v = b.ty("void", vec![]);
    let go = b.function(v, "go", vec![], Some(body));

    let ns = b.namespace("app", vec![keep.into(), go.into()]);
    let import = b.import("quark");
    let file = b.file("app.q", vec![import], vec![ns.into()]);

    let (_, pkg) = compile(vec![std, file]);
    let ir::Def::Function(go) = find(&pkg, "app_go") else {
        panic!("expected a function");
    };
    assert_eq!(
        go.body,
        ir::Block(vec![ir::Stmt::Evaluate(invoke(
            "app_keep",
            vec![ir::Expr::FloatLit(1.5)]
        ))])
    );
}
