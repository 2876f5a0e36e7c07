//! Control-flow rewrites: switch desugaring and boolean short-circuit.

mod common;

use common::*;
use quark_ast::build::Builder;
use quark_ast::item::MethodBody;
use quark_ir as ir;

#[test]
fn switch_desugars_to_a_temp_and_nested_ifs() {
    let mut b = Builder::new();
    let std = builtins(&mut b);

    // class Item { bool __eq__(int other) { return true; } }
    let bt = b.ty("bool", vec![]);
    let ot = b.ty("int", vec![]);
    let op = b.param(ot, "other");
    let t = b.bool_(true);
    let ret = b.ret(Some(t));
    let eq_body = b.block(vec![ret]);
    let eq = b.method(Some(bt), "__eq__", vec![op], Some(MethodBody::Block(eq_body)));
    let item = b.class("Item", vec![], vec![], vec![eq.into()]);

    // void route(Item x) { switch (x) { case 1, 2: {} case 3: {} } }
    let one = b.num("1");
    let two = b.num("2");
    let body1 = b.block(vec![]);
    let case12 = b.case(vec![one, two], body1);
    let three = b.num("3");
    let body2 = b.block(vec![]);
    let case3 = b.case(vec![three], body2);
    let x = b.var("x");
    let switch = b.switch(x, vec![case12, case3]);
    let body = b.block(vec![switch]);
    let it = b.ty("Item", vec![]);
    let xp = b.param(it, "x");
    let v = b.ty("void", vec![]);
    let route = b.function(v, "route", vec![xp], Some(body));

    let ns = b.namespace("app", vec![item.into(), route.into()]);
    let import = b.import("quark");
    let file = b.file("app.q", vec![import], vec![ns.into()]);

    let (_, pkg) = compile(vec![std, file]);
    let ir::Def::Function(route) = find(&pkg, "app_route") else {
        panic!("expected a function");
    };
    let expected = ir::Block(vec![
        ir::Stmt::Local {
            name: "temp0".to_string(),
            ty: ir::Type::Class(rref("app_Item")),
            value: None,
        },
        ir::Stmt::Assign {
            target: var("temp0"),
            value: var("x"),
        },
        ir::Stmt::If {
            predicate: ir::Expr::Or(
                Box::new(send(var("temp0"), "__eq__", vec![int(1)])),
                Box::new(send(var("temp0"), "__eq__", vec![int(2)])),
            ),
            consequence: ir::Block(vec![]),
            alternative: ir::Block(vec![ir::Stmt::If {
                predicate: send(var("temp0"), "__eq__", vec![int(3)]),
                consequence: ir::Block(vec![]),
                alternative: ir::Block(vec![]),
            }]),
        },
    ]);
    assert_eq!(route.body, expected);
}

#[test]
fn boolean_operators_short_circuit() {
    let mut b = Builder::new();
    let std = builtins(&mut b);

    // bool either(bool a, bool b) { return a || b; }
    let a = b.var("a");
    let b2 = b.var("b");
    let or = b.send(a, "__or__", vec![b2]);
    let ret = b.ret(Some(or));
    let body = b.block(vec![ret]);
    let bt = b.ty("bool", vec![]);
    let at = b.ty("bool", vec![]);
    let ap = b.param(at, "a");
    let bt2 = b.ty("bool", vec![]);
    let bp = b.param(bt2, "b");
    let either = b.function(bt, "either", vec![ap, bp], Some(body));

    // bool both(bool a, bool b) { return a && b; }
    let a = b.var("a");
    let b2 = b.var("b");
    let and = b.send(a, "__and__", vec![b2]);
    let ret = b.ret(Some(and));
    let body = b.block(vec![ret]);
    let bt = b.ty("bool", vec![]);
    let at = b.ty("bool", vec![]);
    let ap = b.param(at, "a");
    let bt2 = b.ty("bool", vec![]);
    let bp = b.param(bt2, "b");
    let both = b.function(bt, "both", vec![ap, bp], Some(body));

    let ns = b.namespace("app", vec![either.into(), both.into()]);
    let import = b.import("quark");
    let file = b.file("app.q", vec![import], vec![ns.into()]);

    let (_, pkg) = compile(vec![std, file]);

    let ir::Def::Function(either) = find(&pkg, "app_either") else {
        panic!("expected a function");
    };
    assert_eq!(
        either.body,
        ir::Block(vec![ir::Stmt::Return(Some(ir::Expr::Or(
            Box::new(var("a")),
            Box::new(var("b")),
        )))])
    );

    let ir::Def::Function(both) = find(&pkg, "app_both") else {
        panic!("expected a function");
    };
    assert_eq!(
        both.body,
        ir::Block(vec![ir::Stmt::Return(Some(ir::Expr::And(
            Box::new(var("a")),
            Box::new(var("b")),
        )))])
    );
}
