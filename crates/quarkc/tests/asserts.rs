//! Assertion detection: definitions holding assertions reclassify as
//! test-bearing IR nodes, and test classes may not declare constructors.

mod common;

use common::*;
use quark_ast::build::Builder;
use quark_ast::item::{File, MethodBody};
use quark_ir as ir;

fn test_class_file(b: &mut Builder, with_constructor: bool) -> File {
    let one = b.num("1");
    let two = b.num("2");
    let assert_fn = b.var("assertEqual");
    let call = b.call(assert_fn, vec![one, two]);
    let stmt = b.estmt(call);
    let body = b.block(vec![stmt]);
    let v = b.ty("void", vec![]);
    let test_add = b.method(Some(v), "testAdd", vec![], Some(MethodBody::Block(body)));

    let mut members = vec![test_add.into()];
    if with_constructor {
        let ctor_body = b.block(vec![]);
        let ctor = b.method(None, "CalcTest", vec![], Some(MethodBody::Block(ctor_body)));
        members.push(ctor.into());
    }
    let class = b.class("CalcTest", vec![], vec![], members);
    let ns = b.namespace("app", vec![class.into()]);
    let import = b.import("quark");
    b.file("app.q", vec![import], vec![ns.into()])
}

#[test]
fn assertions_make_the_class_a_test_class() {
    let mut b = Builder::new();
    let std = builtins(&mut b);
    let file = test_class_file(&mut b, false);
    let (c, pkg) = compile(vec![std, file]);

    let ir::Def::TestClass(class) = find(&pkg, "app_CalcTest") else {
        panic!("a class holding an assertion must lower to a test class");
    };
    let method = class
        .members
        .iter()
        .find_map(|m| match m {
            ir::Member::TestMethod(m) => Some(m),
            _ => None,
        })
        .expect("the asserting method must become a test method");
    assert_eq!(method.name, "testAdd");
    assert_eq!(
        method.body,
        ir::FnBody::Block(ir::Block(vec![ir::Stmt::Evaluate(ir::Expr::AssertEqual(
            Box::new(int(1)),
            Box::new(int(2)),
        ))]))
    );
    assert!(c.warnings().is_empty());
}

#[test]
fn test_classes_may_not_declare_constructors() {
    let mut b = Builder::new();
    let std = builtins(&mut b);
    let file = test_class_file(&mut b, true);
    let (c, pkg) = compile(vec![std, file]);

    // Reported, not fatal; the constructor is dropped from the output.
    let ir::Def::TestClass(class) = find(&pkg, "app_CalcTest") else {
        panic!("still a test class");
    };
    assert!(!class
        .members
        .iter()
        .any(|m| matches!(m, ir::Member::Constructor(_))));
    assert_eq!(c.warnings().len(), 1);
    assert!(c.warnings()[0].contains("test class"));
}

#[test]
fn asserting_functions_lower_to_checks() {
    let mut b = Builder::new();
    let std = builtins(&mut b);
    let three = b.num("3");
    let three2 = b.num("3");
    let assert_fn = b.var("assertNotEqual");
    let call = b.call(assert_fn, vec![three, three2]);
    let stmt = b.estmt(call);
    let body = b.block(vec![stmt]);
    let v = b.ty("void", vec![]);
    let f = b.function(v, "checkMath", vec![], Some(body));
    let ns = b.namespace("app", vec![f.into()]);
    let import = b.import("quark");
    let file = b.file("app.q", vec![import], vec![ns.into()]);

    let (_, pkg) = compile(vec![std, file]);
    let ir::Def::Check(check) = find(&pkg, "app_checkMath") else {
        panic!("an asserting function must lower to a check");
    };
    assert_eq!(
        check.body,
        ir::Block(vec![ir::Stmt::Evaluate(ir::Expr::AssertNotEqual(
            Box::new(int(3)),
            Box::new(int(3)),
        ))])
    );
}
