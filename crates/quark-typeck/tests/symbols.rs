//! Symbol table behaviour: registration, fully-qualified names, binding
//! classification and structural parents.

use quark_common::Errors;
use quark_ast::build::Builder;
use quark_ast::item::{Definition, MethodBody};
use quark_ast::walk::AnyNode;
use quark_typeck::symbols::{Binding, Symbols};

#[test]
fn definitions_register_under_dotted_names() {
    let mut b = Builder::new();
    let pt = b.ty("a.P", vec![]);
    let field = b.field(pt, "x", None);
    let prim = b.primitive("P", vec![], vec![], vec![]);
    let class = b.class("C", vec![], vec![], vec![field.into()]);
    let ns = b.namespace("a", vec![prim.into(), class.into()]);
    let file = b.file("lib.q", vec![], vec![ns.into()]);

    let mut errors = Errors::new();
    let mut symbols = Symbols::new();
    symbols.add(file, &mut errors);
    assert!(errors.is_empty());

    assert!(matches!(symbols.get("a"), Some(Definition::Namespace(_))));
    assert!(matches!(symbols.get("a.P"), Some(Definition::Primitive(_))));
    assert!(matches!(symbols.get("a.C"), Some(Definition::Class(_))));
    assert!(matches!(symbols.get("a.C.x"), Some(Definition::Field(_))));
    assert_eq!(symbols.parent_fq("a.C.x"), Some(&"a.C".to_string()));
}

#[test]
fn native_functions_register_with_target_segments() {
    let mut b = Builder::new();
    let prim = b.primitive("P", vec![], vec![], vec![]);
    let rt = b.ty("a.P", vec![]);
    let nf = b.native_function(rt, "puts", vec![], None);
    let ns = b.namespace("a", vec![prim.into(), nf.into()]);
    let file = b.file("lib.q", vec![], vec![ns.into()]);

    let mut errors = Errors::new();
    let mut symbols = Symbols::new();
    symbols.add(file, &mut errors);
    assert!(matches!(
        symbols.get("a::puts"),
        Some(Definition::NativeFunction(_))
    ));
}

#[test]
fn duplicate_names_in_one_scope_are_diagnosed() {
    let mut b = Builder::new();
    let p1 = b.primitive("P", vec![], vec![], vec![]);
    let p2 = b.primitive("P", vec![], vec![], vec![]);
    let ns = b.namespace("a", vec![p1.into(), p2.into()]);
    let file = b.file("lib.q", vec![], vec![ns.into()]);

    let mut errors = Errors::new();
    let mut symbols = Symbols::new();
    symbols.add(file, &mut errors);
    let err = errors.check().unwrap_err();
    assert!(err.diagnostics[0].contains("duplicate definition of `a.P`"));
}

#[test]
fn namespaces_merge_across_files() {
    let mut b = Builder::new();
    let p1 = b.primitive("P", vec![], vec![], vec![]);
    let ns1 = b.namespace("a", vec![p1.into()]);
    let f1 = b.file("one.q", vec![], vec![ns1.into()]);
    let p2 = b.primitive("Q", vec![], vec![], vec![]);
    let ns2 = b.namespace("a", vec![p2.into()]);
    let f2 = b.file("two.q", vec![], vec![ns2.into()]);

    let mut errors = Errors::new();
    let mut symbols = Symbols::new();
    symbols.add(f1, &mut errors);
    symbols.add(f2, &mut errors);
    assert!(errors.is_empty());
    assert!(symbols.get("a.P").is_some());
    assert!(symbols.get("a.Q").is_some());
}

#[test]
fn bindings_classify_by_enclosing_scope() {
    let mut b = Builder::new();

    // namespace a { primitive P {}
    //   class C { a.P f;
    //     a.P get(a.P arg) { a.P tmp = arg; self; f; return tmp; } } }
    let prim = b.primitive("P", vec![], vec![], vec![]);
    let ft = b.ty("a.P", vec![]);
    let field = b.field(ft, "f", None);

    let dt = b.ty("a.P", vec![]);
    let arg_use = b.var("arg");
    let arg_id = arg_use.id();
    let tmp_decl = b.local(dt, "tmp", Some(arg_use));
    let self_use = b.var("self");
    let self_id = self_use.id();
    let self_stmt = b.estmt(self_use);
    let field_use = b.var("f");
    let field_id = field_use.id();
    let field_stmt = b.estmt(field_use);
    let tmp_use = b.var("tmp");
    let tmp_id = tmp_use.id();
    let ret = b.ret(Some(tmp_use));
    let body = b.block(vec![tmp_decl, self_stmt, field_stmt, ret]);

    let rt = b.ty("a.P", vec![]);
    let at = b.ty("a.P", vec![]);
    let ap = b.param(at, "arg");
    let get = b.method(Some(rt), "get", vec![ap], Some(MethodBody::Block(body)));
    let class = b.class("C", vec![], vec![], vec![field.into(), get.into()]);
    let ns = b.namespace("a", vec![prim.into(), class.into()]);
    let file = b.file("lib.q", vec![], vec![ns.into()]);

    let mut errors = Errors::new();
    let mut symbols = Symbols::new();
    symbols.add(file, &mut errors);
    symbols.resolve(&mut errors);
    assert!(errors.is_empty(), "{:?}", errors.diagnostics());

    assert!(matches!(symbols.binding(arg_id), Some(Binding::Param(_))));
    assert!(matches!(symbols.binding(tmp_id), Some(Binding::Local(_))));
    assert!(matches!(symbols.binding(field_id), Some(Binding::Field(_))));
    assert!(matches!(
        symbols.binding(self_id),
        Some(Binding::SelfRef { of }) if of == "a.C"
    ));
}

#[test]
fn structural_parents_are_queryable() {
    let mut b = Builder::new();
    let pt = b.ty("a.P", vec![]);
    let field = b.field(pt, "x", None);
    let field_id = field.id;
    let prim = b.primitive("P", vec![], vec![], vec![]);
    let class = b.class("C", vec![], vec![], vec![field.into()]);
    let class_id = class.id;
    let ns = b.namespace("a", vec![prim.into(), class.into()]);
    let file = b.file("lib.q", vec![], vec![ns.into()]);

    let mut errors = Errors::new();
    let mut symbols = Symbols::new();
    symbols.add(file, &mut errors);

    let parents = symbols.parents();
    let parent = parents.parent(field_id).expect("field has a parent");
    assert_eq!(parent.id(), class_id);
    assert!(parents
        .ancestors(field_id)
        .iter()
        .any(|n| matches!(n, AnyNode::File(_))));
}

#[test]
fn top_level_eligibility() {
    let mut b = Builder::new();
    let prim = b.primitive("P", vec![], vec![], vec![]);
    let rt = b.ty("a.P", vec![]);
    let body = b.block(vec![]);
    let with_body = b.function(rt, "f", vec![], Some(body));
    let rt = b.ty("a.P", vec![]);
    let without_body = b.function(rt, "g", vec![], None);
    let class = b.class("C", vec![], vec![], vec![]);
    let ns = b.namespace(
        "a",
        vec![prim.into(), with_body.into(), without_body.into(), class.into()],
    );
    let file = b.file("lib.q", vec![], vec![ns.into()]);

    let mut errors = Errors::new();
    let mut symbols = Symbols::new();
    symbols.add(file, &mut errors);

    let is_top = |fq: &str| {
        let def = symbols.get(fq).unwrap();
        symbols.is_top(fq, def)
    };
    assert!(is_top("a.f"));
    assert!(!is_top("a.g"));
    assert!(is_top("a.C"));
    assert!(!is_top("a.P"));
    assert!(!is_top("a"));
}
