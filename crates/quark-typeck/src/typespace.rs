//! The typespace: structural descriptions of every definition, the
//! node-to-type map, and the conversion table.
//!
//! Generic definitions are stored as [`TypeNode::Template`] and behave as
//! their ground body once a positional binding is zipped in. A [`View`] is
//! a cursor into the typespace parameterised by a concrete bindings map;
//! lowering installs one per instantiation.

use indexmap::IndexMap;
use quark_ast::NodeId;
use rustc_hash::FxHashMap;

use crate::ty::{Bindings, Ref};

/// What kind of object a member table describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Class,
    Interface,
    Primitive,
}

/// A typespace entry.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeNode {
    /// A generic definition: formal parameter names and the open body.
    Template {
        params: Vec<String>,
        body: Box<TypeNode>,
    },
    /// A function, method or constructor signature.
    Callable(Callable),
    /// A class, interface or primitive with its member table.
    Object(Object),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Callable {
    pub params: Vec<Ref>,
    pub result: Ref,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    pub kind: ObjectKind,
    pub bases: Vec<Ref>,
    /// Member name to member ref. Method refs address the member's own
    /// typespace entry and carry the parent's formal parameters so a
    /// binding flows through instantiation; field refs are the field's
    /// type.
    pub byname: FxHashMap<String, Ref>,
}

impl TypeNode {
    fn bind(&self, bindings: &Bindings) -> TypeNode {
        match self {
            TypeNode::Template { params, body } => TypeNode::Template {
                params: params.clone(),
                body: Box::new(body.bind(bindings)),
            },
            TypeNode::Callable(c) => TypeNode::Callable(Callable {
                params: c.params.iter().map(|p| p.bind(bindings)).collect(),
                result: c.result.bind(bindings),
            }),
            TypeNode::Object(o) => TypeNode::Object(Object {
                kind: o.kind,
                bases: o.bases.iter().map(|b| b.bind(bindings)).collect(),
                byname: o
                    .byname
                    .iter()
                    .map(|(k, v)| (k.clone(), v.bind(bindings)))
                    .collect(),
            }),
        }
    }
}

/// The frozen result of type construction plus the per-node maps the
/// checker fills in.
#[derive(Debug, Default)]
pub struct Typespace {
    nodes: IndexMap<String, TypeNode>,
    types: FxHashMap<NodeId, Ref>,
    /// AST expression identity to the name of the coercion member that
    /// bridges its inferred type to its expected type.
    pub conversions: FxHashMap<NodeId, String>,
}

impl Typespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_node(&mut self, fq: impl Into<String>, node: TypeNode) {
        self.nodes.insert(fq.into(), node);
    }

    pub fn contains_node(&self, fq: &str) -> bool {
        self.nodes.contains_key(fq)
    }

    /// Resolve a ref to its (instantiated) typespace node.
    pub fn resolve(&self, r: &Ref) -> Option<TypeNode> {
        match self.nodes.get(&r.name)? {
            TypeNode::Template { params, body } => {
                let bindings: Bindings = params
                    .iter()
                    .cloned()
                    .zip(r.params.iter().cloned())
                    .collect();
                Some(body.bind(&bindings))
            }
            node => Some(node.clone()),
        }
    }

    /// Look up a member ref on a receiver type, walking bases.
    pub fn member_ref(&self, recv: &Ref, name: &str) -> Option<Ref> {
        match self.resolve(recv)? {
            TypeNode::Object(o) => {
                if let Some(m) = o.byname.get(name) {
                    return Some(m.clone());
                }
                o.bases.iter().find_map(|b| self.member_ref(b, name))
            }
            _ => None,
        }
    }

    pub fn set_type(&mut self, id: NodeId, r: Ref) {
        self.types.insert(id, r);
    }

    pub fn type_of(&self, id: NodeId) -> Option<&Ref> {
        self.types.get(&id)
    }
}

/// A cursor into the typespace with a concrete bindings map.
pub struct View<'a> {
    pub types: &'a Typespace,
    pub bindings: Bindings,
}

impl<'a> View<'a> {
    pub fn new(types: &'a Typespace, bindings: Bindings) -> Self {
        Self { types, bindings }
    }

    /// The ref of an AST node with the current bindings applied.
    pub fn ref_of(&self, id: NodeId) -> Option<Ref> {
        Some(self.types.type_of(id)?.bind(&self.bindings))
    }

    /// Resolve an (already bound) ref to its typespace node.
    pub fn node_of(&self, r: &Ref) -> Option<TypeNode> {
        self.types.resolve(r)
    }

    pub fn conversion(&self, id: NodeId) -> Option<&'a String> {
        self.types.conversions.get(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::{INT, LIST};

    fn list_template() -> TypeNode {
        let mut byname = FxHashMap::default();
        byname.insert(
            "append".to_string(),
            Ref::with("quark.List.append", vec![Ref::new("quark.List.T")]),
        );
        TypeNode::Template {
            params: vec!["quark.List.T".to_string()],
            body: Box::new(TypeNode::Object(Object {
                kind: ObjectKind::Primitive,
                bases: Vec::new(),
                byname,
            })),
        }
    }

    #[test]
    fn template_instantiation_binds_members() {
        let mut ts = Typespace::new();
        ts.insert_node(LIST, list_template());
        let list_int = Ref::with(LIST, vec![Ref::new(INT)]);
        let member = ts.member_ref(&list_int, "append").unwrap();
        assert_eq!(
            member,
            Ref::with("quark.List.append", vec![Ref::new(INT)])
        );
    }

    #[test]
    fn member_lookup_walks_bases() {
        let mut ts = Typespace::new();
        let mut base_members = FxHashMap::default();
        base_members.insert("size".to_string(), Ref::new("a.Base.size"));
        ts.insert_node(
            "a.Base",
            TypeNode::Object(Object {
                kind: ObjectKind::Class,
                bases: Vec::new(),
                byname: base_members,
            }),
        );
        ts.insert_node(
            "a.Derived",
            TypeNode::Object(Object {
                kind: ObjectKind::Class,
                bases: vec![Ref::new("a.Base")],
                byname: FxHashMap::default(),
            }),
        );
        let m = ts.member_ref(&Ref::new("a.Derived"), "size").unwrap();
        assert_eq!(m, Ref::new("a.Base.size"));
    }

    #[test]
    fn view_binds_node_types() {
        let mut ts = Typespace::new();
        let id = quark_ast::NodeId(7);
        ts.set_type(id, Ref::with(LIST, vec![Ref::new("quark.List.T")]));
        let mut bindings = Bindings::default();
        bindings.insert("quark.List.T".to_string(), Ref::new(INT));
        let view = View::new(&ts, bindings);
        assert_eq!(
            view.ref_of(id).unwrap(),
            Ref::with(LIST, vec![Ref::new(INT)])
        );
    }
}
