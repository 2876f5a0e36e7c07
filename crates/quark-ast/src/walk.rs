//! Tree walking: a uniform cursor over every node kind, depth- and
//! breadth-first traversal, and a parent/ancestor query built once per tree.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use crate::expr::{Expression, NativeBlock, NativeChunk};
use crate::item::{Declaration, Definition, File, Import, Package, Param, TypeExpr, TypeParam};
use crate::stmt::{Block, Case, Statement};
use crate::NodeId;

/// A borrowed cursor over any node kind.
#[derive(Debug, Clone, Copy)]
pub enum AnyNode<'a> {
    Package(&'a Package),
    File(&'a File),
    Import(&'a Import),
    Definition(&'a Definition),
    TypeParam(&'a TypeParam),
    Param(&'a Param),
    Declaration(&'a Declaration),
    TypeExpr(&'a TypeExpr),
    Block(&'a Block),
    Statement(&'a Statement),
    Case(&'a Case),
    Expression(&'a Expression),
    NativeBlock(&'a NativeBlock),
    NativeChunk(&'a NativeChunk),
}

impl<'a> AnyNode<'a> {
    pub fn id(&self) -> NodeId {
        match self {
            AnyNode::Package(n) => n.id,
            AnyNode::File(n) => n.id,
            AnyNode::Import(n) => n.id,
            AnyNode::Definition(n) => n.id(),
            AnyNode::TypeParam(n) => n.id,
            AnyNode::Param(n) => n.id,
            AnyNode::Declaration(n) => n.id,
            AnyNode::TypeExpr(n) => n.id,
            AnyNode::Block(n) => n.id,
            AnyNode::Statement(n) => n.id(),
            AnyNode::Case(n) => n.id,
            AnyNode::Expression(n) => n.id(),
            AnyNode::NativeBlock(n) => n.id,
            AnyNode::NativeChunk(n) => n.id(),
        }
    }

    /// Direct children, in source order.
    pub fn children(&self) -> Vec<AnyNode<'a>> {
        let mut out = Vec::new();
        match self {
            AnyNode::Package(p) => out.extend(p.files.iter().map(AnyNode::File)),
            AnyNode::File(f) => {
                out.extend(f.imports.iter().map(AnyNode::Import));
                out.extend(f.definitions.iter().map(AnyNode::Definition));
            }
            AnyNode::Import(_) => {}
            AnyNode::Definition(d) => definition_children(d, &mut out),
            AnyNode::TypeParam(_) => {}
            AnyNode::Param(p) => out.push(AnyNode::TypeExpr(&p.ty)),
            AnyNode::Declaration(d) => {
                out.push(AnyNode::TypeExpr(&d.ty));
                if let Some(v) = &d.value {
                    out.push(AnyNode::Expression(v));
                }
            }
            AnyNode::TypeExpr(t) => out.extend(t.params.iter().map(AnyNode::TypeExpr)),
            AnyNode::Block(b) => out.extend(b.statements.iter().map(AnyNode::Statement)),
            AnyNode::Statement(s) => statement_children(s, &mut out),
            AnyNode::Case(c) => {
                out.extend(c.exprs.iter().map(AnyNode::Expression));
                out.push(AnyNode::Block(&c.body));
            }
            AnyNode::Expression(e) => expression_children(e, &mut out),
            AnyNode::NativeBlock(b) => out.extend(b.chunks.iter().map(AnyNode::NativeChunk)),
            AnyNode::NativeChunk(_) => {}
        }
        out
    }
}

fn definition_children<'a>(d: &'a Definition, out: &mut Vec<AnyNode<'a>>) {
    match d {
        Definition::Package(p) => out.extend(p.files.iter().map(AnyNode::File)),
        Definition::Namespace(ns) => out.extend(ns.definitions.iter().map(AnyNode::Definition)),
        Definition::Class(c) => {
            out.extend(c.params.iter().map(AnyNode::TypeParam));
            out.extend(c.bases.iter().map(AnyNode::TypeExpr));
            out.extend(c.members.iter().map(AnyNode::Definition));
        }
        Definition::Interface(i) => {
            out.extend(i.params.iter().map(AnyNode::TypeParam));
            out.extend(i.bases.iter().map(AnyNode::TypeExpr));
            out.extend(i.members.iter().map(AnyNode::Definition));
        }
        Definition::Primitive(p) => {
            out.extend(p.params.iter().map(AnyNode::TypeParam));
            out.extend(p.members.iter().map(AnyNode::Definition));
            out.extend(p.mappings.iter().map(AnyNode::NativeBlock));
        }
        Definition::Function(f) => {
            out.push(AnyNode::TypeExpr(&f.ty));
            out.extend(f.type_params.iter().map(AnyNode::TypeParam));
            out.extend(f.params.iter().map(AnyNode::Param));
            if let Some(b) = &f.body {
                out.push(AnyNode::Block(b));
            }
        }
        Definition::NativeFunction(f) => {
            out.push(AnyNode::TypeExpr(&f.ty));
            out.extend(f.params.iter().map(AnyNode::Param));
            if let Some(b) = &f.body {
                out.push(AnyNode::NativeBlock(b));
            }
        }
        Definition::Method(m) => {
            if let Some(t) = &m.ty {
                out.push(AnyNode::TypeExpr(t));
            }
            out.extend(m.params.iter().map(AnyNode::Param));
            match &m.body {
                Some(crate::item::MethodBody::Block(b)) => out.push(AnyNode::Block(b)),
                Some(crate::item::MethodBody::Native(b)) => out.push(AnyNode::NativeBlock(b)),
                None => {}
            }
        }
        Definition::Field(f) => {
            out.push(AnyNode::TypeExpr(&f.ty));
            if let Some(v) = &f.value {
                out.push(AnyNode::Expression(v));
            }
        }
        Definition::TypeParam(_) => {}
    }
}

fn statement_children<'a>(s: &'a Statement, out: &mut Vec<AnyNode<'a>>) {
    match s {
        Statement::If(i) => {
            out.push(AnyNode::Expression(&i.predicate));
            out.push(AnyNode::Block(&i.consequence));
            if let Some(alt) = &i.alternative {
                out.push(AnyNode::Block(alt));
            }
        }
        Statement::While(w) => {
            out.push(AnyNode::Expression(&w.condition));
            out.push(AnyNode::Block(&w.body));
        }
        Statement::Switch(sw) => {
            out.push(AnyNode::Expression(&sw.expr));
            out.extend(sw.cases.iter().map(AnyNode::Case));
        }
        Statement::Local(l) => out.push(AnyNode::Declaration(&l.declaration)),
        Statement::Assign(a) => {
            out.push(AnyNode::Expression(&a.lhs));
            out.push(AnyNode::Expression(&a.rhs));
        }
        Statement::Expr(e) => out.push(AnyNode::Expression(&e.expr)),
        Statement::Return(r) => {
            if let Some(e) = &r.expr {
                out.push(AnyNode::Expression(e));
            }
        }
        Statement::Break(_) | Statement::Continue(_) => {}
    }
}

fn expression_children<'a>(e: &'a Expression, out: &mut Vec<AnyNode<'a>>) {
    match e {
        Expression::Call(c) => {
            out.push(AnyNode::Expression(&c.expr));
            out.extend(c.args.iter().map(AnyNode::Expression));
        }
        Expression::Attr(a) => out.push(AnyNode::Expression(&a.expr)),
        Expression::List(l) => out.extend(l.elements.iter().map(AnyNode::Expression)),
        Expression::Map(m) => {
            for entry in &m.entries {
                out.push(AnyNode::Expression(&entry.key));
                out.push(AnyNode::Expression(&entry.value));
            }
        }
        Expression::Type(t) => out.push(AnyNode::TypeExpr(t)),
        Expression::Var(_)
        | Expression::Number(_)
        | Expression::String(_)
        | Expression::Bool(_)
        | Expression::Null(_) => {}
    }
}

/// Pre-order depth-first traversal of `root` and everything below it.
pub fn walk_dfs<'a>(root: AnyNode<'a>) -> Vec<AnyNode<'a>> {
    let mut out = Vec::new();
    let mut pending = vec![root];
    while let Some(node) = pending.pop() {
        out.push(node);
        let mut children = node.children();
        children.reverse();
        pending.extend(children);
    }
    out
}

/// Level-order traversal of `root` and everything below it.
pub fn walk_bfs<'a>(root: AnyNode<'a>) -> Vec<AnyNode<'a>> {
    let mut out = Vec::new();
    let mut pending = VecDeque::from([root]);
    while let Some(node) = pending.pop_front() {
        out.push(node);
        pending.extend(node.children());
    }
    out
}

/// Parent/ancestor queries over one tree, built by a single breadth-first
/// pass.
pub struct Parents<'a> {
    parent: FxHashMap<NodeId, NodeId>,
    nodes: FxHashMap<NodeId, AnyNode<'a>>,
}

impl<'a> Parents<'a> {
    pub fn new(root: AnyNode<'a>) -> Self {
        Self::from_roots([root])
    }

    /// Build the query over a forest, e.g. every file of a compilation.
    pub fn from_roots(roots: impl IntoIterator<Item = AnyNode<'a>>) -> Self {
        let mut parent = FxHashMap::default();
        let mut nodes = FxHashMap::default();
        let mut pending: VecDeque<AnyNode<'a>> = VecDeque::new();
        for root in roots {
            nodes.insert(root.id(), root);
            pending.push_back(root);
        }
        while let Some(node) = pending.pop_front() {
            for child in node.children() {
                parent.insert(child.id(), node.id());
                nodes.insert(child.id(), child);
                pending.push_back(child);
            }
        }
        Self { parent, nodes }
    }

    /// Structural parent, or `None` for the root.
    pub fn parent(&self, id: NodeId) -> Option<AnyNode<'a>> {
        self.parent.get(&id).map(|pid| self.nodes[pid])
    }

    /// Every enclosing node, innermost first.
    pub fn ancestors(&self, id: NodeId) -> Vec<AnyNode<'a>> {
        let mut out = Vec::new();
        let mut cur = id;
        while let Some(p) = self.parent.get(&cur) {
            out.push(self.nodes[p]);
            cur = *p;
        }
        out
    }

    /// The nearest enclosing node matching `pred`, if any.
    pub fn ancestor_where(
        &self,
        id: NodeId,
        pred: impl Fn(&AnyNode<'a>) -> bool,
    ) -> Option<AnyNode<'a>> {
        self.ancestors(id).into_iter().find(|n| pred(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::Builder;

    #[test]
    fn dfs_is_preorder() {
        let mut b = Builder::new();
        let f = b.var("f");
        let x = b.var("x");
        let call = b.call(f, vec![x]);
        let expr_ids: Vec<NodeId> = walk_dfs(AnyNode::Expression(&call))
            .iter()
            .map(|n| n.id())
            .collect();
        // Call first, then callee, then argument.
        assert_eq!(expr_ids.len(), 3);
        assert_eq!(expr_ids[0], call.id());
    }

    #[test]
    fn parents_find_enclosing_nodes() {
        let mut b = Builder::new();
        let ty = b.ty("int", vec![]);
        let body = b.block(vec![]);
        let f = b.function(ty, "f", vec![], Some(body));
        let def = crate::item::Definition::Function(f);
        let root = AnyNode::Definition(&def);
        let parents = Parents::new(root);
        let all = walk_dfs(root);
        let block = all
            .iter()
            .find(|n| matches!(n, AnyNode::Block(_)))
            .unwrap();
        let up = parents.parent(block.id()).unwrap();
        assert_eq!(up.id(), def.id());
        assert!(parents.parent(def.id()).is_none());
    }
}
