//! The Quark syntax tree.
//!
//! The parser is an external collaborator: it hands the core a tree of
//! tagged records built from the constructors in [`build`]. One enum per
//! variant hierarchy ([`item::Definition`], [`stmt::Statement`],
//! [`expr::Expression`], [`expr::NativeChunk`]) keeps every downstream
//! dispatch an exhaustive match.
//!
//! Every node carries a [`NodeId`] assigned at construction time and a
//! [`Span`] the core treats as opaque. Node identity is what the later
//! phases key on: the symbol table's resolution map and the typespace's
//! type and conversion maps are all `NodeId`-indexed.

pub mod build;
pub mod expr;
pub mod item;
pub mod stmt;
pub mod walk;

use std::fmt;

use quark_common::Span;

/// Stable identity of one syntax node, assigned by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Monotonic [`NodeId`] generator. The parser owns one per compilation.
#[derive(Debug, Default)]
pub struct NodeIds {
    next: u32,
}

impl NodeIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }
}

/// An identifier token: its text and where it was written.
#[derive(Debug, Clone, PartialEq)]
pub struct Name {
    pub text: String,
    pub span: Span,
}

impl Name {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            span: Span::zero(),
        }
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Join dotted name segments into one path string.
pub fn dotted(parts: &[Name]) -> String {
    parts
        .iter()
        .map(|n| n.text.as_str())
        .collect::<Vec<_>>()
        .join(".")
}
