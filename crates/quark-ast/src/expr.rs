//! Expressions and native fragments.

use quark_common::Span;

use crate::item::TypeExpr;
use crate::{Name, NodeId};

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Call(Call),
    Attr(Attr),
    Var(Var),
    Number(NumberLit),
    String(StringLit),
    Bool(BoolLit),
    List(ListLit),
    Map(MapLit),
    Null(NullLit),
    /// A type in expression position: a constructor callee or a type used
    /// as a value.
    Type(TypeExpr),
}

impl Expression {
    pub fn id(&self) -> NodeId {
        match self {
            Expression::Call(e) => e.id,
            Expression::Attr(e) => e.id,
            Expression::Var(e) => e.id,
            Expression::Number(e) => e.id,
            Expression::String(e) => e.id,
            Expression::Bool(e) => e.id,
            Expression::List(e) => e.id,
            Expression::Map(e) => e.id,
            Expression::Null(e) => e.id,
            Expression::Type(e) => e.id,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Expression::Call(e) => e.span,
            Expression::Attr(e) => e.span,
            Expression::Var(e) => e.span,
            Expression::Number(e) => e.span,
            Expression::String(e) => e.span,
            Expression::Bool(e) => e.span,
            Expression::List(e) => e.span,
            Expression::Map(e) => e.span,
            Expression::Null(e) => e.span,
            Expression::Type(e) => e.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub id: NodeId,
    pub span: Span,
    pub expr: Box<Expression>,
    pub args: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    pub id: NodeId,
    pub span: Span,
    pub expr: Box<Expression>,
    pub attr: Name,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Var {
    pub id: NodeId,
    pub span: Span,
    pub name: Name,
}

/// An integer or floating literal, kept as written.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberLit {
    pub id: NodeId,
    pub span: Span,
    pub text: String,
}

impl NumberLit {
    pub fn is_float(&self) -> bool {
        self.text.contains(['.', 'e', 'E'])
    }
}

/// A quoted string literal, escapes still in place.
#[derive(Debug, Clone, PartialEq)]
pub struct StringLit {
    pub id: NodeId,
    pub span: Span,
    pub text: String,
}

impl StringLit {
    /// Strip the surrounding quotes and decode `\n \r \t \" \\ \xHH`.
    ///
    /// Returns `None` when the text is not a well-formed literal; the
    /// checker reports that, so later phases can decode unconditionally.
    pub fn unquote(&self) -> Option<String> {
        let inner = self
            .text
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))?;
        let bytes = inner.as_bytes();
        let mut value = String::new();
        let mut idx = 0;
        while idx < bytes.len() {
            let c = bytes[idx] as char;
            if c != '\\' {
                let ch = inner[idx..].chars().next()?;
                value.push(ch);
                idx += ch.len_utf8();
                continue;
            }
            match *bytes.get(idx + 1)? as char {
                'x' => {
                    let hex = inner.get(idx + 2..idx + 4)?;
                    let code = u8::from_str_radix(hex, 16).ok()?;
                    value.push(code as char);
                    idx += 4;
                }
                'n' => {
                    value.push('\n');
                    idx += 2;
                }
                'r' => {
                    value.push('\r');
                    idx += 2;
                }
                't' => {
                    value.push('\t');
                    idx += 2;
                }
                '"' => {
                    value.push('"');
                    idx += 2;
                }
                '\\' => {
                    value.push('\\');
                    idx += 2;
                }
                _ => return None,
            }
        }
        Some(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoolLit {
    pub id: NodeId,
    pub span: Span,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListLit {
    pub id: NodeId,
    pub span: Span,
    pub elements: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapLit {
    pub id: NodeId,
    pub span: Span,
    pub entries: Vec<MapEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapEntry {
    pub key: Expression,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NullLit {
    pub id: NodeId,
    pub span: Span,
}

/// An opaque, templated source fragment for one emission target.
///
/// The chunk list alternates fixed text and in-scope variable references;
/// lowering turns it into template text with `{name}` placeholders and a
/// context binding each name to its lowered expression.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeBlock {
    pub id: NodeId,
    pub span: Span,
    pub target: String,
    pub imports: Vec<NativeImport>,
    pub chunks: Vec<NativeChunk>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NativeImport {
    pub span: Span,
    pub module: String,
    pub alias: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NativeChunk {
    Fixed(Fixed),
    Var(Var),
}

impl NativeChunk {
    pub fn id(&self) -> NodeId {
        match self {
            NativeChunk::Fixed(c) => c.id,
            NativeChunk::Var(c) => c.id,
        }
    }
}

/// Literal native text between variable references.
#[derive(Debug, Clone, PartialEq)]
pub struct Fixed {
    pub id: NodeId,
    pub span: Span,
    pub text: String,
}
