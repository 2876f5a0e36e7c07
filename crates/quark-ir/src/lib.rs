//! The emitter-facing IR.
//!
//! An immutable value tree produced by lowering and consumed by per-target
//! emitters, which are external collaborators: everything here derives
//! equality (so repeated lowering can be compared structurally) and
//! `serde::Serialize` (so out-of-process emitters can take the package as
//! JSON).
//!
//! Addressing: every definition carries a [`Name`] and every reference a
//! [`Ref`], both scoped by a `<package>:<package>` address the emitters
//! interpret to decide physical layout. The symbol part is a mangled,
//! instantiation-specific identifier; the core never parses it back.

use serde::Serialize;

/// The address of a definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Name {
    pub package: String,
    pub name: String,
}

/// A reference to a definition by address.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ref {
    pub package: String,
    pub name: String,
}

// ── Types ────────────────────────────────────────────────────────────────

/// A type in the emitted program.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Type {
    Int,
    Float,
    Bool,
    String,
    Void,
    Any,
    Scalar,
    Class(Ref),
    Interface(Ref),
    /// A built-in realised per target by native template bodies.
    Primitive { mappings: Vec<NativeBlock> },
}

impl Type {
    /// Whether the type is realised natively (everything except class and
    /// interface references).
    pub fn is_native(&self) -> bool {
        !matches!(self, Type::Class(_) | Type::Interface(_))
    }
}

// ── Native templates ─────────────────────────────────────────────────────

/// An opaque template body for one target plus the expressions its
/// placeholders refer to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NativeBlock {
    pub context: TemplateContext,
    pub template: TemplateText,
}

/// `{name}` placeholder bindings, in source order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateContext(pub Vec<(String, Expr)>);

/// Target-tagged template text. User braces arrive doubled; `{name}`
/// placeholders are substituted by the emitter from the context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateText {
    pub target: String,
    pub imports: Vec<NativeImport>,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NativeImport {
    pub module: String,
    pub alias: String,
}

// ── Expressions ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    IntLit(i64),
    FloatLit(f64),
    StringLit(String),
    BoolLit(bool),
    Null(Type),
    Var(String),
    This,
    Get(Box<Expr>, String),
    Send {
        receiver: Box<Expr>,
        name: String,
        args: Vec<Expr>,
    },
    Invoke {
        target: Ref,
        args: Vec<Expr>,
    },
    Construct {
        target: Ref,
        args: Vec<Expr>,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    AssertEqual(Box<Expr>, Box<Expr>),
    AssertNotEqual(Box<Expr>, Box<Expr>),
    /// A native type used where a reference is needed.
    Boxed(Type),
    /// A type descriptor in expression position.
    TypeRef(Type),
    /// A function referenced as a value.
    Ref(Ref),
}

// ── Statements ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Block(pub Vec<Stmt>);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Stmt {
    Local {
        name: String,
        ty: Type,
        value: Option<Expr>,
    },
    Assign {
        target: Expr,
        value: Expr,
    },
    Set {
        object: Expr,
        field: String,
        value: Expr,
    },
    Evaluate(Expr),
    Return(Option<Expr>),
    If {
        predicate: Expr,
        consequence: Block,
        alternative: Block,
    },
    While {
        condition: Expr,
        body: Block,
    },
    Break,
    Continue,
}

// ── Definitions ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Def {
    Function(Function),
    NativeFunction(NativeFunction),
    /// A test-bearing free function.
    Check(Check),
    Class(Class),
    /// A class holding at least one assertion; may not carry constructors.
    TestClass(Class),
    Interface(Interface),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Function {
    pub name: Name,
    pub ret: Type,
    pub params: Vec<Param>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NativeFunction {
    pub name: Name,
    pub ret: Type,
    pub params: Vec<Param>,
    pub context: TemplateContext,
    pub template: TemplateText,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Check {
    pub name: Name,
    pub params: Vec<Param>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Class {
    pub name: Name,
    pub bases: Vec<Type>,
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Member {
    Field(Field),
    Method(Method),
    /// A test-bearing method.
    TestMethod(Method),
    Constructor(Constructor),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Method {
    pub name: String,
    pub ret: Type,
    pub params: Vec<Param>,
    pub body: FnBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Constructor {
    pub name: String,
    pub ret: Type,
    pub params: Vec<Param>,
    pub body: FnBody,
}

/// A method body: ordinary statements or a native template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FnBody {
    Block(Block),
    Native {
        context: TemplateContext,
        template: TemplateText,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interface {
    pub name: Name,
    pub messages: Vec<Message>,
}

/// One interface method: name, return type and parameter list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub name: String,
    pub ret: Type,
    pub params: Vec<Param>,
}

/// The lowered compilation unit: every top-level instantiation, once.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Package {
    pub definitions: Vec<Def>,
}

impl Package {
    /// The JSON form handed to out-of-process emitters.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).expect("IR serialization is infallible")
    }
}
