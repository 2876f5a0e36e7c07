//! Node constructors.
//!
//! The parser collaborator owns a [`Builder`] per compilation and uses it to
//! allocate node identities as it reduces productions; the integration tests
//! use the same API to assemble programs directly.

use quark_common::Span;

use crate::expr::{
    Attr, BoolLit, Call, Expression, Fixed, ListLit, MapEntry, MapLit, NativeBlock, NativeChunk,
    NativeImport, NullLit, NumberLit, StringLit, Var,
};
use crate::item::{
    Class, Declaration, Definition, Field, File, Function, Import, Interface, Method, MethodBody,
    Namespace, NativeFunction, Package, Param, Primitive, TypeExpr, TypeParam,
};
use crate::stmt::{
    Assign, Block, Break, Case, Continue, ExprStmt, If, Local, Return, Statement, Switch, While,
};
use crate::{Name, NodeId, NodeIds};

/// Allocates node identities and assembles nodes.
#[derive(Debug, Default)]
pub struct Builder {
    ids: NodeIds,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    fn id(&mut self) -> NodeId {
        self.ids.next()
    }

    // ── Types ──────────────────────────────────────────────────────────

    /// A type reference; `path` may be dotted (`"quark.List"`).
    pub fn ty(&mut self, path: &str, params: Vec<TypeExpr>) -> TypeExpr {
        TypeExpr {
            id: self.id(),
            span: Span::zero(),
            name: path.split('.').map(Name::new).collect(),
            params,
        }
    }

    // ── Expressions ────────────────────────────────────────────────────

    pub fn var(&mut self, name: &str) -> Expression {
        Expression::Var(Var {
            id: self.id(),
            span: Span::zero(),
            name: Name::new(name),
        })
    }

    pub fn call(&mut self, callee: Expression, args: Vec<Expression>) -> Expression {
        Expression::Call(Call {
            id: self.id(),
            span: Span::zero(),
            expr: Box::new(callee),
            args,
        })
    }

    pub fn attr(&mut self, expr: Expression, name: &str) -> Expression {
        Expression::Attr(Attr {
            id: self.id(),
            span: Span::zero(),
            expr: Box::new(expr),
            attr: Name::new(name),
        })
    }

    /// Sugar for a method call `expr.name(args)`.
    pub fn send(&mut self, expr: Expression, name: &str, args: Vec<Expression>) -> Expression {
        let callee = self.attr(expr, name);
        self.call(callee, args)
    }

    pub fn num(&mut self, text: &str) -> Expression {
        Expression::Number(NumberLit {
            id: self.id(),
            span: Span::zero(),
            text: text.to_string(),
        })
    }

    /// A string literal from its quoted source text (`"\"hi\""`).
    pub fn string(&mut self, text: &str) -> Expression {
        Expression::String(StringLit {
            id: self.id(),
            span: Span::zero(),
            text: text.to_string(),
        })
    }

    pub fn bool_(&mut self, value: bool) -> Expression {
        Expression::Bool(BoolLit {
            id: self.id(),
            span: Span::zero(),
            text: if value { "true" } else { "false" }.to_string(),
        })
    }

    pub fn list(&mut self, elements: Vec<Expression>) -> Expression {
        Expression::List(ListLit {
            id: self.id(),
            span: Span::zero(),
            elements,
        })
    }

    pub fn map(&mut self, entries: Vec<(Expression, Expression)>) -> Expression {
        Expression::Map(MapLit {
            id: self.id(),
            span: Span::zero(),
            entries: entries
                .into_iter()
                .map(|(key, value)| MapEntry { key, value })
                .collect(),
        })
    }

    pub fn null(&mut self) -> Expression {
        Expression::Null(NullLit {
            id: self.id(),
            span: Span::zero(),
        })
    }

    /// A type in expression position (constructor callee).
    pub fn type_expr(&mut self, ty: TypeExpr) -> Expression {
        Expression::Type(ty)
    }

    // ── Statements ─────────────────────────────────────────────────────

    pub fn block(&mut self, statements: Vec<Statement>) -> Block {
        Block {
            id: self.id(),
            span: Span::zero(),
            statements,
        }
    }

    pub fn if_(
        &mut self,
        predicate: Expression,
        consequence: Block,
        alternative: Option<Block>,
    ) -> Statement {
        Statement::If(If {
            id: self.id(),
            span: Span::zero(),
            predicate,
            consequence,
            alternative,
        })
    }

    pub fn while_(&mut self, condition: Expression, body: Block) -> Statement {
        Statement::While(While {
            id: self.id(),
            span: Span::zero(),
            condition,
            body,
        })
    }

    pub fn switch(&mut self, expr: Expression, cases: Vec<Case>) -> Statement {
        Statement::Switch(Switch {
            id: self.id(),
            span: Span::zero(),
            expr,
            cases,
        })
    }

    pub fn case(&mut self, exprs: Vec<Expression>, body: Block) -> Case {
        Case {
            id: self.id(),
            span: Span::zero(),
            exprs,
            body,
        }
    }

    pub fn local(&mut self, ty: TypeExpr, name: &str, value: Option<Expression>) -> Statement {
        let declaration = self.decl(ty, name, value);
        Statement::Local(Local {
            id: self.id(),
            span: Span::zero(),
            declaration,
        })
    }

    pub fn decl(&mut self, ty: TypeExpr, name: &str, value: Option<Expression>) -> Declaration {
        Declaration {
            id: self.id(),
            span: Span::zero(),
            ty,
            name: Name::new(name),
            value,
        }
    }

    pub fn assign(&mut self, lhs: Expression, rhs: Expression) -> Statement {
        Statement::Assign(Assign {
            id: self.id(),
            span: Span::zero(),
            lhs,
            rhs,
        })
    }

    pub fn estmt(&mut self, expr: Expression) -> Statement {
        Statement::Expr(ExprStmt {
            id: self.id(),
            span: Span::zero(),
            expr,
        })
    }

    pub fn ret(&mut self, expr: Option<Expression>) -> Statement {
        Statement::Return(Return {
            id: self.id(),
            span: Span::zero(),
            expr,
        })
    }

    pub fn brk(&mut self) -> Statement {
        Statement::Break(Break {
            id: self.id(),
            span: Span::zero(),
        })
    }

    pub fn cont(&mut self) -> Statement {
        Statement::Continue(Continue {
            id: self.id(),
            span: Span::zero(),
        })
    }

    // ── Declarations ───────────────────────────────────────────────────

    pub fn param(&mut self, ty: TypeExpr, name: &str) -> Param {
        Param {
            id: self.id(),
            span: Span::zero(),
            ty,
            name: Name::new(name),
        }
    }

    pub fn tparam(&mut self, name: &str) -> TypeParam {
        TypeParam {
            id: self.id(),
            span: Span::zero(),
            name: Name::new(name),
        }
    }

    pub fn field(&mut self, ty: TypeExpr, name: &str, value: Option<Expression>) -> Field {
        Field {
            id: self.id(),
            span: Span::zero(),
            ty,
            name: Name::new(name),
            value,
        }
    }

    pub fn method(
        &mut self,
        ty: Option<TypeExpr>,
        name: &str,
        params: Vec<Param>,
        body: Option<MethodBody>,
    ) -> Method {
        Method {
            id: self.id(),
            span: Span::zero(),
            ty,
            name: Name::new(name),
            params,
            body,
        }
    }

    pub fn function(
        &mut self,
        ty: TypeExpr,
        name: &str,
        params: Vec<Param>,
        body: Option<Block>,
    ) -> Function {
        Function {
            id: self.id(),
            span: Span::zero(),
            ty,
            name: Name::new(name),
            type_params: Vec::new(),
            params,
            body,
        }
    }

    pub fn generic_function(
        &mut self,
        ty: TypeExpr,
        name: &str,
        type_params: Vec<TypeParam>,
        params: Vec<Param>,
        body: Option<Block>,
    ) -> Function {
        Function {
            id: self.id(),
            span: Span::zero(),
            ty,
            name: Name::new(name),
            type_params,
            params,
            body,
        }
    }

    pub fn native_function(
        &mut self,
        ty: TypeExpr,
        name: &str,
        params: Vec<Param>,
        body: Option<NativeBlock>,
    ) -> NativeFunction {
        NativeFunction {
            id: self.id(),
            span: Span::zero(),
            ty,
            name: Name::new(name),
            params,
            body,
        }
    }

    pub fn class(
        &mut self,
        name: &str,
        params: Vec<TypeParam>,
        bases: Vec<TypeExpr>,
        members: Vec<Definition>,
    ) -> Class {
        Class {
            id: self.id(),
            span: Span::zero(),
            name: Name::new(name),
            params,
            bases,
            members,
        }
    }

    pub fn interface(
        &mut self,
        name: &str,
        params: Vec<TypeParam>,
        bases: Vec<TypeExpr>,
        members: Vec<Definition>,
    ) -> Interface {
        Interface {
            id: self.id(),
            span: Span::zero(),
            name: Name::new(name),
            params,
            bases,
            members,
        }
    }

    pub fn primitive(
        &mut self,
        name: &str,
        params: Vec<TypeParam>,
        members: Vec<Definition>,
        mappings: Vec<NativeBlock>,
    ) -> Primitive {
        Primitive {
            id: self.id(),
            span: Span::zero(),
            name: Name::new(name),
            params,
            members,
            mappings,
        }
    }

    pub fn namespace(&mut self, name: &str, definitions: Vec<Definition>) -> Namespace {
        Namespace {
            id: self.id(),
            span: Span::zero(),
            name: Name::new(name),
            definitions,
        }
    }

    pub fn import(&mut self, path: &str) -> Import {
        Import {
            id: self.id(),
            span: Span::zero(),
            path: path.split('.').map(Name::new).collect(),
        }
    }

    pub fn file(&mut self, name: &str, imports: Vec<Import>, definitions: Vec<Definition>) -> File {
        File {
            id: self.id(),
            span: Span::zero(),
            name: name.to_string(),
            imports,
            definitions,
        }
    }

    pub fn package(&mut self, name: &str, files: Vec<File>) -> Package {
        Package {
            id: self.id(),
            span: Span::zero(),
            name: Name::new(name),
            files,
        }
    }

    // ── Native fragments ───────────────────────────────────────────────

    pub fn native_block(
        &mut self,
        target: &str,
        imports: Vec<(&str, &str)>,
        chunks: Vec<NativeChunk>,
    ) -> NativeBlock {
        NativeBlock {
            id: self.id(),
            span: Span::zero(),
            target: target.to_string(),
            imports: imports
                .into_iter()
                .map(|(module, alias)| NativeImport {
                    span: Span::zero(),
                    module: module.to_string(),
                    alias: alias.to_string(),
                })
                .collect(),
            chunks,
        }
    }

    pub fn fixed(&mut self, text: &str) -> NativeChunk {
        NativeChunk::Fixed(Fixed {
            id: self.id(),
            span: Span::zero(),
            text: text.to_string(),
        })
    }

    pub fn native_var(&mut self, name: &str) -> NativeChunk {
        NativeChunk::Var(Var {
            id: self.id(),
            span: Span::zero(),
            name: Name::new(name),
        })
    }
}

macro_rules! into_definition {
    ($($variant:ident($ty:ty)),+ $(,)?) => {
        $(impl From<$ty> for Definition {
            fn from(value: $ty) -> Definition {
                Definition::$variant(value)
            }
        })+
    };
}

into_definition!(
    Package(Package),
    Namespace(Namespace),
    Class(Class),
    Interface(Interface),
    Primitive(Primitive),
    Function(Function),
    NativeFunction(NativeFunction),
    Method(Method),
    Field(Field),
    TypeParam(TypeParam),
);
