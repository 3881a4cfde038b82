//! Method bodies: the statement and expression subset the analyzers need.
//!
//! Anything the host does not map onto a specific variant arrives as
//! [`Expression::Other`], which rules treat as opaque.

use serde::{Deserialize, Serialize};

use super::ast::TypeRef;
use super::span::Span;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub statements: Vec<Statement>,
    #[serde(default)]
    pub span: Span,
}

impl Block {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self {
            statements,
            span: Span::default(),
        }
    }
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Statement {
    Local(LocalDecl),
    Expression(ExpressionStatement),
    ForEach(ForEachStatement),
    If(IfStatement),
    Return(ReturnStatement),
    Block(Block),
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::Local(s) => s.span,
            Statement::Expression(s) => s.span,
            Statement::ForEach(s) => s.span,
            Statement::If(s) => s.span,
            Statement::Return(s) => s.span,
            Statement::Block(b) => b.span,
        }
    }
}

/// `var name = init;`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalDecl {
    pub name: String,
    #[serde(default)]
    pub ty: Option<TypeRef>,
    #[serde(default)]
    pub init: Option<Expression>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionStatement {
    pub expr: Expression,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForEachStatement {
    pub var_name: String,
    #[serde(default)]
    pub var_ty: Option<TypeRef>,
    pub iterable: Expression,
    pub body: Block,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfStatement {
    pub condition: Expression,
    pub then_branch: Block,
    #[serde(default)]
    pub else_branch: Option<Block>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnStatement {
    #[serde(default)]
    pub value: Option<Expression>,
    #[serde(default)]
    pub span: Span,
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Expression {
    Identifier(Identifier),
    This(Span),
    Base(Span),
    Literal(Literal),
    Member(MemberAccess),
    Invocation(Invocation),
    Assign(Assignment),
    Binary(BinaryExpression),
    Lambda(LambdaExpression),
    /// Anything the analyzers do not look into.
    Other(OtherExpression),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identifier {
    pub name: String,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum LiteralValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Literal {
    pub value: LiteralValue,
    #[serde(default)]
    pub span: Span,
}

/// `target.name`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberAccess {
    pub target: Box<Expression>,
    pub name: String,
    #[serde(default)]
    pub span: Span,
}

/// `callee<type_args>(args)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    pub callee: Box<Expression>,
    #[serde(default)]
    pub type_args: Vec<TypeRef>,
    #[serde(default)]
    pub args: Vec<Expression>,
    /// Return type reported by the host's semantic model, when known.
    #[serde(default)]
    pub return_type: Option<TypeRef>,
    #[serde(default)]
    pub span: Span,
}

impl Invocation {
    /// Name of the invoked method: `GetComponent` in `x.GetComponent<T>()`.
    pub fn method_name(&self) -> Option<&str> {
        match self.callee.as_ref() {
            Expression::Identifier(id) => Some(&id.name),
            Expression::Member(m) => Some(&m.name),
            _ => None,
        }
    }

    /// The explicit receiver, if the call is `receiver.Method(...)`.
    pub fn receiver(&self) -> Option<&Expression> {
        match self.callee.as_ref() {
            Expression::Member(m) => Some(&m.target),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub target: Box<Expression>,
    pub value: Box<Expression>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryOp {
    BitOr,
    BitAnd,
    Or,
    And,
    Equal,
    NotEqual,
    Add,
    Subtract,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::BitOr => "|",
            BinaryOp::BitAnd => "&",
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryExpression {
    pub op: BinaryOp,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LambdaExpression {
    #[serde(default)]
    pub params: Vec<String>,
    pub body: Box<Expression>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtherExpression {
    /// Source text, used only for display.
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub span: Span,
}

impl Expression {
    pub fn span(&self) -> Span {
        match self {
            Expression::Identifier(e) => e.span,
            Expression::This(span) | Expression::Base(span) => *span,
            Expression::Literal(e) => e.span,
            Expression::Member(e) => e.span,
            Expression::Invocation(e) => e.span,
            Expression::Assign(e) => e.span,
            Expression::Binary(e) => e.span,
            Expression::Lambda(e) => e.span,
            Expression::Other(e) => e.span,
        }
    }

    pub fn as_invocation(&self) -> Option<&Invocation> {
        match self {
            Expression::Invocation(call) => Some(call),
            _ => None,
        }
    }

    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            Expression::Identifier(id) => Some(&id.name),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Expression::Literal(Literal {
                value: LiteralValue::Bool(b),
                ..
            }) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Expression::Literal(Literal {
                value: LiteralValue::Int(v),
                ..
            }) => Some(*v),
            _ => None,
        }
    }

    // Constructors, mostly for hosts building bodies by hand and for tests.

    pub fn ident(name: impl Into<String>) -> Self {
        Expression::Identifier(Identifier {
            name: name.into(),
            span: Span::default(),
        })
    }

    pub fn this() -> Self {
        Expression::This(Span::default())
    }

    pub fn null() -> Self {
        Self::literal(LiteralValue::Null)
    }

    pub fn bool(value: bool) -> Self {
        Self::literal(LiteralValue::Bool(value))
    }

    pub fn int(value: i64) -> Self {
        Self::literal(LiteralValue::Int(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::literal(LiteralValue::String(value.into()))
    }

    fn literal(value: LiteralValue) -> Self {
        Expression::Literal(Literal {
            value,
            span: Span::default(),
        })
    }

    /// `self.name`
    pub fn member(self, name: impl Into<String>) -> Self {
        Expression::Member(MemberAccess {
            target: Box::new(self),
            name: name.into(),
            span: Span::default(),
        })
    }

    /// `self(args)`
    pub fn call(self, args: Vec<Expression>) -> Self {
        self.call_generic(Vec::new(), args)
    }

    /// `self<type_args>(args)`
    pub fn call_generic(self, type_args: Vec<TypeRef>, args: Vec<Expression>) -> Self {
        Expression::Invocation(Invocation {
            callee: Box::new(self),
            type_args,
            args,
            return_type: None,
            span: Span::default(),
        })
    }

    /// `self = value`
    pub fn assign(self, value: Expression) -> Self {
        Expression::Assign(Assignment {
            target: Box::new(self),
            value: Box::new(value),
            span: Span::default(),
        })
    }

    pub fn binary(self, op: BinaryOp, right: Expression) -> Self {
        Expression::Binary(BinaryExpression {
            op,
            left: Box::new(self),
            right: Box::new(right),
            span: Span::default(),
        })
    }

    pub fn lambda(params: Vec<String>, body: Expression) -> Self {
        Expression::Lambda(LambdaExpression {
            params,
            body: Box::new(body),
            span: Span::default(),
        })
    }

    /// Set the span of the outermost node.
    pub fn at(mut self, span: Span) -> Self {
        match &mut self {
            Expression::Identifier(e) => e.span = span,
            Expression::This(s) | Expression::Base(s) => *s = span,
            Expression::Literal(e) => e.span = span,
            Expression::Member(e) => e.span = span,
            Expression::Invocation(e) => e.span = span,
            Expression::Assign(e) => e.span = span,
            Expression::Binary(e) => e.span = span,
            Expression::Lambda(e) => e.span = span,
            Expression::Other(e) => e.span = span,
        }
        self
    }

    pub fn stmt(self) -> Statement {
        Statement::Expression(ExpressionStatement {
            expr: self,
            span: Span::default(),
        })
    }
}

impl Statement {
    pub fn local(name: impl Into<String>, init: Expression) -> Self {
        Statement::Local(LocalDecl {
            name: name.into(),
            ty: None,
            init: Some(init),
            span: Span::default(),
        })
    }

    pub fn for_each(
        var_name: impl Into<String>,
        iterable: Expression,
        body: Vec<Statement>,
    ) -> Self {
        Statement::ForEach(ForEachStatement {
            var_name: var_name.into(),
            var_ty: None,
            iterable,
            body: Block::new(body),
            span: Span::default(),
        })
    }

    pub fn ret(value: Option<Expression>) -> Self {
        Statement::Return(ReturnStatement {
            value,
            span: Span::default(),
        })
    }
}

// ============================================================================
// Display (source-like rendering, used for messages and call matching)
// ============================================================================

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expression::Identifier(id) => write!(f, "{}", id.name),
            Expression::This(_) => write!(f, "this"),
            Expression::Base(_) => write!(f, "base"),
            Expression::Literal(lit) => match &lit.value {
                LiteralValue::Null => write!(f, "null"),
                LiteralValue::Bool(b) => write!(f, "{}", b),
                LiteralValue::Int(v) => write!(f, "{}", v),
                LiteralValue::Float(v) => write!(f, "{}f", v),
                LiteralValue::String(s) => write!(f, "{:?}", s),
            },
            Expression::Member(m) => write!(f, "{}.{}", m.target, m.name),
            Expression::Invocation(call) => {
                write!(f, "{}", call.callee)?;
                if !call.type_args.is_empty() {
                    write!(f, "<")?;
                    for (i, arg) in call.type_args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", arg)?;
                    }
                    write!(f, ">")?;
                }
                write!(f, "(")?;
                for (i, arg) in call.args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expression::Assign(a) => write!(f, "{} = {}", a.target, a.value),
            Expression::Binary(b) => write!(f, "{} {} {}", b.left, b.op.symbol(), b.right),
            Expression::Lambda(l) => {
                if l.params.len() == 1 {
                    write!(f, "{} => {}", l.params[0], l.body)
                } else {
                    write!(f, "({}) => {}", l.params.join(", "), l.body)
                }
            }
            Expression::Other(o) => write!(f, "{}", o.text),
        }
    }
}
