//! Input model: declarations, bodies and source locations handed over by the host.

pub mod ast;
pub mod body;
pub mod build;
pub mod names;
pub mod span;
pub mod visitor;

pub use ast::{
    Accessor, Attribute, AttributeArg, Compilation, FieldDecl, Member, MethodDecl, Modifier,
    Param, ParamModifier, PropertyDecl, SourceFile, TypeDecl, TypeKind, TypeRef,
};
pub use body::{
    Assignment, BinaryExpression, BinaryOp, Block, Expression, ExpressionStatement,
    ForEachStatement, Identifier, IfStatement, Invocation, LambdaExpression, Literal,
    LiteralValue, LocalDecl, MemberAccess, OtherExpression, ReturnStatement, Statement,
};
pub use span::Span;
pub use visitor::Visitor;
