//! Visitor over method bodies.
//!
//! Each visit method has a default implementation that calls the matching
//! walk function, so implementors only override the nodes they care about.
//! The `'a` lifetime lets visitors collect references into the tree.

use super::ast::{MethodDecl, PropertyDecl};
use super::body::*;

pub trait Visitor<'a>: Sized {
    fn visit_block(&mut self, block: &'a Block) {
        walk_block(self, block);
    }

    fn visit_statement(&mut self, stmt: &'a Statement) {
        walk_statement(self, stmt);
    }

    fn visit_expression(&mut self, expr: &'a Expression) {
        walk_expression(self, expr);
    }
}

/// Walk the body of a method, if it has one.
pub fn walk_method<'a, V: Visitor<'a>>(visitor: &mut V, method: &'a MethodDecl) {
    if let Some(body) = &method.body {
        visitor.visit_block(body);
    }
}

/// Walk the getter and setter bodies of a property.
pub fn walk_property<'a, V: Visitor<'a>>(visitor: &mut V, property: &'a PropertyDecl) {
    for accessor in [&property.getter, &property.setter].into_iter().flatten() {
        if let Some(body) = &accessor.body {
            visitor.visit_block(body);
        }
    }
}

pub fn walk_block<'a, V: Visitor<'a>>(visitor: &mut V, block: &'a Block) {
    for stmt in &block.statements {
        visitor.visit_statement(stmt);
    }
}

pub fn walk_statement<'a, V: Visitor<'a>>(visitor: &mut V, stmt: &'a Statement) {
    match stmt {
        Statement::Local(local) => {
            if let Some(init) = &local.init {
                visitor.visit_expression(init);
            }
        }
        Statement::Expression(s) => visitor.visit_expression(&s.expr),
        Statement::ForEach(s) => {
            visitor.visit_expression(&s.iterable);
            visitor.visit_block(&s.body);
        }
        Statement::If(s) => {
            visitor.visit_expression(&s.condition);
            visitor.visit_block(&s.then_branch);
            if let Some(else_branch) = &s.else_branch {
                visitor.visit_block(else_branch);
            }
        }
        Statement::Return(s) => {
            if let Some(value) = &s.value {
                visitor.visit_expression(value);
            }
        }
        Statement::Block(block) => visitor.visit_block(block),
    }
}

pub fn walk_expression<'a, V: Visitor<'a>>(visitor: &mut V, expr: &'a Expression) {
    match expr {
        Expression::Identifier(_)
        | Expression::This(_)
        | Expression::Base(_)
        | Expression::Literal(_)
        | Expression::Other(_) => {}
        Expression::Member(m) => visitor.visit_expression(&m.target),
        Expression::Invocation(call) => {
            visitor.visit_expression(&call.callee);
            for arg in &call.args {
                visitor.visit_expression(arg);
            }
        }
        Expression::Assign(a) => {
            visitor.visit_expression(&a.target);
            visitor.visit_expression(&a.value);
        }
        Expression::Binary(b) => {
            visitor.visit_expression(&b.left);
            visitor.visit_expression(&b.right);
        }
        Expression::Lambda(l) => visitor.visit_expression(&l.body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CollectIdentifiers<'a> {
        names: Vec<&'a str>,
    }

    impl<'a> Visitor<'a> for CollectIdentifiers<'a> {
        fn visit_expression(&mut self, expr: &'a Expression) {
            if let Expression::Identifier(id) = expr {
                self.names.push(&id.name);
            }
            walk_expression(self, expr);
        }
    }

    #[test]
    fn test_visits_nested_bodies() {
        let block = Block::new(vec![
            Statement::local("all", Expression::ident("GetComponents").call(vec![])),
            Statement::for_each(
                "c",
                Expression::ident("all"),
                vec![Expression::ident("c")
                    .member("Apply")
                    .call(vec![Expression::ident("force")])
                    .stmt()],
            ),
        ]);
        let mut collector = CollectIdentifiers::default();
        collector.visit_block(&block);
        assert_eq!(collector.names, vec!["GetComponents", "all", "c", "force"]);
    }
}
