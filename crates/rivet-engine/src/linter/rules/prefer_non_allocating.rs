//! Rule: prefer-non-allocating (RV4001)
//!
//! `GetComponents*` returns a fresh array. When the result is only
//! enumerated (a `foreach`, a LINQ chain, or a local read once by a
//! `foreach`) the `EnumerateComponents*` helpers do the same work without
//! the allocation.

use crate::codegen::lookup::{self, LookupCall};
use crate::linter::rule::*;
use crate::syntax::visitor::{self, Visitor};
use crate::syntax::{Block, Expression, Invocation, Member, Span, Statement};

pub struct PreferNonAllocating;

static META: RuleMeta = RuleMeta {
    name: "prefer-non-allocating",
    code: "RV4001",
    description: "Enumerate components without allocating an array",
    category: Category::Performance,
    default_severity: Severity::Info,
    fixable: true,
};

const LINQ_METHODS: &[&str] = &[
    "Aggregate",
    "All",
    "Any",
    "Average",
    "Contains",
    "Count",
    "First",
    "FirstOrDefault",
    "Last",
    "LastOrDefault",
    "Max",
    "Min",
    "OrderBy",
    "OrderByDescending",
    "Select",
    "SelectMany",
    "Skip",
    "Sum",
    "Take",
    "ToArray",
    "ToList",
    "Where",
];

fn allocating(expr: &Expression) -> Option<(LookupCall<'_>, &'static str)> {
    let call = lookup::classify(expr)?;
    let alternative = call.kind.non_allocating()?;
    Some((call, alternative))
}

/// Span and text replacing the callee with `alternative`.
fn renamed_callee(call: &Invocation, alternative: &str) -> (Span, String) {
    match call.callee.as_ref() {
        Expression::Member(m) => (m.span, format!("{}.{}", m.target, alternative)),
        other => (other.span(), alternative.to_string()),
    }
}

fn report(
    call: LookupCall<'_>,
    alternative: &str,
    usage: &str,
    ctx: &LintContext<'_>,
) -> LintDiagnostic {
    let (span, replacement) = renamed_callee(call.call, alternative);
    LintDiagnostic::new(
        &META,
        ctx.file_path,
        call.call.span,
        format!(
            "'{}' allocates an array that is only {}; use '{}' instead",
            call.kind.method_name(),
            usage,
            alternative
        ),
    )
    .with_fix(span, replacement)
}

fn bodies(member: &Member) -> Vec<&Block> {
    match member {
        Member::Method(m) => m.body.iter().collect(),
        Member::Property(p) => [&p.getter, &p.setter]
            .into_iter()
            .flatten()
            .filter_map(|a| a.body.as_ref())
            .collect(),
        Member::Field(_) => vec![],
    }
}

/// Every local declaration and `foreach` statement, plus identifier use counts.
#[derive(Default)]
struct LocalUses<'a> {
    locals: Vec<(&'a str, &'a Expression)>,
    foreach_over: Vec<&'a str>,
    reads: Vec<&'a str>,
}

impl<'a> Visitor<'a> for LocalUses<'a> {
    fn visit_statement(&mut self, stmt: &'a Statement) {
        match stmt {
            Statement::Local(local) => {
                if let Some(init) = &local.init {
                    self.locals.push((local.name.as_str(), init));
                }
            }
            Statement::ForEach(s) => {
                if let Some(name) = s.iterable.as_identifier() {
                    self.foreach_over.push(name);
                }
            }
            _ => {}
        }
        visitor::walk_statement(self, stmt);
    }

    fn visit_expression(&mut self, expr: &'a Expression) {
        if let Some(name) = expr.as_identifier() {
            self.reads.push(name);
        }
        visitor::walk_expression(self, expr);
    }
}

impl LintRule for PreferNonAllocating {
    fn meta(&self) -> &RuleMeta {
        &META
    }

    fn check_statement(
        &self,
        stmt: &Statement,
        _scope: &BodyScope<'_>,
        ctx: &LintContext<'_>,
    ) -> Vec<LintDiagnostic> {
        let Statement::ForEach(foreach) = stmt else {
            return vec![];
        };
        match allocating(&foreach.iterable) {
            Some((call, alternative)) => vec![report(call, alternative, "iterated", ctx)],
            None => vec![],
        }
    }

    fn check_expression(
        &self,
        expr: &Expression,
        _scope: &BodyScope<'_>,
        ctx: &LintContext<'_>,
    ) -> Vec<LintDiagnostic> {
        let Some(call) = expr.as_invocation() else {
            return vec![];
        };
        if !call.method_name().is_some_and(|name| LINQ_METHODS.contains(&name)) {
            return vec![];
        }
        match call.receiver().and_then(allocating) {
            Some((lookup, alternative)) => vec![report(lookup, alternative, "queried", ctx)],
            None => vec![],
        }
    }

    fn check_body(&self, scope: &BodyScope<'_>, ctx: &LintContext<'_>) -> Vec<LintDiagnostic> {
        let mut uses = LocalUses::default();
        for body in bodies(scope.member) {
            uses.visit_block(body);
        }
        uses.locals
            .iter()
            .filter(|(name, _)| {
                uses.reads.iter().filter(|r| *r == name).count() == 1
                    && uses.foreach_over.contains(name)
            })
            .filter_map(|(_, init)| allocating(init))
            .map(|(call, alternative)| report(call, alternative, "iterated", ctx))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::config::CodegenConfig;
    use crate::linter::rule::LintDiagnostic;
    use crate::linter::Linter;
    use crate::syntax::build::{behaviour, game, lookup, method};
    use crate::syntax::{Expression, Span, Statement, TypeDecl};

    fn lint(types: Vec<TypeDecl>) -> Vec<LintDiagnostic> {
        Linter::new()
            .lint_compilation(&game(types), &CodegenConfig::default())
            .diagnostics
    }

    fn found(diags: &[LintDiagnostic]) -> Vec<&LintDiagnostic> {
        diags.iter().filter(|d| d.code == "RV4001").collect()
    }

    fn in_update(statements: Vec<Statement>) -> Vec<TypeDecl> {
        vec![behaviour("Explosion").with_member(method("Update", statements))]
    }

    fn all_colliders() -> Expression {
        Expression::this()
            .member("GetComponentsInChildren")
            .at(Span::new(20, 48, 4, 9))
            .call_generic(vec!["Collider".into()], vec![])
            .at(Span::new(20, 60, 4, 9))
    }

    #[test]
    fn test_foreach_over_allocating_call() {
        let diags = lint(in_update(vec![Statement::for_each("c", all_colliders(), vec![])]));
        let found = found(&diags);
        assert_eq!(found.len(), 1);
        let fix = found[0].fix.as_ref().unwrap();
        assert_eq!(fix.span, Span::new(20, 48, 4, 9));
        assert_eq!(fix.replacement, "this.EnumerateComponentsInChildren");
    }

    #[test]
    fn test_linq_chain() {
        let chain = lookup("GetComponents", "Renderer")
            .member("Any")
            .call(vec![Expression::lambda(
                vec!["r".into()],
                Expression::ident("r").member("enabled"),
            )]);
        let diags = lint(in_update(vec![chain.stmt()]));
        let found = found(&diags);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].fix.as_ref().unwrap().replacement, "EnumerateComponents");
    }

    #[test]
    fn test_single_use_local() {
        let diags = lint(in_update(vec![
            Statement::local("colliders", lookup("GetComponentsInParent", "Collider")),
            Statement::for_each("c", Expression::ident("colliders"), vec![]),
        ]));
        assert_eq!(found(&diags).len(), 1);
    }

    #[test]
    fn test_local_used_twice_ok() {
        let diags = lint(in_update(vec![
            Statement::local("colliders", lookup("GetComponentsInParent", "Collider")),
            Statement::for_each("c", Expression::ident("colliders"), vec![]),
            Expression::ident("Log")
                .call(vec![Expression::ident("colliders").member("Length")])
                .stmt(),
        ]));
        assert!(found(&diags).is_empty(), "got: {:?}", diags);
    }

    #[test]
    fn test_single_component_ok() {
        let diags = lint(in_update(vec![lookup("GetComponent", "Collider").stmt()]));
        assert!(found(&diags).is_empty());
    }
}
