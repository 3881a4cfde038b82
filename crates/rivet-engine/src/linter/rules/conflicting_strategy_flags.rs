//! Rule: conflicting-strategy-flags (RV1005)
//!
//! `Replace` and `KeepExisting` are opposite resolutions; at most one of
//! `Throw`, `LogError` and `LogWarning` reports a conflict; `Throw` leaves
//! nothing to destroy.

use crate::codegen::roles::{conflicting_names, strategy_argument, strategy_tokens};
use crate::linter::rule::*;
use crate::symbols::SymbolId;
use crate::syntax::names;

pub struct ConflictingStrategyFlags;

static META: RuleMeta = RuleMeta {
    name: "conflicting-strategy-flags",
    code: "RV1005",
    description: "Disallow singleton strategies that combine mutually exclusive flags",
    category: Category::Correctness,
    default_severity: Severity::Error,
    fixable: false,
};

impl LintRule for ConflictingStrategyFlags {
    fn meta(&self) -> &RuleMeta {
        &META
    }

    fn check_type(&self, id: SymbolId, ctx: &LintContext<'_>) -> Vec<LintDiagnostic> {
        let decl = ctx.symbols.decl(id);
        decl.attributes_named(names::SINGLETON)
            .filter_map(|attr| {
                let expr = strategy_argument(attr)?;
                let tokens = strategy_tokens(expr);
                let conflicts = conflicting_names(&tokens);
                if conflicts.is_empty() {
                    return None;
                }
                Some(LintDiagnostic::new(
                    &META,
                    ctx.file_path,
                    expr.span(),
                    format!("Conflicting singleton strategy flags: {}", conflicts.join(", ")),
                ))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::config::CodegenConfig;
    use crate::linter::rule::LintDiagnostic;
    use crate::linter::Linter;
    use crate::syntax::build::{behaviour, game};
    use crate::syntax::{Attribute, BinaryOp, Expression, TypeDecl};

    fn lint(types: Vec<TypeDecl>) -> Vec<LintDiagnostic> {
        Linter::new()
            .lint_compilation(&game(types), &CodegenConfig::default())
            .diagnostics
    }

    fn flags(names: &[&str]) -> Expression {
        let flag = |n: &str| Expression::ident("SingletonStrategy").member(n);
        let mut expr = flag(names[0]);
        for name in &names[1..] {
            expr = expr.binary(BinaryOp::BitOr, flag(name));
        }
        expr
    }

    fn singleton(strategy: Expression) -> TypeDecl {
        behaviour("Director").with_attr(Attribute::new("Singleton").with_arg(strategy))
    }

    #[test]
    fn test_replace_and_keep_existing() {
        let diags = lint(vec![singleton(flags(&["Replace", "KeepExisting"]))]);
        let found: Vec<_> = diags.iter().filter(|d| d.code == "RV1005").collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].message, "Conflicting singleton strategy flags: Replace, KeepExisting");
    }

    #[test]
    fn test_repeated_tokens_listed_once() {
        let diags = lint(vec![singleton(flags(&["Throw", "LogError", "Throw", "LogError"]))]);
        let found: Vec<_> = diags.iter().filter(|d| d.code == "RV1005").collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].message, "Conflicting singleton strategy flags: Throw, LogError");
    }

    #[test]
    fn test_compatible_flags_ok() {
        let diags = lint(vec![singleton(flags(&["KeepExisting", "LogWarning", "Destroy"]))]);
        assert!(!diags.iter().any(|d| d.code == "RV1005"), "got: {:?}", diags);
    }
}
