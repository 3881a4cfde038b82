//! Rule: exclusive-roles (RV1003)
//!
//! A type is either one current instance or one of many tracked instances,
//! never both.

use crate::codegen::roles::Roles;
use crate::linter::rule::*;
use crate::symbols::SymbolId;

pub struct ExclusiveRoles;

static META: RuleMeta = RuleMeta {
    name: "exclusive-roles",
    code: "RV1003",
    description: "A type cannot be both [Singleton] and [Track]",
    category: Category::Correctness,
    default_severity: Severity::Error,
    fixable: false,
};

impl LintRule for ExclusiveRoles {
    fn meta(&self) -> &RuleMeta {
        &META
    }

    fn check_type(&self, id: SymbolId, ctx: &LintContext<'_>) -> Vec<LintDiagnostic> {
        let decl = ctx.symbols.decl(id);
        if Roles::of(decl).is_exclusive() {
            return vec![];
        }
        vec![LintDiagnostic::new(
            &META,
            ctx.file_path,
            decl.header_span,
            format!(
                "'{}' cannot be both [Singleton] and [Track]; no registration code is generated for it",
                decl.name
            ),
        )]
    }
}

#[cfg(test)]
mod tests {
    use crate::config::CodegenConfig;
    use crate::linter::rule::LintDiagnostic;
    use crate::linter::Linter;
    use crate::syntax::build::{behaviour, game};
    use crate::syntax::{Attribute, TypeDecl};

    fn lint(types: Vec<TypeDecl>) -> Vec<LintDiagnostic> {
        Linter::new()
            .lint_compilation(&game(types), &CodegenConfig::default())
            .diagnostics
    }

    fn has_rule(diags: &[LintDiagnostic], code: &str) -> bool {
        diags.iter().any(|d| d.code == code)
    }

    #[test]
    fn test_both_roles_flagged() {
        let diags = lint(vec![behaviour("Spawner")
            .with_attr(Attribute::new("Singleton"))
            .with_attr(Attribute::new("TrackAttribute"))]);
        assert!(has_rule(&diags, "RV1003"), "got: {:?}", diags);
    }

    #[test]
    fn test_single_role_ok() {
        let diags = lint(vec![behaviour("Spawner").with_attr(Attribute::new("Track"))]);
        assert!(!has_rule(&diags, "RV1003"));
    }
}
