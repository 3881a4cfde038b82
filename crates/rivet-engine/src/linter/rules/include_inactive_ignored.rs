//! Rule: include-inactive-ignored (RV2002)

use crate::codegen::inject::{include_inactive_ignored, injected_member};
use crate::linter::rule::*;
use crate::symbols::SymbolId;
use crate::syntax::Member;

pub struct IncludeInactiveIgnored;

static META: RuleMeta = RuleMeta {
    name: "include-inactive-ignored",
    code: "RV2002",
    description: "Flag IncludeInactive where the lookup ignores it",
    category: Category::Correctness,
    default_severity: Severity::Warn,
    fixable: false,
};

impl LintRule for IncludeInactiveIgnored {
    fn meta(&self) -> &RuleMeta {
        &META
    }

    fn check_member(
        &self,
        _owner: SymbolId,
        member: &Member,
        ctx: &LintContext<'_>,
    ) -> Vec<LintDiagnostic> {
        let Some(injected) = injected_member(member) else {
            return vec![];
        };
        let supported = ctx.codegen.parents_include_inactive_supported;
        match include_inactive_ignored(&injected.options, supported) {
            Some(reason) => vec![LintDiagnostic::new(
                &META,
                ctx.file_path,
                injected.attribute.span,
                format!(
                    "IncludeInactive has no effect on [{}]: {}",
                    injected.options.attribute_name(),
                    reason
                ),
            )],
            None => vec![],
        }
    }
}
