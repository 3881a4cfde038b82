//! Rule: optional-outside-injection (RV2003)
//!
//! `.Optional()` marks an injected assignment as allowed to come back
//! empty. Anywhere else it does nothing.

use crate::linter::rule::*;
use crate::syntax::names;
use crate::syntax::Expression;

pub struct OptionalOutsideInjection;

static META: RuleMeta = RuleMeta {
    name: "optional-outside-injection",
    code: "RV2003",
    description: "Disallow .Optional() outside [Inject] methods",
    category: Category::Correctness,
    default_severity: Severity::Error,
    fixable: false,
};

impl LintRule for OptionalOutsideInjection {
    fn meta(&self) -> &RuleMeta {
        &META
    }

    fn check_expression(
        &self,
        expr: &Expression,
        scope: &BodyScope<'_>,
        ctx: &LintContext<'_>,
    ) -> Vec<LintDiagnostic> {
        if scope.is_injection_method {
            return vec![];
        }
        let Some(call) = expr.as_invocation() else {
            return vec![];
        };
        if call.method_name() != Some(names::OPTIONAL_MARKER)
            || !call.args.is_empty()
            || call.receiver().is_none()
        {
            return vec![];
        }
        vec![LintDiagnostic::new(
            &META,
            ctx.file_path,
            call.span,
            "'.Optional()' only has an effect on assignments inside an [Inject] method",
        )]
    }
}
