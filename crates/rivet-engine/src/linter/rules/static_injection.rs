//! Rule: static-injection (RV2005)

use crate::codegen::inject::injected_member;
use crate::codegen::injection::is_injection_method;
use crate::linter::rule::*;
use crate::symbols::SymbolId;
use crate::syntax::Member;

pub struct StaticInjection;

static META: RuleMeta = RuleMeta {
    name: "static-injection",
    code: "RV2005",
    description: "Injection targets instances; static members and methods cannot be injected",
    category: Category::Correctness,
    default_severity: Severity::Error,
    fixable: false,
};

impl LintRule for StaticInjection {
    fn meta(&self) -> &RuleMeta {
        &META
    }

    fn check_member(
        &self,
        _owner: SymbolId,
        member: &Member,
        ctx: &LintContext<'_>,
    ) -> Vec<LintDiagnostic> {
        if !member.is_static() {
            return vec![];
        }
        let message = match member {
            Member::Method(m) if is_injection_method(m) => {
                format!("[Inject] method '{}' must be an instance method", m.name)
            }
            _ => match injected_member(member) {
                Some(injected) => format!(
                    "[{}] cannot be applied to static member '{}'",
                    injected.options.attribute_name(),
                    member.name()
                ),
                None => return vec![],
            },
        };
        vec![LintDiagnostic::new(&META, ctx.file_path, member.span(), message)]
    }
}
