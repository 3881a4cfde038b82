//! Rule: invalid-injection-shape (RV2001)
//!
//! Each injection attribute applies to specific member shapes: eager
//! injection needs storage; lazy and registry lookups need a get-only
//! property; `[Inject.Single]` takes one instance and `[Inject.All]` an
//! array. Injection methods take no parameters and return nothing.

use crate::codegen::inject::{injected_member, shape_errors};
use crate::codegen::injection::is_injection_method;
use crate::linter::rule::*;
use crate::symbols::SymbolId;
use crate::syntax::Member;

pub struct InvalidInjectionShape;

static META: RuleMeta = RuleMeta {
    name: "invalid-injection-shape",
    code: "RV2001",
    description: "Injection attributes must be applied to members of a supported shape",
    category: Category::Correctness,
    default_severity: Severity::Error,
    fixable: false,
};

impl LintRule for InvalidInjectionShape {
    fn meta(&self) -> &RuleMeta {
        &META
    }

    fn check_member(
        &self,
        _owner: SymbolId,
        member: &Member,
        ctx: &LintContext<'_>,
    ) -> Vec<LintDiagnostic> {
        if let Member::Method(method) = member {
            let plain = method.params.is_empty() && method.return_type.is_void();
            if is_injection_method(method) && !plain {
                return vec![LintDiagnostic::new(
                    &META,
                    ctx.file_path,
                    method.span,
                    format!(
                        "[Inject] method '{}' must take no parameters and return void",
                        method.name
                    ),
                )];
            }
            return vec![];
        }
        let Some(injected) = injected_member(member) else {
            return vec![];
        };
        shape_errors(&injected.options, &injected.shape())
            .into_iter()
            .map(|error| {
                LintDiagnostic::new(
                    &META,
                    ctx.file_path,
                    member.span(),
                    error.message(&injected.options, member.name()),
                )
            })
            .collect()
    }
}
