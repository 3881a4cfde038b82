//! Rules: union-variant-missing-header (RV3003), union-header-not-first (RV3004),
//! union-variant-missing-interface (RV3005)
//!
//! A variant is reinterpreted through its header, so the header must be
//! its first field, and it must implement the interface the header
//! dispatches to.

use crate::codegen::union::layout::{is_variant, variant_issues, VariantIssue};
use crate::linter::rule::*;
use crate::symbols::SymbolId;

pub struct MissingHeader;
pub struct HeaderNotFirst;
pub struct MissingVariantInterface;

static MISSING_HEADER_META: RuleMeta = RuleMeta {
    name: "union-variant-missing-header",
    code: "RV3003",
    description: "Union variants must start with a union header field",
    category: Category::Correctness,
    default_severity: Severity::Error,
    fixable: false,
};

static NOT_FIRST_META: RuleMeta = RuleMeta {
    name: "union-header-not-first",
    code: "RV3004",
    description: "The header field of a union variant must be its first field",
    category: Category::Correctness,
    default_severity: Severity::Error,
    fixable: false,
};

static MISSING_INTERFACE_META: RuleMeta = RuleMeta {
    name: "union-variant-missing-interface",
    code: "RV3005",
    description: "Union variants must implement their header's interface",
    category: Category::Correctness,
    default_severity: Severity::Error,
    fixable: false,
};

fn report(
    meta: &RuleMeta,
    id: SymbolId,
    ctx: &LintContext<'_>,
    message: impl Fn(&VariantIssue) -> Option<String>,
) -> Vec<LintDiagnostic> {
    if !is_variant(ctx.symbols, id) {
        return vec![];
    }
    let decl = ctx.symbols.decl(id);
    variant_issues(ctx.symbols, id)
        .iter()
        .filter_map(|issue| message(issue))
        .map(|msg| LintDiagnostic::new(meta, ctx.file_path, decl.header_span, msg))
        .collect()
}

impl LintRule for MissingHeader {
    fn meta(&self) -> &RuleMeta {
        &MISSING_HEADER_META
    }

    fn check_type(&self, id: SymbolId, ctx: &LintContext<'_>) -> Vec<LintDiagnostic> {
        let name = &ctx.symbols.decl(id).name;
        report(&MISSING_HEADER_META, id, ctx, |issue| {
            matches!(issue, VariantIssue::MissingHeader).then(|| {
                format!(
                    "Union variant '{}' must start with a field of a [UnionHeader] type",
                    name
                )
            })
        })
    }
}

impl LintRule for HeaderNotFirst {
    fn meta(&self) -> &RuleMeta {
        &NOT_FIRST_META
    }

    fn check_type(&self, id: SymbolId, ctx: &LintContext<'_>) -> Vec<LintDiagnostic> {
        let name = &ctx.symbols.decl(id).name;
        report(&NOT_FIRST_META, id, ctx, |issue| match issue {
            VariantIssue::HeaderNotFirst(field) => Some(format!(
                "Header field '{}' of union variant '{}' must be declared first",
                field, name
            )),
            _ => None,
        })
    }
}

impl LintRule for MissingVariantInterface {
    fn meta(&self) -> &RuleMeta {
        &MISSING_INTERFACE_META
    }

    fn check_type(&self, id: SymbolId, ctx: &LintContext<'_>) -> Vec<LintDiagnostic> {
        let symbols = ctx.symbols;
        let name = &symbols.decl(id).name;
        report(&MISSING_INTERFACE_META, id, ctx, |issue| match issue {
            VariantIssue::MissingInterface { header, interface } => Some(format!(
                "Union variant '{}' must implement '{}.{}'",
                name,
                symbols.decl(*header).name,
                symbols.decl(*interface).name
            )),
            _ => None,
        })
    }
}
