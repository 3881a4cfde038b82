//! Rule: union-invalid-id (RV3007)
//!
//! Explicit variant IDs must be unique within a family, non-zero (0 means
//! unset) and fit the 16-bit discriminant.

use crate::codegen::union::layout::{
    collect_families, is_variant, leading_header, root_header, IdIssue,
};
use crate::linter::rule::*;
use crate::symbols::SymbolId;
use crate::syntax::names;

pub struct UnionInvalidId;

static META: RuleMeta = RuleMeta {
    name: "union-invalid-id",
    code: "RV3007",
    description: "Explicit union variant IDs must be unique, non-zero and 16-bit",
    category: Category::Correctness,
    default_severity: Severity::Error,
    fixable: false,
};

impl LintRule for UnionInvalidId {
    fn meta(&self) -> &RuleMeta {
        &META
    }

    fn check_type(&self, id: SymbolId, ctx: &LintContext<'_>) -> Vec<LintDiagnostic> {
        let symbols = ctx.symbols;
        if !is_variant(symbols, id) {
            return vec![];
        }
        let Some(header) = leading_header(symbols, id) else {
            return vec![];
        };
        let root = root_header(symbols, header);
        let Some(family) = collect_families(symbols).into_iter().find(|f| f.root == root) else {
            return vec![];
        };
        let decl = symbols.decl(id);
        let span = symbols
            .attribute(id, names::UNION)
            .map(|a| a.span)
            .unwrap_or(decl.header_span);
        family
            .id_issues
            .iter()
            .filter(|(variant, _)| *variant == id)
            .map(|(_, issue)| {
                let message = match issue {
                    IdIssue::Reserved => format!(
                        "Union variant '{}' cannot use ID 0, which marks an unset header",
                        decl.name
                    ),
                    IdIssue::OutOfRange(raw) => {
                        format!("Union variant '{}' has ID {}, outside 1..=65535", decl.name, raw)
                    }
                    IdIssue::Duplicate { type_id, first } => format!(
                        "Union variant '{}' has ID {}, already used by '{}'",
                        decl.name,
                        type_id,
                        symbols.decl(*first).name
                    ),
                };
                LintDiagnostic::new(&META, ctx.file_path, span, message)
            })
            .collect()
    }
}
