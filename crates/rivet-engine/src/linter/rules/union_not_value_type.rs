//! Rule: union-not-value-type (RV3008)

use crate::codegen::union::layout::{is_header, is_variant};
use crate::linter::rule::*;
use crate::symbols::SymbolId;

pub struct UnionNotValueType;

static META: RuleMeta = RuleMeta {
    name: "union-not-value-type",
    code: "RV3008",
    description: "Union headers and variants must be structs",
    category: Category::Correctness,
    default_severity: Severity::Error,
    fixable: false,
};

impl LintRule for UnionNotValueType {
    fn meta(&self) -> &RuleMeta {
        &META
    }

    fn check_type(&self, id: SymbolId, ctx: &LintContext<'_>) -> Vec<LintDiagnostic> {
        let symbols = ctx.symbols;
        let decl = symbols.decl(id);
        if decl.is_value_type() {
            return vec![];
        }
        let attr = if is_header(symbols, id) {
            "UnionHeader"
        } else if is_variant(symbols, id) {
            "Union"
        } else {
            return vec![];
        };
        vec![LintDiagnostic::new(
            &META,
            ctx.file_path,
            decl.header_span,
            format!("'{}' is marked [{}] but is not a struct", decl.name, attr),
        )]
    }
}
