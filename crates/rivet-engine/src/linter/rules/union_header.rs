//! Rules: union-header-missing-interface (RV3001), union-header-missing-type-id (RV3002)
//!
//! A header declares exactly one nested public interface, the contract its
//! variants implement. A root header also stores the discriminant in a
//! `TypeIds TypeId` field; nested headers share the root's.

use crate::codegen::union::layout::{header_issues, is_header, HeaderIssue};
use crate::linter::rule::*;
use crate::symbols::SymbolId;

pub struct MissingInterface;
pub struct MissingTypeId;

static INTERFACE_META: RuleMeta = RuleMeta {
    name: "union-header-missing-interface",
    code: "RV3001",
    description: "Union headers must declare exactly one nested public interface",
    category: Category::Correctness,
    default_severity: Severity::Error,
    fixable: false,
};

static TYPE_ID_META: RuleMeta = RuleMeta {
    name: "union-header-missing-type-id",
    code: "RV3002",
    description: "Root union headers must declare a 'TypeIds TypeId' field",
    category: Category::Correctness,
    default_severity: Severity::Error,
    fixable: false,
};

impl LintRule for MissingInterface {
    fn meta(&self) -> &RuleMeta {
        &INTERFACE_META
    }

    fn check_type(&self, id: SymbolId, ctx: &LintContext<'_>) -> Vec<LintDiagnostic> {
        if !is_header(ctx.symbols, id) {
            return vec![];
        }
        let decl = ctx.symbols.decl(id);
        header_issues(ctx.symbols, id)
            .into_iter()
            .filter_map(|issue| match issue {
                HeaderIssue::InterfaceCount(found) => Some(LintDiagnostic::new(
                    &INTERFACE_META,
                    ctx.file_path,
                    decl.header_span,
                    format!(
                        "Union header '{}' must declare exactly one nested public interface (found {})",
                        decl.name, found
                    ),
                )),
                _ => None,
            })
            .collect()
    }
}

impl LintRule for MissingTypeId {
    fn meta(&self) -> &RuleMeta {
        &TYPE_ID_META
    }

    fn check_type(&self, id: SymbolId, ctx: &LintContext<'_>) -> Vec<LintDiagnostic> {
        if !is_header(ctx.symbols, id) {
            return vec![];
        }
        let decl = ctx.symbols.decl(id);
        if !header_issues(ctx.symbols, id).contains(&HeaderIssue::MissingTypeId) {
            return vec![];
        }
        vec![LintDiagnostic::new(
            &TYPE_ID_META,
            ctx.file_path,
            decl.header_span,
            format!("Union header '{}' must declare a 'TypeIds TypeId' field", decl.name),
        )
        .with_note(
            "the TypeIds enum is generated; declare the field and the generator fills in the rest",
        )]
    }
}
