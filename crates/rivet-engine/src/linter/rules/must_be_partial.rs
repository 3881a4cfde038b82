//! Rule: must-be-partial (RV1006)
//!
//! Generated members are added as partial declarations, so a codegen
//! target and every type containing it must be declared `partial`. The
//! finding spans the declaration header only.

use crate::codegen::{is_codegen_target, non_partial_chain};
use crate::linter::rule::*;
use crate::symbols::SymbolId;

pub struct MustBePartial;

static META: RuleMeta = RuleMeta {
    name: "must-be-partial",
    code: "RV1006",
    description: "Types that receive generated code must be declared partial",
    category: Category::Correctness,
    default_severity: Severity::Error,
    fixable: false,
};

impl LintRule for MustBePartial {
    fn meta(&self) -> &RuleMeta {
        &META
    }

    fn check_type(&self, id: SymbolId, ctx: &LintContext<'_>) -> Vec<LintDiagnostic> {
        let symbols = ctx.symbols;
        if !is_codegen_target(symbols, id) {
            return vec![];
        }
        let name = &symbols.decl(id).name;
        non_partial_chain(symbols, id)
            .into_iter()
            .map(|t| {
                let decl = symbols.decl(t);
                let message = if t == id {
                    format!("'{}' must be declared partial to receive generated code", name)
                } else {
                    format!(
                        "'{}' must be declared partial because it contains '{}', which receives generated code",
                        decl.name, name
                    )
                };
                LintDiagnostic::new(&META, ctx.file_path, decl.header_span, message)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::config::CodegenConfig;
    use crate::linter::rule::LintDiagnostic;
    use crate::linter::Linter;
    use crate::syntax::build::{behaviour, game, inject_method, lookup};
    use crate::syntax::{Attribute, Expression, Span, TypeDecl, TypeKind};

    fn lint(types: Vec<TypeDecl>) -> Vec<LintDiagnostic> {
        Linter::new()
            .lint_compilation(&game(types), &CodegenConfig::default())
            .diagnostics
    }

    fn plain(name: &str) -> TypeDecl {
        TypeDecl::new(name, TypeKind::Class)
            .in_namespace("Game")
            .extends("MonoBehaviour")
    }

    #[test]
    fn test_singleton_not_partial_spans_header() {
        let header = Span::new(40, 72, 3, 5);
        let diags = lint(vec![plain("Director")
            .with_attr(Attribute::new("Singleton"))
            .at(Span::new(20, 400, 2, 1))
            .with_header_span(header)]);
        let d = diags.iter().find(|d| d.code == "RV1006").expect("RV1006");
        assert_eq!(d.span, header);
    }

    #[test]
    fn test_injection_method_requires_partial() {
        let diags = lint(vec![plain("Player").with_member(inject_method(
            "Awake",
            vec![Expression::ident("Body").assign(lookup("GetComponent", "Rigidbody")).stmt()],
        ))]);
        assert!(diags.iter().any(|d| d.code == "RV1006"), "got: {:?}", diags);
    }

    #[test]
    fn test_containing_type_must_be_partial() {
        let diags = lint(vec![
            plain("Outer").with_nested(behaviour("Hub").with_attr(Attribute::new("Track")))
        ]);
        let found: Vec<_> = diags.iter().filter(|d| d.code == "RV1006").collect();
        assert_eq!(found.len(), 1);
        assert!(found[0].message.starts_with("'Outer' must be declared partial"));
    }

    #[test]
    fn test_plain_behaviour_ok() {
        let diags = lint(vec![plain("Rotator")]);
        assert!(!diags.iter().any(|d| d.code == "RV1006"));
    }
}
