//! Rule: inject-requires-component (RV1007)
//!
//! Component lookups run on the owning object, so the owner must be a
//! component and the looked-up type must be something a component query
//! can return.

use crate::codegen::inject::{injected_member, is_component_like, InjectSource};
use crate::codegen::injection::is_injection_method;
use crate::linter::rule::*;
use crate::symbols::SymbolId;
use crate::syntax::names;
use crate::syntax::Member;

pub struct InjectRequiresComponent;

static META: RuleMeta = RuleMeta {
    name: "inject-requires-component",
    code: "RV1007",
    description: "Component injection is only possible on components, for component types",
    category: Category::Correctness,
    default_severity: Severity::Error,
    fixable: false,
};

impl LintRule for InjectRequiresComponent {
    fn meta(&self) -> &RuleMeta {
        &META
    }

    fn check_member(
        &self,
        owner: SymbolId,
        member: &Member,
        ctx: &LintContext<'_>,
    ) -> Vec<LintDiagnostic> {
        let symbols = ctx.symbols;
        let owner_name = &symbols.decl(owner).name;
        let is_component = symbols.is_component(owner);
        let base = names::qualify(symbols.engine_namespace(), names::COMPONENT);

        if let Member::Method(method) = member {
            if is_injection_method(method) && !is_component {
                return vec![LintDiagnostic::new(
                    &META,
                    ctx.file_path,
                    method.span,
                    format!(
                        "[Inject] method '{}' requires '{}' to derive from {}",
                        method.name, owner_name, base
                    ),
                )];
            }
            return vec![];
        }

        let Some(injected) = injected_member(member) else {
            return vec![];
        };
        if matches!(injected.options.source, InjectSource::Single | InjectSource::All) {
            return vec![];
        }
        let attr = injected.options.attribute_name();
        if !is_component {
            return vec![LintDiagnostic::new(
                &META,
                ctx.file_path,
                member.span(),
                format!(
                    "[{}] on '{}' requires '{}' to derive from {}",
                    attr,
                    member.name(),
                    owner_name,
                    base
                ),
            )];
        }
        let element = injected.element_type();
        if !is_component_like(symbols, &element, owner) {
            return vec![LintDiagnostic::new(
                &META,
                ctx.file_path,
                member.span(),
                format!(
                    "[{}] on '{}' looks up '{}', which is neither a component nor an interface",
                    attr,
                    member.name(),
                    element
                ),
            )];
        }
        vec![]
    }
}

#[cfg(test)]
mod tests {
    use crate::config::CodegenConfig;
    use crate::linter::rule::LintDiagnostic;
    use crate::linter::Linter;
    use crate::syntax::build::{behaviour, game};
    use crate::syntax::{Attribute, PropertyDecl, TypeDecl, TypeKind};

    fn lint(types: Vec<TypeDecl>) -> Vec<LintDiagnostic> {
        Linter::new()
            .lint_compilation(&game(types), &CodegenConfig::default())
            .diagnostics
    }

    fn body() -> PropertyDecl {
        PropertyDecl::new("Body", "Rigidbody").with_attr(Attribute::new("Inject"))
    }

    #[test]
    fn test_non_component_owner_flagged() {
        let settings = TypeDecl::new("Settings", TypeKind::Class)
            .in_namespace("Game")
            .extends("ScriptableObject")
            .with_member(body());
        let diags = lint(vec![settings]);
        let d = diags.iter().find(|d| d.code == "RV1007").expect("RV1007");
        assert_eq!(
            d.message,
            "[Inject] on 'Body' requires 'Settings' to derive from UnityEngine.Component"
        );
    }

    #[test]
    fn test_non_component_target_flagged() {
        let diags = lint(vec![
            TypeDecl::new("Stats", TypeKind::Class).in_namespace("Game"),
            behaviour("Player").with_member(
                PropertyDecl::new("Stats", "Stats").with_attr(Attribute::new("Inject")),
            ),
        ]);
        assert!(diags.iter().any(|d| d.code == "RV1007"), "got: {:?}", diags);
    }

    #[test]
    fn test_component_injection_ok() {
        let diags = lint(vec![behaviour("Player").with_member(body())]);
        assert!(!diags.iter().any(|d| d.code == "RV1007"), "got: {:?}", diags);
    }
}
