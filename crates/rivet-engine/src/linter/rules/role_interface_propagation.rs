//! Rule: role-interface-propagation (RV1004)
//!
//! Registration is per concrete type: implementing a `[Singleton]` or
//! `[Track]` interface does not register the implementer unless it carries
//! the role too. A `[Track]` base class is enough for tracked interfaces;
//! singleton interfaces always need the attribute on the implementer.

use crate::codegen::roles::{registers_under_interfaces, role_interfaces, Roles};
use crate::linter::rule::*;
use crate::symbols::SymbolId;

pub struct RoleInterfacePropagation;

static META: RuleMeta = RuleMeta {
    name: "role-interface-propagation",
    code: "RV1004",
    description: "Types implementing a role interface should carry the role themselves",
    category: Category::Correctness,
    default_severity: Severity::Warn,
    fixable: false,
};

impl LintRule for RoleInterfacePropagation {
    fn meta(&self) -> &RuleMeta {
        &META
    }

    fn check_type(&self, id: SymbolId, ctx: &LintContext<'_>) -> Vec<LintDiagnostic> {
        let symbols = ctx.symbols;
        let decl = symbols.decl(id);
        if decl.is_interface() {
            return vec![];
        }
        let mut diags = Vec::new();
        for role in [Roles::SINGLETON, Roles::TRACK] {
            let attr = role.attribute_name();
            if registers_under_interfaces(symbols, id, role) {
                continue;
            }
            let interfaces = role_interfaces(symbols, id, role);
            if interfaces.is_empty() {
                continue;
            }
            let names: Vec<&str> =
                interfaces.iter().map(|&i| symbols.decl(i).name.as_str()).collect();
            diags.push(
                LintDiagnostic::new(
                    &META,
                    ctx.file_path,
                    decl.header_span,
                    format!(
                        "'{}' implements [{}] interface {} but is not marked [{}]",
                        decl.name,
                        attr,
                        names.iter().map(|n| format!("'{}'", n)).collect::<Vec<_>>().join(", "),
                        attr
                    ),
                )
                .with_note(format!(
                    "instances of '{}' are not registered under these interfaces",
                    decl.name
                )),
            );
        }
        diags
    }
}

#[cfg(test)]
mod tests {
    use crate::config::CodegenConfig;
    use crate::linter::rule::LintDiagnostic;
    use crate::linter::Linter;
    use crate::syntax::build::{behaviour, game, interface};
    use crate::syntax::{Attribute, TypeDecl};

    fn lint(types: Vec<TypeDecl>) -> Vec<LintDiagnostic> {
        Linter::new()
            .lint_compilation(&game(types), &CodegenConfig::default())
            .diagnostics
    }

    fn count(diags: &[LintDiagnostic], code: &str) -> usize {
        diags.iter().filter(|d| d.code == code).count()
    }

    #[test]
    fn test_missing_track_flagged() {
        let diags = lint(vec![
            interface("IDamageable").with_attr(Attribute::new("Track")),
            behaviour("Crate").implements("IDamageable"),
        ]);
        let d = diags.iter().find(|d| d.code == "RV1004").expect("RV1004");
        assert_eq!(
            d.message,
            "'Crate' implements [Track] interface 'IDamageable' but is not marked [Track]"
        );
    }

    #[test]
    fn test_track_inherited_from_base_ok() {
        let diags = lint(vec![
            interface("IDamageable").with_attr(Attribute::new("Track")),
            behaviour("Unit").with_attr(Attribute::new("Track")),
            behaviour("Soldier").extends("Unit").implements("IDamageable"),
        ]);
        assert_eq!(count(&diags, "RV1004"), 0, "got: {:?}", diags);
    }

    #[test]
    fn test_singleton_not_exempted_by_base() {
        let diags = lint(vec![
            interface("IAudio").with_attr(Attribute::new("Singleton")),
            behaviour("AudioBase").with_attr(Attribute::new("Singleton")),
            behaviour("Audio").extends("AudioBase").implements("IAudio"),
        ]);
        assert_eq!(count(&diags, "RV1004"), 1, "got: {:?}", diags);
    }

    #[test]
    fn test_extended_interface_counts() {
        let diags = lint(vec![
            interface("IUnit").with_attr(Attribute::new("Track")),
            interface("IEnemy").implements("IUnit"),
            behaviour("Slime").implements("IEnemy"),
        ]);
        assert_eq!(count(&diags, "RV1004"), 1, "got: {:?}", diags);
    }
}
