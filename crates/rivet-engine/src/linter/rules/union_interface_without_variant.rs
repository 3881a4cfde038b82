//! Rule: union-interface-without-variant (RV3006)
//!
//! A header's interface is dispatched by type ID. A type implementing it
//! without being a variant never gets an ID and cannot be reached.

use crate::codegen::union::layout::{interface_owner, is_header, is_variant};
use crate::linter::rule::*;
use crate::symbols::SymbolId;

pub struct UnionInterfaceWithoutVariant;

static META: RuleMeta = RuleMeta {
    name: "union-interface-without-variant",
    code: "RV3006",
    description: "Only [Union] variants may implement a union header's interface",
    category: Category::Correctness,
    default_severity: Severity::Error,
    fixable: false,
};

impl LintRule for UnionInterfaceWithoutVariant {
    fn meta(&self) -> &RuleMeta {
        &META
    }

    fn check_type(&self, id: SymbolId, ctx: &LintContext<'_>) -> Vec<LintDiagnostic> {
        let symbols = ctx.symbols;
        let decl = symbols.decl(id);
        if decl.is_interface() || is_variant(symbols, id) || is_header(symbols, id) {
            return vec![];
        }
        symbols
            .all_interfaces(id)
            .into_iter()
            .filter_map(|iface| {
                let header = interface_owner(symbols, iface)?;
                Some(LintDiagnostic::new(
                    &META,
                    ctx.file_path,
                    decl.header_span,
                    format!(
                        "'{}' implements union interface '{}.{}' but is not marked [Union]",
                        decl.name,
                        symbols.decl(header).name,
                        symbols.decl(iface).name
                    ),
                ))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::config::CodegenConfig;
    use crate::linter::rule::LintDiagnostic;
    use crate::linter::Linter;
    use crate::syntax::build::game;
    use crate::syntax::{Attribute, FieldDecl, Modifier, TypeDecl, TypeKind};

    fn lint(types: Vec<TypeDecl>) -> Vec<LintDiagnostic> {
        Linter::new()
            .lint_compilation(&game(types), &CodegenConfig::default())
            .diagnostics
    }

    fn header() -> TypeDecl {
        TypeDecl::new("ShapeHeader", TypeKind::Struct)
            .in_namespace("Game")
            .partial()
            .with_attr(Attribute::new("UnionHeader"))
            .with_member(FieldDecl::new("TypeId", "TypeIds"))
            .with_nested(
                TypeDecl::new("IShape", TypeKind::Interface).with_modifier(Modifier::Public),
            )
    }

    #[test]
    fn test_implementer_without_union_flagged() {
        let diags = lint(vec![
            header(),
            TypeDecl::new("Blob", TypeKind::Struct)
                .in_namespace("Game")
                .implements("ShapeHeader.IShape"),
        ]);
        let d = diags.iter().find(|d| d.code == "RV3006").expect("RV3006");
        assert_eq!(
            d.message,
            "'Blob' implements union interface 'ShapeHeader.IShape' but is not marked [Union]"
        );
    }

    #[test]
    fn test_variant_ok() {
        let diags = lint(vec![
            header(),
            TypeDecl::new("Circle", TypeKind::Struct)
                .in_namespace("Game")
                .partial()
                .with_attr(Attribute::new("Union"))
                .implements("ShapeHeader.IShape")
                .with_member(FieldDecl::new("Header", "ShapeHeader")),
        ]);
        assert!(!diags.iter().any(|d| d.code == "RV3006"));
    }
}
