//! Lint runner: walks every source type once and dispatches to all enabled rules.

use crate::codegen::injection::is_injection_method;
use crate::config::CodegenConfig;
use crate::symbols::{SymbolId, SymbolTable};
use crate::syntax::visitor::{self, Visitor};
use crate::syntax::{Block, Expression, Member, Statement};

use super::rule::{BodyScope, LintContext, LintDiagnostic, LintRule};

/// Runs all enabled lint rules over a compilation in a single traversal.
pub struct LintRunner<'a> {
    rules: &'a [&'a dyn LintRule],
    diagnostics: Vec<LintDiagnostic>,
}

impl<'a> LintRunner<'a> {
    pub fn new(rules: &'a [&'a dyn LintRule]) -> Self {
        Self {
            rules,
            diagnostics: Vec::new(),
        }
    }

    /// Run all rules over every source type and return collected diagnostics.
    pub fn run(
        mut self,
        symbols: &SymbolTable<'_>,
        codegen: &CodegenConfig,
    ) -> Vec<LintDiagnostic> {
        for id in symbols.source_types() {
            let ctx = LintContext {
                symbols,
                codegen,
                file_path: symbols.file_path(id),
            };
            self.run_type(id, &ctx);
        }
        self.diagnostics
    }

    fn run_type(&mut self, id: SymbolId, ctx: &LintContext<'_>) {
        for rule in self.rules {
            self.diagnostics.extend(rule.check_type(id, ctx));
        }

        for member in &ctx.symbols.decl(id).members {
            for rule in self.rules {
                self.diagnostics.extend(rule.check_member(id, member, ctx));
            }

            let (method, bodies): (_, Vec<&Block>) = match member {
                Member::Method(m) => (Some(m), m.body.iter().collect()),
                Member::Property(p) => (
                    None,
                    [&p.getter, &p.setter]
                        .into_iter()
                        .flatten()
                        .filter_map(|a| a.body.as_ref())
                        .collect(),
                ),
                Member::Field(_) => continue,
            };
            if bodies.is_empty() {
                continue;
            }

            let scope = BodyScope {
                owner: id,
                member,
                method,
                is_injection_method: method.is_some_and(is_injection_method),
            };
            for rule in self.rules {
                self.diagnostics.extend(rule.check_body(&scope, ctx));
            }
            let mut walker = BodyWalker {
                rules: self.rules,
                scope: &scope,
                ctx,
                diagnostics: &mut self.diagnostics,
            };
            for body in bodies {
                walker.visit_block(body);
            }
        }
    }
}

struct BodyWalker<'r, 's> {
    rules: &'r [&'r dyn LintRule],
    scope: &'s BodyScope<'s>,
    ctx: &'s LintContext<'s>,
    diagnostics: &'s mut Vec<LintDiagnostic>,
}

impl<'b> Visitor<'b> for BodyWalker<'_, '_> {
    fn visit_statement(&mut self, stmt: &'b Statement) {
        for rule in self.rules {
            self.diagnostics
                .extend(rule.check_statement(stmt, self.scope, self.ctx));
        }
        visitor::walk_statement(self, stmt);
    }

    fn visit_expression(&mut self, expr: &'b Expression) {
        for rule in self.rules {
            self.diagnostics
                .extend(rule.check_expression(expr, self.scope, self.ctx));
        }
        visitor::walk_expression(self, expr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linter::rule::{Category, RuleMeta, Severity};
    use crate::syntax::{Compilation, MethodDecl, TypeDecl, TypeKind};

    /// Flags every statement (test only).
    struct FlagAllStatements;

    static FLAG_ALL_META: RuleMeta = RuleMeta {
        name: "flag-all",
        code: "T0001",
        description: "Flags every statement (test only)",
        category: Category::Correctness,
        default_severity: Severity::Warn,
        fixable: false,
    };

    impl LintRule for FlagAllStatements {
        fn meta(&self) -> &RuleMeta {
            &FLAG_ALL_META
        }

        fn check_statement(
            &self,
            stmt: &Statement,
            _scope: &BodyScope<'_>,
            ctx: &LintContext<'_>,
        ) -> Vec<LintDiagnostic> {
            vec![LintDiagnostic::new(&FLAG_ALL_META, ctx.file_path, stmt.span(), "flagged")]
        }
    }

    #[test]
    fn test_runner_dispatches_to_rules() {
        let compilation = Compilation::new("Game").with_file(
            "Assets/Player.cs",
            vec![TypeDecl::new("Player", TypeKind::Class).with_member(
                MethodDecl::new("Update").with_body(Block::new(vec![
                    Expression::ident("Jump").call(vec![]).stmt(),
                    Statement::ret(None),
                ])),
            )],
        );
        let symbols = SymbolTable::new(&compilation, "UnityEngine");
        let rules: Vec<&dyn LintRule> = vec![&FlagAllStatements];
        let diags = LintRunner::new(&rules).run(&symbols, &CodegenConfig::default());

        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].code, "T0001");
        assert_eq!(diags[0].file, "Assets/Player.cs");
    }

    #[test]
    fn test_runner_empty_rules() {
        let compilation = Compilation::new("Empty");
        let symbols = SymbolTable::new(&compilation, "UnityEngine");
        let rules: Vec<&dyn LintRule> = vec![];
        let diags = LintRunner::new(&rules).run(&symbols, &CodegenConfig::default());
        assert!(diags.is_empty());
    }
}
