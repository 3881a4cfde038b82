//! Rivet Linter
//!
//! Compile-time diagnostics for attribute misuse, union layout errors,
//! avoidable allocation and caching opportunities.
//!
//! # Architecture
//!
//! - Each rule implements [`LintRule`] and checks individual nodes.
//! - The [`LintRunner`](runner::LintRunner) walks every source type once and
//!   dispatches to all enabled rules.
//! - [`Linter`] is the public entry point: create one, then call
//!   [`lint`](Linter::lint) with a symbol table.
//!
//! # Example
//!
//! ```ignore
//! use rivet_engine::linter::Linter;
//!
//! let result = Linter::new().lint_compilation(&compilation, &CodegenConfig::default());
//! for d in &result.diagnostics {
//!     println!("[{}] {}: {}", d.code, d.rule, d.message);
//! }
//! ```

pub mod config;
pub mod render;
pub mod rule;
pub mod rules;
mod runner;

pub use config::{LintConfig, LintKey};
pub use rule::{
    BodyScope, Category, LintContext, LintDiagnostic, LintFix, LintRule, RuleMeta, Severity,
};

use crate::config::CodegenConfig;
use crate::symbols::SymbolTable;
use crate::syntax::Compilation;
use runner::LintRunner;

/// Result of linting a compilation.
#[derive(Debug, Default)]
pub struct LintResult {
    /// All diagnostics, in traversal order.
    pub diagnostics: Vec<LintDiagnostic>,
    /// Number of diagnostics that have an auto-fix.
    pub fixable_count: usize,
}

impl LintResult {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }
}

/// Holds the set of rules and the severity configuration.
pub struct Linter {
    rules: Vec<Box<dyn LintRule>>,
    config: LintConfig,
}

impl Linter {
    /// Create a linter with all rules at their default severities.
    pub fn new() -> Self {
        Self {
            rules: rules::all_rules(),
            config: LintConfig::new(),
        }
    }

    /// Create a linter with configuration overrides.
    pub fn with_config(config: LintConfig) -> Self {
        Self {
            rules: rules::all_rules(),
            config,
        }
    }

    /// Metadata of every registered rule.
    pub fn rules(&self) -> impl Iterator<Item = &RuleMeta> {
        self.rules.iter().map(|r| r.meta())
    }

    /// Lint every source type of the symbol table.
    pub fn lint(&self, symbols: &SymbolTable<'_>, codegen: &CodegenConfig) -> LintResult {
        let active: Vec<&dyn LintRule> = self
            .rules
            .iter()
            .filter(|r| !self.config.is_disabled(r.meta()))
            .map(|r| r.as_ref())
            .collect();

        let mut diagnostics = LintRunner::new(&active).run(symbols, codegen);

        let categories: Vec<_> = active
            .iter()
            .map(|r| (r.meta().code, r.meta().category))
            .collect();
        diagnostics.retain_mut(|d| {
            let Some(&(_, category)) = categories.iter().find(|(code, _)| *code == d.code) else {
                return true;
            };
            match self.config.override_for(d.code, category) {
                Some(Severity::Off) => false,
                Some(severity) => {
                    d.severity = severity;
                    true
                }
                None => true,
            }
        });

        let fixable_count = diagnostics.iter().filter(|d| d.fix.is_some()).count();
        tracing::debug!(
            diagnostics = diagnostics.len(),
            fixable = fixable_count,
            "lint finished"
        );

        LintResult {
            diagnostics,
            fixable_count,
        }
    }

    /// Convenience: build the symbol table and lint.
    pub fn lint_compilation(
        &self,
        compilation: &Compilation,
        codegen: &CodegenConfig,
    ) -> LintResult {
        let symbols = SymbolTable::new(compilation, &codegen.engine_namespace);
        self.lint(&symbols, codegen)
    }
}

impl Default for Linter {
    fn default() -> Self {
        Self::new()
    }
}
