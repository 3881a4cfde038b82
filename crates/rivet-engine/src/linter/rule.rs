//! Lint rule trait and supporting types.
//!
//! Each rule implements `LintRule`, provides metadata (`RuleMeta`), and
//! overrides one or more `check_*` hooks. Hooks see one node at a time plus
//! the symbol table for semantic questions.

use serde::Serialize;

use crate::config::CodegenConfig;
use crate::symbols::{SymbolId, SymbolTable};
use crate::syntax::{Expression, Member, MethodDecl, Span, Statement};

/// Severity level for a lint diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Rule is disabled.
    Off,
    /// Suggestion; never fails a build.
    Info,
    /// Reports as a warning.
    Warn,
    /// Reports as an error and fails the build.
    Error,
}

impl Severity {
    /// Parse the spelling used in `rivet.toml`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "off" => Some(Severity::Off),
            "info" => Some(Severity::Info),
            "warn" | "warning" => Some(Severity::Warn),
            "error" => Some(Severity::Error),
            _ => None,
        }
    }
}

/// Category of a lint rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Misuse that prevents or breaks generated code.
    Correctness,
    /// Avoidable allocation.
    Performance,
    /// Suggested rewrites.
    Refactoring,
}

impl Category {
    /// Parse the spelling used as a `[lint]` key.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "correctness" => Some(Category::Correctness),
            "performance" => Some(Category::Performance),
            "refactoring" => Some(Category::Refactoring),
            _ => None,
        }
    }
}

/// Static metadata for a lint rule.
pub struct RuleMeta {
    /// Rule name, e.g. "must-be-partial".
    pub name: &'static str,
    /// Lint code, e.g. "RV1006".
    pub code: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    pub category: Category,
    /// Default severity when no config override is set.
    pub default_severity: Severity,
    /// Whether the rule can provide auto-fixes.
    pub fixable: bool,
}

/// Context passed to each rule.
pub struct LintContext<'a> {
    pub symbols: &'a SymbolTable<'a>,
    pub codegen: &'a CodegenConfig,
    /// Path of the file declaring the type being checked.
    pub file_path: &'a str,
}

/// The method or accessor whose body is being walked.
pub struct BodyScope<'a> {
    /// Type declaring the member.
    pub owner: SymbolId,
    pub member: &'a Member,
    /// `Some` when the body belongs to a method (not a property accessor).
    pub method: Option<&'a MethodDecl>,
    /// Whether the method is an injection method (`[Inject] void Method()`).
    pub is_injection_method: bool,
}

/// A suggested auto-fix: replace a span with new text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintFix {
    pub span: Span,
    pub replacement: String,
}

/// A single diagnostic emitted by a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintDiagnostic {
    /// Rule name (e.g. "must-be-partial").
    pub rule: &'static str,
    /// Lint code (e.g. "RV1006").
    pub code: &'static str,
    pub message: String,
    /// File the span refers to.
    pub file: String,
    pub span: Span,
    pub severity: Severity,
    pub fix: Option<LintFix>,
    pub notes: Vec<String>,
}

impl LintDiagnostic {
    /// A diagnostic for `meta` at its default severity.
    pub fn new(meta: &RuleMeta, file: &str, span: Span, message: impl Into<String>) -> Self {
        Self {
            rule: meta.name,
            code: meta.code,
            message: message.into(),
            file: file.to_string(),
            span,
            severity: meta.default_severity,
            fix: None,
            notes: vec![],
        }
    }

    pub fn with_fix(mut self, span: Span, replacement: impl Into<String>) -> Self {
        self.fix = Some(LintFix {
            span,
            replacement: replacement.into(),
        });
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

/// Trait that every lint rule implements.
///
/// Default implementations return no diagnostics, so rules only override
/// the hooks relevant to them.
pub trait LintRule: Send + Sync {
    /// Static metadata for this rule.
    fn meta(&self) -> &RuleMeta;

    /// Check a type declaration (called once per source type, nested included).
    fn check_type(&self, _id: SymbolId, _ctx: &LintContext<'_>) -> Vec<LintDiagnostic> {
        vec![]
    }

    /// Check a member declaration.
    fn check_member(
        &self,
        _owner: SymbolId,
        _member: &Member,
        _ctx: &LintContext<'_>,
    ) -> Vec<LintDiagnostic> {
        vec![]
    }

    /// Check a whole method or accessor body before it is walked.
    fn check_body(&self, _scope: &BodyScope<'_>, _ctx: &LintContext<'_>) -> Vec<LintDiagnostic> {
        vec![]
    }

    /// Check a statement node.
    fn check_statement(
        &self,
        _stmt: &Statement,
        _scope: &BodyScope<'_>,
        _ctx: &LintContext<'_>,
    ) -> Vec<LintDiagnostic> {
        vec![]
    }

    /// Check an expression node.
    fn check_expression(
        &self,
        _expr: &Expression,
        _scope: &BodyScope<'_>,
        _ctx: &LintContext<'_>,
    ) -> Vec<LintDiagnostic> {
        vec![]
    }
}
