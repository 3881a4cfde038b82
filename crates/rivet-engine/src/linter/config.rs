//! Severity overrides from the `[lint]` table of `rivet.toml`.
//!
//! A key names a rule by code (`RV4001`), by name (`prefer-non-allocating`),
//! or a whole category (`performance`). Every key resolves to lint codes,
//! which is what diagnostics carry. A rule key beats its category key.

use rustc_hash::FxHashMap;

use super::rule::{Category, RuleMeta, Severity};

/// What a `[lint]` key refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LintKey {
    Rule(&'static str),
    Category(Category),
}

impl LintKey {
    /// Resolve `key` against the registered rules.
    pub fn resolve<'r>(rules: impl IntoIterator<Item = &'r RuleMeta>, key: &str) -> Option<Self> {
        if let Some(category) = Category::parse(key) {
            return Some(LintKey::Category(category));
        }
        rules
            .into_iter()
            .find(|meta| meta.name == key || meta.code.eq_ignore_ascii_case(key))
            .map(|meta| LintKey::Rule(meta.code))
    }
}

#[derive(Debug, Clone, Default)]
pub struct LintConfig {
    /// Keyed by lint code.
    rules: FxHashMap<&'static str, Severity>,
    categories: FxHashMap<Category, Severity>,
}

impl LintConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the severity for `key`. Returns the severity it replaced, so a
    /// rule spelled both by name and by code can be caught.
    pub fn set(&mut self, key: LintKey, severity: Severity) -> Option<Severity> {
        match key {
            LintKey::Rule(code) => self.rules.insert(code, severity),
            LintKey::Category(category) => self.categories.insert(category, severity),
        }
    }

    /// Effective severity of a rule.
    pub fn severity(&self, meta: &RuleMeta) -> Severity {
        self.override_for(meta.code, meta.category)
            .unwrap_or(meta.default_severity)
    }

    /// The configured severity for a code, if any.
    pub fn override_for(&self, code: &str, category: Category) -> Option<Severity> {
        self.rules
            .get(code)
            .or_else(|| self.categories.get(&category))
            .copied()
    }

    pub fn is_disabled(&self, meta: &RuleMeta) -> bool {
        self.severity(meta) == Severity::Off
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linter::rule::LintRule;
    use crate::linter::rules::all_rules;

    fn resolve(key: &str) -> Option<LintKey> {
        let rules = all_rules();
        LintKey::resolve(rules.iter().map(|r| r.meta()), key)
    }

    fn meta<'a>(rules: &'a [Box<dyn LintRule>], code: &str) -> &'a RuleMeta {
        rules.iter().map(|r| r.meta()).find(|m| m.code == code).unwrap()
    }

    #[test]
    fn test_name_and_code_resolve_to_same_rule() {
        assert_eq!(resolve("prefer-non-allocating"), Some(LintKey::Rule("RV4001")));
        assert_eq!(resolve("RV4001"), Some(LintKey::Rule("RV4001")));
        assert_eq!(resolve("rv4001"), Some(LintKey::Rule("RV4001")));
        assert_eq!(resolve("performance"), Some(LintKey::Category(Category::Performance)));
        assert_eq!(resolve("RV9001"), None);
        assert_eq!(resolve("no-such-rule"), None);
    }

    #[test]
    fn test_defaults_without_overrides() {
        let rules = all_rules();
        let config = LintConfig::new();
        assert_eq!(config.severity(meta(&rules, "RV1006")), Severity::Error);
        assert_eq!(config.severity(meta(&rules, "RV1004")), Severity::Warn);
    }

    #[test]
    fn test_rule_beats_category() {
        let rules = all_rules();
        let mut config = LintConfig::new();
        config.set(LintKey::Category(Category::Refactoring), Severity::Off);
        config.set(LintKey::Rule("RV4004"), Severity::Warn);
        assert!(config.is_disabled(meta(&rules, "RV4002")));
        assert_eq!(config.severity(meta(&rules, "RV4004")), Severity::Warn);
        assert_eq!(config.severity(meta(&rules, "RV1006")), Severity::Error);
    }

    #[test]
    fn test_set_reports_previous() {
        let mut config = LintConfig::new();
        assert_eq!(config.set(LintKey::Rule("RV1004"), Severity::Error), None);
        assert_eq!(config.set(LintKey::Rule("RV1004"), Severity::Off), Some(Severity::Error));
    }
}
