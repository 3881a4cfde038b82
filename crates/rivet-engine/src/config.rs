//! Project configuration (`rivet.toml`).
//!
//! ```toml
//! [lint]
//! prefer-non-allocating = "off"
//! RV1004 = "error"
//! refactoring = "warn"
//!
//! [codegen]
//! init_method = "Awake"
//! singleton_execution_order = -1
//! default_singleton_strategy = ["Replace", "LogWarning"]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use rivet_runtime::SingletonStrategy;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::linter::{rules, LintConfig, LintKey, Severity};

/// File name looked up by [`RivetConfig::load`].
pub const CONFIG_FILE: &str = "rivet.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RivetConfig {
    /// Severity overrides keyed by rule name, lint code or category.
    #[serde(default)]
    pub lint: BTreeMap<String, String>,

    #[serde(default)]
    pub codegen: CodegenConfig,
}

/// Code generation and weaving settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodegenConfig {
    /// Lifecycle method that runs injection (and is the initialization entry point).
    pub init_method: String,
    /// Lifecycle method that registers instances.
    pub enable_method: String,
    /// Lifecycle method that unregisters instances.
    pub disable_method: String,
    /// Execution order given to singletons without an explicit one.
    pub singleton_execution_order: i32,
    /// Namespace of the engine's own types.
    pub engine_namespace: String,
    /// Whether the target engine honours `includeInactive` for parent lookups.
    pub parents_include_inactive_supported: bool,
    /// Strategy used by `[Singleton]` without an explicit one.
    pub default_singleton_strategy: Vec<String>,
    /// Generate types on the rayon pool.
    pub parallel: bool,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            init_method: "Awake".to_string(),
            enable_method: "OnEnable".to_string(),
            disable_method: "OnDisable".to_string(),
            singleton_execution_order: -1,
            engine_namespace: "UnityEngine".to_string(),
            parents_include_inactive_supported: false,
            default_singleton_strategy: vec!["Replace".to_string(), "LogWarning".to_string()],
            parallel: true,
        }
    }
}

impl CodegenConfig {
    /// The default strategy as flags. Unknown names are skipped; `validate`
    /// rejects them up front.
    pub fn default_strategy(&self) -> SingletonStrategy {
        self.default_singleton_strategy
            .iter()
            .filter_map(|name| SingletonStrategy::from_source_name(name))
            .fold(SingletonStrategy::empty(), |acc, flag| acc | flag)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("init_method", &self.init_method),
            ("enable_method", &self.enable_method),
            ("disable_method", &self.disable_method),
        ] {
            if !is_identifier(value) {
                return Err(ConfigError::ValidationError(format!(
                    "codegen.{} must be a method name, got '{}'",
                    key, value
                )));
            }
        }
        if self.engine_namespace.is_empty() {
            return Err(ConfigError::ValidationError(
                "codegen.engine_namespace cannot be empty".to_string(),
            ));
        }
        for name in &self.default_singleton_strategy {
            if SingletonStrategy::from_source_name(name).is_none() {
                return Err(ConfigError::ValidationError(format!(
                    "Unknown singleton strategy flag: {}",
                    name
                )));
            }
        }
        let conflicts = self.default_strategy().conflicts();
        if !conflicts.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "codegen.default_singleton_strategy combines conflicting flags: {}",
                conflicts.join(", ")
            )));
        }
        Ok(())
    }
}

impl RivetConfig {
    /// Parse a config from a file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse a config from a string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: RivetConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `rivet.toml` from `dir`, or the defaults when there is none.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILE);
        if path.is_file() {
            tracing::debug!(path = %path.display(), "loading config");
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.lint_config()?;
        self.codegen.validate()
    }

    /// Build the linter configuration from the `[lint]` table. A rule named
    /// twice (once by name, once by code) must agree on its severity.
    pub fn lint_config(&self) -> Result<LintConfig, ConfigError> {
        let rules = rules::all_rules();
        let mut config = LintConfig::new();
        for (key, value) in &self.lint {
            let target = LintKey::resolve(rules.iter().map(|r| r.meta()), key).ok_or_else(|| {
                ConfigError::ValidationError(format!("Unknown lint rule: {}", key))
            })?;
            let severity = Severity::parse(value).ok_or_else(|| {
                ConfigError::ValidationError(format!(
                    "Invalid severity '{}' for rule {} (expected off, info, warn or error)",
                    value, key
                ))
            })?;
            if let Some(previous) = config.set(target, severity) {
                if previous != severity {
                    return Err(ConfigError::ValidationError(format!(
                        "Lint rule {} is configured twice with different severities",
                        key
                    )));
                }
            }
        }
        Ok(config)
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}
