//! Rivet Engine
//!
//! Build-time half of rivet:
//! - **Syntax**: the declaration and body model handed over by the host (`syntax` module)
//! - **Symbols**: name resolution and attribute queries over a compilation (`symbols` module)
//! - **Linter**: the `RV` diagnostic catalogue (`linter` module)
//! - **Codegen**: injection and role analysis, generated partial declarations and
//!   union layouts (`codegen` module)
//! - **Weaver**: weave plans and lifecycle synthesis over compiled modules (`weaver` module)
//! - **Pipeline**: the two-phase entry point tying it together (`pipeline` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use rivet_engine::{Compilation, Generator, IlModule, RivetConfig};
//!
//! let config = RivetConfig::load(project_dir)?;
//! let generator = Generator::new(config)?;
//!
//! let output = generator.run(&Compilation::from_json(&syntax_json)?);
//! for doc in &output.documents {
//!     write_generated(&doc.hint_name, &doc.text);
//! }
//!
//! let mut module = IlModule::from_json(&module_json)?;
//! let failures = generator.weave(&output.plans, &mut module);
//! ```

#![warn(rust_2018_idioms)]

// ============================================================================
// Input
// ============================================================================

pub mod symbols;
pub mod syntax;

// ============================================================================
// Analysis and output
// ============================================================================

pub mod codegen;
pub mod linter;
pub mod pipeline;
pub mod weaver;

// ============================================================================
// Ambient
// ============================================================================

pub mod config;
pub mod error;
pub mod logging;

pub use config::{CodegenConfig, RivetConfig};
pub use error::{ConfigError, GenError, GenResult, WeaveError, WeaveResult};
pub use linter::{LintDiagnostic, Linter, Severity};
pub use pipeline::{GeneratedDocument, GenerationOutput, Generator};
pub use symbols::{SymbolId, SymbolTable};
pub use syntax::{Compilation, Span};
pub use weaver::{IlModule, PrettyPrint, TypePlan, WeaveReport};
