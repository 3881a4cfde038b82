//! Tagged-union families: structural analysis and generated dispatch.

pub mod emit;
pub mod layout;

pub use emit::emit_family;
pub use layout::{collect_families, FamilyLayout, HeaderIssue, IdIssue, VariantIssue, VariantLayout};
