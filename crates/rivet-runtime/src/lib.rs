//! Rivet Runtime
//!
//! The seams that woven and generated code calls into:
//! - **Registries**: per-type tracked lists and singleton slots (`registry` module)
//! - **Strategy**: singleton conflict flags and their legality table (`strategy` module)
//! - **Unions**: per-family dispatch and reinterpretation (`union` module)
//! - **Init**: per-type initialization call table (`init` module)
//!
//! Nothing here is global: the host owns a [`Registries`] value (one per
//! application or scene) and passes it to generated hooks.

#![warn(rust_2018_idioms)]

pub mod error;
pub mod init;
pub mod registry;
pub mod strategy;
pub mod union;

pub use error::{RegistryError, UnionError};
pub use init::InitTable;
pub use registry::{
    Moved, Registries, SingletonOutcome, SingletonSlot, TrackedRegistry, TrackedSlot,
};
pub use strategy::{SingletonStrategy, STRATEGY_NAMES};
pub use union::{
    AsInterface, FamilyMeta, HeaderLayout, HeaderMut, UnionFamily, UnionHeader, UnionVariant,
};
