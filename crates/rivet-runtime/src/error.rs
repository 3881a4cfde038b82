//! Runtime errors

use thiserror::Error;

/// Errors raised by the tracked and singleton registries.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A slot index past the end of the tracked list.
    #[error("Tracked slot {slot} is out of range for '{registry}' (len {len})")]
    SlotOutOfRange {
        registry: &'static str,
        slot: usize,
        len: usize,
    },

    /// A singleton registration conflicted under the `Throw` strategy.
    #[error(
        "Singleton '{registry}' already has a registered instance; \
         the conflicting registration was rejected"
    )]
    SingletonConflict { registry: &'static str },
}

/// Errors raised by union-family dispatch and reinterpretation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UnionError {
    /// The stored type id does not belong to any registered variant.
    #[error("Unknown {family}.TypeIds value: {type_id}")]
    UnknownTypeId { family: &'static str, type_id: u16 },

    /// Variant ids start at 1; 0 means "unset".
    #[error("Variant '{variant}' of {family} uses reserved type id 0")]
    ReservedTypeId {
        family: &'static str,
        variant: &'static str,
    },

    /// Two variants claimed the same id.
    #[error("Type id {type_id} of {family} is used by both '{first}' and '{second}'")]
    DuplicateTypeId {
        family: &'static str,
        type_id: u16,
        first: &'static str,
        second: &'static str,
    },

    /// `as_variant` was called with the wrong variant type.
    #[error("Invalid union cast in {family}: expected '{expected}', found '{actual}'")]
    VariantMismatch {
        family: &'static str,
        expected: &'static str,
        actual: String,
    },

    /// The header was not created from a value of the variant its id names.
    #[error("Header of {family} with type id {type_id} does not point at a '{variant}' value")]
    LayoutMismatch {
        family: &'static str,
        type_id: u16,
        variant: &'static str,
    },

    /// The id does not belong to the nested family.
    #[error("Type id {type_id} is not a member of nested family {family}")]
    NotInFamily { family: &'static str, type_id: u16 },
}
