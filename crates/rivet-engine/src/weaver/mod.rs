//! IL weaving
//!
//! Generated source covers what a type can declare about itself. Everything
//! that has to run inside engine callbacks (injection, registration,
//! replaced accessors) is woven into the compiled module instead:
//!
//! 1. [`plan_type`] reduces a source type to a [`TypePlan`].
//! 2. [`weave`] applies the plans to an [`IlModule`], synthesizing missing
//!    callbacks through the [`LifecycleSynthesizer`].
//!
//! [`PrettyPrint`] renders the result for inspection.

pub mod emit;
pub mod il;
pub mod lifecycle;
pub mod plan;
pub mod pretty;

pub use emit::{weave, WeaveFailure, WeaveReport};
pub use il::{IlMethod, IlModule, IlType, Instr, MethodRef};
pub use lifecycle::{LifecycleSynthesizer, MethodHandle};
pub use plan::{plan_type, TypePlan};
pub use pretty::PrettyPrint;
