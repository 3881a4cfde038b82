//! Code generation analysis and declarative source output.
//!
//! The analysis helpers here are shared with the linter so that a member the
//! linter rejects is never generated.

pub mod inject;
pub mod injection;
pub mod lookup;
pub mod roles;
pub mod source;
pub mod union;
pub mod writer;

use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};

use crate::error::GenResult;
use crate::symbols::{SymbolId, SymbolTable};
use crate::syntax::{names, Span};

/// A generated source document before fingerprinting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedSource {
    pub hint_name: String,
    pub text: String,
}

/// A member whose transform returned an error or panicked. It contributes
/// no output; the pipeline reports it as an internal error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberFailure {
    pub member: String,
    pub span: Span,
    pub error: String,
}

/// Run `f`, turning an error or a panic into its message.
pub fn catch_failure<T>(f: impl FnOnce() -> GenResult<T>) -> Result<T, String> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(e.to_string()),
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}

/// Transform every item separately. A failing item is recorded under the
/// name and span `describe` gives it; the others still produce output.
pub fn per_member<I, T>(
    items: impl IntoIterator<Item = I>,
    describe: impl Fn(&I) -> (String, Span),
    transform: impl Fn(&I) -> GenResult<T>,
) -> (Vec<T>, Vec<MemberFailure>) {
    let mut out = Vec::new();
    let mut failures = Vec::new();
    for item in items {
        match catch_failure(|| transform(&item)) {
            Ok(value) => out.push(value),
            Err(error) => {
                let (member, span) = describe(&item);
                tracing::error!(member = %member, error = %error, "member transform failed");
                failures.push(MemberFailure { member, span, error });
            }
        }
    }
    (out, failures)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Whether generated source is added to `id`, so it must be declared partial.
pub fn is_codegen_target(symbols: &SymbolTable<'_>, id: SymbolId) -> bool {
    let decl = symbols.decl(id);
    if decl.is_interface() {
        return false;
    }
    decl.has_attribute(names::SINGLETON)
        || decl.has_attribute(names::TRACK)
        || decl.has_attribute(names::UNION_HEADER)
        || decl.has_attribute(names::UNION)
        || !injection::injection_methods(decl).is_empty()
}

/// `id` and the types containing it that are not declared partial,
/// outermost first.
pub fn non_partial_chain(symbols: &SymbolTable<'_>, id: SymbolId) -> Vec<SymbolId> {
    symbols
        .containing_chain(id)
        .into_iter()
        .chain(std::iter::once(id))
        .filter(|&t| !symbols.decl(t).is_partial())
        .collect()
}

/// Whether source can be generated into `id`.
pub fn can_extend(symbols: &SymbolTable<'_>, id: SymbolId) -> bool {
    non_partial_chain(symbols, id).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenError;
    use crate::syntax::{Attribute, Compilation, TypeDecl, TypeKind};

    #[test]
    fn test_failing_member_does_not_drop_siblings() {
        let members = ["Body", "Anim", "Collider"];
        let (done, failures) = per_member(
            members,
            |name| (name.to_string(), Span::new(0, 4, 3, 5)),
            |&name| -> GenResult<String> {
                match name {
                    "Anim" => panic!("no lookup for Animator"),
                    "Collider" => Err(GenError::UnknownMemberType {
                        member: name.to_string(),
                    }),
                    _ => Ok(name.to_lowercase()),
                }
            },
        );
        assert_eq!(done, vec!["body".to_string()]);
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].member, "Anim");
        assert_eq!(failures[0].error, "no lookup for Animator");
        assert_eq!(failures[0].span.line, 3);
        assert_eq!(failures[1].error, "Cannot determine the type of 'Collider'");
    }

    #[test]
    fn test_non_partial_chain_includes_container() {
        let c = Compilation::new("Game").with_file(
            "A.cs",
            vec![TypeDecl::new("Outer", TypeKind::Class).with_nested(
                TypeDecl::new("Hub", TypeKind::Class)
                    .partial()
                    .with_attr(Attribute::new("Singleton")),
            )],
        );
        let symbols = SymbolTable::new(&c, "UnityEngine");
        let hub = symbols.lookup("Outer.Hub").unwrap();
        let outer = symbols.lookup("Outer").unwrap();
        assert!(is_codegen_target(&symbols, hub));
        assert!(!is_codegen_target(&symbols, outer));
        assert_eq!(non_partial_chain(&symbols, hub), vec![outer]);
        assert!(!can_extend(&symbols, hub));
    }
}
