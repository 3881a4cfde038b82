//! Declarative-mode output: partial declarations added next to user types.

use crate::config::CodegenConfig;
use crate::error::GenResult;
use crate::symbols::{SymbolId, SymbolTable};
use crate::syntax::names;
use crate::syntax::TypeKind;

use super::injection::{self, InjectedAssignment};
use super::roles::{self, Roles};
use super::writer::{global_name, string_literal, SourceWriter};
use super::{per_member, GeneratedSource, MemberFailure};

const SINGLETON_REGISTRY: &str = "global::Rivet.Singleton";
const TRACKED_REGISTRY: &str = "global::Rivet.Tracked";
const CHECKS: &str = "global::Rivet.Checks";
const LOG: &str = "global::Rivet.Log";

/// Static accessors for a concrete role type, plus the execution-order
/// attribute for singletons that do not declare one.
pub fn role_source(
    symbols: &SymbolTable<'_>,
    id: SymbolId,
    config: &CodegenConfig,
) -> Option<GeneratedSource> {
    let decl = symbols.decl(id);
    let roles = Roles::of(decl);
    if roles.is_empty()
        || !roles.is_exclusive()
        || decl.kind != TypeKind::Class
        || decl.is_abstract()
    {
        return None;
    }

    let this = global_name(symbols, id);
    let mut attributes = Vec::new();
    let mut lines = Vec::new();
    if roles.contains(Roles::SINGLETON) {
        if roles::execution_order(decl, &config.engine_namespace).is_none() {
            attributes.push(format!(
                "global::{}.{}({})",
                config.engine_namespace,
                names::EXECUTION_ORDER,
                config.singleton_execution_order
            ));
        }
        if decl.member("Instance").is_none() {
            lines.push(format!(
                "public static {} Instance => {}<{}>.Instance;",
                this, SINGLETON_REGISTRY, this
            ));
        }
    }
    if roles.contains(Roles::TRACK) && decl.member("Instances").is_none() {
        lines.push(format!(
            "public static {}[] Instances => {}<{}>.Instances;",
            this, TRACKED_REGISTRY, this
        ));
    }
    if attributes.is_empty() && lines.is_empty() {
        return None;
    }

    let mut w = SourceWriter::document();
    w.open_type_with(symbols, id, &attributes);
    for line in lines {
        w.line(line);
    }
    Some(GeneratedSource {
        hint_name: format!("{}.Roles.g.cs", symbols.full_name(id)),
        text: w.finish(),
    })
}

/// Backing fields and checked properties for every member declared by the
/// type's injection methods. Assignments whose type cannot be inferred are
/// left out; a member that fails to render is returned as a failure and
/// left out as well.
pub fn injection_source(
    symbols: &SymbolTable<'_>,
    id: SymbolId,
) -> (Option<GeneratedSource>, Vec<MemberFailure>) {
    let decl = symbols.decl(id);
    let mut members: Vec<(InjectedAssignment<'_>, String)> = Vec::new();
    for method in injection::injection_methods(decl) {
        for assignment in injection::assignments(decl, method) {
            if members.iter().any(|(m, _)| m.name == assignment.name) {
                continue;
            }
            if let Some(ty) = assignment.inferred_type() {
                members.push((assignment, ty.to_string()));
            }
        }
    }

    let file = symbols.file_path(id);
    let full_name = symbols.full_name(id);
    let (rendered, failures) = per_member(
        &members,
        |(assignment, _)| (assignment.name.to_string(), assignment.span),
        |(assignment, ty)| injected_property(assignment, ty, full_name, file),
    );
    if rendered.is_empty() {
        return (None, failures);
    }

    let mut w = SourceWriter::document();
    w.open_type(symbols, id);
    for (index, text) in rendered.iter().enumerate() {
        if index > 0 {
            w.blank();
        }
        w.block(text);
    }
    let source = GeneratedSource {
        hint_name: format!("{}.Inject.g.cs", full_name),
        text: w.finish(),
    };
    (Some(source), failures)
}

fn injected_property(
    assignment: &InjectedAssignment<'_>,
    ty: &str,
    owner: &str,
    file: &str,
) -> GenResult<String> {
    let backing = format!("__injected{}", assignment.name);
    let check = if ty.ends_with(']') { "IsNonEmpty" } else { "IsAlive" };

    let mut w = SourceWriter::new();
    w.line("[global::System.NonSerialized]");
    w.line(format!("private {} {};", ty, backing));
    w.blank();
    w.open(format!("public {} {}", ty, assignment.name));
    w.line(format!("get => {};", backing));
    w.open("private set");
    w.line(format!("{} = value;", backing));
    if !assignment.optional {
        w.line(format!("if (!{}.{}(value))", CHECKS, check));
        w.line(format!(
            "    {}.MissingInjection({}, {}, {}, {}, {});",
            LOG,
            string_literal(assignment.name),
            string_literal(owner),
            string_literal(&assignment.value_text()),
            string_literal(file),
            assignment.span.line
        ));
    }
    Ok(w.finish())
}
