//! Two-phase generation pipeline.
//!
//! Phase one ([`Generator::candidates`]) is a cheap structural scan that
//! only looks at attribute names and declared bases. Phase two
//! ([`Generator::run`]) builds the symbol table, lints the compilation and
//! transforms every candidate into generated documents and weave plans.
//!
//! Each type and each union family is one unit of work. Inside a type every
//! injected member is transformed on its own: a member that fails (or
//! panics) gets one `RV9001` diagnostic and no output, and its siblings are
//! still generated. A failure in the type-level steps (role helpers,
//! registrations) or in a union family discards that whole unit.

use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::codegen::{self, catch_failure, source, union, GeneratedSource, MemberFailure};
use crate::config::{CodegenConfig, RivetConfig};
use crate::error::{ConfigError, GenError, GenResult};
use crate::linter::rules::internal_error;
use crate::linter::{LintDiagnostic, Linter};
use crate::symbols::{SymbolId, SymbolTable};
use crate::syntax::names::{self, CANDIDATE_ROOTS};
use crate::syntax::{Attribute, Compilation, TypeDecl};
use crate::weaver::{self, plan_type, IlModule, TypePlan};

/// A generated source document with its cache key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedDocument {
    pub hint_name: String,
    pub text: String,
    /// Hex SHA-256 of `text`.
    pub fingerprint: String,
}

impl From<GeneratedSource> for GeneratedDocument {
    fn from(source: GeneratedSource) -> Self {
        let fingerprint = hex::encode(Sha256::digest(source.text.as_bytes()));
        Self {
            hint_name: source.hint_name,
            text: source.text,
            fingerprint,
        }
    }
}

/// Everything one pass produces.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationOutput {
    pub diagnostics: Vec<LintDiagnostic>,
    /// Sorted by hint name.
    pub documents: Vec<GeneratedDocument>,
    /// Non-empty plans, in candidate order.
    pub plans: Vec<TypePlan>,
}

impl GenerationOutput {
    pub fn document(&self, hint_name: &str) -> Option<&GeneratedDocument> {
        self.documents.iter().find(|d| d.hint_name == hint_name)
    }

    pub fn plan(&self, type_name: &str) -> Option<&TypePlan> {
        self.plans.iter().find(|p| p.type_name == type_name)
    }
}

/// Result of transforming one unit.
enum Unit {
    Generated {
        sources: Vec<GeneratedSource>,
        plan: Option<TypePlan>,
        /// `RV9001` for members that failed on their own.
        failures: Vec<LintDiagnostic>,
    },
    Failed(LintDiagnostic),
}

pub struct Generator {
    config: RivetConfig,
    linter: Linter,
}

impl Generator {
    pub fn new(config: RivetConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let linter = Linter::with_config(config.lint_config()?);
        Ok(Self { config, linter })
    }

    pub fn config(&self) -> &RivetConfig {
        &self.config
    }

    /// Phase one: fully-qualified names of the types worth transforming.
    pub fn candidates(compilation: &Compilation) -> Vec<String> {
        let mut out = Vec::new();
        for file in &compilation.files {
            for decl in &file.types {
                collect_candidates(decl, &qualify(&decl.namespace, &decl.name), &mut out);
            }
        }
        out.sort();
        out.dedup();
        out
    }

    /// Phase two over the whole compilation.
    pub fn run(&self, compilation: &Compilation) -> GenerationOutput {
        self.generate(compilation, None).unwrap_or_default()
    }

    /// Like [`run`](Self::run), abandoning the pass once `cancel` is set.
    pub fn run_cancellable(
        &self,
        compilation: &Compilation,
        cancel: &AtomicBool,
    ) -> GenResult<GenerationOutput> {
        self.generate(compilation, Some(cancel))
    }

    fn generate(
        &self,
        compilation: &Compilation,
        cancel: Option<&AtomicBool>,
    ) -> GenResult<GenerationOutput> {
        let _span = tracing::info_span!("generate", assembly = %compilation.assembly).entered();
        let codegen = &self.config.codegen;
        let symbols = SymbolTable::new(compilation, &codegen.engine_namespace);
        check_cancel(cancel)?;

        let mut output = GenerationOutput {
            diagnostics: self.linter.lint(&symbols, codegen).diagnostics,
            ..GenerationOutput::default()
        };
        check_cancel(cancel)?;

        let mut seen = FxHashSet::default();
        let ids: Vec<SymbolId> = Self::candidates(compilation)
            .iter()
            .filter_map(|name| symbols.lookup(name))
            .filter(|id| seen.insert(*id))
            .collect();
        tracing::debug!(candidates = ids.len(), parallel = codegen.parallel, "transforming types");

        let transform = |&id: &SymbolId| -> GenResult<Unit> {
            check_cancel(cancel)?;
            Ok(guarded(&symbols, id, || type_unit(&symbols, id, codegen)))
        };
        let units: Vec<Unit> = if codegen.parallel {
            ids.par_iter().map(transform).collect::<GenResult<_>>()?
        } else {
            ids.iter().map(transform).collect::<GenResult<_>>()?
        };

        let mut sources = Vec::new();
        for unit in units {
            match unit {
                Unit::Generated {
                    sources: s,
                    plan,
                    failures,
                } => {
                    sources.extend(s);
                    output.plans.extend(plan.filter(|p| !p.is_empty()));
                    output.diagnostics.extend(failures);
                }
                Unit::Failed(d) => output.diagnostics.push(d),
            }
        }

        for family in union::collect_families(&symbols) {
            check_cancel(cancel)?;
            let members: Vec<SymbolId> = family
                .headers
                .iter()
                .copied()
                .chain(family.variants.iter().map(|v| v.id))
                .collect();
            if !family.is_valid(&symbols)
                || !members.iter().all(|&m| codegen::can_extend(&symbols, m))
            {
                tracing::debug!(family = symbols.full_name(family.root), "skipping union family");
                continue;
            }
            match guarded(&symbols, family.root, || union::emit_family(&symbols, &family)) {
                Unit::Generated { sources: s, .. } => sources.extend(s),
                Unit::Failed(d) => output.diagnostics.push(d),
            }
        }

        output.documents = sources.into_iter().map(GeneratedDocument::from).collect();
        output.documents.sort_by(|a, b| a.hint_name.cmp(&b.hint_name));
        tracing::info!(
            documents = output.documents.len(),
            plans = output.plans.len(),
            diagnostics = output.diagnostics.len(),
            "generation finished"
        );
        Ok(output)
    }

    /// Apply `plans` to `module`. Items that cannot be woven are returned as
    /// `RV9001` diagnostics scoped to their member.
    pub fn weave(&self, plans: &[TypePlan], module: &mut IlModule) -> Vec<LintDiagnostic> {
        let _span = tracing::info_span!("weave", module = %module.name).entered();
        let report = weaver::weave(plans, module, &self.config.codegen);
        report
            .failures
            .iter()
            .map(|f| {
                let subject = if f.subject == f.type_name {
                    f.type_name.clone()
                } else {
                    format!("{}.{}", f.type_name, f.subject)
                };
                internal_error(&f.file, f.span, &subject, &f.error)
            })
            .collect()
    }
}

fn check_cancel(cancel: Option<&AtomicBool>) -> GenResult<()> {
    match cancel {
        Some(flag) if flag.load(Ordering::Relaxed) => Err(GenError::Cancelled),
        _ => Ok(()),
    }
}

/// What one type produces before the pipeline wraps it.
struct TypeOutput {
    sources: Vec<GeneratedSource>,
    plan: TypePlan,
    failures: Vec<LintDiagnostic>,
}

/// Generated sources and weave plan of one type. Member failures are
/// reported per member; only type-level errors fail the whole unit.
fn type_unit(
    symbols: &SymbolTable<'_>,
    id: SymbolId,
    config: &CodegenConfig,
) -> GenResult<TypeOutput> {
    let mut sources = Vec::new();
    let mut failed = Vec::new();
    if codegen::can_extend(symbols, id) {
        sources.extend(source::role_source(symbols, id, config));
        let (injection, failures) = source::injection_source(symbols, id);
        sources.extend(injection);
        failed.extend(failures);
    }
    let (plan, failures) = plan_type(symbols, id, config);
    failed.extend(failures);

    Ok(TypeOutput {
        sources,
        plan,
        failures: member_errors(symbols, id, &failed),
    })
}

/// One `RV9001` per failed member, named `Type.Member`.
fn member_errors(
    symbols: &SymbolTable<'_>,
    id: SymbolId,
    failed: &[MemberFailure],
) -> Vec<LintDiagnostic> {
    let full_name = symbols.full_name(id);
    let file = symbols.file_path(id);
    failed
        .iter()
        .map(|f| internal_error(file, f.span, &format!("{}.{}", full_name, f.member), &f.error))
        .collect()
}

/// Run one unit, turning errors and panics into an internal-error diagnostic
/// at the declaration of `id`.
fn guarded<T: IntoUnit>(
    symbols: &SymbolTable<'_>,
    id: SymbolId,
    f: impl FnOnce() -> GenResult<T>,
) -> Unit {
    let failure = match catch_failure(f) {
        Ok(value) => return value.into_unit(),
        Err(message) => message,
    };
    let name = symbols.full_name(id);
    tracing::error!(ty = name, error = %failure, "generation failed");
    let decl = symbols.decl(id);
    Unit::Failed(internal_error(symbols.file_path(id), decl.header_span, name, failure))
}

trait IntoUnit {
    fn into_unit(self) -> Unit;
}

impl IntoUnit for TypeOutput {
    fn into_unit(self) -> Unit {
        Unit::Generated {
            sources: self.sources,
            plan: Some(self.plan),
            failures: self.failures,
        }
    }
}

impl IntoUnit for Vec<GeneratedSource> {
    fn into_unit(self) -> Unit {
        Unit::Generated {
            sources: self,
            plan: None,
            failures: Vec::new(),
        }
    }
}

/// A declaration is a candidate when it or one of its members carries a
/// rivet attribute, or when it names a base or interface a role could be
/// inherited from.
fn collect_candidates(decl: &TypeDecl, full_name: &str, out: &mut Vec<String>) {
    let has_root = |attrs: &[Attribute]| {
        attrs
            .iter()
            .any(|a| CANDIDATE_ROOTS.contains(&names::root_segment(&a.canonical_name())))
    };
    let inherits = decl.base.is_some() || !decl.interfaces.is_empty();
    if has_root(&decl.attributes)
        || decl.members.iter().any(|m| has_root(m.attributes()))
        || inherits
    {
        out.push(full_name.to_string());
    }
    for nested in &decl.nested {
        collect_candidates(nested, &format!("{}.{}", full_name, nested.name), out);
    }
}

fn qualify(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", namespace, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::TypeKind;

    fn compilation() -> Compilation {
        Compilation::new("Game").with_file(
            "Assets/Game.cs",
            vec![
                TypeDecl::new("Hud", TypeKind::Class).in_namespace("Game"),
                TypeDecl::new("Audio", TypeKind::Class)
                    .in_namespace("Game")
                    .partial()
                    .with_attr(Attribute::new("Singleton"))
                    .extends("UnityEngine.MonoBehaviour")
                    .with_nested(
                        TypeDecl::new("Clip", TypeKind::Struct)
                            .with_attr(Attribute::new("UnionAttribute")),
                    ),
            ],
        )
    }

    #[test]
    fn test_candidates_are_structural() {
        assert_eq!(
            Generator::candidates(&compilation()),
            vec!["Game.Audio".to_string(), "Game.Audio.Clip".to_string()]
        );
    }

    #[test]
    fn test_fingerprint_is_sha256_hex() {
        let doc = GeneratedDocument::from(GeneratedSource {
            hint_name: "A.g.cs".into(),
            text: String::new(),
        });
        assert_eq!(
            doc.fingerprint,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_cancelled_pass() {
        let generator = Generator::new(RivetConfig::default()).unwrap();
        let cancel = AtomicBool::new(true);
        assert_eq!(
            generator.run_cancellable(&compilation(), &cancel).unwrap_err(),
            GenError::Cancelled
        );
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut config = RivetConfig::default();
        let parallel = Generator::new(config.clone()).unwrap().run(&compilation());
        config.codegen.parallel = false;
        let sequential = Generator::new(config).unwrap().run(&compilation());
        assert_eq!(parallel.documents, sequential.documents);
        assert_eq!(parallel.plans, sequential.plans);
    }

    #[test]
    fn test_panic_becomes_internal_error() {
        let c = compilation();
        let symbols = SymbolTable::new(&c, "UnityEngine");
        let id = symbols.lookup("Game.Audio").unwrap();
        let unit = guarded(&symbols, id, || -> GenResult<Vec<GeneratedSource>> { panic!("boom") });
        match unit {
            Unit::Failed(d) => {
                assert_eq!(d.code, "RV9001");
                assert!(d.message.contains("boom"));
                assert!(d.message.contains("Game.Audio"));
            }
            Unit::Generated { .. } => panic!("expected a failure"),
        }
    }

    #[test]
    fn test_member_failure_keeps_type_output() {
        let c = compilation();
        let symbols = SymbolTable::new(&c, "UnityEngine");
        let id = symbols.lookup("Game.Audio").unwrap();
        let failed = vec![MemberFailure {
            member: "Clips".into(),
            span: crate::syntax::Span::new(40, 45, 7, 9),
            error: "boom".into(),
        }];
        let unit = guarded(&symbols, id, || {
            let (plan, _) = plan_type(&symbols, id, &CodegenConfig::default());
            Ok(TypeOutput {
                sources: vec![],
                plan,
                failures: member_errors(&symbols, id, &failed),
            })
        });
        match unit {
            Unit::Generated { plan, failures, .. } => {
                assert_eq!(plan.unwrap().registrations.len(), 1);
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].code, "RV9001");
                assert_eq!(failures[0].span.line, 7);
                assert_eq!(
                    failures[0].message,
                    "Code generation failed for 'Game.Audio.Clips': boom"
                );
            }
            Unit::Failed(d) => panic!("unexpected failure: {:?}", d),
        }
    }
}
