//! Diagnostic output: codespan rendering, JSON, and fix application.

use std::collections::HashMap;

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use termcolor::{Buffer, ColorChoice, StandardStream, WriteColor};

use super::rule::{LintDiagnostic, Severity};

/// Source texts available for rendering, keyed by path.
pub struct SourceMap {
    files: SimpleFiles<String, String>,
    ids: HashMap<String, usize>,
}

impl Default for SourceMap {
    fn default() -> Self {
        Self {
            files: SimpleFiles::new(),
            ids: HashMap::new(),
        }
    }
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: impl Into<String>, source: impl Into<String>) {
        let path = path.into();
        let id = self.files.add(path.clone(), source.into());
        self.ids.insert(path, id);
    }

    fn label_for(&self, d: &LintDiagnostic) -> Option<Label<usize>> {
        let id = *self.ids.get(&d.file)?;
        let len = self.files.get(id).ok()?.source().len();
        (d.span.end <= len && d.span.start <= d.span.end)
            .then(|| Label::primary(id, d.span.start..d.span.end).with_message(d.rule))
    }
}

fn to_codespan(d: &LintDiagnostic, sources: &SourceMap) -> Option<Diagnostic<usize>> {
    let mut diag = match d.severity {
        Severity::Error => Diagnostic::error(),
        Severity::Warn => Diagnostic::warning(),
        Severity::Info => Diagnostic::note(),
        Severity::Off => return None,
    }
    .with_message(&d.message)
    .with_code(d.code);

    let mut notes = Vec::new();
    match sources.label_for(d) {
        Some(label) => diag = diag.with_labels(vec![label]),
        None => notes.push(format!("at {}:{}:{}", d.file, d.span.line, d.span.column)),
    }
    if let Some(fix) = &d.fix {
        notes.push(format!("help: replace with '{}'", fix.replacement));
    }
    notes.extend(d.notes.iter().cloned());
    Some(diag.with_notes(notes))
}

fn emit_all(
    writer: &mut dyn WriteColor,
    diagnostics: &[LintDiagnostic],
    sources: &SourceMap,
) -> Result<(), codespan_reporting::files::Error> {
    let config = term::Config::default();
    for d in diagnostics {
        if let Some(diag) = to_codespan(d, sources) {
            term::emit(writer, &config, &sources.files, &diag)?;
        }
    }
    Ok(())
}

/// Render diagnostics as plain text.
pub fn render(
    diagnostics: &[LintDiagnostic],
    sources: &SourceMap,
) -> Result<String, codespan_reporting::files::Error> {
    let mut buffer = Buffer::no_color();
    emit_all(&mut buffer, diagnostics, sources)?;
    Ok(String::from_utf8_lossy(buffer.as_slice()).into_owned())
}

/// Render diagnostics to stderr with colors when the terminal supports them.
pub fn emit(
    diagnostics: &[LintDiagnostic],
    sources: &SourceMap,
) -> Result<(), codespan_reporting::files::Error> {
    let mut writer = StandardStream::stderr(ColorChoice::Auto);
    emit_all(&mut writer, diagnostics, sources)
}

/// Diagnostics as a JSON array, for IDE integration.
pub fn to_json(diagnostics: &[LintDiagnostic]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(diagnostics)
}

/// Apply every fix for `path` to `source`. Overlapping fixes after the first
/// are skipped. Returns the new text and the number of fixes applied.
pub fn apply_fixes(path: &str, source: &str, diagnostics: &[LintDiagnostic]) -> (String, usize) {
    let mut fixes: Vec<_> = diagnostics
        .iter()
        .filter(|d| d.file == path)
        .filter_map(|d| d.fix.as_ref())
        .collect();
    // Apply from the end so earlier offsets stay valid.
    fixes.sort_by(|a, b| b.span.start.cmp(&a.span.start));

    let mut text = source.to_string();
    let mut last_start = usize::MAX;
    let mut applied = 0;
    for fix in fixes {
        let (start, end) = (fix.span.start, fix.span.end);
        if end > last_start || end > text.len() || start > end {
            continue;
        }
        if !text.is_char_boundary(start) || !text.is_char_boundary(end) {
            continue;
        }
        text.replace_range(start..end, &fix.replacement);
        last_start = start;
        applied += 1;
    }
    (text, applied)
}
