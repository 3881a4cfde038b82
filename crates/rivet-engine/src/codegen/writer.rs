//! Indented C# source writer.

use crate::symbols::{SymbolId, SymbolTable};

/// Header placed at the top of every generated document.
pub const GENERATED_HEADER: &str = "// <auto-generated/>";

const INDENT: &str = "    ";

#[derive(Debug, Default)]
pub struct SourceWriter {
    out: String,
    indent: usize,
    scopes: Vec<&'static str>,
}

impl SourceWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A writer that already contains the generated-file preamble.
    pub fn document() -> Self {
        let mut w = Self::new();
        w.line(GENERATED_HEADER);
        w.line("#nullable enable");
        w.line("#pragma warning disable");
        w.blank();
        w
    }

    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if text.is_empty() {
            self.out.push('\n');
            return;
        }
        for _ in 0..self.indent {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    pub fn blank(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with("\n\n") && !self.out.ends_with("{\n") {
            self.out.push('\n');
        }
    }

    /// Pre-rendered lines, written at the current indentation.
    pub fn block(&mut self, text: &str) {
        for line in text.lines() {
            self.line(line);
        }
    }

    /// A line written at column 0 (preprocessor directives).
    pub fn raw(&mut self, text: &str) {
        self.out.push_str(text);
        self.out.push('\n');
    }

    /// Write `header` and open a brace block.
    pub fn open(&mut self, header: impl AsRef<str>) {
        self.open_with(header, "}");
    }

    /// Open a block closed by `closer` (`"};"` for switch expressions).
    pub fn open_with(&mut self, header: impl AsRef<str>, closer: &'static str) {
        self.line(header);
        self.line("{");
        self.indent += 1;
        self.scopes.push(closer);
    }

    pub fn close(&mut self) {
        self.indent = self.indent.saturating_sub(1);
        let closer = self.scopes.pop().unwrap_or("}");
        self.line(closer);
    }

    pub fn close_all(&mut self) {
        while !self.scopes.is_empty() {
            self.close();
        }
    }

    /// Open the namespace, every containing type, and `id` itself as partial
    /// declarations. Close them with [`close_all`](Self::close_all).
    pub fn open_type(&mut self, symbols: &SymbolTable<'_>, id: SymbolId) {
        self.open_type_with(symbols, id, &[]);
    }

    /// [`open_type`](Self::open_type), placing `attributes` on `id`'s declaration.
    pub fn open_type_with(
        &mut self,
        symbols: &SymbolTable<'_>,
        id: SymbolId,
        attributes: &[String],
    ) {
        let chain = symbols.containing_chain(id);
        let outermost = chain.first().copied().unwrap_or(id);
        let namespace = &symbols.decl(outermost).namespace;
        if !namespace.is_empty() {
            self.open(format!("namespace {}", namespace));
        }
        for t in chain.into_iter().chain(std::iter::once(id)) {
            let decl = symbols.decl(t);
            let params = if decl.type_params.is_empty() {
                String::new()
            } else {
                format!("<{}>", decl.type_params.join(", "))
            };
            if t == id {
                for attr in attributes {
                    self.line(format!("[{}]", attr));
                }
            }
            self.open(format!("partial {} {}{}", decl.kind.keyword(), decl.name, params));
        }
    }

    pub fn finish(mut self) -> String {
        self.close_all();
        self.out
    }
}

/// `global::`-qualified name of a declared type.
pub fn global_name(symbols: &SymbolTable<'_>, id: SymbolId) -> String {
    format!("global::{}", symbols.full_name(id))
}

/// Escape text for a C# regular string literal.
pub fn string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{Compilation, TypeDecl, TypeKind};

    #[test]
    fn test_open_type_nests_partials() {
        let c = Compilation::new("Game").with_file(
            "A.cs",
            vec![TypeDecl::new("Outer", TypeKind::Class)
                .in_namespace("Game")
                .with_nested(TypeDecl::new("Inner", TypeKind::Struct))],
        );
        let symbols = SymbolTable::new(&c, "UnityEngine");
        let inner = symbols.lookup("Game.Outer.Inner").unwrap();
        let mut w = SourceWriter::new();
        w.open_type(&symbols, inner);
        w.line("int X;");
        let text = w.finish();
        assert_eq!(
            text,
            "namespace Game\n{\n    partial class Outer\n    {\n        partial struct Inner\n        {\n            int X;\n        }\n    }\n}\n"
        );
    }

    #[test]
    fn test_string_literal_escapes() {
        assert_eq!(string_literal("a \"b\"\\"), "\"a \\\"b\\\"\\\\\"");
    }
}
