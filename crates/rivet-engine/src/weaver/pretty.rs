//! Pretty-printing for IL
//!
//! Human-readable output for debugging and for asserting on woven bodies.

use std::fmt::Write;

use super::il::{IlMethod, IlModule, IlType, Instr, MethodFlags};

/// Trait for pretty-printing IL constructs
pub trait PrettyPrint {
    fn pretty_print(&self) -> String;
}

impl PrettyPrint for IlModule {
    fn pretty_print(&self) -> String {
        let mut output = String::new();
        let _ = writeln!(output, ".module {}", self.name);
        for ty in &self.types {
            let _ = writeln!(output);
            output.push_str(&ty.pretty_print());
        }
        output
    }
}

impl PrettyPrint for IlType {
    fn pretty_print(&self) -> String {
        let mut output = String::new();
        for attr in &self.attributes {
            let args: Vec<String> = attr.args.iter().map(|a| a.to_string()).collect();
            let _ = writeln!(output, ".custom {}({})", attr.type_name, args.join(", "));
        }
        let _ = write!(output, ".class {}", self.full_name);
        if let Some(base) = &self.base {
            let _ = write!(output, " extends {}", base);
        }
        if !self.interfaces.is_empty() {
            let _ = write!(output, " implements {}", self.interfaces.join(", "));
        }
        let _ = writeln!(output, " {{");
        for field in &self.fields {
            let stat = if field.is_static { "static " } else { "" };
            let _ = writeln!(output, "  .field {}{} {}", stat, field.ty, field.name);
        }
        for property in &self.properties {
            let _ = writeln!(output, "  .property {} {}", property.ty, property.name);
        }
        for method in &self.methods {
            output.push_str(&method.pretty_print());
        }
        let _ = writeln!(output, "}}");
        output
    }
}

impl PrettyPrint for IlMethod {
    fn pretty_print(&self) -> String {
        let mut output = String::new();
        let params: Vec<String> =
            self.params.iter().map(|p| format!("{} {}", p.ty, p.name)).collect();
        let _ = writeln!(
            output,
            "  .method {}{} {}({}) {{",
            flag_prefix(self.flags),
            self.return_type,
            self.name,
            params.join(", ")
        );
        for o in &self.overrides {
            let _ = writeln!(output, "    .override {}", o);
        }
        if !self.locals.is_empty() {
            let _ = writeln!(output, "    .locals ({})", self.locals.join(", "));
        }
        for instr in &self.body {
            match instr {
                Instr::Label(_) => {
                    let _ = writeln!(output, "  {}", instr);
                }
                _ => {
                    let _ = writeln!(output, "    {}", instr);
                }
            }
        }
        let _ = writeln!(output, "  }}");
        output
    }
}

fn flag_prefix(flags: MethodFlags) -> String {
    let mut out = String::new();
    for (flag, word) in [
        (MethodFlags::PRIVATE, "private"),
        (MethodFlags::STATIC, "static"),
        (MethodFlags::FINAL, "final"),
        (MethodFlags::VIRTUAL, "virtual"),
        (MethodFlags::NEW_SLOT, "newslot"),
        (MethodFlags::ABSTRACT, "abstract"),
        (MethodFlags::SPECIAL_NAME, "specialname"),
    ] {
        if flags.contains(flag) {
            out.push_str(word);
            out.push(' ');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weaver::il::MethodRef;

    #[test]
    fn test_method_listing() {
        let method = IlMethod::new("OnEnable")
            .with_flags(MethodFlags::VIRTUAL)
            .with_body(vec![
                Instr::LoadThis,
                Instr::Call(MethodRef::void("Game.Enemy", "OnEnable")),
                Instr::Return,
            ]);
        assert_eq!(
            method.pretty_print(),
            "  .method virtual void OnEnable() {\n    ldarg.0\n    call void Game.Enemy::OnEnable()\n    ret\n  }\n"
        );
    }

    #[test]
    fn test_type_header() {
        let ty = IlType::new("Game.Hub")
            .extends("UnityEngine.MonoBehaviour")
            .with_attribute("UnityEngine.DefaultExecutionOrder", vec![-1]);
        let text = ty.pretty_print();
        assert!(text.starts_with(
            ".custom UnityEngine.DefaultExecutionOrder(-1)\n\
             .class Game.Hub extends UnityEngine.MonoBehaviour {"
        ));
    }
}
