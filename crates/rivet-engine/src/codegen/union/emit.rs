//! C# output for a union family.
//!
//! Per header: the `TypeIds` enum (root only), name and size lookups,
//! one dispatching member per interface member, and `AsX()` accessors.
//! Per variant: its type-ID constant and a header initializer.

use rustc_hash::FxHashMap;

use crate::codegen::writer::{global_name, SourceWriter};
use crate::codegen::GeneratedSource;
use crate::error::{GenError, GenResult};
use crate::symbols::{SymbolId, SymbolTable};
use crate::syntax::{Member, MethodDecl, Param, PropertyDecl};

use super::layout::{
    first_instance_field, header_interface, leading_header, FamilyLayout, VariantLayout,
};

const UNSAFE: &str = "global::System.Runtime.CompilerServices.Unsafe";
const INVALID_OPERATION: &str = "global::System.InvalidOperationException";
const INVALID_CAST: &str = "global::System.InvalidCastException";

/// Generate every document of a well-formed family.
pub fn emit_family(
    symbols: &SymbolTable<'_>,
    family: &FamilyLayout,
) -> GenResult<Vec<GeneratedSource>> {
    let emitter = FamilyEmitter::new(symbols, family);
    let mut docs = Vec::with_capacity(family.headers.len() + family.variants.len());
    for &header in &family.headers {
        docs.push(emitter.header_doc(header)?);
    }
    for variant in &family.variants {
        docs.push(emitter.variant_doc(variant)?);
    }
    Ok(docs)
}

struct FamilyEmitter<'a, 'c> {
    symbols: &'a SymbolTable<'c>,
    family: &'a FamilyLayout,
    root_global: String,
    root_simple: &'c str,
    enum_names: FxHashMap<SymbolId, String>,
}

enum InterfaceMember<'c> {
    Method(&'c MethodDecl),
    Property(&'c PropertyDecl),
}

impl<'a, 'c> FamilyEmitter<'a, 'c> {
    fn new(symbols: &'a SymbolTable<'c>, family: &'a FamilyLayout) -> Self {
        // Simple names unless two variants share one.
        let mut counts: FxHashMap<&str, usize> = FxHashMap::default();
        for v in &family.variants {
            *counts.entry(symbols.decl(v.id).name.as_str()).or_default() += 1;
        }
        let enum_names = family
            .variants
            .iter()
            .map(|v| {
                let simple = symbols.decl(v.id).name.as_str();
                let name = if counts[simple] > 1 {
                    symbols.full_name(v.id).replace('.', "_")
                } else {
                    simple.to_string()
                };
                (v.id, name)
            })
            .collect();
        Self {
            symbols,
            family,
            root_global: global_name(symbols, family.root),
            root_simple: symbols.decl(family.root).name.as_str(),
            enum_names,
        }
    }

    fn enum_name(&self, variant: SymbolId) -> &str {
        self.enum_names.get(&variant).map(String::as_str).unwrap_or("Unset")
    }

    fn enum_ref(&self, variant: SymbolId) -> String {
        format!("{}.TypeIds.{}", self.root_global, self.enum_name(variant))
    }

    /// Field path from `header` to the root header (`Root.` or empty).
    fn root_path(&self, header: SymbolId) -> GenResult<String> {
        let mut path = String::new();
        let mut current = header;
        while current != self.family.root {
            let field = first_instance_field(self.symbols.decl(current))
                .ok_or_else(|| self.broken("nested header without a root field"))?;
            path.push_str(&field.name);
            path.push('.');
            current = leading_header(self.symbols, current)
                .ok_or_else(|| self.broken("nested header chain does not reach the root"))?;
        }
        Ok(path)
    }

    fn broken(&self, reason: &str) -> GenError {
        GenError::InvalidFamily {
            family: self.symbols.full_name(self.family.root).to_string(),
            reason: reason.to_string(),
        }
    }

    fn interface_members(&self, iface: SymbolId) -> Vec<InterfaceMember<'c>> {
        self.symbols
            .decl(iface)
            .members
            .iter()
            .filter(|m| !m.is_static())
            .filter_map(|m| match m {
                Member::Method(method) => Some(InterfaceMember::Method(method)),
                Member::Property(prop) => Some(InterfaceMember::Property(prop)),
                Member::Field(_) => None,
            })
            .collect()
    }

    /// Whether `variant` implements `name` of `iface` with a plain public member.
    fn implements_implicitly(&self, variant: SymbolId, name: &str) -> bool {
        self.symbols
            .decl(variant)
            .members
            .iter()
            .any(|m| m.name() == name && !is_explicit(m))
    }

    // ------------------------------------------------------------------
    // Headers
    // ------------------------------------------------------------------

    fn header_doc(&self, header: SymbolId) -> GenResult<GeneratedSource> {
        let symbols = self.symbols;
        let header_name = symbols.decl(header).name.as_str();
        let iface = header_interface(symbols, header)
            .ok_or_else(|| self.broken("header without an interface"))?;
        let path = self.root_path(header)?;
        let type_id = format!("{}TypeId", path);
        let variants = self.family.variants_under(symbols, header);

        let mut w = SourceWriter::document();
        w.open_type(symbols, header);

        if header == self.family.root {
            self.write_type_ids(&mut w);
            w.blank();
            w.open_with("public readonly string TypeName => TypeId switch", "};");
            for v in &self.family.variants {
                w.line(format!(
                    "TypeIds.{} => \"{}\",",
                    self.enum_name(v.id),
                    symbols.decl(v.id).name
                ));
            }
            w.line("_ => $\"Unknown (TypeID={(int)TypeId})\",");
            w.close();
            w.blank();
            w.open_with("public readonly int SizeInBytes => TypeId switch", "};");
            for v in &self.family.variants {
                w.line(format!(
                    "TypeIds.{} => {}.SizeOf<{}>(),",
                    self.enum_name(v.id),
                    UNSAFE,
                    global_name(symbols, v.id)
                ));
            }
            w.line("_ => -1,");
            w.close();
            for &nested in self.family.headers.iter().filter(|&&h| h != header) {
                w.blank();
                self.write_nested_accessors(&mut w, nested);
            }
        } else {
            w.line(format!("public readonly string TypeName => {}TypeName;", path));
            w.line(format!("public readonly int SizeInBytes => {}SizeInBytes;", path));
        }

        for member in self.interface_members(iface) {
            w.blank();
            match member {
                InterfaceMember::Method(m) => {
                    self.write_method_dispatch(&mut w, header, iface, &type_id, &variants, m)
                }
                InterfaceMember::Property(p) => {
                    self.write_property_dispatch(&mut w, header, iface, &type_id, &variants, p)
                }
            }
        }

        for v in &variants {
            w.blank();
            self.write_as_variant(&mut w, header, &path, v);
        }

        tracing::trace!(header = header_name, variants = variants.len(), "emitted union header");
        Ok(GeneratedSource {
            hint_name: format!("{}.Union.g.cs", symbols.full_name(header)),
            text: w.finish(),
        })
    }

    fn write_type_ids(&self, w: &mut SourceWriter) {
        let underlying = if self.family.max_type_id() <= u8::MAX as u16 {
            "byte"
        } else {
            "ushort"
        };
        w.open(format!("public enum TypeIds : {}", underlying));
        w.line("Unset = 0,");
        for v in &self.family.variants {
            w.line(format!("{} = {},", self.enum_name(v.id), v.type_id));
        }
        w.close();
    }

    fn write_nested_accessors(&self, w: &mut SourceWriter, nested: SymbolId) {
        let symbols = self.symbols;
        let name = symbols.decl(nested).name.as_str();
        let target = global_name(symbols, nested);
        let members = self.family.variants_under(symbols, nested);
        let test = if members.is_empty() {
            "false".to_string()
        } else {
            let ids: Vec<String> = members
                .iter()
                .map(|v| format!("TypeIds.{}", self.enum_name(v.id)))
                .collect();
            format!("TypeId is {}", ids.join(" or "))
        };
        w.line(format!("public readonly bool Is{} => {};", name, test));
        w.blank();
        w.open(format!("public ref {} As{}()", target, name));
        w.raw("#if DEBUG");
        w.line(format!("if (!Is{})", name));
        w.line(format!(
            "    throw new {}($\"Invalid union cast: expected {}, found {{TypeName}}\");",
            INVALID_CAST, name
        ));
        w.raw("#endif");
        w.line(format!("return ref {}.As<{}, {}>(ref this);", UNSAFE, self.root_simple, target));
        w.close();
    }

    fn case_target(&self, header: SymbolId, variant: SymbolId) -> String {
        format!(
            "{}.As<{}, {}>(ref this)",
            UNSAFE,
            self.symbols.decl(header).name,
            global_name(self.symbols, variant)
        )
    }

    fn unknown_case(&self, w: &mut SourceWriter, type_id: &str) {
        w.line("default:");
        w.line(format!(
            "    throw new {}($\"Unknown {}.TypeIds value: {{(int){}}}\");",
            INVALID_OPERATION, self.root_simple, type_id
        ));
    }

    fn not_implemented_case(&self, w: &mut SourceWriter, variant: SymbolId, iface: SymbolId) {
        w.line(format!("case {}:", self.enum_ref(variant)));
        w.line(format!(
            "    throw new {}(\"{} does not implement {}\");",
            INVALID_OPERATION,
            self.symbols.decl(variant).name,
            self.symbols.decl(iface).name
        ));
    }

    fn write_method_dispatch(
        &self,
        w: &mut SourceWriter,
        header: SymbolId,
        iface: SymbolId,
        type_id: &str,
        variants: &[VariantLayout],
        method: &MethodDecl,
    ) {
        let returns = !method.return_type.is_void();
        let generics = type_param_list(&method.type_params);
        let args = argument_list(&method.params);
        let needs_helper = variants.iter().any(|v| {
            self.symbols.all_interfaces(v.id).contains(&iface)
                && !self.implements_implicitly(v.id, &method.name)
        });

        w.open(format!(
            "public {} {}{}({})",
            method.return_type,
            method.name,
            generics,
            parameter_list(&method.params)
        ));
        w.open(format!("switch ({})", type_id));
        for v in variants {
            if !self.symbols.all_interfaces(v.id).contains(&iface) {
                self.not_implemented_case(w, v.id, iface);
                continue;
            }
            let target = self.case_target(header, v.id);
            let call = if self.implements_implicitly(v.id, &method.name) {
                format!("{}.{}{}({})", target, method.name, generics, args)
            } else {
                let mut helper_args = vec![format!("ref {}", target)];
                if !args.is_empty() {
                    helper_args.push(args.clone());
                }
                format!("__Dispatch_{}({})", method.name, helper_args.join(", "))
            };
            w.line(format!("case {}:", self.enum_ref(v.id)));
            if returns {
                w.line(format!("    return {};", call));
            } else {
                w.line(format!("    {};", call));
                w.line("    return;");
            }
        }
        self.unknown_case(w, type_id);
        w.close();
        w.close();

        if needs_helper {
            let mut helper_generics = vec!["TVariant".to_string()];
            helper_generics.extend(method.type_params.iter().cloned());
            let mut params = vec!["ref TVariant value".to_string()];
            if !method.params.is_empty() {
                params.push(parameter_list(&method.params));
            }
            w.blank();
            w.line(format!(
                "static {} __Dispatch_{}<{}>({}) where TVariant : struct, {}",
                method.return_type,
                method.name,
                helper_generics.join(", "),
                params.join(", "),
                global_name(self.symbols, iface)
            ));
            w.line(format!("    => value.{}{}({});", method.name, generics, args));
        }
    }

    fn write_property_dispatch(
        &self,
        w: &mut SourceWriter,
        header: SymbolId,
        iface: SymbolId,
        type_id: &str,
        variants: &[VariantLayout],
        prop: &PropertyDecl,
    ) {
        let needs_helper = variants.iter().any(|v| {
            self.symbols.all_interfaces(v.id).contains(&iface)
                && !self.implements_implicitly(v.id, &prop.name)
        });

        w.open(format!("public {} {}", prop.ty, prop.name));
        if prop.getter.is_some() {
            w.open("get");
            w.open(format!("switch ({})", type_id));
            for v in variants {
                if !self.symbols.all_interfaces(v.id).contains(&iface) {
                    self.not_implemented_case(w, v.id, iface);
                    continue;
                }
                let target = self.case_target(header, v.id);
                w.line(format!("case {}:", self.enum_ref(v.id)));
                if self.implements_implicitly(v.id, &prop.name) {
                    w.line(format!("    return {}.{};", target, prop.name));
                } else {
                    w.line(format!("    return __Get_{}(ref {});", prop.name, target));
                }
            }
            self.unknown_case(w, type_id);
            w.close();
            w.close();
        }
        if prop.setter.is_some() {
            w.open("set");
            w.open(format!("switch ({})", type_id));
            for v in variants {
                if !self.symbols.all_interfaces(v.id).contains(&iface) {
                    self.not_implemented_case(w, v.id, iface);
                    continue;
                }
                let target = self.case_target(header, v.id);
                w.line(format!("case {}:", self.enum_ref(v.id)));
                if self.implements_implicitly(v.id, &prop.name) {
                    w.line(format!("    {}.{} = value;", target, prop.name));
                } else {
                    w.line(format!("    __Set_{}(ref {}, value);", prop.name, target));
                }
                w.line("    return;");
            }
            self.unknown_case(w, type_id);
            w.close();
            w.close();
        }
        w.close();

        if needs_helper {
            let constraint =
                format!("where TVariant : struct, {}", global_name(self.symbols, iface));
            if prop.getter.is_some() {
                w.blank();
                w.line(format!(
                    "static {} __Get_{}<TVariant>(ref TVariant value) {} => value.{};",
                    prop.ty, prop.name, constraint, prop.name
                ));
            }
            if prop.setter.is_some() {
                w.blank();
                w.line(format!(
                    "static void __Set_{}<TVariant>(ref TVariant value, {} v) {} => value.{} = v;",
                    prop.name, prop.ty, constraint, prop.name
                ));
            }
        }
    }

    fn write_as_variant(
        &self,
        w: &mut SourceWriter,
        header: SymbolId,
        path: &str,
        v: &VariantLayout,
    ) {
        let name = self.symbols.decl(v.id).name.as_str();
        let target = global_name(self.symbols, v.id);
        w.open(format!("public ref {} As{}()", target, name));
        w.raw("#if DEBUG");
        w.line(format!("if ({}TypeId != {})", path, self.enum_ref(v.id)));
        w.line(format!(
            "    throw new {}($\"Invalid union cast: expected {}, found {{{}TypeName}}\");",
            INVALID_CAST, name, path
        ));
        w.raw("#endif");
        w.line(format!("return ref {};", self.case_target(header, v.id)));
        w.close();
    }

    // ------------------------------------------------------------------
    // Variants
    // ------------------------------------------------------------------

    fn variant_doc(&self, v: &VariantLayout) -> GenResult<GeneratedSource> {
        let symbols = self.symbols;
        let field = first_instance_field(symbols.decl(v.id))
            .ok_or_else(|| self.broken("variant without a header field"))?;
        let path = format!("{}.{}TypeId", field.name, self.root_path(v.header)?);

        let mut w = SourceWriter::document();
        w.open_type(symbols, v.id);
        w.line(format!(
            "public const {}.TypeIds UnionTypeId = {};",
            self.root_global,
            self.enum_ref(v.id)
        ));
        w.blank();
        w.open("public void InitializeHeader()");
        w.line(format!("{} = UnionTypeId;", path));
        w.close();

        Ok(GeneratedSource {
            hint_name: format!("{}.Union.g.cs", symbols.full_name(v.id)),
            text: w.finish(),
        })
    }
}

fn is_explicit(member: &Member) -> bool {
    match member {
        Member::Method(m) => m.explicit_interface.is_some(),
        Member::Property(p) => p.explicit_interface.is_some(),
        Member::Field(_) => false,
    }
}

fn type_param_list(params: &[String]) -> String {
    if params.is_empty() {
        String::new()
    } else {
        format!("<{}>", params.join(", "))
    }
}

fn parameter_list(params: &[Param]) -> String {
    params
        .iter()
        .map(|p| match p.modifier.decl_keyword() {
            Some(kw) => format!("{} {} {}", kw, p.ty, p.name),
            None => format!("{} {}", p.ty, p.name),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn argument_list(params: &[Param]) -> String {
    params
        .iter()
        .map(|p| match p.modifier.call_keyword() {
            Some(kw) => format!("{} {}", kw, p.name),
            None => p.name.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
