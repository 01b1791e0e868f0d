//! Per-file Java generation: one source artifact per emitted top-level type,
//! an extension holder class per file that declares extensions, and the
//! cross-file extension registry.

use std::collections::{BTreeSet, HashSet};
use std::io::Write;
use std::path::Path;

use crate::error::StitchError;
use crate::io::Io;
use crate::path::TypePath;
use crate::scalar::{self, Datatype, WireLabel};
use crate::symbols::{extension_holder_name, resolve_extension_type, Symbols};
use crate::types::{Field, Label, SchemaFile, TypeDecl, TypeKind};
use crate::writer::JavaWriter;

/// Namespace of the runtime support classes referenced by generated code.
const RUNTIME_PACKAGE: &str = "com.stitch.runtime";
const GENERATED_BY: &str = "Code generated by the Stitch schema compiler, do not edit.";

/// Generates every artifact for one schema file. Returns the fully-qualified
/// names of the extension holder classes written, in emission order.
pub(crate) fn generate_file<I: Io>(
    io: &I,
    java_out: &Path,
    symbols: &Symbols,
    types_to_emit: &HashSet<TypePath>,
    file: &SchemaFile,
    source_name: &str,
) -> Result<Vec<String>, StitchError> {
    let mut generator = FileGenerator {
        io,
        java_out,
        symbols,
        types_to_emit,
        file,
        source_name,
        type_being_generated: String::new(),
    };
    generator.run()
}

struct FileGenerator<'a, I: Io> {
    io:            &'a I,
    java_out:      &'a Path,
    symbols:       &'a Symbols,
    types_to_emit: &'a HashSet<TypePath>,
    file:          &'a SchemaFile,
    source_name:   &'a str,
    /// Dotted enclosing-type path of the type currently being emitted, with
    /// a trailing dot; empty outside any type. Drives name shortening.
    type_being_generated: String,
}

impl<'a, I: Io> FileGenerator<'a, I> {
    fn run(&mut self) -> Result<Vec<String>, StitchError> {
        let mut holders = Vec::new();

        if !self.file.extends.is_empty() {
            let class_name = extension_holder_name(&self.file.file_name);
            self.emit_extension_holder(&class_name)?;
            let fq_holder = format!("{}.{}", self.file.java_package, class_name);
            println!("wrote extension holder {}", fq_holder);
            holders.push(fq_holder);
        }

        for decl in &self.file.types {
            if self.should_emit(&decl.full_name) {
                let saved = self.type_being_generated.clone();
                self.type_being_generated.push_str(&decl.name);
                self.type_being_generated.push('.');
                self.emit_type_artifact(decl)?;
                self.type_being_generated = saved;
            }
        }
        Ok(holders)
    }

    fn should_emit(&self, name: &TypePath) -> bool {
        self.types_to_emit.is_empty() || self.types_to_emit.contains(name)
    }

    /// One `.java` artifact for a top-level type and its nested types.
    fn emit_type_artifact(&mut self, decl: &TypeDecl) -> Result<(), StitchError> {
        let out = self
            .io
            .open(self.java_out, &self.file.java_package, &decl.name)?;
        let mut writer = JavaWriter::new(out);
        writer.emit_single_line_comment(GENERATED_BY)?;
        writer.emit_single_line_comment(&format!("Source file: {}", self.source_name))?;
        writer.emit_package(&self.file.java_package)?;

        let types = collect_types(decl);
        self.emit_header(&mut writer, &types)?;
        self.emit_type_body(&mut writer, decl, true)?;
        writer.finish()?;
        Ok(())
    }

    /// The import block: runtime support classes implied by the type tree,
    /// field types from other packages, and the static datatype/label
    /// constants actually used.
    fn emit_header(
        &self,
        writer: &mut JavaWriter<Box<dyn Write>>,
        types: &[&TypeDecl],
    ) -> Result<(), StitchError> {
        let has_plain_message = types
            .iter()
            .any(|t| !t.is_enum() && !t.has_extension_ranges());
        let has_extendable = types.iter().any(|t| t.has_extension_ranges());
        let has_enum_member = types.iter().any(|t| t.is_enum());
        let has_field = types.iter().any(|t| t.has_fields());
        let mut has_bytes = false;
        let mut has_repeated = false;
        let mut has_options = false;
        for decl in types {
            if let TypeKind::Message(message) = &decl.kind {
                has_options |= !message.options.is_empty();
                for field in &message.fields {
                    has_bytes |= field.type_token == "bytes";
                    has_repeated |= field.label == Label::Repeated;
                }
            }
        }

        let mut imports: BTreeSet<String> = BTreeSet::new();
        if has_plain_message {
            imports.insert(format!("{}.Message", RUNTIME_PACKAGE));
        }
        if has_field {
            imports.insert(format!("{}.ProtoField", RUNTIME_PACKAGE));
        }
        if has_bytes {
            imports.insert(format!("{}.ByteString", RUNTIME_PACKAGE));
        }
        if has_enum_member {
            imports.insert(format!("{}.ProtoEnum", RUNTIME_PACKAGE));
        }
        if has_repeated {
            imports.insert("java.util.Collections".to_string());
            imports.insert("java.util.List".to_string());
        }
        if has_extendable {
            imports.insert(format!("{}.ExtendableMessage", RUNTIME_PACKAGE));
            imports.insert(format!("{}.Extension", RUNTIME_PACKAGE));
        }
        if has_options {
            imports.insert(format!("{}.MessageOptions", RUNTIME_PACKAGE));
        }

        // Field types declared under other Java packages get imported by
        // their fully-qualified name.
        for decl in types {
            if let TypeKind::Message(message) = &decl.kind {
                for field in &message.fields {
                    if scalar::is_scalar(&field.type_token) {
                        continue;
                    }
                    let resolved =
                        self.symbols
                            .resolve(&field.type_token, self.file, Some(&decl.full_name))?;
                    let java_name = self.java_name_of(&resolved)?;
                    if self.symbols.java_package_of(java_name) != self.file.java_package {
                        imports.insert(java_name.to_string());
                    }
                }
            }
        }

        // Distinct wire datatypes and cardinality labels used, sorted by
        // name; OPTIONAL is the default and never spelled out.
        let mut datatypes: BTreeSet<&'static str> = BTreeSet::new();
        let mut labels: BTreeSet<&'static str> = BTreeSet::new();
        for decl in types {
            if let TypeKind::Message(message) = &decl.kind {
                for field in &message.fields {
                    if let Some(datatype) = self.field_datatype(decl, field)? {
                        datatypes.insert(datatype.constant_name());
                    }
                    labels.insert(scalar::wire_label(field, false).constant_name());
                }
            }
        }
        labels.remove(WireLabel::Optional.constant_name());

        writer.emit_imports(&imports)?;
        let mut static_imports: Vec<String> = Vec::new();
        for datatype in &datatypes {
            static_imports.push(format!("{}.Message.Datatype.{}", RUNTIME_PACKAGE, datatype));
        }
        for label in &labels {
            static_imports.push(format!("{}.Message.Label.{}", RUNTIME_PACKAGE, label));
        }
        writer.emit_static_imports(&static_imports)?;
        Ok(())
    }

    fn emit_type_body(
        &mut self,
        writer: &mut JavaWriter<Box<dyn Write>>,
        decl: &TypeDecl,
        top_level: bool,
    ) -> Result<(), StitchError> {
        match &decl.kind {
            TypeKind::Message(message) => {
                let modifiers = if top_level {
                    "public final"
                } else {
                    "public static final"
                };
                let supertype = if decl.has_extension_ranges() {
                    format!("ExtendableMessage<{}>", decl.name)
                } else {
                    "Message".to_string()
                };
                writer.begin_type(modifiers, "class", &decl.name, Some(&supertype))?;

                if !message.options.is_empty() {
                    writer.emit_empty_line()?;
                    let initializer = options_initializer(&message.options);
                    writer.emit_field(
                        "MessageOptions",
                        "MESSAGE_OPTIONS",
                        "public static final",
                        Some(&initializer),
                    )?;
                }

                for field in &message.fields {
                    if let Some((java_type, value)) = self.default_constant(decl, field)? {
                        writer.emit_empty_line()?;
                        writer.emit_field(
                            &java_type,
                            &format!("DEFAULT_{}", field.name.to_uppercase()),
                            "public static final",
                            Some(&value),
                        )?;
                    }
                }

                for field in &message.fields {
                    writer.emit_empty_line()?;
                    writer.emit_annotation(&self.field_annotation(decl, field)?)?;
                    let java_type = self.field_java_type(decl, field)?;
                    writer.emit_field(&java_type, &field.name, "public", None)?;
                }

                for nested in &decl.nested {
                    if self.should_emit(&nested.full_name) {
                        writer.emit_empty_line()?;
                        let saved = self.type_being_generated.clone();
                        self.type_being_generated.push_str(&nested.name);
                        self.type_being_generated.push('.');
                        self.emit_type_body(writer, nested, false)?;
                        self.type_being_generated = saved;
                    }
                }
                writer.end_type()?;
            }
            TypeKind::Enum(en) => {
                let modifiers = if top_level { "public" } else { "public static" };
                writer.begin_type(modifiers, "enum", &decl.name, None)?;
                for (index, value) in en.values.iter().enumerate() {
                    writer.emit_annotation(&format!("ProtoEnum({})", value.tag))?;
                    writer.emit_enum_constant(&value.name, index + 1 == en.values.len())?;
                }
                writer.end_type()?;
            }
        }
        Ok(())
    }

    /// The `Ext_<stem>` holder: one typed `Extension` constant per extension
    /// field declared in this file.
    fn emit_extension_holder(&mut self, class_name: &str) -> Result<(), StitchError> {
        let out = self
            .io
            .open(self.java_out, &self.file.java_package, class_name)?;
        let mut writer = JavaWriter::new(out);
        writer.emit_single_line_comment(GENERATED_BY)?;
        writer.emit_single_line_comment(&format!("Source file: {}", self.source_name))?;
        writer.emit_package(&self.file.java_package)?;

        let mut imports: BTreeSet<String> = BTreeSet::new();
        imports.insert(format!("{}.Extension", RUNTIME_PACKAGE));
        for extend in &self.file.extends {
            let target = resolve_extension_type(self.symbols, self.file, &extend.target)?;
            let target_java = self.java_name_of(&target)?;
            if self.symbols.java_package_of(target_java) != self.file.java_package {
                imports.insert(target_java.to_string());
            }
            for field in &extend.fields {
                if field.type_token == "bytes" {
                    imports.insert(format!("{}.ByteString", RUNTIME_PACKAGE));
                }
                if field.label == Label::Repeated {
                    imports.insert("java.util.List".to_string());
                }
                if !scalar::is_scalar(&field.type_token) {
                    let resolved =
                        resolve_extension_type(self.symbols, self.file, &field.type_token)?;
                    let java_name = self.java_name_of(&resolved)?;
                    if self.symbols.java_package_of(java_name) != self.file.java_package {
                        imports.insert(java_name.to_string());
                    }
                }
            }
        }
        writer.emit_imports(&imports)?;

        writer.begin_type("public final", "class", class_name, None)?;
        writer.emit_empty_line()?;
        writer.emit_private_constructor(class_name)?;

        for extend in &self.file.extends {
            let target = resolve_extension_type(self.symbols, self.file, &extend.target)?;
            let target_java = self.java_name_of(&target)?.to_string();
            let target_short =
                self.symbols
                    .shorten(&target_java, &self.file.java_package, "");

            for field in &extend.fields {
                writer.emit_empty_line()?;
                let token = &field.type_token;
                let fq_field_name = format!("{}.{}", self.file.package_name, field.name);

                let (generic_type, builder_call, is_enum) = if scalar::is_scalar(token) {
                    let java_type = scalar::java_scalar_type(token)
                        .map(|t| t.to_string())
                        .ok_or_else(|| StitchError::UnsupportedScalar(token.clone()))?;
                    let call = format!("{}Extending({}.class)", token, target_short);
                    (java_type, call, false)
                } else {
                    let resolved = resolve_extension_type(self.symbols, self.file, token)?;
                    let java_name = self.java_name_of(&resolved)?.to_string();
                    let short = self
                        .symbols
                        .shorten(&java_name, &self.file.java_package, "");
                    if self.symbols.is_enum(&resolved) {
                        let call = format!("enumExtending({}.class, {}.class)", short, target_short);
                        (short, call, true)
                    } else {
                        let call =
                            format!("messageExtending({}.class, {}.class)", short, target_short);
                        (short, call, false)
                    }
                };

                let label = scalar::wire_label(field, is_enum);
                let initializer = format!(
                    "Extension\n.{}\n.setName(\"{}\")\n.setTag({})\n.build{}()",
                    builder_call,
                    fq_field_name,
                    field.tag,
                    label.builder_suffix()
                );

                let generic_type = if field.label == Label::Repeated {
                    format!("List<{}>", generic_type)
                } else {
                    generic_type
                };
                writer.emit_field(
                    &format!("Extension<{}, {}>", target_short, generic_type),
                    &field.name,
                    "public static final",
                    Some(&initializer),
                )?;
            }
        }
        writer.end_type()?;
        writer.finish()?;
        Ok(())
    }

    fn java_name_of(&self, name: &TypePath) -> Result<&str, StitchError> {
        self.symbols
            .java_name(name)
            .ok_or_else(|| StitchError::UnresolvedSymbol {
                token:   name.to_string(),
                context: self.file.file_name.clone(),
            })
    }

    /// The wire datatype of a field: the scalar tag, `ENUM` for enum
    /// references, `None` for message references.
    fn field_datatype(
        &self,
        decl: &TypeDecl,
        field: &Field,
    ) -> Result<Option<Datatype>, StitchError> {
        if let Some(datatype) = Datatype::of(&field.type_token) {
            return Ok(Some(datatype));
        }
        let resolved = self
            .symbols
            .resolve(&field.type_token, self.file, Some(&decl.full_name))?;
        if self.symbols.is_enum(&resolved) {
            Ok(Some(Datatype::Enum))
        } else {
            Ok(None)
        }
    }

    /// The Java reference for a field type inside the current generation
    /// context, `List<...>`-wrapped when repeated.
    fn field_java_type(&self, decl: &TypeDecl, field: &Field) -> Result<String, StitchError> {
        let base = match scalar::java_scalar_type(&field.type_token) {
            Some(java_type) => java_type.to_string(),
            None => {
                let resolved =
                    self.symbols
                        .resolve(&field.type_token, self.file, Some(&decl.full_name))?;
                let java_name = self.java_name_of(&resolved)?;
                self.symbols
                    .shorten(java_name, &self.file.java_package, &self.type_being_generated)
            }
        };
        if field.label == Label::Repeated {
            Ok(format!("List<{}>", base))
        } else {
            Ok(base)
        }
    }

    fn field_annotation(&self, decl: &TypeDecl, field: &Field) -> Result<String, StitchError> {
        let mut parts = vec![format!("tag = {}", field.tag)];
        if let Some(datatype) = self.field_datatype(decl, field)? {
            parts.push(format!("type = {}", datatype.constant_name()));
        }
        let label = scalar::wire_label(field, false);
        if label != WireLabel::Optional {
            parts.push(format!("label = {}", label.constant_name()));
        }
        Ok(format!("ProtoField({})", parts.join(", ")))
    }

    /// The `DEFAULT_<NAME>` constant for a field, when one exists: scalars
    /// always get one, enums default to their first declared value, message
    /// references have no default, repeated fields default empty.
    fn default_constant(
        &self,
        decl: &TypeDecl,
        field: &Field,
    ) -> Result<Option<(String, String)>, StitchError> {
        if field.label == Label::Repeated {
            let java_type = self.field_java_type(decl, field)?;
            return Ok(Some((java_type, "Collections.emptyList()".to_string())));
        }
        if let Some(java_type) = scalar::java_scalar_type(&field.type_token) {
            let value =
                scalar::initializer_for_type(field.default_value.as_deref(), java_type)?;
            return Ok(Some((java_type.to_string(), value)));
        }
        let resolved = self
            .symbols
            .resolve(&field.type_token, self.file, Some(&decl.full_name))?;
        if self.symbols.is_enum(&resolved) {
            let java_type = self.field_java_type(decl, field)?;
            let value_name = match &field.default_value {
                Some(value) => value.clone(),
                None => self
                    .symbols
                    .enum_default(&resolved)
                    .unwrap_or_default()
                    .to_string(),
            };
            return Ok(Some((java_type.clone(), format!("{}.{}", java_type, value_name))));
        }
        Ok(None)
    }
}

/// A top-level type and all its nested types, collected with a worklist.
fn collect_types(top: &TypeDecl) -> Vec<&TypeDecl> {
    let mut types = Vec::new();
    let mut worklist = vec![top];
    while let Some(decl) = worklist.pop() {
        types.push(decl);
        worklist.extend(decl.nested.iter());
    }
    types
}

fn options_initializer(options: &[crate::types::OptionDecl]) -> String {
    let mut parts = Vec::new();
    for option in options {
        parts.push(format!(
            "\n\"{}\", \"{}\"",
            option.name, option.value
        ));
    }
    format!("MessageOptions.of({})", parts.join(","))
}

/// The registry artifact: a constant list of every extension holder class
/// emitted during the compile, in emission order.
pub(crate) fn emit_registry<I: Io>(
    io: &I,
    java_out: &Path,
    registry_class: &str,
    holders: &[String],
) -> Result<(), StitchError> {
    let (java_package, class_name) = match registry_class.rfind('.') {
        Some(index) => (&registry_class[..index], &registry_class[index + 1..]),
        None => ("", registry_class),
    };

    let out = io.open(java_out, java_package, class_name)?;
    let mut writer = JavaWriter::new(out);
    writer.emit_single_line_comment(GENERATED_BY)?;
    writer.emit_package(java_package)?;

    let imports = vec!["java.util.List".to_string()];
    writer.emit_imports(&imports)?;
    let static_imports = vec![
        "java.util.Arrays.asList".to_string(),
        "java.util.Collections.unmodifiableList".to_string(),
    ];
    writer.emit_static_imports(&static_imports)?;

    writer.begin_type("public final", "class", class_name, None)?;
    writer.emit_empty_line()?;

    let mut initializer = String::from("unmodifiableList(asList(");
    for (index, holder) in holders.iter().enumerate() {
        let separator = if index + 1 < holders.len() { "," } else { "))" };
        initializer.push_str(&format!("\n{}.class{}", holder, separator));
    }
    if holders.is_empty() {
        initializer.push_str("))");
    }
    writer.emit_field(
        "List<Class<?>>",
        "EXTENSIONS",
        "public static final",
        Some(&initializer),
    )?;
    writer.emit_empty_line()?;
    writer.emit_private_constructor(class_name)?;
    writer.end_type()?;
    writer.finish()?;
    Ok(())
}
