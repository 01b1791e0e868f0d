#![cfg(test)]

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use stitch_compiler::error::StitchError;
use stitch_compiler::parser::parse_schema;
use stitch_compiler::path::TypePath;
use stitch_compiler::symbols::ResolvedType;
use stitch_compiler::types::{Label, SchemaFile};
use stitch_compiler::{Compiler, CompilerOptions, Io};

/// In-memory schema input and generated-source output. Artifacts are keyed
/// by fully-qualified class name.
struct FakeIo {
    files:   HashMap<String, String>,
    outputs: Rc<RefCell<BTreeMap<String, Vec<u8>>>>,
}

impl FakeIo {
    fn new(files: &[(&str, &str)]) -> FakeIo {
        FakeIo {
            files: files
                .iter()
                .map(|(name, text)| (name.to_string(), text.to_string()))
                .collect(),
            outputs: Rc::new(RefCell::new(BTreeMap::new())),
        }
    }
}

struct FakeArtifact {
    key:     String,
    outputs: Rc<RefCell<BTreeMap<String, Vec<u8>>>>,
}

impl Write for FakeArtifact {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.outputs
            .borrow_mut()
            .entry(self.key.clone())
            .or_default()
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Io for FakeIo {
    fn parse(&self, path: &Path) -> Result<SchemaFile, StitchError> {
        let name = path.to_string_lossy().into_owned();
        let text = self.files.get(&name).ok_or_else(|| {
            StitchError::Io(io::Error::new(io::ErrorKind::NotFound, name.clone()))
        })?;
        parse_schema(text, &name)
    }

    fn open(
        &self,
        _java_out: &Path,
        java_package: &str,
        class_name: &str,
    ) -> Result<Box<dyn Write>, StitchError> {
        let key = if java_package.is_empty() {
            class_name.to_string()
        } else {
            format!("{}.{}", java_package, class_name)
        };
        Ok(Box::new(FakeArtifact {
            key,
            outputs: Rc::clone(&self.outputs),
        }))
    }
}

/// Runs a full compile over in-memory schemas. Returns the compiler (for
/// symbol-table assertions) and the generated artifacts as text.
fn compile(
    files: &[(&str, &str)],
    sources: &[&str],
    roots: &[&str],
    registry_class: Option<&str>,
) -> Result<(Compiler<FakeIo>, BTreeMap<String, String>), StitchError> {
    let io = FakeIo::new(files);
    let outputs = Rc::clone(&io.outputs);
    let options = CompilerOptions {
        proto_path:     PathBuf::new(),
        java_out:       PathBuf::from("out"),
        source_files:   sources.iter().map(|s| s.to_string()).collect(),
        roots:          roots.iter().map(|s| s.to_string()).collect(),
        registry_class: registry_class.map(str::to_string),
    };
    let mut compiler = Compiler::with_io(options, io);
    compiler.compile()?;

    let rendered = outputs
        .borrow()
        .iter()
        .map(|(key, bytes)| (key.clone(), String::from_utf8(bytes.clone()).unwrap()))
        .collect();
    Ok((compiler, rendered))
}

fn path(name: &str) -> TypePath {
    TypePath::from_dotted(name)
}

#[test]
fn test_symbol_tables_cover_nested_types() {
    let schema = r#"
    package p;

    message Foo {
      enum Bar {
        X = 1;
        Y = 2;
      }
      optional Bar bar = 1;
    }
    "#;
    let (compiler, outputs) =
        compile(&[("foo.proto", schema)], &["foo.proto"], &[], None).unwrap();

    let symbols = compiler.symbols();
    assert_eq!(symbols.java_name(&path("p.Foo")), Some("p.Foo"));
    assert_eq!(symbols.java_name(&path("p.Foo.Bar")), Some("p.Foo.Bar"));
    assert!(symbols.is_enum(&path("p.Foo.Bar")));
    assert_eq!(symbols.enum_default(&path("p.Foo.Bar")), Some("X"));

    let info = symbols.field(&path("p.Foo"), "bar").unwrap();
    assert_eq!(info.field_type, ResolvedType::Named(path("p.Foo.Bar")));
    assert_eq!(info.label, Label::Optional);

    // One artifact per top-level type; the nested enum lives inside it.
    assert_eq!(outputs.len(), 1);
    let foo = &outputs["p.Foo"];
    assert!(foo.contains("public final class Foo extends Message {"));
    assert!(foo.contains("public static enum Bar {"));
    assert!(foo.contains("@ProtoEnum(1)"));
    assert!(foo.contains("public static final Bar DEFAULT_BAR = Bar.X;"));
}

#[test]
fn test_loading_twice_is_idempotent() {
    let schema = r#"
    package p;
    message Foo {
      optional int32 id = 1;
    }
    "#;
    let (compiler, outputs) = compile(
        &[("foo.proto", schema)],
        &["foo.proto", "foo.proto"],
        &[],
        None,
    )
    .unwrap();
    assert_eq!(compiler.symbols().symbol_count(), 1);
    // The duplicate source argument is collapsed: one artifact, written once.
    let foo = &outputs["p.Foo"];
    assert!(foo.contains("public Integer id;"));
    assert_eq!(foo.matches("public final class Foo").count(), 1);
}

#[test]
fn test_imports_resolve_cross_file_references() {
    let one = r#"
    package p;
    import "two.proto";
    message Foo {
      optional Other other = 1;
    }
    "#;
    let two = r#"
    package p;
    message Other {
      optional string name = 1;
    }
    "#;
    let (compiler, outputs) = compile(
        &[("one.proto", one), ("two.proto", two)],
        &["one.proto"],
        &[],
        None,
    )
    .unwrap();
    assert!(compiler.symbols().is_known(&path("p.Other")));
    // The imported file contributes symbols but is not itself a source, so
    // only one.proto's types are generated.
    assert_eq!(
        outputs.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["p.Foo"]
    );
}

#[test]
fn test_root_closure_pulls_enclosing_types() {
    let one = r#"
    package p;
    import "two.proto";
    message Foo {
      optional Other.Nested nested = 1;
    }
    "#;
    let two = r#"
    package p;
    message Other {
      message Nested {
        optional int32 id = 1;
      }
    }
    message Unused {
      optional string junk = 1;
    }
    "#;
    let (compiler, outputs) = compile(
        &[("one.proto", one), ("two.proto", two)],
        &["one.proto", "two.proto"],
        &["p.Foo"],
        None,
    )
    .unwrap();

    let emitted = compiler.types_to_emit();
    assert!(emitted.contains(&path("p.Foo")));
    assert!(emitted.contains(&path("p.Other.Nested")));
    assert!(emitted.contains(&path("p.Other")));
    assert!(!emitted.contains(&path("p.Unused")));

    assert!(outputs.contains_key("p.Foo"));
    assert!(outputs.contains_key("p.Other"));
    assert!(!outputs.contains_key("p.Unused"));
}

#[test]
fn test_extend_declarations_survive_root_pruning() {
    let base = r#"
    package p;
    message Base {
      optional int32 id = 1;
      extensions 100 to 200;
    }
    message Root {
      optional int32 x = 1;
    }
    "#;
    let ext = r#"
    package p;
    import "base.proto";

    enum Color {
      RED = 1;
    }

    extend Base {
      optional Color tint = 100;
    }
    "#;
    // The roots never reach Base or Color through fields; the extend block
    // alone must pull both into the emission set.
    let (compiler, outputs) = compile(
        &[("base.proto", base), ("ext.proto", ext)],
        &["base.proto", "ext.proto"],
        &["p.Root"],
        None,
    )
    .unwrap();

    let emitted = compiler.types_to_emit();
    assert!(emitted.contains(&path("p.Root")));
    assert!(emitted.contains(&path("p.Base")));
    assert!(emitted.contains(&path("p.Color")));

    assert!(outputs.contains_key("p.Root"));
    assert!(outputs.contains_key("p.Base"));
    assert!(outputs.contains_key("p.Color"));
    assert!(outputs.contains_key("p.Ext_ext"));
}

#[test]
fn test_extension_index_and_holder_class() {
    let base = r#"
    package p;
    message Base {
      optional int32 id = 1;
      extensions 100 to 200;
    }
    "#;
    let ext = r#"
    package p;
    import "base.proto";

    enum Color {
      RED = 1;
      GREEN = 2;
    }

    extend Base {
      optional Color tint = 100;
      repeated string notes = 101;
    }
    "#;
    let (compiler, outputs) = compile(
        &[("base.proto", base), ("ext.proto", ext)],
        &["base.proto", "ext.proto"],
        &[],
        None,
    )
    .unwrap();

    let info = compiler.symbols().extension("p.tint").unwrap();
    assert_eq!(info.fq_type, "p.Color");
    assert_eq!(info.java_type, "p.Color");
    assert_eq!(info.holder, "Ext_ext");
    assert_eq!(info.fq_holder, "p.Ext_ext");
    assert_eq!(info.label, Label::Optional);

    let holder = &outputs["p.Ext_ext"];
    assert!(holder.contains("public final class Ext_ext {"));
    assert!(holder.contains("private Ext_ext() {"));
    assert!(holder.contains(".enumExtending(Color.class, Base.class)"));
    assert!(holder.contains(".setName(\"p.tint\")"));
    assert!(holder.contains(".setTag(100)"));
    assert!(holder.contains(".buildOptional();"));
    assert!(holder.contains("Extension<Base, List<String>> notes"));
    assert!(holder.contains(".buildRepeated();"));
    assert!(holder.contains("import java.util.List;"));

    let base_class = &outputs["p.Base"];
    assert!(base_class.contains("public final class Base extends ExtendableMessage<Base> {"));
}

#[test]
fn test_registry_lists_every_holder() {
    let base = r#"
    package p;
    message Base {
      optional int32 id = 1;
      extensions 100 to max;
    }
    "#;
    let ext = r#"
    package p;
    import "base.proto";
    extend Base {
      optional string note = 100;
    }
    "#;
    let (_, outputs) = compile(
        &[("base.proto", base), ("ext.proto", ext)],
        &["base.proto", "ext.proto"],
        &[],
        Some("com.example.Registry"),
    )
    .unwrap();

    let registry = &outputs["com.example.Registry"];
    assert!(registry.contains("package com.example;"));
    assert!(registry.contains("import java.util.List;"));
    assert!(registry.contains("import static java.util.Arrays.asList;"));
    assert!(registry.contains("import static java.util.Collections.unmodifiableList;"));
    assert!(registry.contains("public final class Registry {"));
    assert!(registry
        .contains("public static final List<Class<?>> EXTENSIONS = unmodifiableList(asList("));
    assert!(registry.contains("p.Ext_ext.class));"));
    assert!(registry.contains("private Registry() {"));
}

#[test]
fn test_message_body_annotations_and_defaults() {
    let schema = r#"
    package p;
    option java_package = "com.example.generated";

    message Person {
      option deprecated = "true";

      optional string name = 1 [default = "nobody"];
      required int32 id = 2;
      repeated int64 scores = 3 [packed = true];
      optional Person friend = 4;
    }
    "#;
    let (_, outputs) =
        compile(&[("person.proto", schema)], &["person.proto"], &[], None).unwrap();

    let person = &outputs["com.example.generated.Person"];
    assert!(person.contains("package com.example.generated;"));
    assert!(person.contains("import com.stitch.runtime.Message;"));
    assert!(person.contains("import com.stitch.runtime.ProtoField;"));
    assert!(person.contains("import com.stitch.runtime.MessageOptions;"));
    assert!(person.contains("import java.util.Collections;"));
    assert!(person.contains("import java.util.List;"));
    assert!(person.contains("import static com.stitch.runtime.Message.Datatype.INT32;"));
    assert!(person.contains("import static com.stitch.runtime.Message.Datatype.INT64;"));
    assert!(person.contains("import static com.stitch.runtime.Message.Datatype.STRING;"));
    assert!(person.contains("import static com.stitch.runtime.Message.Label.PACKED;"));
    assert!(person.contains("import static com.stitch.runtime.Message.Label.REQUIRED;"));
    // OPTIONAL is the default label and never imported.
    assert!(!person.contains("Message.Label.OPTIONAL"));

    assert!(person.contains("public static final String DEFAULT_NAME = \"nobody\";"));
    assert!(person.contains("public static final Integer DEFAULT_ID = 0;"));
    assert!(person.contains("public static final List<Long> DEFAULT_SCORES = Collections.emptyList();"));
    // Message-typed fields have no default constant.
    assert!(!person.contains("DEFAULT_FRIEND"));

    assert!(person.contains("@ProtoField(tag = 1, type = STRING)"));
    assert!(person.contains("@ProtoField(tag = 2, type = INT32, label = REQUIRED)"));
    assert!(person.contains("@ProtoField(tag = 3, type = INT64, label = PACKED)"));
    assert!(person.contains("@ProtoField(tag = 4)"));
    assert!(person.contains("public Person friend;"));
    assert!(person.contains("MessageOptions.of("));
}

#[test]
fn test_cross_package_field_types_are_imported() {
    let one = r#"
    package p;
    option java_package = "com.example.p";
    import "two.proto";
    message Foo {
      optional q.Other other = 1;
    }
    "#;
    let two = r#"
    package q;
    option java_package = "com.example.q";
    message Other {
      optional int32 id = 1;
    }
    "#;
    let (_, outputs) = compile(
        &[("one.proto", one), ("two.proto", two)],
        &["one.proto"],
        &[],
        None,
    )
    .unwrap();

    let foo = &outputs["com.example.p.Foo"];
    assert!(foo.contains("import com.example.q.Other;"));
    assert!(foo.contains("public Other other;"));
}

#[test]
fn test_unknown_field_type_is_fatal() {
    let schema = r#"
    package p;
    message Foo {
      optional Missing thing = 1;
    }
    "#;
    let err = compile(&[("foo.proto", schema)], &["foo.proto"], &[], None)
        .map(|_| ())
        .unwrap_err();
    assert!(matches!(err, StitchError::UnresolvedSymbol { .. }));
}

#[test]
fn test_missing_import_is_fatal() {
    let schema = r#"
    package p;
    import "absent.proto";
    message Foo {}
    "#;
    let err = compile(&[("foo.proto", schema)], &["foo.proto"], &[], None)
        .map(|_| ())
        .unwrap_err();
    assert!(matches!(err, StitchError::Io(_)));
}
