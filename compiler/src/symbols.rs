//! Global symbol table, field index, and extension index, plus the two-pass
//! loader that fills them from a schema file and its transitive imports.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::StitchError;
use crate::io::Io;
use crate::path::TypePath;
use crate::scalar;
use crate::types::{Label, SchemaFile, TypeDecl, TypeKind};
use crate::utils::remove_trailing_segment;

/// A field's type after resolution: either a scalar keyword or the
/// fully-qualified schema name of a message/enum.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedType {
    Scalar(String),
    Named(TypePath),
}

impl ResolvedType {
    pub fn type_string(&self) -> String {
        match self {
            ResolvedType::Scalar(keyword) => keyword.clone(),
            ResolvedType::Named(path) => path.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub field_type: ResolvedType,
    pub label:      Label,
}

/// One extension field, resolved at load time and read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionInfo {
    /// Shortened Java type for messages, fully-qualified schema name for
    /// enums, the scalar keyword for scalars.
    pub java_type: String,
    /// Fully-qualified schema name, or the scalar keyword.
    pub fq_type:   String,
    /// Holder class name derived from the declaring file, `Ext_<stem>`.
    pub holder:    String,
    /// Holder class qualified by the declaring file's Java package.
    pub fq_holder: String,
    pub label:     Label,
}

/// The three indices built from all loaded files. Mutated only by the
/// loader; the resolution and generation phases read it as a snapshot.
#[derive(Debug, Default)]
pub struct Symbols {
    java_symbol_map: HashMap<TypePath, String>,
    enum_types:      HashSet<TypePath>,
    enum_defaults:   HashMap<TypePath, String>,
    field_map:       HashMap<(TypePath, String), FieldInfo>,
    extension_info:  HashMap<String, ExtensionInfo>,
}

impl Symbols {
    /// True if the name is a complete symbol, i.e. some loaded file
    /// declared a type with exactly this fully-qualified name.
    pub fn is_known(&self, name: &TypePath) -> bool {
        self.java_symbol_map.contains_key(name)
    }

    pub fn java_name(&self, name: &TypePath) -> Option<&str> {
        self.java_symbol_map.get(name).map(|s| s.as_str())
    }

    pub fn is_enum(&self, name: &TypePath) -> bool {
        self.enum_types.contains(name)
    }

    /// First declared value of an enum, used for default constants.
    pub fn enum_default(&self, name: &TypePath) -> Option<&str> {
        self.enum_defaults.get(name).map(|s| s.as_str())
    }

    pub fn field(&self, message: &TypePath, field_name: &str) -> Option<&FieldInfo> {
        self.field_map
            .get(&(message.clone(), field_name.to_string()))
    }

    pub fn extension(&self, fq_field_name: &str) -> Option<&ExtensionInfo> {
        self.extension_info.get(fq_field_name)
    }

    pub fn symbol_count(&self) -> usize {
        self.java_symbol_map.len()
    }

    /// Resolves a type token against a lexical context, searching outward
    /// from the innermost scope. The context is the enclosing message, or
    /// the file's package when the token appears at the top level.
    pub fn resolve(
        &self,
        token: &str,
        file: &SchemaFile,
        context: Option<&TypePath>,
    ) -> Result<TypePath, StitchError> {
        let direct = TypePath::from_dotted(token);
        if self.is_known(&direct) {
            return Ok(direct);
        }

        let mut prefix = match context {
            Some(message) => message.clone(),
            None => TypePath::from_dotted(&file.package_name),
        };
        while !prefix.is_empty() {
            let candidate = prefix.join_dotted(token);
            if self.is_known(&candidate) {
                return Ok(candidate);
            }
            prefix = prefix.parent().unwrap_or_else(TypePath::root);
        }

        Err(StitchError::UnresolvedSymbol {
            token:   token.to_string(),
            context: match context {
                Some(message) => format!("message {}", message),
                None => file.file_name.clone(),
            },
        })
    }

    /// Shortest safe Java reference to `fq_name` from inside the type
    /// currently being generated. `type_being_generated` is the dotted
    /// enclosing-type path with a trailing dot, empty at the top level.
    pub fn shorten(
        &self,
        fq_name: &str,
        java_package: &str,
        type_being_generated: &str,
    ) -> String {
        let current = format!("{}.{}", java_package, type_being_generated);
        if let Some(rest) = fq_name.strip_prefix(&current) {
            return rest.to_string();
        }

        // Names under a known symbol's namespace will be imported, so the
        // package part can be dropped.
        if self
            .java_symbol_map
            .values()
            .any(|symbol| fq_name.starts_with(symbol.as_str()))
        {
            let package = self.java_package_of(fq_name);
            if package.is_empty() {
                return fq_name.to_string();
            }
            return fq_name[package.len() + 1..].to_string();
        }

        fq_name.to_string()
    }

    /// Package prefix of a fully-qualified Java name, found by stripping
    /// trailing segments while the remainder is itself a known symbol.
    pub fn java_package_of(&self, fq_name: &str) -> String {
        let mut name = fq_name;
        while self.java_symbol_map.values().any(|symbol| symbol == name) {
            name = remove_trailing_segment(name);
        }
        name.to_string()
    }
}

#[derive(Clone, Copy, PartialEq)]
enum LoadPass {
    Types,
    Fields,
}

/// Per-compile loader: parses files (memoized in the session cache) and runs
/// the two symbol passes over a top-level source file and its imports.
pub(crate) struct Loader<'a, I: Io> {
    pub io:         &'a I,
    pub proto_path: &'a Path,
    pub cache:      &'a mut HashMap<PathBuf, Rc<SchemaFile>>,
    pub symbols:    &'a mut Symbols,
}

impl<'a, I: Io> Loader<'a, I> {
    pub fn parse(&mut self, path: &Path) -> Result<Rc<SchemaFile>, StitchError> {
        if let Some(file) = self.cache.get(path) {
            return Ok(Rc::clone(file));
        }
        let file = Rc::new(self.io.parse(path)?);
        self.cache.insert(path.to_path_buf(), Rc::clone(&file));
        Ok(file)
    }

    /// Two full passes: first every type (so forward and cross-file
    /// references work), then every field and extension against the
    /// completed symbol table.
    pub fn load_symbols(&mut self, file: &SchemaFile) -> Result<(), StitchError> {
        self.load_pass(file, &mut HashSet::new(), LoadPass::Types)?;
        self.load_pass(file, &mut HashSet::new(), LoadPass::Fields)
    }

    fn load_pass(
        &mut self,
        file: &SchemaFile,
        visited: &mut HashSet<String>,
        pass: LoadPass,
    ) -> Result<(), StitchError> {
        // Imports first, each at most once per top-level call.
        for dependency in &file.imports {
            if !visited.contains(dependency) {
                let dependency_path = self.proto_path.join(dependency);
                let dependency_file = self.parse(&dependency_path)?;
                self.load_pass(&dependency_file, visited, pass)?;
                visited.insert(dependency.clone());
            }
        }

        match pass {
            LoadPass::Types => self.add_types(file),
            LoadPass::Fields => {
                self.add_fields(file)?;
                self.add_extensions(file)?;
            }
        }
        Ok(())
    }

    fn add_types(&mut self, file: &SchemaFile) {
        let mut worklist: Vec<(&TypeDecl, String)> = file
            .types
            .iter()
            .map(|decl| (decl, format!("{}.", file.java_package)))
            .collect();

        while let Some((decl, java_prefix)) = worklist.pop() {
            let java_name = format!("{}{}", java_prefix, decl.name);
            self.symbols
                .java_symbol_map
                .insert(decl.full_name.clone(), java_name.clone());

            if let TypeKind::Enum(en) = &decl.kind {
                self.symbols.enum_types.insert(decl.full_name.clone());
                if let Some(first) = en.values.first() {
                    self.symbols
                        .enum_defaults
                        .insert(decl.full_name.clone(), first.name.clone());
                }
            }

            let nested_prefix = format!("{}.", java_name);
            for nested in &decl.nested {
                worklist.push((nested, nested_prefix.clone()));
            }
        }
    }

    fn add_fields(&mut self, file: &SchemaFile) -> Result<(), StitchError> {
        let mut worklist: Vec<&TypeDecl> = file.types.iter().collect();
        while let Some(decl) = worklist.pop() {
            if let TypeKind::Message(message) = &decl.kind {
                for field in &message.fields {
                    let field_type = if scalar::is_scalar(&field.type_token) {
                        ResolvedType::Scalar(field.type_token.clone())
                    } else {
                        let resolved =
                            self.symbols
                                .resolve(&field.type_token, file, Some(&decl.full_name))?;
                        ResolvedType::Named(resolved)
                    };
                    self.symbols.field_map.insert(
                        (decl.full_name.clone(), field.name.clone()),
                        FieldInfo {
                            field_type,
                            label: field.label,
                        },
                    );
                }
            }
            worklist.extend(decl.nested.iter());
        }
        Ok(())
    }

    fn add_extensions(&mut self, file: &SchemaFile) -> Result<(), StitchError> {
        if file.extends.is_empty() {
            return Ok(());
        }
        let holder = extension_holder_name(&file.file_name);
        let fq_holder = format!("{}.{}", file.java_package, holder);

        for extend in &file.extends {
            for field in &extend.fields {
                let token = &field.type_token;
                let (java_type, fq_type) = if scalar::is_scalar(token) {
                    (token.clone(), token.clone())
                } else {
                    let fq = resolve_extension_type(self.symbols, file, token)?;
                    if self.symbols.is_enum(&fq) {
                        // Keep the fully-qualified name so enums can be
                        // identified at generation time.
                        (fq.to_string(), fq.to_string())
                    } else {
                        let java = self
                            .symbols
                            .java_name(&fq)
                            .unwrap_or_default()
                            .to_string();
                        let short = self.symbols.shorten(&java, &file.java_package, "");
                        (short, fq.to_string())
                    }
                };

                let fq_field_name = format!("{}.{}", file.package_name, field.name);
                self.symbols.extension_info.insert(
                    fq_field_name,
                    ExtensionInfo {
                        java_type,
                        fq_type,
                        holder: holder.clone(),
                        fq_holder: fq_holder.clone(),
                        label: field.label,
                    },
                );
            }
        }
        Ok(())
    }
}

/// Tries the bare token first and only then retries with the declaring
/// file's package prefixed. The precedence order is load-bearing: a name
/// qualified elsewhere must win over a package-local reading.
pub(crate) fn resolve_extension_type(
    symbols: &Symbols,
    file: &SchemaFile,
    token: &str,
) -> Result<TypePath, StitchError> {
    match symbols.resolve(token, file, None) {
        Ok(path) => Ok(path),
        Err(_) => {
            let prefixed = format!("{}.{}", file.package_name, token);
            symbols.resolve(&prefixed, file, None)
        }
    }
}

/// `Ext_<stem>`: the holder class name derived from the declaring file.
pub(crate) fn extension_holder_name(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string());
    format!("Ext_{}", stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_file(package: &str) -> SchemaFile {
        SchemaFile {
            file_name:    "test.proto".to_string(),
            package_name: package.to_string(),
            java_package: package.to_string(),
            imports:      Vec::new(),
            types:        Vec::new(),
            extends:      Vec::new(),
        }
    }

    fn symbols_with(names: &[&str]) -> Symbols {
        let mut symbols = Symbols::default();
        for name in names {
            symbols
                .java_symbol_map
                .insert(TypePath::from_dotted(name), name.to_string());
        }
        symbols
    }

    #[test]
    fn test_resolve_prefers_inner_scope() {
        // Both p.Foo.Color and p.Color exist; from inside p.Foo the bare
        // token must pick the nested declaration.
        let symbols = symbols_with(&["p.Foo", "p.Foo.Color", "p.Color"]);
        let file = empty_file("p");
        let context = TypePath::from_dotted("p.Foo");

        let resolved = symbols.resolve("Color", &file, Some(&context)).unwrap();
        assert_eq!(resolved.to_string(), "p.Foo.Color");

        let top_level = symbols.resolve("Color", &file, None).unwrap();
        assert_eq!(top_level.to_string(), "p.Color");
    }

    #[test]
    fn test_resolve_complete_symbol_passes_through() {
        let symbols = symbols_with(&["p.Foo", "q.Bar"]);
        let file = empty_file("p");
        let resolved = symbols.resolve("q.Bar", &file, None).unwrap();
        assert_eq!(resolved.to_string(), "q.Bar");
    }

    #[test]
    fn test_resolve_unknown_is_fatal() {
        let symbols = symbols_with(&["p.Foo"]);
        let file = empty_file("p");
        let err = symbols.resolve("Missing", &file, None).unwrap_err();
        assert!(matches!(err, StitchError::UnresolvedSymbol { .. }));
    }

    #[test]
    fn test_shorten_inside_generated_type() {
        let symbols = symbols_with(&["p.Foo", "p.Foo.Bar"]);
        assert_eq!(symbols.shorten("p.Foo.Bar", "p", "Foo."), "Bar");
        assert_eq!(symbols.shorten("p.Foo.Bar", "p", ""), "Foo.Bar");
    }

    #[test]
    fn test_shorten_imported_symbol_drops_package() {
        let symbols = symbols_with(&["other.pkg.Other", "other.pkg.Other.Nested"]);
        assert_eq!(
            symbols.shorten("other.pkg.Other.Nested", "p", ""),
            "Other.Nested"
        );
    }

    #[test]
    fn test_shorten_unknown_name_unchanged() {
        let symbols = symbols_with(&["p.Foo"]);
        assert_eq!(
            symbols.shorten("elsewhere.Thing", "p", ""),
            "elsewhere.Thing"
        );
    }

    #[test]
    fn test_extension_holder_name() {
        assert_eq!(extension_holder_name("dir/sub/foo_bar.proto"), "Ext_foo_bar");
        assert_eq!(extension_holder_name("foo.proto"), "Ext_foo");
    }
}
