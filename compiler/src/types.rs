use serde::Serialize;

use crate::path::TypePath;

/// One parsed schema file: package, imports, top-level type declarations and
/// out-of-line extend declarations. Immutable once the parser returns it.
#[derive(Debug, PartialEq, Serialize)]
pub struct SchemaFile {
    /// The path this file was parsed from, as handed to the compiler.
    pub file_name:    String,
    pub package_name: String,
    /// Target namespace for generated classes. Defaults to `package_name`
    /// unless the file declares `option java_package = "...";`.
    pub java_package: String,
    pub imports:      Vec<String>,
    pub types:        Vec<TypeDecl>,
    pub extends:      Vec<ExtendDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeDecl {
    pub name:      String,
    /// Dot-joined package + enclosing-type path + simple name.
    pub full_name: TypePath,
    pub line:      usize,
    pub column:    usize,
    pub kind:      TypeKind,
    pub nested:    Vec<TypeDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TypeKind {
    Message(MessageDecl),
    Enum(EnumDecl),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageDecl {
    pub fields:           Vec<Field>,
    /// Tag ranges reserved for extension fields (`extensions 100 to 200;`).
    pub extension_ranges: Vec<ExtensionRange>,
    pub options:          Vec<OptionDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumDecl {
    pub values: Vec<EnumValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumValue {
    pub name: String,
    pub tag:  i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Label {
    Optional,
    Required,
    Repeated,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub label:         Label,
    /// Either a scalar keyword or a type reference needing resolution.
    pub type_token:    String,
    pub name:          String,
    pub tag:           u32,
    pub default_value: Option<String>,
    pub packed:        Option<bool>,
    pub line:          usize,
    pub column:        usize,
}

/// An out-of-line field block extending a message declared elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtendDecl {
    /// Type token naming the extended message; resolved against the symbol
    /// table, not necessarily fully qualified as written.
    pub target: String,
    pub fields: Vec<Field>,
    pub line:   usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExtensionRange {
    pub low:  i32,
    pub high: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionDecl {
    pub name:  String,
    pub value: String,
}

impl TypeDecl {
    pub fn as_message(&self) -> Option<&MessageDecl> {
        match &self.kind {
            TypeKind::Message(message) => Some(message),
            TypeKind::Enum(_) => None,
        }
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.kind, TypeKind::Enum(_))
    }

    pub fn has_fields(&self) -> bool {
        self.as_message().map_or(false, |m| !m.fields.is_empty())
    }

    /// True if the message reserves tag ranges for extension fields.
    pub fn has_extension_ranges(&self) -> bool {
        self.as_message()
            .map_or(false, |m| !m.extension_ranges.is_empty())
    }
}
