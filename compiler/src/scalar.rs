//! Static catalog mapping schema scalar keywords to Java types and wire
//! datatype tags. No runtime state; everything here is a lookup table.

use crate::error::StitchError;
use crate::types::{Field, Label};

/// Wire-level datatype of a field, used for the static imports and
/// `@ProtoField` annotations in generated sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Datatype {
    Bool,
    Bytes,
    Double,
    Enum,
    Fixed32,
    Fixed64,
    Float,
    Int32,
    Int64,
    Message,
    Sfixed32,
    Sfixed64,
    Sint32,
    Sint64,
    String,
    Uint32,
    Uint64,
}

/// Cardinality tag of a field as emitted, `Packed` replacing `Repeated`
/// when the wire encoding packs elements into one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WireLabel {
    Optional,
    Packed,
    Repeated,
    Required,
}

/// `(scalar keyword, Java type, datatype tag)` rows, one per scalar the
/// schema language knows.
const SCALARS: [(&str, &str, Datatype); 15] = [
    ("bool", "Boolean", Datatype::Bool),
    ("bytes", "ByteString", Datatype::Bytes),
    ("double", "Double", Datatype::Double),
    ("fixed32", "Integer", Datatype::Fixed32),
    ("fixed64", "Long", Datatype::Fixed64),
    ("float", "Float", Datatype::Float),
    ("int32", "Integer", Datatype::Int32),
    ("int64", "Long", Datatype::Int64),
    ("sfixed32", "Integer", Datatype::Sfixed32),
    ("sfixed64", "Long", Datatype::Sfixed64),
    ("sint32", "Integer", Datatype::Sint32),
    ("sint64", "Long", Datatype::Sint64),
    ("string", "String", Datatype::String),
    ("uint32", "Integer", Datatype::Uint32),
    ("uint64", "Long", Datatype::Uint64),
];

pub fn is_scalar(token: &str) -> bool {
    SCALARS.iter().any(|(name, _, _)| *name == token)
}

/// The boxed Java type for a scalar keyword, or `None` for type references.
pub fn java_scalar_type(token: &str) -> Option<&'static str> {
    SCALARS
        .iter()
        .find(|(name, _, _)| *name == token)
        .map(|(_, java, _)| *java)
}

impl Datatype {
    pub fn of(token: &str) -> Option<Datatype> {
        SCALARS
            .iter()
            .find(|(name, _, _)| *name == token)
            .map(|(_, _, datatype)| *datatype)
    }

    /// Constant name used in static imports and annotations.
    pub fn constant_name(self) -> &'static str {
        match self {
            Datatype::Bool => "BOOL",
            Datatype::Bytes => "BYTES",
            Datatype::Double => "DOUBLE",
            Datatype::Enum => "ENUM",
            Datatype::Fixed32 => "FIXED32",
            Datatype::Fixed64 => "FIXED64",
            Datatype::Float => "FLOAT",
            Datatype::Int32 => "INT32",
            Datatype::Int64 => "INT64",
            Datatype::Message => "MESSAGE",
            Datatype::Sfixed32 => "SFIXED32",
            Datatype::Sfixed64 => "SFIXED64",
            Datatype::Sint32 => "SINT32",
            Datatype::Sint64 => "SINT64",
            Datatype::String => "STRING",
            Datatype::Uint32 => "UINT32",
            Datatype::Uint64 => "UINT64",
        }
    }

    /// Length-delimited datatypes cannot be packed.
    pub fn is_packable(self) -> bool {
        !matches!(self, Datatype::String | Datatype::Bytes | Datatype::Message)
    }
}

impl WireLabel {
    pub fn constant_name(self) -> &'static str {
        match self {
            WireLabel::Optional => "OPTIONAL",
            WireLabel::Packed => "PACKED",
            WireLabel::Repeated => "REPEATED",
            WireLabel::Required => "REQUIRED",
        }
    }

    /// The `build*()` suffix of an extension constant.
    pub fn builder_suffix(self) -> &'static str {
        match self {
            WireLabel::Optional => "Optional",
            WireLabel::Packed => "Packed",
            WireLabel::Repeated => "Repeated",
            WireLabel::Required => "Required",
        }
    }
}

/// True when a repeated field's declared `[packed = true]` option actually
/// takes effect: only enums and packable scalars may be packed.
pub fn is_packed(field: &Field, is_enum: bool) -> bool {
    if field.label != Label::Repeated || field.packed != Some(true) {
        return false;
    }
    is_enum
        || Datatype::of(&field.type_token)
            .map_or(false, |datatype| datatype.is_packable())
}

/// The emitted cardinality of a field.
pub fn wire_label(field: &Field, is_enum: bool) -> WireLabel {
    match field.label {
        Label::Optional => WireLabel::Optional,
        Label::Required => WireLabel::Required,
        Label::Repeated => {
            if is_packed(field, is_enum) {
                WireLabel::Packed
            } else {
                WireLabel::Repeated
            }
        }
    }
}

/// Renders the initializer for a `DEFAULT_` constant of the given Java
/// scalar type, wrapping unsigned literals the way Java's signed types
/// require. An unrecognized Java type name signals a catalog gap.
pub fn initializer_for_type(
    initial_value: Option<&str>,
    java_type_name: &str,
) -> Result<String, StitchError> {
    match java_type_name {
        "Boolean" => Ok(initial_value.unwrap_or("false").to_string()),
        "Integer" => Ok(match initial_value {
            Some(value) => to_int(value),
            None => "0".to_string(),
        }),
        "Long" => Ok(match initial_value {
            Some(value) => format!("{}L", to_long(value)),
            None => "0L".to_string(),
        }),
        "Float" => Ok(match initial_value {
            Some(value) => format!("{}F", value),
            None => "0F".to_string(),
        }),
        "Double" => Ok(match initial_value {
            Some(value) => format!("{}D", value),
            None => "0D".to_string(),
        }),
        "String" => Ok(quote_string(initial_value)),
        "ByteString" => Ok(match initial_value {
            Some(value) => format!("ByteString.of({})", quote_string(Some(value))),
            None => "ByteString.EMPTY".to_string(),
        }),
        other => Err(StitchError::UnsupportedScalar(other.to_string())),
    }
}

// Wraps out-of-range unsigned literals into Java's signed int.
fn to_int(value: &str) -> String {
    if let Ok(parsed) = value.parse::<i128>() {
        (parsed as i32).to_string()
    } else if let Ok(parsed) = value.parse::<f64>() {
        (parsed as i32).to_string()
    } else {
        value.to_string()
    }
}

fn to_long(value: &str) -> String {
    if let Ok(parsed) = value.parse::<i128>() {
        (parsed as i64).to_string()
    } else if let Ok(parsed) = value.parse::<f64>() {
        (parsed as i64).to_string()
    } else {
        value.to_string()
    }
}

fn quote_string(initial_value: Option<&str>) -> String {
    match initial_value {
        Some(value) => serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string()),
        None => "\"\"".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_lookup() {
        assert!(is_scalar("int32"));
        assert!(!is_scalar("Foo"));
        assert_eq!(java_scalar_type("bytes"), Some("ByteString"));
        assert_eq!(Datatype::of("uint64"), Some(Datatype::Uint64));
    }

    #[test]
    fn test_unsigned_defaults_wrap() {
        assert_eq!(
            initializer_for_type(Some("4294967295"), "Integer").unwrap(),
            "-1"
        );
        assert_eq!(
            initializer_for_type(Some("18446744073709551615"), "Long").unwrap(),
            "-1L"
        );
    }

    #[test]
    fn test_missing_defaults() {
        assert_eq!(initializer_for_type(None, "Boolean").unwrap(), "false");
        assert_eq!(initializer_for_type(None, "Float").unwrap(), "0F");
        assert_eq!(initializer_for_type(None, "String").unwrap(), "\"\"");
        assert_eq!(
            initializer_for_type(None, "ByteString").unwrap(),
            "ByteString.EMPTY"
        );
    }

    #[test]
    fn test_unknown_java_type_is_a_catalog_gap() {
        let err = initializer_for_type(None, "BigDecimal").unwrap_err();
        assert!(matches!(err, StitchError::UnsupportedScalar(_)));
    }

    #[test]
    fn test_packed_requires_packable_type() {
        let field = Field {
            label:         Label::Repeated,
            type_token:    "string".to_string(),
            name:          "names".to_string(),
            tag:           1,
            default_value: None,
            packed:        Some(true),
            line:          0,
            column:        0,
        };
        assert!(!is_packed(&field, false));

        let mut numbers = field.clone();
        numbers.type_token = "int32".to_string();
        assert!(is_packed(&numbers, false));
        assert_eq!(wire_label(&numbers, false), WireLabel::Packed);
    }
}
