//! Parsed schema model
//!
//! A registered schema is held as a closed set of structural variants rather
//! than raw JSON, so the compatibility checker can dispatch over kinds with
//! strongly typed accessors instead of probing an untyped tree. The canonical
//! string form is rebuilt from this structure, which makes it stable under
//! source formatting and attribute-order differences.

use std::fmt;

use serde_json::Value;

/// Primitive schema types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
}

impl PrimitiveType {
    /// Parse a primitive type name as it appears in schema source
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "null" => Some(PrimitiveType::Null),
            "boolean" => Some(PrimitiveType::Boolean),
            "int" => Some(PrimitiveType::Int),
            "long" => Some(PrimitiveType::Long),
            "float" => Some(PrimitiveType::Float),
            "double" => Some(PrimitiveType::Double),
            "bytes" => Some(PrimitiveType::Bytes),
            "string" => Some(PrimitiveType::String),
            _ => None,
        }
    }

    /// The type name as written in schema source
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveType::Null => "null",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
            PrimitiveType::Bytes => "bytes",
            PrimitiveType::String => "string",
        }
    }

    /// The kind discriminator for this primitive
    pub fn kind(&self) -> SchemaKind {
        match self {
            PrimitiveType::Null => SchemaKind::Null,
            PrimitiveType::Boolean => SchemaKind::Boolean,
            PrimitiveType::Int => SchemaKind::Int,
            PrimitiveType::Long => SchemaKind::Long,
            PrimitiveType::Float => SchemaKind::Float,
            PrimitiveType::Double => SchemaKind::Double,
            PrimitiveType::Bytes => SchemaKind::Bytes,
            PrimitiveType::String => SchemaKind::String,
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind discriminator over the full schema variant set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
    Record,
    Enum,
    Array,
    Map,
    Union,
}

impl SchemaKind {
    /// The kind name as written in schema source
    pub fn name(&self) -> &'static str {
        match self {
            SchemaKind::Null => "null",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Int => "int",
            SchemaKind::Long => "long",
            SchemaKind::Float => "float",
            SchemaKind::Double => "double",
            SchemaKind::Bytes => "bytes",
            SchemaKind::String => "string",
            SchemaKind::Record => "record",
            SchemaKind::Enum => "enum",
            SchemaKind::Array => "array",
            SchemaKind::Map => "map",
            SchemaKind::Union => "union",
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single field of a record schema
#[derive(Debug, Clone, PartialEq)]
pub struct RecordField {
    /// Field name, unique within the record
    pub name: String,
    /// Field type
    pub schema: ParsedSchema,
    /// Default value readers substitute when the writer omitted the field
    pub default: Option<Value>,
}

/// A record schema: a named, ordered field list
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    pub name: String,
    pub fields: Vec<RecordField>,
}

impl RecordSchema {
    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&RecordField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// An enum schema: a named symbol list with an optional fallback symbol
///
/// The fallback (`default`) is the symbol a reader substitutes when the writer
/// produced a symbol the reader does not know. Without one, receiving unknown
/// symbols is a compatibility violation.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumSchema {
    pub name: String,
    pub symbols: Vec<String>,
    pub default: Option<String>,
}

impl EnumSchema {
    /// Whether the symbol list contains `symbol`
    pub fn has_symbol(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|s| s == symbol)
    }
}

/// A parsed schema, as a closed set of structural variants
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedSchema {
    Primitive(PrimitiveType),
    Record(RecordSchema),
    Enum(EnumSchema),
    Array { items: Box<ParsedSchema> },
    Map { values: Box<ParsedSchema> },
    Union { branches: Vec<ParsedSchema> },
}

impl ParsedSchema {
    /// The kind discriminator for this schema
    pub fn kind(&self) -> SchemaKind {
        match self {
            ParsedSchema::Primitive(p) => p.kind(),
            ParsedSchema::Record(_) => SchemaKind::Record,
            ParsedSchema::Enum(_) => SchemaKind::Enum,
            ParsedSchema::Array { .. } => SchemaKind::Array,
            ParsedSchema::Map { .. } => SchemaKind::Map,
            ParsedSchema::Union { .. } => SchemaKind::Union,
        }
    }

    /// The declared name, for named kinds (record and enum)
    pub fn name(&self) -> Option<&str> {
        match self {
            ParsedSchema::Record(r) => Some(&r.name),
            ParsedSchema::Enum(e) => Some(&e.name),
            _ => None,
        }
    }

    /// Record accessor
    pub fn as_record(&self) -> Option<&RecordSchema> {
        match self {
            ParsedSchema::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Enum accessor
    pub fn as_enum(&self) -> Option<&EnumSchema> {
        match self {
            ParsedSchema::Enum(e) => Some(e),
            _ => None,
        }
    }

    /// Union branch accessor
    pub fn as_union(&self) -> Option<&[ParsedSchema]> {
        match self {
            ParsedSchema::Union { branches } => Some(branches),
            _ => None,
        }
    }

    /// Canonical string form: compact JSON rebuilt from the structure
    ///
    /// Attribute order, whitespace, and ignored attributes (`doc`, `aliases`,
    /// logical types) never reach this form. Field order, defaults, and enum
    /// fallbacks are kept, since they carry compatibility meaning.
    pub fn canonical(&self) -> String {
        self.canonical_value().to_string()
    }

    fn canonical_value(&self) -> Value {
        match self {
            ParsedSchema::Primitive(p) => Value::String(p.name().to_string()),
            ParsedSchema::Record(r) => {
                let fields: Vec<Value> = r
                    .fields
                    .iter()
                    .map(|f| {
                        let mut field = serde_json::Map::new();
                        field.insert("name".to_string(), Value::String(f.name.clone()));
                        field.insert("type".to_string(), f.schema.canonical_value());
                        if let Some(default) = &f.default {
                            field.insert("default".to_string(), default.clone());
                        }
                        Value::Object(field)
                    })
                    .collect();

                let mut record = serde_json::Map::new();
                record.insert("type".to_string(), Value::String("record".to_string()));
                record.insert("name".to_string(), Value::String(r.name.clone()));
                record.insert("fields".to_string(), Value::Array(fields));
                Value::Object(record)
            }
            ParsedSchema::Enum(e) => {
                let symbols: Vec<Value> =
                    e.symbols.iter().map(|s| Value::String(s.clone())).collect();

                let mut obj = serde_json::Map::new();
                obj.insert("type".to_string(), Value::String("enum".to_string()));
                obj.insert("name".to_string(), Value::String(e.name.clone()));
                obj.insert("symbols".to_string(), Value::Array(symbols));
                if let Some(default) = &e.default {
                    obj.insert("default".to_string(), Value::String(default.clone()));
                }
                Value::Object(obj)
            }
            ParsedSchema::Array { items } => {
                let mut obj = serde_json::Map::new();
                obj.insert("type".to_string(), Value::String("array".to_string()));
                obj.insert("items".to_string(), items.canonical_value());
                Value::Object(obj)
            }
            ParsedSchema::Map { values } => {
                let mut obj = serde_json::Map::new();
                obj.insert("type".to_string(), Value::String("map".to_string()));
                obj.insert("values".to_string(), values.canonical_value());
                Value::Object(obj)
            }
            ParsedSchema::Union { branches } => {
                Value::Array(branches.iter().map(|b| b.canonical_value()).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn order_record() -> ParsedSchema {
        ParsedSchema::Record(RecordSchema {
            name: "Order".to_string(),
            fields: vec![
                RecordField {
                    name: "id".to_string(),
                    schema: ParsedSchema::Primitive(PrimitiveType::Int),
                    default: None,
                },
                RecordField {
                    name: "currency".to_string(),
                    schema: ParsedSchema::Primitive(PrimitiveType::String),
                    default: Some(json!("USD")),
                },
            ],
        })
    }

    #[test]
    fn test_canonical_is_compact() {
        let canonical = order_record().canonical();
        assert!(!canonical.contains(' '));
        assert!(!canonical.contains('\n'));
    }

    #[test]
    fn test_canonical_keeps_defaults_and_field_order() {
        let canonical = order_record().canonical();
        assert!(canonical.contains(r#""default":"USD""#));
        let id_pos = canonical.find(r#""name":"id""#).unwrap();
        let currency_pos = canonical.find(r#""name":"currency""#).unwrap();
        assert!(id_pos < currency_pos);
    }

    #[test]
    fn test_canonical_is_deterministic() {
        assert_eq!(order_record().canonical(), order_record().canonical());
    }

    #[test]
    fn test_kind_and_name_accessors() {
        let record = order_record();
        assert_eq!(record.kind(), SchemaKind::Record);
        assert_eq!(record.name(), Some("Order"));
        assert_eq!(record.as_record().unwrap().fields.len(), 2);

        let primitive = ParsedSchema::Primitive(PrimitiveType::Long);
        assert_eq!(primitive.kind(), SchemaKind::Long);
        assert_eq!(primitive.name(), None);
        assert_eq!(primitive.canonical(), r#""long""#);
    }

    #[test]
    fn test_record_field_lookup() {
        let record = order_record();
        let record = record.as_record().unwrap();
        assert!(record.field("currency").is_some());
        assert!(record.field("missing").is_none());
    }

    #[test]
    fn test_enum_symbols() {
        let status = EnumSchema {
            name: "Status".to_string(),
            symbols: vec!["ACTIVE".to_string(), "CLOSED".to_string()],
            default: Some("ACTIVE".to_string()),
        };
        assert!(status.has_symbol("ACTIVE"));
        assert!(!status.has_symbol("UNKNOWN"));

        let schema = ParsedSchema::Enum(status);
        assert!(schema.canonical().contains(r#""default":"ACTIVE""#));
    }

    #[test]
    fn test_union_canonical_is_a_json_array() {
        let union = ParsedSchema::Union {
            branches: vec![
                ParsedSchema::Primitive(PrimitiveType::Null),
                ParsedSchema::Primitive(PrimitiveType::String),
            ],
        };
        assert_eq!(union.canonical(), r#"["null","string"]"#);
        assert_eq!(union.as_union().unwrap().len(), 2);
    }
}
