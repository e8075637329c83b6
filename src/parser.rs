//! Schema parsing
//!
//! The registry consumes parsing through the [`SchemaParser`] trait and never
//! interprets schema source itself. [`AvroParser`] is the built-in
//! implementation for Avro-style JSON schema definitions.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::error::{RegistryError, Result};
use crate::schema::{
    EnumSchema, ParsedSchema, PrimitiveType, RecordField, RecordSchema, SchemaKind,
};

/// Default bound on accepted schema source size
pub const DEFAULT_MAX_SCHEMA_BYTES: usize = 1024 * 1024;

/// Parsing seam between the registry and a schema language
pub trait SchemaParser: Send + Sync {
    /// Parse schema source text into a structural handle
    fn parse(&self, source: &str) -> Result<ParsedSchema>;
}

/// Parser for Avro-style JSON schema definitions
///
/// Accepts primitive type names, records, enums, arrays, maps, and unions.
/// `doc`, `aliases`, `namespace`, and logical-type attributes are ignored, so
/// they never influence the canonical form.
#[derive(Debug, Clone)]
pub struct AvroParser {
    /// Maximum accepted source length in bytes (0 = unlimited)
    max_schema_bytes: usize,
    /// Enforce name rules on records and enums
    strict_names: bool,
}

impl AvroParser {
    pub fn new() -> Self {
        Self {
            max_schema_bytes: DEFAULT_MAX_SCHEMA_BYTES,
            strict_names: true,
        }
    }

    /// Build a parser from validation settings
    pub fn with_limits(max_schema_bytes: usize, strict_names: bool) -> Self {
        Self {
            max_schema_bytes,
            strict_names,
        }
    }

    fn parse_value(&self, value: &Value) -> Result<ParsedSchema> {
        match value {
            Value::String(name) => self.parse_type_name(name),
            Value::Array(branches) => self.parse_union(branches),
            Value::Object(obj) => self.parse_object(obj),
            other => Err(RegistryError::Parse(format!(
                "expected a type name, union, or type object, got {}",
                other
            ))),
        }
    }

    fn parse_type_name(&self, name: &str) -> Result<ParsedSchema> {
        PrimitiveType::from_name(name)
            .map(ParsedSchema::Primitive)
            .ok_or_else(|| RegistryError::Parse(format!("unknown type name '{}'", name)))
    }

    fn parse_union(&self, branches: &[Value]) -> Result<ParsedSchema> {
        if branches.is_empty() {
            return Err(RegistryError::Parse(
                "union must have at least one branch".to_string(),
            ));
        }
        let mut parsed = Vec::with_capacity(branches.len());
        for branch in branches {
            let schema = self.parse_value(branch)?;
            if schema.kind() == SchemaKind::Union {
                return Err(RegistryError::Parse(
                    "unions may not immediately contain other unions".to_string(),
                ));
            }
            parsed.push(schema);
        }
        Ok(ParsedSchema::Union { branches: parsed })
    }

    fn parse_object(&self, obj: &Map<String, Value>) -> Result<ParsedSchema> {
        let type_name = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| RegistryError::Parse("schema object has no string 'type'".to_string()))?;

        match type_name {
            "record" => self.parse_record(obj),
            "enum" => self.parse_enum(obj),
            "array" => {
                let items = obj.get("items").ok_or_else(|| {
                    RegistryError::Parse("array schema has no 'items'".to_string())
                })?;
                Ok(ParsedSchema::Array {
                    items: Box::new(self.parse_value(items)?),
                })
            }
            "map" => {
                let values = obj.get("values").ok_or_else(|| {
                    RegistryError::Parse("map schema has no 'values'".to_string())
                })?;
                Ok(ParsedSchema::Map {
                    values: Box::new(self.parse_value(values)?),
                })
            }
            // {"type": "string"} and friends
            other => self.parse_type_name(other),
        }
    }

    fn parse_record(&self, obj: &Map<String, Value>) -> Result<ParsedSchema> {
        let name = self.parse_name(obj, "record")?;
        let field_values = obj.get("fields").and_then(Value::as_array).ok_or_else(|| {
            RegistryError::Parse(format!("record '{}' has no 'fields' array", name))
        })?;

        let mut fields = Vec::with_capacity(field_values.len());
        let mut seen = HashSet::new();
        for field_value in field_values {
            let field_obj = field_value.as_object().ok_or_else(|| {
                RegistryError::Parse(format!("record '{}' has a non-object field entry", name))
            })?;
            let field_name = field_obj.get("name").and_then(Value::as_str).ok_or_else(|| {
                RegistryError::Parse(format!("record '{}' has a field without a name", name))
            })?;
            if !seen.insert(field_name.to_string()) {
                return Err(RegistryError::Parse(format!(
                    "record '{}' declares field '{}' more than once",
                    name, field_name
                )));
            }
            let type_value = field_obj.get("type").ok_or_else(|| {
                RegistryError::Parse(format!(
                    "field '{}' of record '{}' has no type",
                    field_name, name
                ))
            })?;
            fields.push(RecordField {
                name: field_name.to_string(),
                schema: self.parse_value(type_value)?,
                default: field_obj.get("default").cloned(),
            });
        }

        Ok(ParsedSchema::Record(RecordSchema { name, fields }))
    }

    fn parse_enum(&self, obj: &Map<String, Value>) -> Result<ParsedSchema> {
        let name = self.parse_name(obj, "enum")?;
        let symbol_values = obj.get("symbols").and_then(Value::as_array).ok_or_else(|| {
            RegistryError::Parse(format!("enum '{}' has no 'symbols' array", name))
        })?;
        if symbol_values.is_empty() {
            return Err(RegistryError::Parse(format!(
                "enum '{}' has an empty symbol list",
                name
            )));
        }

        let mut symbols = Vec::with_capacity(symbol_values.len());
        let mut seen = HashSet::new();
        for symbol_value in symbol_values {
            let symbol = symbol_value.as_str().ok_or_else(|| {
                RegistryError::Parse(format!("enum '{}' has a non-string symbol", name))
            })?;
            if !seen.insert(symbol.to_string()) {
                return Err(RegistryError::Parse(format!(
                    "enum '{}' declares symbol '{}' more than once",
                    name, symbol
                )));
            }
            symbols.push(symbol.to_string());
        }

        let default = match obj.get("default") {
            None => None,
            Some(Value::String(symbol)) => Some(symbol.clone()),
            Some(other) => {
                return Err(RegistryError::Parse(format!(
                    "enum '{}' default must be a string, got {}",
                    name, other
                )))
            }
        };
        if let Some(symbol) = &default {
            if !symbols.iter().any(|s| s == symbol) {
                return Err(RegistryError::Parse(format!(
                    "enum '{}' default '{}' is not one of its symbols",
                    name, symbol
                )));
            }
        }

        Ok(ParsedSchema::Enum(EnumSchema {
            name,
            symbols,
            default,
        }))
    }

    fn parse_name(&self, obj: &Map<String, Value>, kind: &str) -> Result<String> {
        let name = obj.get("name").and_then(Value::as_str).ok_or_else(|| {
            RegistryError::Parse(format!("{} schema has no 'name'", kind))
        })?;
        if name.is_empty() {
            return Err(RegistryError::Parse(format!("{} name is empty", kind)));
        }
        if self.strict_names && !valid_name(name) {
            return Err(RegistryError::Parse(format!(
                "invalid {} name '{}'",
                kind, name
            )));
        }
        Ok(name.to_string())
    }
}

impl Default for AvroParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaParser for AvroParser {
    fn parse(&self, source: &str) -> Result<ParsedSchema> {
        if self.max_schema_bytes > 0 && source.len() > self.max_schema_bytes {
            return Err(RegistryError::Parse(format!(
                "schema source is {} bytes, limit is {}",
                source.len(),
                self.max_schema_bytes
            )));
        }
        let value: Value = serde_json::from_str(source)
            .map_err(|e| RegistryError::Parse(format!("invalid JSON: {}", e)))?;
        self.parse_value(&value)
    }
}

/// Names are dot-separated segments of `[A-Za-z_][A-Za-z0-9_]*`
fn valid_name(name: &str) -> bool {
    !name.is_empty() && name.split('.').all(valid_segment)
}

fn valid_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_primitive_names() {
        let parser = AvroParser::new();
        let schema = parser.parse(r#""string""#).unwrap();
        assert_eq!(schema, ParsedSchema::Primitive(PrimitiveType::String));

        // Object form of a primitive
        let schema = parser.parse(r#"{"type": "long"}"#).unwrap();
        assert_eq!(schema, ParsedSchema::Primitive(PrimitiveType::Long));
    }

    #[test]
    fn test_parse_record_with_defaults() {
        let parser = AvroParser::new();
        let schema = parser
            .parse(
                r#"{
                    "type": "record",
                    "name": "Order",
                    "doc": "ignored",
                    "fields": [
                        {"name": "id", "type": "int"},
                        {"name": "currency", "type": "string", "default": "USD"}
                    ]
                }"#,
            )
            .unwrap();

        let record = schema.as_record().unwrap();
        assert_eq!(record.name, "Order");
        assert_eq!(record.fields.len(), 2);
        assert!(record.field("id").unwrap().default.is_none());
        assert_eq!(
            record.field("currency").unwrap().default,
            Some(serde_json::json!("USD"))
        );
    }

    #[test]
    fn test_attribute_order_does_not_change_canonical() {
        let parser = AvroParser::new();
        let a = parser
            .parse(r#"{"type":"record","name":"P","fields":[{"name":"x","type":"int"}]}"#)
            .unwrap();
        let b = parser
            .parse(
                r#"{
                    "fields": [ { "type": "int", "name": "x" } ],
                    "name": "P",
                    "type": "record"
                }"#,
            )
            .unwrap();
        assert_eq!(a.canonical(), b.canonical());
    }

    #[test]
    fn test_parse_nested_structures() {
        let parser = AvroParser::new();
        let schema = parser
            .parse(
                r#"{
                    "type": "record",
                    "name": "Cart",
                    "fields": [
                        {"name": "lines", "type": {"type": "array", "items": {
                            "type": "record",
                            "name": "Line",
                            "fields": [{"name": "sku", "type": "string"}]
                        }}},
                        {"name": "tags", "type": {"type": "map", "values": "string"}},
                        {"name": "note", "type": ["null", "string"], "default": null}
                    ]
                }"#,
            )
            .unwrap();

        let record = schema.as_record().unwrap();
        assert_eq!(record.field("lines").unwrap().schema.kind(), SchemaKind::Array);
        assert_eq!(record.field("tags").unwrap().schema.kind(), SchemaKind::Map);
        assert_eq!(record.field("note").unwrap().schema.kind(), SchemaKind::Union);
    }

    #[test]
    fn test_parse_enum_with_fallback() {
        let parser = AvroParser::new();
        let schema = parser
            .parse(
                r#"{"type": "enum", "name": "Status", "symbols": ["UNSPECIFIED", "ACTIVE"], "default": "UNSPECIFIED"}"#,
            )
            .unwrap();
        let status = schema.as_enum().unwrap();
        assert_eq!(status.default.as_deref(), Some("UNSPECIFIED"));
    }

    #[test]
    fn test_rejects_malformed_input() {
        let parser = AvroParser::new();
        assert!(parser.parse("not json").is_err());
        assert!(parser.parse(r#""frobnicate""#).is_err());
        assert!(parser.parse(r#"{"type": "record", "name": "R"}"#).is_err());
        assert!(parser.parse(r#"{"type": "array"}"#).is_err());
        assert!(parser.parse("[]").is_err());
        assert!(parser.parse(r#"[["null"]]"#).is_err());
        assert!(parser.parse("42").is_err());
    }

    #[test]
    fn test_rejects_duplicate_fields_and_symbols() {
        let parser = AvroParser::new();
        let err = parser
            .parse(
                r#"{"type":"record","name":"R","fields":[{"name":"a","type":"int"},{"name":"a","type":"long"}]}"#,
            )
            .unwrap_err();
        assert!(err.to_string().contains("more than once"));

        assert!(parser
            .parse(r#"{"type":"enum","name":"E","symbols":["A","A"]}"#)
            .is_err());
    }

    #[test]
    fn test_rejects_bad_enum_default() {
        let parser = AvroParser::new();
        assert!(parser
            .parse(r#"{"type":"enum","name":"E","symbols":["A"],"default":"B"}"#)
            .is_err());
        assert!(parser
            .parse(r#"{"type":"enum","name":"E","symbols":["A"],"default":1}"#)
            .is_err());
    }

    #[test]
    fn test_name_validation() {
        let strict = AvroParser::new();
        assert!(strict.parse(r#"{"type":"enum","name":"2bad","symbols":["A"]}"#).is_err());
        assert!(strict
            .parse(r#"{"type":"record","name":"com.example.Order","fields":[]}"#)
            .is_ok());

        let lenient = AvroParser::with_limits(DEFAULT_MAX_SCHEMA_BYTES, false);
        assert!(lenient.parse(r#"{"type":"enum","name":"2bad","symbols":["A"]}"#).is_ok());
    }

    #[test]
    fn test_size_limit() {
        let parser = AvroParser::with_limits(16, true);
        let err = parser.parse(r#""this is much longer than sixteen bytes""#).unwrap_err();
        assert!(matches!(err, RegistryError::Parse(_)));

        let unlimited = AvroParser::with_limits(0, true);
        assert!(unlimited.parse(r#""string""#).is_ok());
    }
}
