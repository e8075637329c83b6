//! Compatibility checking between schema versions
//!
//! Direction is fixed by which side reads. FORWARD means data written under the
//! old schema stays readable with the new one (the new schema is the reader).
//! BACKWARD means data written under the new schema stays readable with the old
//! one (the old schema is the reader). FULL requires both. Checks are state-free
//! functions over two parsed schemas; the registry decides which versions they
//! run against.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::{ParsedSchema, PrimitiveType};

/// Compatibility policy for a subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompatibilityLevel {
    /// No constraint between versions
    None,
    /// Data written under the previous schema stays readable with the new one
    Forward,
    /// Data written under the new schema stays readable with the previous one
    #[default]
    Backward,
    /// Both forward and backward
    Full,
}

impl CompatibilityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompatibilityLevel::None => "NONE",
            CompatibilityLevel::Forward => "FORWARD",
            CompatibilityLevel::Backward => "BACKWARD",
            CompatibilityLevel::Full => "FULL",
        }
    }
}

impl fmt::Display for CompatibilityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rule violated by an incompatible transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationRule {
    /// Reader and writer types differ with no allowed promotion
    TypeMismatch,
    /// Named types (record, enum) with different names
    NameMismatch,
    /// Reader field absent from the writer and declared without a default
    MissingDefault,
    /// Writer symbols unknown to a reader that declares no fallback symbol
    MissingSymbolFallback,
    /// No reader union branch can resolve the writer schema
    NoMatchingUnionBranch,
}

/// A single compatibility violation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    /// Rule that was violated
    pub rule: ViolationRule,
    /// Dotted field path to the offending element; empty at the schema root
    pub path: String,
    /// Reader-side type or symbols, where applicable
    pub reader: Option<String>,
    /// Writer-side type or symbols, where applicable
    pub writer: Option<String>,
    /// Human-readable description
    pub description: String,
}

/// Result of a compatibility check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompatibilityReport {
    /// Whether the transition is allowed under the checked level
    pub is_compatible: bool,
    /// Level the check ran under
    pub level: CompatibilityLevel,
    /// Violations found; empty when compatible
    pub violations: Vec<Violation>,
}

impl CompatibilityReport {
    pub fn compatible(level: CompatibilityLevel) -> Self {
        Self {
            is_compatible: true,
            level,
            violations: Vec::new(),
        }
    }

    pub fn incompatible(level: CompatibilityLevel, violations: Vec<Violation>) -> Self {
        Self {
            is_compatible: false,
            level,
            violations,
        }
    }

    /// One-line summary of the outcome
    pub fn summary(&self) -> String {
        if self.is_compatible {
            format!("compatible under {}", self.level)
        } else {
            self.violations
                .iter()
                .map(|v| v.description.as_str())
                .collect::<Vec<_>>()
                .join("; ")
        }
    }
}

impl fmt::Display for CompatibilityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Check whether replacing `old` with `new` is allowed under `level`.
///
/// Identical canonical forms pass at every level before any structural work;
/// so does `NONE`, unconditionally.
pub fn check(old: &ParsedSchema, new: &ParsedSchema, level: CompatibilityLevel) -> CompatibilityReport {
    if level == CompatibilityLevel::None {
        return CompatibilityReport::compatible(level);
    }
    if old.canonical() == new.canonical() {
        return CompatibilityReport::compatible(level);
    }

    let mut violations = Vec::new();
    if matches!(level, CompatibilityLevel::Forward | CompatibilityLevel::Full) {
        // New schema reads data written under the old one
        can_read(new, old, "", &mut violations);
    }
    if matches!(level, CompatibilityLevel::Backward | CompatibilityLevel::Full) {
        // Old schema reads data written under the new one
        can_read(old, new, "", &mut violations);
    }

    if violations.is_empty() {
        CompatibilityReport::compatible(level)
    } else {
        CompatibilityReport::incompatible(level, violations)
    }
}

/// Record every reason `reader` cannot read data written with `writer`.
fn can_read(
    reader: &ParsedSchema,
    writer: &ParsedSchema,
    path: &str,
    violations: &mut Vec<Violation>,
) {
    match (reader, writer) {
        (ParsedSchema::Primitive(r), ParsedSchema::Primitive(w)) => {
            if r != w && !promotable(*w, *r) {
                violations.push(Violation {
                    rule: ViolationRule::TypeMismatch,
                    path: path.to_string(),
                    reader: Some(r.name().to_string()),
                    writer: Some(w.name().to_string()),
                    description: format!(
                        "reader type {} cannot read writer type {} at {}",
                        r,
                        w,
                        display_path(path)
                    ),
                });
            }
        }
        (ParsedSchema::Record(r), ParsedSchema::Record(w)) => {
            if r.name != w.name {
                violations.push(Violation {
                    rule: ViolationRule::NameMismatch,
                    path: path.to_string(),
                    reader: Some(r.name.clone()),
                    writer: Some(w.name.clone()),
                    description: format!(
                        "record name mismatch at {}: reader is '{}', writer is '{}'",
                        display_path(path),
                        r.name,
                        w.name
                    ),
                });
                return;
            }
            for reader_field in &r.fields {
                let field_path = join_path(path, &reader_field.name);
                match w.field(&reader_field.name) {
                    Some(writer_field) => {
                        can_read(&reader_field.schema, &writer_field.schema, &field_path, violations);
                    }
                    None if reader_field.default.is_none() => {
                        violations.push(Violation {
                            rule: ViolationRule::MissingDefault,
                            path: field_path.clone(),
                            reader: Some(type_label(&reader_field.schema)),
                            writer: None,
                            description: format!(
                                "field '{}' of record '{}' has no default and is absent from the writer schema",
                                field_path, r.name
                            ),
                        });
                    }
                    // Absent but defaulted: the reader fills it in
                    None => {}
                }
            }
            // Writer-only fields are skipped by the reader
        }
        (ParsedSchema::Enum(r), ParsedSchema::Enum(w)) => {
            if r.name != w.name {
                violations.push(Violation {
                    rule: ViolationRule::NameMismatch,
                    path: path.to_string(),
                    reader: Some(r.name.clone()),
                    writer: Some(w.name.clone()),
                    description: format!(
                        "enum name mismatch at {}: reader is '{}', writer is '{}'",
                        display_path(path),
                        r.name,
                        w.name
                    ),
                });
                return;
            }
            let unknown: Vec<&str> = w
                .symbols
                .iter()
                .filter(|s| !r.has_symbol(s))
                .map(String::as_str)
                .collect();
            if !unknown.is_empty() && r.default.is_none() {
                violations.push(Violation {
                    rule: ViolationRule::MissingSymbolFallback,
                    path: path.to_string(),
                    reader: Some(r.symbols.join(",")),
                    writer: Some(unknown.join(",")),
                    description: format!(
                        "enum '{}' at {} may carry symbols [{}] the reader does not declare, and the reader has no fallback symbol",
                        w.name,
                        display_path(path),
                        unknown.join(", ")
                    ),
                });
            }
        }
        (ParsedSchema::Array { items: r }, ParsedSchema::Array { items: w }) => {
            can_read(r, w, &join_path(path, "items"), violations);
        }
        (ParsedSchema::Map { values: r }, ParsedSchema::Map { values: w }) => {
            can_read(r, w, &join_path(path, "values"), violations);
        }
        (ParsedSchema::Union { branches: r }, ParsedSchema::Union { branches: w }) => {
            for writer_branch in w {
                if !some_branch_reads(r, writer_branch) {
                    violations.push(Violation {
                        rule: ViolationRule::NoMatchingUnionBranch,
                        path: path.to_string(),
                        reader: Some("union".to_string()),
                        writer: Some(type_label(writer_branch)),
                        description: format!(
                            "no branch of the reader union at {} can read writer branch {}",
                            display_path(path),
                            type_label(writer_branch)
                        ),
                    });
                }
            }
        }
        (ParsedSchema::Union { branches: r }, w) => {
            if !some_branch_reads(r, w) {
                violations.push(Violation {
                    rule: ViolationRule::NoMatchingUnionBranch,
                    path: path.to_string(),
                    reader: Some("union".to_string()),
                    writer: Some(type_label(w)),
                    description: format!(
                        "no branch of the reader union at {} can read writer type {}",
                        display_path(path),
                        type_label(w)
                    ),
                });
            }
        }
        (r, ParsedSchema::Union { branches: w }) => {
            // Every writer branch must resolve against the single reader type
            for writer_branch in w {
                can_read(r, writer_branch, path, violations);
            }
        }
        (r, w) => {
            violations.push(Violation {
                rule: ViolationRule::TypeMismatch,
                path: path.to_string(),
                reader: Some(type_label(r)),
                writer: Some(type_label(w)),
                description: format!(
                    "reader type {} cannot read writer type {} at {}",
                    type_label(r),
                    type_label(w),
                    display_path(path)
                ),
            });
        }
    }
}

/// Whether any reader branch resolves the writer schema without violations
fn some_branch_reads(reader_branches: &[ParsedSchema], writer: &ParsedSchema) -> bool {
    reader_branches.iter().any(|branch| {
        let mut probe = Vec::new();
        can_read(branch, writer, "", &mut probe);
        probe.is_empty()
    })
}

/// Writer-to-reader primitive promotions, per Avro resolution rules
fn promotable(writer: PrimitiveType, reader: PrimitiveType) -> bool {
    use PrimitiveType::*;
    matches!(
        (writer, reader),
        (Int, Long)
            | (Int, Float)
            | (Int, Double)
            | (Long, Float)
            | (Long, Double)
            | (Float, Double)
            | (String, Bytes)
            | (Bytes, String)
    )
}

fn type_label(schema: &ParsedSchema) -> String {
    match schema.name() {
        Some(name) => format!("{} '{}'", schema.kind(), name),
        None => schema.kind().to_string(),
    }
}

fn join_path(path: &str, segment: &str) -> String {
    if path.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", path, segment)
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "the schema root"
    } else {
        path
    }
}
