//! Schema Registry
//!
//! Manages subjects, their append-only version ledgers, and compatibility
//! enforcement between consecutive versions. Schema ids are global and
//! monotonic; versions are 1-based positions within a subject's ledger and are
//! never reused or reordered. All state sits behind a single
//! [`parking_lot::RwLock`], and registration holds the write lock for its whole
//! parse-check-commit sequence so ids and versions stay gap-free under
//! concurrent writers.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::compatibility::{self, CompatibilityLevel, CompatibilityReport};
use crate::config::RegistryConfig;
use crate::error::{RegistryError, Result};
use crate::fingerprint::Fingerprint;
use crate::parser::{AvroParser, SchemaParser};
use crate::schema::ParsedSchema;

/// A named pointer from one registered schema to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaReference {
    /// Name the referencing schema uses for the target
    pub name: String,
    /// Subject the target schema is registered under
    pub subject: String,
    /// Version of the target schema within its subject
    pub version: u32,
}

/// An accepted schema together with its registration metadata
#[derive(Debug, Clone, Serialize)]
pub struct SchemaRecord {
    /// Globally unique id, assigned at registration and never reused
    pub id: u32,
    /// Subject this schema was registered under
    pub subject: String,
    /// 1-based position in the subject's ledger
    pub version: u32,
    /// Schema source exactly as submitted
    pub source: String,
    /// Typed form the source parsed to
    #[serde(skip_serializing)]
    pub parsed: ParsedSchema,
    /// Fingerprint of the canonical form
    pub fingerprint: Fingerprint,
    /// When the registration was accepted
    pub created_at: DateTime<Utc>,
    /// Schemas this one depends on
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<SchemaReference>,
}

/// Point-in-time counters over the registry
#[derive(Debug, Clone, Serialize)]
pub struct RegistryStats {
    /// Number of accepted schemas across all subjects
    pub total_schemas: usize,
    /// Number of subjects with at least one version
    pub total_subjects: usize,
    /// Id the next accepted schema will receive
    pub next_schema_id: u32,
    /// Version count per subject
    pub subjects: BTreeMap<String, usize>,
}

/// Everything guarded by the registry lock
struct RegistryState {
    /// All accepted schemas by id
    schemas: HashMap<u32, Arc<SchemaRecord>>,
    /// Append-only id ledger per subject; position + 1 is the version
    ledgers: HashMap<String, Vec<u32>>,
    /// Per-subject compatibility overrides
    levels: HashMap<String, CompatibilityLevel>,
    /// Next id to assign, starting at 1
    next_id: u32,
}

impl RegistryState {
    fn new() -> Self {
        Self {
            schemas: HashMap::new(),
            ledgers: HashMap::new(),
            levels: HashMap::new(),
            next_id: 1,
        }
    }
}

/// The main schema registry
pub struct SchemaRegistry {
    /// Subjects, records, and policies under one lock
    state: RwLock<RegistryState>,
    /// Parser every submitted source goes through
    parser: Box<dyn SchemaParser>,
    /// Level used for subjects without an override
    default_level: CompatibilityLevel,
}

impl SchemaRegistry {
    /// Create an empty registry with the stock Avro parser and BACKWARD as
    /// the default compatibility level
    pub fn new() -> Self {
        Self::with_parser(Box::new(AvroParser::new()))
    }

    /// Create an empty registry around a caller-supplied parser
    pub fn with_parser(parser: Box<dyn SchemaParser>) -> Self {
        Self {
            state: RwLock::new(RegistryState::new()),
            parser,
            default_level: CompatibilityLevel::default(),
        }
    }

    /// Create an empty registry from loaded configuration
    pub fn with_config(config: &RegistryConfig) -> Self {
        let parser = AvroParser::with_limits(
            config.validation.max_schema_bytes,
            config.validation.strict_names,
        );
        Self {
            state: RwLock::new(RegistryState::new()),
            parser: Box::new(parser),
            default_level: config.registry.default_compatibility,
        }
    }

    /// Register a schema under a subject
    ///
    /// Re-submitting a schema the subject already holds (same fingerprint)
    /// returns the existing record without creating a new version. Otherwise
    /// the schema must pass the subject's compatibility check against the
    /// latest version before it is assigned an id and appended to the ledger.
    /// The first version of a subject is accepted unconditionally.
    pub fn register_schema(&self, subject: &str, source: &str) -> Result<Arc<SchemaRecord>> {
        self.register_schema_with_references(subject, source, Vec::new())
    }

    /// Register a schema that depends on other registered schemas
    pub fn register_schema_with_references(
        &self,
        subject: &str,
        source: &str,
        references: Vec<SchemaReference>,
    ) -> Result<Arc<SchemaRecord>> {
        validate_subject(subject)?;

        let mut state = self.state.write();

        let parsed = self.parser.parse(source)?;
        let fingerprint = Fingerprint::of_schema(&parsed);

        // Idempotent re-registration, checked before any compatibility work
        if let Some(existing) = find_by_fingerprint(&state, subject, &fingerprint) {
            debug!(
                "Schema for subject '{}' already registered as version {} (id={})",
                subject, existing.version, existing.id
            );
            return Ok(existing);
        }

        if let Some(latest) = latest(&state, subject) {
            let level = level_for(&state, subject, self.default_level);
            let report = compatibility::check(&latest.parsed, &parsed, level);
            if !report.is_compatible {
                warn!(
                    "Rejected schema for subject '{}': incompatible with version {} under {} compatibility",
                    subject, latest.version, level
                );
                return Err(RegistryError::Incompatible {
                    subject: subject.to_string(),
                    latest_id: latest.id,
                    latest_version: latest.version,
                    level,
                    report,
                });
            }
        }

        let id = state.next_id;
        let ledger = state.ledgers.entry(subject.to_string()).or_default();
        let version = ledger.len() as u32 + 1;
        ledger.push(id);

        let record = Arc::new(SchemaRecord {
            id,
            subject: subject.to_string(),
            version,
            source: source.to_string(),
            parsed,
            fingerprint,
            created_at: Utc::now(),
            references,
        });
        state.schemas.insert(id, Arc::clone(&record));
        state.next_id += 1;

        info!(
            "Registered schema for subject '{}' version {} (id={})",
            subject, version, id
        );
        Ok(record)
    }

    /// Get a schema by its globally unique id
    pub fn get_schema(&self, id: u32) -> Result<Arc<SchemaRecord>> {
        let state = self.state.read();
        state
            .schemas
            .get(&id)
            .cloned()
            .ok_or(RegistryError::SchemaNotFound(id))
    }

    /// Get the latest version registered under a subject
    pub fn get_latest_schema(&self, subject: &str) -> Result<Arc<SchemaRecord>> {
        let state = self.state.read();
        latest(&state, subject).ok_or_else(|| RegistryError::SubjectNotFound(subject.to_string()))
    }

    /// Get a specific version of a subject
    pub fn get_schema_version(&self, subject: &str, version: u32) -> Result<Arc<SchemaRecord>> {
        let state = self.state.read();
        let ledger = state
            .ledgers
            .get(subject)
            .ok_or_else(|| RegistryError::SubjectNotFound(subject.to_string()))?;
        if version == 0 || version as usize > ledger.len() {
            return Err(RegistryError::InvalidVersion {
                subject: subject.to_string(),
                version,
                max: ledger.len() as u32,
            });
        }
        let id = ledger[version as usize - 1];
        state
            .schemas
            .get(&id)
            .cloned()
            .ok_or(RegistryError::SchemaNotFound(id))
    }

    /// All subjects with at least one registered version, sorted by name
    ///
    /// Subjects that only carry a compatibility override do not appear here.
    pub fn list_subjects(&self) -> Vec<String> {
        let state = self.state.read();
        let mut subjects: Vec<String> = state.ledgers.keys().cloned().collect();
        subjects.sort();
        subjects
    }

    /// All version numbers registered under a subject, in ascending order
    pub fn list_versions(&self, subject: &str) -> Result<Vec<u32>> {
        let state = self.state.read();
        let ledger = state
            .ledgers
            .get(subject)
            .ok_or_else(|| RegistryError::SubjectNotFound(subject.to_string()))?;
        Ok((1..=ledger.len() as u32).collect())
    }

    /// Set the compatibility level for a subject
    ///
    /// Takes effect for the next registration only; already accepted versions
    /// are never re-checked. The subject does not have to exist yet, so a
    /// policy can be put in place before the first schema arrives.
    pub fn set_compatibility_level(&self, subject: &str, level: CompatibilityLevel) -> Result<()> {
        validate_subject(subject)?;
        let mut state = self.state.write();
        state.levels.insert(subject.to_string(), level);
        info!("Set compatibility level for subject '{}' to {}", subject, level);
        Ok(())
    }

    /// The level a registration against this subject would run under,
    /// falling back to the registry default when no override is set
    pub fn get_compatibility_level(&self, subject: &str) -> CompatibilityLevel {
        let state = self.state.read();
        level_for(&state, subject, self.default_level)
    }

    /// Dry-run a registration: report what the compatibility check would say
    /// without changing any state
    ///
    /// A subject with no versions yet reports compatible, matching the
    /// unconditional acceptance of a first registration.
    pub fn check_compatibility(&self, subject: &str, source: &str) -> Result<CompatibilityReport> {
        validate_subject(subject)?;
        let state = self.state.read();
        let parsed = self.parser.parse(source)?;
        let level = level_for(&state, subject, self.default_level);
        match latest(&state, subject) {
            Some(latest) => Ok(compatibility::check(&latest.parsed, &parsed, level)),
            None => Ok(CompatibilityReport::compatible(level)),
        }
    }

    /// Point-in-time counters over the registry
    pub fn stats(&self) -> RegistryStats {
        let state = self.state.read();
        let subjects: BTreeMap<String, usize> = state
            .ledgers
            .iter()
            .map(|(subject, ledger)| (subject.clone(), ledger.len()))
            .collect();
        RegistryStats {
            total_schemas: state.schemas.len(),
            total_subjects: state.ledgers.len(),
            next_schema_id: state.next_id,
            subjects,
        }
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Latest record for a subject, if any version exists
fn latest(state: &RegistryState, subject: &str) -> Option<Arc<SchemaRecord>> {
    let id = state.ledgers.get(subject)?.last()?;
    state.schemas.get(id).cloned()
}

/// Record under a subject with a matching fingerprint, if one exists
fn find_by_fingerprint(
    state: &RegistryState,
    subject: &str,
    fingerprint: &Fingerprint,
) -> Option<Arc<SchemaRecord>> {
    state.ledgers.get(subject)?.iter().find_map(|id| {
        let record = state.schemas.get(id)?;
        if record.fingerprint == *fingerprint {
            Some(Arc::clone(record))
        } else {
            None
        }
    })
}

fn level_for(state: &RegistryState, subject: &str, default: CompatibilityLevel) -> CompatibilityLevel {
    state.levels.get(subject).copied().unwrap_or(default)
}

fn validate_subject(subject: &str) -> Result<()> {
    if subject.trim().is_empty() {
        return Err(RegistryError::InvalidSubject(
            "name cannot be empty or blank".to_string(),
        ));
    }
    Ok(())
}
