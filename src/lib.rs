//! Schema Registry
//!
//! An in-memory, thread-safe schema registry for managing versioned schemas
//! grouped under named subjects, with compatibility enforcement between
//! consecutive versions.
//!
//! ## Features
//!
//! - **Append-Only Versioning**: Each subject holds a contiguous 1-based
//!   version ledger that is never rewritten
//! - **Content Deduplication**: Re-registering a schema a subject already
//!   holds returns the existing record, keyed by SHA256 of the canonical form
//! - **Compatibility Enforcement**: NONE, BACKWARD, FORWARD, and FULL levels,
//!   checked against the latest version before a registration is accepted
//! - **Typed Schema Model**: Submitted sources parse to a closed set of
//!   schema variants the checker walks structurally
//! - **Thread Safety**: One reader-writer lock over the whole registry keeps
//!   ids and versions gap-free under concurrent writers
//!
//! ## Architecture
//!
//! ```text
//! SchemaRegistry
//! ├── subjects
//! │   ├── "order-events"
//! │   │   ├── v1 -> id 1  (fingerprint a3f1...)
//! │   │   ├── v2 -> id 4  (fingerprint 09dc...)
//! │   │   └── policy: BACKWARD (default)
//! │   └── "user-profile"
//! │       ├── v1 -> id 2
//! │       └── policy: FULL (override)
//! └── schemas by id: 1, 2, 4, ...
//! ```

pub mod registry;
pub mod schema;
pub mod parser;
pub mod compatibility;
pub mod fingerprint;
pub mod config;
pub mod error;

pub use registry::{RegistryStats, SchemaRecord, SchemaReference, SchemaRegistry};
pub use schema::{
    EnumSchema, ParsedSchema, PrimitiveType, RecordField, RecordSchema, SchemaKind,
};
pub use parser::{AvroParser, SchemaParser};
pub use compatibility::{CompatibilityLevel, CompatibilityReport, Violation, ViolationRule};
pub use fingerprint::Fingerprint;
pub use config::RegistryConfig;
pub use error::{RegistryError, Result};
