//! Field catalog, resolver and mapping session for audience data schemas
//!
//! `audience-fields` decides which data fields an audience export may carry
//! for a given `(service, use case, target schema)` context, which of them are
//! required, and which are mapped by default. A [`FieldSchema`] session then
//! lets the user rearrange that mapping without ever losing a required field.
//!
//! # Architecture
//!
//! - **Catalog**: static field metadata plus per-service defaults and
//!   per-combination required rules, extendable through [`FieldsConfig`]
//! - **Resolver**: pure functions from catalog and context to field lists
//! - **Schema**: the stateful mapping session, persisted through a
//!   [`SnapshotStore`]
//! - **Hints**: tutorial flags with at most one hint visible at a time
//!
//! ```
//! use std::sync::Arc;
//! use audience_fields::{FieldCatalog, FieldContext, FieldSchema};
//!
//! let catalog = Arc::new(FieldCatalog::builtin());
//! let schema = FieldSchema::new(catalog, FieldContext::new("mailchimp", "email", "b2b"));
//! assert!(schema.validate_rows().is_valid);
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod hints;
pub mod resolver;
pub mod schema;
pub mod store;
pub mod types;

pub use catalog::{FieldCatalog, FieldCatalogBuilder, RequiredRule, DEFAULT_SERVICE};
pub use config::FieldsConfig;
pub use error::{FieldsError, Result};
pub use hints::{HintBoard, HintState};
pub use resolver::{available_fields, default_rows_for_service, humanize_key, required_fields};
pub use schema::{FieldSchema, SchemaSnapshot};
pub use store::{JsonFileStore, MemoryStore, SnapshotStore};
pub use types::{
    CustomRow, FieldCategory, FieldContext, FieldSpec, FieldType, Membership, ResolvedField, Row,
    RowValidation, TargetSchema, UseCase,
};
