//! # Contactload - CSV import and export for contact records
//!
//! Contactload ingests user-uploaded CSV files of organisation contacts,
//! keeps the rows that validate, reports the ones that don't, and exports
//! stored contacts back to CSV.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Upload    │────▶│  Tokenizer  │────▶│  Resolver + │────▶│   Summary   │
//! │ (gate+enc)  │     │  (quotes)   │     │  Validator  │     │  + Store    │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use contactload::{import_text, ImportOptions, MemoryStore, Owner};
//!
//! let store = MemoryStore::new();
//! let owner = Owner::new("u1", "u1@example.com");
//! let text = "Organisation,Description\nAcme,Supplier\n,orphan";
//!
//! let summary = import_text(text, &ImportOptions::default(), &owner, &store).unwrap();
//! assert_eq!(summary.imported, 1);
//! assert_eq!(summary.skipped, 1);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Rows, records, summaries and contacts
//! - [`parser`] - CSV tokenizing and encoding detection
//! - [`mapping`] - Header alias resolution
//! - [`validation`] - Per-row validation
//! - [`import`] - Upload gating and the import pipeline
//! - [`export`] - CSV serialization
//! - [`storage`] - Contact stores
//! - [`contacts`] - Create / list / export operations
//! - [`config`] - Environment configuration
//! - [`api`] - HTTP API server

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Parsing
pub mod mapping;
pub mod parser;

// Validation
pub mod validation;

// Import / export
pub mod export;
pub mod import;

// Persistence
pub mod contacts;
pub mod storage;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError,
    ContactError,
    ImportError,
    PipelineError,
    ServerError,
    StorageError,
    UploadError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    ColumnMapping,
    Contact,
    ImportSummary,
    NewContact,
    Owner,
    RawRow,
    RowOutcome,
    ValidatedRecord,
};

// =============================================================================
// Re-exports - Parsing and mapping
// =============================================================================

pub use parser::{decode_content, decode_upload, detect_encoding, tokenize, DecodedText};
pub use mapping::{resolve, resolve_required, FieldAliases};
pub use validation::validate_row;

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use import::{
    import_text,
    import_upload,
    summarize,
    ImportOptions,
    ImportPlan,
    Upload,
    UploadPolicy,
};

pub use export::{escape_field, export_contacts};
pub use storage::{ContactPage, ContactQuery, ContactStore, JsonFileStore, MemoryStore};
pub use config::ServerConfig;

// Server
pub mod server {
    pub use crate::api::server::{router, start_server, AppState};
}
