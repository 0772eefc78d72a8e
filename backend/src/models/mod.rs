//! Domain models for the contact import/export pipeline.
//!
//! This module contains the core data structures used throughout the pipeline:
//!
//! - [`RawRow`] - One tokenized CSV row
//! - [`ColumnMapping`] - Header positions of the logical fields
//! - [`ValidatedRecord`] - A row that passed every check
//! - [`RowOutcome`] - Accepted record or rejection reason for one row
//! - [`ImportSummary`] - Counts and reasons returned to the caller
//! - [`Owner`], [`NewContact`], [`Contact`] - Storage-facing records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Parsing
// =============================================================================

/// Ordered fields of a single logical CSV record.
///
/// Rows are not normalized to the header width; index defensively.
pub type RawRow = Vec<String>;

/// Zero-based column positions of the logical fields, `None` when absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ColumnMapping {
    /// Organisation column.
    pub primary: Option<usize>,
    /// Description column.
    pub note: Option<usize>,
}

// =============================================================================
// Validation
// =============================================================================

/// A row that passed every validation rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedRecord {
    /// Trimmed, non-empty, at most 255 characters.
    pub organisation: String,
    /// Trimmed description, `None` when blank or unmapped.
    pub description: Option<String>,
}

/// Verdict for one non-blank data row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Accepted(ValidatedRecord),
    Rejected {
        /// 1-based row number, header is row 1.
        row: usize,
        reason: String,
    },
}

impl RowOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, RowOutcome::Accepted(_))
    }
}

/// Statistics returned after an import.
///
/// Field names are part of the contract with the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

impl ImportSummary {
    /// Number of non-blank data rows this summary accounts for.
    pub fn rows_processed(&self) -> usize {
        self.imported + self.skipped
    }
}

// =============================================================================
// Storage
// =============================================================================

/// The authenticated caller, as handed over by the upstream authenticator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub is_superuser: bool,
}

impl Owner {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            full_name: None,
            is_superuser: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.full_name = Some(name.into());
        self
    }

    pub fn superuser(mut self) -> Self {
        self.is_superuser = true;
        self
    }
}

/// A contact waiting to be inserted, tagged with its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContact {
    pub organisation: String,
    pub description: Option<String>,
    pub owner_id: String,
}

impl NewContact {
    pub fn from_record(record: ValidatedRecord, owner: &Owner) -> Self {
        Self {
            organisation: record.organisation,
            description: record.description,
            owner_id: owner.id.clone(),
        }
    }
}

/// A persisted contact.
///
/// Owner email and name are captured at insert time so exports don't need
/// a separate user lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: Uuid,
    pub organisation: String,
    pub description: Option<String>,
    pub owner_id: String,
    pub owner_email: String,
    #[serde(default)]
    pub owner_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Contact {
    /// Materialize a pending contact for `owner` at `created_at`.
    pub fn from_new(new: NewContact, owner: &Owner, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            organisation: new.organisation,
            description: new.description,
            owner_id: new.owner_id,
            owner_email: owner.email.clone(),
            owner_name: owner.full_name.clone(),
            created_at,
        }
    }
}
