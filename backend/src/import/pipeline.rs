//! Import pipeline.
//!
//! Combines every step of a contact import:
//! tokenizing, header resolution, row validation, aggregation and the
//! single batch insertion.
//!
//! # Example
//!
//! ```
//! use contactload::import::{import_text, ImportOptions};
//! use contactload::models::Owner;
//! use contactload::storage::MemoryStore;
//!
//! let store = MemoryStore::new();
//! let owner = Owner::new("user-123", "test@example.com");
//!
//! let summary = import_text(
//!     "Organisation,Description\nAcme Corp,A company\n,Empty org",
//!     &ImportOptions::default(),
//!     &owner,
//!     &store,
//! )?;
//!
//! assert_eq!(summary.imported, 1);
//! assert_eq!(summary.errors, vec!["Row 3: Organisation is empty"]);
//! # Ok::<(), contactload::error::PipelineError>(())
//! ```

use serde::{Deserialize, Serialize};

use super::upload::{Upload, UploadPolicy};
use crate::api::logs::{log_info, log_success, log_warning, log_warning_indent};
use crate::error::{ImportError, ImportResult, PipelineResult};
use crate::mapping::{resolve_required, FieldAliases};
use crate::models::{ColumnMapping, ImportSummary, NewContact, Owner, RowOutcome, ValidatedRecord};
use crate::parser::tokenize;
use crate::storage::ContactStore;
use crate::validation::validate_row;

/// Rejections echoed individually to the log before summarizing.
const LOGGED_REJECTIONS: usize = 5;

/// Options for an import run.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub aliases: FieldAliases,
    pub policy: UploadPolicy,
}

/// Outcome of the validation pass, before anything is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportPlan {
    /// Rows waiting for the batch insertion, in file order.
    pub accepted: Vec<ValidatedRecord>,
    /// `imported` stays 0 until the batch is stored.
    pub summary: ImportSummary,
    #[serde(skip)]
    pub mapping: ColumnMapping,
}

impl ImportPlan {
    fn record(&mut self, outcome: RowOutcome) {
        match outcome {
            RowOutcome::Accepted(record) => self.accepted.push(record),
            RowOutcome::Rejected { reason, .. } => {
                self.summary.skipped += 1;
                self.summary.errors.push(reason);
            }
        }
    }
}

/// Tokenize, resolve and validate without touching storage.
///
/// Fails only for whole-file problems: no rows at all, or no organisation
/// column. Row problems end up in `summary.errors`.
pub fn summarize(text: &str, aliases: &FieldAliases) -> ImportResult<ImportPlan> {
    let rows = tokenize(text);
    let (header, data) = rows.split_first().ok_or(ImportError::EmptyFile)?;

    let mapping = resolve_required(header, aliases)?;

    let mut plan = ImportPlan {
        mapping,
        ..ImportPlan::default()
    };

    // Header is row 1, so data row i is row i + 2
    for (i, row) in data.iter().enumerate() {
        plan.record(validate_row(row, &mapping, i + 2));
    }

    Ok(plan)
}

/// Import CSV text for `owner`.
///
/// Accepted rows are submitted to `store` as one batch; nothing is
/// submitted when no row was accepted. A storage failure is returned as an
/// error and nothing is reported as imported.
pub fn import_text<S>(
    text: &str,
    options: &ImportOptions,
    owner: &Owner,
    store: &S,
) -> PipelineResult<ImportSummary>
where
    S: ContactStore + ?Sized,
{
    log_info("📖 Reading CSV...");
    let plan = summarize(text, &options.aliases).map_err(|e| {
        log_warning(format!("Import rejected: {}", e));
        e
    })?;
    print_plan(&plan);

    let ImportPlan { accepted, mut summary, .. } = plan;

    if accepted.is_empty() {
        log_warning("No valid rows to import");
        return Ok(summary);
    }

    let batch: Vec<NewContact> = accepted
        .into_iter()
        .map(|record| NewContact::from_record(record, owner))
        .collect();
    let batch_size = batch.len();

    log_info(format!("💾 Storing {} contacts for {}...", batch_size, owner.id));
    store.insert_batch(owner, batch)?;
    summary.imported = batch_size;

    log_success(format!(
        "Imported {}, skipped {}",
        summary.imported, summary.skipped
    ));

    Ok(summary)
}

/// Gate, decode and import an uploaded file.
pub fn import_upload<S>(
    upload: &Upload,
    options: &ImportOptions,
    owner: &Owner,
    store: &S,
) -> PipelineResult<ImportSummary>
where
    S: ContactStore + ?Sized,
{
    log_info(format!(
        "📄 Upload: {} ({} bytes)",
        upload.file_name,
        upload.bytes.len()
    ));

    let decoded = options.policy.accept(upload)?;
    if decoded.encoding != "utf-8" {
        log_warning(format!("Decoded as {}", decoded.encoding));
    }

    import_text(&decoded.text, options, owner, store)
}

fn print_plan(plan: &ImportPlan) {
    let rows = plan.accepted.len() + plan.summary.skipped;
    log_success(format!("Read {} data rows", rows));

    if let Some(col) = plan.mapping.primary {
        log_info(format!("Organisation → column {}", col + 1));
    }
    match plan.mapping.note {
        Some(col) => log_info(format!("Description → column {}", col + 1)),
        None => log_info("No description column"),
    }

    if plan.summary.skipped > 0 {
        log_warning(format!("{} rows skipped", plan.summary.skipped));
        for reason in plan.summary.errors.iter().take(LOGGED_REJECTIONS) {
            log_warning_indent(reason.clone(), 1);
        }
        if plan.summary.errors.len() > LOGGED_REJECTIONS {
            log_warning_indent(
                format!("... and {} more", plan.summary.errors.len() - LOGGED_REJECTIONS),
                1,
            );
        }
    }
}
