//! Per-row business rules.
//!
//! Each non-blank data row is classified as accepted (with a cleaned
//! [`ValidatedRecord`]) or rejected with a human-readable reason. Rejections
//! are values, not errors: the aggregator collects all of them.
//!
//! # Rules
//!
//! 1. Organisation is read from the mapped column (missing ⇒ empty) and trimmed.
//! 2. An empty organisation is rejected.
//! 3. An organisation longer than [`MAX_ORGANISATION_LEN`] characters is
//!    rejected with a [`PREVIEW_LEN`]-character preview.
//! 4. Description is trimmed; blank or unmapped becomes `None`.
//!
//! # Example
//!
//! ```
//! use contactload::models::{ColumnMapping, RowOutcome};
//! use contactload::validation::validate_row;
//!
//! let mapping = ColumnMapping { primary: Some(0), note: Some(1) };
//! let row = vec!["".to_string(), "Empty org".to_string()];
//!
//! match validate_row(&row, &mapping, 2) {
//!     RowOutcome::Rejected { reason, .. } => assert_eq!(reason, "Row 2: Organisation is empty"),
//!     RowOutcome::Accepted(_) => unreachable!(),
//! }
//! ```

use crate::error::ContactError;
use crate::models::{ColumnMapping, RowOutcome, ValidatedRecord};
use crate::parser::trim_cell;

/// Maximum organisation length, in characters.
pub const MAX_ORGANISATION_LEN: usize = 255;

/// Characters of an over-long organisation quoted in the error.
pub const PREVIEW_LEN: usize = 30;

/// Classify one data row. `row_number` is 1-based with the header as row 1.
pub fn validate_row(row: &[String], mapping: &ColumnMapping, row_number: usize) -> RowOutcome {
    let organisation = cell(row, mapping.primary);

    if let Err(err) = validate_organisation(organisation) {
        let reason = match err {
            ContactError::OrganisationRequired => {
                format!("Row {}: Organisation is empty", row_number)
            }
            ContactError::OrganisationTooLong { max } => format!(
                "Row {}: Organisation \"{}...\" exceeds {} characters",
                row_number,
                preview(organisation),
                max
            ),
        };
        return RowOutcome::Rejected { row: row_number, reason };
    }

    RowOutcome::Accepted(ValidatedRecord {
        organisation: organisation.to_string(),
        description: optional_text(cell(row, mapping.note)),
    })
}

/// Check a trimmed organisation value.
pub fn validate_organisation(organisation: &str) -> Result<(), ContactError> {
    if organisation.is_empty() {
        return Err(ContactError::OrganisationRequired);
    }
    if organisation.chars().count() > MAX_ORGANISATION_LEN {
        return Err(ContactError::OrganisationTooLong { max: MAX_ORGANISATION_LEN });
    }
    Ok(())
}

/// Trim free text, mapping blank to `None`.
pub fn optional_text(value: &str) -> Option<String> {
    let trimmed = trim_cell(value);
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Trimmed cell at `index`; absent column or short row reads as empty.
fn cell(row: &[String], index: Option<usize>) -> &str {
    index
        .and_then(|i| row.get(i))
        .map(|s| trim_cell(s))
        .unwrap_or("")
}

fn preview(value: &str) -> &str {
    match value.char_indices().nth(PREVIEW_LEN) {
        Some((end, _)) => &value[..end],
        None => value,
    }
}
