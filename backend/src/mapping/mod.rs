//! Header resolution.
//!
//! Maps a parsed header row to the logical fields (organisation,
//! description) through ordered alias lists. Matching is exact after
//! normalization (trim + lowercase), aliases are tried in priority order
//! and the leftmost matching header cell wins for a given alias.

use crate::error::ImportError;
use crate::models::ColumnMapping;
use crate::parser::trim_cell;

/// Organisation aliases, highest priority first.
pub const ORGANISATION_ALIASES: &[&str] = &["organisation", "organization", "org", "company", "name"];

/// Description aliases, highest priority first.
pub const DESCRIPTION_ALIASES: &[&str] = &["description", "desc", "notes", "note"];

/// Alias groups for the two logical fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAliases {
    pub organisation: Vec<String>,
    pub description: Vec<String>,
}

impl Default for FieldAliases {
    fn default() -> Self {
        Self {
            organisation: ORGANISATION_ALIASES.iter().map(|s| s.to_string()).collect(),
            description: DESCRIPTION_ALIASES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl FieldAliases {
    /// The error raised when no organisation alias is present.
    ///
    /// Lists every alias but the canonical first one, which the message
    /// already names.
    pub fn missing_organisation(&self) -> ImportError {
        let aliases = self
            .organisation
            .iter()
            .skip(1)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        ImportError::MissingOrganisationColumn { aliases }
    }
}

/// Normalize a header cell for comparison.
///
/// Strips a stray byte-order mark along with surrounding whitespace.
pub fn normalize_header(cell: &str) -> String {
    trim_cell(cell).to_lowercase()
}

/// Find the column matching the first alias present in the header.
///
/// Aliases are normalized the same way as header cells.
pub fn find_column_index<S: AsRef<str>>(header: &[String], aliases: &[S]) -> Option<usize> {
    let normalized: Vec<String> = header.iter().map(|h| normalize_header(h)).collect();

    aliases.iter().find_map(|alias| {
        let alias = normalize_header(alias.as_ref());
        normalized.iter().position(|cell| *cell == alias)
    })
}

/// Resolve both logical fields against a header row.
///
/// Groups are resolved independently, so one column may satisfy both.
pub fn resolve(header: &[String], aliases: &FieldAliases) -> ColumnMapping {
    ColumnMapping {
        primary: find_column_index(header, &aliases.organisation),
        note: find_column_index(header, &aliases.description),
    }
}

/// Resolve the header and fail when there is no organisation column.
pub fn resolve_required(header: &[String], aliases: &FieldAliases) -> Result<ColumnMapping, ImportError> {
    let mapping = resolve(header, aliases);
    if mapping.primary.is_none() {
        return Err(aliases.missing_organisation());
    }
    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_canonical_names() {
        let mapping = resolve(&header(&["Organisation", "Description"]), &FieldAliases::default());
        assert_eq!(mapping, ColumnMapping { primary: Some(0), note: Some(1) });
    }

    #[test]
    fn test_each_organisation_alias() {
        for &alias in ORGANISATION_ALIASES {
            let mapping = resolve(&header(&["email", alias]), &FieldAliases::default());
            assert_eq!(mapping.primary, Some(1), "alias {alias}");
        }
    }

    #[test]
    fn test_each_description_alias() {
        for &alias in DESCRIPTION_ALIASES {
            let mapping = resolve(&header(&["org", alias]), &FieldAliases::default());
            assert_eq!(mapping.note, Some(1), "alias {alias}");
        }
    }

    #[test]
    fn test_case_insensitive_and_trimmed() {
        let mapping = resolve(&header(&["  ORGANISATION ", "DeScRiPtIoN"]), &FieldAliases::default());
        assert_eq!(mapping, ColumnMapping { primary: Some(0), note: Some(1) });
    }

    #[test]
    fn test_byte_order_mark_stripped() {
        let mapping = resolve(&header(&["\u{feff}Organisation"]), &FieldAliases::default());
        assert_eq!(mapping.primary, Some(0));
    }

    #[test]
    fn test_alias_priority_beats_column_order() {
        // "name" comes first in the file but "company" has higher priority
        let mapping = resolve(&header(&["name", "notes", "company", "description"]), &FieldAliases::default());
        assert_eq!(mapping.primary, Some(2));
        assert_eq!(mapping.note, Some(3));
    }

    #[test]
    fn test_leftmost_duplicate_wins() {
        let mapping = resolve(&header(&["org", "Org"]), &FieldAliases::default());
        assert_eq!(mapping.primary, Some(0));
    }

    #[test]
    fn test_no_substring_matching() {
        let mapping = resolve(&header(&["Organisation Name", "Descriptions"]), &FieldAliases::default());
        assert_eq!(mapping, ColumnMapping { primary: None, note: None });
    }

    #[test]
    fn test_missing_description_is_absent() {
        let mapping = resolve(&header(&["Organisation"]), &FieldAliases::default());
        assert_eq!(mapping.note, None);
    }

    #[test]
    fn test_missing_organisation_is_error() {
        let err = resolve_required(&header(&["Email", "Phone"]), &FieldAliases::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "CSV must have an 'Organisation' column (or similar: organization, org, company, name)"
        );
    }

    #[test]
    fn test_custom_aliases() {
        let aliases = FieldAliases {
            organisation: vec!["Firma".into()],
            description: vec!["Bemerkung".into()],
        };
        let mapping = resolve(&header(&["bemerkung", "FIRMA"]), &aliases);
        assert_eq!(mapping, ColumnMapping { primary: Some(1), note: Some(0) });
    }
}
