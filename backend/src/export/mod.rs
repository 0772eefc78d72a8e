//! CSV export.
//!
//! The inverse of [`crate::parser::tokenize`]: fields that contain a comma,
//! a line break or a double quote are wrapped in quotes with inner quotes
//! doubled, so `tokenize(serialize_rows(rows)) == rows` for any non-blank
//! rows.

use std::borrow::Cow;

use chrono::SecondsFormat;

use crate::models::Contact;

/// Header row of the contact export, in column order.
pub const EXPORT_HEADERS: [&str; 5] = ["Organisation", "Description", "Owner Name", "Owner Email", "Created At"];

/// File name suggested to clients downloading an export.
pub const EXPORT_FILE_NAME: &str = "contacts.csv";

/// Escape a single field.
pub fn escape_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '\n', '\r', '"']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Join escaped fields with `,` and rows with `\n`, without a trailing newline.
pub fn serialize_rows<R, S>(rows: &[R]) -> String
where
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    rows.iter()
        .map(|row| {
            row.as_ref()
                .iter()
                .map(|field| escape_field(field.as_ref()))
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render contacts as an export document, header first.
pub fn export_contacts(contacts: &[Contact]) -> String {
    let mut rows: Vec<Vec<String>> = Vec::with_capacity(contacts.len() + 1);
    rows.push(EXPORT_HEADERS.iter().map(|h| h.to_string()).collect());
    rows.extend(contacts.iter().map(contact_row));
    serialize_rows(&rows)
}

fn contact_row(contact: &Contact) -> Vec<String> {
    vec![
        contact.organisation.clone(),
        contact.description.clone().unwrap_or_default(),
        contact.owner_name.clone().unwrap_or_default(),
        contact.owner_email.clone(),
        contact.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    ]
}
