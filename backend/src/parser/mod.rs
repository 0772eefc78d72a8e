//! CSV tokenizer and upload decoding.
//!
//! Converts raw text into rows of string fields. The scanner is a
//! hand-written two-state machine (inside / outside quotes) so embedded
//! commas, escaped quotes and line breaks inside quoted fields survive.
//! It is deliberately permissive: malformed quoting never fails, ragged
//! rows are returned as-is, and blank lines are dropped.

use crate::models::RawRow;

/// Tokenize CSV text into rows of fields.
///
/// Rules, outside quotes: `,` ends a field, `\r` is ignored, `\n` ends the
/// row, `"` opens a quoted section. Inside quotes: `""` is a literal quote,
/// a lone `"` closes the section, everything else (including `,`, `\r` and
/// `\n`) is content. An unterminated quote is closed at end of input.
///
/// Rows whose fields are all blank after trimming are dropped, whether or
/// not the input ends with a line terminator.
///
/// # Example
/// ```
/// use contactload::parser::tokenize;
///
/// let rows = tokenize("Organisation,Description\r\n\"Acme, Inc.\",\"Says \"\"hi\"\"\"\n");
/// assert_eq!(rows.len(), 2);
/// assert_eq!(rows[1], vec!["Acme, Inc.", "Says \"hi\""]);
/// ```
pub fn tokenize(text: &str) -> Vec<RawRow> {
    let mut scanner = Scanner::default();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if scanner.in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    scanner.field.push('"');
                }
                '"' => scanner.in_quotes = false,
                _ => scanner.field.push(c),
            }
        } else {
            match c {
                '"' => scanner.in_quotes = true,
                ',' => scanner.end_field(),
                '\r' => {}
                '\n' => scanner.end_row(),
                _ => scanner.field.push(c),
            }
        }
    }

    // Whatever is buffered (possibly an unterminated quote) is the last row.
    scanner.end_row();
    scanner.rows
}

#[derive(Default)]
struct Scanner {
    rows: Vec<RawRow>,
    row: RawRow,
    field: String,
    in_quotes: bool,
}

impl Scanner {
    fn end_field(&mut self) {
        self.row.push(std::mem::take(&mut self.field));
    }

    /// Close the current field and row; keep the row only if it has content.
    fn end_row(&mut self) {
        self.end_field();
        let row = std::mem::take(&mut self.row);
        if !is_blank_row(&row) {
            self.rows.push(row);
        }
    }
}

/// Trim a cell: Unicode whitespace plus stray byte-order marks.
pub fn trim_cell(cell: &str) -> &str {
    cell.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
}

/// True when every field is empty after [`trim_cell`].
pub fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|field| trim_cell(field).is_empty())
}

// =============================================================================
// Decoding
// =============================================================================

/// Decoded upload text with the encoding that was used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: String,
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decode uploaded bytes to text.
///
/// UTF-8 (with or without BOM) is taken as-is. Anything else goes through
/// charset detection so Latin-1 / Windows-1252 spreadsheet exports still
/// import; unknown charsets fall back to lossy UTF-8.
pub fn decode_upload(bytes: &[u8]) -> DecodedText {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    if let Ok(text) = std::str::from_utf8(bytes) {
        return DecodedText {
            text: text.to_string(),
            encoding: "utf-8".to_string(),
        };
    }

    let encoding = detect_encoding(bytes);
    DecodedText {
        text: decode_content(bytes, &encoding),
        encoding,
    }
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let charset = chardet::detect(bytes).0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to string using the specified encoding label
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding_rs::Encoding::for_label(encoding.as_bytes()) {
        Some(enc) if enc != encoding_rs::UTF_8 => {
            enc.decode_without_bom_handling(bytes).0.into_owned()
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_rows() {
        assert_eq!(
            tokenize("Organisation,Description\nAcme Corp,A company"),
            vec![vec!["Organisation", "Description"], vec!["Acme Corp", "A company"]]
        );
    }

    #[test]
    fn test_byte_order_mark_row_is_blank() {
        let parsed = tokenize("Organisation\n\u{feff}\n\u{feff} ,\t\nAcme");
        assert_eq!(parsed, vec![vec!["Organisation"], vec!["Acme"]]);
        assert_eq!(trim_cell("\u{feff} Acme \u{feff}"), "Acme");
    }

    #[test]
    fn test_quoted_comma() {
        let parsed = tokenize("Organisation,Description\n\"Acme, Inc.\",A company with comma");
        assert_eq!(parsed[1], vec!["Acme, Inc.", "A company with comma"]);
    }

    #[test]
    fn test_escaped_quotes() {
        let parsed = tokenize("Organisation\n\"Acme \"\"The Best\"\" Corp\"");
        assert_eq!(parsed[1], vec!["Acme \"The Best\" Corp"]);
    }

    #[test]
    fn test_newline_inside_quotes() {
        let parsed = tokenize("Organisation,Description\n\"Acme Corp\",\"A company\nwith newline\"");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1], vec!["Acme Corp", "A company\nwith newline"]);
    }

    #[test]
    fn test_crlf_line_endings() {
        let parsed = tokenize("Organisation,Description\r\nCompany A,Desc A\r\nCompany B,Desc B\r\n");
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[2], vec!["Company B", "Desc B"]);
    }

    #[test]
    fn test_carriage_return_kept_inside_quotes() {
        let parsed = tokenize("a\n\"x\r\ny\"");
        assert_eq!(parsed[1], vec!["x\r\ny"]);
    }

    #[test]
    fn test_empty_lines_skipped() {
        let parsed = tokenize("Organisation,Description\n\nCompany A,Desc A\n\nCompany B,Desc B\n");
        assert_eq!(parsed.len(), 3);
    }

    #[test]
    fn test_whitespace_and_comma_only_rows_skipped() {
        let parsed = tokenize("a,b\n   ,  \n,\n1,2");
        assert_eq!(parsed, vec![vec!["a", "b"], vec!["1", "2"]]);
    }

    #[test]
    fn test_trailing_newline_matches_no_trailing_newline() {
        assert_eq!(tokenize("a,b\n1,2\n"), tokenize("a,b\n1,2"));
        assert_eq!(tokenize("a,b\r\n1,2\r\n"), tokenize("a,b\n1,2"));
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("\n\r\n  \n").is_empty());
    }

    #[test]
    fn test_unterminated_quote_is_closed_at_eof() {
        let parsed = tokenize("Organisation\n\"Acme, still open\nnext");
        assert_eq!(parsed[1], vec!["Acme, still open\nnext"]);
    }

    #[test]
    fn test_ragged_rows_not_normalized() {
        let parsed = tokenize("a,b,c\n1\n1,2,3,4");
        assert_eq!(parsed[1].len(), 1);
        assert_eq!(parsed[2].len(), 4);
    }

    #[test]
    fn test_quote_in_middle_of_field() {
        // Quotes open a section wherever they appear; the quote itself is dropped
        let parsed = tokenize("ab\"c,d\"e,f");
        assert_eq!(parsed[0], vec!["abc,de", "f"]);
    }

    #[test]
    fn test_fields_are_not_trimmed() {
        let parsed = tokenize("  Acme Corp  ,  A company  ");
        assert_eq!(parsed[0], vec!["  Acme Corp  ", "  A company  "]);
    }

    #[test]
    fn test_decode_utf8_with_bom() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice("Organisation\nSociété".as_bytes());

        let decoded = decode_upload(&bytes);
        assert_eq!(decoded.encoding, "utf-8");
        assert_eq!(decoded.text, "Organisation\nSociété");
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_invalid_utf8_falls_back_to_detection() {
        let bytes: &[u8] = b"Organisation\nSoci\xE9t\xE9 G\xE9n\xE9rale de Caf\xE9\n";
        let decoded = decode_upload(bytes);
        assert!(decoded.text.starts_with("Organisation\nSoci"));
        assert_eq!(tokenize(&decoded.text).len(), 2);
    }
}
