//! Upload gating.
//!
//! Checks applied to an uploaded file before its content is parsed: the
//! file name must end in `.csv` and the body must fit under the size
//! ceiling.

use serde::{Deserialize, Serialize};

use crate::error::UploadError;
use crate::parser::{decode_upload, DecodedText};

const MIB: usize = 1024 * 1024;

/// Default upload ceiling (5 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * MIB;

/// Required file name suffix.
pub const CSV_EXTENSION: &str = ".csv";

/// An uploaded file.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Limits applied to uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadPolicy {
    pub max_bytes: usize,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl UploadPolicy {
    pub fn with_max_bytes(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    /// Extension first, then size. The extension match ignores case.
    pub fn check(&self, file_name: &str, size: usize) -> Result<(), UploadError> {
        if !file_name.to_lowercase().ends_with(CSV_EXTENSION) {
            return Err(UploadError::NotCsv);
        }
        if size > self.max_bytes {
            return Err(UploadError::TooLarge {
                limit_mb: self.max_bytes.div_ceil(MIB),
            });
        }
        Ok(())
    }

    /// Check an upload and decode its body.
    pub fn accept(&self, upload: &Upload) -> Result<DecodedText, UploadError> {
        self.check(&upload.file_name, upload.bytes.len())?;
        Ok(decode_upload(&upload.bytes))
    }
}
