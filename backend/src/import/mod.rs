//! Import module.
//!
//! - Upload: file name / size gating and decoding
//! - Pipeline: tokenize, resolve, validate, aggregate, store

pub mod pipeline;
pub mod upload;

pub use pipeline::*;
pub use upload::{Upload, UploadPolicy, DEFAULT_MAX_UPLOAD_BYTES};
