// src/lib.rs
pub mod config;
pub mod errors;
pub mod models;
pub mod services;

pub use config::{BackendDescriptor, BackendKind, CompressionOptions, Config, DecodePolicy, UploadOptions};
pub use errors::{UploadError, ValidationError};
pub use models::{FileBlob, LedgerRecord, Status, UploadResult};
pub use services::UploadManager;
