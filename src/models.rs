// src/models.rs
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A file handed over by the host for a single upload call.
#[derive(Debug, Clone)]
pub struct FileBlob {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

impl FileBlob {
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// What a single backend hands back on success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendUpload {
    pub url: String,
    pub service: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    pub url: String,
    pub service: String,
    pub filename: String,
    pub size: usize,
    #[serde(rename = "type")]
    pub content_type: String,
}

impl UploadResult {
    pub fn from_upload(upload: BackendUpload, file: &FileBlob) -> Self {
        Self {
            url: upload.url,
            service: upload.service,
            filename: file.filename.clone(),
            size: file.size(),
            content_type: file.content_type.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub upload: UploadResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub version: String,
    pub supported_image_types: Vec<String>,
    pub supported_audio_types: Vec<String>,
    pub max_file_size: usize,
    pub record_count: usize,
}
