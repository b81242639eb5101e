// src/services/uploader.rs
use crate::config::{Config, DecodePolicy, StorageConfig, UploadOptions};
use crate::errors::UploadError;
use crate::models::{BackendUpload, FileBlob, LedgerRecord, Status, UploadResult};
use crate::services::backends::{UploadBackend, build_backend};
use crate::services::image_processor::ImageProcessor;
use crate::services::ledger::Ledger;
use crate::services::redis_service::RedisService;
use crate::services::storage::{FileStore, KeyValueStore, MemoryStore};
use crate::services::validator::FileValidator;
use log::{info, warn};
use reqwest::Client;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Entry point for the host: validates, optionally compresses, walks the
/// fallback chain and records successes in the ledger.
pub struct UploadManager {
    client: Client,
    validator: FileValidator,
    image_processor: ImageProcessor,
    ledger: Arc<Ledger>,
}

impl UploadManager {
    pub fn new(client: Client, validator: FileValidator, ledger: Arc<Ledger>) -> Self {
        Self {
            client,
            validator,
            image_processor: ImageProcessor::new(),
            ledger,
        }
    }

    pub async fn from_config(config: &Config) -> Result<Self, UploadError> {
        let store: Arc<dyn KeyValueStore> = match &config.storage {
            StorageConfig::Memory => Arc::new(MemoryStore::new()),
            StorageConfig::File { path } => Arc::new(FileStore::new(path)),
            StorageConfig::Redis { url } => Arc::new(RedisService::new(url).await?),
        };
        let ledger = Arc::new(Ledger::new(store, config.history_key.clone()));

        Ok(Self::new(
            Client::new(),
            FileValidator::from_config(config),
            ledger,
        ))
    }

    pub fn validator(&self) -> &FileValidator {
        &self.validator
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    pub async fn upload_file(
        &self,
        file: &FileBlob,
        options: &UploadOptions,
    ) -> Result<UploadResult, UploadError> {
        self.validator.validate_file(file)?;
        info!("Uploading file: {} {} bytes", file.filename, file.size());

        self.upload_validated(file, options).await
    }

    pub async fn upload_image(
        &self,
        file: &FileBlob,
        options: &UploadOptions,
    ) -> Result<UploadResult, UploadError> {
        self.validator.validate_image(file)?;
        info!("Uploading image: {} {} bytes", file.filename, file.size());

        let file = self.preprocess(file, options)?;
        self.upload_validated(&file, options).await
    }

    fn preprocess<'a>(
        &self,
        file: &'a FileBlob,
        options: &UploadOptions,
    ) -> Result<Cow<'a, FileBlob>, UploadError> {
        let Some(compression) = options.compression else {
            return Ok(Cow::Borrowed(file));
        };

        match self
            .image_processor
            .compress(file, compression.max_width, compression.quality)
        {
            Ok(compressed) => Ok(Cow::Owned(compressed)),
            Err(e) if options.on_decode_error == DecodePolicy::UploadOriginal => {
                warn!("Compression skipped for {}: {}", file.filename, e);
                Ok(Cow::Borrowed(file))
            }
            Err(e) => Err(e),
        }
    }

    async fn upload_validated(
        &self,
        file: &FileBlob,
        options: &UploadOptions,
    ) -> Result<UploadResult, UploadError> {
        let backends: Vec<Box<dyn UploadBackend>> = options
            .backends
            .iter()
            .map(|descriptor| build_backend(descriptor, &self.client))
            .collect();

        let upload = try_backends(&backends, file, options.attempt_timeout).await?;
        let result = UploadResult::from_upload(upload, file);

        self.ledger.record(result.clone()).await?;
        info!("Upload successful via {}: {}", result.service, result.url);

        Ok(result)
    }

    pub async fn get_history(&self) -> Result<HashMap<String, LedgerRecord>, UploadError> {
        self.ledger.get_all().await
    }

    pub async fn get_url_by_id(&self, id: &str) -> Result<Option<String>, UploadError> {
        Ok(self.ledger.get(id).await?.map(|record| record.upload.url))
    }

    pub async fn clear_history(&self) -> Result<(), UploadError> {
        self.ledger.clear().await
    }

    pub async fn get_status(&self) -> Result<Status, UploadError> {
        Ok(Status {
            version: env!("CARGO_PKG_VERSION").to_string(),
            supported_image_types: self.validator.image_types().to_vec(),
            supported_audio_types: self.validator.audio_types().to_vec(),
            max_file_size: self.validator.max_file_size(),
            record_count: self.ledger.len().await?,
        })
    }
}

/// Tries each backend in order and returns the first success.
///
/// Recoverable errors move on to the next backend; when the list runs out
/// the last error is wrapped in `AggregateUploadFailure`.
pub async fn try_backends(
    backends: &[Box<dyn UploadBackend>],
    file: &FileBlob,
    attempt_timeout: Option<Duration>,
) -> Result<BackendUpload, UploadError> {
    let mut last_error = UploadError::Config("No upload services configured".to_string());

    for backend in backends {
        let attempt = backend.upload(file);
        let outcome = match attempt_timeout {
            Some(limit) => tokio::time::timeout(limit, attempt).await.unwrap_or_else(|_| {
                Err(UploadError::Network(format!(
                    "{} timed out after {:?}",
                    backend.name(),
                    limit
                )))
            }),
            None => attempt.await,
        };

        match outcome {
            Ok(upload) => return Ok(upload),
            Err(e) if e.is_recoverable() => {
                warn!("{} upload failed: {}", backend.name(), e);
                last_error = e;
            }
            Err(e) => return Err(e),
        }
    }

    Err(UploadError::AggregateUploadFailure {
        last: Box::new(last_error),
    })
}
