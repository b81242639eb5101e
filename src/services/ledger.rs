// src/services/ledger.rs
use crate::errors::UploadError;
use crate::models::{LedgerRecord, UploadResult};
use crate::services::storage::KeyValueStore;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Upload history kept as one JSON object under a single store key.
///
/// Every mutation rewrites the whole object. Writers are serialized so two
/// uploads finishing together cannot lose each other's record.
pub struct Ledger {
    store: Arc<dyn KeyValueStore>,
    key: String,
    write_lock: Mutex<()>,
}

impl Ledger {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Base-36 millisecond timestamp followed by eight random hex digits.
    pub fn generate_id() -> String {
        let mut millis = Utc::now().timestamp_millis().max(0) as u64;
        let mut stamp = Vec::new();
        loop {
            stamp.push(std::char::from_digit((millis % 36) as u32, 36).unwrap_or('0'));
            millis /= 36;
            if millis == 0 {
                break;
            }
        }
        stamp.reverse();

        let suffix = Uuid::new_v4().simple().to_string();
        format!("{}{}", stamp.into_iter().collect::<String>(), &suffix[..8])
    }

    async fn load(&self) -> Result<HashMap<String, LedgerRecord>, UploadError> {
        let Some(raw) = self.store.get(&self.key).await? else {
            return Ok(HashMap::new());
        };

        match serde_json::from_str(&raw) {
            Ok(records) => Ok(records),
            Err(e) => {
                log::warn!("Discarding malformed history under {}: {}", self.key, e);
                Ok(HashMap::new())
            }
        }
    }

    async fn persist(&self, records: &HashMap<String, LedgerRecord>) -> Result<(), UploadError> {
        let value = serde_json::to_string(records)?;
        self.store.set(&self.key, value).await
    }

    /// Stores `record` under its own id. An existing id is never replaced.
    pub async fn save(&self, record: LedgerRecord) -> Result<(), UploadError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;

        if records.contains_key(&record.id) {
            return Err(UploadError::DuplicateId(record.id));
        }

        log::debug!("Recording upload {} -> {}", record.id, record.upload.url);
        records.insert(record.id.clone(), record);
        self.persist(&records).await
    }

    /// Wraps `upload` in a record with a fresh id and the current time, then saves it.
    pub async fn record(&self, upload: UploadResult) -> Result<LedgerRecord, UploadError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;

        let mut id = Self::generate_id();
        while records.contains_key(&id) {
            id = Self::generate_id();
        }

        let record = LedgerRecord {
            id: id.clone(),
            timestamp: Utc::now(),
            upload,
        };
        records.insert(id, record.clone());
        self.persist(&records).await?;

        log::info!("Saved history record {}", record.id);
        Ok(record)
    }

    pub async fn get(&self, id: &str) -> Result<Option<LedgerRecord>, UploadError> {
        Ok(self.load().await?.remove(id))
    }

    pub async fn get_all(&self) -> Result<HashMap<String, LedgerRecord>, UploadError> {
        self.load().await
    }

    pub async fn len(&self) -> Result<usize, UploadError> {
        Ok(self.load().await?.len())
    }

    pub async fn clear(&self) -> Result<(), UploadError> {
        let _guard = self.write_lock.lock().await;
        self.store.remove(&self.key).await?;
        log::info!("Cleared upload history");
        Ok(())
    }
}
