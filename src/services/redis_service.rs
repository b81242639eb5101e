// src/services/redis_service.rs
use crate::errors::UploadError;
use crate::services::storage::KeyValueStore;
use async_trait::async_trait;
use redis::{AsyncCommands, Client};

pub struct RedisService {
    client: Client,
}

impl RedisService {
    pub async fn new(redis_url: &str) -> Result<Self, UploadError> {
        let client = Client::open(redis_url)?;

        // Test connection
        let mut conn = client.get_async_connection().await?;
        redis::cmd("PING").query_async::<_, String>(&mut conn).await?;

        Ok(Self { client })
    }
}

#[async_trait]
impl KeyValueStore for RedisService {
    async fn get(&self, key: &str) -> Result<Option<String>, UploadError> {
        let mut conn = self.client.get_async_connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), UploadError> {
        let mut conn = self.client.get_async_connection().await?;
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), UploadError> {
        let mut conn = self.client.get_async_connection().await?;
        conn.del::<_, ()>(key).await?;
        Ok(())
    }
}
