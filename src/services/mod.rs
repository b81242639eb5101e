// src/services/mod.rs
pub mod backends;
pub mod image_processor;
pub mod ledger;
pub mod redis_service;
pub mod storage;
pub mod uploader;
pub mod validator;

pub use backends::UploadBackend;
pub use image_processor::ImageProcessor;
pub use ledger::Ledger;
pub use redis_service::RedisService;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use uploader::UploadManager;
pub use validator::FileValidator;
