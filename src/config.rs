// src/config.rs
use crate::errors::UploadError;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;
pub const HISTORY_KEY: &str = "enhanced_hub_files";

pub const CATBOX_API: &str = "https://catbox.moe/user/api.php";
pub const LITTERBOX_API: &str = "https://litterbox.catbox.moe/resources/internals/api.php";
pub const IMGBB_API: &str = "https://api.imgbb.com/1/upload";
pub const IMGUR_API: &str = "https://api.imgur.com/3/image";
pub const IMGUR_CLIENT_ID: &str = "546c25a59c58ad7";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Catbox,
    Litterbox,
    Imgbb,
    Imgur,
}

impl BackendKind {
    pub fn name(self) -> &'static str {
        match self {
            BackendKind::Catbox => "catbox",
            BackendKind::Litterbox => "litterbox",
            BackendKind::Imgbb => "imgbb",
            BackendKind::Imgur => "imgur",
        }
    }

    pub fn default_endpoint(self) -> &'static str {
        match self {
            BackendKind::Catbox => CATBOX_API,
            BackendKind::Litterbox => LITTERBOX_API,
            BackendKind::Imgbb => IMGBB_API,
            BackendKind::Imgur => IMGUR_API,
        }
    }
}

/// Static description of one entry in the fallback chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendDescriptor {
    pub kind: BackendKind,
    /// Overrides the service's public endpoint.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    /// Litterbox retention, e.g. `1h`, `12h`, `24h`, `72h`.
    #[serde(default)]
    pub retention: Option<String>,
}

impl BackendDescriptor {
    pub fn new(kind: BackendKind) -> Self {
        Self {
            kind,
            endpoint: None,
            api_key: None,
            client_id: None,
            retention: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.kind.default_endpoint())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionOptions {
    pub enabled: bool,
    pub max_width: u32,
    /// Encoder quality in `0.0..=1.0`.
    pub quality: f32,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            max_width: 1920,
            quality: 0.9,
        }
    }
}

/// What to do when an image cannot be decoded for compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodePolicy {
    Abort,
    #[default]
    UploadOriginal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    Memory,
    File { path: PathBuf },
    Redis { url: String },
}

impl Default for StorageConfig {
    fn default() -> Self {
        let path = ProjectDirs::from("com", "hubdrop", "hubdrop")
            .map(|dirs| dirs.data_dir().join("history.json"))
            .unwrap_or_else(|| PathBuf::from("hubdrop-history.json"));
        StorageConfig::File { path }
    }
}

/// Per-call settings for the orchestrator.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub backends: Vec<BackendDescriptor>,
    pub compression: Option<CompressionOptions>,
    pub on_decode_error: DecodePolicy,
    pub attempt_timeout: Option<Duration>,
}

impl UploadOptions {
    pub fn new(backends: Vec<BackendDescriptor>) -> Self {
        Self {
            backends,
            compression: None,
            on_decode_error: DecodePolicy::default(),
            attempt_timeout: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub max_file_size: usize,
    pub supported_image_types: Vec<String>,
    pub supported_audio_types: Vec<String>,
    pub backends: Vec<BackendDescriptor>,
    pub compression: CompressionOptions,
    pub on_decode_error: DecodePolicy,
    pub attempt_timeout_secs: Option<u64>,
    pub history_key: String,
    pub storage: StorageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_file_size: MAX_FILE_SIZE,
            supported_image_types: ["image/jpeg", "image/png", "image/gif", "image/webp"]
                .into_iter()
                .map(String::from)
                .collect(),
            supported_audio_types: ["audio/webm", "audio/mp3", "audio/wav", "audio/ogg"]
                .into_iter()
                .map(String::from)
                .collect(),
            backends: vec![
                BackendDescriptor::new(BackendKind::Catbox),
                BackendDescriptor::new(BackendKind::Imgbb),
            ],
            compression: CompressionOptions::default(),
            on_decode_error: DecodePolicy::default(),
            attempt_timeout_secs: None,
            history_key: HISTORY_KEY.to_string(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    /// Reads `path` if it exists, falls back to defaults, then applies
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, UploadError> {
        let mut config = match path {
            Some(path) if path.exists() => {
                let contents = std::fs::read_to_string(path).map_err(|e| {
                    UploadError::Config(format!("failed to read {}: {}", path.display(), e))
                })?;
                Self::from_toml(&contents)?
            }
            _ => Config::default(),
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, UploadError> {
        toml::from_str(contents)
            .map_err(|e| UploadError::Config(format!("failed to parse config: {}", e)))
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(key) = var("IMGBB_API_KEY") {
            for backend in self.backends.iter_mut() {
                if backend.kind == BackendKind::Imgbb && backend.api_key.is_none() {
                    backend.api_key = Some(key.clone());
                }
            }
        }
        if let Some(client_id) = var("IMGUR_CLIENT_ID") {
            for backend in self.backends.iter_mut() {
                if backend.kind == BackendKind::Imgur && backend.client_id.is_none() {
                    backend.client_id = Some(client_id.clone());
                }
            }
        }
        if let Some(url) = var("HUBDROP_REDIS_URL") {
            self.storage = StorageConfig::Redis { url };
        }
    }

    pub fn upload_options(&self) -> UploadOptions {
        UploadOptions {
            backends: self.backends.clone(),
            compression: self.compression.enabled.then_some(self.compression),
            on_decode_error: self.on_decode_error,
            attempt_timeout: self.attempt_timeout_secs.map(Duration::from_secs),
        }
    }
}
