// src/services/validator.rs
use crate::config::Config;
use crate::errors::ValidationError;
use crate::models::FileBlob;

/// Size and type limits checked before any network call.
#[derive(Debug, Clone)]
pub struct FileValidator {
    max_file_size: usize,
    image_types: Vec<String>,
    audio_types: Vec<String>,
}

impl FileValidator {
    pub fn new(max_file_size: usize, image_types: Vec<String>, audio_types: Vec<String>) -> Self {
        Self {
            max_file_size,
            image_types,
            audio_types,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.max_file_size,
            config.supported_image_types.clone(),
            config.supported_audio_types.clone(),
        )
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    pub fn image_types(&self) -> &[String] {
        &self.image_types
    }

    pub fn audio_types(&self) -> &[String] {
        &self.audio_types
    }

    pub fn is_image(&self, file: &FileBlob) -> bool {
        self.image_types.iter().any(|t| *t == file.content_type)
    }

    pub fn is_audio(&self, file: &FileBlob) -> bool {
        self.audio_types.iter().any(|t| *t == file.content_type)
    }

    pub fn validate_file(&self, file: &FileBlob) -> Result<(), ValidationError> {
        if file.size() == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if file.size() > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size: file.size(),
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    pub fn validate_image(&self, file: &FileBlob) -> Result<(), ValidationError> {
        if !self.is_image(file) {
            return Err(ValidationError::UnsupportedType(file.content_type.clone()));
        }
        self.validate_file(file)
    }
}
