// src/services/backends.rs
use crate::config::{BackendDescriptor, BackendKind, IMGUR_CLIENT_ID};
use crate::errors::UploadError;
use crate::models::{BackendUpload, FileBlob};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde_json::{Value, json};

pub const CATBOX_FILE_PREFIX: &str = "https://files.catbox.moe/";
const DEFAULT_RETENTION: &str = "1h";

/// One remote file host. Each call makes exactly one network attempt.
#[async_trait]
pub trait UploadBackend: Send + Sync {
    fn name(&self) -> &str;
    async fn upload(&self, file: &FileBlob) -> Result<BackendUpload, UploadError>;
}

/// Builds the backend described by `descriptor`, sharing `client`.
pub fn build_backend(descriptor: &BackendDescriptor, client: &Client) -> Box<dyn UploadBackend> {
    let endpoint = descriptor.endpoint().to_string();
    let client = client.clone();

    match descriptor.kind {
        BackendKind::Catbox => Box::new(CatboxBackend { client, endpoint }),
        BackendKind::Litterbox => Box::new(LitterboxBackend {
            client,
            endpoint,
            retention: descriptor
                .retention
                .clone()
                .unwrap_or_else(|| DEFAULT_RETENTION.to_string()),
        }),
        BackendKind::Imgbb => Box::new(ImgbbBackend {
            client,
            endpoint,
            api_key: descriptor.api_key.clone(),
        }),
        BackendKind::Imgur => Box::new(ImgurBackend {
            client,
            endpoint,
            client_id: descriptor
                .client_id
                .clone()
                .unwrap_or_else(|| IMGUR_CLIENT_ID.to_string()),
        }),
    }
}

/// The declared type when it parses, otherwise a guess from the filename.
fn part_content_type(file: &FileBlob) -> String {
    if file.content_type.parse::<mime_guess::mime::Mime>().is_ok() {
        return file.content_type.clone();
    }
    mime_guess::from_path(&file.filename)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

fn file_part(file: &FileBlob) -> Result<Part, UploadError> {
    Part::bytes(file.data.to_vec())
        .file_name(file.filename.clone())
        .mime_str(&part_content_type(file))
        .map_err(|e| UploadError::Config(format!("Invalid content type: {}", e)))
}

async fn send(service: &str, request: reqwest::RequestBuilder) -> Result<Response, UploadError> {
    let response = request
        .send()
        .await
        .map_err(|e| UploadError::Network(format!("{} request failed: {}", service, e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        return Err(UploadError::Network(format!(
            "{} HTTP error! status: {} {}",
            service,
            status,
            error_text.trim()
        )));
    }

    Ok(response)
}

async fn read_json(service: &str, response: Response) -> Result<Value, UploadError> {
    response.json().await.map_err(|e| {
        UploadError::ResponseFormat(format!("Failed to parse {} response: {}", service, e))
    })
}

pub struct CatboxBackend {
    client: Client,
    endpoint: String,
}

#[async_trait]
impl UploadBackend for CatboxBackend {
    fn name(&self) -> &str {
        BackendKind::Catbox.name()
    }

    async fn upload(&self, file: &FileBlob) -> Result<BackendUpload, UploadError> {
        let form = Form::new()
            .text("reqtype", "fileupload")
            .part("fileToUpload", file_part(file)?);

        let response = send("Catbox", self.client.post(&self.endpoint).multipart(form)).await?;
        let body = response
            .text()
            .await
            .map_err(|e| UploadError::Network(format!("Catbox body read failed: {}", e)))?;

        let url = body.trim();
        if !url.starts_with(CATBOX_FILE_PREFIX) {
            return Err(UploadError::ResponseFormat(format!(
                "Invalid response from Catbox: {}",
                url
            )));
        }

        Ok(BackendUpload {
            url: url.to_string(),
            service: self.name().to_string(),
        })
    }
}

pub struct LitterboxBackend {
    client: Client,
    endpoint: String,
    retention: String,
}

#[async_trait]
impl UploadBackend for LitterboxBackend {
    fn name(&self) -> &str {
        BackendKind::Litterbox.name()
    }

    async fn upload(&self, file: &FileBlob) -> Result<BackendUpload, UploadError> {
        let form = Form::new()
            .text("reqtype", "fileupload")
            .text("time", self.retention.clone())
            .part("fileToUpload", file_part(file)?);

        let response = send("Litterbox", self.client.post(&self.endpoint).multipart(form)).await?;
        let body = response
            .text()
            .await
            .map_err(|e| UploadError::Network(format!("Litterbox body read failed: {}", e)))?;

        let url = body.trim();
        if url.is_empty() {
            return Err(UploadError::ResponseFormat(
                "Empty response from Litterbox".to_string(),
            ));
        }

        Ok(BackendUpload {
            url: url.to_string(),
            service: self.name().to_string(),
        })
    }
}

pub struct ImgbbBackend {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

#[async_trait]
impl UploadBackend for ImgbbBackend {
    fn name(&self) -> &str {
        BackendKind::Imgbb.name()
    }

    async fn upload(&self, file: &FileBlob) -> Result<BackendUpload, UploadError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| UploadError::Config("ImgBB API key required".to_string()))?;

        let form = Form::new().part("image", file_part(file)?);
        let request = self
            .client
            .post(&self.endpoint)
            .query(&[("key", api_key)])
            .multipart(form);

        let result = read_json("ImgBB", send("ImgBB", request).await?).await?;

        if result["success"].as_bool() != Some(true) {
            let message = result["error"]["message"]
                .as_str()
                .unwrap_or("Upload failed");
            return Err(UploadError::ResponseFormat(format!("ImgBB: {}", message)));
        }

        let url = result["data"]["url"]
            .as_str()
            .ok_or_else(|| UploadError::ResponseFormat("No url in ImgBB response".to_string()))?;

        Ok(BackendUpload {
            url: url.to_string(),
            service: self.name().to_string(),
        })
    }
}

pub struct ImgurBackend {
    client: Client,
    endpoint: String,
    client_id: String,
}

#[async_trait]
impl UploadBackend for ImgurBackend {
    fn name(&self) -> &str {
        BackendKind::Imgur.name()
    }

    async fn upload(&self, file: &FileBlob) -> Result<BackendUpload, UploadError> {
        let base64_image = general_purpose::STANDARD.encode(&file.data);

        let request = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Client-ID {}", self.client_id))
            .json(&json!({
                "image": base64_image,
                "type": "base64"
            }));

        let result = read_json("Imgur", send("Imgur", request).await?).await?;

        if result["success"].as_bool() != Some(true) {
            return Err(UploadError::ResponseFormat(
                "Imgur reported failure".to_string(),
            ));
        }

        let link = result["data"]["link"]
            .as_str()
            .ok_or_else(|| UploadError::ResponseFormat("No link in Imgur response".to_string()))?;

        Ok(BackendUpload {
            url: link.to_string(),
            service: self.name().to_string(),
        })
    }
}
