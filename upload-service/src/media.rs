//! Media CDN client. Files are pushed to Cloudinary with a signed upload
//! into the configured folder.

use async_trait::async_trait;
use log::{debug, error};
use partyplanner_shared::config::CloudinaryConfig;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

pub const CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com";

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Media host is not configured: {0}")]
    Configuration(String),

    #[error("Upload request failed: {0}")]
    Upload(String),

    #[error("Unexpected upload response: {0}")]
    Response(String),
}

/// A stored file as reported back by the CDN
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UploadedMedia {
    pub secure_url: String,
    pub public_id: String,
}

/// The file handed over for storage
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

#[async_trait]
pub trait MediaHost: Send + Sync {
    async fn upload(&self, file: MediaFile) -> Result<UploadedMedia, MediaError>;
}

#[derive(Deserialize)]
struct CloudinaryErrorBody {
    error: CloudinaryErrorMessage,
}

#[derive(Deserialize)]
struct CloudinaryErrorMessage {
    message: String,
}

pub struct CloudinaryClient {
    client: reqwest::Client,
    config: CloudinaryConfig,
    api_base: String,
}

impl CloudinaryClient {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self::with_api_base(config, CLOUDINARY_API_BASE)
    }

    pub fn with_api_base(config: CloudinaryConfig, api_base: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    fn upload_url(&self) -> String {
        format!("{}/v1_1/{}/image/upload", self.api_base, self.config.cloud_name)
    }
}

/// Signature over the signed parameters, sorted by name and joined as a
/// query string, with the API secret appended.
pub fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl MediaHost for CloudinaryClient {
    async fn upload(&self, file: MediaFile) -> Result<UploadedMedia, MediaError> {
        if !self.config.is_complete() {
            return Err(MediaError::Configuration(
                "cloud name, API key and API secret are required".into(),
            ));
        }

        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign(
            &[("folder", self.config.folder.as_str()), ("timestamp", timestamp.as_str())],
            &self.config.api_secret,
        );

        let mut part = Part::bytes(file.data).file_name(file.file_name.unwrap_or_else(|| "upload".into()));
        if let Some(mime) = file.content_type {
            part = part
                .mime_str(&mime)
                .map_err(|e| MediaError::Upload(format!("invalid content type: {}", e)))?;
        }

        let form = Form::new()
            .part("file", part)
            .text("api_key", self.config.api_key.clone())
            .text("folder", self.config.folder.clone())
            .text("timestamp", timestamp)
            .text("signature_algorithm", "sha256")
            .text("signature", signature);

        debug!("Uploading to {}", self.upload_url());
        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| MediaError::Upload(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| MediaError::Response(e.to_string()))?;

        if !status.is_success() {
            let reason = serde_json::from_str::<CloudinaryErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            error!("Cloudinary rejected upload with {}: {}", status, reason);
            return Err(MediaError::Upload(format!("HTTP {}: {}", status, reason)));
        }

        serde_json::from_str(&body).map_err(|e| MediaError::Response(e.to_string()))
    }
}
