use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use uuid::Uuid;

use super::{ImageStore, ImageUpload, StorageError, StoredImage};
use crate::config::StorageConfig;

/// Incoming transformation applied to every upload
const UPLOAD_TRANSFORMATION: &str = "q_auto,f_auto";

/// Signed REST client for Cloudinary's image endpoints.
/// The account must be set to SHA-256 API signatures.
pub struct CloudinaryStore {
    client: reqwest::Client,
    config: StorageConfig,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

impl CloudinaryStore {
    pub fn new(config: StorageConfig) -> Self {
        Self { client: reqwest::Client::new(), config }
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/{}/image/{}",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.cloud_name,
            action
        )
    }

    /// Build a form carrying `params`, the api key and the request signature
    fn signed_form(&self, params: &[(&str, String)]) -> Form {
        let signature = sign(params, &self.config.api_secret);
        params
            .iter()
            .fold(Form::new(), |form, (k, v)| form.text(k.to_string(), v.clone()))
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature)
    }

    async fn send<T: for<'de> Deserialize<'de>>(&self, action: &str, form: Form) -> Result<T, StorageError> {
        let response = self.client.post(self.endpoint(action)).multipart(form).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = match response.json::<ErrorBody>().await {
                Ok(body) => body.error.message,
                Err(_) => status.to_string(),
            };
            return Err(StorageError::Rejected { status: status.as_u16(), message });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| StorageError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl ImageStore for CloudinaryStore {
    async fn upload(&self, image: ImageUpload) -> Result<StoredImage, StorageError> {
        let params = [
            ("folder", self.config.folder.clone()),
            ("public_id", Uuid::new_v4().to_string()),
            ("timestamp", Utc::now().timestamp().to_string()),
            ("transformation", UPLOAD_TRANSFORMATION.to_string()),
        ];

        let size = image.bytes.len();
        let part = Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.content_type)?;
        let form = self.signed_form(&params).part("file", part);

        let uploaded: UploadResponse = self.send("upload", form).await?;
        info!("Uploaded image {} ({} bytes)", uploaded.public_id, size);

        Ok(StoredImage { url: uploaded.secure_url, public_id: uploaded.public_id })
    }

    async fn destroy(&self, public_id: &str) -> Result<(), StorageError> {
        let params = [
            ("public_id", public_id.to_string()),
            ("timestamp", Utc::now().timestamp().to_string()),
        ];

        let destroyed: DestroyResponse = self.send("destroy", self.signed_form(&params)).await?;
        match destroyed.result.as_str() {
            "ok" | "not found" => {
                debug!("Destroyed image {} ({})", public_id, destroyed.result);
                Ok(())
            }
            other => Err(StorageError::InvalidResponse(format!("destroy returned {}", other))),
        }
    }
}

/// Hex SHA-256 of the parameters sorted by name, joined as `k=v&k=v`, followed by the secret
pub fn sign(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    format!("{:x}", hasher.finalize())
}
