// upload/mod.rs - Multipart form intake
//
// Reads a whole multipart body, validating every image part (type allow-list
// and size ceiling) before anything leaves the process. Only then are the
// images pushed to the image store, concurrently; a partial failure releases
// whatever did make it.

use axum::extract::Multipart;
use futures::future::join_all;
use std::collections::HashMap;
use thiserror::Error;
use tracing::warn;

use crate::storage::{release_images, ImageStore, ImageUpload, StorageError, StoredImage};

const ACCEPTED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/jpg"];
const ACCEPTED_EXTENSIONS: &[&str] = &[".jpg", ".jpeg"];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("unsupported file type in field {field}")]
    UnsupportedType { field: String },

    #[error("file in field {field} exceeds {limit} bytes")]
    TooLarge { field: String, limit: usize },

    #[error("malformed multipart body: {0}")]
    Malformed(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Text fields and validated, not yet uploaded, images of one request
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, Vec<String>>,
    images: HashMap<String, ImageUpload>,
}

impl MultipartForm {
    /// Drain the body. Parts named in `image_fields` are treated as images; any
    /// other part carrying a file name is rejected.
    pub async fn read(
        mut multipart: Multipart,
        image_fields: &[&str],
        max_image_bytes: usize,
    ) -> Result<Self, UploadError> {
        let mut form = MultipartForm::default();

        while let Some(mut field) = multipart
            .next_field()
            .await
            .map_err(|e| UploadError::Malformed(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();

            if image_fields.contains(&name.as_str()) {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);

                let mut bytes = Vec::new();
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| UploadError::Malformed(e.body_text()))?
                {
                    if bytes.len() + chunk.len() > max_image_bytes {
                        return Err(UploadError::TooLarge { field: name, limit: max_image_bytes });
                    }
                    bytes.extend_from_slice(&chunk);
                }

                // An untouched file input arrives as an empty part
                if bytes.is_empty() && file_name.as_deref().unwrap_or_default().is_empty() {
                    continue;
                }

                if !is_accepted_image(content_type.as_deref(), file_name.as_deref()) {
                    return Err(UploadError::UnsupportedType { field: name });
                }

                form.images.insert(
                    name,
                    ImageUpload {
                        file_name: file_name.unwrap_or_else(|| "image.jpg".to_string()),
                        content_type: content_type.unwrap_or_else(|| "image/jpeg".to_string()),
                        bytes,
                    },
                );
            } else if field.file_name().is_some() {
                return Err(UploadError::Malformed(format!("unexpected file field: {}", name)));
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| UploadError::Malformed(e.body_text()))?;
                form.fields.entry(name).or_default().push(value);
            }
        }

        Ok(form)
    }

    /// First value of a text field, trimmed; empty values count as absent
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(|values| values.first())
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Every value sent for a repeated text field
    pub fn texts(&self, name: &str) -> &[String] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    #[cfg(test)]
    pub(crate) fn from_fields(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut form = MultipartForm::default();
        for (name, value) in pairs {
            form.fields.entry(name).or_default().push(value);
        }
        form
    }

    pub fn has_image(&self, name: &str) -> bool {
        self.images.contains_key(name)
    }

    /// Upload every accepted image concurrently, keyed by field name. If any
    /// upload fails the others are released and the first error is returned.
    pub async fn store_images(
        &mut self,
        store: &dyn ImageStore,
    ) -> Result<HashMap<String, StoredImage>, UploadError> {
        let pending: Vec<(String, ImageUpload)> = self.images.drain().collect();

        let results = join_all(
            pending
                .into_iter()
                .map(|(field, image)| async move { (field, store.upload(image).await) }),
        )
        .await;

        let mut stored = HashMap::new();
        let mut failure = None;
        for (field, result) in results {
            match result {
                Ok(image) => {
                    stored.insert(field, image);
                }
                Err(e) => {
                    warn!("Upload of field {} failed: {}", field, e);
                    failure.get_or_insert(e);
                }
            }
        }

        if let Some(err) = failure {
            release_images(store, stored.values().map(|img| img.public_id.as_str())).await;
            return Err(err.into());
        }

        Ok(stored)
    }
}

/// JPEG by declared content type or by file extension
pub fn is_accepted_image(content_type: Option<&str>, file_name: Option<&str>) -> bool {
    let by_type = content_type
        .map(|ct| ACCEPTED_CONTENT_TYPES.contains(&ct.to_ascii_lowercase().as_str()))
        .unwrap_or(false);

    let by_name = file_name
        .map(|name| {
            let name = name.to_ascii_lowercase();
            ACCEPTED_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
        })
        .unwrap_or(false);

    by_type || by_name
}
