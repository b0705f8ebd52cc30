// storage/mod.rs - Remote image hosting
//
// Uploaded images live with an external provider; the database only keeps the
// public URL and the provider's deletion handle. Handlers talk to the provider
// through the `ImageStore` trait so tests can swap in an in-memory store.

pub mod cloudinary;

use async_trait::async_trait;
use futures::future::join_all;
use thiserror::Error;
use tracing::warn;

pub use cloudinary::CloudinaryStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("image store request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("image store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("unexpected image store response: {0}")]
    InvalidResponse(String),
}

/// A validated file ready to send to the store
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A hosted image: public URL plus the handle needed to delete it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub url: String,
    pub public_id: String,
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn upload(&self, image: ImageUpload) -> Result<StoredImage, StorageError>;

    async fn destroy(&self, public_id: &str) -> Result<(), StorageError>;
}

/// Delete a hosted image, logging instead of failing
pub async fn release_image(store: &dyn ImageStore, public_id: &str) {
    if let Err(e) = store.destroy(public_id).await {
        warn!("Failed to release image {}: {}", public_id, e);
    }
}

/// Best-effort release of several images at once
pub async fn release_images<'a, I>(store: &dyn ImageStore, public_ids: I)
where
    I: IntoIterator<Item = &'a str>,
{
    join_all(public_ids.into_iter().map(|id| release_image(store, id))).await;
}
