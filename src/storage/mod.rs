// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Object storage gateway for report photos.

pub mod memory;
pub mod supabase;

pub use memory::MemoryBlobStore;
pub use supabase::SupabaseStorage;

use async_trait::async_trait;
use bytes::Bytes;

/// Object storage errors. Messages are the provider's own.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    #[error("{0}")]
    Conflict(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Provider(String),

    #[error("Storage request failed: {0}")]
    Network(String),
}

/// Narrow capability over a flat-namespace blob bucket.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `key`. Fails if `key` already exists.
    async fn upload(&self, key: &str, bytes: Bytes, content_type: &str)
        -> Result<(), StorageError>;

    /// Remove the object under `key`.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Fetchable URL for `key`. Pure: never fails and never touches the
    /// network; unknown keys yield a URL that 404s when fetched.
    fn resolve_public_url(&self, key: &str) -> String;
}

/// Public object URL in the Supabase layout.
pub fn public_object_url(base_url: &str, bucket: &str, key: &str) -> String {
    format!(
        "{}/storage/v1/object/public/{}/{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(bucket),
        urlencoding::encode(key)
    )
}
