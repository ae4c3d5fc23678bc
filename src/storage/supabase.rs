// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Supabase Storage implementation of [`BlobStore`].

use super::{public_object_url, BlobStore, StorageError};
use crate::services::supabase::{ApiFailure, SupabaseClient};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Method;

/// Photos bucket in Supabase Storage.
#[derive(Clone)]
pub struct SupabaseStorage {
    client: SupabaseClient,
    bucket: String,
    public_base: String,
}

impl SupabaseStorage {
    pub fn new(client: SupabaseClient, base_url: &str, bucket: &str) -> Self {
        Self {
            client,
            bucket: bucket.to_string(),
            public_base: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn object_path(&self, key: &str) -> String {
        format!(
            "storage/v1/object/{}/{}",
            urlencoding::encode(&self.bucket),
            urlencoding::encode(key)
        )
    }
}

fn map_failure(failure: ApiFailure) -> StorageError {
    if failure.is_conflict() {
        StorageError::Conflict(failure.message)
    } else {
        StorageError::Provider(failure.message)
    }
}

#[async_trait]
impl BlobStore for SupabaseStorage {
    async fn upload(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let size = bytes.len();
        let response = self
            .client
            .request(Method::POST, &self.object_path(key))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await
            .map_err(|e| StorageError::Network(e.to_string()))?;

        SupabaseClient::check_response(response)
            .await
            .map_err(map_failure)?;

        tracing::debug!(key, size, bucket = %self.bucket, "Uploaded object");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let response = self
            .client
            .request(Method::DELETE, &self.object_path(key))
            .send()
            .await
            .map_err(|e| StorageError::Network(e.to_string()))?;

        // A missing bucket also answers 404; only a delete names the object.
        SupabaseClient::check_response(response)
            .await
            .map_err(|f| match f.status {
                404 => StorageError::NotFound(key.to_string()),
                _ => map_failure(f),
            })?;
        Ok(())
    }

    fn resolve_public_url(&self, key: &str) -> String {
        public_object_url(&self.public_base, &self.bucket, key)
    }
}
