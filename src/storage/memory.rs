// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process [`BlobStore`] used for local development and tests.

use super::{public_object_url, BlobStore, StorageError};
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// Object held by [`MemoryBlobStore`].
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Bytes,
    pub content_type: String,
}

/// Bucket kept in a concurrent map. Clones share the same objects.
#[derive(Clone)]
pub struct MemoryBlobStore {
    objects: Arc<DashMap<String, StoredObject>>,
    bucket: String,
    public_base: String,
}

impl MemoryBlobStore {
    pub fn new(public_base: &str, bucket: &str) -> Self {
        Self {
            objects: Arc::new(DashMap::new()),
            bucket: bucket.to_string(),
            public_base: public_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.get(key).map(|o| o.value().clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        match self.objects.entry(key.to_string()) {
            Entry::Occupied(_) => Err(StorageError::Conflict(
                "The resource already exists".to_string(),
            )),
            Entry::Vacant(slot) => {
                slot.insert(StoredObject {
                    bytes,
                    content_type: content_type.to_string(),
                });
                Ok(())
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.objects
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    fn resolve_public_url(&self, key: &str) -> String {
        public_object_url(&self.public_base, &self.bucket, key)
    }
}
