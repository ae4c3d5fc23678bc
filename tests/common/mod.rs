// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use bytes::Bytes;
use jani_reports::config::Config;
use jani_reports::db::{DbError, MemoryRecordStore, RecordStore};
use jani_reports::models::{Coordinates, NewReport, Report};
use jani_reports::routes::create_router;
use jani_reports::services::geolocation::PositionError;
use jani_reports::services::LocationSource;
use jani_reports::storage::{BlobStore, MemoryBlobStore, StorageError};
use jani_reports::AppState;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

#[allow(dead_code)]
pub const MULTIPART_BOUNDARY: &str = "jani-test-boundary";

/// Minimal JPEG header; content is never decoded.
#[allow(dead_code)]
pub const JPEG_BYTES: &[u8] = b"\xff\xd8\xff\xe0\x00\x10JFIF\x00";

/// Blob store that counts calls and can be told to fail uploads.
#[derive(Clone)]
#[allow(dead_code)]
pub struct CountingBlobStore {
    pub inner: MemoryBlobStore,
    uploads: Arc<AtomicUsize>,
    deletes: Arc<AtomicUsize>,
    fail_uploads: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl CountingBlobStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryBlobStore::new("http://localhost:8080", "jani-images"),
            uploads: Arc::new(AtomicUsize::new(0)),
            deletes: Arc::new(AtomicUsize::new(0)),
            fail_uploads: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn fail_uploads(&self) {
        self.fail_uploads.store(true, Ordering::SeqCst);
    }

    pub fn upload_calls(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobStore for CountingBlobStore {
    async fn upload(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::Provider(
                "The object exceeded the maximum allowed size".to_string(),
            ));
        }
        self.inner.upload(key, bytes, content_type).await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(key).await
    }

    fn resolve_public_url(&self, key: &str) -> String {
        self.inner.resolve_public_url(key)
    }
}

/// Record store that counts calls and can be told to fail inserts or lists.
#[derive(Clone)]
#[allow(dead_code)]
pub struct CountingRecordStore {
    pub inner: MemoryRecordStore,
    inserts: Arc<AtomicUsize>,
    lists: Arc<AtomicUsize>,
    fail_inserts: Arc<AtomicBool>,
    fail_lists: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl CountingRecordStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryRecordStore::new(),
            inserts: Arc::new(AtomicUsize::new(0)),
            lists: Arc::new(AtomicUsize::new(0)),
            fail_inserts: Arc::new(AtomicBool::new(false)),
            fail_lists: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn fail_inserts(&self) {
        self.fail_inserts.store(true, Ordering::SeqCst);
    }

    pub fn fail_lists(&self, fail: bool) {
        self.fail_lists.store(fail, Ordering::SeqCst);
    }

    pub fn insert_calls(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for CountingRecordStore {
    async fn insert_report(&self, report: &NewReport) -> Result<Report, DbError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(DbError::Constraint(
                "null value in column \"latitude\" violates not-null constraint".to_string(),
            ));
        }
        self.inner.insert_report(report).await
    }

    async fn list_reports(&self) -> Result<Vec<Report>, DbError> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(DbError::Connection("connection refused".to_string()));
        }
        self.inner.list_reports().await
    }
}

/// Location source with a fixed answer.
#[allow(dead_code)]
pub struct FixedLocation {
    result: Result<Coordinates, PositionError>,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl FixedLocation {
    pub fn at(latitude: f64, longitude: f64) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(Coordinates::new(latitude, longitude)),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(err: PositionError) -> Arc<Self> {
        Arc::new(Self {
            result: Err(err),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocationSource for FixedLocation {
    async fn current_position(&self) -> Result<Coordinates, PositionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result
    }
}

/// Create a test app with in-memory gateways.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let blobs = MemoryBlobStore::new(&config.public_base_url, &config.storage_bucket);
    create_test_app_with(config, Arc::new(blobs), Arc::new(MemoryRecordStore::new()))
}

/// Create a test app over the given gateways.
#[allow(dead_code)]
pub fn create_test_app_with(
    config: Config,
    blobs: Arc<dyn BlobStore>,
    records: Arc<dyn RecordStore>,
) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config, blobs, records));
    (create_router(state.clone()), state)
}

/// Create an access token the way the identity provider does.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str, signing_key: &[u8]) -> String {
    create_test_jwt_for_audience(user_id, "authenticated", signing_key)
}

#[allow(dead_code)]
pub fn create_test_jwt_for_audience(user_id: &str, audience: &str, signing_key: &[u8]) -> String {
    #[derive(Serialize)]
    struct Claims {
        sub: String,
        email: String,
        aud: String,
        exp: usize,
        iat: usize,
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        email: format!("{}@example.com", user_id),
        aud: audience.to_string(),
        exp: now + 3600,
        iat: now,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )
    .unwrap()
}

/// One part of a multipart form body.
#[allow(dead_code)]
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

/// Encode `parts` as `multipart/form-data` with [`MULTIPART_BOUNDARY`].
#[allow(dead_code)]
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: {}\r\n\r\n",
                        name, file_name, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());
    body
}

/// `Content-Type` header value for [`multipart_body`].
#[allow(dead_code)]
pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY)
}
