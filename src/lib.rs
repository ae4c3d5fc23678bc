// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Jani: community pollution reporting
//!
//! This crate provides the backend API for submitting geotagged pollution
//! photos and browsing every submitted report on a map and in a list.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod storage;
pub mod time_utils;

use config::Config;
use dashmap::DashMap;
use db::{MemoryRecordStore, RecordStore, SupabaseRecords};
use services::{ReportsCache, SubmissionWorkflow, SupabaseClient};
use std::sync::Arc;
use storage::{BlobStore, MemoryBlobStore, SupabaseStorage};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub blob_store: Arc<dyn BlobStore>,
    pub record_store: Arc<dyn RecordStore>,
    pub reports_cache: ReportsCache,
    pub workflow: SubmissionWorkflow,
    /// Users with a submission currently running
    pub submissions_in_flight: DashMap<String, ()>,
}

impl AppState {
    /// Wire the cache and workflow over the given gateways.
    pub fn new(
        config: Config,
        blob_store: Arc<dyn BlobStore>,
        record_store: Arc<dyn RecordStore>,
    ) -> Self {
        let reports_cache = ReportsCache::new(record_store.clone());
        let workflow = SubmissionWorkflow::new(
            blob_store.clone(),
            record_store.clone(),
            reports_cache.clone(),
        )
        .with_orphan_cleanup(config.orphan_cleanup);

        Self {
            config,
            blob_store,
            record_store,
            reports_cache,
            workflow,
            submissions_in_flight: DashMap::new(),
        }
    }

    /// Pick hosted or in-memory gateways from the configuration.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let Some(base_url) = config.supabase_url.clone() else {
            tracing::warn!("SUPABASE_URL not set; using in-memory gateways");
            let blobs = MemoryBlobStore::new(&config.public_base_url, &config.storage_bucket);
            return Ok(Self::new(
                config,
                Arc::new(blobs),
                Arc::new(MemoryRecordStore::new()),
            ));
        };

        let client = SupabaseClient::new(&base_url, &config.supabase_api_key)?;
        let blobs = SupabaseStorage::new(client.clone(), &base_url, &config.storage_bucket);
        let records = SupabaseRecords::new(client, &config.reports_table);
        tracing::info!(
            url = %base_url,
            bucket = %config.storage_bucket,
            table = %config.reports_table,
            "Supabase gateways initialized"
        );

        Ok(Self::new(config, Arc::new(blobs), Arc::new(records)))
    }
}
