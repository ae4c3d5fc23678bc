// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process [`RecordStore`] used for local development and tests.

use super::{DbError, RecordStore};
use crate::models::{NewReport, Report, ReportId};
use async_trait::async_trait;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Reports kept in insertion order with sequential ids. Clones share rows.
#[derive(Clone, Default)]
pub struct MemoryRecordStore {
    rows: Arc<RwLock<Vec<Report>>>,
    next_id: Arc<AtomicI64>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert_report(&self, report: &NewReport) -> Result<Report, DbError> {
        if !report.latitude.is_finite() || !report.longitude.is_finite() {
            return Err(DbError::Constraint(
                "latitude and longitude must be numbers".to_string(),
            ));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let row = Report {
            id: ReportId::Int(id),
            latitude: report.latitude,
            longitude: report.longitude,
            description: report.description.clone(),
            image_key: report.image_key.clone(),
            tags: report.tags.clone(),
            created_at: Some(chrono::Utc::now()),
        };

        self.rows.write().await.push(row.clone());
        Ok(row)
    }

    async fn list_reports(&self) -> Result<Vec<Report>, DbError> {
        Ok(self.rows.read().await.clone())
    }
}
