// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Report submission workflow.
//!
//! Handles the core flow:
//! 1. Validate the selected photo (at selection time)
//! 2. Acquire the device location
//! 3. Upload the photo under a fresh storage key
//! 4. Insert the report row
//! 5. Invalidate the reports cache
//!
//! Upload and insert are independent remote calls. If the insert fails the
//! uploaded photo stays in the bucket unreferenced unless orphan cleanup is
//! enabled.

use crate::db::RecordStore;
use crate::error::{AppError, Result};
use crate::models::image::ValidationError;
use crate::models::report::MAX_DESCRIPTION_CHARS;
use crate::models::{ImageFile, NewReport, PollutionType, Report, TagSelection};
use crate::services::geolocation::GeolocationAcquirer;
use crate::services::reports_cache::ReportsCache;
use crate::storage::BlobStore;
use crate::time_utils::format_iso8601_millis;
use chrono::Utc;
use ring::rand::{SecureRandom, SystemRandom};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Random bytes in a storage key suffix.
const KEY_RANDOM_BYTES: usize = 8;
const STATUS_CHANNEL_CAPACITY: usize = 32;

/// Where a submission stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Idle,
    Locating,
    Submitting,
    Success,
}

/// Report form contents plus submission state.
///
/// Failures return the form to `Idle` with contents intact; only
/// [`ReportForm::reset`] clears it.
#[derive(Debug, Clone)]
pub struct ReportForm {
    image: Option<ImageFile>,
    preview: Option<String>,
    description: String,
    tags: TagSelection,
    status: SubmissionStatus,
    error_message: Option<String>,
    loading: bool,
}

impl Default for ReportForm {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportForm {
    pub fn new() -> Self {
        Self {
            image: None,
            preview: None,
            description: String::new(),
            tags: TagSelection::new(),
            status: SubmissionStatus::Idle,
            error_message: None,
            loading: false,
        }
    }

    /// Select a photo. Rejected files leave the current selection alone and
    /// set the inline error.
    pub fn select_image(&mut self, file: ImageFile) -> std::result::Result<(), ValidationError> {
        if let Err(e) = file.validate() {
            self.error_message = Some(e.to_string());
            return Err(e);
        }

        self.error_message = None;
        self.preview = Some(file.preview_data_url());
        self.image = Some(file);
        Ok(())
    }

    pub fn clear_image(&mut self) {
        self.image = None;
        self.preview = None;
    }

    pub fn toggle_type(&mut self, tag: PollutionType) {
        self.tags.toggle(tag);
    }

    /// Set the description, keeping at most 200 characters.
    pub fn set_description(&mut self, text: &str) {
        self.description = text.chars().take(MAX_DESCRIPTION_CHARS).collect();
    }

    /// Characters used, for the "n/200" counter.
    pub fn character_count(&self) -> usize {
        self.description.chars().count()
    }

    /// Submit is enabled only with a photo and nothing in flight.
    pub fn can_submit(&self) -> bool {
        self.image.is_some() && !self.loading && self.status != SubmissionStatus::Success
    }

    /// Clear every field and return to `Idle`.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn status(&self) -> SubmissionStatus {
        self.status
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn image(&self) -> Option<&ImageFile> {
        self.image.as_ref()
    }

    pub fn preview(&self) -> Option<&str> {
        self.preview.as_deref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn tags(&self) -> &TagSelection {
        &self.tags
    }
}

/// Runs submissions against injected gateways.
pub struct SubmissionWorkflow {
    blobs: Arc<dyn BlobStore>,
    records: Arc<dyn RecordStore>,
    cache: ReportsCache,
    status_tx: broadcast::Sender<SubmissionStatus>,
    orphan_cleanup: bool,
    rng: SystemRandom,
}

impl SubmissionWorkflow {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        records: Arc<dyn RecordStore>,
        cache: ReportsCache,
    ) -> Self {
        let (status_tx, _) = broadcast::channel(STATUS_CHANNEL_CAPACITY);
        Self {
            blobs,
            records,
            cache,
            status_tx,
            orphan_cleanup: false,
            rng: SystemRandom::new(),
        }
    }

    /// Delete the uploaded photo again when the row insert fails.
    pub fn with_orphan_cleanup(mut self, enabled: bool) -> Self {
        self.orphan_cleanup = enabled;
        self
    }

    /// Receive every status transition from now on.
    pub fn subscribe_status(&self) -> broadcast::Receiver<SubmissionStatus> {
        self.status_tx.subscribe()
    }

    /// Generate `{epoch_millis}_{random hex}.{ext}` for `image`.
    pub fn storage_key(&self, image: &ImageFile) -> Result<String> {
        let mut random = [0u8; KEY_RANDOM_BYTES];
        self.rng
            .fill(&mut random)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG unavailable")))?;

        Ok(format!(
            "{}_{}.{}",
            Utc::now().timestamp_millis(),
            hex::encode(random),
            image.extension()
        ))
    }

    /// Run one submission for `form`.
    ///
    /// On failure the form is back in `Idle` with the error message set and
    /// its contents untouched.
    pub async fn submit(
        &self,
        form: &mut ReportForm,
        location: &GeolocationAcquirer,
    ) -> Result<Report> {
        if form.loading {
            return Err(AppError::Conflict(
                "A report is already being submitted.".to_string(),
            ));
        }
        if form.status == SubmissionStatus::Success {
            return Err(AppError::Conflict(
                "Report already submitted. Reset the form to submit another.".to_string(),
            ));
        }
        let Some(image) = form.image.clone() else {
            let err = ValidationError::MissingImage;
            form.error_message = Some(err.to_string());
            return Err(err.into());
        };

        form.loading = true;
        form.error_message = None;
        self.transition(form, SubmissionStatus::Locating);

        let result = self.run(form, &image, location).await;
        form.loading = false;

        match result {
            Ok(report) => {
                self.transition(form, SubmissionStatus::Success);
                Ok(report)
            }
            Err(e) => {
                form.error_message = Some(e.user_message());
                self.transition(form, SubmissionStatus::Idle);
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        form: &mut ReportForm,
        image: &ImageFile,
        location: &GeolocationAcquirer,
    ) -> Result<Report> {
        let position = location.acquire_location().await?;

        self.transition(form, SubmissionStatus::Submitting);

        let key = self.storage_key(image)?;
        self.blobs
            .upload(&key, image.bytes.clone(), &image.content_type)
            .await
            .map_err(|e| {
                tracing::warn!(key = %key, error = %e, "Photo upload failed");
                e
            })?;

        let row = NewReport {
            latitude: position.latitude,
            longitude: position.longitude,
            description: (!form.description.trim().is_empty()).then(|| form.description.clone()),
            image_key: key.clone(),
            tags: form.tags.clone(),
            timestamp: Utc::now(),
        };

        let report = match self.records.insert_report(&row).await {
            Ok(report) => report,
            Err(e) => {
                self.handle_orphan(&key).await;
                return Err(e.into());
            }
        };

        self.cache.invalidate();

        tracing::info!(
            report_id = %report.id,
            key = %key,
            latitude = row.latitude,
            longitude = row.longitude,
            tags = %row.tags.to_column_text(),
            timestamp = %format_iso8601_millis(row.timestamp),
            "Report submitted"
        );
        Ok(report)
    }

    async fn handle_orphan(&self, key: &str) {
        if !self.orphan_cleanup {
            tracing::warn!(key, "Insert failed after upload; photo left orphaned");
            return;
        }

        match self.blobs.delete(key).await {
            Ok(()) => tracing::info!(key, "Removed photo after failed insert"),
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to remove photo after failed insert")
            }
        }
    }

    fn transition(&self, form: &mut ReportForm, next: SubmissionStatus) {
        tracing::debug!(from = ?form.status, to = ?next, "Submission status");
        form.status = next;
        // No receivers is fine.
        let _ = self.status_tx.send(next);
    }
}
