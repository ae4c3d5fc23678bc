// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Report listing, map view and submission routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::image::ValidationError;
use crate::models::report::MAX_DESCRIPTION_CHARS;
use crate::models::{ImageFile, PollutionType, Report, TagSelection};
use crate::services::map_view::{MapView, MapViewState};
use crate::services::{ReportForm, ReportedPosition};
use crate::storage::BlobStore;
use crate::time_utils::format_iso8601_millis;
use crate::AppState;
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use dashmap::{mapref::entry::Entry, DashMap};
use serde::Serialize;
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Public read routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/reports", get(list_reports))
        .route("/api/reports/view", get(get_view))
        .route("/api/reports/map.geojson", get(get_geojson))
}

/// Submission route (requires authentication).
/// The auth middleware is applied in routes/mod.rs.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/reports", post(create_report))
}

// ─── Listing ─────────────────────────────────────────────────

/// One report with its photo URL resolved.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ReportResponse {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub image_url: String,
    pub created_at: Option<String>,
}

impl ReportResponse {
    fn from_report(report: &Report, blobs: &dyn BlobStore) -> Self {
        Self {
            id: report.id.to_string(),
            latitude: report.latitude,
            longitude: report.longitude,
            description: report.description.clone(),
            tags: report.tags.names(),
            image_url: blobs.resolve_public_url(&report.image_key),
            created_at: report.created_at.map(format_iso8601_millis),
        }
    }
}

/// All reports, served from the cache when fresh.
async fn list_reports(State(state): State<Arc<AppState>>) -> Result<Json<Vec<ReportResponse>>> {
    let reports = state.reports_cache.read().await?;
    let blobs = state.blob_store.as_ref();

    Ok(Json(
        reports
            .iter()
            .map(|report| ReportResponse::from_report(report, blobs))
            .collect(),
    ))
}

/// Current map/list state. Never waits for a fetch.
async fn get_view(State(state): State<Arc<AppState>>) -> Json<MapViewState> {
    let snapshot = state.reports_cache.snapshot();
    state.reports_cache.prefetch();

    Json(MapViewState::from_snapshot(
        &snapshot,
        state.blob_store.as_ref(),
    ))
}

/// Map markers as GeoJSON.
async fn get_geojson(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse> {
    let reports = state.reports_cache.read().await?;
    let view = MapView::build(&reports, state.blob_store.as_ref(), false);

    Ok((
        [(header::CONTENT_TYPE, "application/geo+json")],
        Json(view.to_feature_collection()),
    ))
}

// ─── Submission ──────────────────────────────────────────────

/// Text fields of the submission form.
#[derive(Debug, Default, Validate)]
struct ReportFields {
    #[validate(length(max = 200))]
    description: String,
    types: TagSelection,
    latitude: Option<f64>,
    longitude: Option<f64>,
    location_error: Option<String>,
}

/// Marks a user's submission as running until dropped.
struct InFlightGuard<'a> {
    submissions: &'a DashMap<String, ()>,
    user_id: String,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(submissions: &'a DashMap<String, ()>, user_id: &str) -> Option<Self> {
        match submissions.entry(user_id.to_string()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(entry) => {
                entry.insert(());
                Some(Self {
                    submissions,
                    user_id: user_id.to_string(),
                })
            }
        }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.submissions.remove(&self.user_id);
    }
}

/// Submit a report (multipart form).
async fn create_report(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ReportResponse>)> {
    let _guard = InFlightGuard::acquire(&state.submissions_in_flight, &user.user_id)
        .ok_or_else(|| AppError::Conflict("A report is already being submitted.".to_string()))?;

    let (image, fields) = read_form(multipart).await?;
    fields
        .validate()
        .map_err(|_| ValidationError::DescriptionTooLong {
            max: MAX_DESCRIPTION_CHARS,
        })?;

    let mut form = ReportForm::new();
    if let Some(image) = image {
        form.select_image(image)?;
    }
    form.set_description(&fields.description);
    for tag in fields.types.iter() {
        form.toggle_type(tag);
    }

    let location = ReportedPosition::acquirer(
        fields.latitude,
        fields.longitude,
        fields.location_error.as_deref(),
    );

    tracing::debug!(user_id = %user.user_id, tags = fields.types.len(), "Report submission");
    let report = state.workflow.submit(&mut form, &location).await?;

    Ok((
        StatusCode::CREATED,
        Json(ReportResponse::from_report(
            &report,
            state.blob_store.as_ref(),
        )),
    ))
}

/// Collect the multipart fields. Unknown fields are ignored.
async fn read_form(mut multipart: Multipart) -> Result<(Option<ImageFile>, ReportFields)> {
    let mut image = None;
    let mut fields = ReportFields::default();

    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        let name = field.name().unwrap_or_default().to_string();

        if name == "image" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().unwrap_or_default().to_string();
            let bytes = field.bytes().await.map_err(form_error)?;
            // An empty file input is the same as no file.
            if !bytes.is_empty() {
                image = Some(ImageFile::new(file_name, content_type, bytes));
            }
            continue;
        }

        let value = field.text().await.map_err(form_error)?;

        match name.as_str() {
            "description" => fields.description = value,
            "types" => {
                for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                    let tag = PollutionType::parse(part).ok_or_else(|| {
                        AppError::BadRequest(format!("Unknown pollution type: {}", part))
                    })?;
                    if !fields.types.contains(tag) {
                        fields.types.toggle(tag);
                    }
                }
            }
            "latitude" => fields.latitude = Some(parse_coordinate(&name, &value)?),
            "longitude" => fields.longitude = Some(parse_coordinate(&name, &value)?),
            "location_error" => {
                let value = value.trim();
                fields.location_error = (!value.is_empty()).then(|| value.to_string());
            }
            _ => tracing::debug!(field = %name, "Ignoring unknown form field"),
        }
    }

    Ok((image, fields))
}

/// Only the photo can push the form past the body limit, so report it the
/// same way as an oversized file that fits.
fn form_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ValidationError::TooLarge.into()
    } else {
        err.into()
    }
}

fn parse_coordinate(name: &str, value: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| AppError::BadRequest(format!("Invalid {}: {}", name, value)))
}
