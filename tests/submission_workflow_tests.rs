// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Submission workflow tests against counting, fault-injecting gateways.
//!
//! These tests verify that:
//! 1. A successful submission walks Idle → Locating → Submitting → Success once
//! 2. Each failure returns to Idle with the form intact and stops the pipeline
//! 3. The reports cache is invalidated exactly once per confirmed insert

mod common;

use bytes::Bytes;
use common::{CountingBlobStore, CountingRecordStore, FixedLocation};
use jani_reports::error::AppError;
use jani_reports::models::image::{ValidationError, MAX_IMAGE_BYTES};
use jani_reports::models::{ImageFile, PollutionType};
use jani_reports::services::geolocation::{LocationError, PositionError};
use jani_reports::services::{
    GeolocationAcquirer, MapView, MapViewState, ReportForm, ReportsCache, SubmissionStatus,
    SubmissionWorkflow,
};
use jani_reports::storage::BlobStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

struct Harness {
    blobs: CountingBlobStore,
    records: CountingRecordStore,
    cache: ReportsCache,
    workflow: SubmissionWorkflow,
}

fn harness() -> Harness {
    harness_with_cleanup(false)
}

fn harness_with_cleanup(orphan_cleanup: bool) -> Harness {
    let blobs = CountingBlobStore::new();
    let records = CountingRecordStore::new();
    let cache = ReportsCache::new(Arc::new(records.clone()));
    let workflow = SubmissionWorkflow::new(
        Arc::new(blobs.clone()),
        Arc::new(records.clone()),
        cache.clone(),
    )
    .with_orphan_cleanup(orphan_cleanup);

    Harness {
        blobs,
        records,
        cache,
        workflow,
    }
}

fn photo() -> ImageFile {
    ImageFile::new(
        "river.jpg",
        "image/jpeg",
        Bytes::from_static(common::JPEG_BYTES),
    )
}

fn filled_form() -> ReportForm {
    let mut form = ReportForm::new();
    form.select_image(photo()).unwrap();
    form.set_description("Oil slick near the bridge");
    form.toggle_type(PollutionType::Water);
    form
}

fn drain(rx: &mut broadcast::Receiver<SubmissionStatus>) -> Vec<SubmissionStatus> {
    let mut seen = Vec::new();
    while let Ok(status) = rx.try_recv() {
        seen.push(status);
    }
    seen
}

#[tokio::test]
async fn test_description_is_stored_as_typed() {
    let h = harness();
    let location = GeolocationAcquirer::new(FixedLocation::at(1.0, 2.0));

    let mut form = filled_form();
    form.set_description("  two spaces  ");
    let report = h.workflow.submit(&mut form, &location).await.unwrap();
    assert_eq!(report.description.as_deref(), Some("  two spaces  "));

    let mut form = filled_form();
    form.set_description("   ");
    let report = h.workflow.submit(&mut form, &location).await.unwrap();
    assert!(report.description.is_none());
}

#[tokio::test]
async fn test_successful_submission_transitions_once() {
    let h = harness();
    let mut statuses = h.workflow.subscribe_status();
    let before = h.cache.read().await.unwrap().len();

    let mut form = filled_form();
    let location = GeolocationAcquirer::new(FixedLocation::at(12.34, 56.78));
    let report = h.workflow.submit(&mut form, &location).await.unwrap();

    assert_eq!(
        drain(&mut statuses),
        vec![
            SubmissionStatus::Locating,
            SubmissionStatus::Submitting,
            SubmissionStatus::Success
        ]
    );
    assert_eq!(form.status(), SubmissionStatus::Success);
    assert!(!form.is_loading());
    assert!(form.error_message().is_none());

    assert_eq!(report.latitude, 12.34);
    assert_eq!(report.longitude, 56.78);
    assert_eq!(
        report.description.as_deref(),
        Some("Oil slick near the bridge")
    );
    assert!(report.tags.contains(PollutionType::Water));
    assert!(h.blobs.inner.contains(&report.image_key));
    assert!(report.image_key.ends_with(".jpg"));

    assert_eq!(h.blobs.upload_calls(), 1);
    assert_eq!(h.records.insert_calls(), 1);
    assert_eq!(h.cache.invalidation_count(), 1);

    let reports = h.cache.read().await.unwrap();
    let view = MapView::build(&reports, &h.blobs, false);
    assert_eq!(view.markers.len(), before + 1);
    assert_eq!(view.cards[0].latitude, "12.340000");
}

#[tokio::test]
async fn test_subscribed_view_refreshes_after_submission() {
    let h = harness();
    let mut rx = h.cache.subscribe();
    rx.wait_for(|s| s.version == 1).await.unwrap();

    let mut form = filled_form();
    let location = GeolocationAcquirer::new(FixedLocation::at(12.34, 56.78));
    h.workflow.submit(&mut form, &location).await.unwrap();

    let snapshot = tokio::time::timeout(
        Duration::from_secs(5),
        rx.wait_for(|s| s.version == 2 && !s.is_fetching),
    )
    .await
    .expect("cache was not refreshed")
    .unwrap()
    .clone();

    let MapViewState::Ready(view) = MapViewState::from_snapshot(&snapshot, &h.blobs) else {
        panic!("expected ready state");
    };
    assert_eq!(view.markers.len(), 1);
    assert_eq!(view.cards[0].label, "Report #1");
}

#[tokio::test]
async fn test_location_failure_makes_no_gateway_calls() {
    let h = harness();
    let mut statuses = h.workflow.subscribe_status();

    let mut form = filled_form();
    let location = GeolocationAcquirer::new(FixedLocation::failing(
        PositionError::PermissionDenied,
    ));
    let err = h.workflow.submit(&mut form, &location).await.unwrap_err();

    assert!(matches!(err, AppError::Location(LocationError::Denied)));
    assert_eq!(
        drain(&mut statuses),
        vec![SubmissionStatus::Locating, SubmissionStatus::Idle]
    );
    assert_eq!(form.status(), SubmissionStatus::Idle);
    assert_eq!(
        form.error_message(),
        Some("Unable to retrieve your location. Please enable location services.")
    );

    // Contents kept for a retry
    assert!(form.image().is_some());
    assert_eq!(form.description(), "Oil slick near the bridge");
    assert!(form.can_submit());

    assert_eq!(h.blobs.upload_calls(), 0);
    assert_eq!(h.records.insert_calls(), 0);
    assert_eq!(h.cache.invalidation_count(), 0);
}

#[tokio::test]
async fn test_unsupported_geolocation() {
    let h = harness();
    let mut form = filled_form();

    let err = h
        .workflow
        .submit(&mut form, &GeolocationAcquirer::unsupported())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Location(LocationError::Unsupported)));
    assert_eq!(
        form.error_message(),
        Some("Geolocation is not supported by your browser.")
    );
    assert_eq!(h.blobs.upload_calls(), 0);
}

#[tokio::test]
async fn test_upload_failure_skips_insert() {
    let h = harness();
    h.blobs.fail_uploads();

    let mut form = filled_form();
    let location = GeolocationAcquirer::new(FixedLocation::at(12.34, 56.78));
    let err = h.workflow.submit(&mut form, &location).await.unwrap_err();

    assert!(matches!(err, AppError::Storage(_)));
    assert_eq!(form.status(), SubmissionStatus::Idle);
    assert_eq!(
        form.error_message(),
        Some("The object exceeded the maximum allowed size")
    );
    assert_eq!(h.blobs.upload_calls(), 1);
    assert_eq!(h.records.insert_calls(), 0);
    assert_eq!(h.cache.invalidation_count(), 0);
}

#[tokio::test]
async fn test_insert_failure_leaves_orphaned_photo() {
    let h = harness();
    h.records.fail_inserts();

    let mut form = filled_form();
    let location = GeolocationAcquirer::new(FixedLocation::at(12.34, 56.78));
    let err = h.workflow.submit(&mut form, &location).await.unwrap_err();

    assert!(matches!(err, AppError::Database(_)));
    assert_eq!(form.status(), SubmissionStatus::Idle);
    assert_eq!(
        form.error_message(),
        Some("null value in column \"latitude\" violates not-null constraint")
    );

    // Accepted debt: the photo stays in the bucket with no row pointing at it
    assert_eq!(h.blobs.inner.len(), 1);
    assert_eq!(h.blobs.delete_calls(), 0);
    assert_eq!(h.cache.invalidation_count(), 0);
}

#[tokio::test]
async fn test_insert_failure_with_orphan_cleanup() {
    let h = harness_with_cleanup(true);
    h.records.fail_inserts();

    let mut form = filled_form();
    let location = GeolocationAcquirer::new(FixedLocation::at(12.34, 56.78));
    h.workflow.submit(&mut form, &location).await.unwrap_err();

    assert_eq!(h.blobs.upload_calls(), 1);
    assert_eq!(h.blobs.delete_calls(), 1);
    assert!(h.blobs.inner.is_empty());
}

#[tokio::test]
async fn test_success_is_terminal_until_reset() {
    let h = harness();
    let location = FixedLocation::at(1.0, 2.0);
    let acquirer = GeolocationAcquirer::new(location.clone());

    let mut form = filled_form();
    h.workflow.submit(&mut form, &acquirer).await.unwrap();
    assert!(!form.can_submit());

    let err = h.workflow.submit(&mut form, &acquirer).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(location.calls(), 1);
    assert_eq!(h.records.insert_calls(), 1);

    form.reset();
    assert_eq!(form.status(), SubmissionStatus::Idle);
    assert!(!form.can_submit());

    form.select_image(photo()).unwrap();
    h.workflow.submit(&mut form, &acquirer).await.unwrap();
    assert_eq!(h.records.insert_calls(), 2);
    assert_eq!(h.cache.invalidation_count(), 2);
}

#[test]
fn test_selection_accepts_valid_photos() {
    for (name, content_type, size) in [
        ("a.jpg", "image/jpeg", 1),
        ("b.png", "image/png", 1024),
        ("c.jpg", "image/jpg", MAX_IMAGE_BYTES),
    ] {
        let mut form = ReportForm::new();
        let file = ImageFile::new(name, content_type, Bytes::from(vec![0u8; size]));
        form.select_image(file).unwrap();

        let preview = form.preview().unwrap();
        assert!(preview.starts_with(&format!("data:{};base64,", content_type)));
        assert!(form.error_message().is_none());
    }
}

#[test]
fn test_selection_rejects_bad_photos() {
    let cases = [
        (
            ImageFile::new("a.gif", "image/gif", Bytes::from_static(b"GIF89a")),
            ValidationError::UnsupportedType,
            "Only JPG and PNG images are allowed.",
        ),
        (
            ImageFile::new(
                "big.png",
                "image/png",
                Bytes::from(vec![0u8; MAX_IMAGE_BYTES + 1]),
            ),
            ValidationError::TooLarge,
            "Image size must be less than 3MB.",
        ),
    ];

    for (file, expected, message) in cases {
        let mut form = ReportForm::new();
        assert_eq!(form.select_image(file).unwrap_err(), expected);
        assert!(form.preview().is_none());
        assert!(form.image().is_none());
        assert_eq!(form.error_message(), Some(message));
        assert_eq!(form.status(), SubmissionStatus::Idle);
    }
}

#[test]
fn test_toggle_twice_is_identity() {
    let mut form = ReportForm::new();
    form.toggle_type(PollutionType::Air);
    let original = form.tags().clone();

    for tag in PollutionType::ALL {
        form.toggle_type(tag);
        form.toggle_type(tag);
        assert_eq!(form.tags(), &original);
    }
}

#[test]
fn test_resolve_public_url_is_pure() {
    let blobs = CountingBlobStore::new();
    let first = blobs.resolve_public_url("1700000000000_abcd.jpg");
    let second = blobs.resolve_public_url("1700000000000_abcd.jpg");

    assert_eq!(first, second);
    assert_eq!(
        first,
        "http://localhost:8080/storage/v1/object/public/jani-images/1700000000000_abcd.jpg"
    );
    // Missing keys still resolve; the fetch is what fails
    assert!(blobs.resolve_public_url("missing.png").ends_with("/missing.png"));
}
