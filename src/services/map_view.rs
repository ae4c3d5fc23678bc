// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Map/list view model built from the cached report collection.

use crate::models::Report;
use crate::services::reports_cache::QuerySnapshot;
use crate::storage::BlobStore;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Initial map centre (latitude, longitude).
pub const MAP_CENTER: [f64; 2] = [22.5937, 78.9629];
pub const MAP_ZOOM: u8 = 4;
pub const EMPTY_MESSAGE: &str = "No reports available";
/// Decimal places shown for coordinates.
const COORDINATE_PRECISION: usize = 6;

/// One map pin.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ReportMarker {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub image_url: String,
    pub description: Option<String>,
}

/// One card in the scrollable list.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ReportCard {
    pub id: String,
    /// "Report #n", 1-based in list order
    pub label: String,
    pub image_url: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    /// Fixed to six decimal places
    pub latitude: String,
    pub longitude: String,
}

/// Ready view: markers and cards for the same reports, in the same order.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MapView {
    pub center: [f64; 2],
    pub zoom: u8,
    pub markers: Vec<ReportMarker>,
    pub cards: Vec<ReportCard>,
    /// Placeholder when there are no reports
    pub empty_message: Option<String>,
    /// A background re-fetch is running
    pub refreshing: bool,
}

/// The three states of the map/list screen.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum MapViewState {
    Loading,
    Error { message: String },
    Ready(MapView),
}

impl MapViewState {
    /// Derive the view from a cache snapshot.
    ///
    /// A failed fetch shows the error even if older data is cached.
    pub fn from_snapshot(snapshot: &QuerySnapshot, blobs: &dyn BlobStore) -> Self {
        if snapshot.is_loading() {
            return MapViewState::Loading;
        }
        if let Some(message) = &snapshot.error {
            return MapViewState::Error {
                message: message.clone(),
            };
        }

        let reports = snapshot.data.as_deref().map(Vec::as_slice).unwrap_or(&[]);
        MapViewState::Ready(MapView::build(reports, blobs, snapshot.is_refreshing()))
    }
}

impl MapView {
    pub fn build(reports: &[Report], blobs: &dyn BlobStore, refreshing: bool) -> Self {
        let mut markers = Vec::with_capacity(reports.len());
        let mut cards = Vec::with_capacity(reports.len());

        for (index, report) in reports.iter().enumerate() {
            let image_url = blobs.resolve_public_url(&report.image_key);
            let id = report.id.to_string();

            markers.push(ReportMarker {
                id: id.clone(),
                latitude: report.latitude,
                longitude: report.longitude,
                image_url: image_url.clone(),
                description: report.description.clone(),
            });
            cards.push(ReportCard {
                id,
                label: format!("Report #{}", index + 1),
                image_url,
                description: report.description.clone(),
                tags: report.tags.names(),
                latitude: format_coordinate(report.latitude),
                longitude: format_coordinate(report.longitude),
            });
        }

        Self {
            center: MAP_CENTER,
            zoom: MAP_ZOOM,
            empty_message: reports.is_empty().then(|| EMPTY_MESSAGE.to_string()),
            markers,
            cards,
            refreshing,
        }
    }

    /// Markers as a GeoJSON `FeatureCollection` (positions are `[lon, lat]`).
    pub fn to_feature_collection(&self) -> FeatureCollection {
        let features = self
            .markers
            .iter()
            .map(|marker| {
                let mut properties = JsonObject::new();
                properties.insert("id".to_string(), marker.id.clone().into());
                properties.insert("image_url".to_string(), marker.image_url.clone().into());
                properties.insert(
                    "description".to_string(),
                    marker
                        .description
                        .clone()
                        .map(serde_json::Value::from)
                        .unwrap_or(serde_json::Value::Null),
                );

                Feature {
                    bbox: None,
                    geometry: Some(Geometry::new(Value::Point(vec![
                        marker.longitude,
                        marker.latitude,
                    ]))),
                    id: Some(geojson::feature::Id::String(marker.id.clone())),
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }
}

/// Format a coordinate to six decimal places.
pub fn format_coordinate(value: f64) -> String {
    format!("{:.*}", COORDINATE_PRECISION, value)
}
