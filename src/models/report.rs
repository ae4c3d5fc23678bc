// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Pollution report model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Maximum description length, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 200;

/// Kind of pollution a report is tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum PollutionType {
    Air,
    Water,
    Waste,
    Noise,
}

impl PollutionType {
    /// Every tag, in display order.
    pub const ALL: [PollutionType; 4] = [
        PollutionType::Air,
        PollutionType::Water,
        PollutionType::Waste,
        PollutionType::Noise,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PollutionType::Air => "Air",
            PollutionType::Water => "Water",
            PollutionType::Waste => "Waste",
            PollutionType::Noise => "Noise",
        }
    }

    /// Parse a tag name, ignoring case and surrounding whitespace.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for PollutionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Multi-select set of pollution tags.
///
/// Stored in the `pollution_type` column as comma-separated text
/// (`"Air, Water"`). Reads also accept a JSON array or null.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSelection(BTreeSet<PollutionType>);

impl TagSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the tag if absent, remove it if present.
    pub fn toggle(&mut self, tag: PollutionType) {
        if !self.0.remove(&tag) {
            self.0.insert(tag);
        }
    }

    pub fn contains(&self, tag: PollutionType) -> bool {
        self.0.contains(&tag)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = PollutionType> + '_ {
        self.0.iter().copied()
    }

    /// Tag names in display order.
    pub fn names(&self) -> Vec<String> {
        self.iter().map(|t| t.to_string()).collect()
    }

    /// Column text form, e.g. `"Air, Water"`.
    pub fn to_column_text(&self) -> String {
        self.iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Parse the column text form. Unknown names are skipped.
    pub fn from_column_text(text: &str) -> Self {
        text.split(',').filter_map(PollutionType::parse).collect()
    }
}

impl FromIterator<PollutionType> for TagSelection {
    fn from_iter<I: IntoIterator<Item = PollutionType>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for TagSelection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_column_text())
    }
}

impl<'de> Deserialize<'de> for TagSelection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            List(Vec<String>),
        }

        Ok(match Option::<Raw>::deserialize(deserializer)? {
            None => TagSelection::new(),
            Some(Raw::Text(text)) => TagSelection::from_column_text(&text),
            Some(Raw::List(items)) => items
                .iter()
                .filter_map(|s| PollutionType::parse(s))
                .collect(),
        })
    }
}

/// Store-assigned report identifier (bigint or uuid depending on the table).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReportId {
    Int(i64),
    Text(String),
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportId::Int(id) => write!(f, "{}", id),
            ReportId::Text(id) => f.write_str(id),
        }
    }
}

/// Device coordinates in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Finite and inside the WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Stored report row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub description: Option<String>,
    /// Storage key of the photo (not a URL, despite the column name)
    #[serde(rename = "public_image_url")]
    pub image_key: String,
    #[serde(rename = "pollution_type", default)]
    pub tags: TagSelection,
    /// Set by the store when the table has a `created_at` default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Row sent to the store on insert. The store assigns `id`.
#[derive(Debug, Clone, Serialize)]
pub struct NewReport {
    pub latitude: f64,
    pub longitude: f64,
    /// Text as typed; `None` when blank
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "public_image_url")]
    pub image_key: String,
    #[serde(rename = "pollution_type", skip_serializing_if = "TagSelection::is_empty")]
    pub tags: TagSelection,
    /// Client-side submission time; advisory and not persisted
    #[serde(skip)]
    pub timestamp: DateTime<Utc>,
}
