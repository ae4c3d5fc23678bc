// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! One-shot device geolocation.

use crate::models::Coordinates;
use async_trait::async_trait;
use std::sync::Arc;

const LOCATION_FAILED: &str = "Unable to retrieve your location. Please enable location services.";

/// Failure reported by the host's position API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionError {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
}

/// Location errors surfaced to the user.
///
/// Denied, unavailable and timeout share one message; the variants stay
/// distinct for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("Geolocation is not supported by your browser.")]
    Unsupported,

    #[error("{}", LOCATION_FAILED)]
    Denied,

    #[error("{}", LOCATION_FAILED)]
    Unavailable,

    #[error("{}", LOCATION_FAILED)]
    Timeout,
}

impl From<PositionError> for LocationError {
    fn from(err: PositionError) -> Self {
        match err {
            PositionError::PermissionDenied => LocationError::Denied,
            PositionError::PositionUnavailable => LocationError::Unavailable,
            PositionError::Timeout => LocationError::Timeout,
        }
    }
}

/// Host capability: "get current position".
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, PositionError>;
}

/// Single-shot wrapper over an optional [`LocationSource`].
#[derive(Clone, Default)]
pub struct GeolocationAcquirer {
    source: Option<Arc<dyn LocationSource>>,
}

impl GeolocationAcquirer {
    pub fn new(source: Arc<dyn LocationSource>) -> Self {
        Self {
            source: Some(source),
        }
    }

    /// Acquirer for a host without geolocation.
    pub fn unsupported() -> Self {
        Self { source: None }
    }

    pub fn is_supported(&self) -> bool {
        self.source.is_some()
    }

    /// Ask for the current position once. No retry.
    pub async fn acquire_location(&self) -> Result<Coordinates, LocationError> {
        let source = self.source.as_ref().ok_or(LocationError::Unsupported)?;

        let position = source.current_position().await.map_err(|err| {
            tracing::warn!(error = ?err, "Geolocation request failed");
            LocationError::from(err)
        })?;

        if !position.is_valid() {
            tracing::warn!(
                latitude = position.latitude,
                longitude = position.longitude,
                "Geolocation returned out-of-range coordinates"
            );
            return Err(LocationError::Unavailable);
        }

        Ok(position)
    }
}

/// Position already captured on the device and sent along with the form.
#[derive(Debug, Clone, Copy)]
pub struct ReportedPosition(pub Result<Coordinates, PositionError>);

impl ReportedPosition {
    /// Build an acquirer from the form fields the client sent.
    ///
    /// `error` takes precedence; without coordinates or an error the host is
    /// treated as lacking geolocation.
    pub fn acquirer(
        latitude: Option<f64>,
        longitude: Option<f64>,
        error: Option<&str>,
    ) -> GeolocationAcquirer {
        let reported = match (error.map(str::trim), latitude, longitude) {
            (Some(e), _, _) if e.eq_ignore_ascii_case("unsupported") => {
                return GeolocationAcquirer::unsupported()
            }
            (Some(e), _, _) if e.eq_ignore_ascii_case("denied") => {
                Err(PositionError::PermissionDenied)
            }
            (Some(e), _, _) if e.eq_ignore_ascii_case("timeout") => Err(PositionError::Timeout),
            (Some(_), _, _) => Err(PositionError::PositionUnavailable),
            (None, Some(lat), Some(lon)) => Ok(Coordinates::new(lat, lon)),
            (None, None, None) => return GeolocationAcquirer::unsupported(),
            (None, _, _) => Err(PositionError::PositionUnavailable),
        };
        GeolocationAcquirer::new(Arc::new(ReportedPosition(reported)))
    }
}

#[async_trait]
impl LocationSource for ReportedPosition {
    async fn current_position(&self) -> Result<Coordinates, PositionError> {
        self.0
    }
}
