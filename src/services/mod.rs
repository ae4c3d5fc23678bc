// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod geolocation;
pub mod map_view;
pub mod reports_cache;
pub mod session;
pub mod submission;
pub mod supabase;

pub use geolocation::{GeolocationAcquirer, LocationError, LocationSource, ReportedPosition};
pub use map_view::{MapView, MapViewState};
pub use reports_cache::{QuerySnapshot, ReportsCache};
pub use session::{ChannelSessionSource, SessionProvider, SessionSource};
pub use submission::{ReportForm, SubmissionStatus, SubmissionWorkflow};
pub use supabase::SupabaseClient;
