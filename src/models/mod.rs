// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod image;
pub mod report;
pub mod session;

pub use image::{ImageFile, ValidationError};
pub use report::{Coordinates, NewReport, PollutionType, Report, ReportId, TagSelection};
pub use session::{SessionState, UserInfo};
