//! Row store gateway for reports.

pub mod memory;
pub mod supabase;

pub use memory::MemoryRecordStore;
pub use supabase::SupabaseRecords;

use crate::models::{NewReport, Report};
use async_trait::async_trait;

/// Row store errors. Messages are the provider's own.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DbError {
    #[error("{0}")]
    Constraint(String),

    #[error("{0}")]
    Provider(String),

    #[error("Database request failed: {0}")]
    Connection(String),

    #[error("Unexpected database response: {0}")]
    Decode(String),
}

/// Narrow capability over the reports table.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert exactly one row; the store assigns `id`.
    async fn insert_report(&self, report: &NewReport) -> Result<Report, DbError>;

    /// Every row, unfiltered. Order is whatever the store returns.
    async fn list_reports(&self) -> Result<Vec<Report>, DbError>;
}
