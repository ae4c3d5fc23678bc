// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! PostgREST implementation of [`RecordStore`].
//!
//! Provides:
//! - `insert` of a single report row (`Prefer: return=representation`)
//! - `select *` over the whole table

use super::{DbError, RecordStore};
use crate::models::{NewReport, Report};
use crate::services::supabase::{ApiFailure, SupabaseClient};
use async_trait::async_trait;
use reqwest::Method;

/// Reports table behind Supabase's REST API.
#[derive(Clone)]
pub struct SupabaseRecords {
    client: SupabaseClient,
    table: String,
}

impl SupabaseRecords {
    pub fn new(client: SupabaseClient, table: &str) -> Self {
        Self {
            client,
            table: table.to_string(),
        }
    }

    fn table_path(&self) -> String {
        format!("rest/v1/{}", urlencoding::encode(&self.table))
    }
}

fn map_failure(failure: ApiFailure) -> DbError {
    // Postgres class 23 = integrity constraint violation
    let is_constraint = failure.is_conflict()
        || failure
            .code
            .as_deref()
            .is_some_and(|code| code.starts_with("23"));

    if is_constraint {
        DbError::Constraint(failure.message)
    } else {
        DbError::Provider(failure.message)
    }
}

#[async_trait]
impl RecordStore for SupabaseRecords {
    async fn insert_report(&self, report: &NewReport) -> Result<Report, DbError> {
        let response = self
            .client
            .request(Method::POST, &self.table_path())
            .header("Prefer", "return=representation")
            .json(report)
            .send()
            .await
            .map_err(|e| DbError::Connection(e.to_string()))?;

        let response = SupabaseClient::check_response(response)
            .await
            .map_err(map_failure)?;

        let mut rows: Vec<Report> = response
            .json()
            .await
            .map_err(|e| DbError::Decode(e.to_string()))?;

        if rows.len() != 1 {
            return Err(DbError::Decode(format!(
                "expected 1 inserted row, got {}",
                rows.len()
            )));
        }
        Ok(rows.remove(0))
    }

    async fn list_reports(&self) -> Result<Vec<Report>, DbError> {
        let response = self
            .client
            .request(Method::GET, &self.table_path())
            .query(&[("select", "*")])
            .send()
            .await
            .map_err(|e| DbError::Connection(e.to_string()))?;

        let response = SupabaseClient::check_response(response)
            .await
            .map_err(map_failure)?;

        let rows: Vec<Report> = response
            .json()
            .await
            .map_err(|e| DbError::Decode(e.to_string()))?;

        tracing::debug!(count = rows.len(), table = %self.table, "Fetched reports");
        Ok(rows)
    }
}
