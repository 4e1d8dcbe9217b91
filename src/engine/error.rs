use std::fmt;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

/// Failure reported by a [`TimeStore`](crate::engine::store::TimeStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not grant a row lock in time (lock wait timeout, deadlock victim).
    #[error("row lock contention: {0}")]
    Contention(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A persisted value could not be mapped onto the domain model.
    #[error("corrupt row in {table}: {detail}")]
    Corrupt { table: &'static str, detail: String },
}

#[derive(Debug, Error)]
pub enum LockError {
    #[error("employee {employee_id} is busy after {attempts} lock attempts, try again shortly")]
    LockTimeout { employee_id: u64, attempts: u32 },

    #[error("store failure while locking employee {employee_id}: {source}")]
    StoreFailure {
        employee_id: u64,
        #[source]
        source: StoreError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum ConflictKind {
    /// A timesheet write collides with committed leave.
    LeaveConflict,
    /// A leave write collides with committed timesheets.
    TimesheetConflict,
}

/// A row that caused a conflict rejection.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ConflictingRecord {
    #[schema(example = 12)]
    pub id: u64,
    #[schema(example = "2024-01-17", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2024-01-19", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "submitted")]
    pub status: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConflictError {
    pub kind: ConflictKind,
    pub employee_id: u64,
    pub records: Vec<ConflictingRecord>,
}

impl fmt::Display for ConflictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            ConflictKind::LeaveConflict => "leave",
            ConflictKind::TimesheetConflict => "timesheet(s)",
        };
        write!(f, "conflicts with existing {what}: ")?;
        for (i, r) in self.records.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "#{} {} to {} ({})", r.id, r.start_date, r.end_date, r.status)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConflictError {}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Conflict(#[from] ConflictError),

    #[error("{0}")]
    Invalid(String),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    pub fn invalid(message: impl Into<String>) -> Self {
        EngineError::Invalid(message.into())
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(e: sqlx::Error) -> Self {
        EngineError::Store(StoreError::Database(e))
    }
}

impl ResponseError for EngineError {
    fn status_code(&self) -> StatusCode {
        match self {
            EngineError::NotFound { .. } => StatusCode::NOT_FOUND,
            EngineError::Lock(LockError::LockTimeout { .. }) => StatusCode::CONFLICT,
            EngineError::Lock(LockError::StoreFailure { .. }) | EngineError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            EngineError::Conflict(_) | EngineError::Invalid(_) => StatusCode::BAD_REQUEST,
            EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            EngineError::Conflict(c) => json!({
                "message": format!("Request {}", c),
                "kind": c.kind,
                "conflicts": c.records,
            }),
            EngineError::Lock(LockError::LockTimeout { .. }) => json!({
                "message": "This employee's records are being updated by another request. Please try again shortly."
            }),
            EngineError::Lock(LockError::StoreFailure { .. }) | EngineError::Store(_) => {
                tracing::error!(error = %self, "Request failed on the data store");
                json!({ "message": "Internal Server Error" })
            }
            other => json!({ "message": other.to_string() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
