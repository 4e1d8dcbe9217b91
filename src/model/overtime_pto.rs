use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Per-employee running overtime ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct EmployeeOvertimePto {
    #[schema(example = 1000)]
    pub employee_id: u64,
    /// Unconverted overtime, kept in [0, 16) after each run.
    #[schema(example = 4.0)]
    pub overtime_hours: f64,
    /// Cumulative PTO days granted from overtime.
    #[schema(example = 3)]
    pub pto_granted: u32,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub last_calculated: DateTime<Utc>,
}

impl EmployeeOvertimePto {
    pub fn empty(employee_id: u64, now: DateTime<Utc>) -> Self {
        Self {
            employee_id,
            overtime_hours: 0.0,
            pto_granted: 0,
            last_calculated: now,
        }
    }
}
