use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::status::TimesheetStatus;

/// One row per (employee, ISO week). `week_start_date` is always a Monday.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Timesheet {
    #[schema(example = 7)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "2024-01-15", format = "date", value_type = String)]
    pub week_start_date: NaiveDate,
    #[schema(example = "2024-01-21", format = "date", value_type = String)]
    pub week_end_date: NaiveDate,
    pub status: TimesheetStatus,
    #[schema(example = 41.5)]
    pub total_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct TimesheetDetail {
    #[schema(example = 7)]
    pub timesheet_id: u64,
    #[schema(example = "2024-01-17", format = "date", value_type = String)]
    pub work_date: NaiveDate,
    #[schema(example = 9.5)]
    pub hours_worked: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TimesheetWithDetails {
    #[serde(flatten)]
    pub timesheet: Timesheet,
    pub details: Vec<TimesheetDetail>,
}
