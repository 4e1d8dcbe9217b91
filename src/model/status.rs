use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// Workflow state of a leave application.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, AsRefStr, Display,
    EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LeaveStatus {
    Draft,
    Submitted,
    ManagerApproved,
    HrApproved,
    Rejected,
}

/// Workflow state of a weekly timesheet.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, AsRefStr, Display,
    EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TimesheetStatus {
    Draft,
    Submitted,
    Approved,
    Rejected,
}

/// A leave in one of these states commits the employee's time.
pub fn is_leave_blocking(status: LeaveStatus) -> bool {
    matches!(
        status,
        LeaveStatus::Submitted | LeaveStatus::ManagerApproved | LeaveStatus::HrApproved
    )
}

/// A timesheet in one of these states commits the employee's time.
pub fn is_timesheet_blocking(status: TimesheetStatus) -> bool {
    matches!(status, TimesheetStatus::Submitted | TimesheetStatus::Approved)
}

impl LeaveStatus {
    pub const BLOCKING: [LeaveStatus; 3] = [
        LeaveStatus::Submitted,
        LeaveStatus::ManagerApproved,
        LeaveStatus::HrApproved,
    ];

    pub fn is_blocking(self) -> bool {
        is_leave_blocking(self)
    }

    /// Dates and type may only change before any approval.
    pub fn is_editable(self) -> bool {
        matches!(self, LeaveStatus::Draft | LeaveStatus::Submitted)
    }

    pub fn can_transition_to(self, target: LeaveStatus) -> bool {
        use LeaveStatus::*;
        matches!(
            (self, target),
            (Draft, Submitted)
                | (Submitted, ManagerApproved)
                | (ManagerApproved, HrApproved)
                | (Submitted, Rejected)
                | (ManagerApproved, Rejected)
        )
    }
}

impl TimesheetStatus {
    pub const BLOCKING: [TimesheetStatus; 2] = [TimesheetStatus::Submitted, TimesheetStatus::Approved];

    pub fn is_blocking(self) -> bool {
        is_timesheet_blocking(self)
    }

    /// Details can only be added, changed or removed while the employee still owns the sheet.
    pub fn is_editable(self) -> bool {
        matches!(self, TimesheetStatus::Draft | TimesheetStatus::Rejected)
    }

    pub fn can_transition_to(self, target: TimesheetStatus) -> bool {
        use TimesheetStatus::*;
        matches!(
            (self, target),
            (Draft, Submitted)
                | (Rejected, Submitted)
                | (Rejected, Draft)
                | (Submitted, Approved)
                | (Submitted, Rejected)
        )
    }
}
