use crate::api::leave_request::{CreateLeave, UpdateLeave};
use crate::api::overtime::ProcessPeriod;
use crate::api::timesheet::{EntryPayload, WeeklyTimesheet};
use crate::engine::error::{ConflictKind, ConflictingRecord};
use crate::engine::overtime::{AccrualOutcome, AccrualRunSummary};
use crate::model::leave_request::{LeaveApplication, LeaveType};
use crate::model::overtime_pto::EmployeeOvertimePto;
use crate::model::status::{LeaveStatus, TimesheetStatus};
use crate::model::timesheet::{Timesheet, TimesheetDetail, TimesheetWithDetails};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Timekeeping API",
        version = "1.0.0",
        description = r#"
## Leave, Timesheet & Overtime

Timekeeping part of the **Human Resource Management (HRM)** system.

### 🔹 Key Features
- **Leave Management**
  - Draft, submit, manager/HR approval and rejection
- **Timesheets**
  - Daily entries or a whole week, submission and HR review
- **Overtime**
  - Biweekly accrual: hours beyond 8 per day, every 16 hours grant one PTO day

### 🔒 Consistency rules
- Leave cannot overlap a submitted/approved timesheet week
- Time cannot be logged on days covered by submitted/approved leave
- Writes for one employee are serialized; a busy employee answers **409**, retry shortly

### 🔐 Security
All endpoints are protected using **JWT Bearer authentication**.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::leave_request::create_leave,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::update_leave,
        crate::api::leave_request::submit_leave,
        crate::api::leave_request::manager_approve_leave,
        crate::api::leave_request::hr_approve_leave,
        crate::api::leave_request::reject_leave,

        crate::api::timesheet::record_entry,
        crate::api::timesheet::create_weekly_timesheet,
        crate::api::timesheet::get_timesheet,
        crate::api::timesheet::submit_timesheet,
        crate::api::timesheet::approve_timesheet,
        crate::api::timesheet::reject_timesheet,
        crate::api::timesheet::remove_entry,

        crate::api::overtime::process_employee,
        crate::api::overtime::process_all,
        crate::api::overtime::get_ledger
    ),
    components(
        schemas(
            CreateLeave,
            UpdateLeave,
            LeaveApplication,
            LeaveType,
            LeaveStatus,
            EntryPayload,
            WeeklyTimesheet,
            Timesheet,
            TimesheetDetail,
            TimesheetWithDetails,
            TimesheetStatus,
            ProcessPeriod,
            AccrualOutcome,
            AccrualRunSummary,
            EmployeeOvertimePto,
            ConflictKind,
            ConflictingRecord
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Leave", description = "Leave request APIs"),
        (name = "Timesheet", description = "Weekly timesheet APIs"),
        (name = "Overtime", description = "Overtime and PTO accrual APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/leave",
            "/api/leave/{leave_id}",
            "/api/leave/{leave_id}/hr-approve",
            "/api/timesheet/entry",
            "/api/timesheet/{timesheet_id}/entry/{work_date}",
            "/api/overtime/process",
            "/api/overtime/{employee_id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path}");
        }
        assert!(
            doc.components
                .unwrap()
                .security_schemes
                .contains_key("bearer_auth")
        );
    }
}
