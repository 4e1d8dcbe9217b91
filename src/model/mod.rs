pub mod employee;
pub mod leave_request;
pub mod overtime_pto;
pub mod role;
pub mod status;
pub mod timesheet;
