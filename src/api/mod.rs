pub mod leave_request;
pub mod overtime;
pub mod timesheet;
