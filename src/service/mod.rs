//! Write paths: each operation takes the employee lock, checks conflicts, then writes.
pub mod leave;
pub mod timesheet;
