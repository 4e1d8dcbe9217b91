use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const ACTIVE_STATUS: &str = "active";

/// The columns of `employees` the timekeeping core reads. The row is the lock target.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_code": "EMP-001",
        "first_name": "John",
        "last_name": "Doe",
        "status": "active"
    })
)]
pub struct EmployeeRecord {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "EMP-001")]
    pub employee_code: String,

    #[schema(example = "John")]
    pub first_name: String,

    #[schema(example = "Doe")]
    pub last_name: String,

    #[schema(example = "active")]
    pub status: String,
}

impl EmployeeRecord {
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case(ACTIVE_STATUS)
    }
}
