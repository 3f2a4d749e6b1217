use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Directory view of an employee: who they are and where they belong.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1001,
        "full_name": "John Doe",
        "department_id": 10,
        "department_name": "Operations",
        "branch_id": 2,
        "branch_name": "Riyadh HQ",
        "is_active": true
    })
)]
pub struct EmployeeProfile {
    #[schema(example = 1001)]
    pub id: u64,

    #[schema(example = "John Doe")]
    pub full_name: String,

    #[schema(example = 10)]
    pub department_id: u64,

    #[schema(example = "Operations")]
    pub department_name: String,

    #[schema(example = 2)]
    pub branch_id: u64,

    #[schema(example = "Riyadh HQ")]
    pub branch_name: String,

    pub is_active: bool,
}
