use serde::Serialize;
use sqlx::FromRow;
use time::Date;
use uuid::Uuid;

/// One day of meal service for one beneficiary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct MealRecord {
    #[serde(skip_serializing)]
    pub beneficiary_id: Uuid,
    #[serde(rename = "date")]
    pub served_on: Date,
    pub breakfast: bool,
    pub lunch: bool,
    pub dinner: bool,
}

#[derive(Debug, FromRow)]
pub struct MealTotalsRow {
    pub breakfast: i64,
    pub lunch: i64,
    pub dinner: i64,
    pub total_unique_users: i64,
}
