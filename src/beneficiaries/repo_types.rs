use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::meals::repo_types::MealRecord;

/// Beneficiary row as stored in `beneficiaries`, with its meal history
/// attached after loading.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Beneficiary {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_id: String, // ISM/B2-YY/XX/NNNN
    pub names: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub id_number: Option<String>,
    pub age: Option<i32>,
    pub sex: Option<String>,
    pub state: Option<String>,
    pub lga: Option<String>,
    pub community: Option<String>,
    pub religion: Option<String>,
    pub disability: Option<String>,
    pub physical_fitness: Option<String>,
    pub photo: Option<String>,
    pub qr_code_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[sqlx(skip)]
    pub meal_records: Vec<MealRecord>,
}
