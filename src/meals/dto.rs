use serde::Serialize;
use time::Date;

use crate::meals::repo_types::MealTotalsRow;
use crate::meals::slot::MealSlot;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealRecordedResponse {
    pub message: String,
    pub meal_type: MealSlot,
    pub date: Date,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyMealTotals {
    pub date: Date,
    pub breakfast: i64,
    pub lunch: i64,
    pub dinner: i64,
    pub total_unique_users: i64,
}

impl DailyMealTotals {
    pub fn from_row(date: Date, row: MealTotalsRow) -> Self {
        Self {
            date,
            breakfast: row.breakfast,
            lunch: row.lunch,
            dinner: row.dinner,
            total_unique_users: row.total_unique_users,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn empty_day_serializes_as_zeros() {
        let row = MealTotalsRow {
            breakfast: 0,
            lunch: 0,
            dinner: 0,
            total_unique_users: 0,
        };
        let totals = DailyMealTotals::from_row(date!(2025 - 03 - 14), row);
        let json = serde_json::to_value(&totals).unwrap();
        assert_eq!(json["date"], "2025-03-14");
        assert_eq!(json["breakfast"], 0);
        assert_eq!(json["lunch"], 0);
        assert_eq!(json["dinner"], 0);
        assert_eq!(json["totalUniqueUsers"], 0);
    }

    #[test]
    fn recorded_response_names_the_slot() {
        let res = MealRecordedResponse {
            message: "lunch recorded successfully".into(),
            meal_type: MealSlot::Lunch,
            date: date!(2025 - 03 - 14),
        };
        let json = serde_json::to_value(&res).unwrap();
        assert_eq!(json["mealType"], "lunch");
        assert_eq!(json["date"], "2025-03-14");
    }
}
