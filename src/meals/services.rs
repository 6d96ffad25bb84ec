use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::meals::dto::{DailyMealTotals, MealRecordedResponse};
use crate::meals::repo;
use crate::meals::repo_types::MealRecord;
use crate::meals::slot::MealSlot;
use crate::state::AppState;

impl MealRecord {
    pub fn served(&self, slot: MealSlot) -> bool {
        match slot {
            MealSlot::Breakfast => self.breakfast,
            MealSlot::Lunch => self.lunch,
            MealSlot::Dinner => self.dinner,
        }
    }

    /// Marks `slot` as served. Each slot can be marked once per day.
    pub fn mark(&mut self, slot: MealSlot) -> AppResult<()> {
        if self.served(slot) {
            return Err(AppError::Conflict(format!(
                "{} has already been recorded for today",
                slot.label()
            )));
        }
        match slot {
            MealSlot::Breakfast => self.breakfast = true,
            MealSlot::Lunch => self.lunch = true,
            MealSlot::Dinner => self.dinner = true,
        }
        Ok(())
    }
}

/// Records the meal of the current slot for `beneficiary_id`.
pub async fn record_meal(st: &AppState, beneficiary_id: Uuid) -> AppResult<MealRecordedResponse> {
    let now = st.clock.now();
    let slot = st
        .config
        .service_hours
        .slot_at(now.time())
        .ok_or(AppError::OutsideServiceHours)?;
    let today = now.date();

    let mut tx = st.db.begin().await?;
    if !repo::beneficiary_exists_tx(&mut tx, beneficiary_id).await? {
        return Err(AppError::NotFound("User not found".into()));
    }
    let mut day = repo::lock_day_tx(&mut tx, beneficiary_id, today).await?;
    if let Err(e) = day.mark(slot) {
        warn!(%beneficiary_id, meal = slot.as_str(), %today, "meal already recorded");
        return Err(e);
    }
    repo::save_day_tx(&mut tx, &day).await?;
    tx.commit().await?;

    info!(%beneficiary_id, meal = slot.as_str(), %today, "meal recorded");
    Ok(MealRecordedResponse {
        message: format!("{} recorded successfully", slot.as_str()),
        meal_type: slot,
        date: today,
    })
}

pub async fn daily_totals(st: &AppState) -> AppResult<DailyMealTotals> {
    let today = st.clock.now().date();
    let row = repo::totals_for_day(&st.db, today).await?;
    Ok(DailyMealTotals::from_row(today, row))
}
