use serde::Serialize;
use time::{macros::time, Time};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealSlot {
    pub fn as_str(self) -> &'static str {
        match self {
            MealSlot::Breakfast => "breakfast",
            MealSlot::Lunch => "lunch",
            MealSlot::Dinner => "dinner",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MealSlot::Breakfast => "Breakfast",
            MealSlot::Lunch => "Lunch",
            MealSlot::Dinner => "Dinner",
        }
    }
}

/// Opening time of each slot plus closing time of the last one.
/// Each window is half-open: `[start, next start)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceHours {
    pub breakfast: Time,
    pub lunch: Time,
    pub dinner: Time,
    pub close: Time,
}

impl Default for ServiceHours {
    fn default() -> Self {
        Self {
            breakfast: time!(6:00),
            lunch: time!(11:00),
            dinner: time!(16:00),
            close: time!(23:30),
        }
    }
}

impl ServiceHours {
    pub fn slot_at(&self, at: Time) -> Option<MealSlot> {
        if at < self.breakfast || at >= self.close {
            None
        } else if at < self.lunch {
            Some(MealSlot::Breakfast)
        } else if at < self.dinner {
            Some(MealSlot::Lunch)
        } else {
            Some(MealSlot::Dinner)
        }
    }
}
