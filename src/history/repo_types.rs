use std::{fmt, str::FromStr};

use sqlx::FromRow;
use time::PrimitiveDateTime;

/// One persisted analysis attempt, successful or not.
#[derive(Debug, Clone, FromRow)]
pub struct HistoryEntry {
    pub id: i64,
    pub meal_time: String,
    pub calorie_report: String,
    pub image: Vec<u8>,
    pub timestamp: PrimitiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MealTime {
    #[default]
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealTime {
    pub const ALL: [MealTime; 4] = [
        MealTime::Breakfast,
        MealTime::Lunch,
        MealTime::Dinner,
        MealTime::Snack,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealTime::Breakfast => "Breakfast",
            MealTime::Lunch => "Lunch",
            MealTime::Dinner => "Dinner",
            MealTime::Snack => "Snack",
        }
    }
}

impl fmt::Display for MealTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown meal time: {0}")]
pub struct UnknownMealTime(pub String);

impl FromStr for MealTime {
    type Err = UnknownMealTime;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MealTime::ALL
            .into_iter()
            .find(|m| m.as_str() == s.trim())
            .ok_or_else(|| UnknownMealTime(s.to_string()))
    }
}
