use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{UserId, flexible_date};

pub type MealId = Uuid;
pub type ActivityId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "breakfast" => Some(MealType::Breakfast),
            "lunch" => Some(MealType::Lunch),
            "dinner" => Some(MealType::Dinner),
            "snack" => Some(MealType::Snack),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    pub id: MealId,
    pub owner: UserId,
    pub name: String,
    pub meal_type: MealType,
    pub calories: i64,
    #[serde(with = "flexible_date")]
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
}

impl Meal {
    pub fn new(
        owner: UserId,
        name: impl Into<String>,
        meal_type: MealType,
        calories: i64,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            name: name.into(),
            meal_type,
            calories,
            date,
            notes: None,
        }
    }
}

/// A logged workout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: ActivityId,
    pub owner: UserId,
    pub activity_type: String,
    pub duration_minutes: i64,
    pub calories_burned: i64,
    #[serde(with = "flexible_date")]
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
}

impl Activity {
    pub fn new(
        owner: UserId,
        activity_type: impl Into<String>,
        duration_minutes: i64,
        calories_burned: i64,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            activity_type: activity_type.into(),
            duration_minutes,
            calories_burned,
            date,
            notes: None,
        }
    }
}
