use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkoutType {
    Run,
    Walk,
    Strength,
    Cycle,
    Other,
}

impl WorkoutType {
    pub fn kcal_per_minute(self) -> f64 {
        match self {
            WorkoutType::Run => 10.0,
            WorkoutType::Walk => 4.0,
            WorkoutType::Strength => 8.0,
            WorkoutType::Cycle => 7.0,
            WorkoutType::Other => 6.0,
        }
    }

    /// Принимает русское или английское название типа тренировки.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "бег" | "run" => Some(WorkoutType::Run),
            "ходьба" | "walk" => Some(WorkoutType::Walk),
            "силовая" | "strength" => Some(WorkoutType::Strength),
            "велосипед" | "cycle" => Some(WorkoutType::Cycle),
            "другое" | "other" => Some(WorkoutType::Other),
            _ => None,
        }
    }

    pub fn name_ru(self) -> &'static str {
        match self {
            WorkoutType::Run => "бег",
            WorkoutType::Walk => "ходьба",
            WorkoutType::Strength => "силовая",
            WorkoutType::Cycle => "велосипед",
            WorkoutType::Other => "другое",
        }
    }
}

/// Журнал потребления и расхода. Событийные последовательности только
/// дописываются, накопленные суммы всегда равны сумме своих событий.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserLedger {
    pub logged_water_ml: f64,
    pub logged_calories: f64,
    pub burned_calories: f64,
    pub water_events: Vec<(DateTime<Utc>, f64)>,
    pub food_events: Vec<(DateTime<Utc>, f64)>,
    pub workout_events: Vec<(DateTime<Utc>, f64)>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkoutSummary {
    pub burned_kcal: f64,
    pub extra_water_ml: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    pub water_goal_ml: f64,
    pub logged_water_ml: f64,
    pub remaining_water_ml: f64,
    pub calorie_goal_kcal: f64,
    pub logged_calories: f64,
    pub burned_calories: f64,
    pub net_calories: f64,
    pub increase_water: bool,
    pub adjust_calories: bool,
}
