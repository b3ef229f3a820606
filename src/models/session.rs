use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

/// Кандидат из каталога продуктов. Живёт только внутри активного диалога.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodCandidate {
    pub name: String,
    pub kcal_per_100g: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogState {
    CollectingWeight,
    CollectingHeight,
    CollectingAge,
    CollectingActivity,
    CollectingCity,
    CollectingCalorieGoal,
    AwaitingFoodQuery,
    AwaitingFoodChoice,
    AwaitingManualCalories,
    AwaitingGrams,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileDraft {
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub age: Option<u32>,
    pub activity_minutes: Option<u32>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FoodDraft {
    pub name: Option<String>,
    pub kcal_per_100g: Option<f64>,
}

/// Состояние незавершённого многошагового диалога. Уничтожается при
/// завершении, отмене или по таймауту фоновой очистки.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    pub state: DialogState,
    pub profile_draft: ProfileDraft,
    pub food_draft: FoodDraft,
    pub pending: HashMap<String, FoodCandidate>,
    pub last_activity: DateTime<Utc>,
}

impl ConversationSession {
    pub fn new(state: DialogState) -> Self {
        Self {
            state,
            profile_draft: ProfileDraft::default(),
            food_draft: FoodDraft::default(),
            pending: HashMap::new(),
            last_activity: Utc::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }
}
