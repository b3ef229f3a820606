use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use teloxide::types::ChatId;
use tokio::sync::{Mutex, RwLock};

use crate::models::{
    ConversationSession, ProgressSnapshot, UserLedger, UserProfile, WorkoutSummary, WorkoutType,
};

type Entries = Arc<RwLock<HashMap<ChatId, Arc<Mutex<UserEntry>>>>>;

/// Единственное разделяемое состояние: карта пользователей.
/// Мьютекс на каждой записи сериализует обработку событий одного
/// пользователя, разные пользователи обрабатываются параллельно.
#[derive(Clone)]
pub struct UserStore {
    entries: Entries,
}

#[derive(Debug)]
pub enum TrackerError {
    ProfileRequired,
    Validation(String),
    InvalidSelection,
}

impl std::fmt::Display for TrackerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackerError::ProfileRequired => write!(f, "profile is not configured"),
            TrackerError::Validation(msg) => write!(f, "{}", msg),
            TrackerError::InvalidSelection => write!(f, "unknown candidate selection"),
        }
    }
}

impl std::error::Error for TrackerError {}

#[derive(Debug, Default)]
pub struct UserEntry {
    pub profile: Option<UserProfile>,
    pub ledger: UserLedger,
    pub session: Option<ConversationSession>,
}

impl UserEntry {
    /// Новый профиль обнуляет журнал: нормы и накопления прошлой
    /// настройки не переносятся.
    pub fn reset_with_profile(&mut self, profile: UserProfile) {
        self.profile = Some(profile);
        self.ledger = UserLedger::default();
    }

    pub fn record_water(&mut self, amount_ml: f64) -> Result<f64, TrackerError> {
        let profile = self.profile.as_ref().ok_or(TrackerError::ProfileRequired)?;
        if !amount_ml.is_finite() || amount_ml <= 0.0 {
            return Err(TrackerError::Validation(
                "Пожалуйста, введите положительное число для количества воды.".to_string(),
            ));
        }

        self.ledger.logged_water_ml += amount_ml;
        self.ledger.water_events.push((Utc::now(), amount_ml));

        Ok((profile.water_goal_ml - self.ledger.logged_water_ml).max(0.0))
    }

    pub fn record_food(&mut self, kcal: f64) -> Result<(), TrackerError> {
        if self.profile.is_none() {
            return Err(TrackerError::ProfileRequired);
        }
        if !kcal.is_finite() || kcal <= 0.0 {
            return Err(TrackerError::Validation(
                "Пожалуйста, введите положительное число для калорийности.".to_string(),
            ));
        }

        self.ledger.logged_calories += kcal;
        self.ledger.food_events.push((Utc::now(), kcal));
        Ok(())
    }

    /// Сожжённые калории плюс постоянная прибавка к норме воды:
    /// 200 мл за каждый полный 30-минутный блок тренировки.
    pub fn record_workout(
        &mut self,
        workout: WorkoutType,
        minutes: f64,
    ) -> Result<WorkoutSummary, TrackerError> {
        let profile = self.profile.as_mut().ok_or(TrackerError::ProfileRequired)?;
        if !minutes.is_finite() || minutes <= 0.0 {
            return Err(TrackerError::Validation(
                "Пожалуйста, введите положительное число для времени тренировки.".to_string(),
            ));
        }

        let burned_kcal = workout.kcal_per_minute() * minutes;
        self.ledger.burned_calories += burned_kcal;
        self.ledger.workout_events.push((Utc::now(), burned_kcal));

        let extra_water_ml = (minutes / 30.0).floor() * 200.0;
        profile.water_goal_ml += extra_water_ml;

        Ok(WorkoutSummary {
            burned_kcal,
            extra_water_ml,
        })
    }

    pub fn progress(&self) -> Result<ProgressSnapshot, TrackerError> {
        let profile = self.profile.as_ref().ok_or(TrackerError::ProfileRequired)?;
        let ledger = &self.ledger;

        let net_calories = ledger.logged_calories - ledger.burned_calories;
        Ok(ProgressSnapshot {
            water_goal_ml: profile.water_goal_ml,
            logged_water_ml: ledger.logged_water_ml,
            remaining_water_ml: (profile.water_goal_ml - ledger.logged_water_ml).max(0.0),
            calorie_goal_kcal: profile.calorie_goal_kcal,
            logged_calories: ledger.logged_calories,
            burned_calories: ledger.burned_calories,
            net_calories,
            increase_water: ledger.logged_water_ml < profile.water_goal_ml * 0.5,
            adjust_calories: net_calories > profile.calorie_goal_kcal,
        })
    }
}

impl UserStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn entry(&self, user: ChatId) -> Arc<Mutex<UserEntry>> {
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(&user) {
                return Arc::clone(entry);
            }
        }

        let mut entries = self.entries.write().await;
        Arc::clone(
            entries
                .entry(user)
                .or_insert_with(|| Arc::new(Mutex::new(UserEntry::default()))),
        )
    }

    /// Сбрасывает диалоги без активности дольше ttl. Занятые записи
    /// пропускаются: их диалог и так живой.
    pub async fn expire_stale_sessions(&self, ttl: Duration) -> usize {
        let now = Utc::now();
        let mut expired = 0;

        let entries = self.entries.read().await;
        for entry in entries.values() {
            if let Ok(mut entry) = entry.try_lock() {
                let stale = entry
                    .session
                    .as_ref()
                    .map(|session| now - session.last_activity > ttl)
                    .unwrap_or(false);
                if stale {
                    entry.session = None;
                    expired += 1;
                }
            }
        }
        expired
    }
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}
