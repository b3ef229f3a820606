use serde::{Serialize, Deserialize};

/// Профиль пользователя. Создаётся при завершении /set_profile и
/// полностью перезаписывается при повторной настройке.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age: u32,
    pub activity_minutes: u32,
    pub city: String,
    pub last_known_temp_c: f64,
    pub water_goal_ml: f64,
    pub calorie_goal_kcal: f64,
    pub calorie_goal_is_manual: bool,
}

impl UserProfile {
    /// Норма воды: вес * 30 мл + 500 мл за каждые полные 30 мин активности
    /// + 500 мл при температуре выше 25°C.
    pub fn water_goal(weight_kg: f64, activity_minutes: u32, temp_c: f64) -> f64 {
        let mut goal = weight_kg * 30.0;
        goal += (activity_minutes / 30) as f64 * 500.0;
        if temp_c > 25.0 {
            goal += 500.0;
        }
        goal
    }

    /// Норма калорий: 10 * вес + 6.25 * рост - 5 * возраст
    /// + 200 ккал за каждые полные 30 мин активности.
    pub fn auto_calorie_goal(weight_kg: f64, height_cm: f64, age: u32, activity_minutes: u32) -> f64 {
        let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * age as f64;
        base + (activity_minutes / 30) as f64 * 200.0
    }
}
