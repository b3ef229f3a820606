pub mod state;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use teloxide::types::ChatId;
use uuid::Uuid;

use crate::clients::{CatalogSearch, WeatherLookup};
use crate::models::{ConversationSession, DialogState, UserProfile, WorkoutType};
use crate::similarity;
use crate::store::{TrackerError, UserEntry, UserStore};

use state::{advance, StepAction};

const CANDIDATE_LIMIT: usize = 5;
const CHOICE_PREFIX: &str = "choose_food_";
pub const MANUAL_CHOICE: &str = "choose_food_manual";

pub const INVALID_CHOICE_TEXT: &str = "Некорректный выбор.";
const PROFILE_REQUIRED_TEXT: &str = "Сначала настройте профиль с помощью /set_profile.";

const START_TEXT: &str = "Привет!\nЯ бот для расчёта дневной нормы воды и калорий.\n\
    Начните с команды /set_profile для настройки вашего профиля.";

const HELP_TEXT: &str = "Доступные команды:\n\
    /set_profile - настроить профиль\n\
    /log_water <количество_мл> - записать воду\n\
    /log_food <название продукта> - записать еду\n\
    /log_workout <тип> <время (мин)> - записать тренировку\n\
    /check_progress - проверить прогресс\n\
    /show_graph - показать график";

const UNKNOWN_INPUT_TEXT: &str =
    "Я не понял сообщение. Посмотрите список команд: /help";

/// Входящее событие на транспортно-независимой границе ядра.
#[derive(Debug, Clone)]
pub enum Incoming {
    Start,
    Help,
    SetProfile,
    LogWater { args: String },
    LogFood { args: String },
    LogWorkout { args: String },
    CheckProgress,
    ShowGraph,
    Text { text: String },
    Button { data: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceButton {
    pub label: String,
    pub data: String,
}

/// Данные для графика. Отрисовка в картинку остаётся за слоем
/// представления, ядро отдаёт только ряды и норму.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub title: String,
    pub y_label: String,
    pub series_label: String,
    pub goal: f64,
    pub goal_label: String,
    pub points: Vec<(DateTime<Utc>, f64)>,
    pub caption: String,
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
    Text(String),
    Choices {
        text: String,
        buttons: Vec<ChoiceButton>,
    },
    Chart(ChartData),
}

/// Маршрутизирует события в конечный автомат, дергает внешние сервисы
/// и фиксирует завершённые диалоги в журнале пользователя.
#[derive(Clone)]
pub struct Orchestrator {
    store: UserStore,
    catalog: Arc<dyn CatalogSearch>,
    weather: Arc<dyn WeatherLookup>,
}

impl Orchestrator {
    pub fn new(
        store: UserStore,
        catalog: Arc<dyn CatalogSearch>,
        weather: Arc<dyn WeatherLookup>,
    ) -> Self {
        Self {
            store,
            catalog,
            weather,
        }
    }

    /// Обрабатывает одно событие пользователя. Запись пользователя
    /// держится под замком на всё время обработки, включая внешние
    /// вызовы: события одного пользователя строго последовательны.
    pub async fn handle_event(&self, user: ChatId, event: Incoming) -> Vec<Outgoing> {
        let entry = self.store.entry(user).await;
        let mut entry = entry.lock().await;

        match event {
            Incoming::Start => {
                abandon_session(&mut entry);
                vec![Outgoing::Text(START_TEXT.to_string())]
            }

            Incoming::Help => {
                abandon_session(&mut entry);
                vec![Outgoing::Text(HELP_TEXT.to_string())]
            }

            Incoming::SetProfile => {
                abandon_session(&mut entry);
                entry.session = Some(ConversationSession::new(DialogState::CollectingWeight));
                vec![Outgoing::Text("Введите ваш вес (в кг):".to_string())]
            }

            Incoming::LogWater { args } => {
                abandon_session(&mut entry);
                if entry.profile.is_none() {
                    return vec![Outgoing::Text(PROFILE_REQUIRED_TEXT.to_string())];
                }
                let Some(raw) = args.split_whitespace().next() else {
                    return vec![Outgoing::Text(
                        "Используйте команду: /log_water <количество_мл>".to_string(),
                    )];
                };
                let Ok(amount) = raw.parse::<f64>() else {
                    return vec![Outgoing::Text(
                        "Пожалуйста, введите число для количества воды.".to_string(),
                    )];
                };
                match entry.record_water(amount) {
                    Ok(remaining) => vec![Outgoing::Text(format!(
                        "Записано: {:.0} мл воды.\nОсталось: {:.0} мл.",
                        amount, remaining
                    ))],
                    Err(e) => vec![Outgoing::Text(error_reply(&e))],
                }
            }

            Incoming::LogFood { args } => {
                abandon_session(&mut entry);
                if entry.profile.is_none() {
                    return vec![Outgoing::Text(PROFILE_REQUIRED_TEXT.to_string())];
                }
                let query = args.trim().to_string();
                entry.session = Some(ConversationSession::new(DialogState::AwaitingFoodQuery));
                if query.is_empty() {
                    vec![Outgoing::Text("Введите название продукта:".to_string())]
                } else {
                    self.food_search(&mut entry, &query).await
                }
            }

            Incoming::LogWorkout { args } => {
                abandon_session(&mut entry);
                if entry.profile.is_none() {
                    return vec![Outgoing::Text(PROFILE_REQUIRED_TEXT.to_string())];
                }
                let parts: Vec<&str> = args.split_whitespace().collect();
                if parts.len() < 2 {
                    return vec![Outgoing::Text(
                        "Используйте команду: /log_workout <тип тренировки> <время (мин)>\n\
                         Поддерживаемые типы тренировки: бег, ходьба, силовая, велосипед, другое"
                            .to_string(),
                    )];
                }
                let Some(workout) = WorkoutType::parse(parts[0]) else {
                    return vec![Outgoing::Text(
                        "Пожалуйста, введите поддерживаемый тип тренировки.".to_string(),
                    )];
                };
                let Ok(minutes) = parts[1].parse::<f64>() else {
                    return vec![Outgoing::Text(
                        "Пожалуйста, введите число для времени тренировки.".to_string(),
                    )];
                };
                match entry.record_workout(workout, minutes) {
                    Ok(summary) => vec![Outgoing::Text(format!(
                        "🏃‍♂️ {} {:.0} минут — {:.0} ккал сожжено.\n\
                         Дополнительно: выпейте {:.0} мл воды.",
                        workout.name_ru(),
                        minutes,
                        summary.burned_kcal,
                        summary.extra_water_ml
                    ))],
                    Err(e) => vec![Outgoing::Text(error_reply(&e))],
                }
            }

            Incoming::CheckProgress => {
                abandon_session(&mut entry);
                match entry.progress() {
                    Ok(snapshot) => {
                        let mut msg = format!(
                            "📊 Прогресс:\n\n\
                             Вода:\n\
                             - Выпито: {:.0} мл из {:.0} мл.\n\
                             - Осталось: {:.0} мл.\n\n\
                             Калории:\n\
                             - Потреблено: {:.0} ккал из {:.0} ккал.\n\
                             - Сожжено: {:.0} ккал.\n\
                             - Баланс: {:.0} ккал.",
                            snapshot.logged_water_ml,
                            snapshot.water_goal_ml,
                            snapshot.remaining_water_ml,
                            snapshot.logged_calories,
                            snapshot.calorie_goal_kcal,
                            snapshot.burned_calories,
                            snapshot.net_calories
                        );
                        if snapshot.increase_water {
                            msg.push_str("\nРекомендация: Вам стоит выпить больше воды!");
                        }
                        if snapshot.adjust_calories {
                            msg.push_str(
                                "\nРекомендация: Попробуйте увеличить физическую активность \
                                 или снизить калорийность пищи.",
                            );
                        }
                        vec![Outgoing::Text(msg)]
                    }
                    Err(e) => vec![Outgoing::Text(error_reply(&e))],
                }
            }

            Incoming::ShowGraph => {
                abandon_session(&mut entry);
                let Some(profile) = entry.profile.as_ref() else {
                    return vec![Outgoing::Text(PROFILE_REQUIRED_TEXT.to_string())];
                };

                let mut replies = Vec::new();
                match water_chart(profile, &entry.ledger.water_events) {
                    Some(chart) => replies.push(Outgoing::Chart(chart)),
                    None => replies.push(Outgoing::Text(
                        "Нет данных для построения графика выпитой воды.".to_string(),
                    )),
                }
                match calorie_chart(
                    profile,
                    &entry.ledger.food_events,
                    &entry.ledger.workout_events,
                ) {
                    Some(chart) => replies.push(Outgoing::Chart(chart)),
                    None => replies.push(Outgoing::Text(
                        "Нет данных для построения графика сожженых калорий.".to_string(),
                    )),
                }
                replies
            }

            Incoming::Text { text } => {
                let action = {
                    let Some(session) = entry.session.as_mut() else {
                        return vec![Outgoing::Text(UNKNOWN_INPUT_TEXT.to_string())];
                    };
                    advance(session, &text)
                };
                match action {
                    StepAction::Prompt(reply) => vec![Outgoing::Text(reply)],
                    StepAction::SearchCatalog { query } => {
                        self.food_search(&mut entry, &query).await
                    }
                    StepAction::CommitProfile { manual_goal } => {
                        self.commit_profile(&mut entry, manual_goal).await
                    }
                    StepAction::CommitFood {
                        name,
                        kcal_per_100g,
                        grams,
                    } => {
                        entry.session = None;
                        let consumed = kcal_per_100g * grams / 100.0;
                        match entry.record_food(consumed) {
                            Ok(()) => vec![Outgoing::Text(format!(
                                "Записано: {:.1} ккал (продукт: {}).",
                                consumed, name
                            ))],
                            Err(e) => vec![Outgoing::Text(error_reply(&e))],
                        }
                    }
                    StepAction::Abort { reply } => {
                        entry.session = None;
                        vec![Outgoing::Text(reply)]
                    }
                }
            }

            Incoming::Button { data } => {
                let Some(session) = entry.session.as_mut() else {
                    // Кнопка от давно погасшего диалога
                    return Vec::new();
                };
                if session.state != DialogState::AwaitingFoodChoice {
                    return Vec::new();
                }
                session.touch();

                if data == MANUAL_CHOICE {
                    session.pending.clear();
                    session.state = DialogState::AwaitingManualCalories;
                    return vec![Outgoing::Text(
                        "Введите калорийность на 100 г вручную:".to_string(),
                    )];
                }

                let candidate = data
                    .strip_prefix(CHOICE_PREFIX)
                    .and_then(|id| session.pending.get(id))
                    .cloned();
                match candidate {
                    Some(candidate) => {
                        session.food_draft.name = Some(candidate.name.clone());
                        session.food_draft.kcal_per_100g = Some(candidate.kcal_per_100g);
                        session.pending.clear();
                        session.state = DialogState::AwaitingGrams;
                        vec![Outgoing::Text(format!(
                            "Вы выбрали: {} ({:.1} ккал на 100 г).\nСколько грамм вы съели?",
                            candidate.name, candidate.kcal_per_100g
                        ))]
                    }
                    None => vec![Outgoing::Text(error_reply(&TrackerError::InvalidSelection))],
                }
            }
        }
    }

    /// Поиск в каталоге и ранжирование кандидатов. Пустой результат
    /// уводит диалог на ручной ввод калорийности.
    async fn food_search(&self, entry: &mut UserEntry, query: &str) -> Vec<Outgoing> {
        let candidates = self.catalog.search(query).await;
        let ranked = similarity::rank(
            query,
            candidates
                .into_iter()
                .map(|candidate| (candidate.name.clone(), candidate))
                .collect(),
            CANDIDATE_LIMIT,
        );

        let Some(session) = entry.session.as_mut() else {
            return vec![Outgoing::Text(UNKNOWN_INPUT_TEXT.to_string())];
        };
        session.touch();
        session.food_draft.name = Some(query.to_string());

        if ranked.is_empty() {
            session.state = DialogState::AwaitingManualCalories;
            return vec![Outgoing::Text(
                "Информация о продукте не найдена. Введите калорийность на 100 г вручную:"
                    .to_string(),
            )];
        }

        session.pending.clear();
        let mut buttons = Vec::new();
        for (candidate, _score) in ranked {
            let id: String = Uuid::new_v4().to_string()[..8].to_string();
            let short_name: String = candidate.name.chars().take(20).collect();
            buttons.push(ChoiceButton {
                label: format!("{} ({:.1} ккал/100г)", short_name, candidate.kcal_per_100g),
                data: format!("{}{}", CHOICE_PREFIX, id),
            });
            session.pending.insert(id, candidate);
        }
        buttons.push(ChoiceButton {
            label: "Ввести калорийность вручную".to_string(),
            data: MANUAL_CHOICE.to_string(),
        });

        session.state = DialogState::AwaitingFoodChoice;
        vec![Outgoing::Choices {
            text: "Найдены похожие продукты".to_string(),
            buttons,
        }]
    }

    /// Завершение настройки профиля: температура по городу, расчёт
    /// норм, перезапись профиля и обнуление журнала.
    async fn commit_profile(
        &self,
        entry: &mut UserEntry,
        manual_goal: Option<f64>,
    ) -> Vec<Outgoing> {
        let draft = match entry.session.as_ref() {
            Some(session) => session.profile_draft.clone(),
            None => return vec![Outgoing::Text(UNKNOWN_INPUT_TEXT.to_string())],
        };
        let (Some(weight), Some(height), Some(age), Some(activity), Some(city)) = (
            draft.weight_kg,
            draft.height_cm,
            draft.age,
            draft.activity_minutes,
            draft.city,
        ) else {
            entry.session = None;
            log::error!("Profile draft incomplete at commit");
            return vec![Outgoing::Text(
                "Не удалось сохранить профиль. Начните заново с /set_profile.".to_string(),
            )];
        };

        let temp = self.weather.current_temperature(&city).await;

        let water_goal = UserProfile::water_goal(weight, activity, temp);
        let (calorie_goal, is_manual) = match manual_goal {
            Some(goal) => (goal, true),
            None => (
                UserProfile::auto_calorie_goal(weight, height, age, activity),
                false,
            ),
        };

        entry.reset_with_profile(UserProfile {
            weight_kg: weight,
            height_cm: height,
            age,
            activity_minutes: activity,
            city: city.clone(),
            last_known_temp_c: temp,
            water_goal_ml: water_goal,
            calorie_goal_kcal: calorie_goal,
            calorie_goal_is_manual: is_manual,
        });
        entry.session = None;

        log::info!("💾 Profile saved, water goal {:.0} ml", water_goal);
        vec![Outgoing::Text(format!(
            "Профиль сохранён!\n\
             Ваша дневная норма воды: {:.0} мл\n\
             Ваша дневная норма калорий: {:.0} ккал\n\
             Текущая температура в {}: {}°C",
            water_goal, calorie_goal, city, temp
        ))]
    }
}

fn abandon_session(entry: &mut UserEntry) {
    if entry.session.take().is_some() {
        log::debug!("Abandoned unfinished dialogue session");
    }
}

fn error_reply(error: &TrackerError) -> String {
    match error {
        TrackerError::ProfileRequired => PROFILE_REQUIRED_TEXT.to_string(),
        TrackerError::Validation(msg) => msg.clone(),
        TrackerError::InvalidSelection => INVALID_CHOICE_TEXT.to_string(),
    }
}

/// Накопительный ряд выпитой воды.
fn water_chart(profile: &UserProfile, events: &[(DateTime<Utc>, f64)]) -> Option<ChartData> {
    if events.is_empty() {
        return None;
    }

    let mut total = 0.0;
    let points = events
        .iter()
        .map(|&(at, amount)| {
            total += amount;
            (at, total)
        })
        .collect();

    Some(ChartData {
        title: "Прогресс по воде".to_string(),
        y_label: "Выпито воды (мл)".to_string(),
        series_label: "Выпито".to_string(),
        goal: profile.water_goal_ml,
        goal_label: "Норма воды".to_string(),
        points,
        caption: "График прогресса по воде".to_string(),
        filename: "water_progress.png".to_string(),
    })
}

/// Нетто-калории: еда со знаком плюс, тренировки со знаком минус,
/// слитые в один ряд по времени записи.
fn calorie_chart(
    profile: &UserProfile,
    food_events: &[(DateTime<Utc>, f64)],
    workout_events: &[(DateTime<Utc>, f64)],
) -> Option<ChartData> {
    if food_events.is_empty() && workout_events.is_empty() {
        return None;
    }

    let mut events: Vec<(DateTime<Utc>, f64)> = Vec::new();
    events.extend(food_events.iter().copied());
    events.extend(workout_events.iter().map(|&(at, kcal)| (at, -kcal)));
    events.sort_by_key(|&(at, _)| at);

    let mut net = 0.0;
    let points = events
        .into_iter()
        .map(|(at, delta)| {
            net += delta;
            (at, net)
        })
        .collect();

    Some(ChartData {
        title: "Прогресс по калориям".to_string(),
        y_label: "Калории".to_string(),
        series_label: "Нетто калории".to_string(),
        goal: profile.calorie_goal_kcal,
        goal_label: "Норма калорий".to_string(),
        points,
        caption: "График прогресса по калориям".to_string(),
        filename: "calorie_progress.png".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::models::FoodCandidate;

    struct FixedCatalog(Vec<FoodCandidate>);

    #[async_trait]
    impl CatalogSearch for FixedCatalog {
        async fn search(&self, _query: &str) -> Vec<FoodCandidate> {
            self.0.clone()
        }
    }

    struct FixedWeather(f64);

    #[async_trait]
    impl WeatherLookup for FixedWeather {
        async fn current_temperature(&self, _city: &str) -> f64 {
            self.0
        }
    }

    fn orchestrator(candidates: Vec<FoodCandidate>, temp: f64) -> Orchestrator {
        Orchestrator::new(
            UserStore::new(),
            Arc::new(FixedCatalog(candidates)),
            Arc::new(FixedWeather(temp)),
        )
    }

    fn candidate(name: &str, kcal: f64) -> FoodCandidate {
        FoodCandidate {
            name: name.to_string(),
            kcal_per_100g: kcal,
        }
    }

    async fn text(orch: &Orchestrator, user: ChatId, input: &str) -> Vec<Outgoing> {
        orch.handle_event(
            user,
            Incoming::Text {
                text: input.to_string(),
            },
        )
        .await
    }

    async fn set_up_profile(orch: &Orchestrator, user: ChatId) {
        orch.handle_event(user, Incoming::SetProfile).await;
        for input in ["70", "175", "25", "60", "Москва", "авто"] {
            text(orch, user, input).await;
        }
    }

    fn first_text(replies: &[Outgoing]) -> &str {
        match replies.first() {
            Some(Outgoing::Text(text)) => text,
            other => panic!("expected text reply, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn profile_setup_computes_goals() {
        let orch = orchestrator(Vec::new(), 30.0);
        let user = ChatId(1);
        set_up_profile(&orch, user).await;

        let entry = orch.store.entry(user).await;
        let entry = entry.lock().await;
        let profile = entry.profile.as_ref().unwrap();
        assert_eq!(profile.water_goal_ml, 4100.0);
        assert_eq!(profile.calorie_goal_kcal, 2068.75);
        assert!(!profile.calorie_goal_is_manual);
        assert_eq!(profile.last_known_temp_c, 30.0);
        assert!(entry.session.is_none());
    }

    #[tokio::test]
    async fn profile_setup_manual_goal() {
        let orch = orchestrator(Vec::new(), 10.0);
        let user = ChatId(1);
        orch.handle_event(user, Incoming::SetProfile).await;
        for input in ["70", "175", "25", "60", "Москва"] {
            text(&orch, user, input).await;
        }
        text(&orch, user, "1800").await;

        let entry = orch.store.entry(user).await;
        let entry = entry.lock().await;
        let profile = entry.profile.as_ref().unwrap();
        assert_eq!(profile.calorie_goal_kcal, 1800.0);
        assert!(profile.calorie_goal_is_manual);
        // Без жары: 2100 + 1000
        assert_eq!(profile.water_goal_ml, 3100.0);
    }

    #[tokio::test]
    async fn invalid_step_input_retains_state() {
        let orch = orchestrator(Vec::new(), 10.0);
        let user = ChatId(1);
        orch.handle_event(user, Incoming::SetProfile).await;

        let replies = text(&orch, user, "не число").await;
        assert_eq!(first_text(&replies), "Пожалуйста, введите число для веса.");

        let entry = orch.store.entry(user).await;
        let entry = entry.lock().await;
        let session = entry.session.as_ref().unwrap();
        assert_eq!(session.state, DialogState::CollectingWeight);
    }

    #[tokio::test]
    async fn ledger_commands_require_profile() {
        let orch = orchestrator(Vec::new(), 10.0);
        let user = ChatId(1);
        for event in [
            Incoming::LogWater {
                args: "300".to_string(),
            },
            Incoming::LogFood {
                args: "суп".to_string(),
            },
            Incoming::LogWorkout {
                args: "бег 30".to_string(),
            },
            Incoming::CheckProgress,
            Incoming::ShowGraph,
        ] {
            let replies = orch.handle_event(user, event).await;
            assert_eq!(first_text(&replies), PROFILE_REQUIRED_TEXT);
        }
    }

    #[tokio::test]
    async fn log_water_reports_remaining() {
        let orch = orchestrator(Vec::new(), 30.0);
        let user = ChatId(1);
        set_up_profile(&orch, user).await;

        let replies = orch
            .handle_event(
                user,
                Incoming::LogWater {
                    args: "600".to_string(),
                },
            )
            .await;
        assert_eq!(
            first_text(&replies),
            "Записано: 600 мл воды.\nОсталось: 3500 мл."
        );
    }

    #[tokio::test]
    async fn log_water_usage_hint() {
        let orch = orchestrator(Vec::new(), 30.0);
        let user = ChatId(1);
        set_up_profile(&orch, user).await;

        let replies = orch
            .handle_event(user, Incoming::LogWater { args: String::new() })
            .await;
        assert_eq!(
            first_text(&replies),
            "Используйте команду: /log_water <количество_мл>"
        );
    }

    #[tokio::test]
    async fn empty_catalog_routes_to_manual_entry() {
        let orch = orchestrator(Vec::new(), 30.0);
        let user = ChatId(1);
        set_up_profile(&orch, user).await;

        let replies = orch
            .handle_event(
                user,
                Incoming::LogFood {
                    args: "неведомая еда".to_string(),
                },
            )
            .await;
        assert_eq!(
            first_text(&replies),
            "Информация о продукте не найдена. Введите калорийность на 100 г вручную:"
        );

        let entry = orch.store.entry(user).await;
        let entry = entry.lock().await;
        let session = entry.session.as_ref().unwrap();
        assert_eq!(session.state, DialogState::AwaitingManualCalories);
        assert!(session.pending.is_empty());
    }

    #[tokio::test]
    async fn catalog_hits_present_choices() {
        let orch = orchestrator(
            vec![candidate("Гречка", 343.0), candidate("Гречка варёная", 110.0)],
            30.0,
        );
        let user = ChatId(1);
        set_up_profile(&orch, user).await;

        let replies = orch
            .handle_event(
                user,
                Incoming::LogFood {
                    args: "гречка".to_string(),
                },
            )
            .await;

        let Some(Outgoing::Choices { buttons, .. }) = replies.first() else {
            panic!("expected choices, got {:?}", replies);
        };
        // Два кандидата плюс ручной ввод
        assert_eq!(buttons.len(), 3);
        assert_eq!(buttons.last().unwrap().data, MANUAL_CHOICE);

        let entry = orch.store.entry(user).await;
        let entry = entry.lock().await;
        let session = entry.session.as_ref().unwrap();
        assert_eq!(session.state, DialogState::AwaitingFoodChoice);
        assert_eq!(session.pending.len(), 2);
    }

    #[tokio::test]
    async fn unknown_selection_is_rejected_without_side_effects() {
        let orch = orchestrator(vec![candidate("Гречка", 343.0)], 30.0);
        let user = ChatId(1);
        set_up_profile(&orch, user).await;
        orch.handle_event(
            user,
            Incoming::LogFood {
                args: "гречка".to_string(),
            },
        )
        .await;

        let replies = orch
            .handle_event(
                user,
                Incoming::Button {
                    data: "choose_food_deadbeef".to_string(),
                },
            )
            .await;
        assert_eq!(first_text(&replies), INVALID_CHOICE_TEXT);

        let entry = orch.store.entry(user).await;
        let entry = entry.lock().await;
        let session = entry.session.as_ref().unwrap();
        assert_eq!(session.state, DialogState::AwaitingFoodChoice);
        assert_eq!(session.pending.len(), 1);
        assert_eq!(entry.ledger.logged_calories, 0.0);
    }

    #[tokio::test]
    async fn full_food_flow_via_selection() {
        let orch = orchestrator(vec![candidate("Гречка", 343.0)], 30.0);
        let user = ChatId(1);
        set_up_profile(&orch, user).await;
        orch.handle_event(
            user,
            Incoming::LogFood {
                args: "гречка".to_string(),
            },
        )
        .await;

        let data = {
            let entry = orch.store.entry(user).await;
            let entry = entry.lock().await;
            let session = entry.session.as_ref().unwrap();
            let id = session.pending.keys().next().unwrap().clone();
            format!("{}{}", CHOICE_PREFIX, id)
        };

        let replies = orch.handle_event(user, Incoming::Button { data }).await;
        assert!(first_text(&replies).starts_with("Вы выбрали: Гречка"));

        let replies = text(&orch, user, "200").await;
        assert_eq!(
            first_text(&replies),
            "Записано: 686.0 ккал (продукт: Гречка)."
        );

        let entry = orch.store.entry(user).await;
        let entry = entry.lock().await;
        assert_eq!(entry.ledger.logged_calories, 686.0);
        assert!(entry.session.is_none());
    }

    #[tokio::test]
    async fn manual_calorie_flow() {
        let orch = orchestrator(Vec::new(), 30.0);
        let user = ChatId(1);
        set_up_profile(&orch, user).await;
        orch.handle_event(
            user,
            Incoming::LogFood {
                args: "домашний суп".to_string(),
            },
        )
        .await;

        text(&orch, user, "80").await;
        let replies = text(&orch, user, "150").await;
        assert_eq!(
            first_text(&replies),
            "Записано: 120.0 ккал (продукт: домашний суп)."
        );

        let entry = orch.store.entry(user).await;
        let entry = entry.lock().await;
        assert_eq!(entry.ledger.logged_calories, 120.0);
    }

    #[tokio::test]
    async fn manual_button_switches_to_manual_entry() {
        let orch = orchestrator(vec![candidate("Гречка", 343.0)], 30.0);
        let user = ChatId(1);
        set_up_profile(&orch, user).await;
        orch.handle_event(
            user,
            Incoming::LogFood {
                args: "гречка".to_string(),
            },
        )
        .await;

        let replies = orch
            .handle_event(
                user,
                Incoming::Button {
                    data: MANUAL_CHOICE.to_string(),
                },
            )
            .await;
        assert_eq!(first_text(&replies), "Введите калорийность на 100 г вручную:");

        let entry = orch.store.entry(user).await;
        let entry = entry.lock().await;
        let session = entry.session.as_ref().unwrap();
        assert_eq!(session.state, DialogState::AwaitingManualCalories);
        assert!(session.pending.is_empty());
    }

    #[tokio::test]
    async fn stray_button_press_is_quietly_ignored() {
        let orch = orchestrator(Vec::new(), 30.0);
        let user = ChatId(1);
        set_up_profile(&orch, user).await;

        let replies = orch
            .handle_event(
                user,
                Incoming::Button {
                    data: "choose_food_whatever".to_string(),
                },
            )
            .await;
        assert!(replies.is_empty());
    }

    #[tokio::test]
    async fn workout_logs_and_extends_water_goal() {
        let orch = orchestrator(Vec::new(), 30.0);
        let user = ChatId(1);
        set_up_profile(&orch, user).await;

        let replies = orch
            .handle_event(
                user,
                Incoming::LogWorkout {
                    args: "бег 45".to_string(),
                },
            )
            .await;
        assert_eq!(
            first_text(&replies),
            "🏃‍♂️ бег 45 минут — 450 ккал сожжено.\nДополнительно: выпейте 200 мл воды."
        );

        let entry = orch.store.entry(user).await;
        let entry = entry.lock().await;
        assert_eq!(entry.profile.as_ref().unwrap().water_goal_ml, 4300.0);
    }

    #[tokio::test]
    async fn progress_report_with_recommendations() {
        let orch = orchestrator(Vec::new(), 30.0);
        let user = ChatId(1);
        set_up_profile(&orch, user).await;
        orch.handle_event(
            user,
            Incoming::LogWater {
                args: "500".to_string(),
            },
        )
        .await;

        let replies = orch.handle_event(user, Incoming::CheckProgress).await;
        let report = first_text(&replies);
        assert!(report.contains("Выпито: 500 мл из 4100 мл."));
        assert!(report.contains("Рекомендация: Вам стоит выпить больше воды!"));
        assert!(!report.contains("физическую активность"));
    }

    #[tokio::test]
    async fn free_text_without_session_gets_usage_hint() {
        let orch = orchestrator(Vec::new(), 30.0);
        let replies = text(&orch, ChatId(1), "привет").await;
        assert_eq!(first_text(&replies), UNKNOWN_INPUT_TEXT);
    }

    #[tokio::test]
    async fn command_abandons_unfinished_session() {
        let orch = orchestrator(Vec::new(), 30.0);
        let user = ChatId(1);
        set_up_profile(&orch, user).await;

        // Бросаем настройку на полпути и уходим в другую команду
        orch.handle_event(user, Incoming::SetProfile).await;
        text(&orch, user, "80").await;
        orch.handle_event(user, Incoming::CheckProgress).await;

        let entry = orch.store.entry(user).await;
        let entry = entry.lock().await;
        assert!(entry.session.is_none());
        // Старый профиль остался нетронутым
        assert_eq!(entry.profile.as_ref().unwrap().weight_kg, 70.0);
    }

    #[tokio::test]
    async fn show_graph_without_data_reports_no_data() {
        let orch = orchestrator(Vec::new(), 30.0);
        let user = ChatId(1);
        set_up_profile(&orch, user).await;

        let replies = orch.handle_event(user, Incoming::ShowGraph).await;
        assert_eq!(replies.len(), 2);
        assert!(matches!(replies[0], Outgoing::Text(_)));
        assert!(matches!(replies[1], Outgoing::Text(_)));
    }

    #[tokio::test]
    async fn show_graph_builds_cumulative_series() {
        let orch = orchestrator(Vec::new(), 30.0);
        let user = ChatId(1);
        set_up_profile(&orch, user).await;
        for args in ["300", "200"] {
            orch.handle_event(
                user,
                Incoming::LogWater {
                    args: args.to_string(),
                },
            )
            .await;
        }
        orch.handle_event(
            user,
            Incoming::LogWorkout {
                args: "ходьба 30".to_string(),
            },
        )
        .await;

        let replies = orch.handle_event(user, Incoming::ShowGraph).await;
        let Outgoing::Chart(water) = &replies[0] else {
            panic!("expected water chart, got {:?}", replies[0]);
        };
        assert_eq!(
            water.points.iter().map(|&(_, v)| v).collect::<Vec<_>>(),
            vec![300.0, 500.0]
        );
        // Норма уже с бонусом за тренировку
        assert_eq!(water.goal, 4300.0);

        let Outgoing::Chart(calories) = &replies[1] else {
            panic!("expected calorie chart, got {:?}", replies[1]);
        };
        assert_eq!(
            calories.points.iter().map(|&(_, v)| v).collect::<Vec<_>>(),
            vec![-120.0]
        );
    }

    #[tokio::test]
    async fn new_profile_setup_resets_ledger() {
        let orch = orchestrator(Vec::new(), 30.0);
        let user = ChatId(1);
        set_up_profile(&orch, user).await;
        orch.handle_event(
            user,
            Incoming::LogWater {
                args: "500".to_string(),
            },
        )
        .await;

        set_up_profile(&orch, user).await;
        let entry = orch.store.entry(user).await;
        let entry = entry.lock().await;
        assert_eq!(entry.ledger.logged_water_ml, 0.0);
    }
}
