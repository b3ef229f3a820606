use crate::models::{ConversationSession, DialogState};

/// Что оркестратор должен сделать после шага диалога. Сам шаг уже
/// записал принятое значение в черновик сессии.
#[derive(Debug, Clone, PartialEq)]
pub enum StepAction {
    /// Ответить текстом; сессия продолжается (или осталась на месте
    /// после ошибки ввода).
    Prompt(String),
    /// Запросить каталог продуктов по собранному запросу.
    SearchCatalog { query: String },
    /// Все поля профиля собраны, можно считать нормы и сохранять.
    CommitProfile { manual_goal: Option<f64> },
    /// Еда выбрана и взвешена, можно писать в журнал.
    CommitFood {
        name: String,
        kcal_per_100g: f64,
        grams: f64,
    },
    /// Диалог продолжать нечем, сессию нужно уничтожить.
    Abort { reply: String },
}

/// Один шаг конечного автомата: текстовый ввод в текущем состоянии.
/// Непригодный ввод оставляет состояние на месте и возвращает
/// корректирующую подсказку.
pub fn advance(session: &mut ConversationSession, text: &str) -> StepAction {
    session.touch();
    let input = text.trim();

    match session.state {
        DialogState::CollectingWeight => match parse_positive(input) {
            Some(weight) => {
                session.profile_draft.weight_kg = Some(weight);
                session.state = DialogState::CollectingHeight;
                StepAction::Prompt("Введите ваш рост (в см):".to_string())
            }
            None => StepAction::Prompt("Пожалуйста, введите число для веса.".to_string()),
        },

        DialogState::CollectingHeight => match parse_positive(input) {
            Some(height) => {
                session.profile_draft.height_cm = Some(height);
                session.state = DialogState::CollectingAge;
                StepAction::Prompt("Введите ваш возраст:".to_string())
            }
            None => StepAction::Prompt("Пожалуйста, введите число для роста.".to_string()),
        },

        DialogState::CollectingAge => match input.parse::<u32>() {
            Ok(age) if age > 0 => {
                session.profile_draft.age = Some(age);
                session.state = DialogState::CollectingActivity;
                StepAction::Prompt("Сколько минут активности у вас в день?".to_string())
            }
            _ => StepAction::Prompt("Пожалуйста, введите число для возраста.".to_string()),
        },

        DialogState::CollectingActivity => match input.parse::<u32>() {
            Ok(minutes) => {
                session.profile_draft.activity_minutes = Some(minutes);
                session.state = DialogState::CollectingCity;
                StepAction::Prompt("В каком городе вы находитесь?".to_string())
            }
            Err(_) => {
                StepAction::Prompt("Пожалуйста, введите число для минут активности.".to_string())
            }
        },

        DialogState::CollectingCity => {
            if input.is_empty() {
                StepAction::Prompt("Пожалуйста, введите название города.".to_string())
            } else {
                session.profile_draft.city = Some(input.to_string());
                session.state = DialogState::CollectingCalorieGoal;
                StepAction::Prompt(
                    "Введите вашу цель по калориям или слово 'авто' для автоматического расчёта:"
                        .to_string(),
                )
            }
        }

        DialogState::CollectingCalorieGoal => {
            if input.eq_ignore_ascii_case("auto") || input.to_lowercase() == "авто" {
                StepAction::CommitProfile { manual_goal: None }
            } else {
                match parse_positive(input) {
                    Some(goal) => StepAction::CommitProfile {
                        manual_goal: Some(goal),
                    },
                    None => StepAction::Prompt(
                        "Пожалуйста, введите число для цели по калориям или отправьте слово 'авто'."
                            .to_string(),
                    ),
                }
            }
        }

        DialogState::AwaitingFoodQuery => {
            if input.is_empty() {
                StepAction::Prompt("Введите название продукта:".to_string())
            } else {
                StepAction::SearchCatalog {
                    query: input.to_string(),
                }
            }
        }

        DialogState::AwaitingFoodChoice => StepAction::Prompt(
            "Выберите продукт кнопкой выше или нажмите 'Ввести калорийность вручную'.".to_string(),
        ),

        DialogState::AwaitingManualCalories => match parse_positive(input) {
            Some(kcal) => {
                session.food_draft.kcal_per_100g = Some(kcal);
                session.state = DialogState::AwaitingGrams;
                StepAction::Prompt("Калорийность записана. Сколько грамм вы съели?".to_string())
            }
            None => StepAction::Prompt(
                "Пожалуйста, введите положительное число для калорийности.".to_string(),
            ),
        },

        DialogState::AwaitingGrams => match parse_positive(input) {
            Some(grams) => match session.food_draft.kcal_per_100g {
                Some(kcal_per_100g) => StepAction::CommitFood {
                    name: session
                        .food_draft
                        .name
                        .clone()
                        .unwrap_or_else(|| "Продукт".to_string()),
                    kcal_per_100g,
                    grams,
                },
                None => StepAction::Abort {
                    reply: "К сожалению, не удалось определить калорийность продукта.".to_string(),
                },
            },
            None => {
                StepAction::Prompt("Пожалуйста, введите положительное число для граммов.".to_string())
            }
        },
    }
}

fn parse_positive(input: &str) -> Option<f64> {
    let value: f64 = input.replace(',', ".").parse().ok()?;
    (value.is_finite() && value > 0.0).then_some(value)
}
