use teloxide::{prelude::*, utils::command::{BotCommands, ParseError}};
use std::env;
use std::sync::Arc;

mod clients;
mod dialogue;
mod handlers;
mod models;
mod similarity;
mod store;

use crate::clients::{OpenFoodFactsClient, OpenWeatherClient};
use crate::dialogue::Orchestrator;
use crate::handlers::{callback_handler, command_handler, message_handler};
use crate::store::UserStore;

// Хвост команды одной строкой, разбор аргументов остаётся за ядром
fn raw_args(input: String) -> Result<(String,), ParseError> {
    Ok((input,))
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "snake_case", description = "Доступные команды:")]
pub enum Command {
    #[command(description = "начать работу с ботом")]
    Start,
    #[command(description = "показать доступные команды")]
    Help,
    #[command(description = "настроить профиль")]
    SetProfile,
    #[command(description = "записать воду (мл)", parse_with = raw_args)]
    LogWater(String),
    #[command(description = "записать еду", parse_with = raw_args)]
    LogFood(String),
    #[command(description = "записать тренировку", parse_with = raw_args)]
    LogWorkout(String),
    #[command(description = "проверить прогресс")]
    CheckProgress,
    #[command(description = "показать график")]
    ShowGraph,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Загружаем .env и инициализируем логирование
    dotenvy::dotenv().ok();
    env_logger::init();
    log::info!("Starting water and calorie tracking bot...");

    let openweather_api_key =
        env::var("OPENWEATHER_API_KEY").expect("OPENWEATHER_API_KEY must be set");

    let http = reqwest::Client::new();
    let store = UserStore::new();
    let orchestrator = Orchestrator::new(
        store.clone(),
        Arc::new(OpenFoodFactsClient::new(http.clone())),
        Arc::new(OpenWeatherClient::new(http, openweather_api_key)),
    );

    // Фоновая задача для очистки брошенных диалогов
    let store_clone = store.clone();
    tokio::spawn(async move {
        handlers::expire_sessions_task(store_clone).await;
    });

    let bot = Bot::from_env();
    bot.set_my_commands(Command::bot_commands()).await?;

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(command_handler),
        )
        .branch(Update::filter_callback_query().endpoint(callback_handler))
        .branch(Update::filter_message().endpoint(message_handler));

    log::info!("🚀 Bot started");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![orchestrator])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
