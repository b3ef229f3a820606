use teloxide::prelude::*;
use std::error::Error;

use crate::dialogue::{Incoming, Orchestrator};
use crate::handlers::utils::deliver;

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    orchestrator: Orchestrator,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    if let Some(text) = msg.text() {
        // Известные команды уже обработаны в command_handler,
        // сюда доходят только нераспознанные
        if text.starts_with('/') {
            bot.send_message(
                msg.chat.id,
                "Неизвестная команда. Посмотрите список команд: /help",
            )
            .await?;
            return Ok(());
        }

        let replies = orchestrator
            .handle_event(
                msg.chat.id,
                Incoming::Text {
                    text: text.to_string(),
                },
            )
            .await;
        deliver(&bot, msg.chat.id, replies).await?;
    } else {
        bot.send_message(
            msg.chat.id,
            "Я понимаю только текстовые сообщения. Посмотрите список команд: /help",
        )
        .await?;
    }
    Ok(())
}
