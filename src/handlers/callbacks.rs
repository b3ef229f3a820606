use teloxide::prelude::*;
use std::error::Error;

use crate::dialogue::{self, Incoming, Orchestrator, Outgoing};
use crate::handlers::utils::deliver;

pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    orchestrator: Orchestrator,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let (Some(data), Some(message)) = (q.data.clone(), q.message.as_ref()) else {
        bot.answer_callback_query(q.id).await?;
        return Ok(());
    };
    let chat_id = message.chat().id;
    let message_id = message.id();

    let mut replies = orchestrator
        .handle_event(chat_id, Incoming::Button { data })
        .await;

    match replies.first() {
        Some(Outgoing::Text(text)) if text == dialogue::INVALID_CHOICE_TEXT => {
            // Тост: клавиатура с кандидатами остаётся на месте
            bot.answer_callback_query(q.id)
                .text(dialogue::INVALID_CHOICE_TEXT)
                .await?;
            return Ok(());
        }
        Some(Outgoing::Text(text)) => {
            bot.answer_callback_query(q.id).await?;
            bot.edit_message_text(chat_id, message_id, text.clone())
                .await?;
            replies.remove(0);
        }
        _ => {
            bot.answer_callback_query(q.id).await?;
        }
    }

    deliver(&bot, chat_id, replies).await
}
