use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile};
use std::error::Error;

use crate::dialogue::{ChoiceButton, Outgoing};
use crate::handlers::charts;

/// Переводит абстрактные ответы ядра в вызовы Telegram API.
pub async fn deliver(
    bot: &Bot,
    chat_id: ChatId,
    replies: Vec<Outgoing>,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    for reply in replies {
        match reply {
            Outgoing::Text(text) => {
                bot.send_message(chat_id, text).await?;
            }
            Outgoing::Choices { text, buttons } => {
                bot.send_message(chat_id, text)
                    .reply_markup(choice_keyboard(&buttons))
                    .await?;
            }
            Outgoing::Chart(chart) => match charts::render_chart(&chart) {
                Ok(png) => {
                    bot.send_photo(
                        chat_id,
                        InputFile::memory(png).file_name(chart.filename.clone()),
                    )
                    .caption(chart.caption.clone())
                    .await?;
                }
                Err(e) => {
                    log::error!("Chart rendering failed: {}", e);
                    bot.send_message(chat_id, "Не удалось построить график.")
                        .await?;
                }
            },
        }
    }
    Ok(())
}

/// Колонка кнопок, по одной на строку.
pub fn choice_keyboard(buttons: &[ChoiceButton]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(
        buttons
            .iter()
            .map(|button| {
                vec![InlineKeyboardButton::callback(
                    button.label.clone(),
                    button.data.clone(),
                )]
            })
            .collect::<Vec<_>>(),
    )
}
