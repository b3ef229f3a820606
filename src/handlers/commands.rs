use teloxide::prelude::*;
use std::error::Error;

use crate::dialogue::{Incoming, Orchestrator};
use crate::handlers::utils::deliver;
use crate::Command;

pub async fn command_handler(
    bot: Bot,
    msg: Message,
    cmd: Command,
    orchestrator: Orchestrator,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let event = match cmd {
        Command::Start => Incoming::Start,
        Command::Help => Incoming::Help,
        Command::SetProfile => Incoming::SetProfile,
        Command::LogWater(args) => Incoming::LogWater { args },
        Command::LogFood(args) => Incoming::LogFood { args },
        Command::LogWorkout(args) => Incoming::LogWorkout { args },
        Command::CheckProgress => Incoming::CheckProgress,
        Command::ShowGraph => Incoming::ShowGraph,
    };

    let replies = orchestrator.handle_event(msg.chat.id, event).await;
    deliver(&bot, msg.chat.id, replies).await
}
