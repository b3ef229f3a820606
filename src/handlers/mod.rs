pub mod callbacks;
pub mod charts;
pub mod commands;
pub mod messages;
pub mod utils;

pub use callbacks::callback_handler;
pub use commands::command_handler;
pub use messages::message_handler;

use chrono::Duration;
use tokio::time;

use crate::store::UserStore;

const SESSION_TTL_MINUTES: i64 = 30;

/// Фоновая задача: сбрасывает диалоги, брошенные на полпути.
pub async fn expire_sessions_task(store: UserStore) {
    let mut interval = time::interval(time::Duration::from_secs(60));

    loop {
        interval.tick().await;

        let expired = store
            .expire_stale_sessions(Duration::minutes(SESSION_TTL_MINUTES))
            .await;
        if expired > 0 {
            log::info!("🧹 Expired {} stale dialogue sessions", expired);
        }
    }
}
