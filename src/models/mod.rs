pub mod ledger;
pub mod profile;
pub mod session;

pub use ledger::{ProgressSnapshot, UserLedger, WorkoutSummary, WorkoutType};
pub use profile::UserProfile;
pub use session::{ConversationSession, DialogState, FoodCandidate, FoodDraft, ProfileDraft};
