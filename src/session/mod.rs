/// Conversation session management - Gateway

mod history;
mod manager;
#[allow(clippy::module_inception)]
mod session;
#[cfg(test)]
mod testing;
mod transcript;

pub use history::{display_time, reconstruct};
pub use manager::SessionManager;
pub use session::{ConversationSession, DrainState, SessionEvent, SessionInfo};
pub use transcript::{Message, MessageId, Sender, Transcript};
