// Gateway module for the backend - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod client;
mod http;
mod traits;
mod types;

// Payload normalization is public so other boundaries (account, inbox) reuse it
pub mod normalize;
#[cfg(test)]
pub(crate) mod testing;

// Public re-exports - the ONLY way to access backend functionality
pub use client::ApiClient;
pub use http::HttpGateway;
pub use traits::Gateway;
#[cfg(test)]
pub use traits::MockGateway;
pub use types::{display_fragments, ChatReply, HistoryRecord, Role, SessionHandle};
