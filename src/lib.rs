pub mod account;
pub mod app;
pub mod cli;
pub mod constants;
pub mod gateway;
pub mod inbox;
pub mod runtime;
pub mod session;
pub mod utils;

pub use app::{load_config, AppState, Config, Language};
pub use gateway::{Gateway, HttpGateway};
pub use session::{ConversationSession, SessionEvent, SessionManager};
pub use utils::{GatewayError, HamoError, SessionError};
