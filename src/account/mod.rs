/// Client account and credential cache - Gateway
mod service;
mod tokens;
mod types;

pub use service::AccountService;
pub use tokens::{CachedCredentials, TokenStore};
pub use types::{ClientUser, Invitation, LoginOutcome, ProfileUpdate, Registration};
