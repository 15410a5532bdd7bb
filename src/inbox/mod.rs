/// Connected-avatar inbox - Gateway
mod avatar;
mod list;

pub use avatar::ConnectedAvatar;
pub use list::Inbox;
