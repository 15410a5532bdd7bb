use serde::{Deserialize, Serialize};

use crate::inbox::ConnectedAvatar;

/// The signed-in end user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientUser {
    pub id: String,
    pub email: Option<String>,
    pub nickname: Option<String>,
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: Option<ClientUser>,
    pub connected_avatars: Vec<ConnectedAvatar>,
}

/// Result of a successful registration
#[derive(Debug, Clone)]
pub struct Registration {
    pub user: Option<ClientUser>,
    /// Avatar linked through the invitation code
    pub connected_avatar: Option<ConnectedAvatar>,
}

/// Result of checking an invitation code before registering
#[derive(Debug, Clone)]
pub struct Invitation {
    pub valid: bool,
    pub pro_avatar: Option<ConnectedAvatar>,
}

/// Fields a client may change on their profile; unset fields are left alone
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_password: Option<String>,
}
