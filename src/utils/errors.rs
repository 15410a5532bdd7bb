use thiserror::Error;

/// Failure of a single backend call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("{message} (status {status})")]
    Status { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Request cancelled")]
    Cancelled,
}

impl GatewayError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Malformed(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// Outcome errors of the conversation session manager
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Failed to start session: {0}")]
    Start(#[source] GatewayError),

    #[error("Failed to send message: {source}")]
    Send {
        text: String,
        #[source]
        source: GatewayError,
    },

    #[error("Failed to change visibility: {0}")]
    Visibility(#[source] GatewayError),

    #[error("Failed to load history: {0}")]
    HistoryLoad(#[source] GatewayError),

    #[error("Session is no longer active")]
    Inactive,
}

/// Main error type for Hamo
#[derive(Error, Debug)]
pub enum HamoError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<toml::de::Error> for HamoError {
    fn from(err: toml::de::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<toml::ser::Error> for HamoError {
    fn from(err: toml::ser::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
