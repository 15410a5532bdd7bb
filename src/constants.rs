/// Constants module to avoid magic numbers in the codebase

// Network Configuration
pub const DEFAULT_API_BASE_URL: &str = "https://api.hamo.ai/api";
pub const HTTP_REQUEST_TIMEOUT_SECS: u64 = 120;

// Backend endpoints
pub const ENDPOINT_REGISTER: &str = "/auth/registerClient";
pub const ENDPOINT_LOGIN: &str = "/auth/loginClient";
pub const ENDPOINT_REFRESH: &str = "/auth/refreshClient";
pub const ENDPOINT_VALIDATE_INVITATION: &str = "/client/invitation/validate";
pub const ENDPOINT_CONNECTED_AVATARS: &str = "/client/avatars";
pub const ENDPOINT_CONNECT_AVATAR: &str = "/client/avatar/connect";
pub const ENDPOINT_PROFILE: &str = "/client/profile";
pub const ENDPOINT_ACCOUNT: &str = "/client/account";
pub const ENDPOINT_MIND: &str = "/mind";
pub const ENDPOINT_SESSION: &str = "/session";

// Logging
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const VERBOSE_LOG_LEVEL: &str = "debug";

// Messages surfaced to the user
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please login again.";

// Config locations
pub const CONFIG_ENV_PREFIX: &str = "HAMO_";
pub const LOCAL_CONFIG_PATH: &str = ".hamo/config.toml";
pub const TOKEN_FILE_NAME: &str = "tokens.toml";

// Transcript display
pub const TIME_DISPLAY_FORMAT: &str = "%H:%M";
pub const DATE_DISPLAY_FORMAT: &str = "%b %-d";
pub const CLIENT_PREVIEW_PREFIX: &str = "You: ";
