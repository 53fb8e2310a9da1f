use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("{0}")]
    Other(String),
}

/// Why a login call gave up.
///
/// Terminal variants must never be retried at any layer. `AttemptsExhausted`
/// means every attempt hit a transient problem (misread challenge, driver hiccup).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoginFailure {
    #[error("account locked ({code}): {message}")]
    AccountLocked { code: String, message: String },

    #[error("credentials rejected: {message}")]
    InvalidCredentials { message: String },

    #[error("login failed after {attempts} attempts: {last_error}")]
    AttemptsExhausted { attempts: u32, last_error: String },

    #[error("browser session could not be opened: {0}")]
    SessionUnavailable(String),
}

impl LoginFailure {
    /// Stable reason code for logs and alerts.
    #[must_use]
    pub const fn reason_code(&self) -> &'static str {
        match self {
            Self::AccountLocked { .. } => "account_locked",
            Self::InvalidCredentials { .. } => "invalid_credentials",
            Self::AttemptsExhausted { .. } => "attempts_exhausted",
            Self::SessionUnavailable(_) => "session_unavailable",
        }
    }

    /// True for credential and lockout failures.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::AccountLocked { .. } | Self::InvalidCredentials { .. }
        )
    }
}

/// Batch persistence errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt batch file {path}: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to persist batch to {path}: {reason}")]
    Persist { path: String, reason: String },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Login(#[from] LoginFailure),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("portal error: {0}")]
    Portal(String),

    #[error("notification error: {0}")]
    Notify(String),

    #[error("order system error: {0}")]
    Order(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, Error>;
