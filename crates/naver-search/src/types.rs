//! Credentials, validation trait, and the error type shared by all endpoints.

use std::fmt;

pub const CLIENT_ID_ENV: &str = "NAVER_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "NAVER_CLIENT_SECRET";

/// Application credentials issued by the Naver developer console.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Read both credentials from `NAVER_CLIENT_ID` / `NAVER_CLIENT_SECRET`.
    pub fn from_env() -> NaverResult<Self> {
        Self::resolve(None, None)
    }

    /// Resolve credentials: explicit value > environment variable.
    ///
    /// Empty strings count as missing.
    pub fn resolve(client_id: Option<String>, client_secret: Option<String>) -> NaverResult<Self> {
        let client_id = pick(client_id, CLIENT_ID_ENV)?;
        let client_secret = pick(client_secret, CLIENT_SECRET_ENV)?;
        Ok(Self {
            client_id,
            client_secret,
        })
    }
}

fn pick(explicit: Option<String>, env_var: &str) -> NaverResult<String> {
    explicit
        .or_else(|| std::env::var(env_var).ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| NaverError::MissingCredentials(env_var.to_string()))
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Argument structs check provider-side constraints before any request is sent.
pub trait Validate {
    fn validate(&self) -> NaverResult<()>;
}

/// Errors produced by the Naver client.
#[derive(thiserror::Error, Debug)]
pub enum NaverError {
    #[error("Missing credentials: {0} must be set")]
    MissingCredentials(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Naver API error ({status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type NaverResult<T> = Result<T, NaverError>;

pub(crate) fn invalid(message: impl Into<String>) -> NaverError {
    NaverError::InvalidArgument(message.into())
}
