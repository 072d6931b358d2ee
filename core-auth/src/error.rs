use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid or expired OAuth state")]
    InvalidOrExpiredState,

    #[error("Provider denied authorization: {0}")]
    ProviderDenied(String),

    #[error("Token exchange failed ({status}): {body}")]
    TokenExchange { status: u16, body: String },

    #[error("Token refresh failed ({status}): {body}")]
    TokenRefresh { status: u16, body: String },

    #[error("No credentials found for {0}")]
    NotFound(String),

    #[error("No refresh token available")]
    NoRefreshToken,

    #[error("Either an owner id or a flow id is required")]
    IdentifierRequired,

    #[error("Credential store unavailable: {0}")]
    Store(String),

    #[error("Network error: {0}")]
    Network(#[from] BridgeError),

    #[error("Stored record at {key} is corrupted: {reason}")]
    CorruptRecord { key: String, reason: String },

    #[error("Serialization failed ({context}): {source}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, AuthError>;
