use core_auth::AuthError;
use core_sync::SyncError;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

impl CoreError {
    /// HTTP status an entry layer should answer with
    ///
    /// Caller mistakes and missing preconditions are 4xx, a rejected refresh
    /// token is 401 so the caller reconnects, failures talking to HubSpot are
    /// 502 and everything on our side is 500.
    pub fn status_code(&self) -> u16 {
        match self {
            CoreError::InitializationFailed(_) | CoreError::Config(_) => 500,
            CoreError::Auth(e) => auth_status(e),
            CoreError::Sync(SyncError::NoAccessToken) => 400,
            CoreError::Sync(SyncError::Auth(e)) => auth_status(e),
        }
    }

    /// `{"error": message}`
    pub fn to_response_body(&self) -> Value {
        json!({ "error": self.to_string() })
    }
}

fn auth_status(error: &AuthError) -> u16 {
    match error {
        AuthError::InvalidRequest(_)
        | AuthError::InvalidOrExpiredState
        | AuthError::ProviderDenied(_)
        | AuthError::NoRefreshToken
        | AuthError::IdentifierRequired => 400,
        AuthError::NotFound(_) => 404,
        AuthError::TokenRefresh { status, .. } if matches!(status, 400 | 401) => 401,
        AuthError::TokenExchange { .. } | AuthError::TokenRefresh { .. } | AuthError::Network(_) => {
            502
        }
        AuthError::Configuration(_)
        | AuthError::Store(_)
        | AuthError::CorruptRecord { .. }
        | AuthError::Serialization { .. } => 500,
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
