use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HubSpotError {
    #[error("HubSpot returned 401 Unauthorized for {0}")]
    Unauthorized(String),

    #[error("HubSpot API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Network error: {0}")]
    Network(#[from] BridgeError),
}

impl HubSpotError {
    /// Upstream HTTP status, when the failure came from a response
    pub fn status_code(&self) -> Option<u16> {
        match self {
            HubSpotError::Unauthorized(_) => Some(401),
            HubSpotError::ApiError { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, HubSpotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = HubSpotError::ApiError {
            status_code: 429,
            message: "rate limited".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "HubSpot API error (status 429): rate limited"
        );
        assert_eq!(error.status_code(), Some(429));

        let error = HubSpotError::Unauthorized("/crm/v3/objects/deals".to_string());
        assert!(error.to_string().contains("401"));
        assert_eq!(error.status_code(), Some(401));
    }

    #[test]
    fn test_bridge_error_converts() {
        let error: HubSpotError = BridgeError::Timeout("https://api.hubapi.com".to_string()).into();
        assert!(matches!(error, HubSpotError::Network(_)));
        assert_eq!(error.status_code(), None);
    }
}
