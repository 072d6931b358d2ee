use crate::error::{AuthError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Identity a credential record is stored under
///
/// An authenticated owner is durable and preferred; a flow id (the state token
/// of the authorization that produced the credentials) is the fallback for
/// callers with no authenticated identity. The two namespaces never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CredentialKey {
    Owner(String),
    Flow(String),
}

impl CredentialKey {
    /// Pick the key for a lookup. An owner id wins over a flow id. Ids are
    /// opaque and used verbatim; only empty strings count as absent.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::IdentifierRequired`] if neither is given.
    pub fn resolve(owner_id: Option<&str>, flow_id: Option<&str>) -> Result<Self> {
        fn present(v: Option<&str>) -> Option<&str> {
            v.filter(|v| !v.is_empty())
        }

        match (present(owner_id), present(flow_id)) {
            (Some(owner), _) => Ok(CredentialKey::Owner(owner.to_string())),
            (None, Some(flow)) => Ok(CredentialKey::Flow(flow.to_string())),
            (None, None) => Err(AuthError::IdentifierRequired),
        }
    }

    /// Key under which the record is persisted
    pub fn storage_key(&self) -> String {
        match self {
            CredentialKey::Owner(id) => format!("owner:{}:creds", id),
            CredentialKey::Flow(id) => format!("flow:{}:creds", id),
        }
    }
}

impl fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialKey::Owner(id) => write!(f, "owner {}", id),
            CredentialKey::Flow(id) => {
                write!(f, "flow {}", core_runtime::logging::short_id(id))
            }
        }
    }
}

/// Pending authorization, alive for the lifetime of one consent round trip
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRecord {
    pub state_token: String,
    /// Unix seconds
    pub created_at: i64,
    pub owner_id: Option<String>,
}

impl StateRecord {
    pub fn storage_key(state_token: &str) -> String {
        format!("state:{}", state_token)
    }

    /// Where credentials produced by this flow are stored
    pub fn credential_key(&self) -> CredentialKey {
        match self.owner_id.as_deref().filter(|id| !id.is_empty()) {
            Some(owner) => CredentialKey::Owner(owner.to_string()),
            None => CredentialKey::Flow(self.state_token.clone()),
        }
    }
}

/// Stored token pair for one identity
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialRecord {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Unix seconds
    pub expires_at: i64,
    /// Token endpoint response exactly as received
    #[serde(default)]
    pub raw: Map<String, Value>,
}

impl CredentialRecord {
    pub fn has_access_token(&self) -> bool {
        !self.access_token.is_empty()
    }

    /// Whether the access token is expired or will be within `margin_secs`
    pub fn needs_refresh(&self, now: i64, margin_secs: i64) -> bool {
        now >= self.expires_at.saturating_sub(margin_secs)
    }
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_at", &self.expires_at)
            .field("raw", &format_args!("{{{} fields}}", self.raw.len()))
            .finish()
    }
}

/// Result of a successful callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationOutcome {
    /// Frontend URL with `state=<flow_id>` appended
    pub redirect_url: String,
    /// The consumed state token
    pub flow_id: String,
    /// Where the new credentials were stored
    pub credential_key: CredentialKey,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_wins_over_flow() {
        let key = CredentialKey::resolve(Some("u1"), Some("s1")).unwrap();
        assert_eq!(key, CredentialKey::Owner("u1".to_string()));
        assert_eq!(key.storage_key(), "owner:u1:creds");

        let key = CredentialKey::resolve(Some(""), Some("s1")).unwrap();
        assert_eq!(key.storage_key(), "flow:s1:creds");
    }

    #[test]
    fn test_resolve_requires_identifier() {
        assert!(matches!(
            CredentialKey::resolve(None, None),
            Err(AuthError::IdentifierRequired)
        ));
        assert!(matches!(
            CredentialKey::resolve(Some(""), Some("")),
            Err(AuthError::IdentifierRequired)
        ));
    }

    #[test]
    fn test_owner_id_is_opaque() {
        let key = CredentialKey::resolve(Some(" user-1"), None).unwrap();
        assert_eq!(key, CredentialKey::Owner(" user-1".to_string()));

        let state = StateRecord {
            state_token: "s".to_string(),
            created_at: 0,
            owner_id: Some(" user-1".to_string()),
        };
        assert_eq!(state.credential_key().storage_key(), key.storage_key());
    }

    #[test]
    fn test_state_record_credential_key() {
        let anonymous = StateRecord {
            state_token: "abc".to_string(),
            created_at: 0,
            owner_id: None,
        };
        assert_eq!(
            anonymous.credential_key(),
            CredentialKey::Flow("abc".to_string())
        );

        let owned = StateRecord {
            owner_id: Some("42".to_string()),
            ..anonymous
        };
        assert_eq!(owned.credential_key(), CredentialKey::Owner("42".to_string()));
        assert_eq!(StateRecord::storage_key("abc"), "state:abc");
    }

    #[test]
    fn test_needs_refresh_margin() {
        let record = CredentialRecord {
            access_token: "a".to_string(),
            refresh_token: None,
            expires_at: 1_000,
            raw: Map::new(),
        };

        assert!(!record.needs_refresh(939, 60));
        assert!(record.needs_refresh(940, 60));
        assert!(record.needs_refresh(2_000, 60));
    }

    #[test]
    fn test_debug_hides_tokens() {
        let record = CredentialRecord {
            access_token: "live-access".to_string(),
            refresh_token: Some("live-refresh".to_string()),
            expires_at: 1,
            raw: Map::new(),
        };
        let debug = format!("{:?}", record);
        assert!(!debug.contains("live-access"));
        assert!(!debug.contains("live-refresh"));
    }

    #[test]
    fn test_record_tolerates_missing_tokens() {
        let record: CredentialRecord = serde_json::from_str(r#"{"expires_at": 5}"#).unwrap();
        assert!(!record.has_access_token());
        assert_eq!(record.refresh_token, None);
        assert!(record.raw.is_empty());
    }
}
