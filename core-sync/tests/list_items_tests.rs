//! Item listing over a stored connection with a mocked object source.

use async_trait::async_trait;
use bridge_desktop::InMemoryKeyValueStore;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::time::FixedClock;
use bridge_traits::IntegrationItem;
use core_auth::{
    AuthError, CredentialKey, CredentialRecord, CredentialStore, OAuthClient, OAuthConfig,
    OAuthFlowManager,
};
use core_sync::{SyncConfig, SyncError, SyncOrchestrator};
use mockall::mock;
use provider_hubspot::{HubSpotError, ObjectSource, ObjectType};
use serde_json::{json, Map};
use std::sync::{Arc, Mutex};

const NOW: i64 = 1_700_000_000;

mock! {
    Source {}

    #[async_trait]
    impl ObjectSource for Source {
        async fn list_objects(
            &self,
            object_type: ObjectType,
            access_token: &str,
        ) -> provider_hubspot::Result<Vec<IntegrationItem>>;
    }
}

/// Token endpoint that answers at most once
#[derive(Default)]
struct TokenEndpoint {
    response: Mutex<Option<HttpResponse>>,
}

#[async_trait]
impl HttpClient for TokenEndpoint {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        self.response
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| BridgeError::NotAvailable(format!("unexpected call to {}", request.url)))
    }
}

fn manager(token_endpoint: TokenEndpoint) -> Arc<OAuthFlowManager> {
    let clock = Arc::new(FixedClock::at_unix(NOW));
    let kv = Arc::new(InMemoryKeyValueStore::with_clock(clock.clone()));
    Arc::new(OAuthFlowManager::new(
        OAuthClient::new(
            OAuthConfig::hubspot("client-id", "client-secret"),
            Arc::new(token_endpoint),
        ),
        CredentialStore::new(kv),
        clock,
        "http://localhost:3000/integrations?connected=hubspot",
    ))
}

fn record(access_token: &str, expires_at: i64) -> CredentialRecord {
    CredentialRecord {
        access_token: access_token.to_string(),
        refresh_token: Some("rt-1".to_string()),
        expires_at,
        raw: Map::new(),
    }
}

async fn connected(key: &CredentialKey, access_token: &str) -> Arc<OAuthFlowManager> {
    let manager = manager(TokenEndpoint::default());
    manager
        .store()
        .put_credentials(key, &record(access_token, NOW + 3600))
        .await
        .unwrap();
    manager
}

fn item(id: &str, object_type: &str) -> IntegrationItem {
    IntegrationItem::new(id, id).with_parameter("objectType", object_type)
}

fn source_with_failing_companies() -> MockSource {
    let mut source = MockSource::new();
    source
        .expect_list_objects()
        .times(3)
        .returning(|object_type, _| match object_type {
            ObjectType::Contacts => Ok(vec![item("c1", "contact"), item("c2", "contact")]),
            ObjectType::Companies => Err(HubSpotError::ApiError {
                status_code: 500,
                message: "boom".to_string(),
            }),
            ObjectType::Deals => Ok(vec![item("d1", "deal")]),
        });
    source
}

fn ids(items: &[IntegrationItem]) -> Vec<&str> {
    items.iter().map(|i| i.id.as_str()).collect()
}

#[tokio::test]
async fn failing_type_becomes_error_item_in_place() {
    for concurrent_fetch in [true, false] {
        let owner = CredentialKey::Owner("u1".to_string());
        let orchestrator = SyncOrchestrator::new(
            connected(&owner, "at-1").await,
            Arc::new(source_with_failing_companies()),
            SyncConfig { concurrent_fetch },
        );

        let items = orchestrator.list_items(Some("u1"), None).await.unwrap();

        assert_eq!(ids(&items), ["c1", "c2", "error_companies", "d1"]);
        let error = &items[2];
        assert_eq!(error.title, "Companies fetch error");
        assert_eq!(
            error.parameter("error"),
            Some(&json!("HubSpot API error (status 500): boom"))
        );
    }
}

#[tokio::test]
async fn unauthorized_everywhere_yields_three_error_items() {
    let owner = CredentialKey::Owner("u1".to_string());
    let mut source = MockSource::new();
    source
        .expect_list_objects()
        .times(3)
        .returning(|object_type, _| Err(HubSpotError::Unauthorized(object_type.path().to_string())));

    let orchestrator = SyncOrchestrator::new(
        connected(&owner, "revoked").await,
        Arc::new(source),
        SyncConfig::default(),
    );

    let items = orchestrator.list_items(Some("u1"), None).await.unwrap();
    assert_eq!(ids(&items), ["error_contacts", "error_companies", "error_deals"]);
}

#[tokio::test]
async fn stored_access_token_is_passed_to_every_fetch() {
    let flow = CredentialKey::Flow("state-123".to_string());
    let mut source = MockSource::new();
    source
        .expect_list_objects()
        .withf(|_, token| token == "at-flow")
        .times(3)
        .returning(|_, _| Ok(Vec::new()));

    let orchestrator = SyncOrchestrator::new(
        connected(&flow, "at-flow").await,
        Arc::new(source),
        SyncConfig::default(),
    );

    let items = orchestrator
        .list_items(None, Some("state-123"))
        .await
        .unwrap();
    assert!(items.is_empty());
}

#[tokio::test]
async fn expiring_token_is_refreshed_before_fetching() {
    let manager = manager(TokenEndpoint {
        response: Mutex::new(Some(HttpResponse::new(
            200,
            json!({"access_token": "at-2", "expires_in": 1800}).to_string(),
        ))),
    });
    let owner = CredentialKey::Owner("u1".to_string());
    manager
        .store()
        .put_credentials(&owner, &record("at-1", NOW + 30))
        .await
        .unwrap();

    let mut source = MockSource::new();
    source
        .expect_list_objects()
        .withf(|_, token| token == "at-2")
        .times(3)
        .returning(|_, _| Ok(Vec::new()));

    let orchestrator = SyncOrchestrator::new(manager.clone(), Arc::new(source), SyncConfig::default());
    orchestrator.list_items(Some("u1"), None).await.unwrap();

    let stored = manager.store().get_credentials(&owner).await.unwrap().unwrap();
    assert_eq!(stored.access_token, "at-2");
    assert_eq!(stored.expires_at, NOW + 1800);
}

#[tokio::test]
async fn empty_access_token_fails_before_fetching() {
    let owner = CredentialKey::Owner("u1".to_string());
    let orchestrator = SyncOrchestrator::new(
        connected(&owner, "").await,
        Arc::new(MockSource::new()),
        SyncConfig::default(),
    );

    let result = orchestrator.list_items(Some("u1"), None).await;
    assert!(matches!(result, Err(SyncError::NoAccessToken)));
}

#[tokio::test]
async fn credential_errors_propagate() {
    let orchestrator = SyncOrchestrator::new(
        manager(TokenEndpoint::default()),
        Arc::new(MockSource::new()),
        SyncConfig::default(),
    );

    assert!(matches!(
        orchestrator.list_items(None, None).await,
        Err(SyncError::Auth(AuthError::IdentifierRequired))
    ));
    assert!(matches!(
        orchestrator.list_items(Some("ghost"), None).await,
        Err(SyncError::Auth(AuthError::NotFound(_)))
    ));
}
