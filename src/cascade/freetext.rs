//! Free-text POST lookup for names unsafe to embed in a URL path.

use async_trait::async_trait;

use crate::client::{LookupError, PubChemClient};

use super::{Strategy, StrategyKind};

/// Resolves a variant via the POST form of the property lookup.
///
/// The variant travels in the request body, so names with slashes, percent
/// signs, or other path-hostile characters reach the backend intact.
#[derive(Debug)]
pub struct FreeTextStrategy;

#[async_trait]
impl Strategy for FreeTextStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::FreeText
    }

    async fn attempt(
        &self,
        client: &PubChemClient,
        variant: &str,
    ) -> Result<Option<String>, LookupError> {
        client.smiles_by_name_post(variant).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::client::{RequestGate, RetryPolicy};
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{body_string, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> PubChemClient {
        let gate = Arc::new(RequestGate::new(4, Duration::ZERO));
        let policy = RetryPolicy::with_backoff(2, Duration::from_millis(1));
        PubChemClient::with_base_url(base_url, gate, policy, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_freetext_strategy_kind() {
        assert_eq!(FreeTextStrategy.kind(), StrategyKind::FreeText);
    }

    #[tokio::test]
    async fn test_freetext_strategy_posts_raw_variant() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/name/property/CanonicalSMILES/JSON"))
            .and(body_string("2,3-dihydroxybenzoic acid"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "PropertyTable": {"Properties": [{"CID": 19, "CanonicalSMILES": "CCO"}]}
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = FreeTextStrategy
            .attempt(&client, "2,3-dihydroxybenzoic acid")
            .await
            .unwrap();
        assert_eq!(result, Some("CCO".to_string()));
    }

    #[tokio::test]
    async fn test_freetext_strategy_miss() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = FreeTextStrategy.attempt(&client, "unobtainium").await.unwrap();
        assert_eq!(result, None);
    }
}
