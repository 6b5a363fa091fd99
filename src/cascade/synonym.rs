//! Synonym-based lookup: chase the backend's own synonym list.

use async_trait::async_trait;
use tracing::debug;

use crate::client::{LookupError, PubChemClient};

use super::{Strategy, StrategyKind};

/// At most this many synonyms are chased per attempt.
const MAX_SYNONYMS: usize = 5;

/// Resolves a variant through the names the backend itself lists for it.
///
/// Useful when the submitted spelling is indexed as a synonym but not as a
/// primary name.
#[derive(Debug)]
pub struct SynonymChaseStrategy;

#[async_trait]
impl Strategy for SynonymChaseStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::SynonymChase
    }

    async fn attempt(
        &self,
        client: &PubChemClient,
        variant: &str,
    ) -> Result<Option<String>, LookupError> {
        let synonyms = client.synonyms_by_name(variant).await?;

        for synonym in synonyms
            .iter()
            .filter(|s| !s.eq_ignore_ascii_case(variant))
            .take(MAX_SYNONYMS)
        {
            if let Some(smiles) = client.smiles_by_name(synonym).await? {
                return Ok(Some(smiles));
            }
            debug!(variant, synonym = synonym.as_str(), "synonym missed");
        }

        Ok(None)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::client::{RequestGate, RetryPolicy};
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> PubChemClient {
        let gate = Arc::new(RequestGate::new(4, Duration::ZERO));
        let policy = RetryPolicy::with_backoff(2, Duration::from_millis(1));
        PubChemClient::with_base_url(base_url, gate, policy, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_synonym_strategy_kind() {
        assert_eq!(SynonymChaseStrategy.kind(), StrategyKind::SynonymChase);
    }

    #[tokio::test]
    async fn test_synonym_strategy_chases_listed_names() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/name/turmeric/synonyms/JSON"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "InformationList": {
                    "Information": [{"CID": 969_516, "Synonym": ["Turmeric", "curcumin"]}]
                }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/name/curcumin/property/CanonicalSMILES/JSON"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "PropertyTable": {"Properties": [{"CID": 969_516, "CanonicalSMILES": "CCO"}]}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = SynonymChaseStrategy.attempt(&client, "turmeric").await.unwrap();
        assert_eq!(result, Some("CCO".to_string()));
    }

    #[tokio::test]
    async fn test_synonym_strategy_skips_the_variant_itself() {
        let server = MockServer::start().await;

        // The only synonym echoes the variant; chasing it would loop back to
        // the direct strategy's already-failed lookup.
        Mock::given(method("GET"))
            .and(path("/name/curcumin/synonyms/JSON"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "InformationList": {
                    "Information": [{"CID": 969_516, "Synonym": ["Curcumin"]}]
                }
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = SynonymChaseStrategy.attempt(&client, "curcumin").await.unwrap();
        assert_eq!(result, None);

        let received = server.received_requests().await.unwrap();
        assert_eq!(received.len(), 1, "only the synonym listing should run");
    }

    #[tokio::test]
    async fn test_synonym_strategy_caps_chase_length() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/name/curcumin/synonyms/JSON"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "InformationList": {
                    "Information": [{
                        "CID": 969_516,
                        "Synonym": ["s1", "s2", "s3", "s4", "s5", "s6", "s7", "s8"]
                    }]
                }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = SynonymChaseStrategy.attempt(&client, "curcumin").await.unwrap();
        assert_eq!(result, None);

        // One synonym listing plus exactly MAX_SYNONYMS lookups
        let received = server.received_requests().await.unwrap();
        assert_eq!(received.len(), 1 + MAX_SYNONYMS);
    }
}
