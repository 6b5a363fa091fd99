//! PubChem PUG REST client.
//!
//! [`PubChemClient`] wraps the five compound lookups the resolution cascade
//! needs. All lookups are idempotent JSON requests against the compound
//! namespace; the base URL is configurable so tests can point the client at
//! a mock server.
//!
//! Transport policy: 2xx responses are parsed (a body that fails to parse is
//! a miss, not an error); 404 and other permanent statuses are misses; 429
//! and 5xx are retried with capped exponential backoff, honoring Retry-After
//! on 429. Only retry exhaustion surfaces a [`LookupError`] to the caller.

pub mod error;
pub mod gate;
pub mod retry;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::smiles::is_valid_smiles;

pub use error::LookupError;
pub use gate::{RequestGate, parse_retry_after};
pub use retry::{
    DEFAULT_MAX_ATTEMPTS, FailureType, RetryDecision, RetryPolicy, classify_status,
};

/// Default PubChem PUG REST compound namespace.
const DEFAULT_BASE_URL: &str = "https://pubchem.ncbi.nlm.nih.gov/rest/pug/compound";

/// Connect timeout for the underlying HTTP client.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// User-Agent identifying the tool, as PubChem's usage policy asks.
const USER_AGENT: &str = concat!("chemresolve/", env!("CARGO_PKG_VERSION"));

// ==================== PubChem API Response Types ====================

/// Top-level response for property lookups.
#[derive(Debug, Deserialize)]
pub(crate) struct PropertyResponse {
    #[serde(rename = "PropertyTable")]
    pub property_table: PropertyTable,
}

/// The `PropertyTable` object from a property lookup.
#[derive(Debug, Deserialize)]
pub(crate) struct PropertyTable {
    #[serde(rename = "Properties")]
    pub properties: Vec<PropertyRecord>,
}

/// One property record. Which SMILES key is populated varies across
/// PubChem deployments, so all three spellings are accepted.
#[derive(Debug, Deserialize)]
pub(crate) struct PropertyRecord {
    #[allow(dead_code)] // Deserialized for Debug output; useful when tracing responses
    #[serde(rename = "CID")]
    pub cid: Option<u64>,
    #[serde(rename = "CanonicalSMILES")]
    pub canonical_smiles: Option<String>,
    #[serde(rename = "IsomericSMILES")]
    pub isomeric_smiles: Option<String>,
    #[serde(rename = "SMILES")]
    pub smiles: Option<String>,
}

/// Top-level response for CID lookups.
#[derive(Debug, Deserialize)]
pub(crate) struct IdentifierResponse {
    #[serde(rename = "IdentifierList")]
    pub identifier_list: IdentifierList,
}

/// The `IdentifierList` object from a CID lookup.
#[derive(Debug, Deserialize)]
pub(crate) struct IdentifierList {
    #[serde(rename = "CID")]
    pub cid: Vec<u64>,
}

/// Top-level response for synonym lookups.
#[derive(Debug, Deserialize)]
pub(crate) struct SynonymResponse {
    #[serde(rename = "InformationList")]
    pub information_list: InformationList,
}

/// The `InformationList` object from a synonym lookup.
#[derive(Debug, Deserialize)]
pub(crate) struct InformationList {
    #[serde(rename = "Information")]
    pub information: Vec<InformationRecord>,
}

/// One information record carrying a synonym list.
#[derive(Debug, Deserialize)]
pub(crate) struct InformationRecord {
    #[serde(rename = "Synonym")]
    pub synonym: Option<Vec<String>>,
}

// ==================== PubChemClient ====================

/// Request shape passed to the shared transport loop.
enum RequestSpec {
    Get { url: String },
    PostText { url: String, body: String },
}

/// Typed client for the PubChem compound API.
///
/// Cheap to clone behind an `Arc`; all lookups share one connection pool,
/// one [`RequestGate`], and one [`RetryPolicy`].
pub struct PubChemClient {
    client: Client,
    base_url: String,
    gate: Arc<RequestGate>,
    retry_policy: RetryPolicy,
}

impl PubChemClient {
    /// Creates a client against the production PubChem endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Build`] if HTTP client construction fails.
    pub fn new(
        gate: Arc<RequestGate>,
        retry_policy: RetryPolicy,
        request_timeout: Duration,
    ) -> Result<Self, LookupError> {
        Self::build(DEFAULT_BASE_URL.to_string(), gate, retry_policy, request_timeout)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Build`] if HTTP client construction fails.
    pub fn with_base_url(
        base_url: impl Into<String>,
        gate: Arc<RequestGate>,
        retry_policy: RetryPolicy,
        request_timeout: Duration,
    ) -> Result<Self, LookupError> {
        Self::build(base_url.into(), gate, retry_policy, request_timeout)
    }

    fn build(
        base_url: String,
        gate: Arc<RequestGate>,
        retry_policy: RetryPolicy,
        request_timeout: Duration,
    ) -> Result<Self, LookupError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(request_timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| LookupError::build(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            gate,
            retry_policy,
        })
    }

    /// Looks up the canonical SMILES for an exact compound name.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] only when the retry budget for a transient
    /// failure is exhausted.
    pub async fn smiles_by_name(&self, variant: &str) -> Result<Option<String>, LookupError> {
        let url = format!(
            "{}/name/{}/property/CanonicalSMILES/JSON",
            self.base_url,
            urlencoding::encode(variant)
        );
        let parsed: Option<PropertyResponse> =
            self.execute(variant, RequestSpec::Get { url }).await?;
        Ok(parsed.and_then(|p| extract_smiles(&p)))
    }

    /// Looks up compound IDs matching a name.
    ///
    /// The fuzzy strategy reuses this lookup with a trailing `*` appended to
    /// the query before encoding.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] only when the retry budget for a transient
    /// failure is exhausted.
    pub async fn cids_by_name(&self, query: &str) -> Result<Vec<u64>, LookupError> {
        let url = format!(
            "{}/name/{}/cids/JSON",
            self.base_url,
            urlencoding::encode(query)
        );
        let parsed: Option<IdentifierResponse> =
            self.execute(query, RequestSpec::Get { url }).await?;
        Ok(parsed.map(|p| p.identifier_list.cid).unwrap_or_default())
    }

    /// Looks up the canonical SMILES for a compound ID.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] only when the retry budget for a transient
    /// failure is exhausted.
    pub async fn smiles_by_cid(&self, cid: u64) -> Result<Option<String>, LookupError> {
        let url = format!(
            "{}/cid/{cid}/property/CanonicalSMILES/JSON",
            self.base_url
        );
        let query = format!("CID {cid}");
        let parsed: Option<PropertyResponse> =
            self.execute(&query, RequestSpec::Get { url }).await?;
        Ok(parsed.and_then(|p| extract_smiles(&p)))
    }

    /// Looks up the synonym list recorded for a compound name.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] only when the retry budget for a transient
    /// failure is exhausted.
    pub async fn synonyms_by_name(&self, variant: &str) -> Result<Vec<String>, LookupError> {
        let url = format!(
            "{}/name/{}/synonyms/JSON",
            self.base_url,
            urlencoding::encode(variant)
        );
        let parsed: Option<SynonymResponse> =
            self.execute(variant, RequestSpec::Get { url }).await?;
        Ok(parsed
            .map(|p| {
                p.information_list
                    .information
                    .into_iter()
                    .flat_map(|record| record.synonym.unwrap_or_default())
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Looks up the canonical SMILES for a name via POST.
    ///
    /// Used for names that are unsafe to embed in a URL path; the raw
    /// variant travels as a `text/plain` body.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] only when the retry budget for a transient
    /// failure is exhausted.
    pub async fn smiles_by_name_post(&self, variant: &str) -> Result<Option<String>, LookupError> {
        let url = format!("{}/name/property/CanonicalSMILES/JSON", self.base_url);
        let parsed: Option<PropertyResponse> = self
            .execute(
                variant,
                RequestSpec::PostText {
                    url,
                    body: variant.to_string(),
                },
            )
            .await?;
        Ok(parsed.and_then(|p| extract_smiles(&p)))
    }

    /// Shared transport loop: gate admission, send, classify, retry.
    async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        spec: RequestSpec,
    ) -> Result<Option<T>, LookupError> {
        let mut attempt: u32 = 1;

        loop {
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|_| LookupError::build("request gate closed"))?;

            let request = match &spec {
                RequestSpec::Get { url } => self.client.get(url),
                RequestSpec::PostText { url, body } => self
                    .client
                    .post(url)
                    .header(reqwest::header::CONTENT_TYPE, "text/plain")
                    .body(body.clone()),
            };

            let outcome = request.send().await;
            match outcome {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let parsed = response.json::<T>().await;
                        drop(permit);
                        return match parsed {
                            Ok(value) => Ok(Some(value)),
                            Err(e) => {
                                debug!(query, error = %e, "unparseable response body, treating as miss");
                                Ok(None)
                            }
                        };
                    }

                    let status_code = status.as_u16();
                    let retry_after = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    drop(permit);

                    let failure = classify_status(status_code);

                    if failure == FailureType::Permanent {
                        debug!(query, status = status_code, "permanent status, treating as miss");
                        return Ok(None);
                    }

                    if failure == FailureType::RateLimited {
                        if let Some(delay) =
                            retry_after.as_deref().and_then(parse_retry_after)
                        {
                            self.gate.record_rate_limit(delay).await;
                        }
                    }

                    match self.retry_policy.should_retry(failure, attempt) {
                        RetryDecision::Retry { delay, attempt: next } => {
                            debug!(
                                query,
                                status = status_code,
                                delay_ms = delay.as_millis(),
                                next_attempt = next,
                                "retrying after error status"
                            );
                            tokio::time::sleep(delay).await;
                            attempt = next;
                        }
                        RetryDecision::DoNotRetry { reason } => {
                            warn!(query, status = status_code, %reason, "giving up on lookup");
                            return Err(LookupError::http_status_with_retry_after(
                                query,
                                status_code,
                                retry_after,
                            ));
                        }
                    }
                }
                Err(e) => {
                    drop(permit);

                    let error = if e.is_timeout() {
                        LookupError::timeout(query)
                    } else {
                        LookupError::network(query, e)
                    };

                    match self.retry_policy.should_retry(FailureType::Transient, attempt) {
                        RetryDecision::Retry { delay, attempt: next } => {
                            debug!(
                                query,
                                error = %error,
                                delay_ms = delay.as_millis(),
                                next_attempt = next,
                                "retrying after transport error"
                            );
                            tokio::time::sleep(delay).await;
                            attempt = next;
                        }
                        RetryDecision::DoNotRetry { reason } => {
                            warn!(query, error = %error, %reason, "giving up on lookup");
                            return Err(error);
                        }
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for PubChemClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PubChemClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

// ==================== Extraction Helpers ====================

/// Extracts the first plausible SMILES from a property response.
///
/// Key priority within each record: `CanonicalSMILES`, then
/// `IsomericSMILES`, then `SMILES`.
fn extract_smiles(response: &PropertyResponse) -> Option<String> {
    for record in &response.property_table.properties {
        let candidates = [
            record.canonical_smiles.as_deref(),
            record.isomeric_smiles.as_deref(),
            record.smiles.as_deref(),
        ];
        for candidate in candidates.into_iter().flatten() {
            let trimmed = candidate.trim();
            if is_valid_smiles(trimmed) {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}
