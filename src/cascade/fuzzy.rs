//! Fuzzy wildcard lookup, the most expensive strategy.

use async_trait::async_trait;
use tracing::debug;

use crate::client::{LookupError, PubChemClient};

use super::{Strategy, StrategyKind};

/// At most this many wildcard-matched CIDs are chased per attempt.
const MAX_FUZZY_CIDS: usize = 2;

/// Resolves a variant with a trailing-wildcard name search.
///
/// `aspirin` becomes the query `aspirin*`, matching prefixed entries such as
/// `aspirin anhydride`. Broad queries can match thousands of compounds, so
/// the follow-up budget is tighter than the exact CID strategy's.
#[derive(Debug)]
pub struct FuzzyWildcardStrategy;

#[async_trait]
impl Strategy for FuzzyWildcardStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::FuzzyWildcard
    }

    async fn attempt(
        &self,
        client: &PubChemClient,
        variant: &str,
    ) -> Result<Option<String>, LookupError> {
        let query = format!("{variant}*");
        let cids = client.cids_by_name(&query).await?;

        for cid in cids.into_iter().take(MAX_FUZZY_CIDS) {
            if let Some(smiles) = client.smiles_by_cid(cid).await? {
                return Ok(Some(smiles));
            }
            debug!(variant, cid, "wildcard CID had no usable SMILES");
        }

        Ok(None)
    }
}
