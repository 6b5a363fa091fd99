//! CID-based lookup: name to compound IDs, then IDs to SMILES.

use async_trait::async_trait;
use tracing::debug;

use crate::client::{LookupError, PubChemClient};

use super::{Strategy, StrategyKind};

/// At most this many returned CIDs are chased per attempt.
const MAX_CIDS: usize = 3;

/// Resolves a variant by listing its compound IDs and looking each up.
#[derive(Debug)]
pub struct CidLookupStrategy;

#[async_trait]
impl Strategy for CidLookupStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::CidLookup
    }

    async fn attempt(
        &self,
        client: &PubChemClient,
        variant: &str,
    ) -> Result<Option<String>, LookupError> {
        let cids = client.cids_by_name(variant).await?;

        for cid in cids.into_iter().take(MAX_CIDS) {
            if let Some(smiles) = client.smiles_by_cid(cid).await? {
                return Ok(Some(smiles));
            }
            debug!(variant, cid, "CID had no usable SMILES");
        }

        Ok(None)
    }
}
