//! Direct exact-name lookup, the cheapest strategy.

use async_trait::async_trait;

use crate::client::{LookupError, PubChemClient};

use super::{Strategy, StrategyKind};

/// Resolves a variant with a single exact-name property lookup.
#[derive(Debug)]
pub struct DirectNameStrategy;

#[async_trait]
impl Strategy for DirectNameStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::DirectName
    }

    async fn attempt(
        &self,
        client: &PubChemClient,
        variant: &str,
    ) -> Result<Option<String>, LookupError> {
        client.smiles_by_name(variant).await
    }
}
