use crate::schema::{ConsensusState, ValidatorSet};
use crate::Client;
use edb_core::Result;

/// Consensus state and validator set
#[derive(Debug, Clone)]
pub struct Consensus {
    client: Client,
}

impl Consensus {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// Current consensus round, step and proposal
    pub async fn get_state(&self) -> Result<ConsensusState> {
        self.client.invoke("getConsensusState", None).await
    }

    /// Bonded and unbonding validators
    pub async fn get_validators(&self) -> Result<ValidatorSet> {
        self.client.invoke("getValidators", None).await
    }
}
