//! Read-only view of the chain for `ReadFromBC`.

use std::collections::BTreeMap;

use num_bigint::BigUint;

/// Blockchain values visible to one message run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockchainState {
    pub block_number: BigUint,
    pub chain_id: u32,
    /// Block timestamps, by block number.
    pub timestamps: BTreeMap<BigUint, u64>,
}

impl BlockchainState {
    pub fn new(block_number: impl Into<BigUint>, chain_id: u32) -> Self {
        BlockchainState {
            block_number: block_number.into(),
            chain_id,
            timestamps: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_timestamp(mut self, block: impl Into<BigUint>, timestamp: u64) -> Self {
        self.timestamps.insert(block.into(), timestamp);
        self
    }

    pub fn timestamp(&self, block: &BigUint) -> Option<u64> {
        self.timestamps.get(block).copied()
    }
}
