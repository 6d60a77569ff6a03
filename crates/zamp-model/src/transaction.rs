use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

use crate::{Blob, BlockHeight, ContractEvent, Hashable, Identity, TxHash};

#[derive(
    Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize,
)]
pub struct BlobTransaction {
    pub identity: Identity,
    pub blobs: Vec<Blob>,
    /// Picked by the sender so that repeating the same calls gives a new
    /// transaction. Two transactions with the same nonce and payload are
    /// the same transaction.
    #[serde(default)]
    pub nonce: u64,
}

impl BlobTransaction {
    pub fn new<I: Into<Identity>>(identity: I, blobs: Vec<Blob>) -> Self {
        BlobTransaction {
            identity: identity.into(),
            blobs,
            nonce: 0,
        }
    }

    pub fn with_nonce(self, nonce: u64) -> Self {
        BlobTransaction { nonce, ..self }
    }

    /// Native amount the sender pays across all blobs, `None` on overflow.
    pub fn total_value(&self) -> Option<u128> {
        self.blobs
            .iter()
            .try_fold(0u128, |acc, blob| acc.checked_add(blob.value))
    }
}

impl Hashable<TxHash> for BlobTransaction {
    fn hash(&self) -> TxHash {
        let mut hasher = Sha3_256::new();
        hasher.update(self.identity.0.as_bytes());
        for blob in self.blobs.iter() {
            hasher.update(blob.contract_name.0.as_bytes());
            hasher.update(&blob.data.0);
            hasher.update(blob.value.to_le_bytes());
        }
        hasher.update(self.nonce.to_le_bytes());
        let hash_bytes = hasher.finalize();
        TxHash(hex::encode(hash_bytes))
    }
}

/// Outcome of a settled transaction, as kept by the indexer.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub block_height: BlockHeight,
    pub success: bool,
    pub program_outputs: Vec<String>,
    pub error: Option<String>,
    pub events: Vec<ContractEvent>,
}
