use std::{cmp::Ordering, collections::BTreeMap};

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::{utils::TimestampMs, BlockHeight, IndexedEvent, TxHash};

#[derive(
    Debug, Serialize, Deserialize, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize,
)]
pub enum TransactionStateEvent {
    Sequenced,
    Settled,
    SettledAsFailed,
    SettleEvent(String),
}

#[derive(
    Debug, Default, Clone, Serialize, Deserialize, BorshSerialize, BorshDeserialize, Eq, PartialEq,
)]
pub struct Block {
    pub block_height: BlockHeight,
    pub block_timestamp: TimestampMs,
    pub successful_txs: Vec<TxHash>,
    pub failed_txs: Vec<TxHash>,
    pub transactions_events: BTreeMap<TxHash, Vec<TransactionStateEvent>>,
    /// Contract events of the successful transactions, in settlement order.
    pub events: Vec<IndexedEvent>,
}

impl Block {
    pub fn total_txs(&self) -> usize {
        self.successful_txs.len() + self.failed_txs.len()
    }

    /// Last settlement message recorded for a transaction.
    pub fn settle_message(&self, tx_hash: &TxHash) -> Option<&str> {
        self.transactions_events
            .get(tx_hash)?
            .iter()
            .rev()
            .find_map(|e| match e {
                TransactionStateEvent::SettleEvent(msg) => Some(msg.as_str()),
                _ => None,
            })
    }
}

impl Ord for Block {
    fn cmp(&self, other: &Self) -> Ordering {
        self.block_height.0.cmp(&other.block_height.0)
    }
}

impl PartialOrd for Block {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
