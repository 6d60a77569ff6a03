//! Append-only log of settled events and transaction receipts.

use std::collections::HashMap;

use anyhow::{bail, Result};
use sdk::{Block, BlockHeight, Event, Identity, IndexedEvent, TxHash, TxReceipt};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Sent,
    Received,
    #[default]
    All,
}

/// Inclusive block range, open on either side.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockRange {
    pub from_block: Option<BlockHeight>,
    pub to_block: Option<BlockHeight>,
}

impl BlockRange {
    pub fn contains(&self, height: BlockHeight) -> bool {
        self.from_block.map_or(true, |from| height >= from)
            && self.to_block.map_or(true, |to| height <= to)
    }
}

#[derive(Debug, Default)]
pub struct Indexer {
    last_height: Option<BlockHeight>,
    events: Vec<IndexedEvent>,
    receipts: HashMap<TxHash, TxReceipt>,
}

impl Indexer {
    pub fn last_height(&self) -> Option<BlockHeight> {
        self.last_height
    }

    pub fn handle_block(&mut self, block: &Block, receipts: Vec<TxReceipt>) -> Result<()> {
        if let Some(last) = self.last_height {
            if block.block_height <= last {
                bail!(
                    "Block {} is not after last indexed block {}",
                    block.block_height,
                    last
                );
            }
        }
        debug!(
            "Indexing block {} with {} events and {} receipts",
            block.block_height,
            block.events.len(),
            receipts.len()
        );

        self.last_height = Some(block.block_height);
        self.events.extend(block.events.iter().cloned());
        self.receipts
            .extend(receipts.into_iter().map(|r| (r.tx_hash.clone(), r)));
        Ok(())
    }

    /// Every event involving `account`, in emission order.
    pub fn events_for(&self, account: &Identity, range: BlockRange) -> Vec<&IndexedEvent> {
        self.events
            .iter()
            .filter(|e| range.contains(e.block_height) && e.event.involves(account))
            .collect()
    }

    /// Transfer events sent and/or received by `account`, in emission order.
    pub fn transfer_history(
        &self,
        account: &Identity,
        direction: Direction,
        range: BlockRange,
    ) -> Vec<&IndexedEvent> {
        self.events
            .iter()
            .filter(|e| range.contains(e.block_height))
            .filter(|e| match &e.event {
                Event::Transfer { from, to, .. } => match direction {
                    Direction::Sent => from == account,
                    Direction::Received => to == account,
                    Direction::All => from == account || to == account,
                },
                _ => false,
            })
            .collect()
    }

    pub fn receipt(&self, tx_hash: &TxHash) -> Option<&TxReceipt> {
        self.receipts.get(tx_hash)
    }

    pub fn has_tx(&self, tx_hash: &TxHash) -> bool {
        self.receipts.contains_key(tx_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node_state::test::{buy, new_node_state, transfer, PRICE};
    use sdk::{utils::TimestampMs, Hashable};

    fn indexed() -> (Indexer, TxHash) {
        let mut state = new_node_state();
        let mut indexer = Indexer::default();

        let (block, receipts) = state.handle_block(
            vec![
                transfer("admin", "zamp_sale", 1_000),
                transfer("admin", "alice", 50),
            ],
            TimestampMs(1),
        );
        indexer.handle_block(&block, receipts).unwrap();

        let failed = transfer("alice", "bob", 500);
        let (block, receipts) = state.handle_block(
            vec![transfer("alice", "bob", 20), failed.clone()],
            TimestampMs(2),
        );
        indexer.handle_block(&block, receipts).unwrap();

        let (block, receipts) = state.handle_block(vec![buy("bob", 5, 5 * PRICE)], TimestampMs(3));
        indexer.handle_block(&block, receipts).unwrap();

        (indexer, failed.hash())
    }

    #[test]
    fn test_transfer_history_directions() {
        let (indexer, _) = indexed();
        let alice = Identity::new("alice");

        let sent = indexer.transfer_history(&alice, Direction::Sent, BlockRange::default());
        let received =
            indexer.transfer_history(&alice, Direction::Received, BlockRange::default());
        let all = indexer.transfer_history(&alice, Direction::All, BlockRange::default());

        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].event,
            Event::Transfer {
                from: "alice".into(),
                to: "bob".into(),
                value: 20,
            }
        );
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].block_height, BlockHeight(1));
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_block_range() {
        let (indexer, _) = indexed();
        let bob = Identity::new("bob");

        let range = BlockRange {
            from_block: Some(BlockHeight(3)),
            to_block: None,
        };
        let events = indexer.events_for(&bob, range);
        // purchase: Transfer from the sale, then Sell
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].event.name(), "Sell");

        let range = BlockRange {
            from_block: None,
            to_block: Some(BlockHeight(2)),
        };
        assert_eq!(indexer.events_for(&bob, range).len(), 1);
        assert_eq!(indexer.events_for(&bob, BlockRange::default()).len(), 3);
    }

    #[test]
    fn test_failed_tx_has_receipt_but_no_events() {
        let (indexer, failed) = indexed();

        let receipt = indexer.receipt(&failed).unwrap();
        assert!(!receipt.success);
        assert_eq!(receipt.block_height, BlockHeight(2));
        assert!(receipt.events.is_empty());
        assert!(indexer
            .transfer_history(&"alice".into(), Direction::Sent, BlockRange::default())
            .iter()
            .all(|e| e.tx_hash != failed));
    }

    #[test]
    fn test_blocks_must_increase() {
        let (mut indexer, _) = indexed();
        let stale = Block {
            block_height: BlockHeight(2),
            ..Default::default()
        };
        assert!(indexer.handle_block(&stale, vec![]).is_err());
        assert_eq!(indexer.last_height(), Some(BlockHeight(3)));
    }
}
