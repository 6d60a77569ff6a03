use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::{BlockHeight, ContractName, Identity, TxHash};

/// Records emitted by contracts. They are published only when the
/// transaction that emitted them settles.
#[derive(
    Debug, Serialize, Deserialize, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize,
)]
pub enum Event {
    Transfer {
        from: Identity,
        to: Identity,
        value: u128,
    },
    Approval {
        owner: Identity,
        spender: Identity,
        value: u128,
    },
    Sell {
        buyer: Identity,
        amount: u128,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Transfer { .. } => "Transfer",
            Event::Approval { .. } => "Approval",
            Event::Sell { .. } => "Sell",
        }
    }

    /// Whether `account` appears in any of the event's account fields.
    pub fn involves(&self, account: &Identity) -> bool {
        match self {
            Event::Transfer { from, to, .. } => from == account || to == account,
            Event::Approval { owner, spender, .. } => owner == account || spender == account,
            Event::Sell { buyer, .. } => buyer == account,
        }
    }
}

#[derive(
    Debug, Serialize, Deserialize, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize,
)]
pub struct ContractEvent {
    pub contract_name: ContractName,
    pub event: Event,
}

#[derive(
    Debug, Serialize, Deserialize, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize,
)]
pub struct IndexedEvent {
    pub block_height: BlockHeight,
    pub tx_hash: TxHash,
    pub contract_name: ContractName,
    pub event: Event,
}
