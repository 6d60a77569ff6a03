use sdk::{BlobTransaction, BlockHeight, ContractAction, ContractName, Identity};
use serde::{Deserialize, Serialize};
use zamp_sale::ZampTokenSaleAction;
use zamp_token::ZampTokenAction;

use crate::indexer::{BlockRange, Direction};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeInfo {
    pub id: String,
    pub block_height: BlockHeight,
    pub token_contract: ContractName,
    pub sale_contract: ContractName,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenInfo {
    pub contract: ContractName,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: u128,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BalanceInfo {
    pub account: Identity,
    pub balance: u128,
    /// `balance` in whole units
    pub formatted: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AllowanceInfo {
    pub owner: Identity,
    pub spender: Identity,
    pub allowance: u128,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SaleInfo {
    pub contract: ContractName,
    pub token_contract: ContractName,
    pub admin: Identity,
    pub token_price: u128,
    pub tokens_sold: u128,
    pub sale_open: bool,
    /// Tokens the sale still holds
    pub inventory: u128,
    /// Native payments held by the sale
    pub collected: u128,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryQuery {
    pub from_block: Option<u64>,
    pub to_block: Option<u64>,
    #[serde(default)]
    pub direction: Direction,
}

impl HistoryQuery {
    pub fn range(&self) -> BlockRange {
        BlockRange {
            from_block: self.from_block.map(BlockHeight),
            to_block: self.to_block.map(BlockHeight),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ApiAction {
    Token(ZampTokenAction),
    Sale(ZampTokenSaleAction),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiBlob {
    pub contract_name: ContractName,
    pub action: ApiAction,
    /// Native amount attached to the call
    #[serde(default)]
    pub value: u128,
}

/// A transaction with readable actions, encoded into blobs by the node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiTransaction {
    pub identity: Identity,
    pub blobs: Vec<ApiBlob>,
    #[serde(default)]
    pub nonce: u64,
}

impl From<ApiTransaction> for BlobTransaction {
    fn from(tx: ApiTransaction) -> Self {
        let blobs = tx
            .blobs
            .into_iter()
            .map(|blob| match blob.action {
                ApiAction::Token(action) => action.as_paid_blob(blob.contract_name, blob.value),
                ApiAction::Sale(action) => action.as_paid_blob(blob.contract_name, blob.value),
            })
            .collect();
        BlobTransaction {
            identity: tx.identity,
            blobs,
            nonce: tx.nonce,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_transaction_decode() {
        let payload_json = r#"
        {
            "identity": "bob",
            "nonce": 7,
            "blobs": [
                {
                    "contract_name": "zamp_sale",
                    "action": { "sale": { "BuyTokens": { "amount": 10 } } },
                    "value": 10000000000000000
                },
                {
                    "contract_name": "zamp_token",
                    "action": { "token": { "Transfer": { "recipient": "alice", "amount": 1000000000000000000000 } } }
                },
                {
                    "contract_name": "zamp_sale",
                    "action": { "sale": "EndSale" }
                }
            ]
        }
        "#;

        let decoded: ApiTransaction = serde_json::from_str(payload_json).unwrap();
        assert_eq!(decoded.identity, Identity::new("bob"));
        assert_eq!(
            decoded.blobs[1].action,
            ApiAction::Token(ZampTokenAction::Transfer {
                recipient: "alice".to_string(),
                amount: 1_000 * 10u128.pow(18),
            })
        );

        let tx: BlobTransaction = decoded.into();
        assert_eq!(tx.blobs.len(), 3);
        assert_eq!(tx.nonce, 7);
        assert_eq!(tx.blobs[0].value, 10_000_000_000_000_000);
        assert_eq!(tx.blobs[1].value, 0);
        assert_eq!(
            tx.blobs[2].parameters::<ZampTokenSaleAction>().unwrap(),
            ZampTokenSaleAction::EndSale
        );
    }

    #[test]
    fn test_history_query_range() {
        let query: HistoryQuery =
            serde_json::from_str(r#"{"from_block": 2, "direction": "sent"}"#).unwrap();
        assert_eq!(query.direction, Direction::Sent);
        assert_eq!(
            query.range(),
            BlockRange {
                from_block: Some(BlockHeight(2)),
                to_block: None,
            }
        );
        assert_eq!(HistoryQuery::default().direction, Direction::All);
    }
}
