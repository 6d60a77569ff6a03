use derive_more::Display;
use serde::{Deserialize, Serialize};
use zamp_model::Identity;

/// Why a contract call failed. Any of these aborts the whole transaction.
#[derive(Debug, Clone, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum ContractError {
    #[display("Insufficient balance for {account}: has {balance}, needs {amount}")]
    InsufficientBalance {
        account: Identity,
        balance: u128,
        amount: u128,
    },
    #[display("Allowance exceeded for owner={owner} spender={spender} allowance={allowance}, needs {amount}")]
    InsufficientAllowance {
        owner: Identity,
        spender: Identity,
        allowance: u128,
        amount: u128,
    },
    #[display("Payment mismatch: expected exactly {expected}, received {received}")]
    PaymentMismatch { expected: u128, received: u128 },
    #[display("{caller} is not allowed to {action}")]
    Unauthorized { caller: Identity, action: String },
    #[display("Invalid state: {_0}")]
    InvalidState(String),
    #[display("Invalid input: {_0}")]
    InvalidInput(String),
}

impl std::error::Error for ContractError {}
