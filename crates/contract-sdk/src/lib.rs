//! # Zamp Contract SDK
//!
//! Tools to write contracts that the Zamp node executes.
//!
//! ## How to build a contract ?
//!
//! Create a contract lib with a state struct that implements the
//! [ZampContract] trait. The node hands every blob addressed to the contract
//! to [ZampContract::execute] as a [Calldata], and commits the new state only
//! if every blob of the transaction succeeds.
//!
//! Contracts that move tokens held by another contract get a
//! [erc20::TokenLedger] handle for the duration of the call instead of the
//! other contract's state.

pub mod caller;
pub mod erc20;
pub mod utils;

mod error;

pub use caller::ExecutionContext;
pub use error::ContractError;

// re-export zamp-model
pub use zamp_model::*;

#[cfg(feature = "tracing")]
pub use tracing;

// With the "tracing" feature, forwards to `tracing::info!`
#[cfg(feature = "tracing")]
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::tracing::info!($($arg)*);
    }
}

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        println!($($arg)*);
    }
}

pub type RunResult = Result<(Vec<u8>, ExecutionContext, Vec<OnchainEffect>), ContractError>;

/**
Entry point of a contract.

The [Calldata] is built by the node for each blob of a transaction. It holds
every blob of the transaction, so the contract parses its own one with
[utils::parse_calldata].

## Example of execute implementation:

```rust
use zamp_contract_sdk::{StateCommitment, RunResult, ZampContract};
use zamp_contract_sdk::utils::parse_calldata;
use zamp_contract_sdk::Calldata;

use borsh::{BorshSerialize, BorshDeserialize};

#[derive(BorshSerialize, BorshDeserialize)]
struct Counter {
    value: u64,
}

#[derive(BorshSerialize, BorshDeserialize)]
enum CounterAction {
    Increment,
}

impl ZampContract for Counter {
    fn execute(&mut self, calldata: &Calldata) -> RunResult {
        let (action, exec_ctx) = parse_calldata::<CounterAction>(calldata)?;
        match action {
            CounterAction::Increment => self.value += 1,
        }
        Ok((format!("Counter at {}", self.value).into_bytes(), exec_ctx, vec![]))
    }

    fn commit(&self) -> StateCommitment {
        StateCommitment(borsh::to_vec(self).expect("Failed to encode Counter"))
    }
}
```
*/
pub trait ZampContract {
    fn execute(&mut self, calldata: &Calldata) -> RunResult;

    fn commit(&self) -> StateCommitment;
}
