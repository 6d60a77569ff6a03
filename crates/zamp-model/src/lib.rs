//! Types shared by the Zamp node, its contracts and their clients.

mod block;
mod contract;
mod event;
mod transaction;

pub mod utils;

pub use block::*;
pub use contract::*;
pub use event::*;
pub use transaction::*;
