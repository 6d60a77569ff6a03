//! # Zamp
//!
//! A single node running the Zamp Token ledger and its token sale.
//!
//! Transactions carry blobs, each one a call to a registered contract with
//! an optional native payment. The node settles every pending transaction
//! once per slot: a transaction applies all of its blobs or none of them.

pub mod genesis;
pub mod indexer;
pub mod node;
pub mod node_state;
pub mod rest;
pub mod utils;
