//! Single node: a mempool drained into one block per slot, the ledger, and
//! the indexer, shared with the REST API.

use std::{sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use sdk::{utils::TimestampMs, BlobTransaction, Block, Hashable, TxHash};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::{
    genesis::genesis_state,
    indexer::Indexer,
    node_state::NodeState,
    rest::RestApi,
    utils::{conf::SharedConf, logger::LogMe},
};

#[derive(Clone)]
pub struct Node {
    conf: SharedConf,
    state: Arc<RwLock<NodeState>>,
    indexer: Arc<RwLock<Indexer>>,
    mempool: Arc<Mutex<Vec<BlobTransaction>>>,
}

impl Node {
    /// Starts from the configured genesis.
    pub fn new(conf: SharedConf) -> Result<Self> {
        let state = genesis_state(&conf.genesis).context("Building genesis state")?;
        Ok(Self::with_state(conf, state))
    }

    pub fn with_state(conf: SharedConf, state: NodeState) -> Self {
        Node {
            conf,
            state: Arc::new(RwLock::new(state)),
            indexer: Arc::new(RwLock::new(Indexer::default())),
            mempool: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn conf(&self) -> &SharedConf {
        &self.conf
    }

    pub fn state(&self) -> &Arc<RwLock<NodeState>> {
        &self.state
    }

    pub fn indexer(&self) -> &Arc<RwLock<Indexer>> {
        &self.indexer
    }

    /// Queues `tx` for the next block. A transaction already pending or
    /// settled, same payload and nonce, is a replay and is refused.
    pub async fn submit(&self, tx: BlobTransaction) -> Result<TxHash> {
        self.state.read().await.check_sender(&tx.identity)?;

        let tx_hash = tx.hash();
        let mut mempool = self.mempool.lock().await;

        if mempool.iter().any(|pending| pending.hash() == tx_hash)
            || self.indexer.read().await.has_tx(&tx_hash)
        {
            bail!("Transaction {} was already submitted", tx_hash);
        }

        debug!("Got transaction {} from {}", tx_hash, tx.identity);
        mempool.push(tx);
        Ok(tx_hash)
    }

    pub async fn pending_txs(&self) -> usize {
        self.mempool.lock().await.len()
    }

    /// Settles every pending transaction into one block. Does nothing when
    /// the mempool is empty.
    pub async fn produce_block(&self) -> Result<Option<Block>> {
        let txs = std::mem::take(&mut *self.mempool.lock().await);
        if txs.is_empty() {
            return Ok(None);
        }

        let mut state = self.state.write().await;
        let (block, receipts) = state.handle_block(txs, TimestampMs::now());
        self.indexer
            .write()
            .await
            .handle_block(&block, receipts)
            .log_error("Indexing block")?;

        info!(
            "📦 Block {} with {} txs ({} failed)",
            block.block_height,
            block.total_txs(),
            block.failed_txs.len()
        );
        Ok(Some(block))
    }

    /// Produces blocks every slot until ctrl-c.
    pub async fn run(&self) -> Result<()> {
        let slot = Duration::from_millis(self.conf.consensus.slot_duration.max(1));
        let mut interval = tokio::time::interval(slot);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        info!("⏱️ Producing blocks every {:?}", slot);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.produce_block().await?;
                }
                _ = &mut shutdown => {
                    info!("Shutting down node");
                    // Flush what was accepted before stopping
                    self.produce_block().await?;
                    return Ok(());
                }
            }
        }
    }
}

impl Node {
    /// Runs the node with its rest API on `rest_addr`. Stops with an error
    /// as soon as the API stops.
    pub async fn run_with_api(&self, rest_addr: String) -> Result<()> {
        let mut rest = RestApi::new(rest_addr, self.clone());
        tokio::select! {
            res = self.run() => res,
            res = rest.serve() => {
                res.log_error("Rest server failed")?;
                bail!("Rest server stopped")
            }
        }
    }
}
