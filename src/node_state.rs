//! Ledger of the node: registered contracts, native balances, and the
//! settlement of blob transactions.

use std::collections::{btree_map::Entry, BTreeMap, BTreeSet, HashMap};

use anyhow::{bail, Context, Error, Result};
use sdk::{
    utils::TimestampMs, BlobIndex, BlobTransaction, Block, BlockHeight, Calldata, ContractEvent,
    ContractName, Hashable, Identity, IndexedEvent, OnchainEffect, TransactionStateEvent,
    TxHash, TxReceipt, ZampContract,
};
use tracing::{debug, info, warn};
use zamp_sale::ZampTokenSale;
use zamp_token::{erc20::ERC20, Ledger, ZampToken};

pub mod model;

use model::{Contract, ContractState};

/// Native balances touched by a transaction, read through to the committed
/// ones.
struct NativeChanges<'a> {
    committed: &'a BTreeMap<Identity, u128>,
    changes: BTreeMap<Identity, u128>,
}

impl<'a> NativeChanges<'a> {
    fn new(committed: &'a BTreeMap<Identity, u128>) -> Self {
        NativeChanges {
            committed,
            changes: BTreeMap::new(),
        }
    }

    fn balance(&self, account: &Identity) -> u128 {
        self.changes
            .get(account)
            .or_else(|| self.committed.get(account))
            .copied()
            .unwrap_or(0)
    }

    fn debit(&mut self, account: &Identity, amount: u128) -> Result<()> {
        let balance = self.balance(account);
        let Some(left) = balance.checked_sub(amount) else {
            bail!("Insufficient native balance for {account}: has {balance}, needs {amount}");
        };
        self.changes.insert(account.clone(), left);
        Ok(())
    }

    fn credit(&mut self, account: &Identity, amount: u128) -> Result<()> {
        let balance = self
            .balance(account)
            .checked_add(amount)
            .context("Native balance overflow")?;
        self.changes.insert(account.clone(), balance);
        Ok(())
    }
}

struct SettledTx {
    contract_changes: BTreeMap<ContractName, ContractState>,
    native_changes: BTreeMap<Identity, u128>,
    program_outputs: Vec<String>,
    events: Vec<ContractEvent>,
}

#[derive(Debug, Default, Clone)]
pub struct NodeState {
    current_height: BlockHeight,
    native_balances: BTreeMap<Identity, u128>,
    contracts: HashMap<ContractName, Contract>,
}

impl NodeState {
    pub fn current_height(&self) -> BlockHeight {
        self.current_height
    }

    pub fn contract(&self, name: &ContractName) -> Option<&Contract> {
        self.contracts.get(name)
    }

    pub fn contracts(&self) -> impl Iterator<Item = &Contract> {
        self.contracts.values()
    }

    pub fn token(&self, name: &ContractName) -> Option<&ZampToken> {
        match self.contract(name).map(|c| &c.state) {
            Some(ContractState::Token(token)) => Some(token),
            _ => None,
        }
    }

    pub fn sale(&self, name: &ContractName) -> Option<&ZampTokenSale> {
        match self.contract(name).map(|c| &c.state) {
            Some(ContractState::Sale(sale)) => Some(sale),
            _ => None,
        }
    }

    pub fn native_balance(&self, account: &Identity) -> u128 {
        self.native_balances.get(account).copied().unwrap_or(0)
    }

    pub fn total_native_supply(&self) -> u128 {
        self.native_balances.values().sum()
    }

    pub fn register_contract(&mut self, name: ContractName, state: ContractState) -> Result<()> {
        if name.0.trim().is_empty() {
            bail!("Contract name cannot be empty");
        }
        if self.contracts.contains_key(&name) {
            bail!("Contract {} is already registered", name);
        }
        if let ContractState::Sale(sale) = &state {
            if self.token(sale.token_contract()).is_none() {
                bail!(
                    "Sale {} refers to unknown token contract {}",
                    name,
                    sale.token_contract()
                );
            }
        }

        info!("📝 Registering {} contract {}", state.kind(), name);
        self.contracts.insert(name.clone(), Contract { name, state });
        Ok(())
    }

    /// Adds native currency out of thin air. Only used at genesis.
    pub fn credit_native(&mut self, account: Identity, amount: u128) -> Result<()> {
        let balance = self.native_balances.entry(account).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .context("Native balance overflow")?;
        Ok(())
    }

    /// Rejects senders that cannot sign for themselves: no identity, or the
    /// account of a registered contract, which only moves through that
    /// contract's own code.
    pub fn check_sender(&self, identity: &Identity) -> Result<()> {
        if identity.is_empty() {
            bail!("Transaction has no identity");
        }
        if self.contracts.contains_key(&ContractName(identity.0.clone())) {
            bail!("Transaction identity {} is a registered contract", identity);
        }
        Ok(())
    }

    /// Settles `txs` in order into the next block.
    pub fn handle_block(
        &mut self,
        txs: Vec<BlobTransaction>,
        timestamp: TimestampMs,
    ) -> (Block, Vec<TxReceipt>) {
        self.current_height = self.current_height + 1;
        let mut block = Block {
            block_height: self.current_height,
            block_timestamp: timestamp,
            ..Default::default()
        };
        let mut receipts = Vec::with_capacity(txs.len());
        let mut seen = BTreeSet::new();

        for tx in txs {
            let tx_hash = tx.hash();
            if !seen.insert(tx_hash.clone()) {
                warn!("Skipping duplicate tx {} in block {}", tx_hash, block.block_height);
                continue;
            }
            let events = block
                .transactions_events
                .entry(tx_hash.clone())
                .or_default();
            events.push(TransactionStateEvent::Sequenced);

            match self.settle_tx(&tx_hash, &tx) {
                Ok(settled) => {
                    events.push(TransactionStateEvent::Settled);
                    info!("✨ Settled tx {}", &tx_hash);

                    for (name, state) in settled.contract_changes {
                        if let Some(contract) = self.contracts.get_mut(&name) {
                            debug!("✍️  Modify '{}' contract state", name);
                            contract.state = state;
                        }
                    }
                    self.native_balances.extend(settled.native_changes);

                    block
                        .events
                        .extend(settled.events.iter().map(|e| IndexedEvent {
                            block_height: block.block_height,
                            tx_hash: tx_hash.clone(),
                            contract_name: e.contract_name.clone(),
                            event: e.event.clone(),
                        }));
                    block.successful_txs.push(tx_hash.clone());
                    receipts.push(TxReceipt {
                        tx_hash,
                        block_height: block.block_height,
                        success: true,
                        program_outputs: settled.program_outputs,
                        error: None,
                        events: settled.events,
                    });
                }
                Err(e) => {
                    let msg = format!("{:#}", e);
                    debug!(tx_hash = %tx_hash, "Failed to settle: {msg}");
                    events.push(TransactionStateEvent::SettleEvent(msg.clone()));
                    events.push(TransactionStateEvent::SettledAsFailed);
                    info!("⛈️ Settled tx {} has failed", &tx_hash);

                    block.failed_txs.push(tx_hash.clone());
                    receipts.push(TxReceipt {
                        tx_hash,
                        block_height: block.block_height,
                        success: false,
                        program_outputs: vec![],
                        error: Some(msg),
                        events: vec![],
                    });
                }
            }
        }

        (block, receipts)
    }

    /// Runs every blob of `tx` against staged copies of the contracts it
    /// touches. Nothing is written to `self`.
    fn settle_tx(&self, tx_hash: &TxHash, tx: &BlobTransaction) -> Result<SettledTx> {
        self.check_sender(&tx.identity)?;
        if tx.blobs.is_empty() {
            bail!("Transaction has no blobs");
        }
        if let Some(blob) = tx
            .blobs
            .iter()
            .find(|blob| !self.contracts.contains_key(&blob.contract_name))
        {
            bail!("Contract {} is not registered", blob.contract_name);
        }

        let mut natives = NativeChanges::new(&self.native_balances);
        let total_value = tx.total_value().context("Attached value overflows")?;
        natives.debit(&tx.identity, total_value)?;
        for blob in tx.blobs.iter() {
            natives.credit(&blob.contract_name.as_identity(), blob.value)?;
        }

        let mut contract_changes = BTreeMap::new();
        let mut program_outputs = Vec::with_capacity(tx.blobs.len());
        let mut events = vec![];

        for (index, blob) in tx.blobs.iter().enumerate() {
            let calldata = Calldata {
                tx_hash: tx_hash.clone(),
                identity: tx.identity.clone(),
                blobs: tx.blobs.clone(),
                index: BlobIndex(index),
            };
            let (output, exec_ctx, effects) = self
                .execute_blob(&mut contract_changes, &blob.contract_name, &calldata)
                .with_context(|| {
                    format!("Blob #{} for contract {} failed", index, blob.contract_name)
                })?;

            program_outputs.push(String::from_utf8_lossy(&output).into_owned());
            events.extend(exec_ctx.events);

            for effect in effects {
                match effect {
                    OnchainEffect::SweepNativeBalance { recipient } => {
                        let holder = blob.contract_name.as_identity();
                        let amount = natives.balance(&holder);
                        natives.debit(&holder, amount)?;
                        natives.credit(&recipient, amount)?;
                        debug!("Swept {} native from {} to {}", amount, holder, recipient);
                    }
                }
            }
        }

        Ok(SettledTx {
            contract_changes,
            native_changes: natives.changes,
            program_outputs,
            events,
        })
    }

    fn execute_blob(
        &self,
        contract_changes: &mut BTreeMap<ContractName, ContractState>,
        contract_name: &ContractName,
        calldata: &Calldata,
    ) -> Result<(Vec<u8>, sdk::ExecutionContext, Vec<OnchainEffect>)> {
        match self.stage(contract_changes, contract_name)? {
            ContractState::Token(token) => Ok(token.execute(calldata)?),
            ContractState::Sale(sale) => {
                let mut sale = sale.clone();
                let token_name = sale.token_contract().clone();
                let ContractState::Token(token) = self.stage(contract_changes, &token_name)? else {
                    bail!("Contract {} is not a token", token_name);
                };
                let res = sale.execute(&mut Ledger::new(token_name, token), calldata);
                contract_changes.insert(contract_name.clone(), ContractState::Sale(sale));
                Ok(res?)
            }
        }
    }

    /// Copy-on-write access to a contract for the transaction being settled.
    fn stage<'c>(
        &self,
        contract_changes: &'c mut BTreeMap<ContractName, ContractState>,
        contract_name: &ContractName,
    ) -> Result<&'c mut ContractState> {
        match contract_changes.entry(contract_name.clone()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let contract = self
                    .contracts
                    .get(contract_name)
                    .ok_or_else(|| Error::msg(format!("Contract {contract_name} is not registered")))?;
                Ok(entry.insert(contract.state.clone()))
            }
        }
    }

    /// Sum of every ledger balance of a token contract.
    pub fn token_supply_check(&self, name: &ContractName) -> Option<(u128, u128)> {
        let token = self.token(name)?;
        let held = token.holders().map(|(_, balance)| *balance).sum();
        Some((held, token.total_supply()))
    }
}
