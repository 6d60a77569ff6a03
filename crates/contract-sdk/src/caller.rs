use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use zamp_model::{ContractEvent, ContractName, Event, Identity};

/// Data a contract needs while running one blob: who called, which contract
/// is running, the native amount attached, and the events emitted so far.
#[derive(Debug, Serialize, Deserialize, Clone, BorshSerialize, BorshDeserialize, Default)]
pub struct ExecutionContext {
    pub caller: Identity,
    pub contract_name: ContractName,
    pub value: u128,
    pub events: Vec<ContractEvent>,
}

impl ExecutionContext {
    pub fn new(caller: Identity, contract_name: ContractName) -> Self {
        ExecutionContext {
            caller,
            contract_name,
            value: 0,
            events: Vec::new(),
        }
    }

    /// Records an event on behalf of the running contract.
    pub fn emit(&mut self, event: Event) {
        let contract_name = self.contract_name.clone();
        self.emit_from(contract_name, event);
    }

    /// Records an event on behalf of another contract reached through a
    /// capability, e.g. the token ledger called by the sale.
    pub fn emit_from(&mut self, contract_name: ContractName, event: Event) {
        self.events.push(ContractEvent {
            contract_name,
            event,
        });
    }
}
