use sdk::ContractName;
use serde::{Deserialize, Serialize};
use zamp_sale::ZampTokenSale;
use zamp_token::ZampToken;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "state", rename_all = "snake_case")]
pub enum ContractState {
    Token(ZampToken),
    Sale(ZampTokenSale),
}

impl ContractState {
    pub fn kind(&self) -> &'static str {
        match self {
            ContractState::Token(_) => "token",
            ContractState::Sale(_) => "sale",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Contract {
    pub name: ContractName,
    pub state: ContractState,
}
