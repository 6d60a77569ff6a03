//! Initial ledger: the token with its whole supply on the admin account, the
//! sale, and native currency for the configured accounts.

use anyhow::{bail, Context, Result};
use sdk::{ContractName, Identity};
use tracing::info;
use zamp_sale::ZampTokenSale;
use zamp_token::ZampToken;

use crate::{
    node_state::{model::ContractState, NodeState},
    utils::conf::GenesisConf,
};

/// Decimals of the native currency.
pub const NATIVE_DECIMALS: u32 = 18;

fn whole_native(units: u64) -> Result<u128> {
    10u128
        .checked_pow(NATIVE_DECIMALS)
        .and_then(|unit| unit.checked_mul(units as u128))
        .context("Native amount overflows")
}

pub fn genesis_state(conf: &GenesisConf) -> Result<NodeState> {
    if conf.admin.trim().is_empty() {
        bail!("Genesis admin cannot be empty");
    }
    if conf.token_price == 0 {
        bail!("Token price must be positive");
    }

    let mut state = NodeState::default();
    let token = ZampToken::with_whole_supply(conf.total_supply as u128, conf.admin.clone())
        .context("Creating token")?;
    state
        .register_contract(
            ContractName::new(conf.token_contract.clone()),
            ContractState::Token(token),
        )
        .context("Registering token contract")?;

    let sale = ZampTokenSale::new(
        ContractName::new(conf.token_contract.clone()),
        Identity::new(conf.admin.clone()),
        conf.token_price as u128,
    );
    state
        .register_contract(
            ContractName::new(conf.sale_contract.clone()),
            ContractState::Sale(sale),
        )
        .context("Registering sale contract")?;

    for (account, amount) in conf.native_balances.iter() {
        state.credit_native(Identity::new(account.clone()), whole_native(*amount)?)?;
    }

    info!(
        "🌱 Genesis: {} {} tokens for {}, sale {} at {} per unit, {} funded accounts",
        conf.total_supply,
        conf.token_contract,
        conf.admin,
        conf.sale_contract,
        conf.token_price,
        conf.native_balances.len()
    );
    Ok(state)
}
