use borsh::{BorshDeserialize, BorshSerialize};
use sdk::erc20::{check_ledger, TokenLedger};
use sdk::utils::parse_calldata;
use sdk::{
    info, Blob, BlobData, Calldata, ContractAction, ContractError, ContractName, Event,
    ExecutionContext, Identity, OnchainEffect, RunResult, StateCommitment,
};
use serde::{Deserialize, Serialize};

/// Sells tokens it holds on the ledger for native currency at a fixed unit
/// price until the admin closes it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct ZampTokenSale {
    token_contract: ContractName,
    admin: Identity,
    token_price: u128,
    tokens_sold: u128,
    sale_open: bool,
}

#[derive(Serialize, Deserialize, BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq)]
pub enum ZampTokenSaleAction {
    BuyTokens { amount: u128 },
    EndSale,
    TokensSold,
}

impl ContractAction for ZampTokenSaleAction {
    fn as_blob(&self, contract_name: ContractName) -> Blob {
        Blob {
            contract_name,
            data: BlobData(borsh::to_vec(self).expect("Failed to encode ZampTokenSaleAction")),
            value: 0,
        }
    }
}

impl ZampTokenSale {
    pub fn new(token_contract: ContractName, admin: Identity, token_price: u128) -> Self {
        ZampTokenSale {
            token_contract,
            admin,
            token_price,
            tokens_sold: 0,
            sale_open: true,
        }
    }

    pub fn token_contract(&self) -> &ContractName {
        &self.token_contract
    }

    pub fn admin(&self) -> &Identity {
        &self.admin
    }

    pub fn token_price(&self) -> u128 {
        self.token_price
    }

    pub fn tokens_sold(&self) -> u128 {
        self.tokens_sold
    }

    pub fn sale_open(&self) -> bool {
        self.sale_open
    }

    /// Runs the sale blob at `calldata.index`. Token movements go through
    /// `ledger`, which must be the sale's token contract.
    pub fn execute<L: TokenLedger>(&mut self, ledger: &mut L, calldata: &Calldata) -> RunResult {
        let (action, mut exec_ctx) = parse_calldata::<ZampTokenSaleAction>(calldata)?;
        check_ledger(&*ledger, &self.token_contract)?;

        if exec_ctx.value != 0 && !matches!(action, ZampTokenSaleAction::BuyTokens { .. }) {
            return Err(ContractError::InvalidInput(format!(
                "Only purchases accept a payment, got {}",
                exec_ctx.value
            )));
        }

        let (output, effects) = match action {
            ZampTokenSaleAction::BuyTokens { amount } => {
                (self.buy_tokens(ledger, &mut exec_ctx, amount)?, vec![])
            }
            ZampTokenSaleAction::EndSale => self.end_sale(ledger, &mut exec_ctx)?,
            ZampTokenSaleAction::TokensSold => (format!("Tokens sold: {}", self.tokens_sold), vec![]),
        };
        Ok((output.into_bytes(), exec_ctx, effects))
    }

    pub fn commit(&self) -> StateCommitment {
        StateCommitment(self.as_bytes())
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).expect("Failed to encode ZampTokenSale")
    }

    fn buy_tokens<L: TokenLedger>(
        &mut self,
        ledger: &mut L,
        exec_ctx: &mut ExecutionContext,
        amount: u128,
    ) -> Result<String, ContractError> {
        if !self.sale_open {
            return Err(ContractError::InvalidState("Sale is closed".to_string()));
        }
        if amount == 0 {
            return Err(ContractError::InvalidInput(
                "Cannot buy zero tokens".to_string(),
            ));
        }
        let Some(expected) = amount.checked_mul(self.token_price) else {
            return Err(ContractError::InvalidInput(format!(
                "Price of {amount} tokens overflows"
            )));
        };
        if exec_ctx.value != expected {
            return Err(ContractError::PaymentMismatch {
                expected,
                received: exec_ctx.value,
            });
        }

        let sale_account = exec_ctx.contract_name.as_identity();
        let inventory = ledger.balance_of(&sale_account.0);
        if inventory < amount {
            return Err(ContractError::InsufficientBalance {
                account: sale_account,
                balance: inventory,
                amount,
            });
        }

        let buyer = exec_ctx.caller.clone();
        ledger.transfer(exec_ctx, &buyer.0, amount)?;
        self.tokens_sold += amount;
        exec_ctx.emit(Event::Sell {
            buyer: buyer.clone(),
            amount,
        });

        info!("{} bought {} tokens", buyer, amount);
        Ok(format!("Sold {} tokens to {}", amount, buyer))
    }

    fn end_sale<L: TokenLedger>(
        &mut self,
        ledger: &mut L,
        exec_ctx: &mut ExecutionContext,
    ) -> Result<(String, Vec<OnchainEffect>), ContractError> {
        if exec_ctx.caller != self.admin {
            return Err(ContractError::Unauthorized {
                caller: exec_ctx.caller.clone(),
                action: "end the sale".to_string(),
            });
        }
        if !self.sale_open {
            return Err(ContractError::InvalidState(
                "Sale is already closed".to_string(),
            ));
        }

        let sale_account = exec_ctx.contract_name.as_identity();
        let remaining = ledger.balance_of(&sale_account.0);
        let admin = self.admin.clone();
        ledger.transfer(exec_ctx, &admin.0, remaining)?;
        self.sale_open = false;

        info!("Sale closed, {} unsold tokens returned to {}", remaining, admin);
        Ok((
            format!("Sale closed, returned {} tokens to {}", remaining, admin),
            vec![OnchainEffect::SweepNativeBalance { recipient: admin }],
        ))
    }
}

impl TryFrom<StateCommitment> for ZampTokenSale {
    type Error = anyhow::Error;

    fn try_from(state: StateCommitment) -> Result<Self, Self::Error> {
        borsh::from_slice(&state.0).map_err(|_| anyhow::anyhow!("Could not decode sale state"))
    }
}
