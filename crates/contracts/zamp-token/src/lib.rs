use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use sdk::erc20::TokenLedger;
use sdk::utils::parse_calldata;
use sdk::{
    Blob, BlobData, Calldata, ContractAction, ContractError, ContractName, Event,
    ExecutionContext, RunResult, StateCommitment, ZampContract,
};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use erc20::ERC20;

pub mod erc20;

pub const TOKEN_NAME: &str = "Zamp Token";
pub const TOKEN_SYMBOL: &str = "ZMP";
pub const TOKEN_DECIMALS: u8 = 18;

/// Struct representing the Zamp token.
#[serde_as]
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ZampToken {
    name: String,
    symbol: String,
    decimals: u8,
    total_supply: u128,
    balances: BTreeMap<String, u128>,
    #[serde_as(as = "Vec<(_, _)>")]
    allowances: BTreeMap<(String, String), u128>, // (owner, spender)
}

/// Enum representing possible calls to the token contract.
#[derive(Serialize, Deserialize, BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq)]
pub enum ZampTokenAction {
    TotalSupply,
    BalanceOf {
        account: String,
    },
    Transfer {
        recipient: String,
        amount: u128,
    },
    TransferFrom {
        owner: String,
        recipient: String,
        amount: u128,
    },
    Approve {
        spender: String,
        amount: u128,
    },
    Allowance {
        owner: String,
        spender: String,
    },
    Metadata,
}

impl ContractAction for ZampTokenAction {
    fn as_blob(&self, contract_name: ContractName) -> Blob {
        Blob {
            contract_name,
            data: BlobData(borsh::to_vec(self).expect("Failed to encode ZampTokenAction")),
            value: 0,
        }
    }
}

impl ZampToken {
    /// Creates the token and credits the whole supply, in base units, to
    /// `deployer`.
    pub fn new(total_supply: u128, deployer: String) -> Self {
        let mut balances = BTreeMap::new();
        balances.insert(deployer, total_supply);
        ZampToken {
            name: TOKEN_NAME.to_string(),
            symbol: TOKEN_SYMBOL.to_string(),
            decimals: TOKEN_DECIMALS,
            total_supply,
            balances,
            allowances: BTreeMap::new(),
        }
    }

    /// Same as [ZampToken::new] with the supply given in whole tokens.
    pub fn with_whole_supply(whole_tokens: u128, deployer: String) -> anyhow::Result<Self> {
        let supply = 10u128
            .checked_pow(TOKEN_DECIMALS as u32)
            .and_then(|unit| whole_tokens.checked_mul(unit))
            .ok_or_else(|| anyhow::anyhow!("Supply of {whole_tokens} tokens overflows"))?;
        Ok(Self::new(supply, deployer))
    }

    /// Accounts with a non-zero balance.
    pub fn holders(&self) -> impl Iterator<Item = (&String, &u128)> {
        self.balances.iter().filter(|(_, balance)| **balance > 0)
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).expect("Failed to encode ZampToken")
    }

    fn debit_credit(&mut self, from: &str, to: &str, amount: u128) {
        *self.balances.entry(from.to_string()).or_insert(0) -= amount;
        *self.balances.entry(to.to_string()).or_insert(0) += amount;
    }
}

impl ERC20 for ZampToken {
    fn total_supply(&self) -> u128 {
        self.total_supply
    }

    fn balance_of(&self, account: &str) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn transfer(
        &mut self,
        sender: &str,
        recipient: &str,
        amount: u128,
    ) -> Result<(), ContractError> {
        if recipient.trim().is_empty() {
            return Err(ContractError::InvalidInput(
                "Transfer to an empty account".to_string(),
            ));
        }
        let sender_balance = self.balance_of(sender);
        if sender_balance < amount {
            return Err(ContractError::InsufficientBalance {
                account: sender.into(),
                balance: sender_balance,
                amount,
            });
        }

        self.debit_credit(sender, recipient, amount);
        Ok(())
    }

    fn transfer_from(
        &mut self,
        owner: &str,
        spender: &str,
        recipient: &str,
        amount: u128,
    ) -> Result<(), ContractError> {
        if recipient.trim().is_empty() {
            return Err(ContractError::InvalidInput(
                "Transfer to an empty account".to_string(),
            ));
        }
        let allowance = self.allowance(owner, spender);
        if allowance < amount {
            return Err(ContractError::InsufficientAllowance {
                owner: owner.into(),
                spender: spender.into(),
                allowance,
                amount,
            });
        }
        let owner_balance = self.balance_of(owner);
        if owner_balance < amount {
            return Err(ContractError::InsufficientBalance {
                account: owner.into(),
                balance: owner_balance,
                amount,
            });
        }

        self.debit_credit(owner, recipient, amount);
        self.allowances
            .insert((owner.to_string(), spender.to_string()), allowance - amount);
        Ok(())
    }

    fn approve(&mut self, owner: &str, spender: &str, amount: u128) -> Result<(), ContractError> {
        if spender.trim().is_empty() {
            return Err(ContractError::InvalidInput(
                "Approval for an empty spender".to_string(),
            ));
        }
        self.allowances
            .insert((owner.to_string(), spender.to_string()), amount);
        Ok(())
    }

    fn allowance(&self, owner: &str, spender: &str) -> u128 {
        self.allowances
            .get(&(owner.to_string(), spender.to_string()))
            .copied()
            .unwrap_or(0)
    }

    fn metadata(&self) -> (String, String, u8) {
        (self.name.clone(), self.symbol.clone(), self.decimals)
    }
}

impl ZampContract for ZampToken {
    fn execute(&mut self, calldata: &Calldata) -> RunResult {
        let (action, mut exec_ctx) = parse_calldata::<ZampTokenAction>(calldata)?;

        if exec_ctx.value != 0 {
            return Err(ContractError::InvalidInput(format!(
                "Token contract does not accept payments, got {}",
                exec_ctx.value
            )));
        }

        let output = self.execute_token_action(action, &mut exec_ctx)?;
        Ok((output.into_bytes(), exec_ctx, vec![]))
    }

    fn commit(&self) -> StateCommitment {
        StateCommitment(self.as_bytes())
    }
}

impl TryFrom<StateCommitment> for ZampToken {
    type Error = anyhow::Error;

    fn try_from(state: StateCommitment) -> Result<Self, Self::Error> {
        borsh::from_slice(&state.0).map_err(|_| anyhow::anyhow!("Could not decode token state"))
    }
}

/// Restricted view of the token handed to another contract for one call.
pub struct Ledger<'a> {
    contract_name: ContractName,
    token: &'a mut ZampToken,
}

impl<'a> Ledger<'a> {
    pub fn new(contract_name: ContractName, token: &'a mut ZampToken) -> Self {
        Ledger {
            contract_name,
            token,
        }
    }
}

impl TokenLedger for Ledger<'_> {
    fn contract_name(&self) -> &ContractName {
        &self.contract_name
    }

    fn balance_of(&self, account: &str) -> u128 {
        self.token.balance_of(account)
    }

    fn transfer(
        &mut self,
        exec_ctx: &mut ExecutionContext,
        recipient: &str,
        amount: u128,
    ) -> Result<(), ContractError> {
        let holder = exec_ctx.contract_name.as_identity();
        self.token.transfer(&holder.0, recipient, amount)?;
        exec_ctx.emit_from(
            self.contract_name.clone(),
            Event::Transfer {
                from: holder,
                to: recipient.into(),
                value: amount,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::erc20::ERC20;
    use sdk::{BlobIndex, ContractEvent, Identity, TxHash};

    fn token() -> ZampToken {
        ZampToken::new(1000, "admin".to_string())
    }

    fn calldata(caller: &str, action: ZampTokenAction, value: u128) -> Calldata {
        Calldata {
            tx_hash: TxHash::new("tx"),
            identity: Identity::new(caller),
            blobs: vec![action.as_paid_blob("zamp_token".into(), value)],
            index: BlobIndex(0),
        }
    }

    #[test]
    fn test_new_zamp_token() {
        let token = token();

        assert_eq!(token.total_supply(), 1000);
        assert_eq!(token.balance_of("admin"), 1000);
        assert!(token.allowances.is_empty());
        assert_eq!(
            token.metadata(),
            ("Zamp Token".to_string(), "ZMP".to_string(), 18)
        );
    }

    #[test]
    fn test_with_whole_supply() {
        let token = ZampToken::with_whole_supply(1_000_000, "admin".to_string()).unwrap();
        assert_eq!(token.total_supply(), 1_000_000 * 10u128.pow(18));
        assert_eq!(token.balance_of("admin"), token.total_supply());

        assert!(ZampToken::with_whole_supply(u128::MAX, "admin".to_string()).is_err());
    }

    #[test]
    fn test_balance_of_unknown_account() {
        assert_eq!(token().balance_of("nonexistent"), 0);
    }

    #[test]
    fn test_transfer() {
        let mut token = token();

        assert!(token.transfer("admin", "recipient", 500).is_ok());
        assert_eq!(token.balance_of("admin"), 500);
        assert_eq!(token.balance_of("recipient"), 500);

        assert_eq!(
            token.transfer("admin", "recipient", 600).unwrap_err(),
            ContractError::InsufficientBalance {
                account: "admin".into(),
                balance: 500,
                amount: 600,
            }
        );
        assert_eq!(token.balance_of("admin"), 500);
    }

    #[test]
    fn test_transfer_to_self_and_zero() {
        let mut token = token();

        assert!(token.transfer("admin", "admin", 400).is_ok());
        assert_eq!(token.balance_of("admin"), 1000);
        assert!(token.transfer("nobody", "admin", 0).is_ok());
        assert_eq!(token.balance_of("admin"), 1000);
    }

    #[test]
    fn test_transfer_to_empty_account() {
        let mut token = token();
        assert!(matches!(
            token.transfer("admin", " ", 1),
            Err(ContractError::InvalidInput(_))
        ));
        assert_eq!(token, self::token());
    }

    #[test]
    fn test_approve_and_allowance() {
        let mut token = token();

        assert!(token.approve("owner", "spender", 300).is_ok());
        assert_eq!(token.allowance("owner", "spender"), 300);
        assert_eq!(token.allowance("owner", "other_spender"), 0);

        assert!(token.approve("owner", "spender", 50).is_ok());
        assert_eq!(token.allowance("owner", "spender"), 50);
        assert!(token.approve("owner", "", 50).is_err());
    }

    #[test]
    fn test_transfer_from() {
        let mut token = token();

        assert!(token.approve("admin", "spender", 300).is_ok());
        assert!(token.transfer_from("admin", "spender", "recipient", 200).is_ok());
        assert_eq!(token.balance_of("admin"), 800);
        assert_eq!(token.balance_of("recipient"), 200);
        assert_eq!(token.allowance("admin", "spender"), 100);

        assert_eq!(
            token
                .transfer_from("admin", "spender", "recipient", 200)
                .unwrap_err()
                .to_string(),
            "Allowance exceeded for owner=admin spender=spender allowance=100, needs 200"
        );
    }

    #[test]
    fn test_transfer_from_insufficient_balance() {
        let mut token = token();
        assert!(token.approve("admin", "spender", 5000).is_ok());

        let before = token.clone();
        let result = token.transfer_from("admin", "spender", "recipient", 1100);

        assert_eq!(
            result.unwrap_err(),
            ContractError::InsufficientBalance {
                account: "admin".into(),
                balance: 1000,
                amount: 1100,
            }
        );
        assert_eq!(token, before);
    }

    #[test]
    fn test_execute_transfer() {
        let mut token = token();
        let action = ZampTokenAction::Transfer {
            recipient: "bob".to_string(),
            amount: 10,
        };

        let (output, exec_ctx, effects) = token.execute(&calldata("admin", action, 0)).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "Transferred 10 to bob");
        assert!(effects.is_empty());
        assert_eq!(
            exec_ctx.events,
            vec![ContractEvent {
                contract_name: "zamp_token".into(),
                event: Event::Transfer {
                    from: "admin".into(),
                    to: "bob".into(),
                    value: 10,
                },
            }]
        );
        assert_eq!(token.balance_of("bob"), 10);
    }

    #[test]
    fn test_execute_rejects_payment() {
        let mut token = token();
        let result = token.execute(&calldata("admin", ZampTokenAction::TotalSupply, 5));
        assert!(matches!(result, Err(ContractError::InvalidInput(_))));
    }

    #[test]
    fn test_ledger_transfer_debits_calling_contract() {
        let mut token = ZampToken::new(1000, "zamp_sale".to_string());
        let mut exec_ctx = ExecutionContext::new("bob".into(), "zamp_sale".into());

        let mut ledger = Ledger::new("zamp_token".into(), &mut token);
        assert_eq!(ledger.balance_of("zamp_sale"), 1000);
        ledger.transfer(&mut exec_ctx, "bob", 10).unwrap();
        assert!(ledger.transfer(&mut exec_ctx, "bob", 2000).is_err());

        assert_eq!(token.balance_of("zamp_sale"), 990);
        assert_eq!(token.balance_of("bob"), 10);
        assert_eq!(exec_ctx.events.len(), 1);
        assert_eq!(
            exec_ctx.events[0].contract_name,
            ContractName::new("zamp_token")
        );
    }

    #[test]
    fn test_commit_round_trip() {
        let mut token = token();
        token.approve("admin", "spender", 7).unwrap();
        let commitment = token.commit();

        assert_eq!(commitment.0, borsh::to_vec(&token).unwrap());
        assert_eq!(ZampToken::try_from(commitment).unwrap(), token);
        assert!(ZampToken::try_from(StateCommitment(vec![0, 1, 2, 3])).is_err());
    }

    #[test]
    fn test_json_state() {
        let mut token = token();
        token.approve("admin", "spender", 7).unwrap();

        let json = serde_json::to_value(&token).unwrap();
        assert_eq!(json["symbol"], "ZMP");
        assert_eq!(json["allowances"][0][0][1], "spender");
    }
}
