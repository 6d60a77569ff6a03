use zamp_model::ContractName;

use crate::{caller::ExecutionContext, ContractError};

/// The part of a token contract that another contract may use while one of
/// its own blobs runs.
///
/// Transfers always debit the account of the calling contract
/// (`exec_ctx.contract_name`), so a holder of this handle can only move
/// tokens it owns. Balances and allowances are never exposed for writing.
pub trait TokenLedger {
    /// Name of the token contract behind this handle.
    fn contract_name(&self) -> &ContractName;

    /// Balance of `account`, zero when unknown.
    fn balance_of(&self, account: &str) -> u128;

    /// Moves `amount` from the calling contract's account to `recipient`,
    /// recording the Transfer event in `exec_ctx` under the token's name.
    fn transfer(
        &mut self,
        exec_ctx: &mut ExecutionContext,
        recipient: &str,
        amount: u128,
    ) -> Result<(), ContractError>;
}

/// Checks that a call runs on behalf of the expected token contract.
pub fn check_ledger<L: TokenLedger + ?Sized>(
    ledger: &L,
    expected: &ContractName,
) -> Result<(), ContractError> {
    if ledger.contract_name() != expected {
        return Err(ContractError::InvalidInput(format!(
            "Expected token contract {expected}, got {}",
            ledger.contract_name()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;

    mock! {
        pub Ledger {}
        impl TokenLedger for Ledger {
            fn contract_name(&self) -> &ContractName;
            fn balance_of(&self, account: &str) -> u128;
            fn transfer(
                &mut self,
                exec_ctx: &mut ExecutionContext,
                recipient: &str,
                amount: u128,
            ) -> Result<(), ContractError>;
        }
    }

    #[test]
    fn test_check_ledger() {
        let mut ledger = MockLedger::new();
        ledger
            .expect_contract_name()
            .return_const(ContractName::new("zamp_token"));

        assert!(check_ledger(&ledger, &"zamp_token".into()).is_ok());
        assert_eq!(
            check_ledger(&ledger, &"other_token".into()).unwrap_err(),
            ContractError::InvalidInput(
                "Expected token contract other_token, got zamp_token".to_string()
            )
        );
    }
}
