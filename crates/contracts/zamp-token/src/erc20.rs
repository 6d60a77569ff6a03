use sdk::{ContractError, Event, ExecutionContext};

use crate::ZampTokenAction;

/// Trait representing the ERC-20 token standard interface.
pub trait ERC20 {
    /// Returns the total supply of tokens in existence.
    fn total_supply(&self) -> u128;

    /// Returns the balance of `account`, zero for accounts never credited.
    fn balance_of(&self, account: &str) -> u128;

    /// Moves `amount` from `sender` to `recipient`.
    ///
    /// # Errors
    ///
    /// * `InsufficientBalance` if `sender` holds less than `amount`.
    /// * `InvalidInput` if `recipient` is empty.
    fn transfer(&mut self, sender: &str, recipient: &str, amount: u128)
        -> Result<(), ContractError>;

    /// Moves `amount` from `owner` to `recipient` on behalf of `spender`,
    /// consuming the same amount of the allowance `owner` gave `spender`.
    ///
    /// # Errors
    ///
    /// * `InsufficientAllowance` if the allowance is below `amount`.
    /// * `InsufficientBalance` if `owner` holds less than `amount`.
    /// * `InvalidInput` if `recipient` is empty.
    fn transfer_from(
        &mut self,
        owner: &str,
        spender: &str,
        recipient: &str,
        amount: u128,
    ) -> Result<(), ContractError>;

    /// Sets the allowance of `spender` over `owner`'s tokens to `amount`,
    /// replacing any previous value.
    fn approve(&mut self, owner: &str, spender: &str, amount: u128) -> Result<(), ContractError>;

    /// Returns the remaining amount `spender` may move out of `owner`'s
    /// balance.
    fn allowance(&self, owner: &str, spender: &str) -> u128;

    /// Returns name, symbol and decimals.
    fn metadata(&self) -> (String, String, u8);

    /// Executes `action` for `exec_ctx.caller` and records the resulting
    /// events in `exec_ctx`.
    ///
    /// # Returns
    ///
    /// * `Result<String, ContractError>` - A human readable output on success.
    fn execute_token_action(
        &mut self,
        action: ZampTokenAction,
        exec_ctx: &mut ExecutionContext,
    ) -> Result<String, ContractError> {
        let caller = exec_ctx.caller.clone();
        match action {
            ZampTokenAction::TotalSupply => Ok(format!("Total Supply: {}", self.total_supply())),
            ZampTokenAction::BalanceOf { account } => Ok(format!(
                "Balance of {}: {}",
                account,
                self.balance_of(&account)
            )),
            ZampTokenAction::Allowance { owner, spender } => Ok(format!(
                "Allowance of {} by {}: {}",
                spender,
                owner,
                self.allowance(&owner, &spender)
            )),
            ZampTokenAction::Metadata => {
                let (name, symbol, decimals) = self.metadata();
                Ok(format!("{name} ({symbol}), {decimals} decimals"))
            }
            ZampTokenAction::Transfer { recipient, amount } => {
                self.transfer(&caller.0, &recipient, amount)?;
                exec_ctx.emit(Event::Transfer {
                    from: caller,
                    to: recipient.clone().into(),
                    value: amount,
                });
                Ok(format!("Transferred {} to {}", amount, recipient))
            }
            ZampTokenAction::TransferFrom {
                owner,
                recipient,
                amount,
            } => {
                self.transfer_from(&owner, &caller.0, &recipient, amount)?;
                exec_ctx.emit(Event::Transfer {
                    from: owner.clone().into(),
                    to: recipient.clone().into(),
                    value: amount,
                });
                Ok(format!(
                    "Transferred {} from {} to {}",
                    amount, owner, recipient
                ))
            }
            ZampTokenAction::Approve { spender, amount } => {
                self.approve(&caller.0, &spender, amount)?;
                exec_ctx.emit(Event::Approval {
                    owner: caller,
                    spender: spender.clone().into(),
                    value: amount,
                });
                Ok(format!("Approved {} for {}", amount, spender))
            }
        }
    }
}
