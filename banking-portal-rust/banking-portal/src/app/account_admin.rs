use anyhow::{anyhow, Result};
use banking_portal_core::{AccountNumber, AccountRecord, AccountRepository, Username};

/// Assigns or clears an account number.
///
/// When the number is already taken the error names the account holding it.
pub async fn assign_account_number(
    accounts: &dyn AccountRepository,
    username: &Username,
    account_number: Option<AccountNumber>,
) -> Result<AccountRecord> {
    let err = match accounts
        .assign_account_number(username, account_number.clone())
        .await
    {
        Ok(record) => return Ok(record),
        Err(err) => err,
    };

    if let (true, Some(number)) = (err.is_conflict(), account_number.as_ref()) {
        if let Some(holder) = accounts.find_by_account_number(number).await? {
            return Err(anyhow!(
                "Account number {number} is already assigned to {}",
                holder.username
            ));
        }
    }
    Err(err.into())
}
