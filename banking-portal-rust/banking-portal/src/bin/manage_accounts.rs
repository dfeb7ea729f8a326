//! Administrative account maintenance.
//!
//! The HTTP surface never changes account numbers, balances or the active
//! flag; this tool does, against the store configured in the environment.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use banking_portal::app::assign_account_number;
use banking_portal::infrastructure::config::{Config, DatabaseBackend};
use banking_portal::infrastructure::storage::build_repository;
use banking_portal_core::{AccountNumber, AccountRecord, AccountRepository, Balance, Username};

#[derive(Parser, Debug)]
#[command(name = "manage_accounts")]
#[command(about = "Inspect and administer banking portal accounts", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every account
    List,
    /// Assign an account number, or clear it with --clear
    SetAccountNumber {
        #[arg(value_name = "USERNAME")]
        username: String,
        #[arg(value_name = "ACCOUNT_NUMBER", required_unless_present = "clear")]
        account_number: Option<String>,
        #[arg(long, conflicts_with = "account_number")]
        clear: bool,
    },
    /// Set the balance, e.g. 1520.50
    SetBalance {
        #[arg(value_name = "USERNAME")]
        username: String,
        #[arg(value_name = "AMOUNT", allow_hyphen_values = true)]
        amount: String,
    },
    /// Allow the account to log in
    Activate {
        #[arg(value_name = "USERNAME")]
        username: String,
    },
    /// Stop the account from logging in
    Deactivate {
        #[arg(value_name = "USERNAME")]
        username: String,
    },
}

fn print_record(record: &AccountRecord) {
    let summary = record.summary();
    println!(
        "{:<24} {:<22} {:>16} {:<8} {}",
        summary.username,
        summary.account_number,
        summary.balance,
        if record.is_active { "active" } else { "inactive" },
        record
            .last_login
            .map(|at| at.to_rfc3339())
            .unwrap_or_else(|| "never".to_string()),
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::new()?;
    if config.database.backend == DatabaseBackend::Memory {
        bail!("DATABASE_BACKEND is memory; set it to file or postgres to manage persistent accounts");
    }
    let accounts = build_repository(&config.database).await?;

    let updated = match args.command {
        Command::List => {
            let records = accounts.list().await?;
            println!(
                "{:<24} {:<22} {:>16} {:<8} {}",
                "USERNAME", "ACCOUNT NUMBER", "BALANCE", "STATUS", "LAST LOGIN"
            );
            for record in &records {
                print_record(record);
            }
            println!("{} account(s)", records.len());
            return Ok(());
        }
        Command::SetAccountNumber {
            username,
            account_number,
            clear,
        } => {
            let username = Username::try_new(username)?;
            let account_number = match (clear, account_number) {
                (true, _) | (false, None) => None,
                (false, Some(value)) => Some(AccountNumber::try_new(value)?),
            };
            assign_account_number(accounts.as_ref(), &username, account_number).await?
        }
        Command::SetBalance { username, amount } => {
            let username = Username::try_new(username)?;
            let balance: Balance = amount
                .parse()
                .with_context(|| format!("Invalid balance '{amount}'"))?;
            accounts.set_balance(&username, balance).await?
        }
        Command::Activate { username } => {
            accounts.set_active(&Username::try_new(username)?, true).await?
        }
        Command::Deactivate { username } => {
            accounts.set_active(&Username::try_new(username)?, false).await?
        }
    };

    print_record(&updated);
    Ok(())
}
