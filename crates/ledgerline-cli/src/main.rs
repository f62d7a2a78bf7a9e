//! Ledgerline CLI - a command-line client for the budget-tracker API.
//!
//! Thin front-end over `ledgerline-core`: logs in, lists and records
//! transactions, and relies on the core to keep the access token fresh.

use std::io;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ledgerline_core::models::{NewTransaction, TransactionType};
use ledgerline_core::{ApiClient, Config, TokenStore};

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn usage() -> &'static str {
    "Usage: ledgerline <command>\n\
     \n\
     Commands:\n\
       login <email>                                  Sign in and store a session\n\
       logout                                         Drop the stored session\n\
       whoami                                         Show the logged-in account\n\
       list                                           List transactions\n\
       add <desc> <amount> <income|expense> <category> [YYYY-MM-DD]\n\
                                                      Record a transaction\n\
       delete <id>                                    Delete a transaction\n\
     \n\
     The login password is prompted without echo; set LEDGERLINE_PASSWORD\n\
     to skip the prompt in scripts."
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let mut config = Config::load().context("Failed to load configuration")?;
    let store = Arc::new(TokenStore::open(Config::config_dir()?));
    let client = ApiClient::new(
        &config.api_base_url,
        Arc::clone(&store),
        Arc::new(|| {
            eprintln!("Session expired - run 'ledgerline login <email>' to sign in again.");
        }),
    )?;

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("");

    match command {
        "login" => {
            let email = match args.get(2) {
                Some(email) => email.clone(),
                None => config
                    .last_email
                    .clone()
                    .context("Usage: ledgerline login <email>")?,
            };
            let password = read_password(&email)?;
            let user = client.login(&email, &password).await?;
            config.last_email = Some(email);
            config.save()?;
            info!(email = %user.email, "Logged in");
            println!("Logged in as {}", user.full_name());
        }
        "logout" => {
            client.logout();
            println!("Logged out.");
        }
        "whoami" => match client.current_user() {
            Some(user) => println!("{} <{}>", user.full_name(), user.email),
            None => println!("Not logged in."),
        },
        "list" => {
            let transactions = client.fetch_transactions().await?;
            if transactions.is_empty() {
                println!("No transactions.");
            }
            for tx in &transactions {
                println!(
                    "{}  {:>10}  {:<12}  {}",
                    tx.transaction_date,
                    tx.display_amount(),
                    tx.category,
                    tx.description
                );
            }
        }
        "add" => {
            let transaction = parse_add_args(&args[2..])?;
            let id = client.create_transaction(&transaction).await?;
            println!("Recorded transaction {}", id);
        }
        "delete" => {
            let id = args.get(2).context("Usage: ledgerline delete <id>")?;
            client.delete_transaction(id).await?;
            println!("Deleted transaction {}", id);
        }
        _ => {
            eprintln!("{}", usage());
            std::process::exit(2);
        }
    }

    Ok(())
}

/// Read the password from LEDGERLINE_PASSWORD or prompt without echo.
fn read_password(email: &str) -> Result<String> {
    if let Ok(password) = std::env::var("LEDGERLINE_PASSWORD") {
        return Ok(password);
    }
    let password = rpassword::prompt_password(format!("Password for {}: ", email))
        .context("Failed to read password")?;
    Ok(password)
}

fn parse_add_args(args: &[String]) -> Result<NewTransaction> {
    let [description, amount, kind, category, rest @ ..] = args else {
        bail!("Usage: ledgerline add <desc> <amount> <income|expense> <category> [YYYY-MM-DD]");
    };

    let amount: f64 = amount
        .parse()
        .with_context(|| format!("Invalid amount: {}", amount))?;
    if amount <= 0.0 {
        bail!("Amount must be positive (use 'expense' for outgoing money)");
    }
    let kind = match kind.as_str() {
        "income" => TransactionType::Income,
        "expense" => TransactionType::Expense,
        other => bail!("Transaction type must be 'income' or 'expense', got '{}'", other),
    };
    let transaction_date = match rest.first() {
        Some(date) => NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .with_context(|| format!("Invalid date (expected YYYY-MM-DD): {}", date))?,
        None => Local::now().date_naive(),
    };

    Ok(NewTransaction {
        description: description.clone(),
        amount,
        kind,
        category: category.clone(),
        transaction_date,
    })
}
