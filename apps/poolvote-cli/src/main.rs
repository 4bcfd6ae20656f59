use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod error;

use config::{RunConfig, DEFAULT_FUNDER};
use error::CliResult;

#[derive(Parser, Debug)]
#[command(name = "poolvote")]
#[command(about = "Create ledger accounts in bulk and point their inflation vote at a pool")]
#[command(version)]
pub struct Cli {
    /// Horizon server URL (defaults to the public testnet or livenet server)
    #[arg(long, default_value = "")]
    horizon: String,

    /// Address of the account that funds the new accounts
    #[arg(long, default_value = DEFAULT_FUNDER)]
    src: String,

    /// Secret seed of the funding account
    #[arg(long, default_value = "")]
    sec: String,

    /// Inflation destination for every account (defaults to --src)
    #[arg(long, visible_alias = "inflation")]
    dest: Option<String>,

    /// Keystore with already funded accounts to vote with, without the .json suffix
    #[arg(long, default_value = "accounts")]
    input: String,

    /// Keystore the generated accounts are written to, without the .json suffix
    #[arg(long, default_value = "new_accounts")]
    output: String,

    /// Number of accounts to create and fund
    #[arg(long, default_value_t = 10, allow_negative_numbers = true)]
    num: i64,

    /// Operations per funding transaction (max: 100)
    #[arg(long, default_value_t = 100, allow_negative_numbers = true)]
    ops: i64,

    /// Minimum starting balance, in stroops
    #[arg(long, default_value_t = 40_000_000, allow_negative_numbers = true)]
    min: i64,

    /// Maximum starting balance, in stroops
    #[arg(long, default_value_t = 60_000_000, allow_negative_numbers = true)]
    max: i64,

    /// Work on the public network instead of testnet
    #[arg(long)]
    live: bool,

    /// Let friendbot fund the accounts (testnet only)
    #[arg(long)]
    sink: bool,

    /// Only generate and save keypairs; no funding or inflation
    #[arg(long, visible_alias = "onlyGenerate")]
    only_generate: bool,
}

#[tokio::main]
async fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = RunConfig::from_args(Cli::parse())?;
    let summary = commands::run::execute(&config).await?;

    println!("\n🎉 Run completed!");
    println!("📊 Summary:");
    println!("  - Generated: {}", summary.generated);
    println!("  - Funded: {}", summary.funded);
    println!("  - Imported from {}: {}", config.input_display(), summary.imported);
    println!("  - Voting for {}: {}", config.inflation_dest, summary.voted);

    Ok(())
}
