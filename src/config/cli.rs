use crate::config::settings::Secret;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "yna")]
#[command(about = "Match YNAB transactions to Amazon orders and write item memos back to YNAB")]
pub struct CliConfig {
    #[arg(
        long,
        global = true,
        help = "Force refresh of Amazon transactions instead of depending on cached data"
    )]
    pub force_refresh_amazon: bool,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Optional TOML file with settings")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, default_value = ".env")]
    pub env_file: PathBuf,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// (Default) Match YNAB transactions to Amazon transactions and optionally update YNAB memos
    Ynamazon {
        /// YNAB API key (defaults to YNAB_API_KEY)
        ynab_api_key: Option<Secret>,
        /// YNAB budget ID (defaults to YNAB_BUDGET_ID)
        ynab_budget_id: Option<Secret>,
    },
    /// Print YNAB transactions waiting for a memo
    PrintYnab {
        api_key: Option<Secret>,
        budget_id: Option<Secret>,
    },
    /// Print Amazon transactions joined with their orders
    PrintAmazon {
        user_email: Option<String>,
        user_password: Option<Secret>,
        /// Order years; leave empty for current year
        #[arg(short = 'y', long = "years", num_args = 1..)]
        years: Vec<String>,
        /// Days of transactions to retrieve
        #[arg(short = 'd', long = "days")]
        days: Option<u32>,
    },
}
