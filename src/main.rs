use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use nomadvault::core::log::init_logging;
use nomadvault::core::{AccountKey, TransactionType};
use nomadvault::{AppCommand, AssetCommand};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Show current exchange rates
    Rates {
        /// Ignore cached rates and fetch again
        #[arg(long)]
        refresh: bool,
    },
    /// Display total assets in the reporting currency
    Summary,
    /// Manage accounts
    #[command(subcommand)]
    Assets(AssetsCommands),
    /// Record an expense or income against an account
    Record {
        /// `expense` or `income`
        kind: TransactionType,
        /// Account written as `Platform|Currency`
        account: AccountKey,
        /// Amount in the account currency
        #[arg(allow_hyphen_values = true)]
        amount: String,
        #[arg(long, default_value = "")]
        category: String,
        #[arg(long, default_value = "")]
        note: String,
    },
    /// Revert the most recent entry
    Undo,
    /// List recent entries
    History {
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
    },
    /// Monthly income and expense
    Stats {
        /// Month as `YYYY-MM`, the latest month by default
        #[arg(short, long)]
        month: Option<String>,
    },
}

#[derive(Subcommand)]
enum AssetsCommands {
    /// List accounts grouped by category
    List,
    /// Add a new account
    Add {
        platform: String,
        currency: String,
        #[arg(default_value = "0", allow_hyphen_values = true)]
        amount: String,
    },
    /// Remove an account
    Remove { account: AccountKey },
    /// Overwrite an account balance
    Set {
        account: AccountKey,
        #[arg(allow_hyphen_values = true)]
        amount: String,
    },
}

impl From<AssetsCommands> for AssetCommand {
    fn from(cmd: AssetsCommands) -> AssetCommand {
        match cmd {
            AssetsCommands::List => AssetCommand::List,
            AssetsCommands::Add {
                platform,
                currency,
                amount,
            } => AssetCommand::Add {
                platform,
                currency,
                amount,
            },
            AssetsCommands::Remove { account } => AssetCommand::Remove { account },
            AssetsCommands::Set { account, amount } => AssetCommand::Set { account, amount },
        }
    }
}

impl From<Commands> for AppCommand {
    fn from(cmd: Commands) -> AppCommand {
        match cmd {
            Commands::Rates { refresh } => AppCommand::Rates { refresh },
            Commands::Summary => AppCommand::Summary,
            Commands::Assets(assets) => AppCommand::Assets(assets.into()),
            Commands::Record {
                kind,
                account,
                amount,
                category,
                note,
            } => AppCommand::Record {
                kind,
                account,
                amount,
                category,
                note,
            },
            Commands::Undo => AppCommand::Undo,
            Commands::History { limit } => AppCommand::History { limit },
            Commands::Stats { month } => AppCommand::Stats { month },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => nomadvault::cli::setup::setup(),
        Some(cmd) => nomadvault::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
