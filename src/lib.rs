pub mod cli;
pub mod core;
pub mod engine;
pub mod providers;
pub mod report;
pub mod store;

use crate::cli::ui;
use crate::core::config::AppConfig;
use crate::core::{AccountKey, RateProvider, TransactionType};
use crate::engine::LedgerEngine;
use anyhow::Result;
use tracing::{debug, info};

pub use crate::core::config;

#[derive(Debug, Clone)]
pub enum AssetCommand {
    List,
    Add {
        platform: String,
        currency: String,
        amount: String,
    },
    Remove {
        account: AccountKey,
    },
    Set {
        account: AccountKey,
        amount: String,
    },
}

#[derive(Debug, Clone)]
pub enum AppCommand {
    Rates {
        refresh: bool,
    },
    Summary,
    Assets(AssetCommand),
    Record {
        kind: TransactionType,
        account: AccountKey,
        amount: String,
        category: String,
        note: String,
    },
    Undo,
    History {
        limit: usize,
    },
    Stats {
        month: Option<String>,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("NomadVault starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let data_dir = config.data_dir()?;
    let provider = providers::rate_provider(&config, &data_dir)?;
    if let AppCommand::Rates { refresh: true } = command {
        provider.invalidate().await;
    }

    let spinner = ui::new_spinner("Fetching exchange rates...");
    let rates = provider.get_rates().await;
    spinner.finish_and_clear();

    let mut engine = LedgerEngine::open(&data_dir, config.classifier(), &rates)?;

    match command {
        AppCommand::Rates { .. } => println!("{}", cli::rates::render(&rates)),
        AppCommand::Summary => {
            let valuation = report::value_assets(engine.assets().list(), &rates);
            println!("{}", cli::assets::render_valuation(&valuation));
        }
        AppCommand::Assets(command) => cli::assets::run(&mut engine, command, &rates)?,
        AppCommand::Record {
            kind,
            account,
            amount,
            category,
            note,
        } => {
            let transaction =
                engine.record_transaction(&account, kind, &amount, &category, &note, &rates)?;
            println!("{}", cli::ledger::render_recorded(&transaction, &engine));
        }
        AppCommand::Undo => cli::ledger::undo(&mut engine)?,
        AppCommand::History { limit } => {
            println!("{}", cli::ledger::render_history(engine.ledger().recent(limit)))
        }
        AppCommand::Stats { month } => println!(
            "{}",
            cli::stats::render(engine.ledger().transactions(), month.as_deref(), &rates)
        ),
    }

    Ok(())
}
