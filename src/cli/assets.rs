use super::ui;
use crate::AssetCommand;
use crate::core::asset::Asset;
use crate::core::convert::{DISPLAY_DP, PRIMARY_DP, display_value};
use crate::core::currency::RateTable;
use crate::engine::LedgerEngine;
use crate::report::Valuation;
use crate::store::assets::AssetBook;
use anyhow::Result;
use comfy_table::Cell;

/// Holdings with their current worth and the grand total.
pub fn render_valuation(valuation: &Valuation) -> String {
    let reporting = &valuation.reporting_currency;
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Platform"),
        ui::header_cell("Currency"),
        ui::header_cell("Amount"),
        ui::header_cell(&format!("Value ({reporting})")),
    ]);
    for holding in &valuation.holdings {
        table.add_row(vec![
            Cell::new(&holding.platform),
            Cell::new(&holding.currency),
            ui::signed_cell(holding.amount, PRIMARY_DP),
            ui::signed_cell(holding.value, DISPLAY_DP),
        ]);
    }

    let total = ui::format_amount(valuation.total, DISPLAY_DP);
    format!(
        "{}\n\n{}\n\nTotal Assets ({}): {}",
        ui::style_text("Holdings", ui::StyleType::Title),
        table,
        ui::style_text(reporting, ui::StyleType::TotalLabel),
        ui::style_text(&total, ui::StyleType::TotalValue)
    )
}

fn group_table(assets: &[Asset], rates: &RateTable) -> String {
    if assets.is_empty() {
        return ui::style_text("(none)", ui::StyleType::Subtle);
    }
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Account"),
        ui::header_cell("Amount"),
        ui::header_cell(&format!("Value ({})", rates.reporting)),
    ]);
    for asset in assets {
        table.add_row(vec![
            Cell::new(asset.key()),
            ui::signed_cell(asset.amount, PRIMARY_DP),
            ui::signed_cell(
                display_value(asset.amount, &asset.currency, rates),
                DISPLAY_DP,
            ),
        ]);
    }
    table.to_string()
}

/// Accounts grouped the way they are stored.
pub fn render_book(book: &AssetBook, rates: &RateTable) -> String {
    format!(
        "{}\n{}\n\n{}\n{}",
        ui::style_text("Fiat", ui::StyleType::Title),
        group_table(&book.fiat_assets, rates),
        ui::style_text("Crypto", ui::StyleType::Title),
        group_table(&book.crypto_assets, rates)
    )
}

pub fn run(engine: &mut LedgerEngine, command: AssetCommand, rates: &RateTable) -> Result<()> {
    match command {
        AssetCommand::List => println!("{}", render_book(engine.assets().book(), rates)),
        AssetCommand::Add {
            platform,
            currency,
            amount,
        } => {
            let category = engine.add_asset(&platform, &currency, &amount)?;
            println!(
                "Added {}|{} as {category}",
                platform.trim(),
                currency.trim().to_uppercase()
            );
        }
        AssetCommand::Remove { account } => {
            let removed = engine.remove_asset(&account)?;
            println!(
                "Removed {} (balance was {})",
                removed.key(),
                ui::format_amount(removed.amount, PRIMARY_DP)
            );
        }
        AssetCommand::Set { account, amount } => {
            let amount = engine.correct_balance(&account, &amount)?;
            println!(
                "Set {account} to {}",
                ui::format_amount(amount, PRIMARY_DP)
            );
        }
    }
    Ok(())
}
