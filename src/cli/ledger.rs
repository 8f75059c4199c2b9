use super::ui;
use crate::core::convert::{PRIMARY_DP, SECONDARY_DP};
use crate::core::error::LedgerError;
use crate::core::transaction::{Transaction, TransactionType};
use crate::engine::LedgerEngine;
use anyhow::Result;
use comfy_table::{Cell, Color};

fn kind_cell(kind: TransactionType) -> Cell {
    match kind {
        TransactionType::Expense => Cell::new(kind).fg(Color::Red),
        TransactionType::Income => Cell::new(kind).fg(Color::Green),
    }
}

pub fn render_history(transactions: &[Transaction]) -> String {
    if transactions.is_empty() {
        return ui::style_text("No transactions recorded yet", ui::StyleType::Subtle);
    }
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Time"),
        ui::header_cell("Category"),
        ui::header_cell("Account"),
        ui::header_cell("Type"),
        ui::header_cell("Amount"),
        ui::header_cell("Currency"),
        ui::header_cell("Reporting Value"),
        ui::header_cell("Note"),
    ]);
    for tx in transactions {
        table.add_row(vec![
            Cell::new(&tx.timestamp),
            Cell::new(&tx.category),
            Cell::new(&tx.account),
            kind_cell(tx.kind),
            ui::amount_cell(tx.amount, PRIMARY_DP),
            Cell::new(&tx.currency),
            ui::amount_cell(tx.reporting_value, PRIMARY_DP),
            Cell::new(&tx.note),
        ]);
    }
    table.to_string()
}

fn describe(tx: &Transaction) -> String {
    format!(
        "{} {} {} {} on {} (reporting value {}, secondary value {})",
        tx.timestamp,
        tx.kind,
        ui::format_amount(tx.amount, PRIMARY_DP),
        tx.currency,
        tx.account,
        ui::format_amount(tx.reporting_value, PRIMARY_DP),
        ui::format_amount(tx.secondary_value, SECONDARY_DP)
    )
}

pub fn render_recorded(tx: &Transaction, engine: &LedgerEngine) -> String {
    let balance = engine
        .assets()
        .find(&tx.account_key())
        .map(|asset| ui::format_amount(asset.amount, PRIMARY_DP))
        .unwrap_or_else(|| "N/A".to_string());
    format!(
        "Recorded: {}\nBalance of {}: {}",
        describe(tx),
        tx.account_key(),
        ui::style_text(&balance, ui::StyleType::TotalValue)
    )
}

/// Undoes the latest entry. An empty ledger is reported, not treated as a
/// failure.
pub fn undo(engine: &mut LedgerEngine) -> Result<()> {
    match engine.undo_last() {
        Ok(tx) => println!("Undone: {}", describe(&tx)),
        Err(LedgerError::EmptyLedger) => println!(
            "{}",
            ui::style_text("Nothing to undo", ui::StyleType::Subtle)
        ),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_render_history() {
        assert!(render_history(&[]).contains("No transactions"));

        let tx = Transaction {
            timestamp: "2026-03-14 09:26".to_string(),
            category: "food".to_string(),
            account: "Wise".to_string(),
            kind: TransactionType::Expense,
            amount: dec!(30),
            currency: "USD".to_string(),
            reporting_value: dec!(30),
            secondary_value: dec!(216.9),
            note: "lunch".to_string(),
        };
        let output = render_history(std::slice::from_ref(&tx));
        assert!(output.contains("2026-03-14 09:26"));
        assert!(output.contains("expense"));
        assert!(output.contains("30.0000"));
        assert!(output.contains("lunch"));

        assert!(describe(&tx).contains("216.90"));
    }
}
