use super::ui;
use crate::core::convert::DISPLAY_DP;
use crate::core::currency::RateTable;
use crate::core::transaction::Transaction;
use crate::report::{MonthlySummary, available_months, monthly_summary};
use comfy_table::Cell;
use rust_decimal::Decimal;

fn breakdown_table(title: &str, rows: &[(String, Decimal)]) -> String {
    if rows.is_empty() {
        return format!("{title}: {}", ui::style_text("none", ui::StyleType::Subtle));
    }
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell(title), ui::header_cell("Value")]);
    for (category, value) in rows {
        table.add_row(vec![Cell::new(category), ui::amount_cell(*value, DISPLAY_DP)]);
    }
    table.to_string()
}

fn render_summary(summary: &MonthlySummary, reporting: &str) -> String {
    let mut totals = ui::new_styled_table();
    totals.set_header(vec![
        ui::header_cell(&format!("Expense ({reporting})")),
        ui::header_cell(&format!("Income ({reporting})")),
        ui::header_cell(&format!("Net ({reporting})")),
    ]);
    totals.add_row(vec![
        ui::amount_cell(summary.expense, DISPLAY_DP),
        ui::amount_cell(summary.income, DISPLAY_DP),
        ui::signed_cell(summary.net(), DISPLAY_DP),
    ]);

    format!(
        "{}\n\n{}\n\n{}\n\n{}",
        ui::style_text(&format!("Statistics for {}", summary.month), ui::StyleType::Title),
        totals,
        breakdown_table("Expenses by category", &summary.expense_by_category),
        breakdown_table("Income by category", &summary.income_by_category)
    )
}

/// Monthly profit and loss; defaults to the most recent month with entries.
pub fn render(transactions: &[Transaction], month: Option<&str>, rates: &RateTable) -> String {
    let months = available_months(transactions);
    let Some(month) = month.map(str::to_string).or_else(|| months.first().cloned()) else {
        return ui::style_text("No transactions recorded yet", ui::StyleType::Subtle);
    };

    let mut output = render_summary(&monthly_summary(transactions, &month), &rates.reporting);
    if months.len() > 1 {
        output.push_str(&format!(
            "\n\n{}",
            ui::style_text(
                &format!("Months with entries: {}", months.join(", ")),
                ui::StyleType::Subtle
            )
        ));
    }
    output
}
