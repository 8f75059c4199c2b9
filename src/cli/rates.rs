use super::ui;
use crate::core::currency::{RateOrigin, RateTable};
use comfy_table::{Cell, CellAlignment};

fn format_rate(rate: f64) -> String {
    if rate >= 100.0 {
        format!("{rate:.0}")
    } else if rate >= 0.01 {
        format!("{rate:.4}")
    } else {
        format!("{rate:.8}")
    }
}

pub fn render(rates: &RateTable) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell(&format!("1 unit in {}", rates.reporting)),
    ]);
    for (code, rate) in &rates.rates {
        table.add_row(vec![
            Cell::new(code),
            Cell::new(format_rate(*rate)).set_alignment(CellAlignment::Right),
        ]);
    }

    let mut cross = ui::new_styled_table();
    cross.set_header(vec![ui::header_cell("Pair"), ui::header_cell("Rate")]);
    for (pair, rate) in &rates.cross {
        cross.add_row(vec![
            Cell::new(pair),
            Cell::new(format_rate(*rate)).set_alignment(CellAlignment::Right),
        ]);
    }

    let source = match (rates.origin, rates.fetched_at) {
        (RateOrigin::Live, Some(at)) => format!("live, fetched {}", at.format("%Y-%m-%d %H:%M UTC")),
        (RateOrigin::Live, None) => "live".to_string(),
        (RateOrigin::Fallback, _) => ui::style_text("built-in fallback", ui::StyleType::Error),
    };

    format!(
        "{}\n\n{}\n\n{}\n\n{}",
        ui::style_text("Exchange Rates", ui::StyleType::Title),
        table,
        cross,
        ui::style_text(&format!("Source: {source}"), ui::StyleType::Subtle)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_lists_rates_and_cross_pairs() {
        let output = render(&RateTable::fallback());
        assert!(output.contains("CNY"));
        assert!(output.contains("0.1380"));
        assert!(output.contains("0.00006200"));
        assert!(output.contains("USD/IDR"));
        assert!(output.contains("15800"));
        assert!(output.contains("7.2300"));
        assert!(output.contains("fallback"));
    }
}
