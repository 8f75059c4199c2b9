//! Read-only views over the stores: what everything is worth now, and how a
//! month went.

use crate::core::asset::Asset;
use crate::core::convert::{display_value, total_value};
use crate::core::currency::RateTable;
use crate::core::transaction::{Transaction, TransactionType};
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub platform: String,
    pub currency: String,
    pub amount: Decimal,
    /// Current worth in the reporting currency.
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Valuation {
    pub reporting_currency: String,
    pub total: Decimal,
    pub holdings: Vec<Holding>,
}

impl Valuation {
    /// Holdings with a positive balance, the ones an allocation breakdown
    /// makes sense for.
    pub fn allocation(&self) -> impl Iterator<Item = &Holding> {
        self.holdings.iter().filter(|h| h.amount > Decimal::ZERO)
    }
}

/// Values every asset at the current rates.
pub fn value_assets<'a, I>(assets: I, rates: &RateTable) -> Valuation
where
    I: IntoIterator<Item = &'a Asset>,
{
    let holdings: Vec<Holding> = assets
        .into_iter()
        .map(|asset| Holding {
            platform: asset.platform.clone(),
            currency: asset.currency.clone(),
            amount: asset.amount,
            value: display_value(asset.amount, &asset.currency, rates),
        })
        .collect();
    let total = total_value(
        holdings.iter().map(|h| (h.amount, h.currency.as_str())),
        rates,
    );
    Valuation {
        reporting_currency: rates.reporting.clone(),
        total,
        holdings,
    }
}

/// Months (`YYYY-MM`) that have at least one well-formed entry, newest first.
pub fn available_months(transactions: &[Transaction]) -> Vec<String> {
    transactions
        .iter()
        .filter_map(Transaction::month)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .rev()
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySummary {
    pub month: String,
    pub expense: Decimal,
    pub income: Decimal,
    pub expense_by_category: Vec<(String, Decimal)>,
    pub income_by_category: Vec<(String, Decimal)>,
}

impl MonthlySummary {
    /// Income minus expense.
    pub fn net(&self) -> Decimal {
        self.income.saturating_sub(self.expense)
    }
}

fn by_category<'a>(entries: impl Iterator<Item = &'a Transaction>) -> Vec<(String, Decimal)> {
    let mut totals: HashMap<&str, Decimal> = HashMap::new();
    for tx in entries {
        let total = totals.entry(tx.category.as_str()).or_default();
        *total = total.saturating_add(tx.reporting_value);
    }
    let mut totals: Vec<(String, Decimal)> = totals
        .into_iter()
        .map(|(category, value)| (category.to_string(), value))
        .collect();
    totals.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    totals
}

/// Profit and loss for one month from the values cached on each entry.
pub fn monthly_summary(transactions: &[Transaction], month: &str) -> MonthlySummary {
    let in_month: Vec<&Transaction> = transactions
        .iter()
        .filter(|tx| tx.month().as_deref() == Some(month))
        .collect();
    let of_kind = |kind: TransactionType| in_month.iter().copied().filter(move |tx| tx.kind == kind);

    MonthlySummary {
        month: month.to_string(),
        expense: of_kind(TransactionType::Expense)
            .map(|tx| tx.reporting_value)
            .fold(Decimal::ZERO, Decimal::saturating_add),
        income: of_kind(TransactionType::Income)
            .map(|tx| tx.reporting_value)
            .fold(Decimal::ZERO, Decimal::saturating_add),
        expense_by_category: by_category(of_kind(TransactionType::Expense)),
        income_by_category: by_category(of_kind(TransactionType::Income)),
    }
}
