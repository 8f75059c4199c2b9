//! Currency conversion into the reporting and secondary currencies
//!
//! Every function here is pure. Values that get persisted on a transaction are
//! rounded exactly once, when the transaction is written.

use crate::core::currency::RateTable;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

/// Decimal places kept for reporting-currency values and native amounts.
pub const PRIMARY_DP: u32 = 4;
/// Decimal places kept for secondary display-currency values.
pub const SECONDARY_DP: u32 = 2;
/// Decimal places used when valuing holdings for display.
pub const DISPLAY_DP: u32 = 2;

fn decimal_rate(rate: f64) -> Decimal {
    Decimal::from_f64(rate).unwrap_or(Decimal::ONE)
}

// Saturates at the ends of the `Decimal` range; used where a value is only
// shown or derived for an entry that already exists.
fn unrounded_reporting(amount: Decimal, currency: &str, rates: &RateTable) -> Decimal {
    amount.saturating_mul(decimal_rate(rates.rate(currency)))
}

/// Converts `amount` of `currency` into the reporting currency, rounded to
/// [`PRIMARY_DP`] places. Unrecognized currencies convert at 1.0.
pub fn to_reporting(amount: Decimal, currency: &str, rates: &RateTable) -> Decimal {
    unrounded_reporting(amount, currency, rates).round_dp(PRIMARY_DP)
}

/// Converts an already converted reporting value into the secondary currency.
pub fn to_secondary(reporting_value: Decimal, rates: &RateTable) -> Decimal {
    reporting_value
        .saturating_mul(decimal_rate(rates.secondary_factor()))
        .round_dp(SECONDARY_DP)
}

/// Like [`to_reporting`], but `None` when the result is outside the
/// `Decimal` range.
pub fn checked_to_reporting(
    amount: Decimal,
    currency: &str,
    rates: &RateTable,
) -> Option<Decimal> {
    amount
        .checked_mul(decimal_rate(rates.rate(currency)))
        .map(|value| value.round_dp(PRIMARY_DP))
}

/// Like [`to_secondary`], but `None` when the result is outside the
/// `Decimal` range.
pub fn checked_to_secondary(reporting_value: Decimal, rates: &RateTable) -> Option<Decimal> {
    reporting_value
        .checked_mul(decimal_rate(rates.secondary_factor()))
        .map(|value| value.round_dp(SECONDARY_DP))
}

/// Reporting-currency value of a holding, rounded for display.
pub fn display_value(amount: Decimal, currency: &str, rates: &RateTable) -> Decimal {
    unrounded_reporting(amount, currency, rates).round_dp(DISPLAY_DP)
}

/// Sum of many holdings in the reporting currency, rounded once at the end.
pub fn total_value<'a, I>(holdings: I, rates: &RateTable) -> Decimal
where
    I: IntoIterator<Item = (Decimal, &'a str)>,
{
    holdings
        .into_iter()
        .map(|(amount, currency)| unrounded_reporting(amount, currency, rates))
        .fold(Decimal::ZERO, Decimal::saturating_add)
        .round_dp(DISPLAY_DP)
}
