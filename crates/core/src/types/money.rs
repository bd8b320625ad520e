//! Monetary amounts using decimal arithmetic.
//!
//! cXML carries money as a fixed-point string with two decimal places and a
//! separate ISO 4217 `currency` attribute. Amounts are kept as
//! [`Decimal`] end to end so cart totals never pick up floating-point error.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places in rendered amounts.
pub const MONEY_SCALE: u32 = 2;

/// Round an amount to two places, midpoint away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Format an amount as a fixed two-decimal string.
///
/// ```
/// use punchout_bridge_core::money::format_fixed;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_fixed(Decimal::new(25, 0)), "25.00");
/// assert_eq!(format_fixed(Decimal::new(10005, 3)), "10.01");
/// ```
#[must_use]
pub fn format_fixed(amount: Decimal) -> String {
    format!("{:.2}", round_money(amount))
}
