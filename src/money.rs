//! Presentation helpers for monetary amounts. The simulation itself carries
//! full decimal precision; rounding happens only at this boundary.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round to euro cents, half-up away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Round to `places` decimals, half-up away from zero.
pub fn round_places(value: Decimal, places: u32) -> Decimal {
    value.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero)
}

/// Division that yields zero instead of faulting on a zero denominator.
/// The quotient is rounded to `places` decimals.
pub fn safe_div(numerator: Decimal, denominator: Decimal, places: u32) -> Decimal {
    if denominator.is_zero() {
        return Decimal::ZERO;
    }
    round_places(numerator / denominator, places)
}

/// Format an amount for display: "1 234,56 €".
pub fn format_eur(value: Decimal) -> String {
    let cents = round_money(value);
    let sign = if cents.is_sign_negative() && !cents.is_zero() {
        "-"
    } else {
        ""
    };
    let text = format!("{:.2}", cents.abs());
    let (whole, frac) = match text.split_once('.') {
        Some((w, f)) => (w, f),
        None => (text.as_str(), "00"),
    };
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }
    format!("{}{},{} €", sign, grouped, frac)
}
