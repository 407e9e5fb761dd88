use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::Money;

/// State snapshot emitted at the end of every simulation period.
///
/// Per-product maps carry an entry for every product, zero where the
/// quantity does not apply, so rows line up column-wise across the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRow {
    pub period_index: u32,
    pub year_index: u32,
    /// 1-based year, for display.
    pub year_number: u32,
    pub step_in_year: u32,
    pub income_annual: Money,
    pub income_period: Money,
    pub living_costs_period: Money,
    pub tax_paid_period: Money,
    pub tax_paid_ytd: Money,
    /// Set on the year's final period only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_due_for_year: Option<Money>,
    /// Set on the year's final period only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fcpi_tax_reduction_for_year: Option<Money>,
    pub per_cap_for_year: Money,
    pub per_contrib_ytd: Money,
    pub cash_before_invest: Money,
    pub cash_after_invest: Money,
    pub contributions: BTreeMap<String, Money>,
    pub dividends: BTreeMap<String, Money>,
    pub scpi_shares: BTreeMap<String, u64>,
    pub redemptions: BTreeMap<String, Money>,
    pub values: BTreeMap<String, Money>,
    pub invested: BTreeMap<String, Money>,
    pub total_value: Money,
    pub total_invested: Money,
    pub total_gains: Money,
    pub total_value_real: Money,
    pub inflation_index: Decimal,
}

/// Complete projection output, rows in period order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub rows: Vec<SimulationRow>,
    pub product_names: Vec<String>,
    pub cash_product: String,
    /// The final simulated year's liability, payable the year after.
    pub tax_due_next_year: Money,
}

/// Headline figures derived from the final period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub final_value: Money,
    pub final_value_real: Money,
    pub final_invested: Money,
    pub final_gains: Money,
    /// Gains over cost basis, in percent. Zero when nothing was invested.
    pub gains_pct: Decimal,
    pub tax_due_next_year: Money,
}

impl SimulationResult {
    /// Headline summary from the last row; all zeros when no periods ran.
    pub fn summary(&self) -> SimulationSummary {
        match self.rows.last() {
            Some(last) => {
                let gains_pct = if last.total_invested > Decimal::ZERO {
                    last.total_gains / last.total_invested * dec!(100)
                } else {
                    Decimal::ZERO
                };
                SimulationSummary {
                    final_value: last.total_value,
                    final_value_real: last.total_value_real,
                    final_invested: last.total_invested,
                    final_gains: last.total_gains,
                    gains_pct,
                    tax_due_next_year: self.tax_due_next_year,
                }
            }
            None => SimulationSummary {
                final_value: Decimal::ZERO,
                final_value_real: Decimal::ZERO,
                final_invested: Decimal::ZERO,
                final_gains: Decimal::ZERO,
                gains_pct: Decimal::ZERO,
                tax_due_next_year: self.tax_due_next_year,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row_with_totals(value: Money, invested: Money, gains: Money) -> SimulationRow {
        SimulationRow {
            period_index: 0,
            year_index: 0,
            year_number: 1,
            step_in_year: 0,
            income_annual: Decimal::ZERO,
            income_period: Decimal::ZERO,
            living_costs_period: Decimal::ZERO,
            tax_paid_period: Decimal::ZERO,
            tax_paid_ytd: Decimal::ZERO,
            tax_due_for_year: None,
            fcpi_tax_reduction_for_year: None,
            per_cap_for_year: Decimal::ZERO,
            per_contrib_ytd: Decimal::ZERO,
            cash_before_invest: Decimal::ZERO,
            cash_after_invest: Decimal::ZERO,
            contributions: BTreeMap::new(),
            dividends: BTreeMap::new(),
            scpi_shares: BTreeMap::new(),
            redemptions: BTreeMap::new(),
            values: BTreeMap::new(),
            invested: BTreeMap::new(),
            total_value: value,
            total_invested: invested,
            total_gains: gains,
            total_value_real: value,
            inflation_index: Decimal::ONE,
        }
    }

    #[test]
    fn test_summary_from_final_row() {
        let result = SimulationResult {
            rows: vec![
                row_with_totals(dec!(1_000), dec!(900), dec!(100)),
                row_with_totals(dec!(2_500), dec!(2_000), dec!(500)),
            ],
            product_names: vec!["cash".into(), "livret".into()],
            cash_product: "cash".into(),
            tax_due_next_year: dec!(1_200),
        };
        let summary = result.summary();
        assert_eq!(summary.final_value, dec!(2_500));
        assert_eq!(summary.final_invested, dec!(2_000));
        assert_eq!(summary.final_gains, dec!(500));
        assert_eq!(summary.gains_pct, dec!(25));
        assert_eq!(summary.tax_due_next_year, dec!(1_200));
    }

    #[test]
    fn test_summary_zero_invested_has_zero_pct() {
        let result = SimulationResult {
            rows: vec![row_with_totals(dec!(1_000), Decimal::ZERO, Decimal::ZERO)],
            product_names: vec!["cash".into()],
            cash_product: "cash".into(),
            tax_due_next_year: Decimal::ZERO,
        };
        assert_eq!(result.summary().gains_pct, Decimal::ZERO);
    }

    #[test]
    fn test_summary_without_rows_is_zeroed() {
        let result = SimulationResult {
            rows: Vec::new(),
            product_names: vec!["cash".into()],
            cash_product: "cash".into(),
            tax_due_next_year: Decimal::ZERO,
        };
        let summary = result.summary();
        assert_eq!(summary.final_value, Decimal::ZERO);
        assert_eq!(summary.gains_pct, Decimal::ZERO);
    }

    #[test]
    fn test_year_end_markers_skip_serialization_when_unset() {
        let row = row_with_totals(Decimal::ZERO, Decimal::ZERO, Decimal::ZERO);
        let value = serde_json::to_value(&row).unwrap();
        assert!(value.get("tax_due_for_year").is_none());
        assert!(value.get("fcpi_tax_reduction_for_year").is_none());
    }
}
