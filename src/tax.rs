//! Household income tax: the progressive scale with quotient-familial split,
//! and the deductible ceiling for retirement-plan contributions.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One marginal band of the progressive scale. `up_to` is the band's upper
/// bound; `None` marks the unbounded top band.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxBracket {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub up_to: Option<Money>,
    pub rate: Rate,
}

/// Household tax parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxConfig {
    /// Bands in ascending order of `up_to`; the last should be unbounded.
    pub brackets: Vec<TaxBracket>,
    /// Quotient-familial parts. Values below 1 are treated as 1.
    pub household_parts: Decimal,
    pub standard_deduction_rate: Rate,
    /// Liability assessed before the simulation starts, paid over year one.
    pub initial_tax_due_annual: Money,
}

impl Default for TaxConfig {
    fn default() -> Self {
        Self {
            brackets: Vec::new(),
            household_parts: Decimal::ONE,
            standard_deduction_rate: dec!(0.10),
            initial_tax_due_annual: Decimal::ZERO,
        }
    }
}

/// Deductible ceiling rule for retirement-plan contributions: a share of the
/// prior year's income, clamped to an absolute floor and optional ceiling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerCapConfig {
    pub rate_of_prior_income: Rate,
    pub annual_min: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_max: Option<Money>,
}

impl Default for PerCapConfig {
    fn default() -> Self {
        Self {
            rate_of_prior_income: dec!(0.10),
            annual_min: Decimal::ZERO,
            annual_max: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Core functions
// ---------------------------------------------------------------------------

/// Progressive tax on `taxable` under the household scale.
///
/// The amount is split across the household parts, run band by band through
/// the marginal scale, and the per-part tax multiplied back. Non-positive
/// taxable income owes nothing.
pub fn progressive_tax(taxable: Money, config: &TaxConfig) -> Money {
    if taxable <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let parts = config.household_parts.max(Decimal::ONE);
    let taxable_per_part = taxable / parts;

    let mut tax = Decimal::ZERO;
    let mut previous_upper = Decimal::ZERO;
    for bracket in &config.brackets {
        match bracket.up_to {
            None => {
                tax += (taxable_per_part - previous_upper) * bracket.rate;
                break;
            }
            Some(upper) => {
                let band = taxable_per_part.min(upper) - previous_upper;
                if band > Decimal::ZERO {
                    tax += band * bracket.rate;
                }
                previous_upper = upper;
                if taxable_per_part <= upper {
                    break;
                }
            }
        }
    }
    tax.max(Decimal::ZERO) * parts
}

/// Deductible retirement-contribution ceiling for a year, derived from the
/// prior year's gross income.
pub fn per_cap_from_prior_income(prior_income: Money, config: &PerCapConfig) -> Money {
    let mut cap = prior_income * config.rate_of_prior_income;
    cap = cap.max(config.annual_min);
    if let Some(annual_max) = config.annual_max {
        cap = cap.min(annual_max);
    }
    cap.max(Decimal::ZERO)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// The 2024 French scale for one part.
    fn french_scale() -> TaxConfig {
        TaxConfig {
            brackets: vec![
                TaxBracket { up_to: Some(dec!(11_294)), rate: Decimal::ZERO },
                TaxBracket { up_to: Some(dec!(28_797)), rate: dec!(0.11) },
                TaxBracket { up_to: Some(dec!(82_341)), rate: dec!(0.30) },
                TaxBracket { up_to: Some(dec!(177_106)), rate: dec!(0.41) },
                TaxBracket { up_to: None, rate: dec!(0.45) },
            ],
            ..TaxConfig::default()
        }
    }

    #[test]
    fn test_progressive_tax_zero_below_first_threshold() {
        let config = french_scale();
        assert_eq!(progressive_tax(dec!(10_000), &config), Decimal::ZERO);
        assert_eq!(progressive_tax(Decimal::ZERO, &config), Decimal::ZERO);
        assert_eq!(progressive_tax(dec!(-5_000), &config), Decimal::ZERO);
    }

    #[test]
    fn test_progressive_tax_middle_band() {
        let config = french_scale();
        // (28797-11294)*0.11 + (30000-28797)*0.30
        assert_eq!(progressive_tax(dec!(30_000), &config), dec!(2286.23));
    }

    #[test]
    fn test_progressive_tax_top_band() {
        let config = french_scale();
        // 1925.33 + 16063.20 + 38853.65 + (200000-177106)*0.45
        assert_eq!(progressive_tax(dec!(200_000), &config), dec!(67144.48));
    }

    #[test]
    fn test_progressive_tax_household_split() {
        let mut config = french_scale();
        config.household_parts = dec!(2);
        // Two parts of 30k each.
        assert_eq!(progressive_tax(dec!(60_000), &config), dec!(4572.46));
    }

    #[test]
    fn test_progressive_tax_parts_below_one_clamped() {
        let mut config = french_scale();
        config.household_parts = dec!(0.5);
        assert_eq!(
            progressive_tax(dec!(30_000), &config),
            progressive_tax(dec!(30_000), &french_scale())
        );
    }

    #[test]
    fn test_progressive_tax_empty_brackets() {
        let config = TaxConfig::default();
        assert_eq!(progressive_tax(dec!(50_000), &config), Decimal::ZERO);
    }

    #[test]
    fn test_progressive_tax_monotonic() {
        let config = french_scale();
        let sample = [
            Decimal::ZERO,
            dec!(5_000),
            dec!(11_294),
            dec!(20_000),
            dec!(28_797),
            dec!(50_000),
            dec!(82_341),
            dec!(100_000),
            dec!(177_106),
            dec!(250_000),
        ];
        for pair in sample.windows(2) {
            assert!(
                progressive_tax(pair[0], &config) <= progressive_tax(pair[1], &config),
                "tax not monotonic between {} and {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_per_cap_rate_of_prior_income() {
        let config = PerCapConfig::default();
        assert_eq!(per_cap_from_prior_income(dec!(50_000), &config), dec!(5_000));
    }

    #[test]
    fn test_per_cap_floor_applies() {
        let config = PerCapConfig {
            annual_min: dec!(4_399),
            ..PerCapConfig::default()
        };
        assert_eq!(per_cap_from_prior_income(dec!(30_000), &config), dec!(4_399));
        assert_eq!(per_cap_from_prior_income(dec!(50_000), &config), dec!(5_000));
    }

    #[test]
    fn test_per_cap_ceiling_applies() {
        let config = PerCapConfig {
            annual_max: Some(dec!(35_194)),
            ..PerCapConfig::default()
        };
        assert_eq!(per_cap_from_prior_income(dec!(400_000), &config), dec!(35_194));
    }

    #[test]
    fn test_per_cap_never_negative() {
        let config = PerCapConfig::default();
        assert_eq!(per_cap_from_prior_income(dec!(-10_000), &config), Decimal::ZERO);
    }
}
