use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::schedule::{DistributionFrequency, Period};
use crate::tax::{PerCapConfig, TaxConfig};
use crate::types::{Money, Rate};

// ---------------------------------------------------------------------------
// Household configuration
// ---------------------------------------------------------------------------

/// Gross salary trajectory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeConfig {
    pub gross_annual_start: Money,
    pub annual_growth: Rate,
    /// Prior-year gross, used for the first year's retirement ceiling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gross_annual_previous: Option<Money>,
}

/// Household spending and the cash-buffer rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    pub annual_living_costs: Money,
    pub emergency_fund_target: Money,
    /// Block all investing while cash sits below the target.
    pub enforce_emergency_fund_first: bool,
}

// ---------------------------------------------------------------------------
// Product configuration
// ---------------------------------------------------------------------------

/// SCPI fund parameters. The position is whole shares at `share_price`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScpiConfig {
    pub share_price: Money,
    /// Shares to buy over a full year, spread across the payment dates.
    pub shares_per_year: u32,
    /// Distribution yield on current value, annualised.
    pub distribution_annual: Rate,
    /// Route payouts to the cash account instead of reinvesting them.
    pub dividends_to_cash: bool,
    pub revaluation_annual: Rate,
    pub dividend_frequency: DistributionFrequency,
    /// Seed the position with a share count instead of deriving one from
    /// the product's initial value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_shares: Option<u64>,
}

/// What a maturing FCPI lot pays back into cash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FcpiExitMode {
    /// Return the lot's invested principal; growth stays in the fund.
    Principal,
    /// Liquidate the lot's share of the fund value.
    FullValue,
}

/// FCPI fund parameters: the tax credit and the lockup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FcpiConfig {
    pub tax_reduction_rate: Rate,
    /// Yearly subscription amount eligible for the credit.
    pub annual_eligible_cap: Money,
    pub holding_years: u32,
    pub exit_mode: FcpiExitMode,
}

impl Default for FcpiConfig {
    fn default() -> Self {
        Self {
            tax_reduction_rate: dec!(0.18),
            annual_eligible_cap: dec!(12_000),
            holding_years: 8,
            exit_mode: FcpiExitMode::Principal,
        }
    }
}

/// Product behaviour class. Kind-specific parameters ride on the variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ProductKind {
    /// The single liquid account all cash flows pass through.
    Cash,
    Savings,
    Scpi(ScpiConfig),
    Per,
    Fcpi(FcpiConfig),
    Other,
}

impl ProductKind {
    pub fn is_cash(&self) -> bool {
        matches!(self, ProductKind::Cash)
    }
}

/// One simulated product line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSimConfig {
    pub name: String,
    pub kind: ProductKind,
    /// Annual growth applied to value. Ignored for cash and SCPI kinds.
    pub annual_return: Rate,
    /// Fixed contribution per simulation step.
    pub contribution_per_period: Money,
    /// Extra contribution as a share of the step's gross income.
    pub contribution_pct_income: Rate,
    pub initial_value: Money,
    /// Cost basis at the start; defaults to `initial_value`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_invested: Option<Money>,
    /// Allocation order; lower goes first, ties keep input order.
    pub priority: u32,
}

impl ProductSimConfig {
    /// A product with no contributions and no starting balance.
    pub fn new(name: impl Into<String>, kind: ProductKind) -> Self {
        Self {
            name: name.into(),
            kind,
            annual_return: Decimal::ZERO,
            contribution_per_period: Decimal::ZERO,
            contribution_pct_income: Decimal::ZERO,
            initial_value: Decimal::ZERO,
            initial_invested: None,
            priority: 50,
        }
    }
}

/// Full scenario description handed to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub start: NaiveDate,
    pub years: u32,
    pub period: Period,
    pub inflation_annual: Rate,
    pub income: IncomeConfig,
    pub budget: BudgetConfig,
    pub tax: TaxConfig,
    pub per_cap: PerCapConfig,
}
