use std::collections::{BTreeMap, BTreeSet};
use std::mem;
use std::time::Instant;

use rust_decimal::Decimal;
use serde_json::json;

use crate::error::SimulationError;
use crate::schedule::{distribute_integer, distribution_due, periodic_rate};
use crate::simulation::config::{FcpiExitMode, ProductKind, ProductSimConfig, SimulationConfig};
use crate::simulation::result::{SimulationResult, SimulationRow};
use crate::tax::{per_cap_from_prior_income, progressive_tax};
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::SimResult;

// ---------------------------------------------------------------------------
// Run state
// ---------------------------------------------------------------------------

/// One FCPI subscription tranche, locked until its maturity step.
#[derive(Debug, Clone)]
struct FcpiLot {
    maturity_step: u32,
    principal: Money,
}

/// Mutable per-product ledger carried across steps. Indexed parallel to the
/// input product list; per-period trackers are reset at the top of each step.
#[derive(Debug)]
struct ProductState {
    value: Money,
    invested: Money,
    shares: u64,
    share_price: Money,
    lots: Vec<FcpiLot>,
    fcpi_contrib_ytd: Money,
    /// 1 + periodic return rate, for non-SCPI, non-cash value accrual.
    growth_factor: Decimal,
    /// 1 + periodic revaluation rate, for the SCPI share price.
    reval_factor: Decimal,
    contribution_period: Money,
    dividend_period: Money,
    redemption_period: Money,
}

fn init_state(product: &ProductSimConfig, dt: Decimal, warnings: &mut Vec<String>) -> ProductState {
    let mut state = ProductState {
        value: product.initial_value,
        invested: product.initial_invested.unwrap_or(product.initial_value),
        shares: 0,
        share_price: Decimal::ZERO,
        lots: Vec::new(),
        fcpi_contrib_ytd: Decimal::ZERO,
        growth_factor: Decimal::ONE + periodic_rate(product.annual_return, dt),
        reval_factor: Decimal::ONE,
        contribution_period: Decimal::ZERO,
        dividend_period: Decimal::ZERO,
        redemption_period: Decimal::ZERO,
    };
    if let ProductKind::Scpi(scpi) = &product.kind {
        let shares = match scpi.initial_shares {
            Some(count) => count,
            None if scpi.share_price > Decimal::ZERO => {
                whole_units(product.initial_value / scpi.share_price)
            }
            None => 0,
        };
        state.shares = shares;
        state.share_price = scpi.share_price;
        state.value = Decimal::from(shares) * scpi.share_price;
        state.reval_factor = Decimal::ONE + periodic_rate(scpi.revaluation_annual, dt);
        if scpi.share_price <= Decimal::ZERO && scpi.shares_per_year > 0 {
            warnings.push(format!(
                "SCPI product '{}' has a non-positive share price; planned purchases are skipped",
                product.name
            ));
        }
    }
    state
}

/// Whole units affordable at a price, truncating the fraction.
fn whole_units(ratio: Decimal) -> u64 {
    ratio.floor().to_string().parse::<u64>().unwrap_or(0)
}

fn validate_products(products: &[ProductSimConfig]) -> SimResult<usize> {
    let cash: Vec<usize> = products
        .iter()
        .enumerate()
        .filter(|(_, product)| product.kind.is_cash())
        .map(|(index, _)| index)
        .collect();
    let cash_index = match cash.as_slice() {
        [] => return Err(SimulationError::MissingCashProduct),
        [index] => *index,
        _ => {
            let names = cash.iter().map(|&i| products[i].name.clone()).collect();
            return Err(SimulationError::MultipleCashProducts(names));
        }
    };
    let mut seen = BTreeSet::new();
    for product in products {
        if !seen.insert(product.name.as_str()) {
            return Err(SimulationError::DuplicateProductName(product.name.clone()));
        }
    }
    Ok(cash_index)
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Run the full projection.
///
/// Advances `years x steps-per-year` periods in order. Each period applies
/// income, living costs and the tax instalment to cash, resolves maturing
/// FCPI lots, allocates the investable budget across products by ascending
/// priority, accrues returns and distributions, and emits one row. Year-end
/// periods additionally settle the year's tax liability, which is paid in
/// instalments over the following year.
///
/// Fails fast when the product list has zero or several cash products, or a
/// duplicate name. Ranges are not validated beyond that.
pub fn run_simulation(
    config: &SimulationConfig,
    products: &[ProductSimConfig],
) -> SimResult<ComputationOutput<SimulationResult>> {
    let started = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let cash_index = validate_products(products)?;

    let steps_per_year = config.period.steps_per_year();
    let dt = config.period.dt_years();
    let total_steps = config.years * steps_per_year;
    if total_steps == 0 {
        warnings.push("Horizon of zero periods requested; no rows generated".to_string());
    }

    let inflation_factor = Decimal::ONE + periodic_rate(config.inflation_annual, dt);
    let income_growth_factor = Decimal::ONE + config.income.annual_growth;

    let mut states: Vec<ProductState> = products
        .iter()
        .map(|product| init_state(product, dt, &mut warnings))
        .collect();

    let mut alloc_order: Vec<usize> = (0..products.len())
        .filter(|&index| index != cash_index)
        .collect();
    alloc_order.sort_by_key(|&index| products[index].priority);

    let mut inflation_index = Decimal::ONE;
    let mut income_annual = config.income.gross_annual_start;
    let mut income_by_year: Vec<Money> = Vec::new();
    let mut tax_due_by_year: Vec<Money> = Vec::new();
    let mut armed_tax_annual = Decimal::ZERO;
    let mut tax_paid_ytd = Decimal::ZERO;
    let mut per_contrib_ytd = Decimal::ZERO;

    let mut rows: Vec<SimulationRow> = Vec::with_capacity(total_steps as usize);

    for step in 0..total_steps {
        let year_index = step / steps_per_year;
        let step_in_year = step % steps_per_year;

        // --- Year boundary: arm the year's tax bill ---
        if step_in_year == 0 {
            if year_index == 0 {
                armed_tax_annual = config.tax.initial_tax_due_annual;
            } else {
                income_annual *= income_growth_factor;
                armed_tax_annual = tax_due_by_year
                    .get(year_index as usize - 1)
                    .copied()
                    .unwrap_or(Decimal::ZERO);
            }
            income_by_year.push(income_annual);
            tax_paid_ytd = Decimal::ZERO;
        }

        // --- Inflation ---
        inflation_index *= inflation_factor;

        for state in states.iter_mut() {
            state.contribution_period = Decimal::ZERO;
            state.dividend_period = Decimal::ZERO;
            state.redemption_period = Decimal::ZERO;
        }

        // --- Income, living costs, tax instalment ---
        let income_period = income_annual * dt;
        let living_costs_period = config.budget.annual_living_costs * dt;
        let tax_paid_period = armed_tax_annual * dt;

        states[cash_index].value += income_period;
        states[cash_index].value = (states[cash_index].value - living_costs_period).max(Decimal::ZERO);
        states[cash_index].value = (states[cash_index].value - tax_paid_period).max(Decimal::ZERO);
        tax_paid_ytd += tax_paid_period;

        // --- FCPI lockup exits, credited to cash before allocation ---
        for index in 0..products.len() {
            let exit_mode = match &products[index].kind {
                ProductKind::Fcpi(fcpi) => fcpi.exit_mode,
                _ => continue,
            };
            if states[index].lots.is_empty() {
                continue;
            }
            let value_at_start = states[index].value;
            let open_principal: Money = states[index].lots.iter().map(|lot| lot.principal).sum();
            let lots = mem::take(&mut states[index].lots);
            let mut carried = Vec::with_capacity(lots.len());
            for lot in lots {
                if step < lot.maturity_step {
                    carried.push(lot);
                    continue;
                }
                let gross = match exit_mode {
                    FcpiExitMode::Principal => lot.principal,
                    // Each maturing lot liquidates its principal-weighted
                    // slice of the start-of-step value, so coexisting lots
                    // cannot double-redeem the same euros.
                    FcpiExitMode::FullValue => {
                        if open_principal > Decimal::ZERO {
                            value_at_start * lot.principal / open_principal
                        } else {
                            Decimal::ZERO
                        }
                    }
                };
                let redeemed = gross.min(states[index].value).max(Decimal::ZERO);
                if redeemed > Decimal::ZERO {
                    states[index].value -= redeemed;
                    states[cash_index].value += redeemed;
                    states[index].redemption_period += redeemed;
                    states[index].invested =
                        (states[index].invested - redeemed).max(Decimal::ZERO);
                }
            }
            states[index].lots = carried;
        }

        let cash_before_invest = states[cash_index].value;

        // --- Investable budget above the emergency floor ---
        let mut budget_remaining =
            (cash_before_invest - config.budget.emergency_fund_target).max(Decimal::ZERO);
        if config.budget.enforce_emergency_fund_first
            && cash_before_invest < config.budget.emergency_fund_target
        {
            budget_remaining = Decimal::ZERO;
        }

        // --- Contribution demand (non-SCPI products) ---
        let mut desired: Vec<Money> = vec![Decimal::ZERO; products.len()];
        for (index, product) in products.iter().enumerate() {
            if index == cash_index || matches!(product.kind, ProductKind::Scpi(_)) {
                continue;
            }
            let want =
                product.contribution_per_period + product.contribution_pct_income * income_period;
            desired[index] = want.max(Decimal::ZERO);
        }

        // --- SCPI purchase plan: annual share target split over payment dates ---
        let mut planned_shares: Vec<u32> = vec![0; products.len()];
        for (index, product) in products.iter().enumerate() {
            if let ProductKind::Scpi(scpi) = &product.kind {
                if distribution_due(config.period, step_in_year, scpi.dividend_frequency) {
                    let plan =
                        distribute_integer(scpi.shares_per_year, scpi.dividend_frequency.payments_per_year());
                    let occurrences_done = (0..step_in_year)
                        .filter(|&s| distribution_due(config.period, s, scpi.dividend_frequency))
                        .count();
                    planned_shares[index] = plan.get(occurrences_done).copied().unwrap_or(0);
                }
            }
        }

        // --- Allocation pass, ascending priority ---
        for &index in &alloc_order {
            if budget_remaining <= Decimal::ZERO {
                break;
            }
            let product = &products[index];

            if let ProductKind::Scpi(_) = product.kind {
                let planned = planned_shares[index];
                let price = states[index].share_price;
                if planned == 0 || price <= Decimal::ZERO {
                    continue;
                }
                let affordable_budget = whole_units(budget_remaining / price);
                let affordable_cash = whole_units(states[cash_index].value / price);
                let bought = u64::from(planned).min(affordable_budget).min(affordable_cash);
                if bought == 0 {
                    continue;
                }
                let spent = Decimal::from(bought) * price;
                states[cash_index].value -= spent;
                budget_remaining -= spent;
                states[index].shares += bought;
                states[index].value = Decimal::from(states[index].shares) * price;
                states[index].invested += spent;
                states[index].contribution_period += spent;
                continue;
            }

            let want = desired[index];
            if want <= Decimal::ZERO {
                continue;
            }
            let alloc = want
                .min(budget_remaining)
                .min(states[cash_index].value.max(Decimal::ZERO));
            if alloc <= Decimal::ZERO {
                continue;
            }
            states[cash_index].value -= alloc;
            budget_remaining -= alloc;
            states[index].value += alloc;
            states[index].invested += alloc;
            states[index].contribution_period += alloc;

            match &product.kind {
                ProductKind::Per => per_contrib_ytd += alloc,
                ProductKind::Fcpi(fcpi) => {
                    states[index].fcpi_contrib_ytd += alloc;
                    // Last period of the year the lockup ends.
                    let maturity_step =
                        (year_index + fcpi.holding_years + 1) * steps_per_year - 1;
                    states[index].lots.push(FcpiLot {
                        maturity_step,
                        principal: alloc,
                    });
                }
                _ => {}
            }
        }

        let cash_after_invest = states[cash_index].value;

        // --- Returns and distributions ---
        for (index, product) in products.iter().enumerate() {
            match &product.kind {
                ProductKind::Scpi(scpi) => {
                    let reval_factor = states[index].reval_factor;
                    states[index].share_price *= reval_factor;
                    states[index].value =
                        Decimal::from(states[index].shares) * states[index].share_price;
                    if distribution_due(config.period, step_in_year, scpi.dividend_frequency) {
                        let dividend = if steps_per_year == 1 {
                            states[index].value * scpi.distribution_annual
                        } else {
                            let occurrences =
                                Decimal::from(scpi.dividend_frequency.payments_per_year());
                            states[index].value * scpi.distribution_annual / occurrences
                        };
                        if dividend > Decimal::ZERO {
                            states[index].dividend_period += dividend;
                            if scpi.dividends_to_cash {
                                states[cash_index].value += dividend;
                            } else {
                                states[index].value += dividend;
                            }
                        }
                    }
                }
                // Cash has no return of its own; it only moves with the
                // explicit flows above.
                ProductKind::Cash => {}
                _ => {
                    let growth_factor = states[index].growth_factor;
                    states[index].value *= growth_factor;
                }
            }
        }

        // --- Totals and per-product snapshot maps ---
        let mut contributions: BTreeMap<String, Money> = BTreeMap::new();
        let mut dividends: BTreeMap<String, Money> = BTreeMap::new();
        let mut scpi_shares: BTreeMap<String, u64> = BTreeMap::new();
        let mut redemptions: BTreeMap<String, Money> = BTreeMap::new();
        let mut values: BTreeMap<String, Money> = BTreeMap::new();
        let mut invested: BTreeMap<String, Money> = BTreeMap::new();
        let mut total_value = Decimal::ZERO;
        let mut total_invested = Decimal::ZERO;
        let mut total_gains = Decimal::ZERO;
        for (product, state) in products.iter().zip(states.iter()) {
            contributions.insert(product.name.clone(), state.contribution_period);
            dividends.insert(product.name.clone(), state.dividend_period);
            scpi_shares.insert(product.name.clone(), state.shares);
            redemptions.insert(product.name.clone(), state.redemption_period);
            values.insert(product.name.clone(), state.value);
            invested.insert(product.name.clone(), state.invested);
            total_value += state.value;
            if !product.kind.is_cash() {
                total_invested += state.invested;
                let real_value = if inflation_index > Decimal::ZERO {
                    state.value / inflation_index
                } else {
                    state.value
                };
                total_gains += real_value - state.invested;
            }
        }
        let total_value_real = if inflation_index > Decimal::ZERO {
            total_value / inflation_index
        } else {
            total_value
        };

        // --- Retirement ceiling from prior-year income ---
        let prior_income = if year_index == 0 {
            config.income.gross_annual_previous.unwrap_or(income_annual)
        } else {
            income_by_year
                .get(year_index as usize - 1)
                .copied()
                .unwrap_or(income_annual)
        };
        let per_cap_for_year = per_cap_from_prior_income(prior_income, &config.per_cap);

        // --- Year-end settlement: liability for this year, paid next year ---
        let mut tax_due_for_year = None;
        let mut fcpi_tax_reduction_for_year = None;
        if step_in_year == steps_per_year - 1 {
            let taxable_base = (income_annual
                * (Decimal::ONE - config.tax.standard_deduction_rate))
                .max(Decimal::ZERO);
            let per_deduction = per_contrib_ytd.min(per_cap_for_year);
            let taxable_after_per = (taxable_base - per_deduction).max(Decimal::ZERO);
            let tax_before_credits = progressive_tax(taxable_after_per, &config.tax);

            let mut fcpi_credit_total = Decimal::ZERO;
            for (index, product) in products.iter().enumerate() {
                if let ProductKind::Fcpi(fcpi) = &product.kind {
                    let eligible = states[index].fcpi_contrib_ytd.min(fcpi.annual_eligible_cap);
                    fcpi_credit_total += eligible * fcpi.tax_reduction_rate;
                }
            }
            let tax_due = (tax_before_credits - fcpi_credit_total).max(Decimal::ZERO);

            fcpi_tax_reduction_for_year = Some(fcpi_credit_total.min(tax_before_credits));
            tax_due_for_year = Some(tax_due);
            tax_due_by_year.push(tax_due);

            per_contrib_ytd = Decimal::ZERO;
            for state in states.iter_mut() {
                state.fcpi_contrib_ytd = Decimal::ZERO;
            }
        }

        rows.push(SimulationRow {
            period_index: step,
            year_index,
            year_number: year_index + 1,
            step_in_year,
            income_annual,
            income_period,
            living_costs_period,
            tax_paid_period,
            tax_paid_ytd,
            tax_due_for_year,
            fcpi_tax_reduction_for_year,
            per_cap_for_year,
            per_contrib_ytd,
            cash_before_invest,
            cash_after_invest,
            contributions,
            dividends,
            scpi_shares,
            redemptions,
            values,
            invested,
            total_value,
            total_invested,
            total_gains,
            total_value_real,
            inflation_index,
        });
    }

    let tax_due_next_year = tax_due_by_year.last().copied().unwrap_or(Decimal::ZERO);
    let result = SimulationResult {
        rows,
        product_names: products.iter().map(|product| product.name.clone()).collect(),
        cash_product: products[cash_index].name.clone(),
        tax_due_next_year,
    };

    let elapsed = started.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Period-stepped portfolio projection (progressive tax, PER deduction, FCPI credits, SCPI share accumulation)",
        &json!({
            "start": config.start.to_string(),
            "years": config.years,
            "period": format!("{:?}", config.period),
            "inflation_annual": config.inflation_annual.to_string(),
            "gross_annual_start": config.income.gross_annual_start.to_string(),
            "income_growth_annual": config.income.annual_growth.to_string(),
            "household_parts": config.tax.household_parts.to_string(),
            "product_count": products.len(),
        }),
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
