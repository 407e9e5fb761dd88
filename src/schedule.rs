//! Period calendar math: step granularity, distribution payment timing, and
//! the even split of an annual share target across payment occurrences.

use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};

use crate::types::Rate;

/// Simulation step granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    Monthly,
    Quarterly,
    Yearly,
}

impl Period {
    /// Number of simulation steps in one year.
    pub fn steps_per_year(self) -> u32 {
        match self {
            Period::Monthly => 12,
            Period::Quarterly => 4,
            Period::Yearly => 1,
        }
    }

    /// Length of one step as a fraction of a year.
    pub fn dt_years(self) -> Decimal {
        Decimal::ONE / Decimal::from(self.steps_per_year())
    }
}

/// How often a fund pays its distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistributionFrequency {
    Monthly,
    Quarterly,
    Semiannual,
    Yearly,
}

impl DistributionFrequency {
    /// Payment occurrences per calendar year.
    pub fn payments_per_year(self) -> u32 {
        match self {
            DistributionFrequency::Monthly => 12,
            DistributionFrequency::Quarterly => 4,
            DistributionFrequency::Semiannual => 2,
            DistributionFrequency::Yearly => 1,
        }
    }
}

/// Rate over a `dt`-year step equivalent to compounding `annual` once a year:
/// `(1 + annual)^dt - 1`. Deliberately not `annual * dt`.
pub fn periodic_rate(annual: Rate, dt: Decimal) -> Rate {
    if annual.is_zero() {
        return Decimal::ZERO;
    }
    if dt == Decimal::ONE {
        return annual;
    }
    (Decimal::ONE + annual).powd(dt) - Decimal::ONE
}

/// Split an integer total across `n` slots as evenly as possible, per-slot
/// difference at most 1, remainder on the earliest slots.
pub fn distribute_integer(total: u32, n: u32) -> Vec<u32> {
    if n == 0 {
        return Vec::new();
    }
    let base = total / n;
    let remainder = (total % n) as usize;
    (0..n as usize)
        .map(|slot| if slot < remainder { base + 1 } else { base })
        .collect()
}

/// Whether a distribution with the given payment frequency falls on this
/// step of the simulation year.
pub fn distribution_due(
    period: Period,
    step_in_year: u32,
    frequency: DistributionFrequency,
) -> bool {
    match period {
        Period::Yearly => true,
        Period::Quarterly => match frequency {
            DistributionFrequency::Monthly | DistributionFrequency::Quarterly => true,
            DistributionFrequency::Semiannual => step_in_year == 1 || step_in_year == 3,
            DistributionFrequency::Yearly => step_in_year == 3,
        },
        Period::Monthly => match frequency {
            DistributionFrequency::Monthly => true,
            DistributionFrequency::Quarterly => matches!(step_in_year, 2 | 5 | 8 | 11),
            DistributionFrequency::Semiannual => step_in_year == 5 || step_in_year == 11,
            DistributionFrequency::Yearly => step_in_year == 11,
        },
    }
}
