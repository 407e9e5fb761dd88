use serde::{Deserialize, Serialize};

use crate::simulation::config::ProductSimConfig;
use crate::types::Money;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Current position of one tracked holding, used to seed a projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldingSnapshot {
    pub name: String,
    pub current_value: Money,
    pub net_contributions: Money,
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Seed product starting positions from tracked holdings, matched by name.
///
/// A snapshot fills `initial_value` only when the product leaves it at zero,
/// and `initial_invested` only when unset, so explicit configuration always
/// wins. Snapshots without a matching product are ignored.
pub fn apply_snapshots(products: &mut [ProductSimConfig], snapshots: &[HoldingSnapshot]) {
    for snapshot in snapshots {
        if let Some(product) = products
            .iter_mut()
            .find(|product| product.name == snapshot.name)
        {
            if product.initial_value.is_zero() {
                product.initial_value = snapshot.current_value;
            }
            if product.initial_invested.is_none() {
                product.initial_invested = Some(snapshot.net_contributions);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
