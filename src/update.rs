// Copyright 2026 Wayfare Modeling Group. All rights reserved.
// Wayfare Activity-Based Travel Model - Shadow Pricing Engine

//! Damped shadow-price update rule.

use serde::{Deserialize, Serialize};

use crate::penalty::overflow_probability;

/// Result of one update application: the next price and its delta against the
/// pre-update price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceUpdate {
    pub new_price: f64,
    pub delta: f64,
}

/// One damped fixed-point step toward
/// `max_penalty * overflow_probability(capacity, load)`.
///
/// With zero capacity or zero load the penalty term vanishes and the previous
/// price decays geometrically at `step_size` per application: a resource
/// observed to be unconstrained relaxes its price over successive iterations
/// instead of freezing it. Under stationary load the iteration converges to
/// the penalty target at rate `1 - step_size`; a step size near 1 converges
/// fast but oscillates under noisy load, near 0 is stable but slow.
pub fn damped_update(
    previous_price: f64,
    capacity: u32,
    load: f64,
    step_size: f64,
    max_penalty: f64,
) -> PriceUpdate {
    let penalty = overflow_probability(capacity, load);
    let new_price = (1.0 - step_size) * previous_price + step_size * max_penalty * penalty;

    PriceUpdate {
        new_price,
        delta: new_price - previous_price,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
