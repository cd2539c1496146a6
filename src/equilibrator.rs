// Copyright 2026 Wayfare Modeling Group. All rights reserved.
// Wayfare Activity-Based Travel Model - Shadow Pricing Engine

//! Sweep orchestration: one equilibration pass per outer iteration.
//!
//! The outer simulation loop runs the population's choices against current
//! prices, accumulates realized loads into the state records, then calls one
//! of the sweeps here. Updated prices feed the next iteration's utility
//! evaluation. This module is called, it never calls back; iteration count is
//! the driver's policy.

use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

use crate::config::{ConfigError, ShadowPricingConfig};
use crate::smoothing::windowed_peak;
use crate::state::{
    FacilityState, ParcelDimension, ParcelObservation, ParcelState, ResourceStateError,
    MINUTES_PER_DAY,
};
use crate::update::damped_update;

/// Failures that abort a sweep before or during execution.
#[derive(Debug, thiserror::Error)]
pub enum EquilibrationError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Resource(#[from] ResourceStateError),
}

/// Convergence diagnostics for one completed sweep. The per-resource figure
/// is the largest absolute price delta across that resource's updates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SweepSummary {
    pub resources: usize,
    pub max_abs_delta: f64,
    pub mean_abs_delta: f64,
}

impl SweepSummary {
    fn from_resource_deltas(deltas: &[f64]) -> Self {
        if deltas.is_empty() {
            return Self::default();
        }
        let max = deltas.iter().copied().fold(0.0, f64::max);
        let mean = deltas.iter().sum::<f64>() / deltas.len() as f64;
        Self {
            resources: deltas.len(),
            max_abs_delta: max,
            mean_abs_delta: mean,
        }
    }
}

// ---------------------------------------------------------------------------
// Time-indexed sweep
// ---------------------------------------------------------------------------

/// Run one damped-update sweep over every facility.
///
/// Per facility and minute, total pressure is the windowed peak of the
/// simulated load plus that minute's exogenous load; the damped rule then
/// moves the price toward `max_penalty * overflow_probability`. The delta is
/// computed against the pre-update price before the price is overwritten.
///
/// Facilities are independent, so the sweep partitions them across worker
/// threads; each worker owns exclusive mutable access to the facilities it
/// processes. A structurally invalid facility aborts the sweep with its state
/// untouched; sibling facilities are each either fully updated or untouched.
pub fn equilibrate_facilities(
    facilities: &mut HashMap<i32, FacilityState>,
    config: &ShadowPricingConfig,
) -> Result<SweepSummary, EquilibrationError> {
    config.validate()?;

    let deltas = facilities
        .par_iter_mut()
        .map(|(_, facility)| equilibrate_facility(facility, config))
        .collect::<Result<Vec<_>, ResourceStateError>>()?;

    let summary = SweepSummary::from_resource_deltas(&deltas);
    info!(
        resources = summary.resources,
        max_abs_delta = summary.max_abs_delta,
        mean_abs_delta = summary.mean_abs_delta,
        "facility sweep complete"
    );
    Ok(summary)
}

fn equilibrate_facility(
    facility: &mut FacilityState,
    config: &ShadowPricingConfig,
) -> Result<f64, ResourceStateError> {
    facility.validate()?;

    let mut max_abs_delta = 0.0f64;
    for minute in 0..MINUTES_PER_DAY {
        let peak = windowed_peak(
            &facility.simulated_load,
            minute,
            config.time_window_spread,
        );
        let pressure = peak + facility.exogenous_load[minute];
        let update = damped_update(
            facility.shadow_price[minute],
            facility.capacity,
            pressure,
            config.step_size,
            config.max_penalty,
        );
        facility.price_delta[minute] = update.delta;
        facility.shadow_price[minute] = update.new_price;
        max_abs_delta = max_abs_delta.max(update.delta.abs());
    }
    Ok(max_abs_delta)
}

// ---------------------------------------------------------------------------
// Scalar sweep
// ---------------------------------------------------------------------------

/// Run one damped-update sweep over every parcel, one update per capacity
/// dimension. Loads arrive already aggregated to daily totals, so there is
/// no windowing. A parcel without an observation aborts the sweep with that
/// parcel untouched.
pub fn equilibrate_parcels(
    parcels: &mut HashMap<i32, ParcelState>,
    observations: &HashMap<i32, ParcelObservation>,
    config: &ShadowPricingConfig,
) -> Result<SweepSummary, EquilibrationError> {
    config.validate()?;

    let deltas = parcels
        .par_iter_mut()
        .map(|(parcel_id, parcel)| {
            let observation = observations.get(parcel_id).ok_or(
                ResourceStateError::MissingObservation {
                    parcel_id: *parcel_id,
                },
            )?;
            Ok(equilibrate_parcel(parcel, observation, config))
        })
        .collect::<Result<Vec<_>, ResourceStateError>>()?;

    let summary = SweepSummary::from_resource_deltas(&deltas);
    info!(
        resources = summary.resources,
        max_abs_delta = summary.max_abs_delta,
        mean_abs_delta = summary.mean_abs_delta,
        "parcel sweep complete"
    );
    Ok(summary)
}

fn equilibrate_parcel(
    parcel: &mut ParcelState,
    observation: &ParcelObservation,
    config: &ShadowPricingConfig,
) -> f64 {
    let mut max_abs_delta = 0.0f64;
    for dimension in ParcelDimension::ALL {
        let load = observation.dimension(dimension);
        let pair = parcel.dimension_mut(dimension);
        let update = damped_update(
            pair.shadow_price,
            load.capacity,
            load.load,
            config.step_size,
            config.max_penalty,
        );
        pair.difference = update.delta;
        pair.shadow_price = update.new_price;
        max_abs_delta = max_abs_delta.max(update.delta.abs());
    }
    max_abs_delta
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
