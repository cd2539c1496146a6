// Copyright 2026 Wayfare Modeling Group. All rights reserved.
// Wayfare Activity-Based Travel Model - Shadow Pricing Engine

//! Capacity-constrained shadow-price equilibration.
//!
//! The travel model's discrete-choice evaluators allocate simulated demand to
//! finite shared resources (jobs, school seats, park-and-ride stalls) whose
//! capacity the choice models do not natively respect. This crate discovers,
//! through iterative feedback, per-resource penalty values that push simulated
//! demand toward known supply: each outer iteration the driver accumulates
//! realized loads into the state records and runs one equilibration sweep; the
//! updated prices enter the next iteration's utility functions as additive
//! penalties. State persists across runs through a delimited warm-start file.

pub mod codec;
pub mod config;
pub mod equilibrator;
pub mod penalty;
pub mod smoothing;
pub mod state;
pub mod update;

pub use codec::{
    read_facility_prices, read_parcel_prices, write_facility_prices, write_parcel_prices,
    CodecError, StateFormatError,
};
pub use config::{ConfigError, ShadowPricingConfig};
pub use equilibrator::{
    equilibrate_facilities, equilibrate_parcels, EquilibrationError, SweepSummary,
};
pub use penalty::overflow_probability;
pub use smoothing::windowed_peak;
pub use state::{
    DimensionLoad, FacilityState, ParcelDimension, ParcelObservation, ParcelState,
    ResourceStateError, ScalarPrice, MINUTES_PER_DAY,
};
pub use update::{damped_update, PriceUpdate};
