// Copyright 2026 Wayfare Modeling Group. All rights reserved.
// Wayfare Activity-Based Travel Model - Shadow Pricing Engine

//! Run configuration for the equilibration engine.
//!
//! An explicit struct handed by reference into the equilibrator and codec at
//! call time. There is no process-global settings object.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Invalid run configuration, surfaced before any sweep begins.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("step_size must lie in (0, 1], got {0}")]
    StepSizeOutOfRange(f64),
    #[error("max_penalty must be finite and non-negative, got {0}")]
    InvalidMaxPenalty(f64),
}

/// Everything the engine needs for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowPricingConfig {
    /// Damping factor in (0, 1]. Near 1 converges fast but oscillates under
    /// noisy load; near 0 is stable but slow.
    pub step_size: f64,
    /// Ceiling on the penalty term; prices converge toward
    /// `max_penalty * overflow_probability`.
    pub max_penalty: f64,
    /// Half-width in minutes of the load window applied around each minute
    /// of a time-indexed sweep. Zero disables smoothing.
    pub time_window_spread: usize,
    /// Master switch. Disabled runs never read or write warm-start state.
    pub shadow_pricing_enabled: bool,
    /// Whether park-and-ride facilities exist in this run at all; the
    /// facility warm start is a no-op otherwise.
    pub park_and_ride_enabled: bool,
    /// Coefficient-estimation runs must never be influenced by accumulated
    /// shadow-price state; reads are no-ops in this mode.
    pub estimation_mode: bool,
    /// Whether work location modeling participates in parcel balancing.
    pub work_location_enabled: bool,
    /// Whether school location modeling participates in parcel balancing.
    pub school_location_enabled: bool,
    /// Field delimiter for the persisted files.
    pub delimiter: char,
    /// Warm-start file for facility (time-indexed) state.
    pub facility_prices_path: PathBuf,
    /// An existing facility file is moved here before being overwritten.
    pub facility_archive_path: PathBuf,
    /// Warm-start file for parcel (scalar) state.
    pub parcel_prices_path: PathBuf,
    /// An existing parcel file is moved here before being overwritten.
    pub parcel_archive_path: PathBuf,
}

impl Default for ShadowPricingConfig {
    fn default() -> Self {
        Self {
            step_size: 0.15,
            max_penalty: 2.0,
            time_window_spread: 30,
            shadow_pricing_enabled: true,
            park_and_ride_enabled: true,
            estimation_mode: false,
            work_location_enabled: true,
            school_location_enabled: true,
            delimiter: ' ',
            facility_prices_path: PathBuf::from("park_and_ride_shadow_prices.dat"),
            facility_archive_path: PathBuf::from("archive_park_and_ride_shadow_prices.dat"),
            parcel_prices_path: PathBuf::from("shadow_prices.dat"),
            parcel_archive_path: PathBuf::from("archive_shadow_prices.dat"),
        }
    }
}

impl ShadowPricingConfig {
    /// Validate numeric ranges. The equilibrator calls this before touching
    /// any resource, so a bad configuration never produces a partial sweep.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.step_size.is_finite() || self.step_size <= 0.0 || self.step_size > 1.0 {
            return Err(ConfigError::StepSizeOutOfRange(self.step_size));
        }
        if !self.max_penalty.is_finite() || self.max_penalty < 0.0 {
            return Err(ConfigError::InvalidMaxPenalty(self.max_penalty));
        }
        Ok(())
    }

    /// True when warm-start state may be read or written at all.
    pub fn persistence_active(&self) -> bool {
        self.shadow_pricing_enabled && !self.estimation_mode
    }

    /// True when any parcel-level location model is running; the parcel
    /// warm-start read is a no-op otherwise.
    pub fn parcel_models_active(&self) -> bool {
        self.work_location_enabled || self.school_location_enabled
    }

    /// True when park-and-ride facilities participate in this run; the
    /// facility warm start is a no-op otherwise.
    pub fn facility_kind_active(&self) -> bool {
        self.park_and_ride_enabled
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ShadowPricingConfig::default().validate().is_ok());
    }

    #[test]
    fn test_step_size_bounds() {
        let mut config = ShadowPricingConfig::default();
        for bad in [0.0, -0.1, 1.01, f64::NAN, f64::INFINITY] {
            config.step_size = bad;
            assert!(matches!(
                config.validate(),
                Err(ConfigError::StepSizeOutOfRange(_))
            ));
        }
        config.step_size = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_max_penalty_bounds() {
        let mut config = ShadowPricingConfig::default();
        config.max_penalty = -0.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidMaxPenalty(_))
        ));
        config.max_penalty = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_gating_flags() {
        let mut config = ShadowPricingConfig::default();
        assert!(config.persistence_active());

        config.estimation_mode = true;
        assert!(!config.persistence_active());

        config.estimation_mode = false;
        config.shadow_pricing_enabled = false;
        assert!(!config.persistence_active());

        config.shadow_pricing_enabled = true;
        config.work_location_enabled = false;
        assert!(config.parcel_models_active());
        config.school_location_enabled = false;
        assert!(!config.parcel_models_active());

        assert!(config.facility_kind_active());
        config.park_and_ride_enabled = false;
        assert!(!config.facility_kind_active());
    }

    #[test]
    fn test_serde_round_trip() {
        let config = ShadowPricingConfig {
            step_size: 0.1,
            delimiter: ',',
            ..ShadowPricingConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: ShadowPricingConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
