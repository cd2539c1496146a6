// Copyright 2026 Wayfare Modeling Group. All rights reserved.
// Wayfare Activity-Based Travel Model - Shadow Pricing Engine

//! Per-resource shadow-price state.
//!
//! Two shapes: [`FacilityState`] carries one value per minute of day for
//! park-and-ride lots whose demand is time-of-day dependent, and
//! [`ParcelState`] carries one scalar pair per capacity dimension for
//! employment and school-seat balancing. Both are created zeroed or loaded
//! from a warm-start file, then mutated in place once per outer iteration by
//! the equilibrator.

use serde::{Deserialize, Serialize};

/// Minutes in a simulated day; every time-indexed sequence has this length.
pub const MINUTES_PER_DAY: usize = 1440;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Structural invariant violation discovered on a resource mid-sweep.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceStateError {
    #[error("facility {facility_id}: {field} has length {actual}, expected {expected}")]
    LengthMismatch {
        facility_id: i32,
        field: &'static str,
        actual: usize,
        expected: usize,
    },
    #[error("parcel {parcel_id} has no demand observation for this sweep")]
    MissingObservation { parcel_id: i32 },
}

// ---------------------------------------------------------------------------
// FacilityState (time-indexed)
// ---------------------------------------------------------------------------

/// Time-indexed shadow-price state for one park-and-ride facility.
///
/// The four sequences are parallel and minute-of-day indexed, 0..1439. The
/// external file representation numbers minutes from 1; the codec owns that
/// off-by-one mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityState {
    /// Stable id into the externally owned facility registry.
    pub facility_id: i32,
    /// Stall capacity, fixed for the run. Zero means unconstrained: the
    /// facility is never priced upward, only relaxed.
    pub capacity: u32,
    /// Last update's `new - previous` per minute (convergence signal).
    pub price_delta: Vec<f64>,
    /// Current additive utility penalty per minute.
    pub shadow_price: Vec<f64>,
    /// Load not produced by the simulated population; fixed input.
    pub exogenous_load: Vec<f64>,
    /// Load accumulated from the current iteration's simulated choices.
    /// Reset each iteration by the external driver.
    pub simulated_load: Vec<f64>,
}

impl FacilityState {
    /// Fresh state with all sequences zeroed.
    pub fn new(facility_id: i32, capacity: u32) -> Self {
        Self {
            facility_id,
            capacity,
            price_delta: vec![0.0; MINUTES_PER_DAY],
            shadow_price: vec![0.0; MINUTES_PER_DAY],
            exogenous_load: vec![0.0; MINUTES_PER_DAY],
            simulated_load: vec![0.0; MINUTES_PER_DAY],
        }
    }

    /// Current penalty at a minute, read by the utility-evaluation layer.
    pub fn price_at(&self, minute: usize) -> f64 {
        self.shadow_price[minute]
    }

    /// Accumulate simulated demand at a minute. Out-of-range minutes are a
    /// driver bug; they panic in debug builds and are dropped in release.
    pub fn add_load(&mut self, minute: usize, quantity: f64) {
        debug_assert!(minute < MINUTES_PER_DAY, "minute {minute} out of range");
        if let Some(slot) = self.simulated_load.get_mut(minute) {
            *slot += quantity;
        }
    }

    /// Clear accumulated simulated load ahead of the next iteration.
    pub fn reset_simulated_load(&mut self) {
        self.simulated_load.fill(0.0);
    }

    /// Check the parallel-sequence invariant.
    pub fn validate(&self) -> Result<(), ResourceStateError> {
        let fields = [
            ("price_delta", self.price_delta.len()),
            ("shadow_price", self.shadow_price.len()),
            ("exogenous_load", self.exogenous_load.len()),
            ("simulated_load", self.simulated_load.len()),
        ];
        for (field, actual) in fields {
            if actual != MINUTES_PER_DAY {
                return Err(ResourceStateError::LengthMismatch {
                    facility_id: self.facility_id,
                    field,
                    actual,
                    expected: MINUTES_PER_DAY,
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ParcelState (scalar)
// ---------------------------------------------------------------------------

/// One `{difference, shadow_price}` pair for a single capacity dimension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScalarPrice {
    /// Last update's `new - previous`.
    pub difference: f64,
    /// Current additive utility penalty.
    pub shadow_price: f64,
}

/// Capacity dimensions balanced at the parcel level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParcelDimension {
    Employment,
    StudentsK12,
    StudentsUniversity,
}

impl ParcelDimension {
    pub const ALL: [ParcelDimension; 3] = [
        ParcelDimension::Employment,
        ParcelDimension::StudentsK12,
        ParcelDimension::StudentsUniversity,
    ];
}

/// Scalar shadow-price state for one parcel: independent pairs for jobs,
/// K-12 seats, and university seats, each updated once per outer iteration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParcelState {
    pub parcel_id: i32,
    pub employment: ScalarPrice,
    pub students_k12: ScalarPrice,
    pub students_university: ScalarPrice,
}

impl ParcelState {
    pub fn new(parcel_id: i32) -> Self {
        Self {
            parcel_id,
            ..Self::default()
        }
    }

    pub fn dimension(&self, dimension: ParcelDimension) -> &ScalarPrice {
        match dimension {
            ParcelDimension::Employment => &self.employment,
            ParcelDimension::StudentsK12 => &self.students_k12,
            ParcelDimension::StudentsUniversity => &self.students_university,
        }
    }

    pub fn dimension_mut(&mut self, dimension: ParcelDimension) -> &mut ScalarPrice {
        match dimension {
            ParcelDimension::Employment => &mut self.employment,
            ParcelDimension::StudentsK12 => &mut self.students_k12,
            ParcelDimension::StudentsUniversity => &mut self.students_university,
        }
    }
}

/// Daily capacity and aggregated demand for one parcel dimension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DimensionLoad {
    pub capacity: u32,
    pub load: f64,
}

/// Per-iteration demand observation for one parcel, one entry per dimension,
/// already aggregated to daily totals by the choice-evaluation layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ParcelObservation {
    pub employment: DimensionLoad,
    pub students_k12: DimensionLoad,
    pub students_university: DimensionLoad,
}

impl ParcelObservation {
    pub fn dimension(&self, dimension: ParcelDimension) -> DimensionLoad {
        match dimension {
            ParcelDimension::Employment => self.employment,
            ParcelDimension::StudentsK12 => self.students_k12,
            ParcelDimension::StudentsUniversity => self.students_university,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_facility_is_zeroed_and_valid() {
        let facility = FacilityState::new(17, 250);
        assert_eq!(facility.facility_id, 17);
        assert_eq!(facility.capacity, 250);
        assert_eq!(facility.shadow_price.len(), MINUTES_PER_DAY);
        assert!(facility.shadow_price.iter().all(|&p| p == 0.0));
        assert!(facility.validate().is_ok());
    }

    #[test]
    fn test_length_mismatch_names_the_field() {
        let mut facility = FacilityState::new(3, 50);
        facility.exogenous_load.truncate(100);
        let err = facility.validate().unwrap_err();
        match err {
            ResourceStateError::LengthMismatch {
                facility_id,
                field,
                actual,
                expected,
            } => {
                assert_eq!(facility_id, 3);
                assert_eq!(field, "exogenous_load");
                assert_eq!(actual, 100);
                assert_eq!(expected, MINUTES_PER_DAY);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_load_accumulation_and_reset() {
        let mut facility = FacilityState::new(1, 10);
        facility.add_load(480, 1.0);
        facility.add_load(480, 2.5);
        assert_eq!(facility.simulated_load[480], 3.5);
        facility.reset_simulated_load();
        assert!(facility.simulated_load.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_parcel_dimension_accessors_are_independent() {
        let mut parcel = ParcelState::new(42);
        parcel.dimension_mut(ParcelDimension::StudentsK12).shadow_price = 0.7;
        assert_eq!(parcel.students_k12.shadow_price, 0.7);
        assert_eq!(parcel.employment.shadow_price, 0.0);
        assert_eq!(parcel.students_university.shadow_price, 0.0);
        assert_eq!(
            parcel.dimension(ParcelDimension::StudentsK12).shadow_price,
            0.7
        );
    }
}
