// Copyright 2026 Wayfare Modeling Group. All rights reserved.
// Wayfare Activity-Based Travel Model - Shadow Pricing Engine

//! Warm-start persistence.
//!
//! Delimited text, one header line then one line per resource, all sequences
//! fully expanded positionally. Field order is a persisted contract: changing
//! it breaks warm-start compatibility with prior runs' output files. Values
//! serialize with six fractional digits, so a round trip reproduces every
//! field within 5e-7 absolute (exactly, for values representable at that
//! precision). Minute columns are numbered from the external 1-based
//! convention's origin; internally everything is 0-based.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::{debug, warn};

use crate::config::ShadowPricingConfig;
use crate::state::{FacilityState, ParcelState, MINUTES_PER_DAY};

const FACILITY_FIELDS: usize = 1 + 4 * MINUTES_PER_DAY;
const PARCEL_FIELDS: usize = 7;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Malformed persisted content: the file, the 1-based line number counting
/// the header, and the offending line's raw text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("format problem in '{file}' at line {line} with content '{content}'")]
pub struct StateFormatError {
    pub file: String,
    pub line: usize,
    pub content: String,
}

/// Codec failure: I/O on the underlying file, or malformed content. No
/// partial or best-effort parse is ever returned.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Format(#[from] StateFormatError),
}

fn format_error(path: &Path, line: usize, content: &str) -> CodecError {
    CodecError::Format(StateFormatError {
        file: path.display().to_string(),
        line,
        content: content.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Facility (time-indexed) codec
// ---------------------------------------------------------------------------

/// Read facility warm-start state into a map keyed by facility id.
///
/// Returns an empty map without touching the filesystem when shadow pricing
/// is disabled, the run is in estimation mode, or park-and-ride facilities
/// are not part of the run, and when the file does not exist. Capacity is
/// not persisted; callers assign it from the facility registry after a warm
/// start.
pub fn read_facility_prices(
    config: &ShadowPricingConfig,
) -> Result<HashMap<i32, FacilityState>, CodecError> {
    let path = config.facility_prices_path.as_path();
    let mut states = HashMap::new();

    if !config.persistence_active() || !config.facility_kind_active() {
        warn!(path = %path.display(), "facility warm start skipped: shadow pricing inactive");
        return Ok(states);
    }
    if !path.exists() {
        debug!(path = %path.display(), "no facility warm-start file, starting cold");
        return Ok(states);
    }

    let reader = BufReader::new(File::open(path)?);
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_number = index + 1;
        if line_number == 1 {
            // Header/title line.
            continue;
        }

        let tokens: Vec<&str> = line
            .split(config.delimiter)
            .filter(|token| !token.is_empty())
            .collect();
        if tokens.len() != FACILITY_FIELDS {
            return Err(format_error(path, line_number, &line));
        }

        let facility_id: i32 = tokens[0]
            .parse()
            .map_err(|_| format_error(path, line_number, &line))?;
        let mut state = FacilityState::new(facility_id, 0);

        for minute in 0..MINUTES_PER_DAY {
            state.price_delta[minute] = parse_field(&tokens, 1 + minute, path, line_number, &line)?;
            state.shadow_price[minute] =
                parse_field(&tokens, 1 + MINUTES_PER_DAY + minute, path, line_number, &line)?;
            state.exogenous_load[minute] =
                parse_field(&tokens, 1 + 2 * MINUTES_PER_DAY + minute, path, line_number, &line)?;
            state.simulated_load[minute] =
                parse_field(&tokens, 1 + 3 * MINUTES_PER_DAY + minute, path, line_number, &line)?;
        }

        states.insert(facility_id, state);
    }

    debug!(path = %path.display(), facilities = states.len(), "facility warm start loaded");
    Ok(states)
}

fn parse_field(
    tokens: &[&str],
    index: usize,
    path: &Path,
    line_number: usize,
    line: &str,
) -> Result<f64, CodecError> {
    tokens[index]
        .parse()
        .map_err(|_| format_error(path, line_number, line))
}

/// Write facility state, one row per facility in ascending id order.
///
/// An existing file at the target path is first moved to the configured
/// archive path, replacing any previous archive. A no-op when shadow pricing
/// is inactive or park-and-ride facilities are not part of the run.
pub fn write_facility_prices(
    facilities: &HashMap<i32, FacilityState>,
    config: &ShadowPricingConfig,
) -> Result<(), CodecError> {
    let path = config.facility_prices_path.as_path();
    if !config.persistence_active() || !config.facility_kind_active() {
        warn!(path = %path.display(), "facility price write skipped: shadow pricing inactive");
        return Ok(());
    }

    archive_existing(path, config.facility_archive_path.as_path())?;

    let mut writer = BufWriter::new(File::create(path)?);
    let delimiter = config.delimiter;

    write!(writer, "FACILITYID")?;
    for label in ["DELTA", "PRICE", "EXLOAD", "SIMLOAD"] {
        for minute in 0..MINUTES_PER_DAY {
            write!(writer, "{delimiter}{label}{minute:04}")?;
        }
    }
    writeln!(writer)?;

    let mut ids: Vec<i32> = facilities.keys().copied().collect();
    ids.sort_unstable();
    for id in ids {
        let facility = &facilities[&id];
        write!(writer, "{}", facility.facility_id)?;
        for sequence in [
            &facility.price_delta,
            &facility.shadow_price,
            &facility.exogenous_load,
            &facility.simulated_load,
        ] {
            for value in sequence.iter() {
                write!(writer, "{delimiter}{value:.6}")?;
            }
        }
        writeln!(writer)?;
    }
    writer.flush()?;

    debug!(path = %path.display(), facilities = facilities.len(), "facility prices written");
    Ok(())
}

// ---------------------------------------------------------------------------
// Parcel (scalar) codec
// ---------------------------------------------------------------------------

/// Read parcel warm-start state into a map keyed by parcel id.
///
/// Same gating as the facility read, plus: an empty map when neither work nor
/// school location modeling is enabled, since nothing would consume the state.
pub fn read_parcel_prices(
    config: &ShadowPricingConfig,
) -> Result<HashMap<i32, ParcelState>, CodecError> {
    let path = config.parcel_prices_path.as_path();
    let mut states = HashMap::new();

    if !config.persistence_active() || !config.parcel_models_active() {
        warn!(path = %path.display(), "parcel warm start skipped: shadow pricing inactive");
        return Ok(states);
    }
    if !path.exists() {
        debug!(path = %path.display(), "no parcel warm-start file, starting cold");
        return Ok(states);
    }

    let reader = BufReader::new(File::open(path)?);
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_number = index + 1;
        if line_number == 1 {
            continue;
        }

        let tokens: Vec<&str> = line
            .split(config.delimiter)
            .filter(|token| !token.is_empty())
            .collect();
        if tokens.len() != PARCEL_FIELDS {
            return Err(format_error(path, line_number, &line));
        }

        let parcel_id: i32 = tokens[0]
            .parse()
            .map_err(|_| format_error(path, line_number, &line))?;
        let mut state = ParcelState::new(parcel_id);

        state.employment.difference = parse_field(&tokens, 1, path, line_number, &line)?;
        state.employment.shadow_price = parse_field(&tokens, 2, path, line_number, &line)?;
        state.students_k12.difference = parse_field(&tokens, 3, path, line_number, &line)?;
        state.students_k12.shadow_price = parse_field(&tokens, 4, path, line_number, &line)?;
        state.students_university.difference = parse_field(&tokens, 5, path, line_number, &line)?;
        state.students_university.shadow_price = parse_field(&tokens, 6, path, line_number, &line)?;

        states.insert(parcel_id, state);
    }

    debug!(path = %path.display(), parcels = states.len(), "parcel warm start loaded");
    Ok(states)
}

/// Write parcel state, one row per parcel in ascending id order, archiving
/// any existing file first. A no-op when shadow pricing is inactive.
pub fn write_parcel_prices(
    parcels: &HashMap<i32, ParcelState>,
    config: &ShadowPricingConfig,
) -> Result<(), CodecError> {
    let path = config.parcel_prices_path.as_path();
    if !config.persistence_active() {
        warn!(path = %path.display(), "parcel price write skipped: shadow pricing inactive");
        return Ok(());
    }

    archive_existing(path, config.parcel_archive_path.as_path())?;

    let mut writer = BufWriter::new(File::create(path)?);
    let delimiter = config.delimiter;

    write!(writer, "PARCELID")?;
    for label in ["DELTSPUW", "SHADPEMP", "DELTSPUS", "SHADPK12", "DELTSPUU", "SHADPUNI"] {
        write!(writer, "{delimiter}{label}")?;
    }
    writeln!(writer)?;

    let mut ids: Vec<i32> = parcels.keys().copied().collect();
    ids.sort_unstable();
    for id in ids {
        let parcel = &parcels[&id];
        write!(writer, "{}", parcel.parcel_id)?;
        for pair in [
            parcel.employment,
            parcel.students_k12,
            parcel.students_university,
        ] {
            write!(writer, "{delimiter}{:.6}{delimiter}{:.6}", pair.difference, pair.shadow_price)?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;

    debug!(path = %path.display(), parcels = parcels.len(), "parcel prices written");
    Ok(())
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Keep a safe copy of the previous run's file before overwriting it.
fn archive_existing(path: &Path, archive: &Path) -> Result<(), CodecError> {
    if path.exists() {
        if archive.exists() {
            fs::remove_file(archive)?;
        }
        fs::rename(path, archive)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
