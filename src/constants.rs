//! # Constants and type definitions for ocs_duration
//!
//! This module centralizes the **fixed overheads**, **conversion factors**, and **unit
//! aliases** used by the duration engine.
//!
//! ## Overview
//!
//! - Heterodyne (correlator) backend overheads
//! - Continuum (bolometer) backend overheads
//! - Scan geometry margins
//! - Step-time quantization correction
//! - Unit aliases shared by every module
//!
//! All overheads are expressed in seconds unless the name says otherwise.

// -------------------------------------------------------------------------------------------------
// Unit aliases
// -------------------------------------------------------------------------------------------------

/// Angle in arcseconds
pub type ArcSec = f64;
/// Angle in degrees
pub type Degree = f64;
/// Time in seconds
pub type Seconds = f64;
/// Number of atomic steps. Fractional while the geometry is being resolved.
pub type Steps = f64;

/// 2π, used by the circular scan patterns
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// Arcseconds in one degree
pub const ARCSEC_PER_DEG: f64 = 3600.0;

// -------------------------------------------------------------------------------------------------
// Step-time correction
// -------------------------------------------------------------------------------------------------

/// Step times at or below this value (s) suffer from hardware quantization.
pub const FAST_STEP_THRESHOLD: Seconds = 0.0051;

/// Multiplicative correction applied to fast step times.
pub const FAST_STEP_CORRECTION: f64 = 1.16;

// -------------------------------------------------------------------------------------------------
// Scan geometry
// -------------------------------------------------------------------------------------------------

/// Turnaround margin added to the scanned dimension of a raster map (arcsec).
pub const SCAN_TURNAROUND_MARGIN: ArcSec = 60.0;

/// Empirical slow-down of the daisy pattern relative to the ideal angular rate.
pub const DAISY_RATE_CORRECTION: f64 = 10.1;

// -------------------------------------------------------------------------------------------------
// Continuum backend
// -------------------------------------------------------------------------------------------------

/// Fixed start-up cost of a continuum observation.
pub const CONTINUUM_STARTUP_OVERHEAD: Seconds = 20.0;

/// Cost of starting each continuum sequence (science or dark).
pub const CONTINUUM_SEQ_START_OVERHEAD: Seconds = 2.0;

/// Length of a setup observation.
pub const CONTINUUM_SETUP_LENGTH: Seconds = 240.0;

// -------------------------------------------------------------------------------------------------
// Heterodyne backend
// -------------------------------------------------------------------------------------------------

/// Per-sequence overhead of the correlator.
pub const HET_SEQ_OVERHEAD: Seconds = 5.0;

/// Fixed start-up cost of a heterodyne observation.
pub const HET_OBS_OVERHEAD: Seconds = 40.0;

/// One-way telescope move to a reference position.
pub const HET_TEL_REF_OVERHEAD: Seconds = 5.0;

/// One-way telescope nod.
pub const HET_TEL_NOD_OVERHEAD: Seconds = 2.0;

/// Secondary mirror reposition between focus positions.
pub const HET_SMU_OVERHEAD: Seconds = 2.0;

/// A calibration visit costs the same move as a reference visit.
pub const HET_CAL_OVERHEAD: Seconds = HET_TEL_REF_OVERHEAD;
