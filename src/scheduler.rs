//! # Overhead and calibration scheduling
//!
//! Integrations are made of indivisible *units* (a scan row, a jiggle pattern, a grid chunk,
//! a continuum map). Reference, dark and calibration visits can only be inserted between
//! units, so the number of visits depends on how many whole units fit in the configured
//! interval.
//!
//! ```text
//! units_per_visit = max(1, floor(steps_btwn_x / unit_len))
//! n_visits        = max(min_visits, ceil(total_units / units_per_visit))   (0 if no units)
//! ```
//!
//! The same routine serves sky references, darks and calibrations. Reference length for a
//! shared OFF is derived by [`reference_length`].

use crate::constants::Steps;

/// Outcome of [`schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    /// Number of reference/calibration visits to interleave.
    pub n_visits: u64,
    /// Number of units integrated between two visits. Always at least one.
    pub units_per_visit: u64,
}

/// Compute how many visits are needed to cover `total_units` units.
///
/// Arguments
/// -----------------
/// * `total_units`: number of indivisible units in the whole observation.
/// * `steps_btwn_x`: configured maximum number of steps between two visits.
/// * `unit_len`: length of one unit in steps.
/// * `min_visits`: lower bound on the visit count when there is at least one unit.
///
/// Return
/// ----------
/// * A [`Schedule`] whose `units_per_visit` is never zero, so the division is always defined.
pub fn schedule(total_units: u64, steps_btwn_x: u64, unit_len: u64, min_visits: u64) -> Schedule {
    let units_per_visit = (steps_btwn_x / unit_len.max(1)).max(1);

    let n_visits = if total_units == 0 {
        0
    } else {
        total_units.div_ceil(units_per_visit).max(min_visits)
    };

    Schedule {
        n_visits,
        units_per_visit,
    }
}

/// How the OFF integration grows with the number of ON positions it serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefScaling {
    /// One OFF per ON: OFF length equals the ON length times the positions served.
    Linear,
    /// Shared OFF: OFF length grows as the square root of the positions served.
    Sqrt,
}

impl RefScaling {
    /// Pick the scaling for a reference visit.
    ///
    /// A shared OFF, or one serving a whole jiggle pattern, is scaled by √n.
    pub fn choose(shareoff: bool, jiggle_like: bool) -> Self {
        if shareoff || jiggle_like {
            RefScaling::Sqrt
        } else {
            RefScaling::Linear
        }
    }
}

/// Length in steps of one reference visit.
///
/// Arguments
/// -----------------
/// * `on_len`: integration length of one ON position (steps).
/// * `positions`: number of ON positions served by the reference.
/// * `scaling`: [`RefScaling`] picked by the caller.
///
/// Return
/// ----------
/// * `on_len × positions` for [`RefScaling::Linear`], `ceil(on_len × √positions)` for
///   [`RefScaling::Sqrt`].
pub fn reference_length(on_len: Steps, positions: u64, scaling: RefScaling) -> Steps {
    let positions = positions.max(1) as f64;
    match scaling {
        RefScaling::Linear => on_len * positions,
        RefScaling::Sqrt => (on_len * positions.sqrt()).ceil(),
    }
}
