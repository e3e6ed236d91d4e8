//! Duration of one full PONG / Lissajous coverage pass.
//!
//! The PONG family bounces the telescope around a box at 45° to the map axes, like a billiard
//! ball. The box is snapped to a grid of vertices spaced `√2·DY` apart, with vertex counts of
//! different parity along the two axes so the path closes only after visiting every vertex.
//! The curvy and rounded variants (and the Lissajous pattern) replace the straight legs by
//! sinusoids with the same periods, so the closed path takes the same time.

use std::f64::consts::SQRT_2;

use crate::{
    constants::Seconds,
    duration_errors::DurationError,
    obs_config::{MapArea, ScanSpec},
};

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

fn lcm(a: u64, b: u64) -> Option<u64> {
    (a / gcd(a, b)).checked_mul(b)
}

/// Number of vertices along each axis of a PONG box.
///
/// Return
/// ----------
/// * `(nx, ny)` with `nx % 2 != ny % 2`.
pub fn pong_vertices(map: &MapArea, scan: &ScanSpec) -> (u64, u64) {
    let spacing = SQRT_2 * scan.dy;
    let mut nx = ((map.width / spacing).ceil() as u64).max(1);
    let mut ny = ((map.height / spacing).ceil() as u64).max(1);

    if nx % 2 == ny % 2 {
        if nx > ny {
            ny += 1;
        } else {
            nx += 1;
        }
    }
    (nx, ny)
}

/// Time needed to trace one closed PONG path.
///
/// Arguments
/// -----------------
/// * `map`: map extent (arcsec).
/// * `scan`: scan parameters; `dy` and `velocity` must be strictly positive.
///
/// Return
/// ----------
/// * The path length `lcm(2nx, 2ny)·√2·(√2·DY)` divided by the scan velocity, in seconds.
///
/// Errors
/// ----------
/// * [`DurationError::InvalidParameter`] for a non-positive `dy`, or a map so large relative to
///   `dy` that the number of legs does not fit in 64 bits.
pub fn pattern_duration(map: &MapArea, scan: &ScanSpec) -> Result<Seconds, DurationError> {
    if scan.dy <= 0.0 {
        return Err(DurationError::invalid(
            "scan dy",
            format!("must be strictly positive, got {}", scan.dy),
        ));
    }

    let (nx, ny) = pong_vertices(map, scan);
    let spacing = SQRT_2 * scan.dy;
    let legs = nx
        .checked_mul(2)
        .zip(ny.checked_mul(2))
        .and_then(|(x, y)| lcm(x, y))
        .ok_or_else(|| {
            DurationError::invalid(
                "map size",
                format!("{nx}x{ny} vertices overflow the path length"),
            )
        })?;
    let length = legs as f64 * spacing * SQRT_2;

    log::trace!("pong vertices {nx}x{ny}, {legs} legs, path length {length:.1} arcsec");

    Ok(length / scan.velocity)
}
