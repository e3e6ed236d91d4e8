//! # Scan-pattern geometry
//!
//! Resolve a named scan pattern and its map parameters into the number of atomic steps
//! needed to cover the map once.
//!
//! ## Patterns
//!
//! | family      | names                                                    | steps |
//! |-------------|----------------------------------------------------------|-------|
//! | raster      | `RASTER`, `BOUSTROPHEDON`, `DISCRETE_BOUSTROPHEDON`      | padded map area / sample area |
//! | PONG        | `PONG`, `SQUARE_PONG`, `CURVY_PONG`, `ROUNDED_PONG`, `LISSAJOUS` | [`pong::pattern_duration`] / step time |
//! | ellipse     | `ELLIPSE`                                                | `round(2πr / v / step) + 1` |
//! | daisy       | `DAISY`, `CV_DAISY`                                      | `round(2π/Ω / step) + 1` |
//!
//! Raster maps are padded along their longer side by the receptor array diameter and a
//! fixed turnaround margin, so they need the [`InstrumentGeometry`].
//!
//! An explicit step budget (`jos_min > 1`) always takes precedence over the geometry; see
//! [`map_steps`].
pub mod pong;

use std::str::FromStr;

use crate::{
    constants::{
        ArcSec, Seconds, Steps, DAISY_RATE_CORRECTION, DPI, SCAN_TURNAROUND_MARGIN,
    },
    duration_errors::DurationError,
    obs_config::{InstrumentGeometry, MapArea, ScanSpec, SequencingParameters},
};

/// Recognised scan patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPattern {
    Raster,
    Boustrophedon,
    DiscreteBoustrophedon,
    Pong,
    SquarePong,
    CurvyPong,
    RoundedPong,
    Lissajous,
    Ellipse,
    Daisy,
    CvDaisy,
}

impl FromStr for ScanPattern {
    type Err = DurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RASTER" => Ok(ScanPattern::Raster),
            "BOUSTROPHEDON" => Ok(ScanPattern::Boustrophedon),
            "DISCRETE_BOUSTROPHEDON" => Ok(ScanPattern::DiscreteBoustrophedon),
            "PONG" => Ok(ScanPattern::Pong),
            "SQUARE_PONG" => Ok(ScanPattern::SquarePong),
            "CURVY_PONG" => Ok(ScanPattern::CurvyPong),
            "ROUNDED_PONG" => Ok(ScanPattern::RoundedPong),
            "LISSAJOUS" => Ok(ScanPattern::Lissajous),
            "ELLIPSE" => Ok(ScanPattern::Ellipse),
            "DAISY" => Ok(ScanPattern::Daisy),
            "CV_DAISY" => Ok(ScanPattern::CvDaisy),
            _ => Err(DurationError::UnsupportedPattern(s.to_string())),
        }
    }
}

impl ScanPattern {
    pub fn is_raster(&self) -> bool {
        matches!(
            self,
            ScanPattern::Raster | ScanPattern::Boustrophedon | ScanPattern::DiscreteBoustrophedon
        )
    }

    pub fn is_pong(&self) -> bool {
        matches!(
            self,
            ScanPattern::Pong
                | ScanPattern::SquarePong
                | ScanPattern::CurvyPong
                | ScanPattern::RoundedPong
                | ScanPattern::Lissajous
        )
    }
}

/// Row layout of a raster map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterGeometry {
    /// Scanned side, padded by the array diameter and the turnaround margin (arcsec).
    pub row_length: ArcSec,
    /// Number of rows needed to cover the other side. Fractional.
    pub rows: f64,
    /// Steps spent on one row.
    pub steps_per_row: Steps,
}

impl RasterGeometry {
    /// Steps to cover the whole map once: padded map area over the area sampled per step.
    pub fn steps(&self) -> Steps {
        self.rows * self.steps_per_row
    }
}

fn check_positive(name: &'static str, value: f64) -> Result<(), DurationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(DurationError::invalid(
            name,
            format!("must be strictly positive, got {value}"),
        ));
    }
    Ok(())
}

fn check_map(map: &MapArea, scan: &ScanSpec, step_time: Seconds) -> Result<(), DurationError> {
    check_positive("map width", map.width)?;
    check_positive("map height", map.height)?;
    check_positive("scan velocity", scan.velocity)?;
    check_positive("step_time", step_time)
}

/// Number of rows across the shorter side of a raster map. Fractional.
pub fn raster_rows(map: &MapArea, scan: &ScanSpec) -> f64 {
    map.width.min(map.height) / scan.dy
}

/// Lay out a raster map in rows.
///
/// Arguments
/// -----------------
/// * `map`, `scan`: map extent and scan parameters.
/// * `step_time`: seconds per step.
/// * `geometry`: receptor footprint, required to pad the scanned side.
///
/// Return
/// ----------
/// * The [`RasterGeometry`], or [`DurationError::MissingCollaborator`] without instrument
///   geometry.
pub fn raster_geometry(
    map: &MapArea,
    scan: &ScanSpec,
    step_time: Seconds,
    geometry: Option<&InstrumentGeometry>,
) -> Result<RasterGeometry, DurationError> {
    check_map(map, scan, step_time)?;
    check_positive("scan dy", scan.dy)?;
    let radius = geometry
        .ok_or(DurationError::MissingCollaborator("instrument geometry"))?
        .array_radius;

    let padding = 2.0 * radius + SCAN_TURNAROUND_MARGIN;
    let row_length = map.width.max(map.height) + padding;

    let raster = RasterGeometry {
        row_length,
        rows: raster_rows(map, scan),
        steps_per_row: row_length / (scan.velocity * step_time),
    };
    log::trace!(
        "raster: row length {:.1} arcsec, {:.2} rows of {:.1} steps",
        raster.row_length,
        raster.rows,
        raster.steps_per_row
    );
    Ok(raster)
}

/// Number of steps needed to cover a scanned map once.
///
/// Arguments
/// -----------------
/// * `pattern`: pattern name from the configuration.
/// * `map`: map extent, `width` and `height` strictly positive.
/// * `scan`: scan parameters, `velocity` strictly positive.
/// * `step_time`: seconds per step, strictly positive.
/// * `geometry`: receptor footprint, only needed by the raster family.
///
/// Return
/// ----------
/// * The step count. Raster and PONG counts are fractional, ellipse and daisy counts are
///   whole numbers.
///
/// Errors
/// ----------
/// * [`DurationError::UnsupportedPattern`] for an unknown pattern name.
/// * [`DurationError::InvalidParameter`] for a non-positive dimension, velocity or step time.
/// * [`DurationError::MissingCollaborator`] for a raster without instrument geometry.
pub fn steps_per_map(
    pattern: &str,
    map: &MapArea,
    scan: &ScanSpec,
    step_time: Seconds,
    geometry: Option<&InstrumentGeometry>,
) -> Result<Steps, DurationError> {
    let pattern: ScanPattern = pattern.parse()?;
    check_map(map, scan, step_time)?;

    let steps = if pattern.is_raster() {
        raster_geometry(map, scan, step_time, geometry)?.steps()
    } else if pattern.is_pong() {
        pong::pattern_duration(map, scan)? / step_time
    } else if pattern == ScanPattern::Ellipse {
        let radius = ((map.width.powi(2) + map.height.powi(2)) / 2.0).sqrt();
        let duration = DPI * radius / scan.velocity;
        (duration / step_time).round() + 1.0
    } else {
        check_positive("scan dy", scan.dy)?;
        let r0 = (map.width + map.height) / 4.0;
        let omega = (scan.velocity / scan.dy) / r0;
        let duration = DPI / (omega / DAISY_RATE_CORRECTION);
        (duration / step_time).round() + 1.0
    };

    log::trace!("{pattern:?}: {steps:.1} steps per map");
    Ok(steps)
}

/// Steps in one map segment, honouring an explicit step budget.
///
/// A `jos_min` above one fixes the segment length and wins over the geometry. `step_time` is
/// the step time the caller converts with, which may differ from the nominal `jos.step_time`.
pub fn map_steps(
    jos: &SequencingParameters,
    step_time: Seconds,
    map: &MapArea,
    scan: &ScanSpec,
    geometry: Option<&InstrumentGeometry>,
) -> Result<Steps, DurationError> {
    if jos.jos_min > 1 {
        return Ok(jos.jos_min as f64);
    }
    steps_per_map(&scan.pattern, map, scan, step_time, geometry)
}

#[cfg(test)]
mod scan_pattern_test {
    use super::*;
    use approx::assert_relative_eq;

    fn map(width: f64, height: f64) -> MapArea {
        MapArea {
            width,
            height,
            position_angle: 0.0,
        }
    }

    fn scan(pattern: &str, dy: f64, velocity: f64) -> ScanSpec {
        ScanSpec {
            pattern: pattern.into(),
            dy,
            velocity,
            position_angles: vec![0.0],
        }
    }

    const HARP: InstrumentGeometry = InstrumentGeometry { array_radius: 15.0 };

    #[test]
    fn test_raster_steps() {
        let steps = steps_per_map(
            "RASTER",
            &map(120.0, 120.0),
            &scan("RASTER", 2.0, 30.0),
            0.1,
            Some(&HARP),
        )
        .unwrap();
        assert_relative_eq!(steps, 4200.0, epsilon = 1e-6);

        let raster =
            raster_geometry(&map(120.0, 120.0), &scan("RASTER", 2.0, 30.0), 0.1, Some(&HARP))
                .unwrap();
        assert_relative_eq!(raster.row_length, 210.0);
        assert_relative_eq!(raster.rows, 60.0);
        assert_relative_eq!(raster.steps_per_row, 70.0, epsilon = 1e-9);
    }

    #[test]
    fn test_raster_pads_longer_side() {
        let raster = raster_geometry(
            &map(100.0, 400.0),
            &scan("BOUSTROPHEDON", 10.0, 50.0),
            0.5,
            Some(&HARP),
        )
        .unwrap();
        assert_relative_eq!(raster.row_length, 490.0);
        assert_relative_eq!(raster.rows, 10.0);
    }

    #[test]
    fn test_raster_needs_instrument() {
        let err = steps_per_map(
            "raster",
            &map(120.0, 120.0),
            &scan("raster", 2.0, 30.0),
            0.1,
            None,
        );
        assert_eq!(
            err,
            Err(DurationError::MissingCollaborator("instrument geometry"))
        );
    }

    #[test]
    fn test_ellipse_steps() {
        let steps = steps_per_map(
            "ELLIPSE",
            &map(100.0, 60.0),
            &scan("ELLIPSE", 0.0, 10.0),
            1.0,
            None,
        )
        .unwrap();
        assert_eq!(steps, 53.0);
    }

    #[test]
    fn test_daisy_steps() {
        let steps = steps_per_map(
            "CV_DAISY",
            &map(120.0, 120.0),
            &scan("CV_DAISY", 3.0, 30.0),
            0.5,
            None,
        )
        .unwrap();
        assert_eq!(steps, 763.0);
    }

    #[test]
    fn test_pong_steps() {
        let steps = steps_per_map(
            "curvy_pong",
            &map(100.0, 100.0),
            &scan("CURVY_PONG", 10.0, 50.0),
            0.1,
            None,
        )
        .unwrap();
        assert_relative_eq!(steps, 576.0, epsilon = 1e-6);
    }

    #[test]
    fn test_unknown_pattern() {
        let err = steps_per_map(
            "SPIRAL",
            &map(100.0, 100.0),
            &scan("SPIRAL", 10.0, 50.0),
            0.1,
            None,
        );
        assert_eq!(err, Err(DurationError::UnsupportedPattern("SPIRAL".into())));
    }

    #[test]
    fn test_invalid_parameters() {
        let err = steps_per_map(
            "ELLIPSE",
            &map(100.0, 60.0),
            &scan("ELLIPSE", 0.0, 0.0),
            1.0,
            None,
        );
        assert_eq!(
            err,
            Err(DurationError::invalid("scan velocity", "must be strictly positive"))
        );

        let err = steps_per_map(
            "ELLIPSE",
            &map(-1.0, 60.0),
            &scan("ELLIPSE", 0.0, 10.0),
            1.0,
            None,
        );
        assert_eq!(
            err,
            Err(DurationError::invalid("map width", "must be strictly positive"))
        );
    }

    #[test]
    fn test_step_budget_wins_over_geometry() {
        let jos = SequencingParameters {
            jos_min: 500,
            step_time: 0.1,
            ..Default::default()
        };
        // No instrument geometry: the raster would fail if it were computed
        let steps = map_steps(
            &jos,
            jos.step_time,
            &map(120.0, 120.0),
            &scan("RASTER", 2.0, 30.0),
            None,
        )
        .unwrap();
        assert_eq!(steps, 500.0);

        let jos = SequencingParameters {
            jos_min: 1,
            step_time: 1.0,
            ..Default::default()
        };
        let steps = map_steps(
            &jos,
            jos.step_time,
            &map(100.0, 60.0),
            &scan("ELLIPSE", 0.0, 10.0),
            None,
        )
        .unwrap();
        assert_eq!(steps, 53.0);
    }
}
