//! # Observation duration estimate
//!
//! Entry point of the engine: [`estimate_duration`] picks the calculator matching the backend
//! of an [`ObservationConfig`] and returns a [`DurationEstimate`].
//!
//! ```text
//! ObservationConfig ─▶ estimate_duration ─┬─▶ backends::heterodyne::estimate
//!                                         └─▶ backends::continuum::estimate
//!                                                   │
//!                          scan_pattern ◀───────────┤
//!                          scheduler    ◀───────────┘
//! ```
//!
//! The computation is pure: the same configuration always yields the same estimate, nothing is
//! cached and nothing global is consulted, so it can be called from any number of threads on
//! distinct (or shared) configurations. Intermediate counts are reported through the `log`
//! facade at `debug` level and returned in [`DurationCounts`].
//!
//! ## Example
//!
//! ```rust
//! use ocs_duration::{
//!     duration::estimate_duration,
//!     obs_config::{Backend, ObservationConfig, ObservationSummary, ObservingArea, SequencingParameters},
//! };
//!
//! let config = ObservationConfig {
//!     backend: Some(Backend::Heterodyne),
//!     jos: Some(
//!         SequencingParameters::builder()
//!             .step_time(0.2)
//!             .jos_min(10)
//!             .num_cycles(3)
//!             .steps_btwn_refs(100)
//!             .build()
//!             .unwrap(),
//!     ),
//!     summary: Some(ObservationSummary::new("grid", "pssw", "pointing")),
//!     area: Some(ObservingArea::Zenith),
//!     ..Default::default()
//! };
//!
//! let estimate = estimate_duration(&config).unwrap();
//! assert_eq!(estimate.counts.n_refs, 3);
//! assert!((estimate.seconds - 97.0).abs() < 1e-9);
//! ```

use hifitime::Duration;

use crate::{
    backends::{continuum, heterodyne},
    constants::{Seconds, Steps},
    duration_errors::DurationError,
    obs_config::{Backend, ObservationConfig},
};

/// Intermediate counts behind an estimate, for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DurationCounts {
    /// Dark sequences (continuum backend).
    pub n_darks: u64,
    /// Reference (OFF) visits.
    pub n_refs: u64,
    /// Sequences executed, including references and calibrations.
    pub n_seq: u64,
    /// Calibration visits.
    pub n_cals: u64,
    /// Steps integrated, all sequences included.
    pub total_steps: Steps,
    /// Step time after the hardware quantization correction.
    pub effective_step_time: Seconds,
}

/// Estimated wall-clock duration of an observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationEstimate {
    pub backend: Backend,
    /// Estimated duration in seconds, never negative.
    pub seconds: Seconds,
    pub counts: DurationCounts,
}

impl DurationEstimate {
    /// The estimate as a [`hifitime::Duration`].
    pub fn as_duration(&self) -> Duration {
        Duration::from_seconds(self.seconds)
    }
}

/// Estimate how long an observation takes to execute.
///
/// Arguments
/// -----------------
/// * `config`: the fully assembled observation configuration.
///
/// Return
/// ----------
/// * A [`DurationEstimate`] computed by the heterodyne or continuum calculator, depending on
///   which backend the configuration uses.
///
/// Errors
/// ----------
/// * [`DurationError::MissingCollaborator`] if the backend, or any component required by the
///   selected code path, is absent.
/// * [`DurationError::InvalidParameter`] if the step time is not strictly positive.
/// * [`DurationError::UnrecognizedObservingMode`] / [`DurationError::UnsupportedPattern`] for
///   configurations no calculator covers.
///
/// See also
/// ------------
/// * [`heterodyne::estimate`] – correlator backend.
/// * [`continuum::estimate`] – bolometer backend.
pub fn estimate_duration(config: &ObservationConfig) -> Result<DurationEstimate, DurationError> {
    let backend = config
        .backend
        .ok_or(DurationError::MissingCollaborator("backend"))?;
    config.jos()?.validate()?;

    let estimate = match backend {
        Backend::Heterodyne => heterodyne::estimate(config)?,
        Backend::Continuum => continuum::estimate(config)?,
    };

    log::debug!(
        "{backend} duration {:.1} s ({} seq, {} refs, {} cals, {} darks)",
        estimate.seconds,
        estimate.counts.n_seq,
        estimate.counts.n_refs,
        estimate.counts.n_cals,
        estimate.counts.n_darks
    );
    Ok(estimate)
}
