//! # Observation configuration model
//!
//! Read-only views over a fully assembled observation configuration. Every value here is
//! produced upstream (usually by [`xml_reader`](crate::obs_config::xml_reader)) and is
//! only consumed by the duration engine, never mutated.
//!
//! ## Structure
//!
//! ```text
//! ObservationConfig
//! ├── backend     (Backend)              heterodyne or continuum
//! ├── jos         (SequencingParameters) step time, cycles, intervals
//! ├── summary     (ObservationSummary)   mapping / switching / type
//! ├── area        (ObservingArea)        map | offsets | skydip | zenith | sky
//! ├── smu         (SecondaryMirrorSpec)  jiggle pattern and chop ordering
//! └── instrument  (InstrumentGeometry)   receptor footprint radius
//! ```
//!
//! Every component is optional: the calculators request the ones their code path needs
//! and fail with [`DurationError::MissingCollaborator`] when one is absent.
//!
//! The observing area is a tagged variant, so "exactly one area kind is active" holds by
//! construction.
//!
//! ## See also
//! ------------
//! * [`SequencingParametersBuilder`] – validated construction of the JOS parameters.
//! * [`estimate_duration`](crate::duration::estimate_duration) – consumer of this model.
pub mod xml_reader;

use std::fmt;

use serde::{Deserialize, Deserializer};

use crate::{
    constants::{ArcSec, Degree, Seconds},
    duration_errors::DurationError,
};

// -------------------------------------------------------------------------------------------------
// Sequencing parameters (JOS)
// -------------------------------------------------------------------------------------------------

/// Timing and repeat parameters controlling how many atomic steps and cycles an observation
/// executes.
///
/// Fields mirror the `JOS_CONFIG` block of an OCS configuration. Counts left at zero in a
/// configuration mean "not used by this observing mode".
///
/// Invariants
/// -----------------
/// * `step_time > 0` and finite (checked by [`SequencingParametersBuilder::build`] and again
///   when a duration is estimated).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SequencingParameters {
    /// Seconds per atomic step.
    #[serde(rename = "STEP_TIME")]
    pub step_time: Seconds,
    #[serde(rename = "NUM_CYCLES")]
    pub num_cycles: u32,
    #[serde(rename = "NUM_NOD_SETS")]
    pub num_nod_sets: u32,
    /// Minimum number of steps in one integration chunk. Values above one also fix the step
    /// count of a scan map segment.
    #[serde(rename = "JOS_MIN")]
    pub jos_min: u32,
    /// Number of `jos_min` chunks integrated on each position.
    #[serde(rename = "JOS_MULT")]
    pub jos_mult: u32,
    #[serde(rename = "STEPS_BTWN_REFS")]
    pub steps_btwn_refs: u32,
    #[serde(rename = "STEPS_BTWN_CALS")]
    pub steps_btwn_cals: u32,
    #[serde(rename = "STEPS_BTWN_DARKS")]
    pub steps_btwn_dark: u32,
    #[serde(rename = "N_CALSAMPLES")]
    pub n_calsamples: u32,
    /// Minimum length in steps of a heterodyne reference visit.
    #[serde(rename = "N_REFSAMPLES")]
    pub n_refsamples: u32,
    #[serde(rename = "NUM_FOCUS_STEPS")]
    pub num_focus_steps: u32,
    /// Whether one OFF integration is shared by several ON positions.
    #[serde(rename = "SHAREOFF", deserialize_with = "deserialize_flag")]
    pub shareoff: bool,
}

impl Default for SequencingParameters {
    fn default() -> Self {
        SequencingParameters {
            step_time: 0.1,
            num_cycles: 1,
            num_nod_sets: 1,
            jos_min: 1,
            jos_mult: 1,
            steps_btwn_refs: 0,
            steps_btwn_cals: 0,
            steps_btwn_dark: 0,
            n_calsamples: 0,
            n_refsamples: 0,
            num_focus_steps: 0,
            shareoff: false,
        }
    }
}

impl SequencingParameters {
    /// Create a new [`SequencingParametersBuilder`] initialized with the default values.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ocs_duration::obs_config::SequencingParameters;
    ///
    /// let jos = SequencingParameters::builder()
    ///     .step_time(0.2)
    ///     .jos_min(10)
    ///     .num_cycles(3)
    ///     .steps_btwn_refs(100)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(jos.num_cycles, 3);
    /// ```
    pub fn builder() -> SequencingParametersBuilder {
        SequencingParametersBuilder::new()
    }

    /// Check the numeric preconditions shared by every calculator.
    ///
    /// Return
    /// ----------
    /// * `Ok(())` when `step_time` is finite and strictly positive.
    /// * [`DurationError::InvalidParameter`] otherwise.
    pub fn validate(&self) -> Result<(), DurationError> {
        if !self.step_time.is_finite() || self.step_time <= 0.0 {
            return Err(DurationError::invalid(
                "step_time",
                format!("must be strictly positive, got {}", self.step_time),
            ));
        }
        Ok(())
    }

    /// Number of `jos_min` chunks per position, never zero.
    pub(crate) fn chunks_per_position(&self) -> u32 {
        self.jos_mult.max(1)
    }
}

/// Fluent builder for [`SequencingParameters`].
pub struct SequencingParametersBuilder {
    params: SequencingParameters,
}

impl Default for SequencingParametersBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SequencingParametersBuilder {
    /// Create a new builder initialized with default values.
    pub fn new() -> Self {
        Self {
            params: SequencingParameters::default(),
        }
    }

    pub fn step_time(mut self, v: Seconds) -> Self {
        self.params.step_time = v;
        self
    }
    pub fn num_cycles(mut self, v: u32) -> Self {
        self.params.num_cycles = v;
        self
    }
    pub fn num_nod_sets(mut self, v: u32) -> Self {
        self.params.num_nod_sets = v;
        self
    }
    pub fn jos_min(mut self, v: u32) -> Self {
        self.params.jos_min = v;
        self
    }
    pub fn jos_mult(mut self, v: u32) -> Self {
        self.params.jos_mult = v;
        self
    }
    pub fn steps_btwn_refs(mut self, v: u32) -> Self {
        self.params.steps_btwn_refs = v;
        self
    }
    pub fn steps_btwn_cals(mut self, v: u32) -> Self {
        self.params.steps_btwn_cals = v;
        self
    }
    pub fn steps_btwn_dark(mut self, v: u32) -> Self {
        self.params.steps_btwn_dark = v;
        self
    }
    pub fn n_calsamples(mut self, v: u32) -> Self {
        self.params.n_calsamples = v;
        self
    }
    pub fn n_refsamples(mut self, v: u32) -> Self {
        self.params.n_refsamples = v;
        self
    }
    pub fn num_focus_steps(mut self, v: u32) -> Self {
        self.params.num_focus_steps = v;
        self
    }
    pub fn shareoff(mut self, v: bool) -> Self {
        self.params.shareoff = v;
        self
    }

    /// Finalize the builder and produce a validated [`SequencingParameters`].
    ///
    /// Errors
    /// ----------
    /// * [`DurationError::InvalidParameter`] if `step_time` is not strictly positive.
    pub fn build(self) -> Result<SequencingParameters, DurationError> {
        self.params.validate()?;
        Ok(self.params)
    }
}

/// Accept `1`/`0`, `true`/`false` and `yes`/`no` for boolean flags.
pub fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let flag = String::deserialize(deserializer)?;
    match flag.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "invalid boolean flag: {other}"
        ))),
    }
}

// -------------------------------------------------------------------------------------------------
// Observation summary
// -------------------------------------------------------------------------------------------------

/// How the sky is sampled.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum MappingMode {
    Scan,
    Raster,
    Jiggle,
    Grid,
    Dream,
    Stare,
    Other(String),
}

impl From<&str> for MappingMode {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "scan" => MappingMode::Scan,
            "raster" => MappingMode::Raster,
            "jiggle" => MappingMode::Jiggle,
            "grid" => MappingMode::Grid,
            "dream" => MappingMode::Dream,
            "stare" => MappingMode::Stare,
            _ => MappingMode::Other(s.trim().to_string()),
        }
    }
}

impl From<String> for MappingMode {
    fn from(s: String) -> Self {
        MappingMode::from(s.as_str())
    }
}

impl fmt::Display for MappingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MappingMode::Scan => "scan",
            MappingMode::Raster => "raster",
            MappingMode::Jiggle => "jiggle",
            MappingMode::Grid => "grid",
            MappingMode::Dream => "dream",
            MappingMode::Stare => "stare",
            MappingMode::Other(s) => s,
        };
        write!(f, "{name}")
    }
}

/// How the background is removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchKind {
    Chop,
    FreqSw,
    Pssw,
    SelfSwitch,
    None,
    Other(String),
}

/// Switching mode, optionally combined with half-wave-plate spinning (`_spin` suffix).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub struct SwitchingMode {
    pub kind: SwitchKind,
    pub spin: bool,
}

impl SwitchingMode {
    pub fn new(kind: SwitchKind) -> Self {
        SwitchingMode { kind, spin: false }
    }
}

impl From<&str> for SwitchingMode {
    fn from(s: &str) -> Self {
        let lower = s.trim().to_ascii_lowercase();
        let (base, spin) = match lower.strip_suffix("_spin") {
            Some(base) => (base, true),
            None => (lower.as_str(), false),
        };
        let kind = match base {
            "chop" => SwitchKind::Chop,
            "freqsw" => SwitchKind::FreqSw,
            "pssw" => SwitchKind::Pssw,
            "self" => SwitchKind::SelfSwitch,
            "none" => SwitchKind::None,
            other => SwitchKind::Other(other.to_string()),
        };
        SwitchingMode { kind, spin }
    }
}

impl From<String> for SwitchingMode {
    fn from(s: String) -> Self {
        SwitchingMode::from(s.as_str())
    }
}

impl fmt::Display for SwitchingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match &self.kind {
            SwitchKind::Chop => "chop",
            SwitchKind::FreqSw => "freqsw",
            SwitchKind::Pssw => "pssw",
            SwitchKind::SelfSwitch => "self",
            SwitchKind::None => "none",
            SwitchKind::Other(s) => s,
        };
        if self.spin {
            write!(f, "{name}_spin")
        } else {
            write!(f, "{name}")
        }
    }
}

/// Purpose of the observation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ObsType {
    Science,
    Pointing,
    Focus,
    Flatfield,
    Noise,
    Setup,
    Skydip,
    ArrayTests,
    Other(String),
}

impl From<&str> for ObsType {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "science" => ObsType::Science,
            "pointing" => ObsType::Pointing,
            "focus" => ObsType::Focus,
            "flatfield" => ObsType::Flatfield,
            "noise" => ObsType::Noise,
            "setup" => ObsType::Setup,
            "skydip" => ObsType::Skydip,
            "array_tests" => ObsType::ArrayTests,
            _ => ObsType::Other(s.trim().to_string()),
        }
    }
}

impl From<String> for ObsType {
    fn from(s: String) -> Self {
        ObsType::from(s.as_str())
    }
}

impl fmt::Display for ObsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObsType::Science => "science",
            ObsType::Pointing => "pointing",
            ObsType::Focus => "focus",
            ObsType::Flatfield => "flatfield",
            ObsType::Noise => "noise",
            ObsType::Setup => "setup",
            ObsType::Skydip => "skydip",
            ObsType::ArrayTests => "array_tests",
            ObsType::Other(s) => s,
        };
        write!(f, "{name}")
    }
}

/// Mapping mode, switching mode and observation type of an observation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObservationSummary {
    #[serde(rename = "MAPPING_MODE")]
    pub mapping_mode: MappingMode,
    #[serde(rename = "SWITCHING_MODE")]
    pub switching_mode: SwitchingMode,
    #[serde(rename = "TYPE")]
    pub obs_type: ObsType,
}

impl ObservationSummary {
    pub fn new(mapping: &str, switching: &str, obs_type: &str) -> Self {
        ObservationSummary {
            mapping_mode: mapping.into(),
            switching_mode: switching.into(),
            obs_type: obs_type.into(),
        }
    }

    pub fn is_focus(&self) -> bool {
        self.obs_type == ObsType::Focus
    }

    /// Error describing this (mapping, switching, type) combination as unsupported.
    pub(crate) fn unrecognized(&self) -> DurationError {
        DurationError::UnrecognizedObservingMode {
            mapping: self.mapping_mode.to_string(),
            switching: self.switching_mode.to_string(),
            obs_type: self.obs_type.to_string(),
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Observing area
// -------------------------------------------------------------------------------------------------

/// Extent of a scanned map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapArea {
    pub width: ArcSec,
    pub height: ArcSec,
    pub position_angle: Degree,
}

/// Scan parameters of a map area.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanSpec {
    /// Pattern name as written in the configuration (e.g. `RASTER`, `PONG`, `DAISY`).
    pub pattern: String,
    /// Row spacing (arcsec).
    pub dy: ArcSec,
    /// Scan speed (arcsec/s).
    pub velocity: f64,
    /// Scan position angles, cycled through by successive maps.
    pub position_angles: Vec<Degree>,
}

/// Tangent-plane pointing offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Offset {
    pub dc1: ArcSec,
    pub dc2: ArcSec,
}

/// Skydip definition: either continuous at `velocity` or discrete at each elevation.
#[derive(Debug, Clone, PartialEq)]
pub struct Skydip {
    pub elevations: Vec<Degree>,
    /// Elevation scan speed (arcsec/s), absent for discrete skydips.
    pub velocity: Option<f64>,
}

/// Region of sky covered by the observation. Exactly one kind is active.
#[derive(Debug, Clone, PartialEq)]
pub enum ObservingArea {
    MapArea { map: MapArea, scan: ScanSpec },
    Offsets {
        offsets: Vec<Offset>,
        microsteps: Vec<Offset>,
    },
    Skydip(Skydip),
    Zenith,
    Sky,
}

impl ObservingArea {
    /// Number of pointing positions visited; one for anything but an offset list.
    pub fn n_offsets(&self) -> u32 {
        match self {
            ObservingArea::Offsets { offsets, .. } => offsets.len().max(1) as u32,
            _ => 1,
        }
    }

    /// Number of micro-steps per position; one when none are defined.
    pub fn n_microsteps(&self) -> u32 {
        match self {
            ObservingArea::Offsets { microsteps, .. } => microsteps.len().max(1) as u32,
            _ => 1,
        }
    }

    pub fn map_area(&self) -> Option<(&MapArea, &ScanSpec)> {
        match self {
            ObservingArea::MapArea { map, scan } => Some((map, scan)),
            _ => None,
        }
    }

    pub fn skydip(&self) -> Option<&Skydip> {
        match self {
            ObservingArea::Skydip(skydip) => Some(skydip),
            _ => None,
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Secondary mirror and instrument
// -------------------------------------------------------------------------------------------------

/// Ordering of chopping and jiggling on the secondary mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmuMode {
    /// Chop at every jiggle position: ON and OFF for each point.
    ChopJiggle,
    /// Jiggle `N_JIGS_ON` points, then chop off for `N_CYC_OFF`.
    JiggleChop,
    /// Jiggle only, no OFF.
    Jiggle,
}

/// Timing of a jiggle-chop pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SmuTiming {
    #[serde(rename = "N_JIGS_ON")]
    pub n_jigs_on: u32,
    #[serde(rename = "N_CYC_OFF")]
    pub n_cyc_off: u32,
}

impl Default for SmuTiming {
    fn default() -> Self {
        SmuTiming {
            n_jigs_on: 1,
            n_cyc_off: 1,
        }
    }
}

/// Secondary mirror setup for jiggle observations.
#[derive(Debug, Clone, PartialEq)]
pub struct SecondaryMirrorSpec {
    pub jiggle_points: u32,
    pub mode: SmuMode,
    pub timing: SmuTiming,
}

/// Receptor array footprint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstrumentGeometry {
    pub array_radius: ArcSec,
}

/// Which backend records the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Correlator-based spectral line backend.
    Heterodyne,
    /// Bolometer imaging array.
    Continuum,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Heterodyne => write!(f, "heterodyne"),
            Backend::Continuum => write!(f, "continuum"),
        }
    }
}

/// A fully assembled observation configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationConfig {
    pub backend: Option<Backend>,
    pub jos: Option<SequencingParameters>,
    pub summary: Option<ObservationSummary>,
    pub area: Option<ObservingArea>,
    pub smu: Option<SecondaryMirrorSpec>,
    pub instrument: Option<InstrumentGeometry>,
}

impl ObservationConfig {
    pub fn jos(&self) -> Result<&SequencingParameters, DurationError> {
        self.jos
            .as_ref()
            .ok_or(DurationError::MissingCollaborator("sequencing parameters"))
    }

    pub fn summary(&self) -> Result<&ObservationSummary, DurationError> {
        self.summary
            .as_ref()
            .ok_or(DurationError::MissingCollaborator("observation summary"))
    }

    pub fn area(&self) -> Result<&ObservingArea, DurationError> {
        self.area
            .as_ref()
            .ok_or(DurationError::MissingCollaborator("observing area"))
    }

    pub fn smu(&self) -> Result<&SecondaryMirrorSpec, DurationError> {
        self.smu
            .as_ref()
            .ok_or(DurationError::MissingCollaborator("secondary mirror spec"))
    }
}

#[cfg(test)]
mod obs_config_test {
    use super::*;

    #[test]
    fn test_switching_mode_spin_suffix() {
        let mode = SwitchingMode::from("PSSW_spin");
        assert_eq!(mode.kind, SwitchKind::Pssw);
        assert!(mode.spin);
        assert_eq!(mode.to_string(), "pssw_spin");

        let mode = SwitchingMode::from("freqsw");
        assert_eq!(mode.kind, SwitchKind::FreqSw);
        assert!(!mode.spin);
    }

    #[test]
    fn test_unknown_modes_are_kept() {
        assert_eq!(
            MappingMode::from("zigzag"),
            MappingMode::Other("zigzag".into())
        );
        assert_eq!(ObsType::from("Pointing"), ObsType::Pointing);
        assert_eq!(ObsType::from("weird").to_string(), "weird");
    }

    #[test]
    fn test_builder_rejects_bad_step_time() {
        let err = SequencingParameters::builder().step_time(0.0).build();
        assert_eq!(
            err,
            Err(DurationError::invalid("step_time", "must be strictly positive"))
        );

        let err = SequencingParameters::builder().step_time(f64::NAN).build();
        assert!(err.is_err());

        let jos = SequencingParameters::builder()
            .step_time(0.5)
            .jos_mult(0)
            .build()
            .unwrap();
        assert_eq!(jos.chunks_per_position(), 1);
    }

    #[test]
    fn test_area_counts() {
        let area = ObservingArea::Offsets {
            offsets: vec![
                Offset { dc1: 0.0, dc2: 0.0 },
                Offset { dc1: 30.0, dc2: 0.0 },
            ],
            microsteps: vec![],
        };
        assert_eq!(area.n_offsets(), 2);
        assert_eq!(area.n_microsteps(), 1);
        assert_eq!(ObservingArea::Zenith.n_offsets(), 1);
        assert!(ObservingArea::Sky.map_area().is_none());
    }

    #[test]
    fn test_missing_collaborators() {
        let config = ObservationConfig::default();
        assert_eq!(
            config.jos(),
            Err(DurationError::MissingCollaborator("sequencing parameters"))
        );
        assert_eq!(
            config.smu(),
            Err(DurationError::MissingCollaborator("secondary mirror spec"))
        );
    }
}
