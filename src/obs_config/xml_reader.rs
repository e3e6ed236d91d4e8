//! # OCS configuration reader
//!
//! Deserialize the parts of an OCS XML configuration used by the duration engine into an
//! [`ObservationConfig`].
//!
//! ```xml
//! <OCS_CONFIG>
//!   <INSTRUMENT NAME="HARP" BACKEND="ACSIS" ARRAY_RADIUS="60"/>
//!   <JOS_CONFIG>
//!     <STEP_TIME>0.5</STEP_TIME>
//!     <JOS_MIN>10</JOS_MIN>
//!     <SHAREOFF>1</SHAREOFF>
//!   </JOS_CONFIG>
//!   <OBS_SUMMARY>
//!     <MAPPING_MODE>grid</MAPPING_MODE>
//!     <SWITCHING_MODE>pssw</SWITCHING_MODE>
//!     <TYPE>science</TYPE>
//!   </OBS_SUMMARY>
//!   <OBSAREA>
//!     <OFFSET DC1="0" DC2="0"/>
//!     <OFFSET DC1="30" DC2="0"/>
//!   </OBSAREA>
//! </OCS_CONFIG>
//! ```
//!
//! The `OBSAREA` block must hold exactly one of: `MAP` + `SCAN`, a list of `OFFSET` (with
//! optional `MS_OFFSET` micro-steps), `SKYDIP`, `ZENITH` or `SKY`.
//!
//! Old configurations describe a scan by its `REVERSAL` flag instead of a pattern name. These
//! are normalized here, so the engine only sees modern pattern names:
//!
//! | REVERSAL | TYPE       | pattern                  |
//! |----------|------------|--------------------------|
//! | `NO`     | any        | `RASTER`                 |
//! | `YES`    | `DISCRETE` | `DISCRETE_BOUSTROPHEDON` |
//! | `YES`    | other      | `BOUSTROPHEDON`          |

use camino::Utf8Path;
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::{
    constants::{ArcSec, Degree},
    duration_errors::DurationError,
    obs_config::{
        deserialize_flag, Backend, InstrumentGeometry, MapArea, ObservationConfig,
        ObservationSummary, ObservingArea, Offset, ScanSpec, SecondaryMirrorSpec,
        SequencingParameters, Skydip, SmuMode, SmuTiming,
    },
};

#[derive(Debug, Deserialize)]
struct OcsConfig {
    #[serde(rename = "INSTRUMENT")]
    instrument: Option<InstrumentXml>,
    #[serde(rename = "JOS_CONFIG")]
    jos: Option<SequencingParameters>,
    #[serde(rename = "OBS_SUMMARY")]
    summary: Option<ObservationSummary>,
    #[serde(rename = "OBSAREA")]
    area: Option<ObsAreaXml>,
    #[serde(rename = "SECONDARY")]
    secondary: Option<SecondaryXml>,
}

#[derive(Debug, Deserialize)]
struct InstrumentXml {
    #[serde(rename = "@BACKEND")]
    backend: String,
    #[serde(rename = "@ARRAY_RADIUS")]
    array_radius: Option<ArcSec>,
}

#[derive(Debug, Deserialize)]
struct Marker {}

#[derive(Debug, Deserialize)]
struct ObsAreaXml {
    #[serde(rename = "MAP")]
    map: Option<MapXml>,
    #[serde(rename = "SCAN")]
    scan: Option<ScanXml>,
    #[serde(rename = "OFFSET", default)]
    offsets: Vec<OffsetXml>,
    #[serde(rename = "MS_OFFSET", default)]
    microsteps: Vec<OffsetXml>,
    #[serde(rename = "SKYDIP")]
    skydip: Option<SkydipXml>,
    #[serde(rename = "ZENITH")]
    zenith: Option<Marker>,
    #[serde(rename = "SKY")]
    sky: Option<Marker>,
}

#[derive(Debug, Deserialize)]
struct MapXml {
    #[serde(rename = "@WIDTH")]
    width: ArcSec,
    #[serde(rename = "@HEIGHT")]
    height: ArcSec,
    #[serde(rename = "@PA", default)]
    position_angle: Degree,
}

#[derive(Debug, Deserialize)]
struct ScanXml {
    #[serde(rename = "@VELOCITY")]
    velocity: f64,
    #[serde(rename = "@DY", default)]
    dy: ArcSec,
    #[serde(rename = "@PATTERN")]
    pattern: Option<String>,
    #[serde(rename = "@REVERSAL", default, deserialize_with = "deserialize_flag")]
    reversal: bool,
    #[serde(rename = "@TYPE")]
    scan_type: Option<String>,
    #[serde(rename = "PA", default)]
    position_angles: Vec<Degree>,
}

#[derive(Debug, Deserialize)]
struct OffsetXml {
    #[serde(rename = "@DC1")]
    dc1: ArcSec,
    #[serde(rename = "@DC2")]
    dc2: ArcSec,
}

impl From<OffsetXml> for Offset {
    fn from(o: OffsetXml) -> Self {
        Offset {
            dc1: o.dc1,
            dc2: o.dc2,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SkydipXml {
    #[serde(rename = "@VELOCITY")]
    velocity: Option<f64>,
    #[serde(rename = "ELEVATION", default)]
    elevations: Vec<Degree>,
}

#[derive(Debug, Deserialize)]
struct SecondaryXml {
    #[serde(rename = "JIGGLE_CHOP")]
    jiggle_chop: Option<JiggleChopXml>,
}

#[derive(Debug, Deserialize)]
struct JiggleChopXml {
    #[serde(rename = "@MODE")]
    mode: SmuMode,
    #[serde(rename = "@N_JIG_POINTS")]
    jiggle_points: u32,
    #[serde(rename = "TIMING", default)]
    timing: SmuTiming,
}

fn parse_backend(name: &str) -> Result<Backend, DurationError> {
    match name.trim().to_ascii_uppercase().as_str() {
        "ACSIS" | "HETERODYNE" => Ok(Backend::Heterodyne),
        "SCUBA2" | "SCUBA-2" | "CONTINUUM" => Ok(Backend::Continuum),
        other => Err(DurationError::XmlParsingError(format!(
            "unknown backend {other}"
        ))),
    }
}

/// Modern pattern name of a `SCAN` element.
fn scan_pattern_name(scan: &ScanXml) -> Result<String, DurationError> {
    if let Some(pattern) = &scan.pattern {
        return Ok(pattern.trim().to_ascii_uppercase());
    }

    let discrete = scan
        .scan_type
        .as_deref()
        .is_some_and(|t| t.eq_ignore_ascii_case("DISCRETE"));
    let pattern = match (scan.reversal, discrete) {
        (false, _) => "RASTER",
        (true, true) => "DISCRETE_BOUSTROPHEDON",
        (true, false) => "BOUSTROPHEDON",
    };
    Ok(pattern.to_string())
}

impl TryFrom<ObsAreaXml> for ObservingArea {
    type Error = DurationError;

    fn try_from(area: ObsAreaXml) -> Result<Self, Self::Error> {
        let groups = [
            area.map.is_some() || area.scan.is_some(),
            !area.offsets.is_empty(),
            area.skydip.is_some(),
            area.zenith.is_some(),
            area.sky.is_some(),
        ];
        let n_groups = groups.iter().filter(|present| **present).count();
        if n_groups != 1 {
            return Err(DurationError::InvalidObservingArea(format!(
                "expected exactly one area kind, found {n_groups}"
            )));
        }

        if let Some(skydip) = area.skydip {
            return Ok(ObservingArea::Skydip(Skydip {
                elevations: skydip.elevations,
                velocity: skydip.velocity,
            }));
        }
        if area.zenith.is_some() {
            return Ok(ObservingArea::Zenith);
        }
        if area.sky.is_some() {
            return Ok(ObservingArea::Sky);
        }
        if !area.offsets.is_empty() {
            return Ok(ObservingArea::Offsets {
                offsets: area.offsets.into_iter().map(Offset::from).collect(),
                microsteps: area.microsteps.into_iter().map(Offset::from).collect(),
            });
        }

        match (area.map, area.scan) {
            (Some(map), Some(scan)) => Ok(ObservingArea::MapArea {
                map: MapArea {
                    width: map.width,
                    height: map.height,
                    position_angle: map.position_angle,
                },
                scan: ScanSpec {
                    pattern: scan_pattern_name(&scan)?,
                    dy: scan.dy,
                    velocity: scan.velocity,
                    position_angles: scan.position_angles,
                },
            }),
            (Some(_), None) => Err(DurationError::InvalidObservingArea(
                "MAP without SCAN".into(),
            )),
            _ => Err(DurationError::InvalidObservingArea(
                "SCAN without MAP".into(),
            )),
        }
    }
}

/// Parse an OCS configuration held in a string.
///
/// Arguments
/// -----------------
/// * `xml`: the XML document.
///
/// Return
/// ----------
/// * The [`ObservationConfig`]; components missing from the document are left as `None`.
///
/// Errors
/// ----------
/// * [`DurationError::XmlParsingError`] for malformed XML or an unknown backend.
/// * [`DurationError::InvalidObservingArea`] when the `OBSAREA` block is ambiguous.
pub fn parse_ocs_config(xml: &str) -> Result<ObservationConfig, DurationError> {
    let ocs: OcsConfig = from_str(xml)?;

    let (backend, instrument) = match ocs.instrument {
        Some(inst) => (
            Some(parse_backend(&inst.backend)?),
            inst.array_radius
                .map(|array_radius| InstrumentGeometry { array_radius }),
        ),
        None => (None, None),
    };

    let smu = ocs
        .secondary
        .and_then(|secondary| secondary.jiggle_chop)
        .map(|jc| SecondaryMirrorSpec {
            jiggle_points: jc.jiggle_points,
            mode: jc.mode,
            timing: jc.timing,
        });

    Ok(ObservationConfig {
        backend,
        jos: ocs.jos,
        summary: ocs.summary,
        area: ocs.area.map(ObservingArea::try_from).transpose()?,
        smu,
        instrument,
    })
}

/// Read and parse an OCS configuration file.
///
/// See also
/// ------------
/// * [`parse_ocs_config`] – the parser applied to the file content.
pub fn read_ocs_config(path: &Utf8Path) -> Result<ObservationConfig, DurationError> {
    let xml = std::fs::read_to_string(path)?;
    parse_ocs_config(&xml)
}
