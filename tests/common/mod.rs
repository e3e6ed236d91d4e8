#![allow(dead_code)]

use ocs_duration::obs_config::{
    Backend, InstrumentGeometry, MapArea, ObservationConfig, ObservationSummary, ObservingArea,
    Offset, ScanSpec, SecondaryMirrorSpec, SequencingParameters, SmuMode, SmuTiming,
};

pub fn heterodyne(
    summary: (&str, &str, &str),
    jos: SequencingParameters,
    area: ObservingArea,
) -> ObservationConfig {
    ObservationConfig {
        backend: Some(Backend::Heterodyne),
        jos: Some(jos),
        summary: Some(ObservationSummary::new(summary.0, summary.1, summary.2)),
        area: Some(area),
        smu: Some(SecondaryMirrorSpec {
            jiggle_points: 9,
            mode: SmuMode::ChopJiggle,
            timing: SmuTiming::default(),
        }),
        instrument: Some(InstrumentGeometry { array_radius: 15.0 }),
    }
}

pub fn continuum(
    summary: (&str, &str, &str),
    jos: SequencingParameters,
    area: ObservingArea,
) -> ObservationConfig {
    ObservationConfig {
        backend: Some(Backend::Continuum),
        jos: Some(jos),
        summary: Some(ObservationSummary::new(summary.0, summary.1, summary.2)),
        area: Some(area),
        smu: None,
        instrument: Some(InstrumentGeometry { array_radius: 300.0 }),
    }
}

pub fn map_area(pattern: &str, width: f64, height: f64, dy: f64, velocity: f64) -> ObservingArea {
    ObservingArea::MapArea {
        map: MapArea {
            width,
            height,
            position_angle: 0.0,
        },
        scan: ScanSpec {
            pattern: pattern.into(),
            dy,
            velocity,
            position_angles: vec![0.0],
        },
    }
}

pub fn offsets(n: usize) -> ObservingArea {
    ObservingArea::Offsets {
        offsets: (0..n)
            .map(|i| Offset {
                dc1: 30.0 * i as f64,
                dc2: 0.0,
            })
            .collect(),
        microsteps: vec![],
    }
}
