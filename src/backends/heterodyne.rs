//! # Heterodyne (correlator) duration calculator
//!
//! The calculator first turns the (mapping, switching) combination into a [`StepPlan`]: how
//! many steps are integrated ON source, how many reference or nod visits are made and how long
//! each is, how many sequences are run and how often the telescope moves. Five combinations are
//! supported:
//!
//! | mapping        | switching      | references                                      |
//! |----------------|----------------|-------------------------------------------------|
//! | raster / scan  | pssw or freqsw | one OFF every few rows (pssw only)              |
//! | jiggle         | chop or freqsw | chopped OFF inside the pattern, ABBA/AB nodding |
//! | grid           | freqsw         | none                                            |
//! | grid           | chop           | ABBA/AB nodding                                 |
//! | grid / jiggle  | pssw           | one OFF every few chunks, shared if `shareoff`  |
//!
//! The plan is then repeated at every focus position, calibrations are interleaved, and the
//! step total is converted to seconds with the effective step time before the fixed
//! overheads are added:
//!
//! ```text
//! duration = obs + steps·step + ref_moves·tel_ref + nod_moves·tel_nod + n_seq·seq
//!          + (n_smu − 1)·smu + n_cals·cal
//! ```

use crate::{
    constants::{
        Seconds, Steps, HET_CAL_OVERHEAD, HET_OBS_OVERHEAD, HET_SEQ_OVERHEAD, HET_SMU_OVERHEAD,
        HET_TEL_NOD_OVERHEAD, HET_TEL_REF_OVERHEAD,
    },
    duration::{DurationCounts, DurationEstimate},
    duration_errors::DurationError,
    obs_config::{
        Backend, MappingMode, ObsType, ObservationConfig, ObservationSummary,
        SecondaryMirrorSpec, SequencingParameters, SmuMode, SwitchKind,
    },
    scan_pattern::{map_steps, raster_rows, ScanPattern},
    scheduler::{reference_length, schedule, RefScaling},
    step_time::effective_step_time,
};

/// Step and sequence counts of one pass through all focus positions' worth of integration.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepPlan {
    /// ON-source steps over all cycles.
    pub on_steps: Steps,
    /// Reference (OFF) visits.
    pub n_refs: u64,
    /// Length of one reference visit, or of one nod B beam.
    pub ref_steps: Steps,
    /// Nod B beams.
    pub n_nods: u64,
    pub n_seq: u64,
    pub ntel_ref_moves: u64,
    pub ntel_nod_moves: u64,
    /// Length of an indivisible integration, between which calibrations can be inserted.
    pub unit_steps: Steps,
}

impl StepPlan {
    /// ON steps plus reference and nod integrations.
    pub fn total_steps(&self) -> Steps {
        self.on_steps + self.n_refs as f64 * self.ref_steps + self.n_nods as f64 * self.ref_steps
    }
}

/// ABBA nodding is two A-B pairs per nod set; focus observations use a single AB pair.
fn nod_pairs(summary: &ObservationSummary) -> u64 {
    if summary.is_focus() {
        1
    } else {
        2
    }
}

/// Steps to run the jiggle pattern once, OFF integrations included.
fn jiggle_pattern_steps(smu: &SecondaryMirrorSpec, jos_min: Steps) -> Steps {
    let points = smu.jiggle_points.max(1) as f64;
    match smu.mode {
        SmuMode::ChopJiggle => 2.0 * points * jos_min,
        SmuMode::JiggleChop => {
            let off_chunks = (points / smu.timing.n_jigs_on.max(1) as f64).ceil();
            points * jos_min + off_chunks * smu.timing.n_cyc_off as f64 * jos_min
        }
        SmuMode::Jiggle => points * jos_min,
    }
}

/// A reference visit never integrates fewer than `n_refsamples` steps.
fn min_reference(ref_steps: Steps, jos: &SequencingParameters) -> Steps {
    ref_steps.max(jos.n_refsamples as f64)
}

fn raster_plan(
    config: &ObservationConfig,
    jos: &SequencingParameters,
    summary: &ObservationSummary,
) -> Result<StepPlan, DurationError> {
    let (map, scan) = config
        .area()?
        .map_area()
        .ok_or(DurationError::MissingCollaborator("map area"))?;

    let steps_per_map = map_steps(jos, jos.step_time, map, scan, config.instrument.as_ref())?;
    let pattern: ScanPattern = scan.pattern.parse()?;
    let rows = if pattern.is_raster() {
        if scan.dy <= 0.0 {
            return Err(DurationError::invalid(
                "scan dy",
                format!("must be strictly positive, got {}", scan.dy),
            ));
        }
        raster_rows(map, scan).ceil().max(1.0)
    } else {
        1.0
    };
    let row_steps = steps_per_map / rows;
    let total_rows = rows as u64 * jos.num_cycles as u64;

    let mut plan = StepPlan {
        on_steps: steps_per_map * jos.num_cycles as f64,
        n_seq: total_rows,
        unit_steps: row_steps,
        ..Default::default()
    };

    match summary.switching_mode.kind {
        SwitchKind::Pssw => {
            let row_len = row_steps.ceil() as u64;
            let refs = schedule(total_rows, jos.steps_btwn_refs as u64, row_len, 1);
            // Every raster point integrates a single step
            plan.ref_steps = min_reference(
                reference_length(
                    1.0,
                    row_len * refs.units_per_visit,
                    RefScaling::choose(jos.shareoff, true),
                ),
                jos,
            );
            plan.n_refs = refs.n_visits;
            plan.ntel_ref_moves = if refs.n_visits > 0 {
                (2 * refs.n_visits).saturating_sub(1).max(2)
            } else {
                0
            };
            log::trace!(
                "raster: {total_rows} rows of {row_steps:.1} steps, {} rows per ref",
                refs.units_per_visit
            );
        }
        SwitchKind::FreqSw => {}
        _ => return Err(summary.unrecognized()),
    }
    Ok(plan)
}

fn jiggle_plan(
    config: &ObservationConfig,
    jos: &SequencingParameters,
    summary: &ObservationSummary,
) -> Result<StepPlan, DurationError> {
    let smu = config.smu()?;
    let pattern_steps = jiggle_pattern_steps(smu, jos.jos_min.max(1) as f64);
    let positions = config.area()?.n_offsets() as u64 * jos.num_cycles as u64;

    if summary.switching_mode.kind == SwitchKind::Chop {
        let n_nods = nod_pairs(summary) * jos.num_nod_sets.max(1) as u64 * positions;
        Ok(StepPlan {
            on_steps: pattern_steps * n_nods as f64,
            ref_steps: pattern_steps,
            n_nods,
            n_seq: 2 * n_nods,
            ntel_nod_moves: n_nods,
            unit_steps: pattern_steps,
            ..Default::default()
        })
    } else {
        Ok(StepPlan {
            on_steps: pattern_steps * 2.0 * positions as f64,
            n_seq: positions,
            unit_steps: pattern_steps,
            ..Default::default()
        })
    }
}

fn grid_freqsw_plan(
    config: &ObservationConfig,
    jos: &SequencingParameters,
) -> Result<StepPlan, DurationError> {
    let position_steps = jos.jos_min.max(1) as f64 * jos.chunks_per_position() as f64;
    let positions = config.area()?.n_offsets() as u64 * jos.num_cycles as u64;

    Ok(StepPlan {
        on_steps: position_steps * positions as f64,
        n_seq: positions,
        unit_steps: position_steps,
        ..Default::default()
    })
}

fn grid_chop_plan(
    config: &ObservationConfig,
    jos: &SequencingParameters,
    summary: &ObservationSummary,
) -> Result<StepPlan, DurationError> {
    let position_steps = jos.jos_min.max(1) as f64 * jos.chunks_per_position() as f64;
    let positions = config.area()?.n_offsets() as u64 * jos.num_cycles as u64;
    let n_nods = nod_pairs(summary) * jos.num_nod_sets.max(1) as u64 * positions;

    Ok(StepPlan {
        on_steps: position_steps * n_nods as f64,
        ref_steps: position_steps,
        n_nods,
        n_seq: 2 * n_nods,
        ntel_nod_moves: n_nods,
        unit_steps: position_steps,
        ..Default::default()
    })
}

fn pssw_plan(
    config: &ObservationConfig,
    jos: &SequencingParameters,
    summary: &ObservationSummary,
) -> Result<StepPlan, DurationError> {
    let jos_min = jos.jos_min.max(1) as f64;
    let jiggle_like = summary.mapping_mode == MappingMode::Jiggle;
    let points = if jiggle_like {
        config.smu()?.jiggle_points.max(1) as u64
    } else {
        1
    };

    let chunk_steps = jos_min * points as f64;
    let n_chunks = config.area()?.n_offsets() as u64
        * jos.num_cycles as u64
        * jos.chunks_per_position() as u64;

    // Without a shared OFF every chunk gets its own reference
    let interval = if jos.shareoff {
        jos.steps_btwn_refs as u64
    } else {
        0
    };
    let refs = schedule(n_chunks, interval, chunk_steps.ceil() as u64, 1);
    let ref_steps = min_reference(
        reference_length(
            jos_min,
            refs.units_per_visit * points,
            RefScaling::choose(jos.shareoff, jiggle_like),
        ),
        jos,
    );
    log::trace!(
        "pssw: {n_chunks} chunks of {chunk_steps} steps, {} chunks per ref of {ref_steps} steps",
        refs.units_per_visit
    );

    Ok(StepPlan {
        on_steps: chunk_steps * n_chunks as f64,
        n_refs: refs.n_visits,
        ref_steps,
        n_seq: refs.n_visits + n_chunks,
        ntel_ref_moves: refs.n_visits,
        unit_steps: chunk_steps,
        ..Default::default()
    })
}

/// Convert the observing mode into a [`StepPlan`], before focus repetition and calibrations.
///
/// Errors
/// ----------
/// * [`DurationError::UnrecognizedObservingMode`] for a (mapping, switching) pair outside the
///   five supported combinations.
/// * [`DurationError::MissingCollaborator`] for a jiggle without secondary mirror spec, or a
///   raster without a map area.
/// * [`DurationError::InvalidParameter`] if the step time is not strictly positive.
pub fn step_plan(config: &ObservationConfig) -> Result<StepPlan, DurationError> {
    let jos = config.jos()?;
    jos.validate()?;
    let summary = config.summary()?;

    match (&summary.mapping_mode, &summary.switching_mode.kind) {
        (MappingMode::Raster | MappingMode::Scan, _) => raster_plan(config, jos, summary),
        (MappingMode::Jiggle, SwitchKind::Chop | SwitchKind::FreqSw) => {
            jiggle_plan(config, jos, summary)
        }
        (MappingMode::Grid, SwitchKind::FreqSw) => grid_freqsw_plan(config, jos),
        (MappingMode::Grid, SwitchKind::Chop) => grid_chop_plan(config, jos, summary),
        (MappingMode::Grid | MappingMode::Jiggle, SwitchKind::Pssw) => {
            pssw_plan(config, jos, summary)
        }
        _ => Err(summary.unrecognized()),
    }
}

/// Calibration visits and the extra steps each one costs.
fn calibrations(
    jos: &SequencingParameters,
    summary: &ObservationSummary,
    plan: &StepPlan,
    total_steps: Steps,
) -> (u64, Steps) {
    if matches!(summary.obs_type, ObsType::Pointing | ObsType::Focus) || jos.n_calsamples == 0 {
        return (0, 0.0);
    }

    let n_cals = if jos.steps_btwn_cals == 0 {
        1
    } else {
        let unit = plan.unit_steps.max(1.0).ceil();
        let units = (total_steps / unit).ceil() as u64;
        schedule(units, jos.steps_btwn_cals as u64, unit as u64, 1).n_visits
    };

    // A calibration at the reference position reuses the reference integration
    let ref_visit = if plan.n_refs > 0 { plan.ref_steps } else { 0.0 };
    let cal_len = (jos.n_calsamples as f64).max(ref_visit);
    (n_cals, (cal_len - ref_visit).max(0.0))
}

/// Estimate the duration of a heterodyne observation.
///
/// Arguments
/// -----------------
/// * `config`: configuration providing the sequencing parameters, the observation summary, the
///   observing area and, depending on the mode, the secondary mirror spec and instrument
///   geometry.
///
/// Return
/// ----------
/// * A [`DurationEstimate`] with `n_refs`, `n_seq` and `n_cals` filled in.
///
/// See also
/// ------------
/// * [`step_plan`] – mode-dependent step counts.
/// * [`schedule`] – reference and calibration intervals.
pub fn estimate(config: &ObservationConfig) -> Result<DurationEstimate, DurationError> {
    let jos = config.jos()?;
    jos.validate()?;
    let summary = config.summary()?;
    let step: Seconds = effective_step_time(jos.step_time);

    let plan = step_plan(config)?;

    let n_smu = if summary.is_focus() {
        jos.num_focus_steps.max(1) as u64
    } else {
        1
    };
    let mut total_steps = plan.total_steps() * n_smu as f64;
    let mut n_seq = plan.n_seq * n_smu;
    let ntel_ref_moves = plan.ntel_ref_moves * n_smu;
    let ntel_nod_moves = plan.ntel_nod_moves * n_smu;
    let n_refs = plan.n_refs * n_smu;

    let (n_cals, cal_steps) = calibrations(jos, summary, &plan, total_steps);
    total_steps += n_cals as f64 * cal_steps;
    n_seq += n_cals;

    let seconds = HET_OBS_OVERHEAD
        + total_steps * step
        + ntel_ref_moves as f64 * HET_TEL_REF_OVERHEAD
        + ntel_nod_moves as f64 * HET_TEL_NOD_OVERHEAD
        + n_seq as f64 * HET_SEQ_OVERHEAD
        + (n_smu - 1) as f64 * HET_SMU_OVERHEAD
        + n_cals as f64 * HET_CAL_OVERHEAD;

    log::debug!(
        "heterodyne {}/{}/{}: {:.1} steps, {n_seq} seq, {n_refs} refs, {n_cals} cals, \
         {ntel_ref_moves} ref moves, {ntel_nod_moves} nod moves, {n_smu} smu positions",
        summary.mapping_mode,
        summary.switching_mode,
        summary.obs_type,
        total_steps
    );

    Ok(DurationEstimate {
        backend: Backend::Heterodyne,
        seconds,
        counts: DurationCounts {
            n_darks: 0,
            n_refs,
            n_seq,
            n_cals,
            total_steps,
            effective_step_time: step,
        },
    })
}

#[cfg(test)]
mod heterodyne_test {
    use super::*;
    use crate::obs_config::{ObservingArea, Offset, SmuTiming};

    fn smu(mode: SmuMode, jiggle_points: u32) -> SecondaryMirrorSpec {
        SecondaryMirrorSpec {
            jiggle_points,
            mode,
            timing: SmuTiming {
                n_jigs_on: 4,
                n_cyc_off: 2,
            },
        }
    }

    #[test]
    fn test_jiggle_pattern_steps() {
        assert_eq!(jiggle_pattern_steps(&smu(SmuMode::ChopJiggle, 9), 2.0), 36.0);
        assert_eq!(jiggle_pattern_steps(&smu(SmuMode::Jiggle, 9), 2.0), 18.0);
        // 9 points in chunks of 4: 3 OFF chunks of 2 cycles
        assert_eq!(jiggle_pattern_steps(&smu(SmuMode::JiggleChop, 9), 2.0), 30.0);
    }

    #[test]
    fn test_pssw_grid_plan() {
        let config = ObservationConfig {
            backend: Some(Backend::Heterodyne),
            jos: Some(SequencingParameters {
                step_time: 0.2,
                jos_min: 10,
                num_cycles: 3,
                steps_btwn_refs: 100,
                ..Default::default()
            }),
            summary: Some(ObservationSummary::new("grid", "pssw", "pointing")),
            area: Some(ObservingArea::Zenith),
            ..Default::default()
        };
        let plan = step_plan(&config).unwrap();
        assert_eq!(plan.n_refs, 3);
        assert_eq!(plan.n_seq, 6);
        assert_eq!(plan.on_steps, 30.0);
        assert_eq!(plan.ref_steps, 10.0);
        assert_eq!(plan.ntel_ref_moves, 3);
    }

    #[test]
    fn test_pssw_shared_off() {
        let config = ObservationConfig {
            backend: Some(Backend::Heterodyne),
            jos: Some(SequencingParameters {
                step_time: 0.5,
                jos_min: 10,
                num_cycles: 1,
                steps_btwn_refs: 40,
                shareoff: true,
                ..Default::default()
            }),
            summary: Some(ObservationSummary::new("grid", "pssw", "science")),
            area: Some(ObservingArea::Offsets {
                offsets: vec![Offset { dc1: 0.0, dc2: 0.0 }; 10],
                microsteps: vec![],
            }),
            ..Default::default()
        };
        let plan = step_plan(&config).unwrap();
        // 4 chunks per OFF, 3 OFFs of 10·√4 steps
        assert_eq!(plan.n_refs, 3);
        assert_eq!(plan.ref_steps, 20.0);
        assert_eq!(plan.n_seq, 13);
    }

    fn jiggle_pssw(shareoff: bool) -> ObservationConfig {
        ObservationConfig {
            backend: Some(Backend::Heterodyne),
            jos: Some(SequencingParameters {
                step_time: 0.5,
                jos_min: 4,
                num_cycles: 1,
                steps_btwn_refs: 100,
                shareoff,
                ..Default::default()
            }),
            summary: Some(ObservationSummary::new("jiggle", "pssw", "science")),
            area: Some(ObservingArea::Offsets {
                offsets: vec![Offset { dc1: 0.0, dc2: 0.0 }; 3],
                microsteps: vec![],
            }),
            smu: Some(smu(SmuMode::Jiggle, 9)),
            ..Default::default()
        }
    }

    #[test]
    fn test_pssw_jiggle_reference_length() {
        // Own OFF per pattern: ceil(4·√9)
        let plan = step_plan(&jiggle_pssw(false)).unwrap();
        assert_eq!(plan.on_steps, 108.0);
        assert_eq!(plan.n_refs, 3);
        assert_eq!(plan.ref_steps, 12.0);
        assert_eq!(plan.n_seq, 6);

        // Two 36-step patterns per shared OFF: ceil(4·√18)
        let plan = step_plan(&jiggle_pssw(true)).unwrap();
        assert_eq!(plan.n_refs, 2);
        assert_eq!(plan.ref_steps, (4.0 * 18f64.sqrt()).ceil());
        assert_eq!(plan.ref_steps, 17.0);
        assert_eq!(plan.n_seq, 5);
    }

    #[test]
    fn test_reference_samples_floor() {
        let config = ObservationConfig {
            backend: Some(Backend::Heterodyne),
            jos: Some(SequencingParameters {
                step_time: 0.2,
                jos_min: 10,
                num_cycles: 3,
                n_refsamples: 25,
                ..Default::default()
            }),
            summary: Some(ObservationSummary::new("grid", "pssw", "pointing")),
            area: Some(ObservingArea::Zenith),
            ..Default::default()
        };
        let plan = step_plan(&config).unwrap();
        assert_eq!(plan.ref_steps, 25.0);
        assert_eq!(plan.total_steps(), 30.0 + 3.0 * 25.0);

        // A longer computed reference is kept
        let plan = step_plan(&jiggle_pssw(true)).unwrap();
        assert_eq!(min_reference(plan.ref_steps, &SequencingParameters::default()), 17.0);
    }

    #[test]
    fn test_direct_call_rejects_bad_step_time() {
        let config = ObservationConfig {
            backend: Some(Backend::Heterodyne),
            jos: Some(SequencingParameters {
                step_time: -1.0,
                jos_min: 10,
                ..Default::default()
            }),
            summary: Some(ObservationSummary::new("grid", "pssw", "science")),
            area: Some(ObservingArea::Zenith),
            ..Default::default()
        };
        assert_eq!(
            estimate(&config),
            Err(DurationError::invalid("step_time", "must be strictly positive"))
        );
        assert!(matches!(
            step_plan(&config),
            Err(DurationError::InvalidParameter { name: "step_time", .. })
        ));
    }

    #[test]
    fn test_grid_chop_nodding() {
        let config = ObservationConfig {
            backend: Some(Backend::Heterodyne),
            jos: Some(SequencingParameters {
                step_time: 0.5,
                jos_min: 20,
                num_nod_sets: 1,
                ..Default::default()
            }),
            summary: Some(ObservationSummary::new("grid", "chop", "science")),
            area: Some(ObservingArea::Zenith),
            ..Default::default()
        };
        let plan = step_plan(&config).unwrap();
        assert_eq!(plan.n_nods, 2);
        assert_eq!(plan.n_seq, 4);
        assert_eq!(plan.total_steps(), 80.0);

        let focus = ObservationConfig {
            summary: Some(ObservationSummary::new("grid", "chop", "focus")),
            ..config
        };
        assert_eq!(step_plan(&focus).unwrap().n_nods, 1);
    }

    #[test]
    fn test_unrecognized_combination() {
        let config = ObservationConfig {
            backend: Some(Backend::Heterodyne),
            jos: Some(SequencingParameters::default()),
            summary: Some(ObservationSummary::new("stare", "pssw", "science")),
            area: Some(ObservingArea::Zenith),
            ..Default::default()
        };
        assert_eq!(
            step_plan(&config),
            Err(DurationError::UnrecognizedObservingMode {
                mapping: "stare".into(),
                switching: "pssw".into(),
                obs_type: "science".into(),
            })
        );

        let config = ObservationConfig {
            summary: Some(ObservationSummary::new("grid", "none", "science")),
            ..config
        };
        assert!(matches!(
            step_plan(&config),
            Err(DurationError::UnrecognizedObservingMode { .. })
        ));
    }

    #[test]
    fn test_calibration_cost() {
        let jos = SequencingParameters {
            n_calsamples: 30,
            steps_btwn_cals: 100,
            ..Default::default()
        };
        let summary = ObservationSummary::new("grid", "pssw", "science");
        let plan = StepPlan {
            on_steps: 200.0,
            n_refs: 10,
            ref_steps: 20.0,
            unit_steps: 20.0,
            ..Default::default()
        };
        // 400 steps in 20 units, 5 units between cals
        assert_eq!(calibrations(&jos, &summary, &plan, 400.0), (4, 10.0));

        // Calibration shorter than a reference visit costs no extra steps
        let jos = SequencingParameters {
            n_calsamples: 5,
            ..jos
        };
        assert_eq!(calibrations(&jos, &summary, &plan, 400.0), (4, 0.0));

        let pointing = ObservationSummary::new("grid", "pssw", "pointing");
        assert_eq!(calibrations(&jos, &pointing, &plan, 400.0), (0, 0.0));
    }
}
