//! # Continuum (bolometer array) duration calculator
//!
//! A continuum observation is a series of science sequences separated by dark sequences.
//! The observation type decides how many of each are run and how long a science sequence is:
//!
//! | type                     | n_darks                      | n_seq                          | steps per seq |
//! |--------------------------|------------------------------|--------------------------------|---------------|
//! | skydip (scan)            | 1                            | 1                              | elevation range / speed |
//! | skydip (discrete)        | elevations                   | elevations                     | `jos_min` |
//! | flatfield                | 0                            | `2·num_cycles + 1`             | `n_calsamples` |
//! | noise                    | n_seq                        | `num_cycles`                   | `jos_min` |
//! | setup                    | 1                            | 1                              | 240 s |
//! | stare / dream            | `ceil(n_seq / seq_per_dark)` | offsets × microsteps × cycles  | `jos_min` |
//! | scan                     | `ceil(maps / maps_per_dark)` | n_darks                        | map steps × maps / n_seq |
//!
//! Focus observations repeat every science sequence at each focus position.
//!
//! ```text
//! duration = 20 s + 2 s·(n_darks + n_seq) + steps_per_seq·step·n_seq + n_darks·n_calsamples·step
//! ```
//!
//! where `step` is the effective step time, used for every conversion in this module.

use itertools::{Itertools, MinMaxResult};

use crate::{
    constants::{
        Seconds, Steps, ARCSEC_PER_DEG, CONTINUUM_SEQ_START_OVERHEAD, CONTINUUM_SETUP_LENGTH,
        CONTINUUM_STARTUP_OVERHEAD,
    },
    duration::{DurationCounts, DurationEstimate},
    duration_errors::DurationError,
    obs_config::{
        Backend, MappingMode, ObsType, ObservationConfig, ObservationSummary,
        SequencingParameters, Skydip,
    },
    scan_pattern::map_steps,
    scheduler::schedule,
    step_time::effective_step_time,
};

/// Darks and science sequences of a continuum observation.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SequencePlan {
    n_darks: u64,
    n_seq: u64,
    steps_per_seq: Steps,
}

fn skydip_plan(
    skydip: &Skydip,
    summary: &ObservationSummary,
    jos: &SequencingParameters,
    step: Seconds,
) -> Result<SequencePlan, DurationError> {
    if summary.mapping_mode == MappingMode::Scan {
        let velocity = skydip
            .velocity
            .ok_or(DurationError::MissingCollaborator("skydip velocity"))?;
        if !velocity.is_finite() || velocity <= 0.0 {
            return Err(DurationError::invalid(
                "skydip velocity",
                format!("must be strictly positive, got {velocity}"),
            ));
        }

        let range = match skydip.elevations.iter().copied().minmax() {
            MinMaxResult::MinMax(low, high) => high - low,
            MinMaxResult::OneElement(_) | MinMaxResult::NoElements => 0.0,
        };

        Ok(SequencePlan {
            n_darks: 1,
            n_seq: 1,
            steps_per_seq: range / (velocity / ARCSEC_PER_DEG) / step,
        })
    } else {
        let n_elevations = skydip.elevations.len() as u64;
        Ok(SequencePlan {
            n_darks: n_elevations,
            n_seq: n_elevations,
            steps_per_seq: jos.jos_min as f64,
        })
    }
}

fn stare_plan(
    config: &ObservationConfig,
    jos: &SequencingParameters,
) -> Result<SequencePlan, DurationError> {
    let area = config.area()?;
    let n_seq = area.n_offsets() as u64 * area.n_microsteps() as u64 * jos.num_cycles as u64;
    let darks = schedule(n_seq, jos.steps_btwn_dark as u64, jos.jos_min.max(1) as u64, 1);

    Ok(SequencePlan {
        n_darks: darks.n_visits,
        n_seq,
        steps_per_seq: jos.jos_min as f64,
    })
}

fn scan_plan(
    config: &ObservationConfig,
    jos: &SequencingParameters,
    step: Seconds,
) -> Result<SequencePlan, DurationError> {
    let (map, scan) = config
        .area()?
        .map_area()
        .ok_or(DurationError::MissingCollaborator("map area"))?;

    let steps_per_map = map_steps(jos, step, map, scan, config.instrument.as_ref())?;
    let n_maps = jos.num_cycles as u64;
    let darks = schedule(
        n_maps,
        jos.steps_btwn_dark as u64,
        steps_per_map.ceil() as u64,
        1,
    );
    log::trace!(
        "scan: {steps_per_map:.1} steps per map, {} maps per dark",
        darks.units_per_visit
    );

    let n_seq = darks.n_visits;
    let steps_per_seq = if n_seq > 0 {
        steps_per_map * n_maps as f64 / n_seq as f64
    } else {
        0.0
    };

    Ok(SequencePlan {
        n_darks: darks.n_visits,
        n_seq,
        steps_per_seq,
    })
}

fn sequence_plan(
    config: &ObservationConfig,
    summary: &ObservationSummary,
    jos: &SequencingParameters,
    step: Seconds,
) -> Result<SequencePlan, DurationError> {
    match summary.obs_type {
        ObsType::Skydip => {
            let skydip = config
                .area()?
                .skydip()
                .ok_or(DurationError::MissingCollaborator("skydip area"))?;
            skydip_plan(skydip, summary, jos, step)
        }
        ObsType::Flatfield => Ok(SequencePlan {
            n_darks: 0,
            n_seq: 2 * jos.num_cycles as u64 + 1,
            steps_per_seq: jos.n_calsamples as f64,
        }),
        ObsType::Noise => Ok(SequencePlan {
            n_darks: jos.num_cycles as u64,
            n_seq: jos.num_cycles as u64,
            steps_per_seq: jos.jos_min as f64,
        }),
        ObsType::Setup => Ok(SequencePlan {
            n_darks: 1,
            n_seq: 1,
            steps_per_seq: CONTINUUM_SETUP_LENGTH / step,
        }),
        _ => match summary.mapping_mode {
            MappingMode::Stare | MappingMode::Dream => stare_plan(config, jos),
            MappingMode::Scan => scan_plan(config, jos, step),
            _ => Err(summary.unrecognized()),
        },
    }
}

/// Estimate the duration of a continuum observation.
///
/// Arguments
/// -----------------
/// * `config`: configuration providing the sequencing parameters, the observation summary and,
///   depending on the mode, the observing area and instrument geometry.
///
/// Return
/// ----------
/// * A [`DurationEstimate`] with `n_darks` and `n_seq` filled in.
///
/// Errors
/// ----------
/// * [`DurationError::UnrecognizedObservingMode`] for a mapping mode other than stare, dream
///   or scan on a science-like observation.
/// * [`DurationError::MissingCollaborator`] when the observing area does not match the mode.
/// * [`DurationError::InvalidParameter`] if the step time is not strictly positive.
pub fn estimate(config: &ObservationConfig) -> Result<DurationEstimate, DurationError> {
    let jos = config.jos()?;
    jos.validate()?;
    let summary = config.summary()?;
    let step = effective_step_time(jos.step_time);

    let mut plan = sequence_plan(config, summary, jos, step)?;
    if summary.is_focus() {
        plan.n_seq *= jos.num_focus_steps.max(1) as u64;
    }

    let dark_length = jos.n_calsamples as f64 * step;
    let seconds = CONTINUUM_STARTUP_OVERHEAD
        + (plan.n_darks + plan.n_seq) as f64 * CONTINUUM_SEQ_START_OVERHEAD
        + plan.steps_per_seq * step * plan.n_seq as f64
        + plan.n_darks as f64 * dark_length;

    log::debug!(
        "continuum {}/{}/{}: {} darks, {} seq of {:.1} steps, step {step} s",
        summary.mapping_mode,
        summary.switching_mode,
        summary.obs_type,
        plan.n_darks,
        plan.n_seq,
        plan.steps_per_seq
    );

    Ok(DurationEstimate {
        backend: Backend::Continuum,
        seconds,
        counts: DurationCounts {
            n_darks: plan.n_darks,
            n_refs: 0,
            n_seq: plan.n_seq,
            n_cals: 0,
            total_steps: plan.steps_per_seq * plan.n_seq as f64
                + (plan.n_darks * jos.n_calsamples as u64) as f64,
            effective_step_time: step,
        },
    })
}
