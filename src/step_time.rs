//! Hardware quantization of very short step times.
//!
//! Steps of 5.1 ms or less are stretched by the data acquisition hardware; both backend
//! calculators convert the nominal step time once, through [`effective_step_time`], and use
//! the result for every step-to-seconds conversion.

use crate::constants::{Seconds, FAST_STEP_CORRECTION, FAST_STEP_THRESHOLD};

/// Return the step time actually achieved by the hardware for a nominal `step_time`.
///
/// Arguments
/// -----------------
/// * `step_time`: nominal seconds per step.
///
/// Return
/// ----------
/// * `step_time × 1.16` when `step_time ≤ 5.1 ms`, `step_time` unchanged otherwise.
pub fn effective_step_time(step_time: Seconds) -> Seconds {
    if step_time <= FAST_STEP_THRESHOLD {
        step_time * FAST_STEP_CORRECTION
    } else {
        step_time
    }
}
