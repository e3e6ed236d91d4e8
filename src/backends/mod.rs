//! Per-backend duration calculators.
//!
//! Each calculator reads the components of an [`ObservationConfig`](crate::obs_config::ObservationConfig)
//! it needs, converts the observing mode into step and sequence counts, and adds the backend's
//! fixed overheads. Both convert steps to seconds with a single
//! [`effective_step_time`](crate::step_time::effective_step_time).
pub mod continuum;
pub mod heterodyne;
