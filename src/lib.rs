//! Estimate how long a radio-telescope observation takes to execute from its OCS configuration.
//!
//! Start from [`duration::estimate_duration`]; configurations are usually loaded with
//! [`obs_config::xml_reader::read_ocs_config`].
pub mod backends;
pub mod constants;
pub mod duration;
pub mod duration_errors;
pub mod obs_config;
pub mod scan_pattern;
pub mod scheduler;
pub mod step_time;
