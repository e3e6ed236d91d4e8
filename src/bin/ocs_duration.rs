use std::{io::Write, process::ExitCode};

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use log::{debug, error, info, warn};
use serde::Serialize;

use ocs_duration::{
    duration::{estimate_duration, DurationEstimate},
    duration_errors::DurationError,
    obs_config::{xml_reader::read_ocs_config, ObservationConfig},
};

#[derive(Parser)]
#[command(version, about = "Estimate the execution time of OCS observation configurations")]
#[command(disable_help_subcommand = true)]
struct Args {
    /// The OCS XML configurations to estimate.
    #[arg(required = true)]
    configs: Vec<Utf8PathBuf>,

    /// Write a CSV table of the estimates to stdout instead of one line per file.
    #[arg(long)]
    csv: bool,

    /// Print durations as hh:mm:ss.
    #[arg(long)]
    hms: bool,

    /// The verbosity of the program. Increase by specifying multiple times
    /// (e.g. -vv). The default is to print only high-level information.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbosity: u8,
}

#[derive(Serialize)]
struct CsvRow<'a> {
    file: &'a str,
    backend: String,
    mapping_mode: String,
    switching_mode: String,
    #[serde(rename = "type")]
    obs_type: String,
    seconds: f64,
    n_seq: u64,
    n_refs: u64,
    n_cals: u64,
    n_darks: u64,
}

impl<'a> CsvRow<'a> {
    fn new(file: &'a Utf8Path, config: &ObservationConfig, estimate: &DurationEstimate) -> Self {
        let (mapping_mode, switching_mode, obs_type) = match &config.summary {
            Some(s) => (
                s.mapping_mode.to_string(),
                s.switching_mode.to_string(),
                s.obs_type.to_string(),
            ),
            None => Default::default(),
        };
        CsvRow {
            file: file.as_str(),
            backend: estimate.backend.to_string(),
            mapping_mode,
            switching_mode,
            obs_type,
            seconds: estimate.seconds,
            n_seq: estimate.counts.n_seq,
            n_refs: estimate.counts.n_refs,
            n_cals: estimate.counts.n_cals,
            n_darks: estimate.counts.n_darks,
        }
    }
}

fn estimate_file(path: &Utf8Path) -> Result<(ObservationConfig, DurationEstimate), DurationError> {
    let config = read_ocs_config(path)?;
    let estimate = estimate_duration(&config)?;
    Ok((config, estimate))
}

fn format_hms(estimate: &DurationEstimate) -> String {
    let (_, days, hours, minutes, seconds, ..) = estimate.as_duration().decompose();
    format!("{:02}:{:02}:{:02}", days * 24 + hours, minutes, seconds)
}

/// Estimate every configuration and write the results to `out`.
///
/// Files that cannot be estimated are logged and skipped.
///
/// Return
/// ----------
/// * The number of configurations that could not be estimated.
fn run<W: Write>(args: &Args, mut out: W) -> Result<usize, csv::Error> {
    let mut failures = 0;
    let mut estimates = Vec::with_capacity(args.configs.len());

    for path in &args.configs {
        debug!("Working on {path}");
        match estimate_file(path) {
            Ok((config, estimate)) => estimates.push((path, config, estimate)),
            Err(err) => {
                warn!("{path}: duration cannot be estimated: {err}");
                failures += 1;
            }
        }
    }

    if args.csv {
        let mut writer = csv::Writer::from_writer(out);
        for (path, config, estimate) in &estimates {
            writer.serialize(CsvRow::new(path, config, estimate))?;
        }
        writer.flush()?;
    } else {
        for (path, _, estimate) in &estimates {
            if args.hms {
                writeln!(out, "{path}: {}", format_hms(estimate))?;
            } else {
                writeln!(out, "{path}: {:.1} s", estimate.seconds)?;
            }
        }
    }

    info!(
        "Estimated {} of {} configurations",
        estimates.len(),
        args.configs.len()
    );
    Ok(failures)
}

fn main() -> ExitCode {
    let args = Args::parse();
    setup_logging(args.verbosity);

    match run(&args, std::io::stdout().lock()) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(err) => {
            error!("Unable to write the estimates: {err}");
            ExitCode::FAILURE
        }
    }
}

fn log_level(verbosity: u8) -> log::LevelFilter {
    match verbosity {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

/// Log to stderr so stdout only carries estimates. `RUST_LOG` overrides the `-v` level; module
/// targets are shown from `-vv` on.
fn setup_logging(verbosity: u8) {
    env_logger::Builder::new()
        .filter_level(log_level(verbosity))
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format_target(verbosity > 1)
        .init();
}

#[cfg(test)]
mod ocs_duration_test {
    use super::*;
    use ocs_duration::{
        duration::DurationCounts,
        obs_config::{Backend, ObservationSummary},
    };

    fn estimate(seconds: f64) -> DurationEstimate {
        DurationEstimate {
            backend: Backend::Heterodyne,
            seconds,
            counts: DurationCounts::default(),
        }
    }

    fn args(configs: &[&str], csv: bool, hms: bool) -> Args {
        Args {
            configs: configs.iter().map(|c| Utf8PathBuf::from(*c)).collect(),
            csv,
            hms,
            verbosity: 0,
        }
    }

    #[test]
    fn test_log_level() {
        assert_eq!(log_level(0), log::LevelFilter::Info);
        assert_eq!(log_level(1), log::LevelFilter::Debug);
        assert_eq!(log_level(2), log::LevelFilter::Trace);
        assert_eq!(log_level(7), log::LevelFilter::Trace);
    }

    #[test]
    fn test_format_hms() {
        assert_eq!(format_hms(&estimate(3725.4)), "01:02:05");
        assert_eq!(format_hms(&estimate(97.0)), "00:01:37");
        // Days fold into the hour count
        assert_eq!(format_hms(&estimate(90061.0)), "25:01:01");
    }

    #[test]
    fn test_csv_columns() {
        let config = ObservationConfig {
            summary: Some(ObservationSummary::new("grid", "pssw_spin", "pointing")),
            ..Default::default()
        };
        let mut writer = csv::Writer::from_writer(vec![]);
        writer
            .serialize(CsvRow::new(
                Utf8Path::new("obs.xml"),
                &config,
                &estimate(97.0),
            ))
            .unwrap();
        let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();

        let mut lines = out.lines();
        assert_eq!(
            lines.next(),
            Some("file,backend,mapping_mode,switching_mode,type,seconds,n_seq,n_refs,n_cals,n_darks")
        );
        assert_eq!(
            lines.next(),
            Some("obs.xml,heterodyne,grid,pssw_spin,pointing,97.0,0,0,0,0")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_run_counts_failures() {
        let args = args(
            &[
                "tests/data/harp_grid_pssw_pointing.xml",
                "tests/data/does_not_exist.xml",
                "tests/data/ambiguous_area.xml",
            ],
            true,
            false,
        );
        let mut out = Vec::new();
        assert_eq!(run(&args, &mut out).unwrap(), 2);

        let out = String::from_utf8(out).unwrap();
        assert_eq!(out.lines().count(), 2);
        assert!(out
            .lines()
            .nth(1)
            .unwrap()
            .starts_with("tests/data/harp_grid_pssw_pointing.xml,heterodyne,grid,pssw,pointing,97"));
    }

    #[test]
    fn test_run_plain_output() {
        let args = args(&["tests/data/harp_grid_pssw_pointing.xml"], false, true);
        let mut out = Vec::new();
        assert_eq!(run(&args, &mut out).unwrap(), 0);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "tests/data/harp_grid_pssw_pointing.xml: 00:01:37\n"
        );
    }
}
