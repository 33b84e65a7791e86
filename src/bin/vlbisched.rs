// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The `vlbisched` executable (ambient component A5): loads a single
//! TOML configuration file carrying both the session parameters and the
//! station/source/mode catalog, builds one schedule (or runs the
//! multi-schedule driver over a parameter-vector space), and prints the
//! resulting statistics, per spec.md §6's CLI surface.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info, warn, LevelFilter};
use serde::{Deserialize, Serialize};

use vlbisched::catalog::CatalogToml;
use vlbisched::config::SessionConfig;
use vlbisched::error::SchedulerError;
use vlbisched::model::schedule::Schedule;
use vlbisched::model::source::Source;
use vlbisched::model::station::Station;
use vlbisched::multisched::{MultiScheduleConfig, ParameterVector};
use vlbisched::planner::PlannerInputs;
use vlbisched::quality::{figure_of_merit, gentle_reduction_candidates, HardConditions, QualityWeights};
use vlbisched::stats::{MultiScheduleSummary, ScheduleStatistics};

/// An offline batch scheduler for VLBI geodetic/astrometric sessions.
#[derive(Parser, Debug)]
#[clap(name = "vlbisched", author, version, about)]
struct Args {
    /// Path to the TOML configuration file (session parameters and
    /// catalog, combined).
    config: PathBuf,

    /// Override the configured console log severity
    /// (off/error/warn/info/debug/trace).
    #[clap(long = "log-severity-console")]
    log_severity_console: Option<String>,

    /// Override the configured file log severity.
    #[clap(long = "log-severity-file")]
    log_severity_file: Option<String>,

    /// Path to the log file.
    #[clap(long = "log-file", default_value = "vlbisched.log")]
    log_file: PathBuf,
}

/// The combined, single-file configuration surface spec.md §6 asks for:
/// session parameters and catalog data both live in one TOML document.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct VlbischedConfig {
    #[serde(flatten)]
    session: SessionConfig,
    #[serde(flatten)]
    catalog: CatalogToml,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("vlbisched: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), SchedulerError> {
    let raw = std::fs::read_to_string(&args.config)?;
    let config: VlbischedConfig = toml::from_str(&raw).map_err(SchedulerError::from)?;

    let console_severity = resolve_severity(
        args.log_severity_console.as_deref(),
        &config.session.log_severity_console,
    )?;
    let file_severity = resolve_severity(
        args.log_severity_file.as_deref(),
        &config.session.log_severity_file,
    )?;
    vlbisched::logging::init_logging(console_severity, file_severity, &args.log_file)
        .map_err(|e| SchedulerError::Generic(e.to_string()))?;

    let resolved = config.session.resolve()?;
    let catalog = config.catalog.resolve();
    let mode = vlbisched::catalog::ObservingModeCatalog::observing_mode(
        &catalog,
        &config.session.observing_mode_name,
    )
    .ok_or_else(|| {
        SchedulerError::CatalogInconsistency(format!(
            "unknown observing mode {:?}",
            config.session.observing_mode_name
        ))
    })?
    .clone();
    let bands: Vec<String> = mode.bands.iter().map(|b| b.name.clone()).collect();

    let stations = catalog.build_stations(resolved.exclude_calibration_only_equipment, resolved.session_start);
    let sources = catalog.build_sources(&stations);
    let baselines = config.session.resolve_baselines(&stations);
    let hard_conditions = config.session.hard_conditions.resolve(&sources);
    let quality_weights = config.session.quality_weights.resolve();
    let rules = config.session.resolve_rules(&stations);

    info!(
        "loaded {} stations, {} sources, observing mode {:?}",
        stations.len(),
        sources.len(),
        mode.name
    );

    match &config.session.multi_schedule {
        None => {
            let weights = config.session.weight_factors.resolve();
            let schedule = build_with_gentle_reduction(
                stations,
                sources,
                &resolved,
                weights,
                &baselines,
                &mode,
                &bands,
                &config.session.sky_coverage,
                &hard_conditions,
                &quality_weights,
                &config.session.hard_conditions,
                rules.clone(),
            )?;
            let score = schedule.score.unwrap_or(0.0);
            let stats = ScheduleStatistics::new(ParameterVector::new(), &schedule, score);
            println!("{}", stats.to_csv_line());
            Ok(())
        }
        Some(multi) => run_multi_schedule(
            multi,
            &resolved,
            &config.session,
            &stations,
            &sources,
            &baselines,
            &mode,
            &bands,
            &hard_conditions,
            &quality_weights,
            &rules,
        ),
    }
}

fn resolve_severity(cli_override: Option<&str>, configured: &str) -> Result<LevelFilter, SchedulerError> {
    let raw = cli_override.unwrap_or(configured);
    vlbisched::logging::parse_severity(raw).map_err(|e| SchedulerError::Configuration(e.to_string()))
}

/// Build one schedule, retrying with the gentle source-reduction pass
/// (spec.md §4.13) up to `hard_conditions_toml.max_number_of_iterations`
/// times when the hard conditions are not met.
#[allow(clippy::too_many_arguments)]
fn build_with_gentle_reduction(
    stations: Vec<Station>,
    sources: Vec<Source>,
    resolved: &vlbisched::config::ResolvedParameters,
    weights: vlbisched::scorer::WeightContext,
    baselines: &HashMap<vlbisched::model::baseline::BaselineId, vlbisched::model::baseline::Baseline>,
    mode: &vlbisched::obsmode::ModeDescriptor,
    bands: &[String],
    sky_coverage_config: &vlbisched::config::SkyCoverageConfig,
    hard_conditions: &HardConditions,
    quality_weights: &QualityWeights,
    hard_conditions_toml: &vlbisched::config::HardConditionsToml,
    rules: vlbisched::rules::RulesConfig,
) -> Result<Schedule, SchedulerError> {
    let mut sources = sources;
    let mut iterations = 0usize;

    loop {
        let sky_coverage_areas: Vec<_> = stations.iter().map(|_| sky_coverage_config.build_area()).collect();
        let station_to_area = |s: usize| s;
        let inputs = PlannerInputs {
            params: *resolved,
            weights,
            baselines: baselines.clone(),
            mode: mode.clone(),
            bands: bands.to_vec(),
            sky_coverage_areas,
            station_to_area: &station_to_area,
            rules: rules.clone(),
        };
        let mut schedule = vlbisched::planner::build_schedule(stations.clone(), sources.clone(), &inputs)?;

        let repeat_targets = repeat_observation_targets(&sources, resolved);
        let score = figure_of_merit(&schedule, quality_weights, hard_conditions, &repeat_targets);
        schedule.score = Some(score);

        if score > 0.0 || iterations >= hard_conditions_toml.max_number_of_iterations {
            return Ok(schedule);
        }

        warn!(
            "hard conditions unmet on attempt {}, disabling {} least-observed source(s) and retrying",
            iterations + 1,
            hard_conditions_toml.reduction_batch_size
        );
        let to_disable = gentle_reduction_candidates(&schedule, hard_conditions_toml.reduction_batch_size);
        if to_disable.is_empty() {
            return Ok(schedule);
        }
        for index in to_disable {
            if let Some(s) = sources.get_mut(index) {
                s.ignore = true;
            }
        }
        iterations += 1;
    }
}

/// Each source's target observation count for the repeat-completion
/// figure-of-merit term: the number of `min_repeat` intervals that fit in
/// the session, or `0` when the source has no repeat goal at all.
fn repeat_observation_targets(
    sources: &[Source],
    resolved: &vlbisched::config::ResolvedParameters,
) -> HashMap<usize, usize> {
    let session_seconds = (resolved.session_end - resolved.session_start).to_seconds().max(0.0);
    sources
        .iter()
        .enumerate()
        .filter_map(|(i, s)| {
            let repeat_seconds = s.min_repeat.to_seconds();
            if repeat_seconds <= 0.0 {
                None
            } else {
                Some((i, (session_seconds / repeat_seconds).floor() as usize))
            }
        })
        .collect()
}

/// Build and score one schedule for `vector`'s weight-factor overrides,
/// per spec.md §4.12's uniform parameter-vector handling.
#[allow(clippy::too_many_arguments)]
fn build_and_score(
    vector: &ParameterVector,
    resolved: &vlbisched::config::ResolvedParameters,
    session: &SessionConfig,
    stations: &[Station],
    sources: &[Source],
    baselines: &HashMap<vlbisched::model::baseline::BaselineId, vlbisched::model::baseline::Baseline>,
    mode: &vlbisched::obsmode::ModeDescriptor,
    bands: &[String],
    hard_conditions: &HardConditions,
    quality_weights: &QualityWeights,
    rules: &vlbisched::rules::RulesConfig,
) -> Result<(Schedule, f64), SchedulerError> {
    let mut weight_factors = session.weight_factors;
    for (name, value) in vector {
        weight_factors.apply_axis(name, *value);
    }
    let sky_coverage_areas: Vec<_> = stations.iter().map(|_| session.sky_coverage.build_area()).collect();
    let station_to_area = |s: usize| s;
    let inputs = PlannerInputs {
        params: *resolved,
        weights: weight_factors.resolve(),
        baselines: baselines.clone(),
        mode: mode.clone(),
        bands: bands.to_vec(),
        sky_coverage_areas,
        station_to_area: &station_to_area,
        rules: rules.clone(),
    };
    let schedule = vlbisched::planner::build_schedule(stations.to_vec(), sources.to_vec(), &inputs)?;
    let repeat_targets = repeat_observation_targets(sources, resolved);
    let score = figure_of_merit(&schedule, quality_weights, hard_conditions, &repeat_targets);
    Ok((schedule, score))
}

#[allow(clippy::too_many_arguments)]
fn run_multi_schedule(
    multi: &MultiScheduleConfig,
    resolved: &vlbisched::config::ResolvedParameters,
    session: &SessionConfig,
    stations: &[Station],
    sources: &[Source],
    baselines: &HashMap<vlbisched::model::baseline::BaselineId, vlbisched::model::baseline::Baseline>,
    mode: &vlbisched::obsmode::ModeDescriptor,
    bands: &[String],
    hard_conditions: &HardConditions,
    quality_weights: &QualityWeights,
    rules: &vlbisched::rules::RulesConfig,
) -> Result<(), SchedulerError> {
    let mut summary = MultiScheduleSummary::default();

    match multi {
        MultiScheduleConfig::Grid(grid) => {
            use rayon::prelude::*;

            let vectors = vlbisched::multisched::build_grid(grid);
            let n_threads = grid.n_threads.unwrap_or_else(rayon::current_num_threads);
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n_threads)
                .build()
                .map_err(|e| SchedulerError::Generic(e.to_string()))?;

            let results: Vec<Option<(ParameterVector, Schedule, f64)>> = pool.install(|| {
                vectors
                    .par_iter()
                    .map(|vector| {
                        build_and_score(vector, resolved, session, stations, sources, baselines, mode, bands, hard_conditions, quality_weights, rules)
                            .ok()
                            .map(|(schedule, score)| (vector.clone(), schedule, score))
                    })
                    .collect()
            });
            for result in results {
                match result {
                    Some((vector, schedule, score)) => summary.push(ScheduleStatistics::new(vector, &schedule, score)),
                    None => error!("grid attempt failed for one parameter vector"),
                }
            }
        }
        MultiScheduleConfig::Genetic(genetic) => {
            let evaluate = |vector: &ParameterVector| -> f64 {
                match build_and_score(vector, resolved, session, stations, sources, baselines, mode, bands, hard_conditions, quality_weights, rules) {
                    Ok((_, score)) => score,
                    Err(e) => {
                        error!("genetic attempt failed for one parameter vector: {e}");
                        f64::NEG_INFINITY
                    }
                }
            };
            match vlbisched::multisched::run_genetic(genetic, evaluate) {
                Some(result) => {
                    info!(
                        "genetic search converged after {} generation(s), best score {}",
                        result.generations_run, result.best_score
                    );
                    let (schedule, score) = build_and_score(
                        &result.best_vector,
                        resolved,
                        session,
                        stations,
                        sources,
                        baselines,
                        mode,
                        bands,
                        hard_conditions,
                        quality_weights,
                        rules,
                    )?;
                    summary.push(ScheduleStatistics::new(result.best_vector, &schedule, score));
                }
                None => warn!("genetic search produced no population"),
            }
        }
    }

    println!("{}", summary.to_csv());
    if let Some(best) = summary.best_index() {
        info!("best-scoring attempt is line {best}");
    }
    Ok(())
}
