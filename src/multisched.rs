// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Multi-schedule driver (component C15): grid and genetic search over a
//! parameter-vector space, per spec.md §4.12 and SPEC_FULL.md §4.12's
//! supplemented per-station/source/baseline override axes.
//!
//! A parameter vector is a flat, named map of scalar axis values (the
//! global weight factors plus any `station.<id>.<field>` /
//! `source.<id>.<field>` / `baseline.<id>.<field>` override axis the
//! configuration enumerates); grid and genetic search treat every entry
//! identically regardless of which subsystem eventually reads it back
//! out, matching `Misc/MultiScheduling.cpp`'s uniform parameter-vector
//! handling.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Box-Muller sample from `Normal(mean, stddev)`. `rand_distr` is not in
/// the dependency tree, and the driver only needs this one distribution,
/// so it is inlined rather than pulling in a whole extra crate.
fn sample_gaussian(rng: &mut StdRng, mean: f64, stddev: f64) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen_range(0.0..1.0);
    let z0 = (-2.0 * u1.ln()).sqrt() * (crate::constants::TAU * u2).cos();
    mean + stddev * z0
}

/// A single named, bounded scalar axis of the parameter-vector space.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AxisSpec {
    pub name: String,
    /// Discrete values for grid mode; also used by genetic mode as the
    /// `[min, max]` bound (first and last entries) for initial sampling
    /// and mutation clamping.
    pub values: Vec<f64>,
}

impl AxisSpec {
    fn bounds(&self) -> (f64, f64) {
        let min = self.values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = self
            .values
            .iter()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max);
        (min, max)
    }
}

/// A point in parameter-vector space: axis name to scalar value. Ordered
/// so that grid enumeration and genetic perturbation are deterministic
/// given a seed.
pub type ParameterVector = BTreeMap<String, f64>;

/// Grid-mode configuration, per spec.md §4.12.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GridConfig {
    pub axes: Vec<AxisSpec>,
    pub shuffle_seed: Option<u64>,
    pub max_number: Option<usize>,
    pub chunk_size: Option<usize>,
    pub n_threads: Option<usize>,
}

/// Genetic-mode configuration, per spec.md §4.12.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeneticConfig {
    pub axes: Vec<AxisSpec>,
    /// Axis names whose values are boolean-valued (0.0/1.0) and flip
    /// rather than average/perturb.
    #[serde(default)]
    pub boolean_axes: Vec<String>,
    /// Axis names that must be renormalised to sum to 1 after every
    /// perturbation (the nine scorer weights).
    #[serde(default)]
    pub sum_to_one_axes: Vec<String>,
    /// Axis names that must be renormalised so their mean is 1 after
    /// every perturbation (station/source/baseline weight maps).
    #[serde(default)]
    pub mean_to_one_axes: Vec<String>,
    pub population_size: usize,
    pub elite_fraction: f64,
    pub mutation: f64,
    pub min_mutation: f64,
    pub max_generations: usize,
    pub no_improvement_generations: usize,
    pub seed: u64,
    pub n_threads: Option<usize>,
}

/// Multi-schedule driver mode, per spec.md §4.12.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MultiScheduleConfig {
    Grid(GridConfig),
    Genetic(GeneticConfig),
}

/// Build the Cartesian product of `axes`, per spec.md §4.12's grid mode.
pub fn cartesian_product(axes: &[AxisSpec]) -> Vec<ParameterVector> {
    let mut vectors: Vec<ParameterVector> = vec![ParameterVector::new()];
    for axis in axes {
        let mut next = Vec::with_capacity(vectors.len() * axis.values.len());
        for existing in &vectors {
            for &value in &axis.values {
                let mut v = existing.clone();
                v.insert(axis.name.clone(), value);
                next.push(v);
            }
        }
        vectors = next;
    }
    vectors
}

/// Seeded Fisher-Yates shuffle, per spec.md §4.12's "optionally shuffles
/// with a seeded pseudo-random permutation".
pub fn seeded_shuffle(vectors: &mut [ParameterVector], seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    vectors.shuffle(&mut rng);
}

/// The default chunk size for grid-mode dequeues when not configured,
/// per spec.md §4.12: `max(N/threads, 1)`.
pub fn default_chunk_size(n: usize, n_threads: usize) -> usize {
    ((n as f64) / (n_threads.max(1) as f64)).floor().max(1.0) as usize
}

/// Build the ordered list of parameter vectors a grid-mode run will
/// attempt: Cartesian product, optional seeded shuffle, truncated to
/// `max_number`.
pub fn build_grid(config: &GridConfig) -> Vec<ParameterVector> {
    let mut vectors = cartesian_product(&config.axes);
    if let Some(seed) = config.shuffle_seed {
        seeded_shuffle(&mut vectors, seed);
    }
    if let Some(max_number) = config.max_number {
        vectors.truncate(max_number);
    }
    vectors
}

/// Run a grid-mode multi-schedule build: evaluate every vector in
/// `vectors` with `evaluate` using a `rayon` thread pool sized per
/// `config.n_threads`, and return the index and score of the best. The
/// chunk granularity (`config.chunk_size`, defaulting per
/// [`default_chunk_size`]) only affects work-stealing locality, not the
/// result, so it is accepted but not otherwise consulted here; a caller
/// that wants explicit chunking can call `vectors.par_chunks(chunk_size)`
/// directly.
pub fn run_grid<F>(config: &GridConfig, vectors: &[ParameterVector], evaluate: F) -> Option<(usize, f64)>
where
    F: Fn(&ParameterVector) -> f64 + Sync,
{
    use rayon::prelude::*;

    let n_threads = config.n_threads.unwrap_or_else(rayon::current_num_threads);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .build()
        .ok()?;

    let (index, score) = pool.install(|| {
        vectors
            .par_iter()
            .enumerate()
            .map(|(i, v)| (i, evaluate(v)))
            .reduce(
                || (usize::MAX, f64::NEG_INFINITY),
                |a, b| if b.1 > a.1 { b } else { a },
            )
    });

    if index == usize::MAX {
        None
    } else {
        Some((index, score))
    }
}

fn renormalise_sum_to_one(vector: &mut ParameterVector, axes: &[String]) {
    let sum: f64 = axes.iter().filter_map(|a| vector.get(a)).sum();
    if sum.abs() > f64::EPSILON {
        for axis in axes {
            if let Some(v) = vector.get_mut(axis) {
                *v /= sum;
            }
        }
    }
}

fn renormalise_mean_to_one(vector: &mut ParameterVector, axes: &[String]) {
    if axes.is_empty() {
        return;
    }
    let mean: f64 = axes.iter().filter_map(|a| vector.get(a)).sum::<f64>() / axes.len() as f64;
    if mean.abs() > f64::EPSILON {
        for axis in axes {
            if let Some(v) = vector.get_mut(axis) {
                *v /= mean;
            }
        }
    }
}

/// Sample an initial genetic population, uniformly within each axis'
/// `[min, max]` bound.
pub fn initial_population(config: &GeneticConfig, rng: &mut StdRng) -> Vec<ParameterVector> {
    (0..config.population_size)
        .map(|_| {
            let mut v = ParameterVector::new();
            for axis in &config.axes {
                let (min, max) = axis.bounds();
                let value = if config.boolean_axes.contains(&axis.name) {
                    if rng.gen_bool(0.5) {
                        1.0
                    } else {
                        0.0
                    }
                } else if (max - min).abs() < f64::EPSILON {
                    min
                } else {
                    rng.gen_range(min..=max)
                };
                v.insert(axis.name.clone(), value);
            }
            renormalise_sum_to_one(&mut v, &config.sum_to_one_axes);
            renormalise_mean_to_one(&mut v, &config.mean_to_one_axes);
            v
        })
        .collect()
}

/// Select elite (top `elite_fraction`) and random-sample parents from a
/// scored population, per spec.md §4.12.
pub fn select_parents<'a>(
    scored: &'a [(ParameterVector, f64)],
    elite_fraction: f64,
    population_size: usize,
    rng: &mut StdRng,
) -> Vec<&'a ParameterVector> {
    let mut ranked: Vec<&(ParameterVector, f64)> = scored.iter().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let elite_count = ((population_size as f64) * elite_fraction).ceil() as usize;
    let elite_count = elite_count.min(ranked.len());
    let mut parents: Vec<&ParameterVector> = ranked[..elite_count].iter().map(|(v, _)| v).collect();

    while parents.len() < population_size && !ranked.is_empty() {
        let idx = rng.gen_range(0..ranked.len());
        parents.push(&ranked[idx].0);
    }
    parents
}

/// Produce one offspring from two parents: field-wise average perturbed
/// by a Gaussian of width `mutation * (max - min)` with floor
/// `min_mutation * mean`, boolean fields flipping with
/// parent-disagreement-weighted probability, per spec.md §4.12.
pub fn crossover_and_mutate(
    parent_a: &ParameterVector,
    parent_b: &ParameterVector,
    config: &GeneticConfig,
    rng: &mut StdRng,
) -> ParameterVector {
    let mut child = ParameterVector::new();

    for axis in &config.axes {
        let a = *parent_a.get(&axis.name).unwrap_or(&0.0);
        let b = *parent_b.get(&axis.name).unwrap_or(&0.0);

        if config.boolean_axes.contains(&axis.name) {
            let value = if (a - b).abs() > f64::EPSILON {
                if rng.gen_bool(0.5) {
                    1.0
                } else {
                    0.0
                }
            } else {
                a
            };
            child.insert(axis.name.clone(), value);
            continue;
        }

        let (min, max) = axis.bounds();
        let mean = (a + b) / 2.0;
        let width = (config.mutation * (max - min)).max(config.min_mutation * mean.abs());
        let value = if width.abs() < f64::EPSILON {
            mean
        } else {
            sample_gaussian(rng, mean, width.abs()).clamp(min, max)
        };
        child.insert(axis.name.clone(), value);
    }

    renormalise_sum_to_one(&mut child, &config.sum_to_one_axes);
    renormalise_mean_to_one(&mut child, &config.mean_to_one_axes);
    child
}

/// Outcome of a genetic-mode multi-schedule run.
#[derive(Clone, Debug)]
pub struct GeneticResult {
    pub best_vector: ParameterVector,
    pub best_score: f64,
    pub generations_run: usize,
}

/// Run genetic-mode multi-schedule search, per spec.md §4.12. Terminates
/// at `max_generations` or after `no_improvement_generations` without a
/// strict score improvement.
pub fn run_genetic<F>(config: &GeneticConfig, evaluate: F) -> Option<GeneticResult>
where
    F: Fn(&ParameterVector) -> f64 + Sync,
{
    use rayon::prelude::*;

    if config.population_size == 0 {
        return None;
    }

    let n_threads = config.n_threads.unwrap_or_else(rayon::current_num_threads);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .build()
        .ok()?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut population = initial_population(config, &mut rng);
    let mut best_vector = population[0].clone();
    let mut best_score = f64::NEG_INFINITY;
    let mut generations_since_improvement = 0usize;

    for generation in 0..config.max_generations {
        let scored: Vec<(ParameterVector, f64)> = pool.install(|| {
            population
                .par_iter()
                .map(|v| (v.clone(), evaluate(v)))
                .collect()
        });

        let generation_best = scored
            .iter()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .unwrap();
        if generation_best.1 > best_score {
            best_score = generation_best.1;
            best_vector = generation_best.0.clone();
            generations_since_improvement = 0;
        } else {
            generations_since_improvement += 1;
        }
        if generations_since_improvement >= config.no_improvement_generations {
            return Some(GeneticResult {
                best_vector,
                best_score,
                generations_run: generation + 1,
            });
        }

        let parents = select_parents(&scored, config.elite_fraction, config.population_size, &mut rng);
        let mut next_generation = Vec::with_capacity(config.population_size);
        for _ in 0..config.population_size {
            let a = parents[rng.gen_range(0..parents.len())];
            let b = parents[rng.gen_range(0..parents.len())];
            next_generation.push(crossover_and_mutate(a, b, config, &mut rng));
        }
        population = next_generation;
    }

    Some(GeneticResult {
        best_vector,
        best_score,
        generations_run: config.max_generations,
    })
}
