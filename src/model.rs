//! Model configuration and repeated sampling of the stochastic simulation.

use crate::engine::{Engine, Loads};
use crate::error::{Error, Result, check_num};
use crate::objective::{Objective, Weighting};
use crate::trace::ConcentrationTrace;
use crate::types::{AggregateResult, DosingSchedule, MAX_LENGTH, RunResult};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Default initial load of strain 1.
pub const DEFAULT_LOAD_1: i32 = 900;
/// Default initial load of strain 2.
pub const DEFAULT_LOAD_2: i32 = 100;
/// Upper bound on each initial load and on their sum.
pub const MAX_LOAD: i32 = 1000;

/// How many runs are sampled per evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplePolicy {
    /// Exactly `runs` runs.
    Fixed { runs: usize },
    /// Runs until `target_failures` uncured runs are seen or `maximum_runs` are done.
    Dynamic {
        target_failures: usize,
        maximum_runs: usize,
    },
}

/// Validated, immutable configuration of the stochastic model.
///
/// The randomness source is not part of the model: every evaluation takes
/// one explicitly, so the same model can be shared across threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Model {
    policy: SamplePolicy,
    loads: Loads,
}

/// Whether an infeasible schedule may skip the stochastic phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feasibility {
    /// Return NaN extinction counts for schedules over the reference limits.
    ShortCircuit,
    /// Always sample.
    Always,
}

impl Model {
    /// Model running exactly `runs` samples with the default initial loads.
    pub fn fixed(runs: usize) -> Result<Self> {
        Self::fixed_with_loads(runs, DEFAULT_LOAD_1, DEFAULT_LOAD_2)
    }

    /// Model running exactly `runs` samples with the given initial loads.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if `runs` is zero or the loads are out of range.
    pub fn fixed_with_loads(runs: usize, load_1: i32, load_2: i32) -> Result<Self> {
        Self::new(SamplePolicy::Fixed { runs }, load_1, load_2)
    }

    /// Model sampling until `target_failures` failures or `maximum_runs` runs,
    /// with the default initial loads.
    pub fn dynamic(target_failures: usize, maximum_runs: usize) -> Result<Self> {
        Self::dynamic_with_loads(target_failures, maximum_runs, DEFAULT_LOAD_1, DEFAULT_LOAD_2)
    }

    /// Model sampling until `target_failures` failures or `maximum_runs` runs.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if either count is zero, `target_failures`
    /// exceeds `maximum_runs`, or the loads are out of range.
    pub fn dynamic_with_loads(
        target_failures: usize,
        maximum_runs: usize,
        load_1: i32,
        load_2: i32,
    ) -> Result<Self> {
        Self::new(
            SamplePolicy::Dynamic {
                target_failures,
                maximum_runs,
            },
            load_1,
            load_2,
        )
    }

    /// Model with an explicit sampling policy.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the policy or the loads are out of range.
    pub fn new(policy: SamplePolicy, load_1: i32, load_2: i32) -> Result<Self> {
        match policy {
            SamplePolicy::Fixed { runs } => check_num("runs", runs, 1..)?,
            SamplePolicy::Dynamic {
                target_failures,
                maximum_runs,
            } => {
                check_num("maximum_runs", maximum_runs, 1..)?;
                check_num("target_failures", target_failures, 1..=maximum_runs)?;
            }
        }
        check_num("initial_load_1", load_1, 0..=MAX_LOAD)?;
        check_num("initial_load_2", load_2, 0..=MAX_LOAD)?;
        check_num("total initial load", load_1 + load_2, 0..=MAX_LOAD)?;
        Ok(Self {
            policy,
            loads: Loads {
                s1: load_1,
                s2: load_2,
            },
        })
    }

    pub fn policy(&self) -> SamplePolicy {
        self.policy
    }

    pub fn loads(&self) -> Loads {
        self.loads
    }

    /// Evaluate a schedule with the reference weighted fitness.
    ///
    /// Combines the per-strain extinction proportions with the total dosage,
    /// or returns the fixed penalty for schedules over the dosage cap or the
    /// concentration ceiling without running any simulation.
    ///
    /// # Errors
    /// Returns [`Error::InvalidInput`] unless `doses` has exactly
    /// [`MAX_LENGTH`] non-negative entries, and propagates simulation errors.
    pub fn weighted_fitness<R: Rng + ?Sized>(&self, doses: &[i32], rng: &mut R) -> Result<f64> {
        if doses.len() != MAX_LENGTH {
            return Err(Error::input(format!(
                "schedule length must be {MAX_LENGTH}, but is {}",
                doses.len()
            )));
        }
        let schedule = DosingSchedule::new(doses)?;
        let result = self.evaluate(&schedule, Feasibility::ShortCircuit, rng)?;
        Ok(Weighting::default().compute(&result))
    }

    /// Compute the aggregate statistics of a schedule.
    pub fn evaluate<R: Rng + ?Sized>(
        &self,
        schedule: &DosingSchedule,
        feasibility: Feasibility,
        rng: &mut R,
    ) -> Result<AggregateResult> {
        let trace = ConcentrationTrace::new(schedule);
        let mut result = AggregateResult {
            total_dosage: trace.total() as f64,
            peak_concentration: trace.peak(),
            s1_extinct: f64::NAN,
            s2_extinct: f64::NAN,
            both_extinct: f64::NAN,
            samples: 0,
            duration: schedule.duration(),
        };

        if feasibility == Feasibility::ShortCircuit && trace.exceeds_limits() {
            log::debug!(
                "skipping sampling: total dosage {}, peak concentration {:.3}",
                result.total_dosage,
                result.peak_concentration
            );
            return Ok(result);
        }

        let counts = self.sample(schedule, rng)?;
        result.s1_extinct = counts.s1_extinct as f64;
        result.s2_extinct = counts.s2_extinct as f64;
        result.both_extinct = counts.both_extinct as f64;
        result.samples = counts.samples;

        log::debug!("evaluated {schedule:?}: {counts:?}");

        Ok(result)
    }

    /// Run the simulation according to the sampling policy.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        schedule: &DosingSchedule,
        rng: &mut R,
    ) -> Result<ExtinctionCounts> {
        let engine = Engine::new(schedule, self.loads);
        let mut counts = ExtinctionCounts::default();

        match self.policy {
            SamplePolicy::Fixed { runs } => {
                for _ in 0..runs {
                    counts.add(engine.run(rng)?);
                }
            }
            SamplePolicy::Dynamic {
                target_failures,
                maximum_runs,
            } => {
                let mut n_failures = 0;
                while counts.samples < maximum_runs && n_failures < target_failures {
                    if !counts.add(engine.run(rng)?) {
                        n_failures += 1;
                    }
                }
            }
        }

        Ok(counts)
    }
}

/// Extinction tallies over the runs of one evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtinctionCounts {
    pub s1_extinct: usize,
    pub s2_extinct: usize,
    pub both_extinct: usize,
    pub samples: usize,
}

impl ExtinctionCounts {
    /// Tally one run and return whether it was a cure.
    fn add(&mut self, run: RunResult) -> bool {
        log::trace!("run {}: {run:?}", self.samples);
        self.samples += 1;
        if run.s1_extinct() {
            self.s1_extinct += 1;
        }
        if run.s2_extinct() {
            self.s2_extinct += 1;
        }
        let cured = run.cured();
        if cured {
            self.both_extinct += 1;
        }
        cured
    }

    /// Runs that did not end with both strains extinct.
    pub fn failures(&self) -> usize {
        self.samples - self.both_extinct
    }
}
