//! Evaluation counting for optimizer runs.

use crate::error::Result;
use crate::problem::{Evaluation, Problem};
use crate::stats::{Accumulator, AccumulatorReport};
use rand::Rng;

/// Wraps a [`Problem`] and records how many evaluations and samples it used.
#[derive(Debug)]
pub struct Instrumented<'a> {
    problem: &'a Problem,
    expected_limit: usize,
    n_evals: usize,
    total_samples: u64,
    samples_acc: Accumulator,
}

impl<'a> Instrumented<'a> {
    /// `expected_limit` is the evaluation budget reported in progress logs.
    pub fn new(problem: &'a Problem, expected_limit: usize) -> Self {
        Self {
            problem,
            expected_limit,
            n_evals: 0,
            total_samples: 0,
            samples_acc: Accumulator::new(),
        }
    }

    pub fn problem(&self) -> &Problem {
        self.problem
    }

    pub fn evaluate<R: Rng + ?Sized>(&mut self, doses: &[i32], rng: &mut R) -> Result<Evaluation> {
        let evaluation = self.problem.evaluate(doses, rng)?;

        self.n_evals += 1;
        self.total_samples += evaluation.samples as u64;
        self.samples_acc.add(evaluation.samples as f64);

        log::info!(
            "evaluation #{} of {}, samples so far: {}",
            self.n_evals,
            self.expected_limit,
            self.total_samples
        );
        log::debug!("{doses:?} -> {evaluation:?}");

        Ok(evaluation)
    }

    pub fn expected_limit(&self) -> usize {
        self.expected_limit
    }

    pub fn n_evals(&self) -> usize {
        self.n_evals
    }

    pub fn total_samples(&self) -> u64 {
        self.total_samples
    }

    /// Mean and standard deviation of the samples taken per evaluation.
    pub fn samples_report(&self) -> AccumulatorReport {
        self.samples_acc.report()
    }
}
