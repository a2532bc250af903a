//! Dosing schedule optimization problem built on the stochastic model.
//!
//! A [`Problem`] fixes the treatment length, the dose bounds, an optional
//! treatment failure constraint and an ordered list of objectives. An
//! external optimizer calls [`Problem::evaluate`] once per candidate and
//! receives one fitness value per objective.

use crate::error::{Error, Result, check_num};
use crate::model::{Feasibility, Model};
use crate::objective::{Objective, UncuredProportion};
use crate::types::{DosingSchedule, MAX_LENGTH};
use rand::Rng;

/// Default maximum dose per day.
pub const DEFAULT_MAX_DOSE: u32 = 60;

/// Validated, immutable problem definition.
#[derive(Debug)]
pub struct Problem {
    model: Model,
    length: usize,
    max_dose: u32,
    min_start: u32,
    max_failure: f64,
    objectives: Vec<Box<dyn Objective>>,
    failure_rate_idx: Option<usize>,
}

/// Tunable bounds of a [`Problem`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Number of treatment days, 1 to [`MAX_LENGTH`].
    pub length: usize,
    /// Upper bound on every dose, at least 1.
    pub max_dose: u32,
    /// Lower bound on the first dose, 0 to `max_dose`.
    pub min_start: u32,
    /// Maximum acceptable failure rate, 0.0 to 1.0; 1.0 disables the constraint.
    pub max_failure: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            length: MAX_LENGTH,
            max_dose: DEFAULT_MAX_DOSE,
            min_start: 0,
            max_failure: 1.0,
        }
    }
}

/// Failure rate constraint of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraint {
    /// `min(max_failure - failure_rate, 0)`; zero when satisfied.
    pub violation: f64,
    /// Number of violated constraints, 0 or 1.
    pub n_violated: u32,
}

/// Outcome of evaluating one candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// One value per objective, in configured order.
    pub objectives: Vec<f64>,
    /// Present when the problem is constrained.
    pub constraint: Option<Constraint>,
    /// Runs sampled while computing the objectives.
    pub samples: usize,
}

impl Problem {
    /// Create a problem with the given bounds and objectives.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if a bound is out of range or no objective
    /// is given.
    pub fn new(model: Model, bounds: Bounds, objectives: Vec<Box<dyn Objective>>) -> Result<Self> {
        check_num("max_dose", bounds.max_dose, 1..)?;
        check_num("min_start", bounds.min_start, 0..=bounds.max_dose)?;
        check_num("length", bounds.length, 1..=MAX_LENGTH)?;
        check_num("max_failure", bounds.max_failure, 0.0..=1.0)?;
        if objectives.is_empty() {
            return Err(Error::config("at least one objective is required"));
        }

        let failure_rate_idx = objectives.iter().position(|obj| obj.is_failure_rate());

        Ok(Self {
            model,
            length: bounds.length,
            max_dose: bounds.max_dose,
            min_start: bounds.min_start,
            max_failure: bounds.max_failure,
            objectives,
            failure_rate_idx,
        })
    }

    /// Create a problem with default bounds.
    pub fn with_defaults(model: Model, objectives: Vec<Box<dyn Objective>>) -> Result<Self> {
        Self::new(model, Bounds::default(), objectives)
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn n_variables(&self) -> usize {
        self.length
    }

    pub fn n_objectives(&self) -> usize {
        self.objectives.len()
    }

    /// 1 if the failure rate is constrained, else 0.
    pub fn n_constraints(&self) -> usize {
        usize::from(self.is_constrained())
    }

    pub fn is_constrained(&self) -> bool {
        self.max_failure < 1.0
    }

    pub fn lower_bound(&self, idx: usize) -> Result<u32> {
        self.check_idx(idx)?;
        Ok(if idx == 0 { self.min_start } else { 0 })
    }

    pub fn upper_bound(&self, idx: usize) -> Result<u32> {
        self.check_idx(idx)?;
        Ok(self.max_dose)
    }

    /// Evaluate every objective for a candidate schedule and, if constrained,
    /// its failure rate constraint.
    ///
    /// The failure rate reuses the uncured proportion objective when one is
    /// configured; otherwise it comes from an independent evaluation.
    ///
    /// # Errors
    /// Returns [`Error::InvalidInput`] if `doses` does not have exactly
    /// [`Problem::n_variables`] non-negative entries, and propagates
    /// simulation errors.
    pub fn evaluate<R: Rng + ?Sized>(&self, doses: &[i32], rng: &mut R) -> Result<Evaluation> {
        let schedule = self.validate(doses)?;
        let result = self.model.evaluate(&schedule, Feasibility::Always, rng)?;
        let objectives: Vec<f64> = self
            .objectives
            .iter()
            .map(|obj| obj.compute(&result))
            .collect();
        let mut samples = result.samples;

        let constraint = if self.is_constrained() {
            let reused = self
                .failure_rate_idx
                .map(|idx| objectives[idx])
                .filter(|rate| (0.0..=1.0).contains(rate));
            let failure_rate = match reused {
                Some(rate) => rate,
                None => {
                    let extra = self.model.evaluate(&schedule, Feasibility::Always, rng)?;
                    samples += extra.samples;
                    UncuredProportion.compute(&extra)
                }
            };
            Some(self.constraint(failure_rate))
        } else {
            None
        };

        Ok(Evaluation {
            objectives,
            constraint,
            samples,
        })
    }

    /// Evaluate only the first objective.
    pub fn evaluate_first_objective<R: Rng + ?Sized>(
        &self,
        doses: &[i32],
        rng: &mut R,
    ) -> Result<f64> {
        let schedule = self.validate(doses)?;
        let result = self.model.evaluate(&schedule, Feasibility::Always, rng)?;
        Ok(self.objectives[0].compute(&result))
    }

    fn constraint(&self, failure_rate: f64) -> Constraint {
        Constraint {
            violation: (self.max_failure - failure_rate).min(0.0),
            n_violated: u32::from(failure_rate > self.max_failure),
        }
    }

    fn validate(&self, doses: &[i32]) -> Result<DosingSchedule> {
        if doses.len() != self.length {
            return Err(Error::input(format!(
                "schedule length must be {}, but is {}",
                self.length,
                doses.len()
            )));
        }
        DosingSchedule::new(doses)
    }

    fn check_idx(&self, idx: usize) -> Result<()> {
        if idx >= self.length {
            return Err(Error::input(format!(
                "variable index must be below {}, but is {idx}",
                self.length
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective::{maximum_concentration, total_antibiotic, uncured_proportion};
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    fn bounds(length: usize, max_failure: f64) -> Bounds {
        Bounds {
            length,
            max_failure,
            ..Bounds::default()
        }
    }

    #[test]
    fn rejects_invalid_bounds() {
        let model = Model::fixed(1).unwrap();
        let bad = [
            bounds(0, 1.0),
            bounds(11, 1.0),
            bounds(10, -0.1),
            bounds(10, 1.5),
            bounds(10, f64::NAN),
            Bounds {
                max_dose: 0,
                ..Bounds::default()
            },
            Bounds {
                min_start: 61,
                ..Bounds::default()
            },
        ];
        for bounds in bad {
            let err = Problem::new(model, bounds, vec![total_antibiotic()]).unwrap_err();
            assert!(matches!(err, Error::Config(_)), "{bounds:?}");
        }
    }

    #[test]
    fn rejects_empty_objectives() {
        let model = Model::fixed(1).unwrap();
        assert!(Problem::with_defaults(model, Vec::new()).is_err());
    }

    #[test]
    fn exposes_variable_bounds() {
        let model = Model::fixed(1).unwrap();
        let bounds = Bounds {
            length: 4,
            max_dose: 30,
            min_start: 5,
            max_failure: 1.0,
        };
        let problem = Problem::new(model, bounds, vec![total_antibiotic()]).unwrap();
        assert_eq!(problem.n_variables(), 4);
        assert_eq!(problem.lower_bound(0).unwrap(), 5);
        assert_eq!(problem.lower_bound(3).unwrap(), 0);
        assert_eq!(problem.upper_bound(2).unwrap(), 30);
        assert!(problem.upper_bound(4).is_err());
        assert_eq!(problem.n_constraints(), 0);
    }

    #[test]
    fn validates_candidates() {
        let model = Model::fixed(1).unwrap();
        let problem = Problem::new(model, bounds(3, 1.0), vec![total_antibiotic()]).unwrap();
        let mut rng = ChaCha12Rng::seed_from_u64(0);
        assert!(problem.evaluate(&[1, 2], &mut rng).is_err());
        assert!(problem.evaluate(&[1, 2, 3, 4], &mut rng).is_err());
        assert!(problem.evaluate(&[1, -2, 3], &mut rng).is_err());
        let evaluation = problem.evaluate(&[1, 2, 3], &mut rng).unwrap();
        assert_eq!(evaluation.objectives, vec![6.0]);
        assert_eq!(evaluation.constraint, None);
        assert_eq!(evaluation.samples, 1);
    }

    #[test]
    fn constraint_reuses_failure_rate_objective() {
        let model = Model::fixed_with_loads(4, 900, 100).unwrap();
        let problem = Problem::new(
            model,
            bounds(10, 0.5),
            vec![maximum_concentration(), uncured_proportion()],
        )
        .unwrap();
        assert_eq!(problem.n_constraints(), 1);
        let mut rng = ChaCha12Rng::seed_from_u64(0);
        let evaluation = problem.evaluate(&[0; 10], &mut rng).unwrap();
        // Untreated patients are never cured.
        assert_eq!(evaluation.objectives[1], 1.0);
        assert_eq!(evaluation.samples, 4);
        let constraint = evaluation.constraint.unwrap();
        assert_eq!(constraint.violation, -0.5);
        assert_eq!(constraint.n_violated, 1);
    }

    #[test]
    fn constraint_samples_again_without_failure_rate_objective() {
        let model = Model::fixed_with_loads(4, 0, 0).unwrap();
        let problem = Problem::new(model, bounds(10, 0.2), vec![total_antibiotic()]).unwrap();
        let mut rng = ChaCha12Rng::seed_from_u64(0);
        let evaluation = problem.evaluate(&[5; 10], &mut rng).unwrap();
        assert_eq!(evaluation.objectives, vec![50.0]);
        assert_eq!(evaluation.samples, 8);
        assert_eq!(
            evaluation.constraint,
            Some(Constraint {
                violation: 0.0,
                n_violated: 0
            })
        );
    }
}
