//! Objectives computed from the aggregate statistics of an evaluation.
//!
//! Every objective is a pure function of an [`AggregateResult`]. Named
//! objectives can be combined with [`sum`], [`multiply`] and
//! [`conditional_add`] into composite fitness values.

use crate::trace::{MAX_CONCENTRATION, MAX_TOTAL_DOSAGE};
use crate::types::AggregateResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Weight on the extinction term of the reference fitness.
pub const REFERENCE_W1: f64 = 1.0;
/// Weight on the dosage term of the reference fitness.
pub const REFERENCE_W2: f64 = 0.1;
/// Fitness assigned to schedules over the total dosage cap.
pub const PENALTY_DOSAGE: f64 = 1.0e10;
/// Fitness assigned to schedules over the concentration ceiling.
pub const PENALTY_CONCENTRATION: f64 = 1.0e10;

pub trait Objective: fmt::Debug + Send + Sync {
    fn compute(&self, result: &AggregateResult) -> f64;

    /// Whether this objective is the treatment failure rate.
    fn is_failure_rate(&self) -> bool {
        false
    }
}

/// Proportion of sampled patients not cured, in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UncuredProportion;

impl Objective for UncuredProportion {
    fn compute(&self, result: &AggregateResult) -> f64 {
        1.0 - result.both_extinct / result.samples as f64
    }

    fn is_failure_rate(&self) -> bool {
        true
    }
}

/// Amount by which the peak concentration exceeds `limit`, or zero.
#[derive(Debug, Clone, Copy)]
pub struct OverdoseAmount {
    pub limit: f64,
}

impl Objective for OverdoseAmount {
    fn compute(&self, result: &AggregateResult) -> f64 {
        if result.peak_concentration < self.limit {
            0.0
        } else {
            result.peak_concentration - self.limit
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MaximumConcentration;

impl Objective for MaximumConcentration {
    fn compute(&self, result: &AggregateResult) -> f64 {
        result.peak_concentration
    }
}

/// Day of the last non-zero dose, e.g. 7 for `0,0,0,10,10,10,10,0,0,0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreatmentDuration;

impl Objective for TreatmentDuration {
    fn compute(&self, result: &AggregateResult) -> f64 {
        result.duration as f64
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TotalAntibiotic;

impl Objective for TotalAntibiotic {
    fn compute(&self, result: &AggregateResult) -> f64 {
        result.total_dosage
    }
}

/// Reference weighted fitness.
///
/// `w1` weighs the mean of the two per-strain survival proportions and `w2`
/// the total dosage relative to the cap. Schedules over the dosage cap or the
/// concentration ceiling receive a fixed penalty instead, which is well
/// defined even when the stochastic phase was skipped.
#[derive(Debug, Clone, Copy)]
pub struct Weighting {
    pub w1: f64,
    pub w2: f64,
}

impl Default for Weighting {
    fn default() -> Self {
        Self {
            w1: REFERENCE_W1,
            w2: REFERENCE_W2,
        }
    }
}

impl Objective for Weighting {
    fn compute(&self, result: &AggregateResult) -> f64 {
        let v_max = MAX_TOTAL_DOSAGE as f64;
        if result.total_dosage > v_max {
            return PENALTY_DOSAGE;
        }
        if result.peak_concentration > MAX_CONCENTRATION {
            return PENALTY_CONCENTRATION;
        }
        let samples = result.samples as f64;
        let s1_pen = 1.0 - result.s1_extinct / samples;
        let s2_pen = 1.0 - result.s2_extinct / samples;
        self.w1 * 0.5 * (s1_pen + s2_pen) + self.w2 * result.total_dosage / v_max
    }
}

#[derive(Debug)]
pub struct Sum {
    parts: Vec<Box<dyn Objective>>,
}

impl Objective for Sum {
    fn compute(&self, result: &AggregateResult) -> f64 {
        self.parts.iter().map(|part| part.compute(result)).sum()
    }
}

#[derive(Debug)]
pub struct Multiply {
    objective: Box<dyn Objective>,
    factor: f64,
}

impl Objective for Multiply {
    fn compute(&self, result: &AggregateResult) -> f64 {
        self.objective.compute(result) * self.factor
    }
}

/// Adds `extra` to `base` whenever the value of `base` satisfies `predicate`.
pub struct ConditionalAdd<P> {
    base: Box<dyn Objective>,
    predicate: P,
    extra: Box<dyn Objective>,
}

impl<P> fmt::Debug for ConditionalAdd<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionalAdd")
            .field("base", &self.base)
            .field("extra", &self.extra)
            .finish_non_exhaustive()
    }
}

impl<P> Objective for ConditionalAdd<P>
where
    P: Fn(f64) -> bool + Send + Sync,
{
    fn compute(&self, result: &AggregateResult) -> f64 {
        let base = self.base.compute(result);
        if (self.predicate)(base) {
            base + self.extra.compute(result)
        } else {
            base
        }
    }
}

pub fn uncured_proportion() -> Box<dyn Objective> {
    Box::new(UncuredProportion)
}

pub fn overdose_amount(limit: f64) -> Box<dyn Objective> {
    Box::new(OverdoseAmount { limit })
}

pub fn maximum_concentration() -> Box<dyn Objective> {
    Box::new(MaximumConcentration)
}

pub fn treatment_duration() -> Box<dyn Objective> {
    Box::new(TreatmentDuration)
}

pub fn total_antibiotic() -> Box<dyn Objective> {
    Box::new(TotalAntibiotic)
}

pub fn weighting(w1: f64, w2: f64) -> Box<dyn Objective> {
    Box::new(Weighting { w1, w2 })
}

pub fn sum(parts: Vec<Box<dyn Objective>>) -> Box<dyn Objective> {
    Box::new(Sum { parts })
}

pub fn multiply(objective: Box<dyn Objective>, factor: f64) -> Box<dyn Objective> {
    Box::new(Multiply { objective, factor })
}

pub fn conditional_add<P>(
    base: Box<dyn Objective>,
    predicate: P,
    extra: Box<dyn Objective>,
) -> Box<dyn Objective>
where
    P: Fn(f64) -> bool + Send + Sync + 'static,
{
    Box::new(ConditionalAdd {
        base,
        predicate,
        extra,
    })
}

/// Declarative description of an objective, as written in configuration files.
///
/// Unit variants are plain strings (`"uncured_proportion"`); the others are
/// single-key tables (`{ overdose_amount = { limit = 60.0 } }`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveSpec {
    UncuredProportion,
    OverdoseAmount {
        limit: f64,
    },
    MaximumConcentration,
    TreatmentDuration,
    TotalAntibiotic,
    Weighting {
        #[serde(default = "default_w1")]
        w1: f64,
        #[serde(default = "default_w2")]
        w2: f64,
    },
    Sum(Vec<ObjectiveSpec>),
    Multiply {
        objective: Box<ObjectiveSpec>,
        factor: f64,
    },
}

fn default_w1() -> f64 {
    REFERENCE_W1
}

fn default_w2() -> f64 {
    REFERENCE_W2
}

impl ObjectiveSpec {
    pub fn build(&self) -> Box<dyn Objective> {
        match self {
            Self::UncuredProportion => uncured_proportion(),
            Self::OverdoseAmount { limit } => overdose_amount(*limit),
            Self::MaximumConcentration => maximum_concentration(),
            Self::TreatmentDuration => treatment_duration(),
            Self::TotalAntibiotic => total_antibiotic(),
            Self::Weighting { w1, w2 } => weighting(*w1, *w2),
            Self::Sum(parts) => sum(parts.iter().map(Self::build).collect()),
            Self::Multiply { objective, factor } => multiply(objective.build(), *factor),
        }
    }
}
