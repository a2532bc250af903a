//! Schedule and result data types.

use crate::error::{Error, Result};

/// Maximum number of treatment days (dose slots).
pub const MAX_LENGTH: usize = 10;

/// Validated daily dosing schedule, padded to [`MAX_LENGTH`] slots.
///
/// Slot `i` is the dose administered at the start of treatment day `i + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DosingSchedule {
    doses: [u32; MAX_LENGTH],
}

impl DosingSchedule {
    /// Validate `doses` and pad them with zeros to [`MAX_LENGTH`] slots.
    ///
    /// # Errors
    /// Returns [`Error::InvalidInput`] if there are more than [`MAX_LENGTH`]
    /// doses or any dose is negative.
    pub fn new(doses: &[i32]) -> Result<Self> {
        if doses.len() > MAX_LENGTH {
            return Err(Error::input(format!(
                "schedule length must be at most {MAX_LENGTH}, but is {}",
                doses.len()
            )));
        }
        let mut padded = [0; MAX_LENGTH];
        for (i_day, (slot, &dose)) in padded.iter_mut().zip(doses).enumerate() {
            *slot = u32::try_from(dose).map_err(|_| {
                Error::input(format!("dose {i_day} must be non-negative, but is {dose}"))
            })?;
        }
        Ok(Self { doses: padded })
    }

    /// Padded doses, one per treatment day.
    pub fn doses(&self) -> &[u32; MAX_LENGTH] {
        &self.doses
    }

    /// Sum of all doses.
    pub fn total(&self) -> u64 {
        self.doses.iter().map(|&dose| u64::from(dose)).sum()
    }

    /// 1-based index of the last non-zero dose, or 0 if there is none.
    pub fn duration(&self) -> usize {
        self.doses
            .iter()
            .rposition(|&dose| dose != 0)
            .map_or(0, |i_day| i_day + 1)
    }
}

/// Final population counts of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunResult {
    pub s1: i32,
    pub s2: i32,
}

impl RunResult {
    pub fn s1_extinct(&self) -> bool {
        self.s1 < 1
    }

    pub fn s2_extinct(&self) -> bool {
        self.s2 < 1
    }

    /// Both strains extinct (the patient is cured).
    pub fn cured(&self) -> bool {
        self.s1_extinct() && self.s2_extinct()
    }
}

/// Aggregate statistics of one evaluation, consumed by every objective.
///
/// When the feasibility short-circuit skips the stochastic phase the
/// extinction counts are NaN and `samples` is zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateResult {
    /// Sum of all doses.
    pub total_dosage: f64,
    /// Highest day-start concentration over the treatment.
    pub peak_concentration: f64,
    /// Runs where strain 1 went extinct.
    pub s1_extinct: f64,
    /// Runs where strain 2 went extinct.
    pub s2_extinct: f64,
    /// Runs where both strains went extinct.
    pub both_extinct: f64,
    /// Runs actually executed.
    pub samples: usize,
    /// Treatment duration in days.
    pub duration: usize,
}

impl AggregateResult {
    /// Whether the stochastic phase ran.
    pub fn sampled(&self) -> bool {
        self.samples > 0
    }
}
