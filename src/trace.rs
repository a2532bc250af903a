//! Deterministic antibiotic concentration over the treatment window.

use crate::params::DECAY;
use crate::types::{DosingSchedule, MAX_LENGTH};

/// Total dosage above which a schedule is infeasible.
pub const MAX_TOTAL_DOSAGE: u64 = 184;
/// Concentration above which a schedule is infeasible.
pub const MAX_CONCENTRATION: f64 = 60.0;

/// Day-start concentrations produced by a dosing schedule.
///
/// `levels[i]` is the concentration right after the dose of day `i + 1`,
/// accumulating the exponentially decayed level of the previous day.
#[derive(Debug, Clone, PartialEq)]
pub struct ConcentrationTrace {
    levels: [f64; MAX_LENGTH],
    total: u64,
}

impl ConcentrationTrace {
    pub fn new(schedule: &DosingSchedule) -> Self {
        let carry = (-DECAY).exp();
        let mut levels = [0.0; MAX_LENGTH];
        let mut prev = 0.0;
        for (level, &dose) in levels.iter_mut().zip(schedule.doses()) {
            *level = f64::from(dose) + prev * carry;
            prev = *level;
        }
        Self {
            levels,
            total: schedule.total(),
        }
    }

    pub fn levels(&self) -> &[f64; MAX_LENGTH] {
        &self.levels
    }

    /// Highest day-start concentration, never below zero.
    pub fn peak(&self) -> f64 {
        self.levels.iter().copied().fold(0.0, f64::max)
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Whether the schedule breaks the dosage cap or the concentration ceiling.
    pub fn exceeds_limits(&self) -> bool {
        self.peak() > MAX_CONCENTRATION || self.total > MAX_TOTAL_DOSAGE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace(doses: &[i32]) -> ConcentrationTrace {
        ConcentrationTrace::new(&DosingSchedule::new(doses).unwrap())
    }

    #[test]
    fn zero_schedule_has_zero_peak() {
        let trace = trace(&[0; 10]);
        assert_eq!(trace.peak(), 0.0);
        assert_eq!(trace.total(), 0);
        assert!(!trace.exceeds_limits());
    }

    #[test]
    fn single_dose_peaks_on_its_day() {
        let trace = trace(&[0, 0, 30]);
        assert_eq!(trace.levels()[2], 30.0);
        assert!((trace.levels()[3] - 30.0 * (-DECAY).exp()).abs() < 1e-12);
        assert_eq!(trace.peak(), 30.0);
    }

    #[test]
    fn repeated_doses_accumulate() {
        let trace = trace(&[10; 10]);
        let carry = (-DECAY).exp();
        let steady = 10.0 / (1.0 - carry);
        assert!(trace.peak() > 10.0 && trace.peak() < steady);
        assert_eq!(trace.peak(), trace.levels()[9]);
        assert!(!trace.exceeds_limits());
    }

    #[test]
    fn detects_concentration_overdose() {
        let trace = trace(&[40, 40]);
        assert!(trace.peak() > MAX_CONCENTRATION);
        assert!(trace.exceeds_limits());
    }

    #[test]
    fn detects_dosage_overdose() {
        let trace = trace(&[19; 10]);
        assert_eq!(trace.total(), 190);
        assert!(trace.peak() <= MAX_CONCENTRATION);
        assert!(trace.exceeds_limits());
    }
}
