//! Event-driven birth-death simulation of a single treatment.
//!
//! Each run is a Gillespie-style stochastic simulation of the two strains
//! under a piecewise exponentially decaying antibiotic concentration. Doses
//! are added at day boundaries; between boundaries the concentration decays
//! from the level recorded when the day began.

use crate::error::{Error, Result};
use crate::params::{DECAY, Rates};
use crate::types::{DosingSchedule, MAX_LENGTH, RunResult};
use rand::prelude::*;
use rand_distr::{OpenClosed01, StandardUniform};

/// End of the simulated horizon.
pub const HORIZON: f64 = 15.0;

/// Number of day iterations per run.
const N_DAYS: usize = MAX_LENGTH + 2;

/// Events allowed in a single run before it is aborted.
pub const MAX_EVENTS: u64 = 50_000_000;

/// Initial bacterial loads of the two strains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Loads {
    pub s1: i32,
    pub s2: i32,
}

/// Single-run simulator for one dosing schedule.
///
/// Precomputes the day boundaries and the dose added at the start of each
/// day. Day 1 receives no drug; schedule slot `i` is added at time `i + 1`
/// and the last day stretches to [`HORIZON`].
#[derive(Debug, Clone)]
pub struct Engine {
    loads: Loads,
    bounds: [f64; N_DAYS],
    doses: [f64; N_DAYS],
}

impl Engine {
    pub fn new(schedule: &DosingSchedule, loads: Loads) -> Self {
        let mut bounds = [0.0; N_DAYS];
        for (i_day, bound) in bounds.iter_mut().enumerate() {
            *bound = (i_day + 1) as f64;
        }
        bounds[N_DAYS - 1] = HORIZON;

        let mut doses = [0.0; N_DAYS];
        for (slot, &dose) in doses[1..=MAX_LENGTH].iter_mut().zip(schedule.doses()) {
            *slot = f64::from(dose);
        }

        Self {
            loads,
            bounds,
            doses,
        }
    }

    /// Perform one stochastic realization and return the final populations.
    ///
    /// Every event consumes exactly two draws from `rng`: one to select the
    /// event, then one for the waiting time.
    ///
    /// # Errors
    /// Returns [`Error::Degenerate`] if the event rates sum to zero (or a
    /// non-finite value) while bacteria remain, and [`Error::EventLimit`] if
    /// the run exceeds [`MAX_EVENTS`].
    pub fn run<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<RunResult> {
        let outcome = self.simulate(rng, MAX_EVENTS)?;
        log::trace!(
            "run ended at time {:.3} after {} events",
            outcome.time,
            outcome.n_events
        );
        Ok(outcome.result)
    }

    fn simulate<R: Rng + ?Sized>(&self, rng: &mut R, max_events: u64) -> Result<Outcome> {
        let mut s1 = self.loads.s1;
        let mut s2 = self.loads.s2;
        let mut conc = 0.0;
        let mut time = 0.0;
        let mut n_events = 0;

        'days: for (&bound, &dose) in self.bounds.iter().zip(&self.doses) {
            if s1 < 1 && s2 < 1 {
                break;
            }

            conc += dose;
            let day_conc = conc;
            let day_start = time;

            while time <= bound {
                let rates = Rates::new(s1, s2, conc);
                let rate_sum = rates.sum();
                if !(rate_sum > 0.0 && rate_sum.is_finite()) {
                    return Err(Error::Degenerate { rate_sum, s1, s2 });
                }

                // Partition [0, 1) in the fixed order growth 1, growth 2, death 1, death 2.
                let x: f64 = rng.sample(StandardUniform);
                if x <= rates.growth_1 / rate_sum {
                    s1 += 1;
                } else if x <= (rates.growth_1 + rates.growth_2) / rate_sum {
                    s2 += 1;
                } else if x <= (rates.growth_1 + rates.growth_2 + rates.death_1) / rate_sum {
                    s1 -= 1;
                } else {
                    s2 -= 1;
                }

                let u: f64 = rng.sample(OpenClosed01);
                time -= u.ln() / rate_sum;
                conc = day_conc * (-DECAY * (time - day_start)).exp();

                n_events += 1;
                if n_events > max_events {
                    return Err(Error::EventLimit {
                        limit: max_events,
                        time,
                    });
                }

                if s1 < 1 && s2 < 1 {
                    break 'days;
                }
            }
        }

        Ok(Outcome {
            result: RunResult { s1, s2 },
            time,
            n_events,
        })
    }
}

/// Final state of one realization.
#[derive(Debug, Clone, Copy)]
struct Outcome {
    result: RunResult,
    time: f64,
    n_events: u64,
}
