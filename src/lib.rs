//! Stochastic model of antibiotic treatment for dosing schedule optimization.
//!
//! Two bacterial strains, one susceptible and one partially resistant, grow
//! and die in a continuous-time birth-death process while a daily dosing
//! schedule drives the antibiotic concentration. Repeated runs estimate how
//! often a schedule cures the patient, and objectives turn those estimates
//! into fitness values for a multi-objective optimizer.
//!
//! ```no_run
//! use antibiotic::objective::{maximum_concentration, uncured_proportion};
//! use antibiotic::{Bounds, Model, Problem};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha12Rng;
//!
//! let model = Model::fixed_with_loads(1000, 700, 100)?;
//! let problem = Problem::new(
//!     model,
//!     Bounds::default(),
//!     vec![uncured_proportion(), maximum_concentration()],
//! )?;
//! let mut rng = ChaCha12Rng::seed_from_u64(42);
//! let evaluation = problem.evaluate(&[30, 20, 20, 15, 15, 10, 0, 0, 0, 0], &mut rng)?;
//! println!("{:?} from {} samples", evaluation.objectives, evaluation.samples);
//! # Ok::<(), antibiotic::Error>(())
//! ```

pub mod engine;
pub mod error;
pub mod instrument;
pub mod model;
pub mod objective;
pub mod params;
pub mod problem;
pub mod stats;
pub mod trace;
pub mod types;

pub use error::{Error, Result};
pub use model::{Feasibility, Model, SamplePolicy};
pub use objective::{Objective, ObjectiveSpec};
pub use problem::{Bounds, Constraint, Evaluation, Problem};
pub use types::{AggregateResult, DosingSchedule, MAX_LENGTH, RunResult};
