use anyhow::{Context, Result};
use antibiotic::model::{DEFAULT_LOAD_1, DEFAULT_LOAD_2};
use antibiotic::problem::DEFAULT_MAX_DOSE;
use antibiotic::{Bounds, MAX_LENGTH, Model, ObjectiveSpec, Problem, SamplePolicy};
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Experiment configuration.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub model: ModelConfig,
    #[serde(default)]
    pub problem: ProblemConfig,
}

/// Stochastic model parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// Sampling policy, e.g. `{ fixed = { runs = 1000 } }`.
    pub sampling: SamplePolicy,
    /// Initial bacterial load of strain 1.
    #[serde(default = "default_load_1")]
    pub initial_load_1: i32,
    /// Initial bacterial load of strain 2.
    #[serde(default = "default_load_2")]
    pub initial_load_2: i32,
    /// Random seed; drawn from the OS when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Optimization problem parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ProblemConfig {
    /// Number of treatment days.
    pub length: usize,
    /// Maximum dose per day.
    pub max_dose: u32,
    /// Minimum dose on the first day.
    pub min_start: u32,
    /// Maximum acceptable failure rate (1.0 disables the constraint).
    pub max_failure: f64,
    /// Objectives, in fitness vector order.
    pub objectives: Vec<ObjectiveSpec>,
    /// Evaluation budget reported in progress logs.
    pub expected_evals: usize,
}

impl Default for ProblemConfig {
    fn default() -> Self {
        Self {
            length: MAX_LENGTH,
            max_dose: DEFAULT_MAX_DOSE,
            min_start: 0,
            max_failure: 1.0,
            objectives: vec![
                ObjectiveSpec::UncuredProportion,
                ObjectiveSpec::MaximumConcentration,
            ],
            expected_evals: 25_000,
        }
    }
}

fn default_load_1() -> i32 {
    DEFAULT_LOAD_1
}

fn default_load_2() -> i32 {
    DEFAULT_LOAD_2
}

impl Config {
    /// Load a [`Config`] from a file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config = toml::from_str(&contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        self.build_problem()?;
        Ok(())
    }

    pub fn build_model(&self) -> Result<Model> {
        let model = Model::new(
            self.model.sampling,
            self.model.initial_load_1,
            self.model.initial_load_2,
        )
        .context("invalid model parameters")?;
        Ok(model)
    }

    pub fn build_problem(&self) -> Result<Problem> {
        let bounds = Bounds {
            length: self.problem.length,
            max_dose: self.problem.max_dose,
            min_start: self.problem.min_start,
            max_failure: self.problem.max_failure,
        };
        let objectives = self
            .problem
            .objectives
            .iter()
            .map(ObjectiveSpec::build)
            .collect();
        let problem = Problem::new(self.build_model()?, bounds, objectives)
            .context("invalid problem parameters")?;
        Ok(problem)
    }

    /// Random number generator seeded from the configuration, or from the OS.
    pub fn build_rng(&self) -> Result<ChaCha12Rng> {
        let rng = match self.model.seed {
            Some(seed) => ChaCha12Rng::seed_from_u64(seed),
            None => ChaCha12Rng::try_from_os_rng().context("failed to seed rng")?,
        };
        Ok(rng)
    }
}
