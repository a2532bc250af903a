use crate::config::Config;
use anyhow::{Context, Result, bail};
use antibiotic::Problem;
use antibiotic::instrument::Instrumented;
use glob::glob;
use rand_chacha::ChaCha12Rng;
use sha2::{Digest, Sha256};
use std::{
    collections::HashMap,
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

const CANDIDATES_FILE: &str = "VAR.tsv";
const FITNESS_FILE: &str = "FUN.tsv";
const REEVALUATED_FILE: &str = "FUN-reevaled.tsv";

pub struct Manager {
    exp_dir: PathBuf,
    cfg: Config,
    problem: Problem,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(exp_dir: P) -> Result<Self> {
        let exp_dir = exp_dir.as_ref().to_path_buf();

        let cfg =
            Config::from_file(exp_dir.join("config.toml")).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        let problem = cfg.build_problem()?;

        Ok(Self {
            exp_dir,
            cfg,
            problem,
        })
    }

    /// Evaluate each schedule and print its fitness vector as a TSV line.
    ///
    /// Columns are the objectives, then the constraint violation and the
    /// number of violated constraints (constrained problems only), then the
    /// number of samples taken.
    pub fn evaluate_schedules(&self, schedules: &[Vec<i32>]) -> Result<()> {
        let mut rng = self.cfg.build_rng()?;
        let mut instrumented = self.instrumented();

        let stdout = std::io::stdout();
        let mut writer = BufWriter::new(stdout.lock());
        for schedule in schedules {
            let evaluation = instrumented
                .evaluate(schedule, &mut rng)
                .with_context(|| format!("failed to evaluate {schedule:?}"))?;

            let mut cols: Vec<String> = evaluation.objectives.iter().map(f64::to_string).collect();
            if let Some(constraint) = evaluation.constraint {
                cols.push(constraint.violation.to_string());
                cols.push(constraint.n_violated.to_string());
            }
            cols.push(evaluation.samples.to_string());
            writeln!(writer, "{}", cols.join("\t")).context("failed to write fitness")?;
        }
        writer.flush().context("failed to flush writer stream")?;

        log::info!("{:?}", instrumented.samples_report());

        Ok(())
    }

    /// Re-evaluate recorded candidates with the first objective.
    ///
    /// Only result directories whose path digest falls in `partition` (out
    /// of `modulus`) are processed, so independent processes can share the
    /// work.
    pub fn reevaluate(&self, partition: usize, modulus: usize) -> Result<()> {
        if modulus < 1 {
            bail!("modulus must be at least 1, but is {modulus}");
        }
        if partition >= modulus {
            bail!("partition must be below {modulus}, but is {partition}");
        }

        let mut rng = self.cfg.build_rng()?;
        for result_dir in self.result_dirs().context("failed to find result dirs")? {
            if digest(&result_dir, modulus) != partition {
                log::info!("skipping {result_dir:?}");
                continue;
            }
            log::info!("processing {result_dir:?}");
            self.reevaluate_dir(&result_dir, &mut rng)
                .with_context(|| format!("failed to reevaluate {result_dir:?}"))?;
        }

        Ok(())
    }

    /// Remove every re-evaluation output.
    pub fn clean(&self) -> Result<()> {
        for file in self.glob_files(REEVALUATED_FILE)? {
            fs::remove_file(&file).with_context(|| format!("failed to remove {file:?}"))?;
            log::info!("removed {file:?}");
        }
        Ok(())
    }

    fn instrumented(&self) -> Instrumented<'_> {
        Instrumented::new(&self.problem, self.cfg.problem.expected_evals)
    }

    fn reevaluate_dir(&self, result_dir: &Path, rng: &mut ChaCha12Rng) -> Result<()> {
        let candidates_file = result_dir.join(CANDIDATES_FILE);
        let contents = fs::read_to_string(&candidates_file)
            .with_context(|| format!("failed to read {candidates_file:?}"))?;

        let output_file = result_dir.join(REEVALUATED_FILE);
        let file = fs::File::create(&output_file)
            .with_context(|| format!("failed to create {output_file:?}"))?;
        let mut writer = BufWriter::new(file);

        let mut seen: HashMap<&str, f64> = HashMap::new();
        let lines = contents.lines().map(str::trim).filter(|line| !line.is_empty());
        for (i_line, line) in lines.enumerate() {
            let fitness = match seen.get(line) {
                Some(&fitness) => {
                    log::debug!("line {i_line}: skipped");
                    fitness
                }
                None => {
                    let candidate = parse_candidate(line, self.problem.n_variables())
                        .with_context(|| format!("invalid candidate on line {i_line}"))?;
                    let fitness = self.problem.evaluate_first_objective(&candidate, rng)?;
                    seen.insert(line, fitness);
                    log::debug!("line {i_line}: processed");
                    fitness
                }
            };
            writeln!(writer, "{fitness}").context("failed to write fitness")?;
        }
        writer.flush().context("failed to flush writer stream")?;

        Ok(())
    }

    fn result_dirs(&self) -> Result<Vec<PathBuf>> {
        let result_dirs = self
            .glob_files(CANDIDATES_FILE)?
            .into_iter()
            .filter_map(|file| file.parent().map(Path::to_path_buf))
            .filter(|dir| dir.join(FITNESS_FILE).is_file())
            .collect();
        Ok(result_dirs)
    }

    fn glob_files(&self, name: &str) -> Result<Vec<PathBuf>> {
        let pattern = self.exp_dir.join("**").join(name);
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let files = glob(pattern)
            .context("failed to glob files")?
            .filter_map(Result::ok)
            .filter(|p| p.is_file())
            .collect();
        Ok(files)
    }
}

/// Parse a whitespace separated candidate, padding it with zeros to `length` doses.
pub fn parse_candidate(line: &str, length: usize) -> Result<Vec<i32>> {
    let mut candidate = line
        .split_whitespace()
        .map(|token| {
            token
                .parse::<i32>()
                .with_context(|| format!("failed to parse dose {token:?}"))
        })
        .collect::<Result<Vec<_>>>()?;
    if candidate.len() > length {
        bail!("candidate must have at most {length} doses, but has {}", candidate.len());
    }
    candidate.resize(length, 0);
    Ok(candidate)
}

/// Parse a comma separated schedule given on the command line.
pub fn parse_schedule(arg: &str) -> Result<Vec<i32>> {
    arg.split(',')
        .map(|token| {
            let token = token.trim();
            token
                .parse::<i32>()
                .with_context(|| format!("failed to parse dose {token:?}"))
        })
        .collect()
}

/// Last byte of the SHA-256 digest of `dir`, modulo `modulus`.
fn digest(dir: &Path, modulus: usize) -> usize {
    let hash = Sha256::digest(dir.to_string_lossy().as_bytes());
    usize::from(hash[hash.len() - 1]) % modulus
}
