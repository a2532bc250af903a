//! Error types for model construction and evaluation.

use thiserror::Error;

/// Result type alias using the crate [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while configuring or evaluating the antibiotic model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A model or problem parameter is out of range.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A candidate schedule or query was rejected.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Event rates summed to zero (or a non-finite value) while bacteria remain.
    #[error("degenerate event rates (sum = {rate_sum}) with populations ({s1}, {s2})")]
    Degenerate { rate_sum: f64, s1: i32, s2: i32 },

    /// A single run exceeded the event budget without reaching the horizon.
    #[error("run exceeded {limit} events at time {time}")]
    EventLimit { limit: u64, time: f64 },
}

impl Error {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub(crate) fn input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// Fail with [`Error::Config`] unless `num` lies in `range`.
pub(crate) fn check_num<T, R>(name: &str, num: T, range: R) -> Result<()>
where
    T: PartialOrd + std::fmt::Debug,
    R: std::ops::RangeBounds<T> + std::fmt::Debug,
{
    if !range.contains(&num) {
        return Err(Error::config(format!(
            "{name} must be in the range {range:?}, but is {num:?}"
        )));
    }
    Ok(())
}
