//! The crate's one error type, for the handful of fallible operations that
//! aren't part of the hot path. Abnormal *runtime* conditions are reported
//! as state — flip-flops, OC, logs — never as `Result`; construction-time
//! validation is the exception.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum G15Error {
    #[error("CN seed block has {actual} words, expected {expected}")]
    InvalidCnBlock { expected: usize, actual: usize },

    #[cfg(feature = "persistence")]
    #[error("failed to deserialize snapshot: {0}")]
    Deserialize(String),
}
