use thiserror::Error;

/// Errors raised by the alignment engine.
///
/// Every error aborts the current profile/sequence pair and is returned to
/// the caller; the worker's scratch structures remain reusable and are made
/// defined again by the next reuse. Nothing is retried internally.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("invalid profile: {reason}")]
    InvalidProfile { reason: String },

    #[error("invalid sequence: {reason}")]
    InvalidSequence { reason: String },

    #[error("no traceback predecessor for {state} at ({seq_idx}, {prof_idx})")]
    InvalidTraceback {
        state: &'static str,
        seq_idx: usize,
        prof_idx: usize,
    },

    #[error("cloud is empty: {reason}")]
    CloudEmpty { reason: String },

    #[error("forward/backward scores disagree: {forward} vs {backward} (tolerance {tolerance})")]
    ScoreMismatch {
        forward: f32,
        backward: f32,
        tolerance: f32,
    },

    #[error("matrix of {cells} cells exceeds the worker capacity limit of {max_cells}")]
    MatrixOverflow { cells: usize, max_cells: usize },
}
