pub mod bounded;
pub mod forward;
pub mod viterbi;

pub use forward::forward;
pub use viterbi::{seed_from_trace, traceback, viterbi};
