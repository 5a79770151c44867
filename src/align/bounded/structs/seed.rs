use serde::{Deserialize, Serialize};

/// A rough alignment anchor for cloud search: the first and last aligned
/// cell of some seed alignment. Usually derived from the Viterbi traceback,
/// but any external aligner's coordinates work.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Seed {
    pub target_name: String,
    pub target_start: usize,
    pub target_end: usize,
    pub profile_start: usize,
    pub profile_end: usize,
}
