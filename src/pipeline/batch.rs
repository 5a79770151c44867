use crate::pipeline::{search, PairResult, Scratch, SearchParams};
use crate::structs::{Profile, Sequence};

use std::cell::RefCell;

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use thread_local::ThreadLocal;

/// One surviving pair from a batch search.
#[derive(Clone, Debug)]
pub struct BatchHit {
    pub profile_idx: usize,
    pub target_idx: usize,
    pub result: PairResult,
}

/// Search many (profile, sequence) pairs across the rayon pool.
///
/// Each thread gets a copy of all the profiles and one scratch, initialized
/// on first use and reused for every pair the thread handles; length
/// configuration therefore never races. Pairs that fail to score are
/// reported and skipped, and never take down the worker.
pub fn search_batch(
    profiles: &[Profile],
    targets: &[Sequence],
    pairs: &[(usize, usize)],
    params: &SearchParams,
) -> Vec<BatchHit> {
    let thread_state: ThreadLocal<RefCell<(Vec<Profile>, Scratch)>> = ThreadLocal::new();

    pairs
        .par_iter()
        .filter_map(|&(profile_idx, target_idx)| {
            let state = thread_state
                .get_or(|| RefCell::new((profiles.to_vec(), Scratch::default())));
            let mut state = state.borrow_mut();
            let (thread_profiles, scratch) = &mut *state;

            match search(
                &mut thread_profiles[profile_idx],
                &targets[target_idx],
                params,
                scratch,
            ) {
                Ok(Some(result)) => Some(BatchHit {
                    profile_idx,
                    target_idx,
                    result,
                }),
                Ok(None) => None,
                Err(err) => {
                    eprintln!(
                        "search failed for profile {profile_idx} vs target {target_idx}: {err}"
                    );
                    None
                }
            }
        })
        .collect()
}
