pub mod batch;

pub use batch::{search_batch, BatchHit};

use crate::align::bounded::null2::{exp_logsurv, null1_score, null2_score, DomainDef};
use crate::align::bounded::posterior::check_score_agreement;
use crate::align::bounded::structs::{
    CloudBoundGroup, CloudMatrixLinear, CloudSearchParams, DpMatrixSparse, RowBounds,
};
use crate::align::bounded::{
    backward_bounded, cloud_search_backward, cloud_search_forward, find_domains, forward_bounded,
    posterior_bounded, CloudSearchScores, DomainScore,
};
use crate::align::{seed_from_trace, traceback, viterbi};
use crate::errors::Error;
use crate::structs::dp_matrix::DpMatrixDense;
use crate::structs::profile::{Profile, SearchMode, LN_2};
use crate::structs::sequence::Sequence;
use crate::structs::trace::Trace;

use serde::{Deserialize, Serialize};

/// Everything tunable about one search.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SearchParams {
    pub cloud: CloudSearchParams,
    pub mode: SearchMode,
    /// Compute the null2 composition-bias correction.
    pub run_bias: bool,
    /// Bypass cloud search: edgebounds cover the whole matrix.
    pub run_full: bool,
    /// Split the posterior into domains and score each.
    pub run_domains: bool,
    pub rt1: f32,
    pub rt2: f32,
    pub rt3: f32,
    /// Drop the pair when the final E-value exceeds this.
    pub eval_cutoff: f64,
    /// Number of sequences in the database, for E-value computation.
    pub db_size: usize,
    /// Worker capacity limit on (Q+1) * (T+1).
    pub max_cells: usize,
    /// Allowed forward/backward total disagreement, nats.
    pub score_tolerance: f32,
    /// Attach the Viterbi traceback to surviving results.
    pub keep_trace: bool,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            cloud: CloudSearchParams::default(),
            mode: SearchMode::MultiLocal,
            run_bias: true,
            run_full: false,
            run_domains: false,
            rt1: 0.25,
            rt2: 0.10,
            rt3: 0.20,
            eval_cutoff: 10.0,
            db_size: 1,
            max_cells: 100_000_000,
            score_tolerance: 0.01,
            keep_trace: true,
        }
    }
}

/// Scores and geometry for one surviving profile/sequence pair.
#[derive(Clone, Debug)]
pub struct PairResult {
    /// Bounded Forward total, nats.
    pub nat_score: f32,
    /// Null model score, nats.
    pub null_score: f32,
    /// Composition bias correction, nats.
    pub seq_bias: f32,
    /// Bias-uncorrected bit score.
    pub pre_score: f32,
    /// Bias-corrected bit score.
    pub seq_score: f32,
    pub ln_pval: f32,
    pub pval: f64,
    pub evalue: f64,
    /// Cells the bounded passes actually computed vs the full matrix.
    pub cloud_cells: usize,
    pub total_cells: usize,
    pub cloud_fwd_scores: CloudSearchScores,
    pub cloud_bck_scores: CloudSearchScores,
    /// Max score inside the Viterbi range plus each direction's gain
    /// outside it; the composite cloud filter statistic.
    pub cloud_composite_score: f32,
    pub trace: Option<Trace>,
    pub domains: Vec<DomainScore>,
    /// Sum of passing domain bit scores.
    pub domain_sum_score: f32,
}

/// Per-worker scratch: every DP structure the pipeline touches, reused
/// across pairs by growth-only resizing. One worker owns one of these; the
/// pipeline never allocates on the hot path after the first pair.
#[derive(Clone, Debug, Default)]
pub struct Scratch {
    pub viterbi_mx: DpMatrixDense,
    pub trace: Trace,
    pub cloud_mx: CloudMatrixLinear,
    pub forward_bounds: CloudBoundGroup,
    pub backward_bounds: CloudBoundGroup,
    pub row_bounds: RowBounds,
    pub forward_mx: DpMatrixSparse,
    pub backward_mx: DpMatrixSparse,
    pub posterior_mx: DpMatrixSparse,
    pub dom_def: DomainDef,
}

impl Scratch {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Run the full pruned-search pipeline on one profile/sequence pair:
/// Viterbi seed, cloud search, merge/reorient, bounded Forward/Backward,
/// posterior, null2 and final scoring.
///
/// Returns `Ok(None)` when the pair is filtered out (E-value cutoff, or no
/// domain passes), and an error when the pair cannot be scored. The profile
/// is reconfigured for this sequence's length, so workers must own their
/// profile clone.
pub fn search(
    profile: &mut Profile,
    target: &Sequence,
    params: &SearchParams,
    scratch: &mut Scratch,
) -> Result<Option<PairResult>, Error> {
    let target_length = target.length();
    let profile_length = profile.length;

    if profile_length == 0 {
        return Err(Error::InvalidProfile {
            reason: "profile has no match positions".to_string(),
        });
    }
    if target_length == 0 {
        return Err(Error::InvalidSequence {
            reason: "empty sequence".to_string(),
        });
    }

    let total_cells = (target_length + 1) * (profile_length + 1);
    if total_cells > params.max_cells {
        return Err(Error::MatrixOverflow {
            cells: total_cells,
            max_cells: params.max_cells,
        });
    }

    if profile.mode() != params.mode {
        profile.configure_for_search_mode(params.mode);
    }
    profile.configure_for_target_length(target_length);

    // seed alignment
    scratch.viterbi_mx.reuse(target_length, profile_length);
    let viterbi_score = viterbi(profile, target, &mut scratch.viterbi_mx);
    if viterbi_score == -f32::INFINITY {
        return Err(Error::CloudEmpty {
            reason: "viterbi found no alignment path".to_string(),
        });
    }
    traceback(profile, target, &scratch.viterbi_mx, &mut scratch.trace)?;
    let seed = seed_from_trace(&scratch.trace, target)?;

    // cloud geometry
    let (cloud_fwd_scores, cloud_bck_scores) = if params.run_full {
        scratch
            .row_bounds
            .cover_matrix(target_length, profile_length);
        (CloudSearchScores::default(), CloudSearchScores::default())
    } else {
        scratch.cloud_mx.reuse(target_length);
        scratch.forward_bounds.reuse(target_length, profile_length);
        scratch.backward_bounds.reuse(target_length, profile_length);

        let fwd_scores = cloud_search_forward(
            profile,
            target,
            &seed,
            &mut scratch.cloud_mx,
            &params.cloud,
            &mut scratch.forward_bounds,
        )?;
        let bck_scores = cloud_search_backward(
            profile,
            target,
            &seed,
            &mut scratch.cloud_mx,
            &params.cloud,
            &mut scratch.backward_bounds,
        )?;

        CloudBoundGroup::join_bounds(&mut scratch.forward_bounds, &scratch.backward_bounds, 0)?;
        scratch.row_bounds.reuse_from(&scratch.forward_bounds);
        (fwd_scores, bck_scores)
    };
    scratch.row_bounds.error_if_empty()?;
    let cloud_cells = scratch.row_bounds.num_cells();

    // bounded passes
    scratch
        .forward_mx
        .reuse(target_length, profile_length, &scratch.row_bounds);
    scratch
        .backward_mx
        .reuse(target_length, profile_length, &scratch.row_bounds);
    scratch
        .posterior_mx
        .reuse(target_length, profile_length, &scratch.row_bounds);

    let nat_score = forward_bounded(profile, target, &mut scratch.forward_mx, &scratch.row_bounds);
    let backward_total = backward_bounded(
        profile,
        target,
        &mut scratch.backward_mx,
        &scratch.row_bounds,
    );
    check_score_agreement(nat_score, backward_total, params.score_tolerance)?;

    posterior_bounded(
        profile,
        &scratch.forward_mx,
        &scratch.backward_mx,
        &mut scratch.posterior_mx,
        &scratch.row_bounds,
        nat_score,
    )?;

    // bias and final scores
    let null_score = null1_score(target_length);
    let seq_bias = if params.run_bias {
        null2_score(
            &scratch.posterior_mx,
            profile,
            target,
            &scratch.row_bounds,
            &mut scratch.dom_def,
        )
    } else {
        0.0
    };

    let mut domains = Vec::new();
    let mut domain_sum_score = 0.0;
    if params.run_domains {
        domains = find_domains(
            &scratch.posterior_mx,
            profile,
            target,
            &scratch.row_bounds,
            &mut scratch.dom_def,
            (params.rt1, params.rt2, params.rt3),
            nat_score,
            null_score,
        );
        if !domains.iter().any(|domain| domain.passes) {
            return Ok(None);
        }
        domain_sum_score = domains
            .iter()
            .filter(|domain| domain.passes)
            .map(|domain| domain.bit_score)
            .sum();
    }

    let pre_score = (nat_score - null_score) / LN_2;
    let seq_score = (nat_score - (null_score + seq_bias)) / LN_2;
    let ln_pval = exp_logsurv(seq_score, profile.forward_tau, profile.forward_lambda);
    let pval = (ln_pval as f64).exp();
    let evalue = pval * params.db_size as f64;

    if evalue > params.eval_cutoff {
        return Ok(None);
    }

    let inner_max = cloud_fwd_scores
        .inner_max_score
        .max(cloud_bck_scores.inner_max_score);
    let cloud_composite_score = if params.run_full {
        0.0
    } else {
        inner_max
            + (cloud_fwd_scores.max_score - cloud_fwd_scores.inner_max_score)
            + (cloud_bck_scores.max_score - cloud_bck_scores.inner_max_score)
    };

    Ok(Some(PairResult {
        nat_score,
        null_score,
        seq_bias,
        pre_score,
        seq_score,
        ln_pval,
        pval,
        evalue,
        cloud_cells,
        total_cells,
        cloud_fwd_scores,
        cloud_bck_scores,
        cloud_composite_score,
        trace: params.keep_trace.then(|| scratch.trace.clone()),
        domains,
        domain_sum_score,
    }))
}
