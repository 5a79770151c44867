use crate::align::bounded::structs::{DpMatrixSparse, RowBounds};
use crate::log_sum::{log_sum, log_sum3};
use crate::structs::profile::{Profile, Special};
use crate::structs::sequence::{
    Sequence, ALPHABET_WITH_SPECIALS, AMINO_COUNT, RESIDUE_GAP, RESIDUE_MISSING, RESIDUE_NON,
    RESIDUE_X,
};

/// Null model score for an unaligned sequence of length `length`:
/// `L * ln(L / (L+1)) + ln(1 / (L+1))` nats.
pub fn null1_score(length: usize) -> f32 {
    let p1 = length as f32 / (length as f32 + 1.0);
    length as f32 * p1.ln() + (1.0 - p1).ln()
}

/// Log survival function of the calibrated forward-score tail: the log
/// P-value of scoring at least `x` bits.
pub fn exp_logsurv(x: f32, tau: f32, lambda: f32) -> f32 {
    if x <= tau {
        0.0
    } else {
        -lambda * (x - tau)
    }
}

/// Scratch for the composition-bias correction: per-model-position state
/// frequencies, special-state frequencies, and the derived null2 odds per
/// alphabet symbol.
#[derive(Clone, Debug, Default)]
pub struct DomainDef {
    st_freq: Vec<[f32; 3]>,
    sp_freq: [f32; 5],
    /// Null2 odds ratio per digital symbol, linear space.
    pub null2: [f32; ALPHABET_WITH_SPECIALS],
    /// Expected log bias per query position of the scored range.
    pub null2_exp: Vec<f32>,
    pub seq_bias: f32,
}

impl DomainDef {
    pub fn reuse(&mut self, target_length: usize, profile_length: usize) {
        if self.st_freq.len() < profile_length + 1 {
            self.st_freq.resize(profile_length + 1, [0.0; 3]);
        }
        for freq in self.st_freq.iter_mut() {
            *freq = [0.0; 3];
        }
        self.sp_freq = [0.0; 5];
        self.null2 = [0.0; ALPHABET_WITH_SPECIALS];
        if self.null2_exp.len() < target_length + 1 {
            self.null2_exp.resize(target_length + 1, 0.0);
        }
        self.null2_exp.fill(0.0);
        self.seq_bias = 0.0;
    }
}

/// Composition-bias correction over the whole cloud, following HMMER's
/// `p7_GNull2_ByExpectation`. Returns `seq_bias` in nats.
pub fn null2_score(
    posterior_mx: &DpMatrixSparse,
    profile: &Profile,
    target: &Sequence,
    bounds: &RowBounds,
    dom_def: &mut DomainDef,
) -> f32 {
    null2_score_ranged(
        posterior_mx,
        profile,
        target,
        bounds,
        bounds.target_start,
        bounds.target_end + 1,
        dom_def,
    )
}

/// Composition-bias correction restricted to query rows `[q_beg, q_end)`;
/// the domain scorer re-runs this over each domain's sub-range.
pub fn null2_score_ranged(
    posterior_mx: &DpMatrixSparse,
    profile: &Profile,
    target: &Sequence,
    bounds: &RowBounds,
    q_beg: usize,
    q_end: usize,
    dom_def: &mut DomainDef,
) -> f32 {
    let target_length = target.length();
    let profile_length = profile.length;

    let q_beg = q_beg.max(1).min(target_length);
    let q_end = q_end.max(q_beg + 1).min(target_length + 1);
    let t_beg = bounds.profile_start;
    let t_end = bounds.profile_end.min(profile_length + 1).max(t_beg + 1);

    dom_def.reuse(target_length, profile_length);

    // expected number of times each state was used explaining the range
    for row in q_beg..q_end {
        for interval in bounds.row(row) {
            for col in interval.lb.max(t_beg)..interval.rb.min(t_end) {
                dom_def.st_freq[col][0] += posterior_mx.get_match(row, col);
                dom_def.st_freq[col][1] += posterior_mx.get_insert(row, col);
                dom_def.st_freq[col][2] += posterior_mx.get_delete(row, col);
            }
        }
        for special in [Special::E, Special::N, Special::J, Special::C, Special::B] {
            dom_def.sp_freq[special as usize] += posterior_mx.get_special(special, row);
        }
    }

    // to average per-position log frequencies
    let neglog_q = -((q_end - q_beg) as f32).ln();
    for col in t_beg..t_end {
        for state in 0..3 {
            dom_def.st_freq[col][state] = dom_def.st_freq[col][state].ln() + neglog_q;
        }
    }
    for state in 0..5 {
        dom_def.sp_freq[state] = dom_def.sp_freq[state].ln() + neglog_q;
    }

    let x_factor = log_sum3(
        dom_def.sp_freq[Special::N as usize],
        dom_def.sp_freq[Special::C as usize],
        dom_def.sp_freq[Special::J as usize],
    );

    // expected emission odds per amino acid, summed over paths through the
    // range; the last position contributes match only
    for symbol in 0..AMINO_COUNT as u8 {
        let mut odds = -f32::INFINITY;
        for col in t_beg..t_end - 1 {
            odds = log_sum(
                odds,
                dom_def.st_freq[col][0] + profile.match_score(col, symbol),
            );
            odds = log_sum(
                odds,
                dom_def.st_freq[col][1] + profile.insert_score(col, symbol),
            );
        }
        odds = log_sum(
            odds,
            dom_def.st_freq[t_end - 1][0] + profile.match_score(t_end - 1, symbol),
        );
        odds = log_sum(odds, x_factor);
        dom_def.null2[symbol as usize] = odds.exp();
    }

    // wildcard is the mean over the canonical alphabet; the non-emitting
    // symbols carry no bias
    dom_def.null2[RESIDUE_X as usize] =
        dom_def.null2[..AMINO_COUNT].iter().sum::<f32>() / AMINO_COUNT as f32;
    dom_def.null2[RESIDUE_GAP as usize] = 1.0;
    dom_def.null2[RESIDUE_NON as usize] = 1.0;
    dom_def.null2[RESIDUE_MISSING as usize] = 1.0;

    let mut seq_bias = 0.0f32;
    for row in q_beg..q_end {
        let expected = dom_def.null2[target.digital(row - 1) as usize].ln();
        dom_def.null2_exp[row] = expected;
        seq_bias += expected;
    }

    dom_def.seq_bias = seq_bias;
    seq_bias
}
