use crate::align::bounded::null2::{null2_score_ranged, DomainDef};
use crate::align::bounded::structs::{DpMatrixSparse, RowBounds};
use crate::structs::profile::{Profile, LN_2};
use crate::structs::sequence::Sequence;

/// One reportable domain: a contiguous run of query positions whose
/// posterior mass sits in the model.
#[derive(Clone, Copy, Debug)]
pub struct DomainScore {
    /// First and last query position of the domain (inclusive).
    pub target_start: usize,
    pub target_end: usize,
    /// Composition bias assessed over this domain alone, nats.
    pub seq_bias: f32,
    /// Bias-corrected score of the pair attributed to this domain, bits.
    pub bit_score: f32,
    /// Mean in-model posterior mass across the domain's rows.
    pub mean_mass: f32,
    /// Whether the domain clears the reporting threshold `rt3`.
    pub passes: bool,
}

/// Split the posterior into domains.
///
/// A domain is a maximal run of rows whose in-model posterior mass stays at
/// or above `rt2`, containing at least one row at or above `rt1`. Each
/// domain is scored independently: null2 re-runs over its sub-range, and
/// the domain passes when its mean mass reaches `rt3`.
#[allow(clippy::too_many_arguments)]
pub fn find_domains(
    posterior_mx: &DpMatrixSparse,
    profile: &Profile,
    target: &Sequence,
    bounds: &RowBounds,
    dom_def: &mut DomainDef,
    thresholds: (f32, f32, f32),
    nat_score: f32,
    null_score: f32,
) -> Vec<DomainScore> {
    let (rt1, rt2, rt3) = thresholds;
    let mut domains = Vec::new();

    let first_row = bounds.target_start.max(1);
    let last_row = bounds.target_end;

    let row_mass = |row: usize| -> f32 {
        bounds
            .row(row)
            .iter()
            .flat_map(|interval| interval.lb.max(1)..interval.rb.min(profile.length + 1))
            .map(|col| posterior_mx.get_match(row, col) + posterior_mx.get_insert(row, col))
            .sum()
    };

    let mut row = first_row;
    while row <= last_row {
        let mass = row_mass(row);
        if mass < rt2 {
            row += 1;
            continue;
        }

        // open a run; track whether it ever clears rt1
        let run_start = row;
        let mut peak = mass;
        let mut total = mass;
        while row < last_row && {
            let next = row_mass(row + 1);
            if next >= rt2 {
                peak = peak.max(next);
                total += next;
                true
            } else {
                false
            }
        } {
            row += 1;
        }
        let run_end = row;
        row += 1;

        if peak < rt1 {
            continue;
        }

        let seq_bias = null2_score_ranged(
            posterior_mx,
            profile,
            target,
            bounds,
            run_start,
            run_end + 1,
            dom_def,
        );
        let bit_score = (nat_score - (null_score + seq_bias)) / LN_2;
        let mean_mass = total / (run_end - run_start + 1) as f32;

        domains.push(DomainScore {
            target_start: run_start,
            target_end: run_end,
            seq_bias,
            bit_score,
            mean_mass,
            passes: mean_mass >= rt3,
        });
    }

    domains
}
