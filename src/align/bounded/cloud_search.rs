use crate::align::bounded::structs::{Bound, CloudBoundGroup, CloudMatrixLinear, CloudSearchParams, Seed};
use crate::errors::Error;
use crate::log_sum::{log_sum, log_sum3};
use crate::structs::profile::{Profile, Transition};
use crate::structs::sequence::Sequence;

/// Scores observed while the cloud grew. The cell values themselves are
/// discarded; only the geometry feeds the bounded passes, but these maxima
/// drive composite threshold filters.
#[derive(Clone, Copy, Debug, Default)]
pub struct CloudSearchScores {
    /// Best cell score seen anywhere in the cloud.
    pub max_score: f32,
    /// Best cell score seen inside the seed (Viterbi) range.
    pub inner_max_score: f32,
}

/// Anti-diagonal forward cloud search with X-drop pruning.
///
/// Starting on the seed's first aligned cell, walks anti-diagonals toward
/// the matrix corner. Bounds expand freely for `gamma` diagonals, then each
/// new diagonal inherits the previous one's interval pruned against
/// `global_max - alpha` and padded by `beta`. Every surviving diagonal is
/// appended to `bounds` as `(d, lb, rb)`.
pub fn cloud_search_forward(
    profile: &Profile,
    target: &Sequence,
    seed: &Seed,
    mx: &mut CloudMatrixLinear,
    params: &CloudSearchParams,
    bounds: &mut CloudBoundGroup,
) -> Result<CloudSearchScores, Error> {
    let target_length = target.length();
    let profile_length = profile.length;

    // start inside the matrix proper; edge cells have no predecessors
    let start_row = seed.target_start.clamp(1, target_length);
    let start_col = seed.profile_start.clamp(1, profile_length);

    let diag_start = start_row + start_col;
    let diag_end = target_length + profile_length;
    let diag_inner =
        seed.target_end.clamp(1, target_length) + seed.profile_end.clamp(1, profile_length);

    let mut lb = start_row;
    let mut rb = start_row + 1;
    let (mut lb_prev, mut rb_prev) = (0usize, 0usize);
    let (mut lb_prev2, mut rb_prev2) = (0usize, 0usize);

    let mut total_max = -f32::INFINITY;
    let mut inner_max = -f32::INFINITY;
    let mut last_diag = diag_start;

    for (diag_count, diag) in (diag_start..=diag_end).enumerate() {
        let s0 = diag % 3;
        let s1 = (diag - 1) % 3;
        let s2 = (diag - 2) % 3;

        // prune against the running maximum once the free passes are spent
        let (lb_new, rb_new) = if diag_count > params.gamma {
            let limit = total_max - params.alpha;

            let surviving_lb = (lb_prev..rb_prev).find(|&k| mx.cell_max(s1, k) >= limit);
            let Some(surviving_lb) = surviving_lb else {
                // every cell on the previous diagonal died
                break;
            };
            let surviving_rb = (lb_prev..rb_prev)
                .rev()
                .find(|&k| mx.cell_max(s1, k) >= limit)
                .unwrap_or(surviving_lb)
                + 1;

            (
                surviving_lb.saturating_sub(params.beta),
                surviving_rb + params.beta,
            )
        } else {
            (lb, rb)
        };

        // the reachable set grows by one cell per anti-diagonal
        lb = lb_new;
        rb = rb_new + 1;

        // clip against the matrix and the seed's sub-rectangle
        let left_edge = start_row.max(diag.saturating_sub(profile_length));
        let right_edge = (diag - start_col).min(target_length) + 1;
        lb = lb.max(left_edge);
        rb = rb.min(right_edge);
        if lb >= rb {
            break;
        }

        bounds.append(Bound { line: diag, lb, rb });

        let mut diag_max = -f32::INFINITY;
        for k in lb..rb {
            let row = k;
            let col = diag - k;
            let residue = target.digital(row - 1);

            // begin-state entry is folded in free: geometry only
            let match_score = log_sum(
                log_sum3(
                    mx.get_match(s2, k - 1) + profile.transition_score(col - 1, Transition::MM),
                    mx.get_insert(s2, k - 1) + profile.transition_score(col - 1, Transition::IM),
                    mx.get_delete(s2, k - 1) + profile.transition_score(col - 1, Transition::DM),
                ),
                0.0,
            ) + profile.match_score(col, residue);
            mx.set_match(s0, k, match_score);

            let insert_score = if col < profile_length {
                log_sum(
                    mx.get_match(s1, k - 1) + profile.transition_score(col, Transition::MI),
                    mx.get_insert(s1, k - 1) + profile.transition_score(col, Transition::II),
                ) + profile.insert_score(col, residue)
            } else {
                -f32::INFINITY
            };
            mx.set_insert(s0, k, insert_score);

            let delete_score = log_sum(
                mx.get_match(s1, k) + profile.transition_score(col - 1, Transition::MD),
                mx.get_delete(s1, k) + profile.transition_score(col - 1, Transition::DD),
            );
            mx.set_delete(s0, k, delete_score);

            diag_max = diag_max.max(match_score).max(insert_score).max(delete_score);
        }

        total_max = total_max.max(diag_max);
        if diag <= diag_inner {
            inner_max = inner_max.max(diag_max);
        }

        // the two-back stripe becomes the next diagonal's storage
        mx.scrub(s2, lb_prev2, rb_prev2);
        lb_prev2 = lb_prev;
        rb_prev2 = rb_prev;
        lb_prev = lb;
        rb_prev = rb;
        last_diag = diag;
    }

    if bounds.is_empty() {
        return Err(Error::CloudEmpty {
            reason: "forward cloud search emitted no bounds".to_string(),
        });
    }

    // leave the stripes clean for the next search over this matrix
    mx.scrub(last_diag % 3, lb_prev, rb_prev);
    mx.scrub((last_diag + 2) % 3, lb_prev2, rb_prev2);

    Ok(CloudSearchScores {
        max_score: total_max,
        inner_max_score: inner_max,
    })
}

/// Anti-diagonal backward cloud search; the mirror of
/// [`cloud_search_forward`], walking from the seed's last aligned cell
/// toward the matrix origin with the reverse recurrence. The emitted bound
/// list is reversed so both sets come out ascending by anti-diagonal.
pub fn cloud_search_backward(
    profile: &Profile,
    target: &Sequence,
    seed: &Seed,
    mx: &mut CloudMatrixLinear,
    params: &CloudSearchParams,
    bounds: &mut CloudBoundGroup,
) -> Result<CloudSearchScores, Error> {
    let target_length = target.length();
    let profile_length = profile.length;

    let end_row = seed.target_end.clamp(1, target_length);
    let end_col = seed.profile_end.clamp(1, profile_length);

    let diag_end = end_row + end_col;
    let diag_inner =
        seed.target_start.clamp(1, target_length) + seed.profile_start.clamp(1, profile_length);

    let mut lb = end_row;
    let mut rb = end_row + 1;
    let (mut lb_prev, mut rb_prev) = (0usize, 0usize);
    let (mut lb_prev2, mut rb_prev2) = (0usize, 0usize);

    let mut total_max = -f32::INFINITY;
    let mut inner_max = -f32::INFINITY;
    let mut last_diag = diag_end;

    for (diag_count, diag) in (2..=diag_end).rev().enumerate() {
        let s0 = diag % 3;
        let s1 = (diag + 1) % 3;
        let s2 = (diag + 2) % 3;

        let (lb_new, rb_new) = if diag_count > params.gamma {
            let limit = total_max - params.alpha;

            let surviving_lb = (lb_prev..rb_prev).find(|&k| mx.cell_max(s1, k) >= limit);
            let Some(surviving_lb) = surviving_lb else {
                break;
            };
            let surviving_rb = (lb_prev..rb_prev)
                .rev()
                .find(|&k| mx.cell_max(s1, k) >= limit)
                .unwrap_or(surviving_lb)
                + 1;

            (
                surviving_lb.saturating_sub(params.beta),
                surviving_rb + params.beta,
            )
        } else {
            (lb, rb)
        };

        // growth is toward smaller rows in the backward pass
        lb = lb_new.saturating_sub(1);
        rb = rb_new;

        let left_edge = 1usize.max(diag.saturating_sub(end_col));
        let right_edge = end_row.min(diag - 1) + 1;
        lb = lb.max(left_edge);
        rb = rb.min(right_edge);
        if lb >= rb {
            break;
        }

        bounds.append(Bound { line: diag, lb, rb });

        let mut diag_max = -f32::INFINITY;
        for k in lb..rb {
            let row = k;
            let col = diag - k;
            // emissions of the next row's residue
            let next_residue = if row < target_length {
                Some(target.digital(row))
            } else {
                None
            };
            let (match_emit, insert_emit) = match next_residue {
                Some(residue) => (
                    if col < profile_length {
                        profile.match_score(col + 1, residue)
                    } else {
                        -f32::INFINITY
                    },
                    profile.insert_score(col, residue),
                ),
                None => (-f32::INFINITY, -f32::INFINITY),
            };

            // end-state exit is folded in free, mirroring the forward pass
            let match_score = log_sum(
                log_sum3(
                    mx.get_match(s2, k + 1)
                        + profile.transition_score(col, Transition::MM)
                        + match_emit,
                    mx.get_insert(s1, k + 1)
                        + profile.transition_score(col, Transition::MI)
                        + insert_emit,
                    mx.get_delete(s1, k) + profile.transition_score(col, Transition::MD),
                ),
                0.0,
            );
            mx.set_match(s0, k, match_score);

            let insert_score = log_sum(
                mx.get_match(s2, k + 1) + profile.transition_score(col, Transition::IM) + match_emit,
                mx.get_insert(s1, k + 1) + profile.transition_score(col, Transition::II) + insert_emit,
            );
            mx.set_insert(s0, k, insert_score);

            let delete_score = log_sum3(
                mx.get_match(s2, k + 1) + profile.transition_score(col, Transition::DM) + match_emit,
                mx.get_delete(s1, k) + profile.transition_score(col, Transition::DD),
                0.0,
            );
            mx.set_delete(s0, k, delete_score);

            diag_max = diag_max.max(match_score).max(insert_score).max(delete_score);
        }

        total_max = total_max.max(diag_max);
        if diag >= diag_inner {
            inner_max = inner_max.max(diag_max);
        }

        mx.scrub(s2, lb_prev2, rb_prev2);
        lb_prev2 = lb_prev;
        rb_prev2 = rb_prev;
        lb_prev = lb;
        rb_prev = rb;
        last_diag = diag;
    }

    if bounds.is_empty() {
        return Err(Error::CloudEmpty {
            reason: "backward cloud search emitted no bounds".to_string(),
        });
    }

    mx.scrub(last_diag % 3, lb_prev, rb_prev);
    mx.scrub((last_diag + 1) % 3, lb_prev2, rb_prev2);

    bounds.reverse();

    Ok(CloudSearchScores {
        max_score: total_max,
        inner_max_score: inner_max,
    })
}
