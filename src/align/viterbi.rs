use crate::align::bounded::structs::Seed;
use crate::errors::Error;
use crate::structs::dp_matrix::DpMatrixDense;
use crate::structs::profile::{Profile, Special, SpecialTransition, Transition};
use crate::structs::sequence::Sequence;
use crate::structs::trace::{Trace, TraceState};

/// Tolerance for matching a cell against its recomputed predecessors.
const TRACE_TOLERANCE: f32 = 1e-4;

/// Fill the dense matrix with the Plan7 Viterbi recurrence and return the
/// optimal score `C(Q) + C_move` in nats. The matrix must have been reused
/// for this pair.
pub fn viterbi(profile: &Profile, target: &Sequence, mx: &mut DpMatrixDense) -> f32 {
    let target_length = target.length();
    let profile_length = profile.length;

    let score_e = if profile.is_local() {
        0.0
    } else {
        -f32::INFINITY
    };

    mx.set_special(Special::N, 0, 0.0);
    mx.set_special(
        Special::B,
        0,
        profile.special_score(Special::N, SpecialTransition::Move),
    );

    for row in 1..=target_length {
        let residue = target.digital(row - 1);
        let mut score_end = -f32::INFINITY;

        for col in 1..profile_length {
            let prev_match =
                mx.get_match(row - 1, col - 1) + profile.transition_score(col - 1, Transition::MM);
            let prev_insert =
                mx.get_insert(row - 1, col - 1) + profile.transition_score(col - 1, Transition::IM);
            let prev_delete =
                mx.get_delete(row - 1, col - 1) + profile.transition_score(col - 1, Transition::DM);
            let prev_begin = mx.get_special(Special::B, row - 1)
                + profile.transition_score(col - 1, Transition::BM);
            let match_score = prev_match
                .max(prev_insert)
                .max(prev_delete)
                .max(prev_begin)
                + profile.match_score(col, residue);
            mx.set_match(row, col, match_score);

            let prev_match = mx.get_match(row - 1, col) + profile.transition_score(col, Transition::MI);
            let prev_insert =
                mx.get_insert(row - 1, col) + profile.transition_score(col, Transition::II);
            mx.set_insert(
                row,
                col,
                prev_match.max(prev_insert) + profile.insert_score(col, residue),
            );

            let prev_match = mx.get_match(row, col - 1) + profile.transition_score(col - 1, Transition::MD);
            let prev_delete =
                mx.get_delete(row, col - 1) + profile.transition_score(col - 1, Transition::DD);
            mx.set_delete(row, col, prev_match.max(prev_delete));

            score_end = score_end.max(match_score + score_e);
        }

        // last column: no insert state, and E accepts the delete state
        let col = profile_length;
        let prev_match =
            mx.get_match(row - 1, col - 1) + profile.transition_score(col - 1, Transition::MM);
        let prev_insert =
            mx.get_insert(row - 1, col - 1) + profile.transition_score(col - 1, Transition::IM);
        let prev_delete =
            mx.get_delete(row - 1, col - 1) + profile.transition_score(col - 1, Transition::DM);
        let prev_begin =
            mx.get_special(Special::B, row - 1) + profile.transition_score(col - 1, Transition::BM);
        let match_score = prev_match
            .max(prev_insert)
            .max(prev_delete)
            .max(prev_begin)
            + profile.match_score(col, residue);
        mx.set_match(row, col, match_score);

        let prev_match = mx.get_match(row, col - 1) + profile.transition_score(col - 1, Transition::MD);
        let prev_delete = mx.get_delete(row, col - 1) + profile.transition_score(col - 1, Transition::DD);
        let delete_score = prev_match.max(prev_delete);
        mx.set_delete(row, col, delete_score);

        score_end = score_end.max(match_score).max(delete_score);
        mx.set_special(Special::E, row, score_end);

        let loop_j = mx.get_special(Special::J, row - 1)
            + profile.special_score(Special::J, SpecialTransition::Loop);
        let from_e = score_end + profile.special_score(Special::E, SpecialTransition::Loop);
        mx.set_special(Special::J, row, loop_j.max(from_e));

        let loop_c = mx.get_special(Special::C, row - 1)
            + profile.special_score(Special::C, SpecialTransition::Loop);
        let from_e = score_end + profile.special_score(Special::E, SpecialTransition::Move);
        mx.set_special(Special::C, row, loop_c.max(from_e));

        let score_n = mx.get_special(Special::N, row - 1)
            + profile.special_score(Special::N, SpecialTransition::Loop);
        mx.set_special(Special::N, row, score_n);

        let from_n = score_n + profile.special_score(Special::N, SpecialTransition::Move);
        let from_j = mx.get_special(Special::J, row)
            + profile.special_score(Special::J, SpecialTransition::Move);
        mx.set_special(Special::B, row, from_n.max(from_j));
    }

    mx.get_special(Special::C, target_length)
        + profile.special_score(Special::C, SpecialTransition::Move)
}

#[inline]
fn matches(a: f32, b: f32) -> bool {
    (a - b).abs() < TRACE_TOLERANCE
}

fn trace_fail(state: TraceState, seq_idx: usize, prof_idx: usize) -> Error {
    Error::InvalidTraceback {
        state: state.name(),
        seq_idx,
        prof_idx,
    }
}

/// Recover the optimal alignment from a filled Viterbi matrix.
///
/// Ties break by state priority B > M > I > D. The trace comes back in
/// S -> T order with `first_m` / `last_m` recorded.
pub fn traceback(
    profile: &Profile,
    target: &Sequence,
    mx: &DpMatrixDense,
    trace: &mut Trace,
) -> Result<(), Error> {
    let target_length = target.length();
    let profile_length = profile.length;

    trace.reuse(target_length, profile_length);

    let mut row = target_length;
    let mut col = 0usize;

    trace.push(TraceState::T, row, 0);
    trace.push(TraceState::C, row, 0);
    let mut prev = TraceState::C;

    while prev != TraceState::S {
        let current = match prev {
            TraceState::C => {
                let score = mx.get_special(Special::C, row);
                if score == -f32::INFINITY {
                    return Err(trace_fail(TraceState::C, row, col));
                }
                if row > 0
                    && matches(
                        score,
                        mx.get_special(Special::C, row - 1)
                            + profile.special_score(Special::C, SpecialTransition::Loop),
                    )
                {
                    TraceState::C
                } else if matches(
                    score,
                    mx.get_special(Special::E, row)
                        + profile.special_score(Special::E, SpecialTransition::Move),
                ) {
                    TraceState::E
                } else {
                    return Err(trace_fail(TraceState::C, row, col));
                }
            }

            TraceState::E => {
                let score = mx.get_special(Special::E, row);
                if score == -f32::INFINITY {
                    return Err(trace_fail(TraceState::E, row, col));
                }
                if profile.is_local() {
                    col = (1..=profile_length)
                        .rev()
                        .find(|&j| matches(score, mx.get_match(row, j)))
                        .unwrap_or(0);
                    if col > 0 {
                        TraceState::M
                    } else if matches(score, mx.get_delete(row, profile_length)) {
                        col = profile_length;
                        TraceState::D
                    } else {
                        return Err(trace_fail(TraceState::E, row, col));
                    }
                } else if matches(score, mx.get_match(row, profile_length)) {
                    col = profile_length;
                    TraceState::M
                } else if matches(score, mx.get_delete(row, profile_length)) {
                    col = profile_length;
                    TraceState::D
                } else {
                    return Err(trace_fail(TraceState::E, row, col));
                }
            }

            TraceState::M => {
                if row == 0 || col == 0 {
                    return Err(trace_fail(TraceState::M, row, col));
                }
                let score = mx.get_match(row, col);
                let residue = target.digital(row - 1);
                let emit = profile.match_score(col, residue);

                let state = if matches(
                    score,
                    mx.get_special(Special::B, row - 1)
                        + profile.transition_score(col - 1, Transition::BM)
                        + emit,
                ) {
                    TraceState::B
                } else if matches(
                    score,
                    mx.get_match(row - 1, col - 1)
                        + profile.transition_score(col - 1, Transition::MM)
                        + emit,
                ) {
                    TraceState::M
                } else if matches(
                    score,
                    mx.get_insert(row - 1, col - 1)
                        + profile.transition_score(col - 1, Transition::IM)
                        + emit,
                ) {
                    TraceState::I
                } else if matches(
                    score,
                    mx.get_delete(row - 1, col - 1)
                        + profile.transition_score(col - 1, Transition::DM)
                        + emit,
                ) {
                    TraceState::D
                } else {
                    return Err(trace_fail(TraceState::M, row, col));
                };
                row -= 1;
                col -= 1;
                state
            }

            TraceState::D => {
                if col == 0 {
                    return Err(trace_fail(TraceState::D, row, col));
                }
                let score = mx.get_delete(row, col);
                let state = if matches(
                    score,
                    mx.get_match(row, col - 1) + profile.transition_score(col - 1, Transition::MD),
                ) {
                    TraceState::M
                } else if matches(
                    score,
                    mx.get_delete(row, col - 1) + profile.transition_score(col - 1, Transition::DD),
                ) {
                    TraceState::D
                } else {
                    return Err(trace_fail(TraceState::D, row, col));
                };
                col -= 1;
                state
            }

            TraceState::I => {
                if row == 0 {
                    return Err(trace_fail(TraceState::I, row, col));
                }
                let score = mx.get_insert(row, col);
                let residue = target.digital(row - 1);
                let emit = profile.insert_score(col, residue);
                let state = if matches(
                    score,
                    mx.get_match(row - 1, col) + profile.transition_score(col, Transition::MI) + emit,
                ) {
                    TraceState::M
                } else if matches(
                    score,
                    mx.get_insert(row - 1, col)
                        + profile.transition_score(col, Transition::II)
                        + emit,
                ) {
                    TraceState::I
                } else {
                    return Err(trace_fail(TraceState::I, row, col));
                };
                row -= 1;
                state
            }

            TraceState::B => {
                let score = mx.get_special(Special::B, row);
                if matches(
                    score,
                    mx.get_special(Special::N, row)
                        + profile.special_score(Special::N, SpecialTransition::Move),
                ) {
                    TraceState::N
                } else if matches(
                    score,
                    mx.get_special(Special::J, row)
                        + profile.special_score(Special::J, SpecialTransition::Move),
                ) {
                    TraceState::J
                } else {
                    return Err(trace_fail(TraceState::B, row, col));
                }
            }

            TraceState::J => {
                let score = mx.get_special(Special::J, row);
                if score == -f32::INFINITY {
                    return Err(trace_fail(TraceState::J, row, col));
                }
                if row > 0
                    && matches(
                        score,
                        mx.get_special(Special::J, row - 1)
                            + profile.special_score(Special::J, SpecialTransition::Loop),
                    )
                {
                    TraceState::J
                } else if matches(
                    score,
                    mx.get_special(Special::E, row)
                        + profile.special_score(Special::E, SpecialTransition::Loop),
                ) {
                    TraceState::E
                } else {
                    return Err(trace_fail(TraceState::J, row, col));
                }
            }

            TraceState::N => {
                if row == 0 {
                    TraceState::S
                } else {
                    TraceState::N
                }
            }

            state => return Err(trace_fail(state, row, col)),
        };

        trace.push(current, row, col);

        // emit-on-transition states defer their row decrement to the step
        // they leave themselves
        if current == prev
            && matches!(current, TraceState::N | TraceState::J | TraceState::C)
        {
            row -= 1;
        }

        prev = current;
    }

    trace.finish();
    Ok(())
}

/// Derive the cloud-search anchor from a Viterbi traceback.
pub fn seed_from_trace(trace: &Trace, target: &Sequence) -> Result<Seed, Error> {
    match (trace.first_m, trace.last_m) {
        (Some((seq_start, prof_start)), Some((seq_end, prof_end))) => Ok(Seed {
            target_name: target.name.clone(),
            target_start: seq_start,
            target_end: seq_end,
            profile_start: prof_start,
            profile_end: prof_end,
        }),
        _ => Err(Error::CloudEmpty {
            reason: "viterbi path contains no match state".to_string(),
        }),
    }
}
