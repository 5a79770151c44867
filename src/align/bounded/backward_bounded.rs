use crate::align::bounded::structs::{DpMatrixSparse, RowBounds};
use crate::log_sum::{log_sum, log_sum3};
use crate::structs::profile::{Profile, Special, SpecialTransition, Transition};
use crate::structs::sequence::Sequence;

/// Plan7 Backward restricted to the cells of a row-mode edgebound set,
/// iterating rows Q..0. Returns the total score `N(0)` in nats; on a
/// symmetric cloud this agrees with the bounded Forward total.
pub fn backward_bounded(
    profile: &Profile,
    target: &Sequence,
    mx: &mut DpMatrixSparse,
    bounds: &RowBounds,
) -> f32 {
    let target_length = target.length();
    let profile_length = profile.length;

    let score_e = if profile.is_local() {
        0.0
    } else {
        -f32::INFINITY
    };

    // bottom row: only C and E are live, and the last column connects to E
    let row = target_length;
    mx.set_special(
        Special::C,
        row,
        profile.special_score(Special::C, SpecialTransition::Move),
    );
    let end_score = mx.get_special(Special::C, row)
        + profile.special_score(Special::E, SpecialTransition::Move);
    mx.set_special(Special::E, row, end_score);

    if mx.contains(row, profile_length) {
        mx.set_match(row, profile_length, end_score);
        mx.set_delete(row, profile_length, end_score);
    }
    for interval in bounds.row(row).iter().rev() {
        let col_start = interval.lb.max(1);
        let col_end = interval.rb.min(profile_length);
        for col in (col_start..col_end).rev() {
            mx.set_match(
                row,
                col,
                log_sum(
                    end_score + score_e,
                    mx.get_delete(row, col + 1) + profile.transition_score(col, Transition::MD),
                ),
            );
            mx.set_delete(
                row,
                col,
                log_sum(
                    end_score + score_e,
                    mx.get_delete(row, col + 1) + profile.transition_score(col, Transition::DD),
                ),
            );
        }
    }

    for row in (0..target_length).rev() {
        // emissions of the next row's residue
        let residue = target.digital(row);

        // B sums entry into every reachable match on the next row
        let mut score_begin = -f32::INFINITY;
        for interval in bounds.row(row + 1) {
            let col_start = interval.lb.max(1);
            let col_end = interval.rb.min(profile_length + 1);
            for col in col_start..col_end {
                score_begin = log_sum(
                    score_begin,
                    mx.get_match(row + 1, col)
                        + profile.transition_score(col - 1, Transition::BM)
                        + profile.match_score(col, residue),
                );
            }
        }
        mx.set_special(Special::B, row, score_begin);

        if row == 0 {
            mx.set_special(
                Special::N,
                0,
                log_sum(
                    mx.get_special(Special::N, 1)
                        + profile.special_score(Special::N, SpecialTransition::Loop),
                    score_begin + profile.special_score(Special::N, SpecialTransition::Move),
                ),
            );
            break;
        }

        let score_j = log_sum(
            mx.get_special(Special::J, row + 1)
                + profile.special_score(Special::J, SpecialTransition::Loop),
            score_begin + profile.special_score(Special::J, SpecialTransition::Move),
        );
        mx.set_special(Special::J, row, score_j);

        let score_c = mx.get_special(Special::C, row + 1)
            + profile.special_score(Special::C, SpecialTransition::Loop);
        mx.set_special(Special::C, row, score_c);

        let score_end = log_sum(
            score_j + profile.special_score(Special::E, SpecialTransition::Loop),
            score_c + profile.special_score(Special::E, SpecialTransition::Move),
        );
        mx.set_special(Special::E, row, score_end);

        mx.set_special(
            Special::N,
            row,
            log_sum(
                mx.get_special(Special::N, row + 1)
                    + profile.special_score(Special::N, SpecialTransition::Loop),
                score_begin + profile.special_score(Special::N, SpecialTransition::Move),
            ),
        );

        if mx.contains(row, profile_length) {
            mx.set_match(row, profile_length, score_end);
            mx.set_delete(row, profile_length, score_end);
        }

        for interval in bounds.row(row).iter().rev() {
            let col_start = interval.lb.max(1);
            let col_end = interval.rb.min(profile_length);

            for col in (col_start..col_end).rev() {
                let from_match = mx.get_match(row + 1, col + 1)
                    + profile.transition_score(col, Transition::MM)
                    + profile.match_score(col + 1, residue);
                let from_insert = mx.get_insert(row + 1, col)
                    + profile.transition_score(col, Transition::MI)
                    + profile.insert_score(col, residue);
                let from_delete =
                    mx.get_delete(row, col + 1) + profile.transition_score(col, Transition::MD);
                mx.set_match(
                    row,
                    col,
                    log_sum(
                        log_sum(from_match, from_insert),
                        log_sum(from_delete, score_end + score_e),
                    ),
                );

                let from_match = mx.get_match(row + 1, col + 1)
                    + profile.transition_score(col, Transition::IM)
                    + profile.match_score(col + 1, residue);
                let from_insert = mx.get_insert(row + 1, col)
                    + profile.transition_score(col, Transition::II)
                    + profile.insert_score(col, residue);
                mx.set_insert(row, col, log_sum(from_match, from_insert));

                let from_match = mx.get_match(row + 1, col + 1)
                    + profile.transition_score(col, Transition::DM)
                    + profile.match_score(col + 1, residue);
                let from_delete =
                    mx.get_delete(row, col + 1) + profile.transition_score(col, Transition::DD);
                mx.set_delete(
                    row,
                    col,
                    log_sum3(from_match, from_delete, score_end + score_e),
                );
            }
        }
    }

    mx.get_special(Special::N, 0)
}
