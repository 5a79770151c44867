use crate::log_sum::{log_sum, log_sum3};
use crate::structs::dp_matrix::DpMatrixDense;
use crate::structs::profile::{Profile, Special, SpecialTransition, Transition};
use crate::structs::sequence::Sequence;

/// Dense quadratic Forward pass, the correctness reference for the bounded
/// pass. Returns the total score `C(Q) + C_move` in nats.
pub fn forward(profile: &Profile, target: &Sequence, mx: &mut DpMatrixDense) -> f32 {
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
            let match_score = log_sum(
                log_sum3(
                    mx.get_match(row - 1, col - 1)
                        + profile.transition_score(col - 1, Transition::MM),
                    mx.get_insert(row - 1, col - 1)
                        + profile.transition_score(col - 1, Transition::IM),
                    mx.get_delete(row - 1, col - 1)
                        + profile.transition_score(col - 1, Transition::DM),
                ),
                mx.get_special(Special::B, row - 1)
                    + profile.transition_score(col - 1, Transition::BM),
            ) + profile.match_score(col, residue);
            mx.set_match(row, col, match_score);

            let insert_score = log_sum(
                mx.get_match(row - 1, col) + profile.transition_score(col, Transition::MI),
                mx.get_insert(row - 1, col) + profile.transition_score(col, Transition::II),
            ) + profile.insert_score(col, residue);
            mx.set_insert(row, col, insert_score);

            let delete_score = log_sum(
                mx.get_match(row, col - 1) + profile.transition_score(col - 1, Transition::MD),
                mx.get_delete(row, col - 1) + profile.transition_score(col - 1, Transition::DD),
            );
            mx.set_delete(row, col, delete_score);

            score_end = log_sum3(score_end, match_score + score_e, delete_score + score_e);
        }

        // last column: no insert state, E accepts match and delete freely
        let col = profile_length;
        let match_score = log_sum(
            log_sum3(
                mx.get_match(row - 1, col - 1) + profile.transition_score(col - 1, Transition::MM),
                mx.get_insert(row - 1, col - 1) + profile.transition_score(col - 1, Transition::IM),
                mx.get_delete(row - 1, col - 1) + profile.transition_score(col - 1, Transition::DM),
            ),
            mx.get_special(Special::B, row - 1) + profile.transition_score(col - 1, Transition::BM),
        ) + profile.match_score(col, residue);
        mx.set_match(row, col, match_score);

        let delete_score = log_sum(
            mx.get_match(row, col - 1) + profile.transition_score(col - 1, Transition::MD),
            mx.get_delete(row, col - 1) + profile.transition_score(col - 1, Transition::DD),
        );
        mx.set_delete(row, col, delete_score);

        score_end = log_sum3(score_end, match_score, delete_score);
        mx.set_special(Special::E, row, score_end);

        let score_j = log_sum(
            mx.get_special(Special::J, row - 1)
                + profile.special_score(Special::J, SpecialTransition::Loop),
            score_end + profile.special_score(Special::E, SpecialTransition::Loop),
        );
        mx.set_special(Special::J, row, score_j);

        let score_c = log_sum(
            mx.get_special(Special::C, row - 1)
                + profile.special_score(Special::C, SpecialTransition::Loop),
            score_end + profile.special_score(Special::E, SpecialTransition::Move),
        );
        mx.set_special(Special::C, row, score_c);

        let score_n = mx.get_special(Special::N, row - 1)
            + profile.special_score(Special::N, SpecialTransition::Loop);
        mx.set_special(Special::N, row, score_n);

        let score_b = log_sum(
            score_n + profile.special_score(Special::N, SpecialTransition::Move),
            score_j + profile.special_score(Special::J, SpecialTransition::Move),
        );
        mx.set_special(Special::B, row, score_b);
    }

    mx.get_special(Special::C, target_length)
        + profile.special_score(Special::C, SpecialTransition::Move)
}
