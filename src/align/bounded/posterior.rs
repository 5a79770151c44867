use crate::align::bounded::structs::{DpMatrixSparse, RowBounds};
use crate::errors::Error;
use crate::structs::profile::{Profile, Special, SpecialTransition};

/// Posterior decoding over the cloud.
///
/// For every cloud cell, `post = exp(fwd + bck - overall)` for the match
/// and insert states; the delete state is zeroed deliberately, since it
/// emits no residue and must not contribute to the composition bias. The
/// N/J/C posteriors come from their LOOP transitions. Each row is then
/// normalized so the in-model plus flanking mass sums to one.
///
/// `overall` is the bounded Forward total `C(Q) + C_move`.
pub fn posterior_bounded(
    profile: &Profile,
    forward_mx: &DpMatrixSparse,
    backward_mx: &DpMatrixSparse,
    posterior_mx: &mut DpMatrixSparse,
    bounds: &RowBounds,
    overall: f32,
) -> Result<(), Error> {
    let target_length = forward_mx.target_length;
    let profile_length = profile.length;

    posterior_mx.set_special(Special::E, 0, 0.0);
    posterior_mx.set_special(Special::N, 0, 0.0);
    posterior_mx.set_special(Special::J, 0, 0.0);
    posterior_mx.set_special(Special::B, 0, 0.0);
    posterior_mx.set_special(Special::C, 0, 0.0);

    for interval in bounds.row(0) {
        for col in interval.lb..interval.rb.min(profile_length + 1) {
            posterior_mx.set_match(0, col, 0.0);
            posterior_mx.set_insert(0, col, 0.0);
            posterior_mx.set_delete(0, col, 0.0);
        }
    }

    for row in 1..=target_length {
        let mut denom = 0.0f32;

        for interval in bounds.row(row) {
            for col in interval.lb..interval.rb.min(profile_length + 1) {
                if col == 0 {
                    posterior_mx.set_match(row, col, 0.0);
                    posterior_mx.set_insert(row, col, 0.0);
                    posterior_mx.set_delete(row, col, 0.0);
                    continue;
                }

                let match_post = (forward_mx.get_match(row, col)
                    + backward_mx.get_match(row, col)
                    - overall)
                    .exp();
                posterior_mx.set_match(row, col, match_post);
                denom += match_post;

                let insert_post = if col < profile_length {
                    (forward_mx.get_insert(row, col) + backward_mx.get_insert(row, col) - overall)
                        .exp()
                } else {
                    0.0
                };
                posterior_mx.set_insert(row, col, insert_post);
                denom += insert_post;

                posterior_mx.set_delete(row, col, 0.0);
            }
        }

        posterior_mx.set_special(Special::E, row, 0.0);
        posterior_mx.set_special(Special::B, row, 0.0);

        let n_post = (forward_mx.get_special(Special::N, row - 1)
            + backward_mx.get_special(Special::N, row)
            + profile.special_score(Special::N, SpecialTransition::Loop)
            - overall)
            .exp();
        posterior_mx.set_special(Special::N, row, n_post);

        let j_post = (forward_mx.get_special(Special::J, row - 1)
            + backward_mx.get_special(Special::J, row)
            + profile.special_score(Special::J, SpecialTransition::Loop)
            - overall)
            .exp();
        posterior_mx.set_special(Special::J, row, j_post);

        let c_post = (forward_mx.get_special(Special::C, row - 1)
            + backward_mx.get_special(Special::C, row)
            + profile.special_score(Special::C, SpecialTransition::Loop)
            - overall)
            .exp();
        posterior_mx.set_special(Special::C, row, c_post);

        denom += n_post + j_post + c_post;

        if denom <= 0.0 || !denom.is_finite() {
            return Err(Error::CloudEmpty {
                reason: format!("posterior total on row {row} is zero"),
            });
        }

        let scale = 1.0 / denom;
        for interval in bounds.row(row) {
            for col in interval.lb.max(1)..interval.rb.min(profile_length + 1) {
                let match_post = posterior_mx.get_match(row, col);
                posterior_mx.set_match(row, col, match_post * scale);
                let insert_post = posterior_mx.get_insert(row, col);
                posterior_mx.set_insert(row, col, insert_post * scale);
            }
        }
        posterior_mx.set_special(Special::N, row, n_post * scale);
        posterior_mx.set_special(Special::J, row, j_post * scale);
        posterior_mx.set_special(Special::C, row, c_post * scale);
    }

    Ok(())
}

/// Check the forward/backward total agreement that a well-formed cloud
/// guarantees.
pub fn check_score_agreement(forward: f32, backward: f32, tolerance: f32) -> Result<(), Error> {
    if (forward - backward).abs() > tolerance {
        return Err(Error::ScoreMismatch {
            forward,
            backward,
            tolerance,
        });
    }
    Ok(())
}
