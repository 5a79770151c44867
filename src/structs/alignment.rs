use crate::align::bounded::null2::exp_logsurv;
use crate::structs::profile::{Profile, LN_2};
use crate::structs::sequence::{residue_char, Sequence};
use crate::structs::trace::{Trace, TraceState};

/// Scores that flow into the final bit-score / E-value mapping.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScoreParams {
    pub forward_score_nats: f32,
    pub null_score_nats: f32,
    pub bias_correction_score_nats: f32,
    /// Number of sequences in the database, for E-value computation.
    pub db_size: usize,
}

impl ScoreParams {
    pub fn new(db_size: usize) -> Self {
        Self {
            db_size,
            ..Self::default()
        }
    }
}

/// A scored, rendered alignment for one profile/sequence pair.
///
/// Axis naming note: this engine calls the sequence axis "target" and the
/// profile axis "profile"; MMseqs-style outputs label the same columns
/// query/target the other way around. Both namings are exposed so the
/// boundary code can pick either without relabeling.
#[derive(Clone, Debug)]
pub struct Alignment {
    pub profile_name: String,
    pub target_name: String,
    pub profile_start: usize,
    pub profile_end: usize,
    pub target_start: usize,
    pub target_end: usize,
    pub bit_score: f32,
    pub evalue: f64,
    pub cigar: String,
    /// Three-line rendering: profile consensus, center match line, target
    /// residues, plus a state track.
    pub profile_string: String,
    pub center_string: String,
    pub target_string: String,
    pub state_string: String,
}

impl Alignment {
    pub fn from_trace(
        trace: &Trace,
        profile: &Profile,
        target: &Sequence,
        params: &ScoreParams,
    ) -> Self {
        let bit_score = (params.forward_score_nats
            - (params.null_score_nats + params.bias_correction_score_nats))
            / LN_2;
        let ln_pval = exp_logsurv(bit_score, profile.forward_tau, profile.forward_lambda);
        let evalue = (ln_pval as f64).exp() * params.db_size as f64;

        let consensus = profile.consensus.as_bytes();
        let mut profile_string = String::new();
        let mut center_string = String::new();
        let mut target_string = String::new();
        let mut state_string = String::new();

        for step in &trace.steps {
            match step.state {
                TraceState::M => {
                    let cons = consensus
                        .get(step.prof_idx - 1)
                        .map(|&c| c as char)
                        .unwrap_or('x');
                    let residue = residue_char(target.digital(step.seq_idx - 1));
                    profile_string.push(cons);
                    target_string.push(residue);
                    center_string.push(if cons.eq_ignore_ascii_case(&residue) {
                        residue
                    } else if profile.match_score(step.prof_idx, target.digital(step.seq_idx - 1))
                        > 0.0
                    {
                        '+'
                    } else {
                        ' '
                    });
                    state_string.push('M');
                }
                TraceState::I => {
                    profile_string.push('.');
                    target_string
                        .push(residue_char(target.digital(step.seq_idx - 1)).to_ascii_lowercase());
                    center_string.push(' ');
                    state_string.push('I');
                }
                TraceState::D => {
                    let cons = consensus
                        .get(step.prof_idx - 1)
                        .map(|&c| c as char)
                        .unwrap_or('x');
                    profile_string.push(cons);
                    target_string.push('-');
                    center_string.push(' ');
                    state_string.push('D');
                }
                _ => {}
            }
        }

        let (target_start, profile_start) = trace.first_m.unwrap_or((0, 0));
        let (target_end, profile_end) = trace.last_m.unwrap_or((0, 0));

        Self {
            profile_name: profile.name.clone(),
            target_name: target.name.clone(),
            profile_start,
            profile_end,
            target_start,
            target_end,
            bit_score,
            evalue,
            cigar: trace.cigar(),
            profile_string,
            center_string,
            target_string,
            state_string,
        }
    }

    /// MMseqs-style naming: the profile is the "query".
    pub fn query_name(&self) -> &str {
        &self.profile_name
    }

    /// One tab-separated result line:
    /// query, target, qstart, qend, tstart, tend, score, E-value.
    pub fn tab_string(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{:.2}\t{:.2e}",
            self.profile_name,
            self.target_name,
            self.profile_start,
            self.profile_end,
            self.target_start,
            self.target_end,
            self.bit_score,
            self.evalue,
        )
    }
}
