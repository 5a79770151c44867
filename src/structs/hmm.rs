use crate::errors::Error;
use crate::structs::sequence::AMINO_COUNT;

/// Background residue frequencies for the 20-letter amino alphabet.
pub const BACKGROUND_FREQUENCIES: [f32; AMINO_COUNT] = [
    0.0787945, // A
    0.0151600, // C
    0.0535222, // D
    0.0668298, // E
    0.0397062, // F
    0.0695071, // G
    0.0229198, // H
    0.0590092, // I
    0.0594422, // K
    0.0963728, // L
    0.0237718, // M
    0.0414386, // N
    0.0482904, // P
    0.0395639, // Q
    0.0540978, // R
    0.0683364, // S
    0.0540687, // T
    0.0673417, // V
    0.0114135, // W
    0.0304133, // Y
];

pub const HMM_MATCH_TO_MATCH: usize = 0;
pub const HMM_MATCH_TO_INSERT: usize = 1;
pub const HMM_MATCH_TO_DELETE: usize = 2;
pub const HMM_INSERT_TO_MATCH: usize = 3;
pub const HMM_INSERT_TO_INSERT: usize = 4;
pub const HMM_DELETE_TO_MATCH: usize = 5;
pub const HMM_DELETE_TO_DELETE: usize = 6;

/// One model position in probability space.
///
/// Transitions are the seven core probabilities in the order M->M, M->I,
/// M->D, I->M, I->I, D->M, D->D; the B->M entry distribution is derived
/// later, during profile configuration.
#[derive(Clone, Debug)]
pub struct HmmNode {
    pub match_probs: [f32; AMINO_COUNT],
    pub insert_probs: [f32; AMINO_COUNT],
    pub transitions: [f32; 7],
}

impl Default for HmmNode {
    fn default() -> Self {
        Self {
            match_probs: [0.0; AMINO_COUNT],
            insert_probs: [0.0; AMINO_COUNT],
            transitions: [0.0; 7],
        }
    }
}

/// An in-memory probability-space profile HMM, as produced by an external
/// parser. `nodes[0]` is the begin node: its transitions participate in the
/// entry distribution, its emissions are unused.
#[derive(Clone, Debug, Default)]
pub struct Hmm {
    pub name: String,
    pub accession: String,
    /// Number of match positions; `nodes.len() == length + 1`.
    pub length: usize,
    pub consensus: String,
    pub nodes: Vec<HmmNode>,
    /// Calibrated forward-distribution location parameter.
    pub forward_tau: f32,
    /// Calibrated forward-distribution scale parameter.
    pub forward_lambda: f32,
}

impl Hmm {
    pub fn validate(&self) -> Result<(), Error> {
        if self.length == 0 {
            return Err(Error::InvalidProfile {
                reason: "model has zero match positions".to_string(),
            });
        }
        if self.nodes.len() != self.length + 1 {
            return Err(Error::InvalidProfile {
                reason: format!(
                    "node count {} does not match length {}",
                    self.nodes.len(),
                    self.length
                ),
            });
        }

        for (idx, node) in self.nodes.iter().enumerate() {
            let emissions = node.match_probs.iter().chain(node.insert_probs.iter());
            let all = emissions.chain(node.transitions.iter());
            for &p in all {
                if !p.is_finite() || p < 0.0 {
                    return Err(Error::InvalidProfile {
                        reason: format!("negative or non-finite probability at node {idx}"),
                    });
                }
            }
        }

        Ok(())
    }
}
