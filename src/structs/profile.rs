use crate::errors::Error;
use crate::structs::hmm::{
    Hmm, BACKGROUND_FREQUENCIES, HMM_DELETE_TO_MATCH, HMM_MATCH_TO_DELETE, HMM_MATCH_TO_INSERT,
    HMM_MATCH_TO_MATCH,
};
use crate::structs::sequence::{Sequence, AMINO_COUNT, RESIDUE_X};

use serde::{Deserialize, Serialize};

pub const LN_2: f32 = std::f32::consts::LN_2;

/// Alignment mode: local vs glocal controls the entry distribution and
/// whether E accepts from the final delete state; unihit vs multihit
/// controls the E-state loop and J usage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchMode {
    #[default]
    MultiLocal,
    MultiGlocal,
    UniLocal,
    UniGlocal,
}

impl SearchMode {
    pub fn is_local(self) -> bool {
        matches!(self, SearchMode::MultiLocal | SearchMode::UniLocal)
    }

    pub fn is_multihit(self) -> bool {
        matches!(self, SearchMode::MultiLocal | SearchMode::MultiGlocal)
    }
}

/// Core-model transitions, indexing the per-node score table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    MM = 0,
    MI = 1,
    MD = 2,
    IM = 3,
    II = 4,
    DM = 5,
    DD = 6,
    BM = 7,
}

/// Special states owning LOOP/MOVE transitions (B carries none, but keeps
/// its slot so special-state matrices index uniformly).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Special {
    E = 0,
    N = 1,
    J = 2,
    C = 3,
    B = 4,
}

pub const NUM_SPECIALS: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpecialTransition {
    Loop = 0,
    Move = 1,
}

#[derive(Clone, Debug)]
struct ScoreNode {
    match_scores: [f32; AMINO_COUNT],
    insert_scores: [f32; AMINO_COUNT],
    transitions: [f32; 8],
}

impl Default for ScoreNode {
    fn default() -> Self {
        Self {
            match_scores: [-f32::INFINITY; AMINO_COUNT],
            insert_scores: [-f32::INFINITY; AMINO_COUNT],
            transitions: [-f32::INFINITY; 8],
        }
    }
}

/// A search-ready, log-space profile.
///
/// Built once from a probability-space [`Hmm`]; mode configuration rewrites
/// the entry distribution and E-state transitions, length configuration
/// rewrites the N/J/C LOOP/MOVE mass. Length configuration is per-pair
/// state, so workers clone the profile before configuring it.
#[derive(Clone, Debug, Default)]
pub struct Profile {
    pub name: String,
    pub accession: String,
    /// Number of match positions (T).
    pub length: usize,
    pub consensus: String,
    pub forward_tau: f32,
    pub forward_lambda: f32,
    mode: SearchMode,
    nodes: Vec<ScoreNode>,
    specials: [[f32; 2]; NUM_SPECIALS],
    /// Probability-space model retained for reconfiguration.
    core: Vec<crate::structs::hmm::HmmNode>,
    target_length: usize,
}

impl Profile {
    pub fn new(hmm: &Hmm) -> Result<Self, Error> {
        hmm.validate()?;

        let mut profile = Self {
            name: hmm.name.clone(),
            accession: hmm.accession.clone(),
            length: hmm.length,
            consensus: hmm.consensus.clone(),
            forward_tau: hmm.forward_tau,
            forward_lambda: hmm.forward_lambda,
            mode: SearchMode::default(),
            nodes: vec![ScoreNode::default(); hmm.length + 1],
            specials: [[-f32::INFINITY; 2]; NUM_SPECIALS],
            core: hmm.nodes.clone(),
            target_length: 0,
        };

        profile.configure_for_search_mode(SearchMode::default());
        profile.configure_for_target_length(100);

        Ok(profile)
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    pub fn is_local(&self) -> bool {
        self.mode.is_local()
    }

    pub fn is_multihit(&self) -> bool {
        self.mode.is_multihit()
    }

    /// Rebuild all score tables for the given alignment mode.
    pub fn configure_for_search_mode(&mut self, mode: SearchMode) {
        self.mode = mode;
        let t = self.length;

        for node in self.nodes.iter_mut() {
            *node = ScoreNode::default();
        }

        // core transitions; nodes 0 and T stay unreachable
        for k in 1..t {
            for x in 0..7 {
                self.nodes[k].transitions[x] = self.core[k].transitions[x].ln();
            }
        }

        // emission log-odds against the background
        for k in 1..=t {
            for x in 0..AMINO_COUNT {
                self.nodes[k].match_scores[x] =
                    (self.core[k].match_probs[x] / BACKGROUND_FREQUENCIES[x]).ln();
            }
        }
        for k in 1..t {
            for x in 0..AMINO_COUNT {
                self.nodes[k].insert_scores[x] = 0.0;
            }
        }

        // entry distribution: node j-1 holds the entry into match j
        if mode.is_local() {
            let occ = self.occupancy();
            let mut z = 0.0f32;
            for (k, &o) in occ.iter().enumerate().skip(1) {
                z += o * (t - k + 1) as f32;
            }
            for k in 1..=t {
                self.nodes[k - 1].transitions[Transition::BM as usize] = (occ[k] / z).ln();
            }
        } else {
            self.nodes[0].transitions[Transition::BM as usize] =
                (1.0 - self.core[0].transitions[HMM_MATCH_TO_DELETE]).ln();
            for k in 1..t {
                self.nodes[k].transitions[Transition::BM as usize] =
                    (1.0 - self.core[k].transitions[HMM_DELETE_TO_MATCH]).ln();
            }
        }

        if mode.is_multihit() {
            self.specials[Special::E as usize] = [-LN_2, -LN_2];
        } else {
            self.specials[Special::E as usize] = [-f32::INFINITY, 0.0];
        }

        if self.target_length > 0 {
            self.configure_for_target_length(self.target_length);
        }
    }

    /// Rewrite the N/J/C LOOP/MOVE transitions so the flanking states bear
    /// L / (2 + nj) of the unannotated sequence length L.
    pub fn configure_for_target_length(&mut self, length: usize) {
        self.target_length = length;
        let nj: f32 = if self.mode.is_multihit() { 1.0 } else { 0.0 };

        let p_move = (2.0 + nj) / (length as f32 + 2.0 + nj);
        let p_loop = 1.0 - p_move;

        for special in [Special::N, Special::J, Special::C] {
            self.specials[special as usize] = [p_loop.ln(), p_move.ln()];
        }
    }

    fn occupancy(&self) -> Vec<f32> {
        let t = self.length;
        let mut occ = vec![0.0f32; t + 1];

        occ[1] = self.core[0].transitions[HMM_MATCH_TO_INSERT]
            + self.core[0].transitions[HMM_MATCH_TO_MATCH];
        for k in 2..=t {
            let stay = self.core[k - 1].transitions[HMM_MATCH_TO_INSERT]
                + self.core[k - 1].transitions[HMM_MATCH_TO_MATCH];
            occ[k] = occ[k - 1] * stay + (1.0 - occ[k - 1]) * self.core[k - 1].transitions[HMM_DELETE_TO_MATCH];
        }
        occ
    }

    #[inline]
    pub fn transition_score(&self, node: usize, transition: Transition) -> f32 {
        self.nodes[node].transitions[transition as usize]
    }

    #[inline]
    pub fn match_score(&self, node: usize, residue: u8) -> f32 {
        match residue {
            r if (r as usize) < AMINO_COUNT => self.nodes[node].match_scores[r as usize],
            RESIDUE_X => 0.0,
            _ => -f32::INFINITY,
        }
    }

    #[inline]
    pub fn insert_score(&self, node: usize, residue: u8) -> f32 {
        match residue {
            r if (r as usize) < AMINO_COUNT => self.nodes[node].insert_scores[r as usize],
            RESIDUE_X => 0.0,
            _ => -f32::INFINITY,
        }
    }

    #[inline]
    pub fn special_score(&self, special: Special, transition: SpecialTransition) -> f32 {
        self.specials[special as usize][transition as usize]
    }

    /// The model's consensus residues as a digitized sequence.
    pub fn consensus_sequence(&self) -> Result<Sequence, Error> {
        Sequence::from_utf8(&self.name, self.consensus.as_bytes())
    }
}
