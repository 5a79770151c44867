use cloudseqs::align::bounded::null2::DomainDef;
use cloudseqs::align::bounded::structs::{
    CloudBoundGroup, CloudMatrixLinear, CloudSearchParams, DpMatrixSparse, RowBounds,
};
use cloudseqs::align::bounded::{
    backward_bounded, cloud_search_backward, cloud_search_forward, forward_bounded, null2_score,
    posterior_bounded,
};
use cloudseqs::align::{forward, seed_from_trace, traceback, viterbi};
use cloudseqs::errors::Error;
use cloudseqs::output::write_tabular_output;
use cloudseqs::pipeline::{search, search_batch, Scratch, SearchParams};
use cloudseqs::structs::alignment::ScoreParams;
use cloudseqs::structs::dp_matrix::DpMatrixDense;
use cloudseqs::structs::hmm::{Hmm, HmmNode};
use cloudseqs::structs::profile::{Profile, SearchMode, Special};
use cloudseqs::structs::sequence::{Sequence, AMINO_ALPHABET, AMINO_COUNT};
use cloudseqs::structs::Alignment;

fn digital(residue: u8) -> usize {
    AMINO_ALPHABET
        .iter()
        .position(|&a| a == residue)
        .expect("non-canonical residue in test consensus")
}

/// A well-behaved test model: match states strongly favor the consensus
/// residue, inserts emit background, transitions heavily favor match-match.
fn hmm_from_consensus(name: &str, consensus: &str) -> Hmm {
    let length = consensus.len();
    let mut nodes = vec![HmmNode::default(); length + 1];

    for (idx, node) in nodes.iter_mut().enumerate() {
        node.transitions = [0.85, 0.05, 0.10, 0.70, 0.30, 0.80, 0.20];
        if idx >= 1 {
            let favored = digital(consensus.as_bytes()[idx - 1]);
            for x in 0..AMINO_COUNT {
                node.match_probs[x] = if x == favored { 0.6 } else { 0.4 / 19.0 };
            }
            node.insert_probs = [0.05; AMINO_COUNT];
        }
    }

    Hmm {
        name: name.to_string(),
        accession: format!("{name}.acc"),
        length,
        consensus: consensus.to_string(),
        nodes,
        forward_tau: -3.0,
        forward_lambda: 0.7,
    }
}

fn consensus_50() -> String {
    "ACDEFGHIKLMNPQRSTVWY".repeat(3)[..50].to_string()
}

/// Deterministic pseudo-random amino sequence (xorshift).
fn random_sequence(length: usize, mut state: u64) -> String {
    (0..length)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            AMINO_ALPHABET[(state % 20) as usize] as char
        })
        .collect()
}

fn relaxed_params() -> SearchParams {
    SearchParams {
        eval_cutoff: f64::INFINITY,
        // leave headroom over the table-driven log-sum rounding; the exact
        // symmetry checks live in the full-matrix comparisons below
        score_tolerance: 1.0,
        ..SearchParams::default()
    }
}

fn cell_in_rows(rows: &RowBounds, row: usize, col: usize) -> bool {
    rows.row(row)
        .iter()
        .any(|interval| interval.lb <= col && col < interval.rb)
}

/// Seed scenario: the consensus sequence against its own 50-node profile
/// must light up the main diagonal and score overwhelmingly.
#[test]
fn consensus_query_scores_strongly() {
    let hmm = hmm_from_consensus("consensus50", &consensus_50());
    let mut profile = Profile::new(&hmm).unwrap();
    let target = profile.consensus_sequence().unwrap();

    let params = relaxed_params();
    let mut scratch = Scratch::new();
    let result = search(&mut profile, &target, &params, &mut scratch)
        .unwrap()
        .expect("consensus pair must survive filtering");

    assert!(result.evalue < 1e-10, "evalue was {}", result.evalue);
    assert!(result.cloud_cells > 0);

    let trace = result.trace.as_ref().unwrap();
    assert_eq!(trace.first_m.map(|(_, j)| j), Some(1));
    assert_eq!(trace.last_m.map(|(_, j)| j), Some(profile.length));
}

#[test]
fn cloud_covers_the_main_diagonal_for_consensus() {
    let hmm = hmm_from_consensus("consensus50", &consensus_50());
    let mut profile = Profile::new(&hmm).unwrap();
    let target = profile.consensus_sequence().unwrap();
    let q = target.length();
    profile.configure_for_target_length(q);

    let mut viterbi_mx = DpMatrixDense::new(q, profile.length);
    viterbi(&profile, &target, &mut viterbi_mx);
    let mut trace = Default::default();
    traceback(&profile, &target, &viterbi_mx, &mut trace).unwrap();
    let seed = seed_from_trace(&trace, &target).unwrap();

    let mut cloud_mx = CloudMatrixLinear::new(q);
    let mut fwd_bounds = CloudBoundGroup::new(q, profile.length);
    let mut bck_bounds = CloudBoundGroup::new(q, profile.length);
    let params = CloudSearchParams::default();

    cloud_search_forward(&profile, &target, &seed, &mut cloud_mx, &params, &mut fwd_bounds)
        .unwrap();
    cloud_search_backward(&profile, &target, &seed, &mut cloud_mx, &params, &mut bck_bounds)
        .unwrap();
    CloudBoundGroup::join_bounds(&mut fwd_bounds, &bck_bounds, 0).unwrap();

    let rows = RowBounds::new(&fwd_bounds);

    // count is preserved by reorientation
    assert_eq!(rows.num_cells(), fwd_bounds.num_cells());

    for i in 1..=profile.length.min(q) {
        assert!(cell_in_rows(&rows, i, i), "main diagonal cell ({i}, {i}) missing");
    }
}

/// Seed scenario: a random query scores no better than the consensus, and
/// pruning computes fewer cells than the full matrix.
#[test]
fn random_query_scores_worse_and_prunes() {
    let hmm = hmm_from_consensus("consensus50", &consensus_50());
    let params = relaxed_params();

    let mut profile = Profile::new(&hmm).unwrap();
    let consensus_target = profile.consensus_sequence().unwrap();
    let mut scratch = Scratch::new();
    let consensus_result = search(&mut profile, &consensus_target, &params, &mut scratch)
        .unwrap()
        .unwrap();

    let random_target =
        Sequence::from_utf8("random200", random_sequence(200, 0x2f9e_41d7).as_bytes()).unwrap();
    let random_result = search(&mut profile, &random_target, &params, &mut scratch)
        .unwrap()
        .unwrap();

    assert!(random_result.evalue >= consensus_result.evalue);
    assert!(
        random_result.cloud_cells < random_result.total_cells,
        "pruning computed {} of {} cells",
        random_result.cloud_cells,
        random_result.total_cells
    );
}

/// Seed scenario: with an effectively infinite alpha nothing is pruned;
/// the cloud covers every core cell and the bounded Forward total matches
/// the dense reference.
#[test]
fn no_pruning_recovers_the_dense_forward_score() {
    let hmm = hmm_from_consensus("consensus50", &consensus_50());
    let mut profile = Profile::new(&hmm).unwrap();
    let target = profile.consensus_sequence().unwrap();
    let q = target.length();

    let mut params = relaxed_params();
    params.cloud.alpha = 1e6;
    let mut scratch = Scratch::new();
    let result = search(&mut profile, &target, &params, &mut scratch)
        .unwrap()
        .unwrap();

    // every core cell survives
    assert_eq!(result.cloud_cells, q * profile.length);

    let mut dense = DpMatrixDense::new(q, profile.length);
    let dense_score = forward(&profile, &target, &mut dense);
    assert!(
        (result.nat_score - dense_score).abs() < 1e-4,
        "bounded {} vs dense {}",
        result.nat_score,
        dense_score
    );
}

/// Full-matrix bypass: bounded Forward over covering edgebounds equals the
/// dense quadratic Forward.
#[test]
fn run_full_matches_dense_forward() {
    let hmm = hmm_from_consensus("consensus30", &consensus_50()[..30]);
    let mut profile = Profile::new(&hmm).unwrap();
    let target =
        Sequence::from_utf8("query", random_sequence(40, 0x11ce_55aa).as_bytes()).unwrap();

    let mut params = relaxed_params();
    params.run_full = true;
    let mut scratch = Scratch::new();
    let result = search(&mut profile, &target, &params, &mut scratch)
        .unwrap()
        .unwrap();

    let mut dense = DpMatrixDense::new(target.length(), profile.length);
    let dense_score = forward(&profile, &target, &mut dense);

    assert!((result.nat_score - dense_score).abs() < 1e-4);
    assert_eq!(
        result.cloud_cells,
        (target.length() + 1) * (profile.length + 1)
    );
}

/// A gamma larger than Q + T means pruning never engages.
#[test]
fn huge_gamma_never_prunes() {
    let hmm = hmm_from_consensus("consensus50", &consensus_50());
    let mut profile = Profile::new(&hmm).unwrap();
    let target = profile.consensus_sequence().unwrap();
    let q = target.length();

    let mut params = relaxed_params();
    params.cloud.gamma = 10_000;
    let mut scratch = Scratch::new();
    let result = search(&mut profile, &target, &params, &mut scratch)
        .unwrap()
        .unwrap();

    assert_eq!(result.cloud_cells, q * profile.length);
}

/// Posterior rows are normalized: in-model mass plus N/J/C mass is one.
#[test]
fn posterior_rows_are_normalized() {
    let hmm = hmm_from_consensus("consensus30", &consensus_50()[..30]);
    let mut profile = Profile::new(&hmm).unwrap();
    let target = profile.consensus_sequence().unwrap();
    let q = target.length();
    profile.configure_for_target_length(q);

    let mut viterbi_mx = DpMatrixDense::new(q, profile.length);
    viterbi(&profile, &target, &mut viterbi_mx);
    let mut trace = Default::default();
    traceback(&profile, &target, &viterbi_mx, &mut trace).unwrap();
    let seed = seed_from_trace(&trace, &target).unwrap();

    let mut cloud_mx = CloudMatrixLinear::new(q);
    let mut fwd_bounds = CloudBoundGroup::new(q, profile.length);
    let mut bck_bounds = CloudBoundGroup::new(q, profile.length);
    let cloud_params = CloudSearchParams::default();
    cloud_search_forward(
        &profile,
        &target,
        &seed,
        &mut cloud_mx,
        &cloud_params,
        &mut fwd_bounds,
    )
    .unwrap();
    cloud_search_backward(
        &profile,
        &target,
        &seed,
        &mut cloud_mx,
        &cloud_params,
        &mut bck_bounds,
    )
    .unwrap();
    CloudBoundGroup::join_bounds(&mut fwd_bounds, &bck_bounds, 0).unwrap();
    let rows = RowBounds::new(&fwd_bounds);

    let mut fwd_mx = DpMatrixSparse::new(q, profile.length, &rows);
    let mut bck_mx = DpMatrixSparse::new(q, profile.length, &rows);
    let mut post_mx = DpMatrixSparse::new(q, profile.length, &rows);

    let fwd_total = forward_bounded(&profile, &target, &mut fwd_mx, &rows);
    backward_bounded(&profile, &target, &mut bck_mx, &rows);
    posterior_bounded(&profile, &fwd_mx, &bck_mx, &mut post_mx, &rows, fwd_total).unwrap();

    for row in 1..=q {
        let mut mass = 0.0f32;
        for interval in rows.row(row) {
            for col in interval.lb.max(1)..interval.rb.min(profile.length + 1) {
                mass += post_mx.get_match(row, col) + post_mx.get_insert(row, col);
            }
        }
        mass += post_mx.get_special(Special::N, row)
            + post_mx.get_special(Special::J, row)
            + post_mx.get_special(Special::C, row);

        assert!(
            (mass - 1.0).abs() < 1e-3,
            "row {row} posterior mass was {mass}"
        );
    }
}

/// Null2 wildcard score is the mean over the canonical alphabet.
#[test]
fn null2_wildcard_is_the_alphabet_mean() {
    let hmm = hmm_from_consensus("consensus30", &consensus_50()[..30]);
    let mut profile = Profile::new(&hmm).unwrap();
    let target = profile.consensus_sequence().unwrap();
    let q = target.length();
    profile.configure_for_target_length(q);

    let mut rows = RowBounds::default();
    rows.cover_matrix(q, profile.length);

    let mut fwd_mx = DpMatrixSparse::new(q, profile.length, &rows);
    let mut bck_mx = DpMatrixSparse::new(q, profile.length, &rows);
    let mut post_mx = DpMatrixSparse::new(q, profile.length, &rows);

    let fwd_total = forward_bounded(&profile, &target, &mut fwd_mx, &rows);
    backward_bounded(&profile, &target, &mut bck_mx, &rows);
    posterior_bounded(&profile, &fwd_mx, &bck_mx, &mut post_mx, &rows, fwd_total).unwrap();

    let mut dom_def = DomainDef::default();
    null2_score(&post_mx, &profile, &target, &rows, &mut dom_def);

    let mean: f32 = dom_def.null2[..AMINO_COUNT].iter().sum::<f32>() / AMINO_COUNT as f32;
    let wildcard = dom_def.null2[AMINO_COUNT];
    assert!((wildcard - mean).abs() < 1e-5);
}

/// Scoring round trip: `eval = pval * db_size` exactly, `pval = exp(ln_pval)`.
#[test]
fn score_round_trip_holds() {
    let hmm = hmm_from_consensus("consensus50", &consensus_50());
    let mut profile = Profile::new(&hmm).unwrap();
    let target = profile.consensus_sequence().unwrap();

    let mut params = relaxed_params();
    params.db_size = 12_345;
    let mut scratch = Scratch::new();
    let result = search(&mut profile, &target, &params, &mut scratch)
        .unwrap()
        .unwrap();

    assert_eq!(result.evalue, result.pval * 12_345.0);
    assert!((result.pval - (result.ln_pval as f64).exp()).abs() <= f64::EPSILON * result.pval);
}

/// Local and glocal modes both complete on the same profile, as do unihit
/// and multihit.
#[test]
fn all_four_modes_complete() {
    let hmm = hmm_from_consensus("consensus30", &consensus_50()[..30]);
    let target = Profile::new(&hmm).unwrap().consensus_sequence().unwrap();

    for mode in [
        SearchMode::MultiLocal,
        SearchMode::MultiGlocal,
        SearchMode::UniLocal,
        SearchMode::UniGlocal,
    ] {
        let mut profile = Profile::new(&hmm).unwrap();
        let mut params = relaxed_params();
        params.mode = mode;
        let mut scratch = Scratch::new();

        let result = search(&mut profile, &target, &params, &mut scratch)
            .unwrap()
            .unwrap_or_else(|| panic!("mode {mode:?} dropped the consensus pair"));
        assert!(result.nat_score.is_finite(), "mode {mode:?}");
    }
}

/// Boundary cases: single-residue query and single-node profile.
#[test]
fn degenerate_dimensions_do_not_panic() {
    let hmm = hmm_from_consensus("tiny", "ACD");
    let mut profile = Profile::new(&hmm).unwrap();
    let target = Sequence::from_utf8("single", b"A").unwrap();
    let mut scratch = Scratch::new();
    assert!(search(&mut profile, &target, &relaxed_params(), &mut scratch).is_ok());

    let hmm = hmm_from_consensus("one-node", "A");
    let mut profile = Profile::new(&hmm).unwrap();
    let target = Sequence::from_utf8("several", b"AAAA").unwrap();
    assert!(search(&mut profile, &target, &relaxed_params(), &mut scratch).is_ok());
}

/// A query of only non-residue characters has no alignment path.
#[test]
fn unemittable_query_reports_an_empty_cloud() {
    let hmm = hmm_from_consensus("consensus30", &consensus_50()[..30]);
    let mut profile = Profile::new(&hmm).unwrap();
    let target = Sequence::from_utf8("stars", b"********").unwrap();
    let mut scratch = Scratch::new();

    assert!(matches!(
        search(&mut profile, &target, &relaxed_params(), &mut scratch),
        Err(Error::CloudEmpty { .. })
    ));
}

#[test]
fn oversized_pairs_overflow() {
    let hmm = hmm_from_consensus("consensus30", &consensus_50()[..30]);
    let mut profile = Profile::new(&hmm).unwrap();
    let target = profile.consensus_sequence().unwrap();

    let mut params = relaxed_params();
    params.max_cells = 10;
    let mut scratch = Scratch::new();

    assert!(matches!(
        search(&mut profile, &target, &params, &mut scratch),
        Err(Error::MatrixOverflow { .. })
    ));
}

/// Seed scenario: two workers running the same pair on different threads
/// produce bit-for-bit identical results.
#[test]
fn results_are_identical_across_threads() {
    let params = relaxed_params();

    let run = move || {
        let mut profile = Profile::new(&hmm_from_consensus("consensus50", &consensus_50())).unwrap();
        let target = profile.consensus_sequence().unwrap();
        let mut scratch = Scratch::new();
        search(&mut profile, &target, &params, &mut scratch)
            .unwrap()
            .unwrap()
    };

    let handle_a = std::thread::spawn(run.clone());
    let handle_b = std::thread::spawn(run);
    let result_a = handle_a.join().unwrap();
    let result_b = handle_b.join().unwrap();

    assert_eq!(result_a.nat_score.to_bits(), result_b.nat_score.to_bits());
    assert_eq!(result_a.seq_bias.to_bits(), result_b.seq_bias.to_bits());
    assert_eq!(result_a.evalue.to_bits(), result_b.evalue.to_bits());
    assert_eq!(result_a.cloud_cells, result_b.cloud_cells);
}

/// The batch driver agrees with single-pair searches.
#[test]
fn batch_matches_single_searches() {
    let hmm_a = hmm_from_consensus("profA", &consensus_50()[..30]);
    let hmm_b = hmm_from_consensus("profB", &consensus_50()[10..45]);
    let profiles = vec![Profile::new(&hmm_a).unwrap(), Profile::new(&hmm_b).unwrap()];

    let targets = vec![
        profiles[0].consensus_sequence().unwrap(),
        profiles[1].consensus_sequence().unwrap(),
    ];
    let pairs: Vec<(usize, usize)> = vec![(0, 0), (0, 1), (1, 0), (1, 1)];

    let params = relaxed_params();
    let hits = search_batch(&profiles, &targets, &pairs, &params);
    assert_eq!(hits.len(), 4);

    let mut scratch = Scratch::new();
    for hit in &hits {
        let mut profile = profiles[hit.profile_idx].clone();
        let single = search(&mut profile, &targets[hit.target_idx], &params, &mut scratch)
            .unwrap()
            .unwrap();
        assert_eq!(
            single.nat_score.to_bits(),
            hit.result.nat_score.to_bits(),
            "pair ({}, {})",
            hit.profile_idx,
            hit.target_idx
        );
    }
}

/// A surviving result renders into an alignment and a tabular line.
#[test]
fn alignments_render_from_the_traceback() {
    let hmm = hmm_from_consensus("consensus50", &consensus_50());
    let mut profile = Profile::new(&hmm).unwrap();
    let target = profile.consensus_sequence().unwrap();

    let params = relaxed_params();
    let mut scratch = Scratch::new();
    let result = search(&mut profile, &target, &params, &mut scratch)
        .unwrap()
        .unwrap();

    let mut score_params = ScoreParams::new(params.db_size);
    score_params.forward_score_nats = result.nat_score;
    score_params.null_score_nats = result.null_score;
    score_params.bias_correction_score_nats = result.seq_bias;

    let trace = result.trace.as_ref().unwrap();
    let alignment = Alignment::from_trace(trace, &profile, &target, &score_params);

    // the consensus aligns to itself end to end
    assert_eq!(alignment.profile_start, 1);
    assert_eq!(alignment.profile_end, profile.length);
    assert_eq!(alignment.cigar, format!("{}M", profile.length));
    assert_eq!(alignment.profile_string, alignment.target_string);
    assert_eq!(alignment.state_string.len(), profile.length);
    assert!((alignment.bit_score - result.seq_score).abs() < 1e-4);

    let mut buffer = Vec::new();
    write_tabular_output(&[alignment], &mut buffer).unwrap();
    let table = String::from_utf8(buffer).unwrap();
    assert!(table.contains("consensus50"));
}

/// Domain splitting finds the consensus alignment as a passing domain.
#[test]
fn domains_cover_the_consensus_alignment() {
    let hmm = hmm_from_consensus("consensus50", &consensus_50());
    let mut profile = Profile::new(&hmm).unwrap();
    let target = profile.consensus_sequence().unwrap();

    let mut params = relaxed_params();
    params.run_domains = true;
    let mut scratch = Scratch::new();

    let result = search(&mut profile, &target, &params, &mut scratch)
        .unwrap()
        .expect("a passing domain must exist");

    assert!(!result.domains.is_empty());
    let best = result
        .domains
        .iter()
        .find(|domain| domain.passes)
        .expect("at least one domain passes rt3");
    assert!(best.target_start <= 2, "domain starts at {}", best.target_start);
    assert!(best.target_end >= target.length() - 2);
    assert!(result.domain_sum_score.is_finite());
}
