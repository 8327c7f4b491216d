//! Sequential back-end of the analysis

use crate::{
    aggregator::PolarisationHistograms, candidate::Candidate, random::RandomGenerator,
    scheduling::CANDIDATE_BATCH_SIZE,
};

/// Analyse candidates in sequential mode
///
/// We use batched logic even in sequential mode, in order to achieve
/// reproducibility with respect to multi-threaded runs.
///
pub fn run_analysis_impl(
    candidates: &[Candidate],
    mut rng: RandomGenerator,
    analyse_batch: impl Fn(&[Candidate], &mut RandomGenerator) -> PolarisationHistograms,
) -> PolarisationHistograms {
    // Some double-checking cannot hurt...
    assert!(!candidates.is_empty(), "Must analyse at least one candidate");

    // Each batch draws random numbers from its own stream
    let mut next_batch_rng = || {
        let batch_rng = rng.clone();
        rng.jump();
        batch_rng
    };

    // Initialize the histograms with the first batch of candidates
    let mut batches = candidates.chunks(CANDIDATE_BATCH_SIZE);
    let first_batch = batches.next().expect("There should be at least one batch");
    let mut histograms = analyse_batch(first_batch, &mut next_batch_rng());

    // Analyse and integrate the remaining batches
    for batch in batches {
        histograms.merge(analyse_batch(batch, &mut next_batch_rng()));
    }
    histograms
}
