//! This module takes care of scheduling the analysis work, encapsulating use
//! of multiple threads and anything else that will come in the future

#[cfg(feature = "multi-threading")]
mod multi_threading;
#[cfg(not(feature = "multi-threading"))]
mod sequential;

use crate::{aggregator::PolarisationHistograms, candidate::Candidate, random::RandomGenerator};

/// Size of the analysed candidate batches
///
/// Candidates are grouped in batches which are analysed into their own set
/// of histograms, later merged together. Each batch gets its own random
/// number stream, so results do not depend on how batches are scheduled.
///
const CANDIDATE_BATCH_SIZE: usize = 10_000;

/// Run the analysis in the manner that was configured at build time.
///
/// Takes as parameters the candidates to be analysed, the initial random
/// number generator state, and an analysis kernel that analyses a batch of
/// candidates given a random number generator.
///
/// Returns the merged histograms of all batches
///
pub fn run_analysis(
    candidates: &[Candidate],
    rng: RandomGenerator,
    analyse_batch: impl Send + Sync + Fn(&[Candidate], &mut RandomGenerator) -> PolarisationHistograms,
) -> PolarisationHistograms {
    // Without candidates, there is a single empty batch
    if candidates.is_empty() {
        let mut rng = rng;
        return analyse_batch(candidates, &mut rng);
    }

    // ...in sequential mode
    #[cfg(not(feature = "multi-threading"))]
    {
        sequential::run_analysis_impl(candidates, rng, analyse_batch)
    }

    // ...in multi-threaded mode
    #[cfg(feature = "multi-threading")]
    {
        multi_threading::run_analysis_impl(candidates, rng, analyse_batch)
    }
}
