//! Charm polarisation: decay angle observables of charm hadron candidates
//!
//!
//! # Introduction (for the physicist)
//!
//! This program measures the spin alignment of charm hadrons through the
//! angular distribution of one of their decay products. Reconstructed
//! candidates of D*+ → D0 π+ and Λc+ → p K- π+ decays are boosted into the
//! rest frame of the decaying hadron, where the direction of the soft pion
//! (D*) or of the proton (Λc) is measured against four reference axes: the
//! helicity axis, the normal to the production plane, the beam axis, and a
//! random axis that serves as a control.
//!
//! For Λc candidates, the proton and the pion cannot be told apart, so both
//! mass hypotheses are studied when the upstream selection accepts them. A
//! combinatorial background sample can also be synthesized by rotating the
//! kaon around the beam axis, which destroys any genuine decay correlation.
//!
//!
//! # Introduction (for the computer guy)
//!
//! The program is a pipeline:
//!
//! * read in the configuration and book the histograms
//! * read in the candidates and apply the upstream selection
//! * for each candidate, resolve the accepted mass hypotheses,
//!     * for each hypothesis, build the rotational background variants,
//!     * for each variant, compute the decay angle observables,
//!     * and count them in multi-dimensional sparse histograms
//! * then display / store the result.
//!
//! Candidates are processed in batches that are merged at the end, which
//! makes it easy to spread the work over several threads.

#![warn(missing_docs)]

mod aggregator;
mod analysis;
mod angles;
mod candidate;
mod config;
mod histogram;
mod hypothesis;
mod momentum;
mod numeric;
mod output;
mod preselection;
mod random;
mod rotation;
mod scheduling;

use crate::{
    aggregator::PolarisationHistograms, analysis::PolarisationAnalysis, candidate::Candidate,
    config::Configuration, preselection::CandidateSelection, random::RandomGenerator,
};

use eyre::WrapErr;
use tracing::{info, warn, Level};

use std::time::Instant;

/// We'll use eyre's type-erased result type throughout the application
type Result<T> = eyre::Result<T>;

/// This will act as our main function, with suitable error handling
fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    // ### CONFIGURATION READOUT ###

    // Load, parse and check the configuration
    let cfg = Configuration::load("polarisation.cfg").wrap_err("Failed to load the configuration")?;
    let mode = cfg.validate()?;
    info!("Processing mode: {mode}");

    // Book the histograms before touching any data, so that an unusable
    // configuration is reported right away
    let template = PolarisationHistograms::new(&cfg)?;

    // ### CANDIDATE READOUT ###

    let candidates = candidate::load(&cfg.candidates_file)
        .wrap_err("Failed to load the candidates")?;
    let (candidates, selection) = CandidateSelection::new(&cfg, mode).select(candidates);
    info!(
        "Read {} candidates, {} selected, {} rejected",
        selection.num_read, selection.num_selected, selection.num_rejected
    );
    if selection.num_other_channel > 0 {
        warn!(
            "Skipped {} candidates of another channel than {}",
            selection.num_other_channel,
            mode.channel()
        );
    }

    // ### ANALYSIS EXECUTION ###

    // NOTE: We start the clock after I/O, to avoid IO-induced timing fluctuations
    let saved_time = Instant::now();

    // This kernel analyses a batch of candidates, given an initial random
    // number generator state, and returns the partial histograms
    let analysis = PolarisationAnalysis::new(&cfg, mode);
    let analyse_batch = |batch: &[Candidate], rng: &mut RandomGenerator| -> PolarisationHistograms {
        let mut histograms = template.clone();
        for candidate in batch {
            analysis.process(candidate, rng, &mut histograms);
        }
        histograms
    };

    // Run the analysis
    let rng = RandomGenerator::new(cfg.rng_seed);
    let histograms = scheduling::run_analysis(&candidates, rng, analyse_batch);

    // ### RESULTS DISPLAY AND STORAGE ###

    // Measure how much time has elapsed
    let elapsed_time = saved_time.elapsed();
    info!(
        "Produced {} observable tuples in {:.3} s",
        histograms.num_tuples(),
        elapsed_time.as_secs_f64()
    );

    // Send the results to the standard output and to disk and we're done
    output::dump_results(&selection, &histograms, elapsed_time)
        .wrap_err("Failed to output the results")?;

    // ...and we're done
    Ok(())
}
