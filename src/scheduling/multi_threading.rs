//! Multi-threaded back-end of the analysis

use crate::{
    aggregator::PolarisationHistograms, candidate::Candidate, random::RandomGenerator,
    scheduling::CANDIDATE_BATCH_SIZE,
};

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};

/// Analyse candidates in multi-threaded mode
///
/// Histogram counts are integers, so the order in which batch results are
/// merged does not affect the final result.
///
pub fn run_analysis_impl(
    candidates: &[Candidate],
    mut rng: RandomGenerator,
    analyse_batch: impl Send + Sync + Fn(&[Candidate], &mut RandomGenerator) -> PolarisationHistograms,
) -> PolarisationHistograms {
    // Some double-checking cannot hurt...
    assert!(!candidates.is_empty(), "Must analyse at least one candidate");

    // The results of parallel tasks will be aggregated here
    let num_batches = (candidates.len() + CANDIDATE_BATCH_SIZE - 1) / CANDIDATE_BATCH_SIZE;
    let accumulator = BatchAccumulator::new(num_batches);

    // This function is a synchronization scope: it will only return
    // once all inner tasks have been executed
    rayon::scope(|scope| {
        // For each batch of candidates...
        for (batch_id, batch) in candidates.chunks(CANDIDATE_BATCH_SIZE).enumerate() {
            // Spawn a task which is responsible for analysing it
            let mut task_rng = rng.clone();
            let accumulator_ref = &accumulator;
            let analyse_batch_ref = &analyse_batch;
            scope.spawn(move |_| {
                let result = analyse_batch_ref(batch, &mut task_rng);
                accumulator_ref.set_task_result(batch_id, result);
            });

            // Give the next batch its own random number stream
            rng.jump();
        }
    });

    // Extract the results from the accumulator
    accumulator.get_merged_result()
}

/// Histogram accumulation mechanism, merging batch results as they come
struct BatchAccumulator {
    /// Storage location in which results will be merged out of order
    merged_result: Mutex<Option<PolarisationHistograms>>,

    /// Truth that each task has reported its results
    task_finished: Box<[AtomicBool]>,
}
//
impl BatchAccumulator {
    /// Set up results storage for N parallel tasks
    fn new(num_tasks: usize) -> Self {
        assert!(num_tasks > 0, "There should be at least one task");
        Self {
            merged_result: Mutex::new(None),
            task_finished: (0..num_tasks)
                .map(|_| AtomicBool::new(false))
                .collect::<Vec<_>>()
                .into_boxed_slice(),
        }
    }

    /// Integrate the results of the n-th analysis task
    #[allow(unknown_lints, clippy::significant_drop_in_scrutinee)]
    fn set_task_result(&self, task_id: usize, result: PolarisationHistograms) {
        // Initialize the accumulator or merge the task result into it
        match *self
            .merged_result
            .lock()
            .expect("Mutex data should be valid")
        {
            // If we are the first, initialize the accumulator
            ref mut storage @ None => *storage = Some(result),

            // Otherwise, merge our results with those that are already here
            Some(ref mut accumulator) => accumulator.merge(result),
        }

        // Remember that this task has completed its work
        let was_finished = self.task_finished[task_id].swap(true, Ordering::Relaxed);
        assert!(!was_finished, "Tasks should not set their result twice");
    }

    /// Collect the merged result once all tasks are done
    fn get_merged_result(self) -> PolarisationHistograms {
        // Check that all tasks have completed their work
        for ready in self.task_finished.iter() {
            assert!(
                ready.load(Ordering::Relaxed),
                "All tasks should have completed their work"
            );
        }

        // Collect the merged result
        self.merged_result
            .into_inner()
            .expect("Mutex data should be valid")
            .expect("Result should be ready")
    }
}
