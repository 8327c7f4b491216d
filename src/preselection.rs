//! Mechanism to reject candidates which the upstream selection did not accept

use crate::{
    candidate::Candidate,
    config::{Configuration, ProcessingMode},
};

/// Upstream selection requirements on candidates
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CandidateSelection {
    /// Channel being analysed
    mode: ProcessingMode,

    /// Required value of the D* selection flag
    dstar_flag: bool,

    /// Minimal selection level of a Λc mass hypothesis
    lc_min_selection: i32,
}
//
impl CandidateSelection {
    /// Set up the selection for some processing mode
    pub fn new(cfg: &Configuration, mode: ProcessingMode) -> Self {
        Self {
            mode,
            dstar_flag: cfg.selection_flag_dstar,
            lc_min_selection: cfg.selection_flag_lc,
        }
    }

    /// Decide whether a candidate should be analysed or rejected
    ///
    /// Λc candidates are kept as soon as one of their mass hypotheses is
    /// selected, finer-grained rejection is up to the mass hypothesis
    /// resolution.
    ///
    pub fn keep(&self, candidate: &Candidate) -> bool {
        if candidate.channel() != self.mode.channel() {
            return false;
        }
        match candidate {
            Candidate::Dstar(dstar) => dstar.is_selected == self.dstar_flag,
            Candidate::LcToPKPi(lc) => {
                lc.sel_pkpi >= self.lc_min_selection || lc.sel_pikp >= self.lc_min_selection
            }
        }
    }

    /// Keep the candidates which should be analysed, counting the others
    pub fn select(&self, candidates: Vec<Candidate>) -> (Vec<Candidate>, SelectionSummary) {
        let mut summary = SelectionSummary {
            num_read: candidates.len(),
            ..SelectionSummary::default()
        };
        let selected = candidates
            .into_iter()
            .filter(|candidate| {
                if candidate.channel() != self.mode.channel() {
                    summary.num_other_channel += 1;
                    false
                } else if self.keep(candidate) {
                    summary.num_selected += 1;
                    true
                } else {
                    summary.num_rejected += 1;
                    false
                }
            })
            .collect();
        (selected, summary)
    }
}

/// Candidate counts at the preselection stage
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SelectionSummary {
    /// Candidates read from the input
    pub num_read: usize,

    /// Candidates passing the preselection
    pub num_selected: usize,

    /// Candidates of the right channel, rejected by the upstream selection
    pub num_rejected: usize,

    /// Candidates of another channel than the analysed one
    pub num_other_channel: usize,
}
