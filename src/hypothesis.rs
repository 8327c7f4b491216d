//! Resolution of the mass hypotheses under which a candidate is analysed
//!
//! For some decays, the reconstruction cannot tell which track is which
//! particle. Λc+ → p K- π+ candidates are built from two same-sign tracks
//! which may be either the proton or the pion, and each assignment yields a
//! different invariant mass. The upstream selection rates both assignments
//! independently, so a candidate may have to be analysed zero, one or two
//! times.

use crate::{
    candidate::{Candidate, DstarCandidate, LcCandidate, MlScores},
    momentum::ThreeMomentum,
    numeric::{masses, Float},
    rotation::{ParentKinematics, Recombination},
};

use std::fmt;

/// Assignment of particle species to the tracks of a candidate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MassHypothesis {
    /// D*+ → D0 π+, the only assignment of this channel
    DstarToD0Pi,

    /// Λc+ prongs read as (p, K, π)
    PKPi,

    /// Λc+ prongs read as (π, K, p)
    PiKP,
}
//
impl fmt::Display for MassHypothesis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DstarToD0Pi => write!(f, "D0 pi"),
            Self::PKPi => write!(f, "p K pi"),
            Self::PiKP => write!(f, "pi K p"),
        }
    }
}

/// Index of the Λc prong which is always the kaon
const LC_KAON_PRONG: usize = 1;

/// Everything the analysis needs to know about a candidate under one
/// accepted mass hypothesis
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedHypothesis {
    /// Accepted mass hypothesis
    pub hypothesis: MassHypothesis,

    /// Momentum of the daughter whose direction measures the polarisation
    pub daughter: ThreeMomentum,

    /// Rest mass of that daughter
    pub daughter_mass: Float,

    /// Nominal mass of the decaying hadron
    pub nominal_mass: Float,

    /// Kinematics of the decaying hadron, as reconstructed upstream
    pub parent: ParentKinematics,

    /// Decay products, if they can be recombined after a rotation
    pub recombination: Option<Recombination>,

    /// Classifier scores under this hypothesis
    pub ml_scores: Option<MlScores>,
}

/// Maximal number of mass hypotheses of a candidate
pub const MAX_HYPOTHESES: usize = 2;

/// Per-channel logic of mass hypothesis resolution
pub trait HypothesisSource {
    /// Resolve every mass hypothesis of this candidate, leaving out those
    /// whose selection level is below `lc_min_selection` where applicable
    fn hypotheses(&self, lc_min_selection: i32) -> [Option<ResolvedHypothesis>; MAX_HYPOTHESES];
}

/// The D* is studied through its soft pion. D*+ and D*- are told apart by
/// the pion charge, and the histogrammed mass is the D*-D0 mass difference,
/// which has a much better resolution than the D* mass.
impl HypothesisSource for DstarCandidate {
    fn hypotheses(&self, _lc_min_selection: i32) -> [Option<ResolvedHypothesis>; MAX_HYPOTHESES] {
        let (inv_mass, inv_mass_d0) = if self.sign_soft_pi > 0 {
            (self.inv_mass_dstar, self.inv_mass_d0)
        } else {
            (self.inv_mass_anti_dstar, self.inv_mass_d0_bar)
        };
        let resolved = ResolvedHypothesis {
            hypothesis: MassHypothesis::DstarToD0Pi,
            daughter: self.p_soft_pi,
            daughter_mass: masses::PI_PLUS,
            nominal_mass: masses::D_STAR,
            parent: ParentKinematics {
                momentum: self.p_dstar,
                inv_mass,
                histogram_mass: inv_mass - inv_mass_d0,
            },
            recombination: None,
            ml_scores: self.ml_scores,
        };
        [Some(resolved), None]
    }
}

/// Assignment of particle species to the prongs of a Λc candidate
#[derive(Clone, Copy, Debug, PartialEq)]
struct LcAssignment {
    hypothesis: MassHypothesis,
    proton_prong: usize,
    prong_masses: [Float; 3],
}

/// Λc prongs read as (p, K, π)
const LC_PKPI: LcAssignment = LcAssignment {
    hypothesis: MassHypothesis::PKPi,
    proton_prong: 0,
    prong_masses: [masses::PROTON, masses::KAON_CHARGED, masses::PI_PLUS],
};

/// Λc prongs read as (π, K, p)
const LC_PIKP: LcAssignment = LcAssignment {
    hypothesis: MassHypothesis::PiKP,
    proton_prong: 2,
    prong_masses: [masses::PI_PLUS, masses::KAON_CHARGED, masses::PROTON],
};

/// The Λc is studied through its proton, which is prong 0 or prong 2
/// depending on the hypothesis
impl HypothesisSource for LcCandidate {
    fn hypotheses(&self, lc_min_selection: i32) -> [Option<ResolvedHypothesis>; MAX_HYPOTHESES] {
        [
            (self.sel_pkpi >= lc_min_selection)
                .then(|| self.resolve(&LC_PKPI, self.inv_mass_pkpi, self.ml_scores_pkpi)),
            (self.sel_pikp >= lc_min_selection)
                .then(|| self.resolve(&LC_PIKP, self.inv_mass_pikp, self.ml_scores_pikp)),
        ]
    }
}
//
impl LcCandidate {
    fn resolve(
        &self,
        assignment: &LcAssignment,
        inv_mass: Float,
        ml_scores: Option<MlScores>,
    ) -> ResolvedHypothesis {
        ResolvedHypothesis {
            hypothesis: assignment.hypothesis,
            daughter: self.prongs[assignment.proton_prong],
            daughter_mass: masses::PROTON,
            nominal_mass: masses::LAMBDA_C_PLUS,
            parent: ParentKinematics {
                momentum: self.momentum(),
                inv_mass,
                histogram_mass: inv_mass,
            },
            recombination: Some(Recombination {
                prongs: self.prongs,
                masses: assignment.prong_masses,
                rotated_prong: LC_KAON_PRONG,
            }),
            ml_scores,
        }
    }
}

/// Selects the mass hypotheses under which candidates are analysed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MassHypothesisResolver {
    /// Minimal selection level for a Λc assignment to be analysed
    lc_min_selection: i32,
}
//
impl MassHypothesisResolver {
    /// Set up the resolver
    pub fn new(lc_min_selection: i32) -> Self {
        Self { lc_min_selection }
    }

    /// Enumerate the accepted mass hypotheses of a candidate
    ///
    /// Hypotheses which did not pass the selection are not reported at all,
    /// so that they cannot leak placeholder values into the histograms.
    ///
    pub fn resolve(&self, candidate: &Candidate) -> impl Iterator<Item = ResolvedHypothesis> {
        let source: &dyn HypothesisSource = match candidate {
            Candidate::Dstar(dstar) => dstar,
            Candidate::LcToPKPi(lc) => lc,
        };
        source.hypotheses(self.lc_min_selection).into_iter().flatten()
    }
}
