//! Per-candidate analysis pipeline: mass hypotheses, then rotational
//! background variants, then decay angle observables

use crate::{
    aggregator::PolarisationHistograms,
    angles::{AngularObservables, DecayKinematics, ObservableTuple},
    candidate::Candidate,
    config::{Configuration, ProcessingMode},
    hypothesis::MassHypothesisResolver,
    random::{RandomAxisSampling, RandomGenerator},
    rotation::RotationalBackground,
};

/// Polarisation analysis of individual candidates
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PolarisationAnalysis {
    mode: ProcessingMode,
    resolver: MassHypothesisResolver,
    background: RotationalBackground,
    random_sampling: RandomAxisSampling,
}
//
impl PolarisationAnalysis {
    /// Set up the analysis for some processing mode
    pub fn new(cfg: &Configuration, mode: ProcessingMode) -> Self {
        // Rotated copies only make sense when their mass can be recomputed
        let num_rotations = if mode.channel().supports_rotation() {
            cfg.num_bkg_rotations
        } else {
            0
        };
        Self {
            mode,
            resolver: MassHypothesisResolver::new(cfg.selection_flag_lc),
            background: RotationalBackground::new(num_rotations),
            random_sampling: cfg.random_sampling,
        }
    }

    /// Compute the observables of a candidate, feeding each observable
    /// tuple to a sink as it is produced
    ///
    /// Candidates of another channel than the analysed one yield nothing.
    /// A fresh random reference axis is drawn for every tuple.
    ///
    pub fn for_each_observable(
        &self,
        candidate: &Candidate,
        rng: &mut RandomGenerator,
        mut sink: impl FnMut(ObservableTuple),
    ) {
        if candidate.channel() != self.mode.channel() {
            return;
        }
        for hypothesis in self.resolver.resolve(candidate) {
            for variant in self.background.variants(&hypothesis) {
                let kinematics = DecayKinematics {
                    daughter: hypothesis.daughter,
                    daughter_mass: hypothesis.daughter_mass,
                    parent: variant.parent.momentum,
                    parent_mass: variant.parent.inv_mass,
                    nominal_mass: hypothesis.nominal_mass,
                };
                let random_axis = self.random_sampling.sample(rng);
                sink(ObservableTuple {
                    inv_mass: variant.parent.histogram_mass,
                    angular: AngularObservables::compute(&kinematics, &random_axis),
                    is_rotated: variant.is_rotated(),
                    ml_scores: hypothesis.ml_scores,
                });
            }
        }
    }

    /// Analyse a candidate and record its observables
    pub fn process(
        &self,
        candidate: &Candidate,
        rng: &mut RandomGenerator,
        histograms: &mut PolarisationHistograms,
    ) {
        self.for_each_observable(candidate, rng, |tuple| histograms.fill(&tuple));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        angles::ReferenceAxis,
        candidate::{self, DstarCandidate, LcCandidate, MlScores},
        momentum::ThreeMomentum,
        numeric::masses,
        preselection::CandidateSelection,
    };

    fn lc_config(num_bkg_rotations: usize) -> Configuration {
        let mut cfg = Configuration::default();
        cfg.processes.dstar = false;
        cfg.processes.lc_to_pkpi_with_ml = true;
        cfg.num_bkg_rotations = num_bkg_rotations;
        cfg
    }

    fn dstar() -> Candidate {
        Candidate::Dstar(DstarCandidate {
            p_soft_pi: ThreeMomentum::new(1., 0., 0.),
            p_dstar: ThreeMomentum::new(2., 0., 0.),
            sign_soft_pi: 1,
            inv_mass_dstar: 2.01,
            inv_mass_anti_dstar: 2.02,
            inv_mass_d0: 1.865,
            inv_mass_d0_bar: 1.866,
            is_selected: true,
            ml_scores: None,
        })
    }

    fn lc(sel_pkpi: i32, sel_pikp: i32) -> Candidate {
        Candidate::LcToPKPi(LcCandidate {
            prongs: [
                ThreeMomentum::new(1.8, 0.4, 0.6),
                ThreeMomentum::new(0.7, -0.5, 0.3),
                ThreeMomentum::new(0.6, 0.3, -0.2),
            ],
            inv_mass_pkpi: 2.27,
            inv_mass_pikp: 2.32,
            sel_pkpi,
            sel_pikp,
            ml_scores_pkpi: Some(MlScores::new([0.1, 0.8, 0.1])),
            ml_scores_pikp: Some(MlScores::new([0.7, 0.2, 0.1])),
        })
    }

    fn observables(
        cfg: &Configuration,
        mode: ProcessingMode,
        candidate: &Candidate,
    ) -> Vec<ObservableTuple> {
        let analysis = PolarisationAnalysis::new(cfg, mode);
        let mut rng = RandomGenerator::new(7);
        let mut tuples = Vec::new();
        analysis.for_each_observable(candidate, &mut rng, |tuple| tuples.push(tuple));
        tuples
    }

    #[test]
    fn dstar_end_to_end() {
        let cfg = Configuration::default();
        let mode = cfg.validate().unwrap();
        let tuples = observables(&cfg, mode, &dstar());
        assert_eq!(tuples.len(), 1);
        let tuple = &tuples[0];
        assert!(!tuple.is_rotated);
        assert_eq!(tuple.inv_mass, 2.01 - 1.865);
        for axis in ReferenceAxis::ALL {
            assert!(tuple.angular.cos_theta_star[axis].is_finite());
        }

        let mut hists = PolarisationHistograms::new(&cfg).unwrap();
        let analysis = PolarisationAnalysis::new(&cfg, mode);
        analysis.process(&dstar(), &mut RandomGenerator::new(7), &mut hists);
        assert_eq!(hists.num_tuples(), 1);
        assert!(hists.iter().all(|hist| hist.entries() == 1));
    }

    #[test]
    fn dstar_is_never_rotated() {
        let mut cfg = Configuration::default();
        cfg.num_bkg_rotations = 4;
        let tuples = observables(&cfg, ProcessingMode::Dstar, &dstar());
        assert_eq!(tuples.len(), 1);
    }

    #[test]
    fn lc_with_both_hypotheses() {
        let cfg = lc_config(0);
        let tuples = observables(&cfg, ProcessingMode::LcToPKPiWithMl, &lc(1, 1));
        assert_eq!(tuples.len(), 2);
        assert_eq!(tuples[0].inv_mass, 2.27);
        assert_eq!(tuples[1].inv_mass, 2.32);
        assert_ne!(tuples[0].angular.cos_theta_star, tuples[1].angular.cos_theta_star);
        assert_eq!(tuples[0].ml_scores, Some(MlScores::new([0.1, 0.8, 0.1])));
        assert_eq!(tuples[1].ml_scores, Some(MlScores::new([0.7, 0.2, 0.1])));
        // Both hypotheses share the parent, and thus its kinematics
        assert_eq!(tuples[0].angular.pt, tuples[1].angular.pt);
    }

    #[test]
    fn lc_rotational_background() {
        let cfg = lc_config(3);
        let tuples = observables(&cfg, ProcessingMode::LcToPKPiWithMl, &lc(2, 0));
        assert_eq!(tuples.len(), 4);
        assert!(!tuples[0].is_rotated);
        assert_eq!(tuples[0].inv_mass, 2.27);
        for tuple in &tuples[1..] {
            assert!(tuple.is_rotated);
            assert_eq!(tuple.ml_scores, tuples[0].ml_scores);
            assert_eq!(tuple.angular.pz, tuples[0].angular.pz);
            assert_ne!(tuple.inv_mass, 2.27);
        }

        let both = observables(&cfg, ProcessingMode::LcToPKPiWithMl, &lc(2, 2));
        assert_eq!(both.len(), 8);
    }

    #[test]
    fn rejected_candidates_yield_nothing() {
        let cfg = lc_config(2);
        let mode = ProcessingMode::LcToPKPiWithMl;
        assert!(observables(&cfg, mode, &lc(0, 0)).is_empty());
        assert!(observables(&cfg, mode, &dstar()).is_empty());
        assert!(observables(&Configuration::default(), ProcessingMode::Dstar, &lc(1, 1)).is_empty());
    }

    #[test]
    fn lc_daughter_is_the_proton() {
        let cfg = lc_config(0);
        let Candidate::LcToPKPi(cand) = lc(1, 0) else {
            unreachable!()
        };
        let tuples = observables(&cfg, ProcessingMode::LcToPKPiWithMl, &lc(1, 0));
        let kin = DecayKinematics {
            daughter: cand.prongs[0],
            daughter_mass: masses::PROTON,
            parent: cand.momentum(),
            parent_mass: 2.27,
            nominal_mass: masses::LAMBDA_C_PLUS,
        };
        let expected = AngularObservables::compute(&kin, &ThreeMomentum::new(0., 0., 1.));
        let cos = tuples[0].angular.cos_theta_star;
        for axis in [ReferenceAxis::Helicity, ReferenceAxis::Production, ReferenceAxis::Beam] {
            assert_eq!(cos[axis], expected.cos_theta_star[axis]);
        }
    }

    #[test]
    fn sample_inputs_land_in_mass_window() {
        let cfg = include_str!("../polarisation.cfg")
            .parse::<Configuration>()
            .unwrap();
        let mode = cfg.validate().unwrap();
        let candidates = candidate::parse_all(include_str!("../candidates.txt")).unwrap();
        let (candidates, selection) = CandidateSelection::new(&cfg, mode).select(candidates);
        assert!(selection.num_selected > 0);

        let analysis = PolarisationAnalysis::new(&cfg, mode);
        let mut rng = RandomGenerator::new(cfg.rng_seed);
        let mut inv_masses = Vec::new();
        for candidate in &candidates {
            analysis.for_each_observable(candidate, &mut rng, |tuple| {
                if !tuple.is_rotated {
                    inv_masses.push(tuple.inv_mass);
                }
            });
        }
        assert!(!inv_masses.is_empty());

        // Upstream masses must fall within the regular bins of the mass axis
        let binning = cfg.axes.inv_mass;
        for mass in inv_masses {
            let bin = binning.find_bin(mass);
            assert!(
                bin >= 1 && bin <= binning.bins as u32,
                "mass {mass} outside of {binning}"
            );
        }
    }
}
