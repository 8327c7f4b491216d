//! This module routes the observables of analysed candidates into the
//! polarisation histograms

use crate::{
    angles::{ObservableTuple, ReferenceAxis},
    config::{Configuration, ProcessingMode},
    histogram::{Axis, SparseHistogram},
    numeric::Float,
    Result,
};

use tracing::info;

/// Score put on the classifier axes when a candidate has no scores
pub const MISSING_SCORE: Float = -1.;

/// Largest number of axes of a polarisation histogram
const MAX_DIMENSIONS: usize = 8;

/// Set of polarisation histograms, one per enabled reference axis
///
/// Every histogram has mass, pT, pz, rapidity and decay angle cosine axes.
/// Classifier score axes follow in ML modes, and a rotated candidate flag
/// axis closes the list for channels which support rotational background.
///
#[derive(Clone, Debug, PartialEq)]
pub struct PolarisationHistograms {
    /// Processing mode, which determines the histogram layout
    mode: ProcessingMode,

    /// Enabled histograms, in reference axis order
    histograms: Vec<(ReferenceAxis, SparseHistogram)>,

    /// Number of observable tuples filled so far
    num_tuples: u64,
}
//
impl PolarisationHistograms {
    /// Check the configuration and create empty histograms accordingly
    pub fn new(cfg: &Configuration) -> Result<Self> {
        let mode = cfg.validate()?;
        let histograms = cfg
            .histograms
            .enabled()
            .map(|axis| (axis, Self::make_histogram(cfg, mode, axis)))
            .collect::<Vec<_>>();
        for (_, hist) in &histograms {
            info!(
                "Booked histogram {} with {} axes",
                hist.name(),
                hist.axes().len()
            );
        }
        Ok(Self {
            mode,
            histograms,
            num_tuples: 0,
        })
    }

    /// Build the empty histogram associated with one reference axis
    fn make_histogram(
        cfg: &Configuration,
        mode: ProcessingMode,
        ref_axis: ReferenceAxis,
    ) -> SparseHistogram {
        let axes_cfg = &cfg.axes;
        let mut axes = vec![
            Axis {
                title: "inv. mass (GeV/c^2)",
                binning: axes_cfg.inv_mass,
            },
            Axis {
                title: "pT (GeV/c)",
                binning: axes_cfg.pt,
            },
            Axis {
                title: "pz (GeV/c)",
                binning: axes_cfg.pz,
            },
            Axis {
                title: "y",
                binning: axes_cfg.rapidity,
            },
            Axis {
                title: match ref_axis {
                    ReferenceAxis::Helicity => "cos theta* (helicity)",
                    ReferenceAxis::Production => "cos theta* (production)",
                    ReferenceAxis::Beam => "cos theta* (beam)",
                    ReferenceAxis::Random => "cos theta* (random)",
                },
                binning: axes_cfg.cos_theta_star(ref_axis),
            },
        ];
        if mode.with_ml() {
            axes.push(Axis {
                title: "ML bkg",
                binning: axes_cfg.ml_bkg,
            });
            axes.push(Axis {
                title: "ML non-prompt",
                binning: axes_cfg.ml_non_prompt,
            });
        }
        if mode.channel().supports_rotation() {
            axes.push(Axis {
                title: "isRotated",
                binning: axes_cfg.is_rotated,
            });
        }
        debug_assert!(axes.len() <= MAX_DIMENSIONS);
        SparseHistogram::new(
            format!("polarisation_{}", ref_axis.name()),
            format!("Polarisation w.r.t. {} axis, {}", ref_axis.name(), mode),
            axes,
        )
    }

    /// Processing mode for which the histograms were booked
    pub fn mode(&self) -> ProcessingMode {
        self.mode
    }

    /// Number of observable tuples filled so far
    pub fn num_tuples(&self) -> u64 {
        self.num_tuples
    }

    /// Iterate over the enabled histograms
    pub fn iter(&self) -> impl Iterator<Item = &SparseHistogram> + '_ {
        self.histograms.iter().map(|(_, hist)| hist)
    }

    /// Histogram associated with a reference axis, if enabled
    #[cfg(test)]
    pub fn get(&self, axis: ReferenceAxis) -> Option<&SparseHistogram> {
        self.histograms
            .iter()
            .find(|(ref_axis, _)| *ref_axis == axis)
            .map(|(_, hist)| hist)
    }

    /// Count one observable tuple in every enabled histogram
    pub fn fill(&mut self, tuple: &ObservableTuple) {
        let angular = &tuple.angular;
        let mut point = [0.; MAX_DIMENSIONS];
        point[..4].copy_from_slice(&[tuple.inv_mass, angular.pt, angular.pz, angular.rapidity]);

        // Slot 4 holds the decay angle, the axes which follow it are shared
        // by all histograms
        let mut num_dims = 5;
        if self.mode.with_ml() {
            let (bkg, non_prompt) = tuple
                .ml_scores
                .map(|scores| (scores.background(), scores.non_prompt()))
                .unwrap_or((MISSING_SCORE, MISSING_SCORE));
            point[5..7].copy_from_slice(&[bkg, non_prompt]);
            num_dims = 7;
        }
        if self.mode.channel().supports_rotation() {
            point[num_dims] = if tuple.is_rotated { 1. } else { 0. };
            num_dims += 1;
        }

        for (axis, hist) in &mut self.histograms {
            point[4] = angular.cos_theta_star[*axis];
            hist.fill(&point[..num_dims]);
        }
        self.num_tuples += 1;
    }

    /// Integrate the contents of another set of histograms
    pub fn merge(&mut self, other: Self) {
        assert_eq!(self.mode, other.mode, "Cannot merge histograms of different modes");
        assert_eq!(
            self.histograms.len(),
            other.histograms.len(),
            "Cannot merge different histogram sets"
        );
        for ((axis1, hist1), (axis2, hist2)) in self.histograms.iter_mut().zip(other.histograms) {
            assert_eq!(*axis1, axis2, "Cannot merge different histogram sets");
            hist1.merge(hist2);
        }
        self.num_tuples += other.num_tuples;
    }
}
