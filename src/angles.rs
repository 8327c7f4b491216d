//! This module computes the decay angle observables of a candidate, in the
//! rest frame of the decaying hadron

use crate::{
    candidate::MlScores,
    momentum::{self, Boost, ThreeMomentum, X, Y},
    numeric::Float,
};

use std::{fmt, ops::Index};

/// Number of reference axes against which decay angles are measured
pub const NUM_REFERENCE_AXES: usize = 4;

/// Reference axes against which the decay angle is measured
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReferenceAxis {
    /// Direction of flight of the decaying hadron in the laboratory
    Helicity,

    /// Normal to the plane containing the beam and the decaying hadron
    Production,

    /// Beam direction
    Beam,

    /// Randomly drawn direction, a control for acceptance effects
    Random,
}
//
impl ReferenceAxis {
    /// All reference axes, in histogram order
    pub const ALL: [Self; NUM_REFERENCE_AXES] =
        [Self::Helicity, Self::Production, Self::Beam, Self::Random];

    /// Short lowercase name of the axis
    pub fn name(self) -> &'static str {
        match self {
            Self::Helicity => "helicity",
            Self::Production => "production",
            Self::Beam => "beam",
            Self::Random => "random",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}
//
impl fmt::Display for ReferenceAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Cosine of the decay angle with respect to each reference axis
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CosThetaStar([Float; NUM_REFERENCE_AXES]);
//
impl Index<ReferenceAxis> for CosThetaStar {
    type Output = Float;

    fn index(&self, axis: ReferenceAxis) -> &Float {
        &self.0[axis.index()]
    }
}

/// Kinematics of a candidate under one mass hypothesis and one rotation
#[derive(Clone, Debug, PartialEq)]
pub struct DecayKinematics {
    /// Laboratory momentum of the daughter whose direction is measured
    pub daughter: ThreeMomentum,

    /// Rest mass assumed for that daughter
    pub daughter_mass: Float,

    /// Laboratory momentum of the decaying hadron
    pub parent: ThreeMomentum,

    /// Invariant mass of the decaying hadron, as reconstructed
    pub parent_mass: Float,

    /// Nominal mass of the decaying hadron, used for the rapidity
    pub nominal_mass: Float,
}

/// Observables of a candidate which do not depend on how it will be
/// histogrammed
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AngularObservables {
    /// Transverse momentum of the decaying hadron
    pub pt: Float,

    /// Longitudinal momentum of the decaying hadron
    pub pz: Float,

    /// Rapidity of the decaying hadron
    pub rapidity: Float,

    /// Decay angle cosines
    pub cos_theta_star: CosThetaStar,
}
//
impl AngularObservables {
    /// Boost the daughter into the rest frame of the decaying hadron and
    /// measure its direction against every reference axis
    ///
    /// Zero-length vectors are not guarded against: a daughter at rest in
    /// the hadron frame, or a hadron at rest in the laboratory, yield NaN
    /// cosines which propagate to the histograms.
    ///
    pub fn compute(kin: &DecayKinematics, random_axis: &ThreeMomentum) -> Self {
        let parent = momentum::with_mass(&kin.parent, kin.parent_mass);
        let daughter = momentum::with_mass(&kin.daughter, kin.daughter_mass);
        let daughter_cm = Boost::to_rest_frame(&parent).apply(&daughter).xyz();
        let daughter_norm = daughter_cm.norm();

        // Helicity and production axes are not normalized, beam and random
        // axes are unit vectors by construction
        let helicity = kin.parent;
        let production = ThreeMomentum::new(kin.parent[Y], -kin.parent[X], 0.);
        let cos_with = |axis: &ThreeMomentum| axis.dot(&daughter_cm) / daughter_norm / axis.norm();
        let cos_theta_star = CosThetaStar([
            cos_with(&helicity),
            cos_with(&production),
            daughter_cm.z / daughter_norm,
            random_axis.dot(&daughter_cm) / daughter_norm,
        ]);

        Self {
            pt: momentum::transverse(&kin.parent),
            pz: kin.parent.z,
            rapidity: momentum::rapidity(&kin.parent, kin.nominal_mass),
            cos_theta_star,
        }
    }
}

/// Full set of observables for one candidate under one mass hypothesis and
/// one rotation, ready to be histogrammed
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObservableTuple {
    /// Mass used on the histogram mass axis
    pub inv_mass: Float,

    /// Kinematics and decay angles
    pub angular: AngularObservables,

    /// Truth that this is a rotated (background) copy of a candidate
    pub is_rotated: bool,

    /// Classifier scores, if available
    pub ml_scores: Option<MlScores>,
}
