//! Rotational background: synthetic combinatorial background built by
//! rotating the transverse momentum of one decay product around the beam

use crate::{
    hypothesis::ResolvedHypothesis,
    momentum::{self, ThreeMomentum},
    numeric::{floats::consts::PI, Float},
};

/// Kinematics of the decaying hadron, as seen by the histograms
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParentKinematics {
    /// Laboratory momentum
    pub momentum: ThreeMomentum,

    /// Invariant mass, used to boost into the rest frame
    pub inv_mass: Float,

    /// Mass which goes on the histogram mass axis
    pub histogram_mass: Float,
}

/// Decay products of a candidate whose momenta can be summed back into the
/// momentum of the decaying hadron
#[derive(Clone, Debug, PartialEq)]
pub struct Recombination {
    /// Prong momenta
    pub prongs: [ThreeMomentum; 3],

    /// Rest masses of the prongs under the mass hypothesis being studied
    pub masses: [Float; 3],

    /// Index of the prong which gets rotated
    pub rotated_prong: usize,
}
//
impl Recombination {
    /// Prong momenta after rotating the designated prong by some angle
    pub fn rotated_prongs(&self, angle: Float) -> [ThreeMomentum; 3] {
        let mut prongs = self.prongs;
        prongs[self.rotated_prong] = momentum::rotate_transverse(&prongs[self.rotated_prong], angle);
        prongs
    }

    /// Hadron kinematics after rotating the designated prong by some angle
    ///
    /// The invariant mass is recomputed from the prong momenta, since the
    /// one computed upstream only holds for the original candidate.
    ///
    pub fn rotated_parent(&self, angle: Float) -> ParentKinematics {
        let prongs = self.rotated_prongs(angle);
        let inv_mass = momentum::invariant_mass(&prongs, &self.masses);
        ParentKinematics {
            momentum: prongs.iter().sum(),
            inv_mass,
            histogram_mass: inv_mass,
        }
    }
}

/// One member of the rotational background ensemble of a candidate
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotationVariant {
    /// Index of the variant, 0 being the original candidate
    pub index: usize,

    /// Rotation angle (radians)
    pub angle: Float,

    /// Kinematics of the decaying hadron for this variant
    pub parent: ParentKinematics,
}
//
impl RotationVariant {
    /// Truth that this is a synthetic background copy
    pub fn is_rotated(&self) -> bool {
        self.index > 0
    }
}

/// Generator of the rotational background ensemble
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotationalBackground {
    num_rotations: usize,
    angle_step: Float,
}
//
impl RotationalBackground {
    /// Set up generation of `num_rotations` rotated copies per candidate
    ///
    /// Copies are evenly spaced in azimuth, so that one rotation yields a
    /// rotation by π, two yield 2π/3 and 4π/3, and so on.
    ///
    pub fn new(num_rotations: usize) -> Self {
        Self {
            num_rotations,
            angle_step: 2. * PI / (num_rotations + 1) as Float,
        }
    }

    /// Angle by which the k-th variant is rotated
    pub fn angle(&self, index: usize) -> Float {
        self.angle_step * index as Float
    }

    /// Enumerate the original candidate followed by its rotated copies
    ///
    /// Candidates whose decay products cannot be recombined only yield the
    /// original candidate.
    ///
    pub fn variants<'a>(
        &'a self,
        hypothesis: &'a ResolvedHypothesis,
    ) -> impl Iterator<Item = RotationVariant> + 'a {
        let num_rotations = if hypothesis.recombination.is_some() {
            self.num_rotations
        } else {
            0
        };
        (0..=num_rotations).map(move |index| {
            let angle = self.angle(index);
            let parent = match &hypothesis.recombination {
                Some(recombination) if index > 0 => recombination.rotated_parent(angle),
                _ => hypothesis.parent,
            };
            RotationVariant {
                index,
                angle,
                parent,
            }
        })
    }
}
