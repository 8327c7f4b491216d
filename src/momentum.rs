//! This module implements some domain-specific 4-momentum handling logic.

use crate::numeric::Float;
use nalgebra::{SVector, Vector3};
use num_traits::Zero;
use prefix_num_ops::real::*;

/// 4-momentum dimension
pub const MOMENTUM_DIM: usize = 4;

/// Relativistic 4-momentum
pub type Momentum = SVector<Float, MOMENTUM_DIM>;

/// Spatial part of a 4-momentum, as reconstructed for tracks (GeV/c)
pub type ThreeMomentum = Vector3<Float>;

/// Convenience const for accessing the X coordinate of a 4-vector
pub const X: usize = 0;

/// Convenience const for accessing the Y coordinate of a 4-vector
pub const Y: usize = 1;

/// Convenience const for accessing the Z coordinate of a 4-vector
pub const Z: usize = 2;

/// Convenience const for accessing the E coordinate of a 4-vector
pub const E: usize = 3;

/// Build a 4-momentum from a 3-momentum and an invariant mass
pub fn with_mass(p: &ThreeMomentum, mass: Float) -> Momentum {
    let energy = sqrt(p.norm_squared() + mass.powi(2));
    Momentum::new(p[X], p[Y], p[Z], energy)
}

/// Invariant mass of a 4-momentum
///
/// Space-like inputs yield NaN, which callers are expected to propagate.
///
pub fn mass(m: &Momentum) -> Float {
    sqrt(m[E].powi(2) - m.xyz().norm_squared())
}

/// Transverse momentum, i.e. momentum projected on the plane normal to the beam
pub fn transverse(p: &ThreeMomentum) -> Float {
    sqrt(p[X].powi(2) + p[Y].powi(2))
}

/// Rapidity of a particle of a given mass along the beam axis
pub fn rapidity(p: &ThreeMomentum, mass: Float) -> Float {
    let energy = sqrt(p.norm_squared() + mass.powi(2));
    0.5 * ln((energy + p[Z]) / (energy - p[Z]))
}

/// Invariant mass of a multi-body system, given each body's 3-momentum and
/// assumed rest mass
pub fn invariant_mass<const N: usize>(momenta: &[ThreeMomentum; N], masses: &[Float; N]) -> Float {
    let total = momenta
        .iter()
        .zip(masses.iter())
        .map(|(p, &m)| with_mass(p, m))
        .fold(Momentum::zero(), |acc, m| acc + m);
    mass(&total)
}

/// Rotate the transverse components of a 3-momentum around the beam axis
///
/// The longitudinal component is left untouched.
///
pub fn rotate_transverse(p: &ThreeMomentum, angle: Float) -> ThreeMomentum {
    let (sin_a, cos_a) = (sin(angle), cos(angle));
    ThreeMomentum::new(
        p[X] * cos_a - p[Y] * sin_a,
        p[X] * sin_a + p[Y] * cos_a,
        p[Z],
    )
}

/// Pure Lorentz boost, parametrized by its velocity vector (in units of c)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Boost {
    beta: ThreeMomentum,
}
//
impl Boost {
    /// Boost by an arbitrary velocity
    pub fn new(beta: ThreeMomentum) -> Self {
        Self { beta }
    }

    /// Boost which brings a 4-momentum to its own rest frame
    pub fn to_rest_frame(m: &Momentum) -> Self {
        Self::new(-m.xyz() / m[E])
    }

    /// Boost which undoes this one
    #[cfg(test)]
    pub fn inverse(&self) -> Self {
        Self::new(-self.beta)
    }

    /// Apply this boost to a 4-momentum
    pub fn apply(&self, m: &Momentum) -> Momentum {
        let beta2 = self.beta.norm_squared();
        if beta2 == 0. {
            return *m;
        }
        let gamma = 1. / sqrt(1. - beta2);
        let p = m.xyz();
        let beta_p = self.beta.dot(&p);
        let p_boosted = p + self.beta * ((gamma - 1.) * beta_p / beta2 + gamma * m[E]);
        let e_boosted = gamma * (m[E] + beta_p);
        Momentum::new(p_boosted[X], p_boosted[Y], p_boosted[Z], e_boosted)
    }
}
