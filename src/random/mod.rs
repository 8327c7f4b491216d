//! Random number generation module, built on top of the "rand" crate that is
//! the Rust standard for RNGs, and random direction sampling

mod standard;

use crate::{
    momentum::ThreeMomentum,
    numeric::floats::consts::PI,
    Result,
};

use eyre::bail;
use prefix_num_ops::real::*;

use std::{fmt, str::FromStr};

/// Select the RNG implementation in use
pub use self::standard::RandGenerator as RandomGenerator;

/// Method used to draw the direction of the random reference axis
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RandomAxisSampling {
    /// Azimuth and polar angle both drawn uniformly
    ///
    /// Kept as the default for comparability with past results. Directions
    /// are NOT isotropic: they pile up near the poles, since a uniform polar
    /// angle over-populates small solid angles there.
    ///
    #[default]
    UniformTheta,

    /// Azimuth and cosine of polar angle drawn uniformly, which yields
    /// isotropic directions
    Isotropic,
}
//
impl FromStr for RandomAxisSampling {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "uniform-theta" => Ok(Self::UniformTheta),
            "isotropic" => Ok(Self::Isotropic),
            other => bail!("Unknown random axis sampling {other:?}, expected uniform-theta or isotropic"),
        }
    }
}
//
impl fmt::Display for RandomAxisSampling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UniformTheta => write!(f, "uniform-theta"),
            Self::Isotropic => write!(f, "isotropic"),
        }
    }
}
//
impl RandomAxisSampling {
    /// Draw a unit vector
    pub fn sample(self, rng: &mut RandomGenerator) -> ThreeMomentum {
        let phi = rng.uniform(0., 2. * PI);
        let theta = match self {
            Self::UniformTheta => rng.uniform(0., PI),
            Self::Isotropic => rng.uniform(-1., 1.).acos(),
        };
        ThreeMomentum::new(sin(theta) * cos(phi), sin(theta) * sin(phi), cos(theta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::{Float, TEST_EPSILON};
    use approx::assert_relative_eq;

    const NUM_SAMPLES: usize = 200_000;

    /// Fraction of sampled directions pointing within 60° of the beam axis
    /// (either way), which is 1/2 for isotropic directions
    fn polar_fraction(sampling: RandomAxisSampling) -> Float {
        let mut rng = RandomGenerator::new(12345);
        let polar = (0..NUM_SAMPLES)
            .map(|_| sampling.sample(&mut rng))
            .filter(|dir| dir.z.abs() > 0.5)
            .count();
        polar as Float / NUM_SAMPLES as Float
    }

    #[test]
    fn directions_are_unit_vectors() {
        let mut rng = RandomGenerator::new(1);
        for sampling in [RandomAxisSampling::UniformTheta, RandomAxisSampling::Isotropic] {
            for _ in 0..100 {
                assert_relative_eq!(sampling.sample(&mut rng).norm(), 1., epsilon = TEST_EPSILON);
            }
        }
    }

    #[test]
    fn isotropic_sampling() {
        assert_relative_eq!(polar_fraction(RandomAxisSampling::Isotropic), 0.5, epsilon = 0.01);
    }

    #[test]
    fn uniform_theta_is_not_isotropic() {
        // Uniform polar angle: |cos θ| > 1/2 for θ < π/3 or θ > 2π/3, i.e. 2/3
        // of the time instead of 1/2
        assert_relative_eq!(
            polar_fraction(RandomAxisSampling::UniformTheta),
            2. / 3.,
            epsilon = 0.01
        );
    }

    #[test]
    fn parse_sampling() {
        assert_eq!(
            "isotropic".parse::<RandomAxisSampling>().unwrap(),
            RandomAxisSampling::Isotropic
        );
        assert_eq!(
            "uniform-theta".parse::<RandomAxisSampling>().unwrap(),
            RandomAxisSampling::UniformTheta
        );
        assert!("gaussian".parse::<RandomAxisSampling>().is_err());
    }
}
