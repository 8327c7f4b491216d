//! Basic numerical concepts used throughout the program

#![allow(missing_docs)]

// Floating-point precision is configured here
#[cfg(feature = "f32")]
pub type Float = f32;
#[cfg(feature = "f32")]
pub use std::f32 as floats;
#[cfg(not(feature = "f32"))]
pub type Float = f64;
#[cfg(not(feature = "f32"))]
pub use std::f64 as floats;

/// Rest masses of the particles involved in the analysed decays (GeV/c²)
pub mod masses {
    use super::Float;

    /// Charged pion
    pub const PI_PLUS: Float = 0.139_570_39;

    /// Charged kaon
    pub const KAON_CHARGED: Float = 0.493_677;

    /// Proton
    pub const PROTON: Float = 0.938_272_088_16;

    /// D*(2010)+ meson
    pub const D_STAR: Float = 2.010_26;

    /// Λc+ baryon
    pub const LAMBDA_C_PLUS: Float = 2.286_46;
}

/// Tolerance of floating-point comparisons in tests, which scales with the
/// configured precision
#[cfg(test)]
pub const TEST_EPSILON: Float = 1e3 * Float::EPSILON;
