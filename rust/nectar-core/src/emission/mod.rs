// Emission - Time-based unlock curves gating allocation minting
pub mod curve;
pub mod math;

pub use curve::{CurveError, CurvePhase, EmissionCurveParams, MAX_CURVE_DURATION, MAX_STEEPNESS};
pub use math::{mul_div_floor, pow_wad, WAD};
