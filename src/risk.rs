//! Per-pixel flood and erosion risk indices.

use rayon::prelude::*;

use crate::support::nan_max;

/// Rainfall erosivity (R), a fixed placeholder rather than a regional value.
pub const RAINFALL_EROSIVITY: f64 = 850.0;
/// Soil erodibility (K), a fixed placeholder rather than a regional value.
pub const SOIL_ERODIBILITY: f64 = 0.25;
pub const LS_EXPONENT: f64 = 1.3;

/// Flood index from flow accumulation and slope in degrees.
///
/// Flow is log-normalised against the largest accumulation in the scene, then
/// damped by slope: `log1p(flow) / log1p(max_flow) * 1 / (1 + slope)`.
/// When the normaliser is not a positive finite number (no accumulation
/// anywhere) the normalised flow is taken as zero instead of dividing by zero.
/// NaN pixels in either input stay NaN.
pub fn flood_risk(flow: &[f64], slope_degrees: &[f64]) -> Vec<f64> {
    let denom = nan_max(flow).ln_1p();
    let normalise = denom.is_finite() && denom > 0.0;

    flow.par_iter()
        .zip(slope_degrees.par_iter())
        .map(|(&f, &s)| {
            if f.is_nan() || s.is_nan() {
                return f64::NAN;
            }
            let flow_norm = if normalise { f.ln_1p() / denom } else { 0.0 };
            flow_norm * (1.0 / (1.0 + s))
        })
        .collect()
}

/// Simplified RUSLE index from slope in percent: `R * K * (slope / 100)^1.3`.
pub fn erosion_risk(slope_percent: &[f64]) -> Vec<f64> {
    slope_percent
        .par_iter()
        .map(|&s| RAINFALL_EROSIVITY * SOIL_ERODIBILITY * (s / 100.0).powf(LS_EXPONENT))
        .collect()
}
