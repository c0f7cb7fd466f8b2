//! Installation self-check for the WhiteboxTools executable.

use std::env;
use std::fs;
use std::path::Path;

use error_stack::{Report, ResultExt};
use gdal::spatial_ref::SpatialRef;
use serde::Serialize;
use thiserror::Error;

use crate::raster::Raster;
use crate::support::{nan_max, nan_min};
use crate::whiteboxtools_wrappers::{SlopeUnits, WhiteboxTools};

pub const ESSENTIAL_TOOLS: [&str; 4] = ["Slope", "Aspect", "D8Pointer", "D8FlowAccumulation"];
pub const API_KEY_VARS: [&str; 2] = ["OPENTOPO_API_KEY", "GEMINI_API_KEY"];

const HILL_SIZE: usize = 50;

#[derive(Debug, Error)]
pub enum SelfCheckError {
    #[error("WhiteboxTools executable did not respond")]
    Executable,
    #[error("missing essential tools: {0:?}")]
    MissingTools(Vec<String>),
    #[error("could not write synthetic DEM")]
    SyntheticDem,
    #[error("slope calculation failed")]
    Slope,
    #[error("slope output contains only NaN values")]
    EmptySlope,
    #[error("aspect calculation failed")]
    Aspect,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelfCheckReport {
    pub version: String,
    pub tool_count: usize,
    pub slope_min: f64,
    pub slope_max: f64,
}

/// 100 m Gaussian hill over lon/lat -1..1 in EPSG:4326, sampled at pixel
/// centres.
pub fn synthetic_hill(size: usize) -> Raster<f32> {
    let pixel = 2.0 / size.max(1) as f64;
    let axis: Vec<f64> = (0..size).map(|i| -1.0 + (i as f64 + 0.5) * pixel).collect();

    let mut data = Vec::with_capacity(size * size);
    for y in &axis {
        for x in &axis {
            data.push((100.0 * (-(x * x + y * y)).exp()) as f32);
        }
    }

    let projection = SpatialRef::from_epsg(4326)
        .and_then(|srs| srs.to_wkt())
        .unwrap_or_default();

    Raster {
        width: size,
        height: size,
        geo_transform: [-1.0, pixel, 0.0, 1.0, 0.0, -pixel],
        projection,
        no_data: None,
        data,
    }
}

/// Probes the executable, its tool list and a real slope/aspect run on a
/// synthetic DEM written under `work_dir`.
pub fn run_self_check(wbt: &WhiteboxTools, work_dir: &Path) -> Result<SelfCheckReport, Report<SelfCheckError>> {
    let version = wbt.version().change_context(SelfCheckError::Executable)?;
    log::info!("found {}", version);

    let tool_count = wbt.list_tools().change_context(SelfCheckError::Executable)?.len();
    let missing = wbt
        .missing_tools(&ESSENTIAL_TOOLS)
        .change_context(SelfCheckError::Executable)?;
    if !missing.is_empty() {
        return Err(Report::new(SelfCheckError::MissingTools(missing)));
    }

    fs::create_dir_all(work_dir).change_context(SelfCheckError::SyntheticDem)?;
    let dem_fn = work_dir.join("test_dem.tif");
    synthetic_hill(HILL_SIZE)
        .write(&dem_fn)
        .change_context(SelfCheckError::SyntheticDem)?;

    let slope_fn = work_dir.join("test_slope.tif");
    wbt.slope(&dem_fn, &slope_fn, SlopeUnits::Degrees)
        .change_context(SelfCheckError::Slope)?;
    let slope = Raster::<f64>::read(&slope_fn)
        .change_context(SelfCheckError::Slope)?
        .masked();
    let (slope_min, slope_max) = (nan_min(&slope.data), nan_max(&slope.data));
    if slope_min.is_nan() {
        return Err(Report::new(SelfCheckError::EmptySlope));
    }

    let aspect_fn = work_dir.join("test_aspect.tif");
    wbt.aspect(&dem_fn, &aspect_fn)
        .change_context(SelfCheckError::Aspect)?;
    if !aspect_fn.exists() {
        return Err(Report::new(SelfCheckError::Aspect));
    }

    Ok(SelfCheckReport {
        version,
        tool_count,
        slope_min,
        slope_max,
    })
}

/// Stars out a secret, capped at 20 characters.
pub fn mask_secret(value: &str) -> String {
    "*".repeat(value.chars().count().min(20))
}

/// `(variable, masked value with its length)` for each API key variable.
pub fn environment_summary() -> Vec<(&'static str, Option<String>)> {
    API_KEY_VARS
        .iter()
        .map(|&var| {
            let shown = env::var(var)
                .ok()
                .filter(|v| !v.is_empty())
                .map(|v| format!("{} (length: {})", mask_secret(&v), v.chars().count()));
            (var, shown)
        })
        .collect()
}
