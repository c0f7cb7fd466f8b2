//! Raster derivations driven from the downloaded DEM.
//!
//! Slope, aspect and the D8 grids come from WhiteboxTools; the flood and
//! erosion indices are computed here from its outputs. Everything in this
//! module blocks and is meant to run off the async runtime.

use std::path::{Path, PathBuf};

use error_stack::ResultExt;
use serde::Serialize;

use crate::error::{AnalysisError, Result};
use crate::raster::Raster;
use crate::risk::{erosion_risk, flood_risk};
use crate::utils::ProjectFiles;
use crate::whiteboxtools_wrappers::{SlopeUnits, WhiteboxTools};

/// Every raster produced for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedRasters {
    pub dem: PathBuf,
    pub slope: PathBuf,
    pub aspect: PathBuf,
    pub flow_direction: PathBuf,
    pub flow_accumulation: PathBuf,
    pub flood_risk: PathBuf,
    pub erosion_risk: PathBuf,
}

pub fn calculate_slope(wbt: &WhiteboxTools, dem: &Path, files: &ProjectFiles) -> Result<PathBuf> {
    let slope_fn = files.raster("slope");
    wbt.slope(dem, &slope_fn, SlopeUnits::Degrees)
        .change_context(AnalysisError::Slope)?;
    Ok(slope_fn)
}

pub fn calculate_aspect(wbt: &WhiteboxTools, dem: &Path, files: &ProjectFiles) -> Result<PathBuf> {
    let aspect_fn = files.raster("aspect");
    wbt.aspect(dem, &aspect_fn)
        .change_context(AnalysisError::Aspect)?;
    Ok(aspect_fn)
}

/// Returns `(flow direction, flow accumulation)`.
pub fn calculate_flow_accumulation(
    wbt: &WhiteboxTools,
    dem: &Path,
    files: &ProjectFiles,
) -> Result<(PathBuf, PathBuf)> {
    let flow_dir_fn = files.raster("flowdir");
    wbt.d8_pointer(dem, &flow_dir_fn)
        .change_context(AnalysisError::FlowAccumulation)?;

    let flow_acc_fn = files.raster("flowacc");
    wbt.d8_flow_accumulation(dem, &flow_acc_fn)
        .change_context(AnalysisError::FlowAccumulation)?;

    Ok((flow_dir_fn, flow_acc_fn))
}

/// Writes the flood index next to a fresh degree slope (`slope_flood`).
/// The output keeps the flow accumulation grid's georeferencing.
pub fn calculate_flood_risk(
    wbt: &WhiteboxTools,
    dem: &Path,
    flow_acc: &Path,
    files: &ProjectFiles,
) -> Result<PathBuf> {
    let slope_fn = files.raster("slope_flood");
    wbt.slope(dem, &slope_fn, SlopeUnits::Degrees)
        .change_context(AnalysisError::FloodRisk)?;

    let flow = Raster::<f64>::read(flow_acc)
        .change_context(AnalysisError::FloodRisk)?
        .masked();
    let slope = Raster::<f64>::read(&slope_fn)
        .change_context(AnalysisError::FloodRisk)?
        .masked();
    flow.ensure_same_shape(&slope)
        .change_context(AnalysisError::FloodRisk)?;

    let risk = flood_risk(&flow.data, &slope.data);
    let flood_fn = files.raster("flood_risk");
    flow.with_data(risk, Some(f64::NAN))
        .to_f32()
        .write(&flood_fn)
        .change_context(AnalysisError::FloodRisk)?;

    Ok(flood_fn)
}

/// Writes the RUSLE-style index from a percent slope (`slope_erosion`).
pub fn calculate_erosion_risk(wbt: &WhiteboxTools, dem: &Path, files: &ProjectFiles) -> Result<PathBuf> {
    let slope_fn = files.raster("slope_erosion");
    wbt.slope(dem, &slope_fn, SlopeUnits::Percent)
        .change_context(AnalysisError::ErosionRisk)?;

    let slope = Raster::<f64>::read(&slope_fn)
        .change_context(AnalysisError::ErosionRisk)?
        .masked();

    let erosion_fn = files.raster("erosion_risk");
    slope
        .with_data(erosion_risk(&slope.data), Some(f64::NAN))
        .to_f32()
        .write(&erosion_fn)
        .change_context(AnalysisError::ErosionRisk)?;

    Ok(erosion_fn)
}

/// Runs every derivation in order against an already downloaded DEM.
pub fn derive_rasters(wbt: &WhiteboxTools, dem: &Path, files: &ProjectFiles) -> Result<DerivedRasters> {
    let slope = calculate_slope(wbt, dem, files)?;
    let aspect = calculate_aspect(wbt, dem, files)?;
    let (flow_direction, flow_accumulation) = calculate_flow_accumulation(wbt, dem, files)?;
    let flood_risk = calculate_flood_risk(wbt, dem, &flow_accumulation, files)?;
    let erosion_risk = calculate_erosion_risk(wbt, dem, files)?;

    Ok(DerivedRasters {
        dem: dem.to_path_buf(),
        slope,
        aspect,
        flow_direction,
        flow_accumulation,
        flood_risk,
        erosion_risk,
    })
}
