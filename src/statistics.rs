use std::path::Path;

use error_stack::ResultExt;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::raster::Raster;
use crate::support::{nan_max, nan_mean, nan_min, percent_above, predominant_direction};

/// Slopes above this many degrees count as steep.
pub const STEEP_SLOPE_DEGREES: f64 = 30.0;

/// Scalar summary of the six analysis rasters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainStatistics {
    pub min_elevation: f64,
    pub max_elevation: f64,
    pub mean_elevation: f64,
    pub elevation_range: f64,
    pub min_slope: f64,
    pub max_slope: f64,
    pub mean_slope: f64,
    pub steep_areas_percent: f64,
    pub mean_aspect: f64,
    pub predominant_direction: String,
    pub flow_acc_max: f64,
    pub flow_acc_mean: f64,
    pub flood_risk_mean: f64,
    pub flood_risk_max: f64,
    pub erosion_risk_mean: f64,
    pub erosion_risk_max: f64,
}

/// Pixel arrays feeding [`TerrainStatistics`]. Slope and aspect in degrees.
#[derive(Debug, Clone, Copy)]
pub struct TerrainArrays<'a> {
    pub elevation: &'a [f64],
    pub slope: &'a [f64],
    pub aspect: &'a [f64],
    pub flow_accumulation: &'a [f64],
    pub flood_risk: &'a [f64],
    pub erosion_risk: &'a [f64],
}

/// Paths of the rasters feeding [`TerrainStatistics::from_files`].
#[derive(Debug, Clone, Copy)]
pub struct TerrainFiles<'a> {
    pub dem: &'a Path,
    pub slope: &'a Path,
    pub aspect: &'a Path,
    pub flow_accumulation: &'a Path,
    pub flood_risk: &'a Path,
    pub erosion_risk: &'a Path,
}

impl TerrainStatistics {
    pub fn from_arrays(arrays: TerrainArrays<'_>) -> Self {
        let min_elevation = nan_min(arrays.elevation);
        let max_elevation = nan_max(arrays.elevation);
        let mean_aspect = nan_mean(arrays.aspect);

        Self {
            min_elevation,
            max_elevation,
            mean_elevation: nan_mean(arrays.elevation),
            elevation_range: max_elevation - min_elevation,
            min_slope: nan_min(arrays.slope),
            max_slope: nan_max(arrays.slope),
            mean_slope: nan_mean(arrays.slope),
            steep_areas_percent: percent_above(arrays.slope, STEEP_SLOPE_DEGREES),
            mean_aspect,
            predominant_direction: predominant_direction(mean_aspect).to_string(),
            flow_acc_max: nan_max(arrays.flow_accumulation),
            flow_acc_mean: nan_mean(arrays.flow_accumulation),
            flood_risk_mean: nan_mean(arrays.flood_risk),
            flood_risk_max: nan_max(arrays.flood_risk),
            erosion_risk_mean: nan_mean(arrays.erosion_risk),
            erosion_risk_max: nan_max(arrays.erosion_risk),
        }
    }

    /// Reads band 1 of each file, masking declared nodata, and reduces.
    pub fn from_files(files: TerrainFiles<'_>) -> Result<Self> {
        let read = |path: &Path| -> Result<Raster<f64>> {
            Ok(Raster::<f64>::read(path)
                .change_context(AnalysisError::Statistics)?
                .masked())
        };

        let elevation = read(files.dem)?;
        let slope = read(files.slope)?;
        let aspect = read(files.aspect)?;
        let flow = read(files.flow_accumulation)?;
        let flood = read(files.flood_risk)?;
        let erosion = read(files.erosion_risk)?;

        let stats = Self::from_arrays(TerrainArrays {
            elevation: &elevation.data,
            slope: &slope.data,
            aspect: &aspect.data,
            flow_accumulation: &flow.data,
            flood_risk: &flood.data,
            erosion_risk: &erosion.data,
        });
        log::info!(
            "terrain statistics: elevation {:.1}..{:.1} m, mean slope {:.2}°, facing {}",
            stats.min_elevation,
            stats.max_elevation,
            stats.mean_slope,
            stats.predominant_direction
        );
        Ok(stats)
    }
}
