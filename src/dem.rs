use std::path::Path;

use error_stack::{Report, ResultExt};
use reqwest::Client;

use crate::boundary::BoundingBox;
use crate::config::Config;
use crate::error::{AnalysisError, Result};

/// Downloads a GeoTIFF DEM covering `bbox` from the OpenTopography global DEM
/// API and stores it at `dem_path`.
pub async fn fetch_dem(client: &Client, config: &Config, bbox: &BoundingBox, dem_path: &Path) -> Result<()> {
    let api_key = config
        .opentopo_api_key
        .as_deref()
        .ok_or_else(|| Report::new(AnalysisError::MissingDemKey).change_context(AnalysisError::DemFetch))?;

    let params = [
        ("demtype", config.dem_type.clone()),
        ("south", bbox.min_lat.to_string()),
        ("north", bbox.max_lat.to_string()),
        ("west", bbox.min_lon.to_string()),
        ("east", bbox.max_lon.to_string()),
        ("outputFormat", "GTiff".to_string()),
        ("API_Key", api_key.to_string()),
    ];

    log::info!(
        "fetching {} DEM for S{} N{} W{} E{}",
        config.dem_type,
        bbox.min_lat,
        bbox.max_lat,
        bbox.min_lon,
        bbox.max_lon
    );

    // without_url keeps the API key out of error messages returned to callers
    let response = client
        .get(&config.opentopo_url)
        .query(&params)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| e.without_url())
        .change_context(AnalysisError::DemFetch)?;

    let bytes = response
        .bytes()
        .await
        .map_err(|e| e.without_url())
        .change_context(AnalysisError::DemFetch)?;

    tokio::fs::write(dem_path, &bytes)
        .await
        .change_context(AnalysisError::DemFetch)
        .attach_printable_lazy(|| format!("writing {}", dem_path.display()))?;

    log::info!("saved DEM ({} bytes) to {}", bytes.len(), dem_path.display());
    Ok(())
}
