use std::collections::BTreeMap;

use error_stack::{Report, ResultExt};
use maplit::btreemap;
use once_cell::sync::Lazy;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::boundary::Boundary;
use crate::config::Config;
use crate::error::{error_chain, AnalysisError, Result};

pub const SOIL_PROPERTIES: [&str; 4] = ["clay", "sand", "soc", "phh2o"];
pub const SOIL_DEPTH: &str = "0-30cm";

static FALLBACK_SOIL: Lazy<SoilData> = Lazy::new(|| {
    SoilData(btreemap! {
        "clay".to_string() => SoilProperty { mean: 20.0 },
        "sand".to_string() => SoilProperty { mean: 40.0 },
        "soc".to_string() => SoilProperty { mean: 2.0 },
        "phh2o".to_string() => SoilProperty { mean: 6.5 },
    })
});

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoilProperty {
    pub mean: f64,
}

/// Mean topsoil values keyed by SoilGrids property name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SoilData(pub BTreeMap<String, SoilProperty>);

impl SoilData {
    /// Sample used whenever the remote lookup is unusable.
    pub fn fallback() -> Self {
        FALLBACK_SOIL.clone()
    }

    pub fn mean(&self, property: &str) -> Option<f64> {
        self.0.get(property).map(|p| p.mean)
    }

    pub fn mean_or_zero(&self, property: &str) -> f64 {
        self.mean(property).unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Takes, per layer, the first `0-30cm` depth carrying a mean.
    pub fn from_response(response: &SoilGridsResponse) -> Self {
        let mut data = BTreeMap::new();
        let layers = response
            .properties
            .as_ref()
            .map(|p| p.layers.as_slice())
            .unwrap_or_default();

        for layer in layers {
            let mean = layer
                .depths
                .iter()
                .find(|d| d.label == SOIL_DEPTH)
                .and_then(|d| d.values.mean);
            if let Some(mean) = mean {
                data.insert(layer.name.clone(), SoilProperty { mean });
            }
        }
        Self(data)
    }
}

#[derive(Debug, Deserialize)]
pub struct SoilGridsResponse {
    #[serde(default)]
    pub properties: Option<SoilGridsProperties>,
}

#[derive(Debug, Deserialize)]
pub struct SoilGridsProperties {
    #[serde(default)]
    pub layers: Vec<SoilGridsLayer>,
}

#[derive(Debug, Deserialize)]
pub struct SoilGridsLayer {
    pub name: String,
    #[serde(default)]
    pub depths: Vec<SoilGridsDepth>,
}

#[derive(Debug, Deserialize)]
pub struct SoilGridsDepth {
    #[serde(alias = "depth")]
    pub label: String,
    pub values: SoilGridsValues,
}

#[derive(Debug, Deserialize)]
pub struct SoilGridsValues {
    #[serde(default)]
    pub mean: Option<f64>,
}

/// Soil properties at the boundary centroid. Never fails: any problem with
/// the remote service is logged and answered with [`SoilData::fallback`].
pub async fn fetch_soil_data(client: &Client, config: &Config, boundary: &Boundary) -> SoilData {
    match request_soil_data(client, config, boundary).await {
        Ok(data) => data,
        Err(report) => {
            log::warn!("Error fetching soil data, using defaults: {}", error_chain(&report));
            log::debug!("{:?}", report);
            SoilData::fallback()
        }
    }
}

async fn request_soil_data(client: &Client, config: &Config, boundary: &Boundary) -> Result<SoilData> {
    let centroid = boundary.centroid();

    let mut query: Vec<(&str, String)> = vec![
        ("lon", centroid.lon.to_string()),
        ("lat", centroid.lat.to_string()),
    ];
    query.extend(SOIL_PROPERTIES.iter().map(|p| ("property", p.to_string())));
    query.push(("depth", SOIL_DEPTH.to_string()));
    query.push(("value", "mean".to_string()));

    log::info!("requesting soil data at lat={} lon={}", centroid.lat, centroid.lon);
    let response = client
        .get(&config.soilgrids_url)
        .query(&query)
        .header(ACCEPT, "application/json")
        .timeout(config.soil_timeout)
        .send()
        .await
        .change_context(AnalysisError::Soil)?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(Report::new(AnalysisError::SoilStatus(status.as_u16()))
            .change_context(AnalysisError::Soil));
    }

    let body: SoilGridsResponse = response.json().await.change_context(AnalysisError::Soil)?;
    let data = SoilData::from_response(&body);
    if data.is_empty() {
        return Err(Report::new(AnalysisError::SoilEmpty).change_context(AnalysisError::Soil));
    }
    Ok(data)
}
