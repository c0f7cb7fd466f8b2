use std::sync::Arc;

use error_stack::ResultExt;
use reqwest::Client;
use serde::Serialize;

use crate::assessment::{assess, EnvironmentalAssessment};
use crate::boundary::Boundary;
use crate::config::Config;
use crate::dem::fetch_dem;
use crate::error::{AnalysisError, Result};
use crate::narrative::{InterpretationInput, Narrator};
use crate::soil::{fetch_soil_data, SoilData};
use crate::statistics::{TerrainFiles, TerrainStatistics};
use crate::terrain::{derive_rasters, DerivedRasters};
use crate::utils::ProjectFiles;
use crate::whiteboxtools_wrappers::WhiteboxTools;

pub const SUCCESS_MESSAGE: &str = "Land analysis completed successfully";

/// Shared, read-only handles used by every request.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    pub config: Arc<Config>,
    pub http: Client,
    pub whitebox: WhiteboxTools,
    pub narrator: Narrator,
}

impl AnalysisContext {
    pub fn new(config: Config) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("landsight/", env!("CARGO_PKG_VERSION")))
            .build()
            .change_context(AnalysisError::Startup)?;
        let whitebox = WhiteboxTools::new(config.whitebox_exe.clone()).verbose(config.whitebox_verbose);
        let narrator = Narrator::new(http.clone(), &config);

        Ok(Self {
            config: Arc::new(config),
            http,
            whitebox,
            narrator,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportFiles {
    pub dem: String,
    pub slope: String,
    pub aspect: String,
    pub flow_accumulation: String,
    pub flood_risk: String,
    pub erosion_risk: String,
    pub boundary: String,
}

impl ReportFiles {
    fn new(rasters: &DerivedRasters, boundary: &std::path::Path) -> Self {
        let s = |p: &std::path::Path| p.display().to_string();
        Self {
            dem: s(&rasters.dem),
            slope: s(&rasters.slope),
            aspect: s(&rasters.aspect),
            flow_accumulation: s(&rasters.flow_accumulation),
            flood_risk: s(&rasters.flood_risk),
            erosion_risk: s(&rasters.erosion_risk),
            boundary: s(boundary),
        }
    }
}

/// Body of a successful `/analyze-land` response.
#[derive(Debug, Clone, Serialize)]
pub struct LandReport {
    pub message: String,
    pub statistics: TerrainStatistics,
    pub environmental_assessment: EnvironmentalAssessment,
    pub soil_data: SoilData,
    pub ai_interpretation: String,
    pub files: ReportFiles,
}

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .change_context(AnalysisError::Task)?
}

/// Runs the whole pipeline for one parcel, step by step.
pub async fn analyze_land(ctx: &AnalysisContext, project_name: &str, boundary: &Boundary) -> Result<LandReport> {
    let config = &ctx.config;
    log::info!("analysing '{}' ({} boundary points)", project_name, boundary.points().len());

    let files = ProjectFiles::prepare(&config.output_dir, project_name)
        .change_context(AnalysisError::OutputDir)
        .attach_printable_lazy(|| config.output_dir.display().to_string())?;

    let boundary_fn = files.geojson("boundary");
    tokio::fs::write(&boundary_fn, boundary.to_geojson(project_name))
        .await
        .change_context(AnalysisError::Boundary)?;

    let dem_fn = files.raster("dem");
    fetch_dem(&ctx.http, config, &boundary.bounding_box(), &dem_fn).await?;

    let rasters = {
        let wbt = ctx.whitebox.clone();
        let files = files.clone();
        run_blocking(move || derive_rasters(&wbt, &dem_fn, &files)).await?
    };

    let soil_data = fetch_soil_data(&ctx.http, config, boundary).await;

    let statistics = {
        let rasters = rasters.clone();
        run_blocking(move || {
            TerrainStatistics::from_files(TerrainFiles {
                dem: &rasters.dem,
                slope: &rasters.slope,
                aspect: &rasters.aspect,
                flow_accumulation: &rasters.flow_accumulation,
                flood_risk: &rasters.flood_risk,
                erosion_risk: &rasters.erosion_risk,
            })
        })
        .await?
    };

    let environmental_assessment = assess(&statistics, &soil_data);
    let ai_interpretation = ctx
        .narrator
        .interpret(&InterpretationInput::new(&statistics, &environmental_assessment))
        .await;

    log::info!("analysis of '{}' complete", project_name);
    Ok(LandReport {
        message: SUCCESS_MESSAGE.to_string(),
        statistics,
        environmental_assessment,
        soil_data,
        ai_interpretation,
        files: ReportFiles::new(&rasters, &boundary_fn),
    })
}
