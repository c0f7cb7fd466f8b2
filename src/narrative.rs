use error_stack::{Report, ResultExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::assessment::{EnvironmentalAssessment, RiskAssessment, SoilQuality};
use crate::config::Config;
use crate::error::{error_chain, AnalysisError, Result};
use crate::statistics::TerrainStatistics;

const PROMPT_HEADER: &str = "As a land analysis expert, provide a detailed but easy-to-understand \
interpretation of the following land characteristics. Keep the section headings and bullet \
structure of the report below, and replace the descriptive sentences with your own assessment \
of what these values mean for development and agricultural use.";

/// Values the interpretation talks about.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterpretationInput {
    pub mean_slope: f64,
    pub max_slope: f64,
    pub predominant_direction: String,
    pub elevation_range: f64,
    pub flood_risk: RiskAssessment,
    pub erosion_risk: RiskAssessment,
    pub soil_quality: SoilQuality,
}

impl InterpretationInput {
    pub fn new(stats: &TerrainStatistics, assessment: &EnvironmentalAssessment) -> Self {
        Self {
            mean_slope: stats.mean_slope,
            max_slope: stats.max_slope,
            predominant_direction: stats.predominant_direction.clone(),
            elevation_range: stats.elevation_range,
            flood_risk: assessment.flood_risk.clone(),
            erosion_risk: assessment.erosion_risk.clone(),
            soil_quality: assessment.soil_quality,
        }
    }
}

fn factor_list(risk: &RiskAssessment) -> String {
    if risk.contributing_factors.is_empty() {
        "no specific contributing factors were flagged".to_string()
    } else {
        format!("contributing factors: {}", risk.contributing_factors.join(", "))
    }
}

/// The fixed report layout both the prompt and the local fallback share.
pub fn report_body(input: &InterpretationInput) -> String {
    let soil = &input.soil_quality;
    format!(
        "**Analysis Results**\n\
\n\
**AI Interpretation**\n\
\n\
**Terrain Analysis:**\n\
* **Slope:** The average slope is {mean_slope:.2}° with a maximum of {max_slope:.2}°. \
Gentle average slopes keep grading and machinery work simple; steeper maxima may need terracing locally.\n\
* **Aspect:** A {dir} aspect means the land primarily faces {dir}, which governs sun exposure, \
heat load and solar potential across the parcel.\n\
* **Elevation Range:** The parcel spans {range:.2} meters of elevation. How significant this is \
depends on the parcel's size; the same change over a small area implies sharper relief.\n\
\n\
**Environmental Risks:**\n\
* **Flood Risk Level: {flood}:** Based on flow accumulation and slope, {flood_factors}.\n\
* **Erosion Risk Level: {erosion}:** Based on a slope-driven soil loss estimate, {erosion_factors}.\n\
\n\
**Soil Characteristics:**\n\
* **pH: {ph:.2}:** Soil reaction in the top 30 cm; check it against the requirements of planned crops.\n\
* **Organic Carbon: {soc:.2}%:** Higher organic carbon improves water retention, nutrient availability and structure.\n\
* **Clay Content: {clay:.2}%:** Clay governs water and nutrient holding capacity and compaction risk.\n\
* **Sand Content: {sand:.2}%:** Sand governs drainage and workability; sandier soils need more frequent watering.\n\
\n\
**Overall:**\n\
These characteristics give a first screening of the parcel's suitability for agriculture, \
residential or light industrial use. A detailed soil survey and geotechnical analysis are \
recommended before significant development plans are finalized.\n",
        mean_slope = input.mean_slope,
        max_slope = input.max_slope,
        dir = input.predominant_direction,
        range = input.elevation_range,
        flood = input.flood_risk.level,
        flood_factors = factor_list(&input.flood_risk),
        erosion = input.erosion_risk.level,
        erosion_factors = factor_list(&input.erosion_risk),
        ph = soil.ph,
        soc = soil.organic_carbon,
        clay = soil.texture.clay,
        sand = soil.texture.sand,
    )
}

pub fn analysis_prompt(input: &InterpretationInput) -> String {
    format!("{}\n\n{}", PROMPT_HEADER, report_body(input))
}

/// Rendered locally when the text generation service is unavailable.
pub fn fallback_interpretation(input: &InterpretationInput) -> String {
    report_body(input)
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

/// Client for the Gemini `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct Narrator {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl Narrator {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.gemini_url.trim_end_matches('/').to_string(),
            model: config.gemini_model.clone(),
            api_key: config.gemini_api_key.clone(),
        }
    }

    /// Generated interpretation, or the local template on any failure.
    pub async fn interpret(&self, input: &InterpretationInput) -> String {
        match self.generate(&analysis_prompt(input)).await {
            Ok(text) => text,
            Err(report) => {
                log::warn!("Error generating AI interpretation: {}", error_chain(&report));
                fallback_interpretation(input)
            }
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Report::new(AnalysisError::MissingNarrativeKey))?;
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = json!({ "contents": [{ "parts": [{ "text": prompt }] }] });

        let response: GenerateContentResponse = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| e.without_url())
            .change_context(AnalysisError::Narrative)?
            .json()
            .await
            .change_context(AnalysisError::Narrative)?;

        let text: String = response
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(Report::new(AnalysisError::EmptyNarrative));
        }
        Ok(text)
    }
}
