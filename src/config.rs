use std::path::PathBuf;
use std::time::Duration;

pub const OPENTOPO_API_URL: &str = "https://portal.opentopography.org/API/globaldem";
pub const SOILGRIDS_API_URL: &str = "https://rest.isric.org/soilgrids/v2.0/properties/query";
pub const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_DEM_TYPE: &str = "SRTMGL3";
pub const DEFAULT_OUTPUT_DIR: &str = "temp_outputs";
pub const DEFAULT_WHITEBOX_EXE: &str = "whitebox_tools";

pub const MAX_CONTENT_LENGTH: usize = 16 * 1024 * 1024;
pub const SOIL_TIMEOUT: Duration = Duration::from_secs(10);
pub const CLEANUP_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Runtime settings for the analysis pipeline and its HTTP surface.
///
/// Remote endpoints are plain fields so tests can point them at a mock
/// server.
#[derive(Debug, Clone)]
pub struct Config {
    pub output_dir: PathBuf,
    pub whitebox_exe: PathBuf,
    pub whitebox_verbose: bool,

    pub opentopo_url: String,
    pub opentopo_api_key: Option<String>,
    pub dem_type: String,

    pub soilgrids_url: String,
    pub soil_timeout: Duration,

    pub gemini_url: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,

    pub max_content_length: usize,
    pub cleanup_max_age: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            whitebox_exe: PathBuf::from(DEFAULT_WHITEBOX_EXE),
            whitebox_verbose: false,
            opentopo_url: OPENTOPO_API_URL.to_string(),
            opentopo_api_key: None,
            dem_type: DEFAULT_DEM_TYPE.to_string(),
            soilgrids_url: SOILGRIDS_API_URL.to_string(),
            soil_timeout: SOIL_TIMEOUT,
            gemini_url: GEMINI_API_URL.to_string(),
            gemini_api_key: None,
            gemini_model: GEMINI_MODEL.to_string(),
            max_content_length: MAX_CONTENT_LENGTH,
            cleanup_max_age: CLEANUP_MAX_AGE,
        }
    }
}

impl Config {
    /// Logs which optional credentials are absent.
    pub fn log_summary(&self) {
        log::info!("output directory: {}", self.output_dir.display());
        log::info!("whitebox executable: {}", self.whitebox_exe.display());
        if self.opentopo_api_key.is_none() {
            log::warn!("OPENTOPO_API_KEY is not set; DEM requests will fail");
        }
        if self.gemini_api_key.is_none() {
            log::warn!("GEMINI_API_KEY is not set; interpretations will use the local template");
        }
    }
}
