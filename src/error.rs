use error_stack::{FrameKind, Report};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Report<AnalysisError>>;

/// Failure contexts of the land analysis pipeline.
///
/// Each pipeline step changes the context of whatever went wrong underneath
/// it, so the rendered chain reads outermost step first.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Invalid boundaries. At least 3 points required.")]
    InvalidBoundary,
    #[error("could not prepare output directory")]
    OutputDir,
    #[error("Failed to fetch DEM")]
    DemFetch,
    #[error("OPENTOPO_API_KEY is not configured")]
    MissingDemKey,
    #[error("Slope calculation failed")]
    Slope,
    #[error("Aspect calculation failed")]
    Aspect,
    #[error("Flow accumulation calculation failed")]
    FlowAccumulation,
    #[error("Flood risk calculation failed")]
    FloodRisk,
    #[error("Erosion risk calculation failed")]
    ErosionRisk,
    #[error("Terrain statistics calculation failed")]
    Statistics,
    #[error("Soil data request failed")]
    Soil,
    #[error("API returned status code {0}")]
    SoilStatus(u16),
    #[error("No soil data found in API response")]
    SoilEmpty,
    #[error("AI interpretation request failed")]
    Narrative,
    #[error("GEMINI_API_KEY is not configured")]
    MissingNarrativeKey,
    #[error("AI service returned no text")]
    EmptyNarrative,
    #[error("could not write boundary file")]
    Boundary,
    #[error("background task failed")]
    Task,
    #[error("server startup failed")]
    Startup,
}

/// Raised by the WhiteboxTools subprocess wrapper.
#[derive(Debug, Error)]
pub enum ToolkitError {
    #[error("could not launch {exe}")]
    Launch { exe: String },
    #[error("{tool} failed with status code: {code}: {stderr}")]
    Failed { tool: String, code: i32, stderr: String },
    #[error("{tool} was terminated by a signal")]
    Terminated { tool: String },
    #[error("unexpected output from {exe}")]
    Output { exe: String },
}

/// Raised by GDAL-backed raster I/O.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("could not read raster {0}")]
    Read(String),
    #[error("could not write raster {0}")]
    Write(String),
    #[error("raster size mismatch: {expected:?} vs {actual:?}")]
    SizeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
}

/// Renders every context frame of `report`, outermost first, joined by `": "`.
///
/// This is the message handed back to HTTP callers; attachments and source
/// locations stay in the `{:?}` form that goes to the log.
pub fn error_chain<C>(report: &Report<C>) -> String {
    let mut messages: Vec<String> = Vec::new();
    for frame in report.frames() {
        if let FrameKind::Context(context) = frame.kind() {
            let message = context.to_string();
            if messages.last() != Some(&message) {
                messages.push(message);
            }
        }
    }
    messages.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use error_stack::ResultExt;

    fn failing_tool() -> std::result::Result<(), Report<ToolkitError>> {
        Err(Report::new(ToolkitError::Failed {
            tool: "Slope".to_string(),
            code: 1,
            stderr: "bad input".to_string(),
        }))
    }

    #[test]
    fn test_error_chain_outermost_first() {
        let report = failing_tool()
            .change_context(AnalysisError::FloodRisk)
            .unwrap_err();
        assert_eq!(
            error_chain(&report),
            "Flood risk calculation failed: Slope failed with status code: 1: bad input"
        );
    }

    #[test]
    fn test_error_chain_single_context() {
        let report = Report::new(AnalysisError::InvalidBoundary);
        assert_eq!(
            error_chain(&report),
            "Invalid boundaries. At least 3 points required."
        );
    }

    #[test]
    fn test_error_chain_skips_attachments() {
        let report = Report::new(AnalysisError::SoilEmpty)
            .attach_printable("lat=1 lon=2")
            .change_context(AnalysisError::Soil);
        assert_eq!(
            error_chain(&report),
            "Soil data request failed: No soil data found in API response"
        );
    }
}
