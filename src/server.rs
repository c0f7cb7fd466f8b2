use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use error_stack::Report;
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::analysis::{analyze_land, AnalysisContext};
use crate::boundary::Boundary;
use crate::cleanup::spawn_sweep;
use crate::error::{error_chain, AnalysisError, Result};
use crate::utils::DEFAULT_PROJECT_NAME;

fn default_project_name() -> String {
    DEFAULT_PROJECT_NAME.to_string()
}

/// `POST /analyze-land` request body.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(rename = "projectName", default = "default_project_name")]
    pub project_name: String,
    /// `[lat, lon, ...]` points; trailing values such as altitude are ignored.
    #[serde(default)]
    pub boundaries: Option<Vec<Vec<f64>>>,
}

impl AnalyzeRequest {
    pub fn boundary(&self) -> Result<Boundary> {
        let pairs = self
            .boundaries
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|point| match point.as_slice() {
                [lat, lon, ..] => Ok([*lat, *lon]),
                _ => Err(Report::new(AnalysisError::InvalidBoundary)
                    .attach_printable(format!("point {:?} lacks a latitude or longitude", point))),
            })
            .collect::<Result<Vec<_>>>()?;
        Boundary::from_pairs(&pairs)
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

pub fn router(ctx: Arc<AnalysisContext>) -> Router {
    let max_body = ctx.config.max_content_length;
    Router::new()
        .route("/analyze-land", post(analyze_land_handler))
        .layer(DefaultBodyLimit::max(max_body))
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

async fn analyze_land_handler(
    State(ctx): State<Arc<AnalysisContext>>,
    payload: std::result::Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            log::warn!("rejected request body: {}", rejection.body_text());
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    let boundary = match request.boundary() {
        Ok(boundary) => boundary,
        Err(report) => {
            log::warn!("{}", error_chain(&report));
            return error_response(StatusCode::BAD_REQUEST, report.current_context().to_string());
        }
    };

    match analyze_land(&ctx, &request.project_name, &boundary).await {
        Ok(report) => {
            let response = (StatusCode::OK, Json(report)).into_response();
            spawn_sweep(ctx.config.output_dir.clone(), ctx.config.cleanup_max_age);
            response
        }
        Err(report) => {
            log::error!("analysis of '{}' failed: {:?}", request.project_name, report);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, error_chain(&report))
        }
    }
}
