//! Remote service clients against wiremock stand-ins.

use reqwest::Client;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use landsight::assessment::{RiskAssessment, RiskLevel, SoilQuality, SoilTexture};
use landsight::boundary::{Boundary, BoundingBox};
use landsight::config::Config;
use landsight::dem::fetch_dem;
use landsight::error::{error_chain, AnalysisError};
use landsight::narrative::{fallback_interpretation, InterpretationInput, Narrator};
use landsight::soil::{fetch_soil_data, SoilData};

fn bbox() -> BoundingBox {
    BoundingBox {
        min_lat: 10.0,
        max_lat: 10.5,
        min_lon: 20.0,
        max_lon: 20.5,
    }
}

fn square() -> Boundary {
    Boundary::from_pairs(&[[10.0, 20.0], [10.0, 20.5], [10.5, 20.5], [10.5, 20.0]]).unwrap()
}

// =============================================================================
// DEM
// =============================================================================

#[tokio::test]
async fn test_dem_bytes_are_written() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/globaldem"))
        .and(query_param("demtype", "SRTMGL3"))
        .and(query_param("outputFormat", "GTiff"))
        .and(query_param("API_Key", "topo-key"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"II*\0fake-tiff".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let config = Config {
        opentopo_url: format!("{}/globaldem", server.uri()),
        opentopo_api_key: Some("topo-key".to_string()),
        ..Config::default()
    };
    let dir = tempfile::tempdir().unwrap();
    let dem_fn = dir.path().join("dem.tif");

    fetch_dem(&Client::new(), &config, &bbox(), &dem_fn).await.unwrap();
    assert_eq!(std::fs::read(&dem_fn).unwrap(), b"II*\0fake-tiff");
}

#[tokio::test]
async fn test_dem_error_status_fails_without_leaking_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = Config {
        opentopo_url: server.uri(),
        opentopo_api_key: Some("secret-topo-key".to_string()),
        ..Config::default()
    };
    let dir = tempfile::tempdir().unwrap();
    let dem_fn = dir.path().join("dem.tif");

    let report = fetch_dem(&Client::new(), &config, &bbox(), &dem_fn).await.unwrap_err();
    assert!(matches!(report.current_context(), AnalysisError::DemFetch));
    let chain = error_chain(&report);
    assert!(chain.starts_with("Failed to fetch DEM"));
    assert!(!chain.contains("secret-topo-key"));
    assert!(!dem_fn.exists());
}

#[tokio::test]
async fn test_dem_without_key_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = Config {
        opentopo_url: server.uri(),
        ..Config::default()
    };
    let dir = tempfile::tempdir().unwrap();

    let report = fetch_dem(&Client::new(), &config, &bbox(), &dir.path().join("dem.tif"))
        .await
        .unwrap_err();
    assert!(matches!(report.current_context(), AnalysisError::DemFetch));
    assert!(error_chain(&report).contains("OPENTOPO_API_KEY"));
}

// =============================================================================
// SOIL
// =============================================================================

fn soil_config(server: &MockServer) -> Config {
    Config {
        soilgrids_url: format!("{}/soilgrids", server.uri()),
        ..Config::default()
    }
}

#[tokio::test]
async fn test_soil_response_is_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/soilgrids"))
        .and(query_param("lat", "10.25"))
        .and(query_param("lon", "20.25"))
        .and(query_param("property", "clay"))
        .and(query_param("property", "phh2o"))
        .and(query_param("depth", "0-30cm"))
        .and(query_param("value", "mean"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "properties": {"layers": [
                {"name": "clay", "depths": [{"label": "0-30cm", "values": {"mean": 310}}]},
                {"name": "phh2o", "depths": [{"label": "0-30cm", "values": {"mean": 62}}]}
            ]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let soil = fetch_soil_data(&Client::new(), &soil_config(&server), &square()).await;
    assert_eq!(soil.mean("clay"), Some(310.0));
    assert_eq!(soil.mean("phh2o"), Some(62.0));
    assert_eq!(soil.mean("sand"), None);
}

#[tokio::test]
async fn test_soil_error_status_uses_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let soil = fetch_soil_data(&Client::new(), &soil_config(&server), &square()).await;
    assert_eq!(soil, SoilData::fallback());
}

#[tokio::test]
async fn test_soil_without_layers_uses_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"properties": {"layers": []}})))
        .mount(&server)
        .await;

    let soil = fetch_soil_data(&Client::new(), &soil_config(&server), &square()).await;
    assert_eq!(soil, SoilData::fallback());
}

#[tokio::test]
async fn test_soil_garbage_body_uses_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let soil = fetch_soil_data(&Client::new(), &soil_config(&server), &square()).await;
    assert_eq!(soil, SoilData::fallback());
}

// =============================================================================
// NARRATIVE
// =============================================================================

fn interpretation_input() -> InterpretationInput {
    InterpretationInput {
        mean_slope: 4.0,
        max_slope: 18.0,
        predominant_direction: "NE".to_string(),
        elevation_range: 32.0,
        flood_risk: RiskAssessment {
            level: RiskLevel::Low,
            contributing_factors: vec![],
        },
        erosion_risk: RiskAssessment {
            level: RiskLevel::High,
            contributing_factors: vec!["Steep slopes".to_string()],
        },
        soil_quality: SoilQuality {
            ph: 7.1,
            organic_carbon: 1.5,
            texture: SoilTexture { clay: 25.0, sand: 35.0 },
        },
    }
}

fn narrative_config(server: &MockServer) -> Config {
    Config {
        gemini_url: server.uri(),
        gemini_api_key: Some("gemini-key".to_string()),
        ..Config::default()
    }
}

#[tokio::test]
async fn test_narrative_uses_generated_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-1.5-flash:generateContent"))
        .and(query_param("key", "gemini-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "Gentle, "}, {"text": "well drained land."}]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let narrator = Narrator::new(Client::new(), &narrative_config(&server));
    let text = narrator.interpret(&interpretation_input()).await;
    assert_eq!(text, "Gentle, well drained land.");
}

#[tokio::test]
async fn test_narrative_error_status_uses_template() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let narrator = Narrator::new(Client::new(), &narrative_config(&server));
    let input = interpretation_input();
    assert_eq!(narrator.interpret(&input).await, fallback_interpretation(&input));
}

#[tokio::test]
async fn test_narrative_without_candidates_uses_template() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .mount(&server)
        .await;

    let narrator = Narrator::new(Client::new(), &narrative_config(&server));
    let input = interpretation_input();
    let text = narrator.interpret(&input).await;
    assert!(text.contains("Erosion Risk Level: High"));
    assert_eq!(text, fallback_interpretation(&input));
}
