use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use bytes::Bytes;
use serde_json::Value;
use tracing::{error, info};

use regionmap_core::{RegionRegistry, RenderOptions, render_map};

use crate::routes::{attachment_response, error_response};
use crate::state::AppState;

/// The response bytes are also mirrored to this file under the upload
/// directory, so the most recent map survives on disk.
pub const MAP_FILENAME: &str = "generated_map.png";

pub async fn generate_map(State(state): State<AppState>, Json(payload): Json<Value>) -> Response {
    match generate(&state, &payload).await {
        Ok(png) => {
            info!(bytes = png.len(), "generated map");
            attachment_response(png, "image/png", MAP_FILENAME)
        }
        Err(message) => {
            error!("map generation failed: {message}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &message)
        }
    }
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "geometry_loaded": state.geometry_loaded(),
    }))
}

async fn generate(state: &AppState, payload: &Value) -> Result<Bytes, String> {
    let registry = registry_from_payload(payload)?;
    let options = render_options_from_payload(payload)?;
    let store = state.geometry_store().await.map_err(|e| e.to_string())?;

    let png = tokio::task::spawn_blocking(move || render_map(&store, &registry, &options))
        .await
        .map_err(|e| e.to_string())?
        .map_err(|e| e.to_string())?;

    tokio::fs::create_dir_all(&state.upload_dir)
        .await
        .map_err(|e| e.to_string())?;
    tokio::fs::write(state.upload_dir.join(MAP_FILENAME), &png)
        .await
        .map_err(|e| e.to_string())?;

    Ok(Bytes::from(png))
}

fn registry_from_payload(payload: &Value) -> Result<RegionRegistry, String> {
    let regions = payload
        .get("regions")
        .and_then(Value::as_array)
        .ok_or("request is missing a regions list")?;

    let mut registry = RegionRegistry::new();
    for region in regions {
        let name = region
            .get("name")
            .and_then(Value::as_str)
            .ok_or("region is missing a name")?;
        let states = region
            .get("states")
            .and_then(Value::as_array)
            .ok_or_else(|| format!("region {name} is missing a states list"))?
            .iter()
            .map(|state| {
                state
                    .as_str()
                    .map(str::to_owned)
                    .ok_or_else(|| format!("region {name} has a non-string state name"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let color = region
            .get("color")
            .and_then(Value::as_str)
            .ok_or_else(|| format!("region {name} is missing a color"))?;
        let sales_rep = region
            .get("salesRep")
            .and_then(Value::as_str)
            .ok_or_else(|| format!("region {name} is missing a salesRep"))?;
        let sales_number = region
            .get("salesNumber")
            .and_then(sales_number_value)
            .ok_or_else(|| format!("region {name} has an invalid salesNumber"))?;
        registry.add_region(name, states, color, sales_rep, sales_number);
    }
    Ok(registry)
}

/// Accepts integers, floats (truncated) and numeric strings, matching what
/// the frontend has historically sent for this field.
fn sales_number_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float as i64)),
        Value::String(raw) => raw.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn render_options_from_payload(payload: &Value) -> Result<RenderOptions, String> {
    let settings = payload
        .get("exportSettings")
        .and_then(Value::as_object)
        .ok_or("request is missing exportSettings")?;
    let dimension = |key: &str| {
        settings
            .get(key)
            .and_then(Value::as_f64)
            .ok_or_else(|| format!("exportSettings.{key} must be a number"))
    };
    Ok(RenderOptions {
        width: dimension("width")?,
        height: dimension("height")?,
        dpi: dimension("dpi")?,
    })
}

#[cfg(test)]
mod tests {
    use regionmap_core::GeometryStore;
    use serde_json::json;

    use super::*;
    use crate::routes::testutil::{spawn_test_server, test_state, test_state_with};

    #[test]
    fn sales_number_accepts_numeric_shapes() {
        assert_eq!(sales_number_value(&json!(7)), Some(7));
        assert_eq!(sales_number_value(&json!(7.9)), Some(7));
        assert_eq!(sales_number_value(&json!("12")), Some(12));
        assert_eq!(sales_number_value(&json!(" 3 ")), Some(3));
        assert_eq!(sales_number_value(&json!("twelve")), None);
        assert_eq!(sales_number_value(&json!(true)), None);
        assert_eq!(sales_number_value(&json!(null)), None);
    }

    #[test]
    fn registry_parsing_requires_every_field() {
        let payload = json!({
            "regions": [
                { "name": "East", "states": ["Ohio"], "color": "#FF0000", "salesRep": "Ada" }
            ]
        });
        let err = registry_from_payload(&payload).unwrap_err();
        assert_eq!(err, "region East has an invalid salesNumber");

        let payload = json!({
            "regions": [
                { "states": ["Ohio"], "color": "#FF0000", "salesRep": "Ada", "salesNumber": 1 }
            ]
        });
        assert_eq!(
            registry_from_payload(&payload).unwrap_err(),
            "region is missing a name"
        );
    }

    #[test]
    fn render_options_require_numeric_dimensions() {
        let payload = json!({
            "exportSettings": { "width": 1500, "height": 1000, "dpi": 300 }
        });
        let options = render_options_from_payload(&payload).unwrap();
        assert_eq!(options.width, 1500.0);
        assert_eq!(options.dpi, 300.0);

        let payload = json!({
            "exportSettings": { "width": "wide", "height": 1000, "dpi": 300 }
        });
        assert_eq!(
            render_options_from_payload(&payload).unwrap_err(),
            "exportSettings.width must be a number"
        );

        assert_eq!(
            render_options_from_payload(&json!({})).unwrap_err(),
            "request is missing exportSettings"
        );
    }

    fn map_payload() -> Value {
        json!({
            "regions": [
                {
                    "name": "East",
                    "states": ["Ohio"],
                    "color": "#E74C3C",
                    "salesRep": "Ada",
                    "salesNumber": 7
                }
            ],
            "exportSettings": { "width": 300, "height": 200, "dpi": 100 }
        })
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn generate_map_returns_png_attachment() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let (addr, server) = spawn_test_server(state).await;

        let response = reqwest::Client::new()
            .post(format!("http://{addr}/generate-map"))
            .json(&map_payload())
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"].to_str().unwrap(),
            "image/png"
        );
        assert_eq!(
            response.headers()["content-disposition"].to_str().unwrap(),
            "attachment; filename=\"generated_map.png\""
        );
        let body = response.bytes().await.unwrap();
        assert_eq!(&body[..4], b"\x89PNG");

        let on_disk = dir.path().join("uploads").join(MAP_FILENAME);
        assert_eq!(std::fs::read(&on_disk).unwrap(), body.to_vec());

        server.abort();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn generate_map_accepts_empty_region_list() {
        let dir = tempfile::tempdir().unwrap();
        let (addr, server) = spawn_test_server(test_state(dir.path())).await;

        let payload = json!({
            "regions": [],
            "exportSettings": { "width": 300, "height": 200, "dpi": 100 }
        });
        let response = reqwest::Client::new()
            .post(format!("http://{addr}/generate-map"))
            .json(&payload)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body = response.bytes().await.unwrap();
        assert_eq!(&body[..4], b"\x89PNG");

        server.abort();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn generate_map_rejects_missing_settings() {
        let dir = tempfile::tempdir().unwrap();
        let (addr, server) = spawn_test_server(test_state(dir.path())).await;

        let response = reqwest::Client::new()
            .post(format!("http://{addr}/generate-map"))
            .json(&json!({ "regions": [] }))
            .send()
            .await
            .unwrap();

        assert_eq!(
            response.status(),
            reqwest::StatusCode::INTERNAL_SERVER_ERROR
        );
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "request is missing exportSettings");

        server.abort();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn generate_map_reports_render_failures() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state_with(GeometryStore::from_parts(vec![], vec![]), dir.path());
        let (addr, server) = spawn_test_server(state).await;

        let response = reqwest::Client::new()
            .post(format!("http://{addr}/generate-map"))
            .json(&map_payload())
            .send()
            .await
            .unwrap();

        assert_eq!(
            response.status(),
            reqwest::StatusCode::INTERNAL_SERVER_ERROR
        );
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "map has no drawable territories");

        server.abort();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn health_reports_geometry_state() {
        let dir = tempfile::tempdir().unwrap();
        let (addr, server) = spawn_test_server(test_state(dir.path())).await;

        let body: Value = reqwest::get(format!("http://{addr}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["geometry_loaded"], true);

        server.abort();
    }
}
