use std::sync::LazyLock;

use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use chrono::Utc;
use regex::Regex;
use serde_json::Value;
use tracing::{error, info};

use regionmap_core::Color;

use crate::routes::{attachment_response, error_response};
use crate::state::AppState;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

const REQUIRED_PERSON_FIELDS: [&str; 5] = ["id", "firstName", "lastName", "email", "phone"];
const REQUIRED_REGION_FIELDS: [&str; 3] = ["territories", "color", "salesPersonId"];

/// Snapshots the posted region document to disk and hands it back as a
/// timestamped JSON download.
pub async fn export_regions(State(state): State<AppState>, Json(payload): Json<Value>) -> Response {
    match export(&state, &payload).await {
        Ok((filename, body)) => {
            info!(%filename, "exported regions");
            attachment_response(body, "application/json", &filename)
        }
        Err(message) => {
            error!("region export failed: {message}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &message)
        }
    }
}

async fn export(state: &AppState, payload: &Value) -> Result<(String, Bytes), String> {
    let body = serde_json::to_string_pretty(payload).map_err(|e| e.to_string())?;
    let filename = format!("regions_export_{}.json", Utc::now().format("%Y%m%d_%H%M%S"));

    tokio::fs::create_dir_all(&state.export_dir)
        .await
        .map_err(|e| e.to_string())?;
    tokio::fs::write(state.export_dir.join(&filename), &body)
        .await
        .map_err(|e| e.to_string())?;

    Ok((filename, Bytes::from(body)))
}

/// Validates an uploaded region document without applying it; the frontend
/// only commits the data once this endpoint accepts it.
pub async fn import_regions(multipart: Multipart) -> Response {
    let document = match read_upload(multipart).await {
        Ok(document) => document,
        Err((status, message)) => return error_response(status, &message),
    };
    if let Err(message) = validate_import(&document) {
        return error_response(StatusCode::BAD_REQUEST, &message);
    }
    Json(serde_json::json!({
        "message": "Regions imported successfully",
        "salesPeople": document["salesPeople"],
        "regions": document["regions"],
    }))
    .into_response()
}

async fn read_upload(mut multipart: Multipart) -> Result<Value, (StatusCode, String)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_owned();
        if filename.is_empty() {
            return Err((StatusCode::BAD_REQUEST, "No file selected".to_owned()));
        }
        if !filename.ends_with(".json") {
            return Err((StatusCode::BAD_REQUEST, "File must be JSON format".to_owned()));
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
        return serde_json::from_slice(&bytes)
            .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid JSON format".to_owned()));
    }
    Err((StatusCode::BAD_REQUEST, "No file uploaded".to_owned()))
}

fn validate_import(document: &Value) -> Result<(), String> {
    let Some(sales_people) = document.get("salesPeople").and_then(Value::as_array) else {
        return Err("Invalid sales people data format".to_owned());
    };

    for person in sales_people {
        if REQUIRED_PERSON_FIELDS
            .iter()
            .any(|field| person.get(field).is_none())
        {
            return Err("Missing required fields in sales person data".to_owned());
        }
        let first_name = person["firstName"].as_str().unwrap_or_default();
        let last_name = person["lastName"].as_str().unwrap_or_default();

        let email = person["email"].as_str().unwrap_or_default();
        if !EMAIL_PATTERN.is_match(email) {
            return Err(format!("Invalid email format for {first_name} {last_name}"));
        }
        let phone = person["phone"].as_str().unwrap_or_default();
        if !phone_is_valid(phone) {
            return Err(format!("Invalid phone format for {first_name} {last_name}"));
        }
    }

    let Some(regions) = document.get("regions").and_then(Value::as_object) else {
        return Err("Invalid regions data format".to_owned());
    };
    let known_ids: Vec<&Value> = sales_people
        .iter()
        .filter_map(|person| person.get("id"))
        .collect();

    for (name, region) in regions {
        if REQUIRED_REGION_FIELDS
            .iter()
            .any(|field| region.get(field).is_none())
        {
            return Err(format!("Missing required fields in region {name}"));
        }
        if !region["territories"].is_array() {
            return Err(format!("Invalid territories data for region {name}"));
        }
        if region["color"].as_str().and_then(Color::from_hex).is_none() {
            return Err(format!("Invalid color format for region {name}"));
        }
        if !known_ids.contains(&&region["salesPersonId"]) {
            return Err(format!(
                "Referenced sales person ID not found for region {name}"
            ));
        }
    }
    Ok(())
}

/// Phone numbers are accepted in any punctuation style as long as they
/// carry 9 to 15 digits.
fn phone_is_valid(phone: &str) -> bool {
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    (9..=15).contains(&digits)
}
