//! In-memory mock of the Collins API.
//!
//! Implements just enough of the HTTP contract for client integration
//! tests: `{status, data}` envelopes, 201 on create, 409 on duplicate
//! create, 404 on missing records, attribute updates via
//! `attribute=KEY;VALUE` form fields (keys uppercased into `ATTRIBS.0`),
//! find filtering, and Basic auth on every route. Response shapes are
//! defined here independently of the client crate so tests catch drift.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, RawQuery, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, put};
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use url::form_urlencoded;

/// Username every request must authenticate with.
pub const USERNAME: &str = "blake";
/// Password every request must authenticate with.
pub const PASSWORD: &str = "admin:first";

#[derive(Clone, Debug, Default)]
struct Asset {
    status: String,
    attributes: HashMap<String, String>,
    logs: Vec<Value>,
}

#[derive(Debug, Default)]
struct MockState {
    assets: HashMap<String, Asset>,
    asset_types: HashMap<String, String>,
}

type Db = Arc<RwLock<MockState>>;

/// Build the mock application with empty state.
pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(MockState::default()));
    Router::new()
        .route("/api/ping", get(ping))
        .route("/api/assets", get(find_assets))
        .route(
            "/api/asset/{tag}",
            get(get_asset)
                .put(create_asset)
                .post(update_asset)
                .delete(delete_asset),
        )
        .route(
            "/api/asset/{tag}/attribute/{name}",
            delete(delete_attribute),
        )
        .route("/api/asset/{tag}/logs", get(get_logs))
        .route("/api/asset/{tag}/log", put(create_log))
        .route(
            "/api/assettype/{name}",
            get(get_asset_type)
                .put(create_asset_type)
                .post(update_asset_type)
                .delete(delete_asset_type),
        )
        .layer(middleware::from_fn(require_basic_auth))
        .with_state(db)
}

/// Serve the mock on the given listener until the task is dropped.
///
/// # Errors
///
/// Returns the underlying I/O error if serving fails.
pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn require_basic_auth(request: Request, next: Next) -> Response {
    let expected = format!("Basic {}", STANDARD.encode(format!("{USERNAME}:{PASSWORD}")));
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);

    if authorized {
        next.run(request).await
    } else {
        (
            StatusCode::UNAUTHORIZED,
            envelope("failure:401", json!({"message": "unauthorized"})),
        )
            .into_response()
    }
}

fn envelope(status: &str, data: Value) -> Json<Value> {
    Json(json!({"status": status, "data": data}))
}

fn parse_pairs(raw: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(raw.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Apply one form pair to an asset. Attributes arrive as `KEY;VALUE` and
/// are stored uppercased, the way Collins reports them back.
fn apply_pair(asset: &mut Asset, key: &str, value: &str) {
    match key {
        "attribute" => {
            if let Some((name, attr_value)) = value.split_once(';') {
                asset
                    .attributes
                    .insert(name.to_uppercase(), attr_value.to_string());
            }
        }
        "status" => asset.status = value.to_string(),
        _ => {}
    }
}

fn asset_json(tag: &str, asset: &Asset) -> Value {
    let attribs = if asset.attributes.is_empty() {
        json!({})
    } else {
        json!({"0": asset.attributes})
    };
    json!({
        "ASSET": {"TAG": tag, "STATUS": asset.status, "TYPE": "SERVER_NODE"},
        "ATTRIBS": attribs,
    })
}

async fn ping() -> Json<Value> {
    envelope("success:ok", json!({"Data": "pong"}))
}

async fn find_assets(State(db): State<Db>, RawQuery(query): RawQuery) -> Json<Value> {
    let filters = parse_pairs(query.as_deref().unwrap_or(""));
    let state = db.read().await;

    let matches: Vec<Value> = state
        .assets
        .iter()
        .filter(|(_, asset)| {
            filters.iter().all(|(key, value)| match key.as_str() {
                "attribute" => value.split_once(';').is_some_and(|(name, wanted)| {
                    asset.attributes.get(&name.to_uppercase()).map(String::as_str)
                        == Some(wanted)
                }),
                "status" => asset.status == *value,
                _ => true,
            })
        })
        .map(|(tag, asset)| asset_json(tag, asset))
        .collect();

    envelope("success:ok", json!({"Data": matches}))
}

async fn get_asset(
    State(db): State<Db>,
    Path(tag): Path<String>,
) -> (StatusCode, Json<Value>) {
    let state = db.read().await;
    match state.assets.get(&tag) {
        Some(asset) => (StatusCode::OK, envelope("success:ok", asset_json(&tag, asset))),
        None => not_found(),
    }
}

async fn create_asset(
    State(db): State<Db>,
    Path(tag): Path<String>,
    body: String,
) -> (StatusCode, Json<Value>) {
    let mut state = db.write().await;
    if state.assets.contains_key(&tag) {
        return conflict("asset already exists");
    }

    let mut asset = Asset {
        status: "New".to_string(),
        ..Asset::default()
    };
    for (key, value) in parse_pairs(&body) {
        apply_pair(&mut asset, &key, &value);
    }
    let response = envelope("success:created", asset_json(&tag, &asset));
    state.assets.insert(tag, asset);
    (StatusCode::CREATED, response)
}

async fn update_asset(
    State(db): State<Db>,
    Path(tag): Path<String>,
    body: String,
) -> (StatusCode, Json<Value>) {
    let mut state = db.write().await;
    let Some(asset) = state.assets.get_mut(&tag) else {
        return not_found();
    };
    for (key, value) in parse_pairs(&body) {
        apply_pair(asset, &key, &value);
    }
    (StatusCode::OK, envelope("success:ok", json!({"SUCCESS": true})))
}

async fn delete_asset(
    State(db): State<Db>,
    Path(tag): Path<String>,
) -> (StatusCode, Json<Value>) {
    let mut state = db.write().await;
    if state.assets.remove(&tag).is_some() {
        (StatusCode::OK, envelope("success:ok", json!({"SUCCESS": true})))
    } else {
        not_found()
    }
}

async fn delete_attribute(
    State(db): State<Db>,
    Path((tag, name)): Path<(String, String)>,
) -> (StatusCode, Json<Value>) {
    let mut state = db.write().await;
    let Some(asset) = state.assets.get_mut(&tag) else {
        return not_found();
    };
    asset.attributes.remove(&name.to_uppercase());
    (StatusCode::OK, envelope("success:ok", json!({"SUCCESS": true})))
}

async fn get_logs(
    State(db): State<Db>,
    Path(tag): Path<String>,
) -> (StatusCode, Json<Value>) {
    let state = db.read().await;
    match state.assets.get(&tag) {
        Some(asset) => (
            StatusCode::OK,
            envelope("success:ok", json!({"Data": asset.logs})),
        ),
        None => not_found(),
    }
}

async fn create_log(
    State(db): State<Db>,
    Path(tag): Path<String>,
    body: String,
) -> (StatusCode, Json<Value>) {
    let mut state = db.write().await;
    let Some(asset) = state.assets.get_mut(&tag) else {
        return not_found();
    };

    let pairs = parse_pairs(&body);
    let message = pairs
        .iter()
        .find(|(k, _)| k == "message")
        .map(|(_, v)| v.clone())
        .unwrap_or_default();
    let log_type = pairs
        .iter()
        .find(|(k, _)| k == "type")
        .map_or_else(|| "INFORMATIONAL".to_string(), |(_, v)| v.clone());

    let entry = json!({"MESSAGE": message, "TYPE": log_type});
    asset.logs.push(entry.clone());
    (StatusCode::CREATED, envelope("success:created", entry))
}

async fn get_asset_type(
    State(db): State<Db>,
    Path(name): Path<String>,
) -> (StatusCode, Json<Value>) {
    let state = db.read().await;
    match state.asset_types.get(&name) {
        Some(label) => (
            StatusCode::OK,
            envelope("success:ok", json!({"NAME": name, "LABEL": label})),
        ),
        None => not_found(),
    }
}

async fn create_asset_type(
    State(db): State<Db>,
    Path(name): Path<String>,
    body: String,
) -> (StatusCode, Json<Value>) {
    let mut state = db.write().await;
    if state.asset_types.contains_key(&name) {
        return conflict("asset type already exists");
    }

    let label = parse_pairs(&body)
        .into_iter()
        .find(|(k, _)| k == "label")
        .map(|(_, v)| v)
        .unwrap_or_default();
    let response = envelope("success:created", json!({"NAME": name, "LABEL": label}));
    state.asset_types.insert(name, label);
    (StatusCode::CREATED, response)
}

async fn update_asset_type(
    State(db): State<Db>,
    Path(name): Path<String>,
    body: String,
) -> (StatusCode, Json<Value>) {
    let mut state = db.write().await;
    let Some(mut label) = state.asset_types.remove(&name) else {
        return not_found();
    };

    let mut new_name = name;
    for (key, value) in parse_pairs(&body) {
        match key.as_str() {
            "label" => label = value,
            "name" => new_name = value,
            _ => {}
        }
    }
    let response = envelope("success:ok", json!({"NAME": new_name, "LABEL": label}));
    state.asset_types.insert(new_name, label);
    (StatusCode::OK, response)
}

async fn delete_asset_type(
    State(db): State<Db>,
    Path(name): Path<String>,
) -> (StatusCode, Json<Value>) {
    let mut state = db.write().await;
    if state.asset_types.remove(&name).is_some() {
        (StatusCode::OK, envelope("success:ok", json!({"SUCCESS": true})))
    } else {
        not_found()
    }
}

fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        envelope("failure:404", json!({"message": "not found"})),
    )
}

fn conflict(message: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::CONFLICT,
        envelope("failure:409", json!({"message": message})),
    )
}
