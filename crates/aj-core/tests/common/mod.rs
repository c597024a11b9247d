//! In-process stand-in for the remote generation service.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use aj_core::backend::ApiConfig;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

pub const TOKEN: &str = "test-token";

#[derive(Debug)]
pub struct MockInner {
    pub submit_status: StatusCode,
    pub submissions: Vec<Value>,
    pub authorization: Vec<String>,
    pub status_calls: usize,
    /// Job bodies returned by status polls; the last one repeats
    pub job_script: VecDeque<Value>,
    pub models: HashMap<String, Value>,
    pub files: HashMap<String, Vec<u8>>,
}

impl Default for MockInner {
    fn default() -> Self {
        Self {
            submit_status: StatusCode::OK,
            submissions: Vec::new(),
            authorization: Vec::new(),
            status_calls: 0,
            job_script: VecDeque::new(),
            models: HashMap::new(),
            files: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockApi {
    pub inner: Arc<Mutex<MockInner>>,
}

pub struct MockServer {
    pub base_url: String,
    pub api: MockApi,
}

impl MockServer {
    pub async fn start() -> Self {
        let api = MockApi::default();

        let app = Router::new()
            .route("/v1/jobs", post(submit_job))
            .route("/v1/jobs/{id}", get(job_status))
            .route("/v1/models/{id}", get(model_details))
            .route("/files/{name}", get(file))
            .with_state(api.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            api,
        }
    }

    pub fn config(&self) -> ApiConfig {
        ApiConfig::new(&self.base_url, TOKEN)
    }

    pub fn file_url(&self, name: &str) -> String {
        format!("{}/files/{}", self.base_url, name)
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut MockInner) -> R) -> R {
        f(&mut self.api.inner.lock().unwrap())
    }

    pub fn add_png(&self, name: &str, width: u32, height: u32) {
        let bytes = png_bytes(width, height);
        self.with(|m| m.files.insert(name.to_string(), bytes));
    }
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::new_rgb8(width, height);
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png).unwrap();
    bytes
}

pub fn scratch_dir() -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("aj-it-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn bearer(headers: &HeaderMap) -> String {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn submit_job(State(api): State<MockApi>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let mut inner = api.inner.lock().unwrap();
    inner.authorization.push(bearer(&headers));
    inner.submissions.push(body);

    if inner.submit_status != StatusCode::OK {
        return inner.submit_status.into_response();
    }
    Json(json!({ "job": { "id": "J1", "status": "CREATED" } })).into_response()
}

async fn job_status(State(api): State<MockApi>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    let mut inner = api.inner.lock().unwrap();
    inner.authorization.push(bearer(&headers));
    inner.status_calls += 1;

    let job = if inner.job_script.len() > 1 {
        inner.job_script.pop_front()
    } else {
        inner.job_script.front().cloned()
    };

    match job {
        Some(job) => Json(json!({ "job": job })).into_response(),
        None => Json(json!({ "job": { "id": id, "status": "RUNNING" } })).into_response(),
    }
}

async fn model_details(State(api): State<MockApi>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    let mut inner = api.inner.lock().unwrap();
    inner.authorization.push(bearer(&headers));

    match inner.models.get(&id) {
        Some(model) => Json(json!({ "model": model })).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn file(State(api): State<MockApi>, Path(name): Path<String>) -> Response {
    let inner = api.inner.lock().unwrap();

    match inner.files.get(&name) {
        Some(bytes) => ([(header::CONTENT_TYPE, "image/png")], bytes.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
