//! In-process stand-ins for the inference service and the chat model.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::{Body, Bytes};
use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, Request, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get as get_route, post as post_route};
use axum::{Json, Router};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::config::Config;
use crate::routes;
use crate::state::AppState;

#[derive(Clone, Default)]
struct Recorded {
    submits: Arc<Mutex<Vec<Value>>>,
    chats: Arc<Mutex<Vec<Value>>>,
    auth: Arc<Mutex<Vec<String>>>,
    uploads: Arc<Mutex<Vec<(String, Option<String>, usize)>>>,
    /// `None` makes the chat endpoint answer 503.
    chat_reply: Arc<Mutex<Option<String>>>,
}

pub struct MockUpstream {
    addr: SocketAddr,
    recorded: Recorded,
}

impl MockUpstream {
    pub async fn start() -> Self {
        let recorded = Recorded::default();
        let app = Router::new()
            .route("/queue/submit", post_route(submit))
            .route("/queue/status/{id}", get_route(status))
            .route("/queue/cancel/{id}", get_route(cancel))
            .route("/audio/{id}", get_route(audio))
            .route("/audio/{id}/{index}", get_route(audio_indexed))
            .route("/upload_audio", post_route(upload))
            .route("/generate_file", post_route(generate_file))
            .route("/chat/completions", post_route(chat))
            .with_state(recorded.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { addr, recorded }
    }

    /// Proxy configuration pointing both upstreams at this mock.
    pub fn config(&self) -> Config {
        Config {
            modal_api_url: format!("http://{}", self.addr),
            xai_api_key: Some("test-key".into()),
            xai_base_url: format!("http://{}", self.addr),
            enable_swagger: false,
            ..Config::default()
        }
    }

    pub fn app(&self) -> Router {
        self.app_with(self.config())
    }

    pub fn app_with(&self, config: Config) -> Router {
        routes::build(Arc::new(AppState::new(config).unwrap()))
    }

    /// A proxy whose upstreams refuse connections.
    pub fn unreachable_app() -> Router {
        let config = Config {
            modal_api_url: "http://127.0.0.1:1".into(),
            xai_base_url: "http://127.0.0.1:1".into(),
            enable_swagger: false,
            ..Config::default()
        };
        routes::build(Arc::new(AppState::new(config).unwrap()))
    }

    pub fn reply_with(&self, content: &str) {
        *self.recorded.chat_reply.lock().unwrap() = Some(content.to_owned());
    }

    pub fn reply_error(&self) {
        *self.recorded.chat_reply.lock().unwrap() = None;
    }

    pub fn submitted(&self) -> Vec<Value> {
        self.recorded.submits.lock().unwrap().clone()
    }

    pub fn chats(&self) -> Vec<Value> {
        self.recorded.chats.lock().unwrap().clone()
    }

    pub fn auth_headers(&self) -> Vec<String> {
        self.recorded.auth.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<(String, Option<String>, usize)> {
        self.recorded.uploads.lock().unwrap().clone()
    }
}

// ── mock handlers ───────────────────────────────────────────────────────────

async fn submit(State(rec): State<Recorded>, Json(body): Json<Value>) -> Response {
    let fail = body["caption"] == "explode";
    rec.submits.lock().unwrap().push(body);
    if fail {
        return (StatusCode::SERVICE_UNAVAILABLE, "model offline").into_response();
    }
    Json(json!({"job_id": "job-1", "position": 2})).into_response()
}

async fn status(Path(id): Path<String>) -> Response {
    if id == "missing" {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(json!({"job_id": id, "status": "queued", "position": 1, "error": null})).into_response()
}

async fn cancel(Path(_id): Path<String>) -> Json<Value> {
    Json(json!({"cancelled": true, "reason": "cancelled while queued"}))
}

async fn audio(Path(id): Path<String>) -> Response {
    match id.as_str() {
        "missing" => StatusCode::NOT_FOUND.into_response(),
        "wav" => ([(header::CONTENT_TYPE, "audio/x-wav")], "RIFF").into_response(),
        _ => ([(header::CONTENT_TYPE, "audio/mpeg")], format!("ID3-{id}")).into_response(),
    }
}

async fn audio_indexed(Path((id, index)): Path<(String, u32)>) -> Response {
    ([(header::CONTENT_TYPE, "audio/mpeg")], format!("ID3-{id}-{index}")).into_response()
}

async fn upload(State(rec): State<Recorded>, mut multipart: Multipart) -> Response {
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.file_name().unwrap_or("upload").to_owned();
        let content_type = field.content_type().map(str::to_owned);
        let bytes = field.bytes().await.unwrap_or_default();
        rec.uploads.lock().unwrap().push((name.clone(), content_type, bytes.len()));
        return Json(json!({"path": format!("/audio/uploads/{name}")})).into_response();
    }
    (StatusCode::BAD_REQUEST, "no file").into_response()
}

async fn generate_file() -> Response {
    ([(header::CONTENT_TYPE, "audio/flac")], "fLaC-generated").into_response()
}

async fn chat(State(rec): State<Recorded>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Some(auth) = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        rec.auth.lock().unwrap().push(auth.to_owned());
    }
    rec.chats.lock().unwrap().push(body);
    match rec.chat_reply.lock().unwrap().clone() {
        None => (StatusCode::SERVICE_UNAVAILABLE, "overloaded").into_response(),
        Some(content) if content.is_empty() => Json(json!({"choices": []})).into_response(),
        Some(content) => {
            Json(json!({"choices": [{"message": {"role": "assistant", "content": content}}]}))
                .into_response()
        }
    }
}

// ── request helpers ─────────────────────────────────────────────────────────

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, body)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, HeaderMap, Bytes) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, HeaderMap, Bytes) {
    post_raw(app, uri, &body.to_string()).await
}

/// POST `body` verbatim as `application/json`.
pub async fn post_raw(app: &Router, uri: &str, body: &str) -> (StatusCode, HeaderMap, Bytes) {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap();
    send(app, request).await
}

pub async fn post_multipart(
    app: &Router,
    field: &str,
    file_name: &str,
    content_type: Option<&str>,
    data: &[u8],
) -> (StatusCode, HeaderMap, Bytes) {
    const BOUNDARY: &str = "riff-test-boundary";
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n"
    )
    .into_bytes();
    if let Some(ct) = content_type {
        body.extend_from_slice(format!("Content-Type: {ct}\r\n").as_bytes());
    }
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    let request = Request::post("/api/upload")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}
