use std::net::TcpListener;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_stream::stream;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use tokio_stream::StreamExt;
use tower_http::cors::{Any, CorsLayer};

use crate::client::{ChatClient, Transport};
use crate::config::AppConfig;
use crate::error::ChatError;
use crate::logger::Logger;
use crate::models::{SolveRequest, SolveResponse};
use crate::session::Session;

const KEY_MISSING: &str = "API key missing on the server. Set TUTORLENS_API_KEY.";

const MIME_TYPES: [(&str, &str); 9] = [
  ("html", "text/html"),
  ("css", "text/css"),
  ("js", "application/javascript"),
  ("json", "application/json"),
  ("png", "image/png"),
  ("jpg", "image/jpeg"),
  ("jpeg", "image/jpeg"),
  ("gif", "image/gif"),
  ("svg", "image/svg+xml"),
];
const DEFAULT_MIME: &str = "application/octet-stream";

pub struct RouterState {
  pub started_at: Instant,
  pub config: AppConfig,
  /// Upstream credential. Never leaves this process except in the upstream `Authorization` header.
  pub api_key: Option<String>,
  pub logger: Arc<Logger>,
  /// In-flight flag shared by every `/api/solve` request; a second one while it is set gets 409.
  pub busy: Arc<AtomicBool>,
}

pub fn app(state: RouterState) -> Router {
  Router::new()
    .route("/health", get(health))
    .route("/api/chat", post(proxy_chat))
    .route("/api/solve", post(solve))
    .fallback(static_file)
    .layer(cors_layer())
    .with_state(Arc::new(state))
}

/// Answers every `OPTIONS` itself and stamps `Access-Control-Allow-Origin: *` on the rest.
fn cors_layer() -> CorsLayer {
  CorsLayer::new()
    .allow_origin(Any)
    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
    .allow_headers([CONTENT_TYPE, AUTHORIZATION])
}

pub async fn run_router(listener: TcpListener, state: RouterState) -> anyhow::Result<()> {
  listener.set_nonblocking(true)?;
  let listener = tokio::net::TcpListener::from_std(listener)?;
  axum::serve(listener, app(state)).await?;
  Ok(())
}

async fn health(State(state): State<Arc<RouterState>>) -> Json<serde_json::Value> {
  let uptime = state.started_at.elapsed().as_millis();
  Json(serde_json::json!({
    "status": "ok",
    "version": env!("CARGO_PKG_VERSION"),
    "uptime_ms": uptime
  }))
}

fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
  let body = Json(serde_json::json!({ "error": { "message": message, "code": code } }));
  (status, body).into_response()
}

fn chat_error_response(err: &ChatError) -> Response {
  let status = match err {
    ChatError::InvalidInput | ChatError::InvalidImage(_) => StatusCode::BAD_REQUEST,
    ChatError::Busy => StatusCode::CONFLICT,
    ChatError::UpstreamError(_) | ChatError::EmptyResult | ChatError::TransportFailure(_) => {
      StatusCode::BAD_GATEWAY
    }
    ChatError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
  };
  error_response(status, err.code(), &err.to_string())
}

/// Relays the body unmodified to the upstream and streams status + body straight back.
async fn proxy_chat(State(state): State<Arc<RouterState>>, body: Bytes) -> Response {
  let request_id = uuid::Uuid::new_v4();
  let logger = state.logger.clone();

  let Some(key) = state.api_key.as_deref() else {
    logger.error(&format!("[{request_id}] {KEY_MISSING}"));
    return error_response(StatusCode::INTERNAL_SERVER_ERROR, "key_missing", KEY_MISSING);
  };

  let mut headers = HeaderMap::new();
  headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
  match HeaderValue::from_str(&format!("Bearer {key}")) {
    Ok(value) => headers.insert(AUTHORIZATION, value),
    Err(err) => {
      return error_response(StatusCode::INTERNAL_SERVER_ERROR, "key_invalid", &err.to_string())
    }
  };

  let client = match reqwest::Client::builder()
    .timeout(Duration::from_secs(state.config.request_timeout_secs))
    .build()
  {
    Ok(client) => client,
    Err(err) => {
      return error_response(StatusCode::INTERNAL_SERVER_ERROR, "client_error", &err.to_string())
    }
  };

  let sent = body.len();
  let resp = client
    .post(&state.config.upstream_url)
    .headers(headers)
    .body(body)
    .send()
    .await;

  let resp = match resp {
    Ok(resp) => resp,
    Err(err) => {
      logger.error(&format!("[{request_id}] upstream request failed: {err}"));
      return error_response(StatusCode::INTERNAL_SERVER_ERROR, "upstream_unreachable", &err.to_string());
    }
  };

  let status = resp.status();
  let content_type = resp
    .headers()
    .get(CONTENT_TYPE)
    .cloned()
    .unwrap_or_else(|| HeaderValue::from_static("application/json"));
  logger.info(&format!("[{request_id}] POST /api/chat ({sent} bytes) -> upstream {status}"));

  let mut upstream = resp.bytes_stream();
  let stream = stream! {
    let mut total = 0usize;
    while let Some(chunk) = upstream.next().await {
      match chunk {
        Ok(chunk) => {
          total += chunk.len();
          yield Ok(chunk);
        }
        Err(err) => {
          logger.error(&format!("[{request_id}] upstream stream broke after {total} bytes: {err}"));
          yield Err(err);
          return;
        }
      }
    }
    logger.info(&format!("[{request_id}] relayed {total} bytes"));
  };

  (
    status,
    [(CONTENT_TYPE, content_type)],
    Body::from_stream(stream),
  )
    .into_response()
}

/// Full pipeline on the server: the browser sends `{text, image}` and gets rendered HTML back.
async fn solve(State(state): State<Arc<RouterState>>, Json(req): Json<SolveRequest>) -> Response {
  let mut session = Session::with_busy_flag(state.config.clone(), state.busy.clone());
  if let Some(uri) = req.image.as_deref().filter(|uri| !uri.is_empty()) {
    if let Err(err) = session.attach_data_uri(uri) {
      return chat_error_response(&err);
    }
  }

  let Some(key) = state.api_key.clone() else {
    state.logger.error(KEY_MISSING);
    return error_response(StatusCode::INTERNAL_SERVER_ERROR, "key_missing", KEY_MISSING);
  };

  let client = match ChatClient::new(
    Transport::Direct {
      url: state.config.upstream_url.clone(),
      api_key: key,
    },
    Duration::from_secs(state.config.request_timeout_secs),
  ) {
    Ok(client) => client,
    Err(err) => return chat_error_response(&err),
  };

  match session.submit(req.text.as_deref().unwrap_or(""), &client).await {
    Ok(answer) => (
      StatusCode::OK,
      Json(SolveResponse {
        answer: answer.raw,
        html: answer.html,
      }),
    )
      .into_response(),
    Err(err) => {
      state.logger.warn(&format!("solve failed ({}): {err}", err.code()));
      chat_error_response(&err)
    }
  }
}

pub fn content_type_for(path: &Path) -> &'static str {
  let ext = path
    .extension()
    .and_then(|ext| ext.to_str())
    .map(|ext| ext.to_ascii_lowercase());
  ext
    .and_then(|ext| MIME_TYPES.iter().find(|(known, _)| *known == ext).map(|(_, mime)| *mime))
    .unwrap_or(DEFAULT_MIME)
}

/// Maps a request path onto the static directory. `None` when it would escape it.
pub fn resolve_static_path(root: &Path, request_path: &str) -> Option<PathBuf> {
  let request_path = if request_path == "/" { "/index.html" } else { request_path };
  let relative = Path::new(request_path.trim_start_matches('/'));
  if relative
    .components()
    .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
  {
    return None;
  }
  Some(root.join(relative))
}

async fn static_file(State(state): State<Arc<RouterState>>, uri: Uri) -> Response {
  let root = Path::new(&state.config.static_dir);
  let Some(path) = resolve_static_path(root, uri.path()) else {
    state.logger.warn(&format!("rejected path {}", uri.path()));
    return (StatusCode::NOT_FOUND, "404 Not Found").into_response();
  };

  match tokio::fs::read(&path).await {
    Ok(content) => (
      StatusCode::OK,
      [(CONTENT_TYPE, content_type_for(&path))],
      content,
    )
      .into_response(),
    Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
      state.logger.warn(&format!("404 {}", uri.path()));
      (StatusCode::NOT_FOUND, "404 Not Found").into_response()
    }
    Err(err) => {
      state.logger.error(&format!("500 {}: {err}", uri.path()));
      (StatusCode::INTERNAL_SERVER_ERROR, "Server Error").into_response()
    }
  }
}
