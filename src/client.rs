use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;

use crate::config::{resolve_api_key, AppConfig, TransportMode};
use crate::error::ChatError;
use crate::models::{ChatRequest, ChatResponse, ErrorEnvelope};

const INVALID_KEY_MARKER: &str = "Invalid Authentication";
const INVALID_KEY_MESSAGE: &str = "API Key 无效，请检查 API Key 是否正确";
const START_SERVER_MESSAGE: &str = "网络请求失败，请运行 tutorlens serve 启动本地服务器";

/// Resolved endpoint for chat requests. Only `Direct` carries a credential.
#[derive(Clone, Debug)]
pub enum Transport {
  Proxy { url: String },
  Direct { url: String, api_key: String },
}

impl Transport {
  pub fn from_config(config: &AppConfig) -> Result<Self, ChatError> {
    match config.transport {
      TransportMode::Proxy => Ok(Transport::Proxy {
        url: config.proxy_url(),
      }),
      TransportMode::Direct => Ok(Transport::Direct {
        url: config.upstream_url.clone(),
        api_key: resolve_api_key().map_err(ChatError::Config)?,
      }),
    }
  }

  fn url(&self) -> &str {
    match self {
      Transport::Proxy { url } | Transport::Direct { url, .. } => url,
    }
  }
}

pub struct ChatClient {
  http: reqwest::Client,
  transport: Transport,
}

impl ChatClient {
  pub fn new(transport: Transport, timeout: Duration) -> Result<Self, ChatError> {
    let http = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|err| ChatError::Config(err.to_string()))?;
    Ok(Self { http, transport })
  }

  pub fn from_config(config: &AppConfig) -> Result<Self, ChatError> {
    Self::new(
      Transport::from_config(config)?,
      Duration::from_secs(config.request_timeout_secs),
    )
  }

  pub fn transport(&self) -> &Transport {
    &self.transport
  }

  /// Sends one request and returns the first choice's content verbatim.
  pub async fn complete(&self, request: &ChatRequest) -> Result<String, ChatError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Transport::Direct { api_key, .. } = &self.transport {
      headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {api_key}"))
          .map_err(|err| ChatError::Config(err.to_string()))?,
      );
    }

    let resp = self
      .http
      .post(self.transport.url())
      .headers(headers)
      .json(request)
      .send()
      .await
      .map_err(|err| self.transport_failure(&err))?;

    let status = resp.status();
    let body = resp
      .bytes()
      .await
      .map_err(|err| self.transport_failure(&err))?;
    extract_answer(status, &body)
  }

  fn transport_failure(&self, err: &reqwest::Error) -> ChatError {
    if err.is_timeout() {
      return ChatError::TransportFailure(format!("请求超时：{err}"));
    }
    match self.transport {
      Transport::Proxy { .. } if err.is_connect() => {
        ChatError::TransportFailure(START_SERVER_MESSAGE.to_string())
      }
      _ => ChatError::TransportFailure(format!("网络请求失败：{err}")),
    }
  }
}

/// Interprets an upstream (or proxied) response.
pub fn extract_answer(status: StatusCode, body: &[u8]) -> Result<String, ChatError> {
  if !status.is_success() {
    return Err(upstream_error(status, body));
  }

  let parsed: ChatResponse = serde_json::from_slice(body)
    .map_err(|err| ChatError::UpstreamError(format!("无法解析响应：{err}")))?;
  parsed
    .choices
    .unwrap_or_default()
    .into_iter()
    .next()
    .and_then(|choice| choice.message)
    .and_then(|message| message.content)
    .ok_or(ChatError::EmptyResult)
}

fn upstream_error(status: StatusCode, body: &[u8]) -> ChatError {
  let message = serde_json::from_slice::<ErrorEnvelope>(body)
    .ok()
    .and_then(|envelope| envelope.error.message)
    .unwrap_or_else(|| format!("请求失败 ({})", status.as_u16()));

  if message.contains(INVALID_KEY_MARKER) {
    ChatError::UpstreamError(INVALID_KEY_MESSAGE.to_string())
  } else {
    ChatError::UpstreamError(message)
  }
}
