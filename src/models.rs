use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  System,
  User,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ImageUrl {
  pub url: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
  Text { text: String },
  ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
  Text(String),
  Parts(Vec<ContentPart>),
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ChatMessage {
  pub role: Role,
  pub content: MessageContent,
}

/// Body of `POST /v1/chat/completions`, forwarded verbatim by the proxy.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ChatRequest {
  pub model: String,
  pub messages: Vec<ChatMessage>,
  pub temperature: f32,
  pub max_tokens: u32,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ChoiceMessage {
  pub content: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Choice {
  pub message: Option<ChoiceMessage>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ChatResponse {
  pub choices: Option<Vec<Choice>>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ErrorBody {
  pub message: Option<String>,
}

/// `{ "error": { "message": ... } }`, used both by the upstream and by the proxy itself.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ErrorEnvelope {
  pub error: ErrorBody,
}

impl ErrorEnvelope {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      error: ErrorBody {
        message: Some(message.into()),
      },
    }
  }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ImageData {
  pub mime: String,
  pub base64: String,
}

impl ImageData {
  pub fn data_uri(&self) -> String {
    format!("data:{};base64,{}", self.mime, self.base64)
  }

  /// Splits `data:<mime>;base64,<payload>`. Returns `None` for anything else.
  pub fn from_data_uri(uri: &str) -> Option<Self> {
    let rest = uri.strip_prefix("data:")?;
    let (mime, payload) = rest.split_once(";base64,")?;
    if mime.is_empty() || payload.is_empty() {
      return None;
    }
    Some(Self {
      mime: mime.to_string(),
      base64: payload.to_string(),
    })
  }
}

/// A question awaiting submission.
#[derive(Clone, Debug, Default)]
pub struct Query {
  pub text: Option<String>,
  pub image: Option<ImageData>,
}

impl Query {
  pub fn new(text: impl Into<String>, image: Option<ImageData>) -> Self {
    let text = text.into().trim().to_string();
    Self {
      text: if text.is_empty() { None } else { Some(text) },
      image,
    }
  }

  pub fn is_empty(&self) -> bool {
    self.text.as_deref().map_or(true, str::is_empty) && self.image.is_none()
  }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SolveRequest {
  pub text: Option<String>,
  /// Image as a data URI.
  pub image: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SolveResponse {
  pub answer: String,
  pub html: String,
}
