use thiserror::Error;

/// Everything that can go wrong between a submitted question and a rendered answer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ChatError {
  #[error("请输入题目或上传题目图片")]
  InvalidInput,
  #[error("{0}")]
  InvalidImage(String),
  #[error("a request is already in flight")]
  Busy,
  #[error("{0}")]
  UpstreamError(String),
  #[error("未获取到解析结果")]
  EmptyResult,
  #[error("{0}")]
  TransportFailure(String),
  #[error("config error: {0}")]
  Config(String),
}

impl ChatError {
  /// Short machine-readable code used in HTTP error envelopes and logs.
  pub fn code(&self) -> &'static str {
    match self {
      ChatError::InvalidInput => "invalid_input",
      ChatError::InvalidImage(_) => "invalid_image",
      ChatError::Busy => "busy",
      ChatError::UpstreamError(_) => "upstream_error",
      ChatError::EmptyResult => "empty_result",
      ChatError::TransportFailure(_) => "transport_failure",
      ChatError::Config(_) => "config_error",
    }
  }
}
