use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::client::ChatClient;
use crate::config::AppConfig;
use crate::error::ChatError;
use crate::image::{load_image, parse_data_uri};
use crate::models::{ImageData, Query};
use crate::prompt::build_request;
use crate::render::Renderer;

#[derive(Clone, Debug, PartialEq)]
pub struct Answer {
  pub raw: String,
  pub html: String,
}

/// Input state for one user: the current image and whether a request is in flight.
pub struct Session {
  config: AppConfig,
  renderer: Renderer,
  image: Option<ImageData>,
  busy: Arc<AtomicBool>,
}

/// Clears the busy flag when the submission finishes or is dropped mid-flight.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
  fn drop(&mut self) {
    self.0.store(false, Ordering::Release);
  }
}

impl Session {
  pub fn new(config: AppConfig) -> Self {
    Self::with_busy_flag(config, Arc::new(AtomicBool::new(false)))
  }

  /// A session whose in-flight flag is shared with other sessions, so at most one of them submits at a time.
  pub fn with_busy_flag(config: AppConfig, busy: Arc<AtomicBool>) -> Self {
    let renderer = Renderer::new(config.markdown_engine);
    Self {
      config,
      renderer,
      image: None,
      busy,
    }
  }

  pub fn image(&self) -> Option<&ImageData> {
    self.image.as_ref()
  }

  /// Replaces the current image.
  pub fn attach_image(&mut self, image: ImageData) {
    self.image = Some(image);
  }

  pub fn attach_image_file(&mut self, path: &Path) -> Result<(), ChatError> {
    self.image = Some(load_image(path)?);
    Ok(())
  }

  pub fn attach_data_uri(&mut self, uri: &str) -> Result<(), ChatError> {
    self.image = Some(parse_data_uri(uri)?);
    Ok(())
  }

  pub fn clear_image(&mut self) {
    self.image = None;
  }

  pub fn is_busy(&self) -> bool {
    self.busy.load(Ordering::Acquire)
  }

  /// Shared handle to the in-flight flag, for whatever drives the submit control.
  pub fn busy_flag(&self) -> Arc<AtomicBool> {
    self.busy.clone()
  }

  /// Query -> request -> network -> rendered answer. Rejects a second submit while one is running.
  pub async fn submit(&self, text: &str, client: &ChatClient) -> Result<Answer, ChatError> {
    let query = Query::new(text, self.image.clone());
    let request = build_request(&query, &self.config)?;

    if self
      .busy
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .is_err()
    {
      return Err(ChatError::Busy);
    }
    let _guard = InFlight(self.busy.clone());

    let raw = client.complete(&request).await?;
    let html = self.renderer.render(&raw);
    Ok(Answer { raw, html })
  }
}
