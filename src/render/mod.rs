//! Answer text -> display HTML.
//!
//! The pipeline is a fixed sequence of pure string transforms; each step consumes the
//! previous step's output, so the order in [`Renderer::render`] is load-bearing:
//! whole-line section markers before inline markers, block math before inline math,
//! Markdown conversion before the HTML post-processing.

macro_rules! regex {
  ($re:literal) => {{
    static RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| regex::Regex::new($re).expect("static regex"))
  }};
}

#[cfg(feature = "cmark")]
mod cmark;
mod fallback;
mod postprocess;
mod preprocess;

use crate::config::MarkdownEngine;

pub use fallback::fallback_markdown;
pub use postprocess::post_process;
pub use preprocess::{bracket_emphasis, math_blocks, math_inline, section_headings};

#[derive(Clone, Copy, Debug)]
pub struct Renderer {
  engine: MarkdownEngine,
}

impl Default for Renderer {
  fn default() -> Self {
    Self::new(MarkdownEngine::Cmark)
  }
}

impl Renderer {
  pub fn new(engine: MarkdownEngine) -> Self {
    Self { engine }
  }

  pub fn render(&self, text: &str) -> String {
    let text = section_headings(text);
    let text = bracket_emphasis(&text);
    let text = math_blocks(&text);
    let text = math_inline(&text);
    let html = self.markdown_to_html(&text);
    post_process(&html)
  }

  fn markdown_to_html(&self, text: &str) -> String {
    match self.engine {
      #[cfg(feature = "cmark")]
      MarkdownEngine::Cmark => cmark::to_html(text),
      _ => fallback_markdown(text),
    }
  }
}

/// Container markup the page drops the rendered answer into.
pub fn wrap_result(html: &str) -> String {
  format!(
    "<div class=\"analysis-result\">\n  <div class=\"result-body markdown-body\">\n{html}\n  </div>\n</div>"
  )
}
