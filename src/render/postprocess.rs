//! Presentation pass over converted HTML.

const TAG_CLASSES: [(&str, &str); 7] = [
  ("<h2>", "<h2 class=\"md-heading md-h2\">"),
  ("<h3>", "<h3 class=\"md-heading md-h3\">"),
  ("<ul>", "<ul class=\"md-list\">"),
  ("<ol>", "<ol class=\"md-list md-ordered\">"),
  ("<pre>", "<pre class=\"md-code-block\">"),
  ("<code>", "<code class=\"md-code\">"),
  ("<p>", "<p class=\"md-paragraph\">"),
];

pub fn post_process(html: &str) -> String {
  let html = tag_classes(html);
  let html = answer_highlights(&html);
  formulas(&html)
}

/// Only bare tags are touched; tags that already carry attributes are left alone.
pub fn tag_classes(html: &str) -> String {
  TAG_CLASSES
    .iter()
    .fold(html.to_string(), |acc, (bare, classed)| acc.replace(bare, classed))
}

/// `12 + 3 = 15` and friends. Spans wrapped on an earlier pass are left as they are.
pub fn formulas(html: &str) -> String {
  regex!(
    r#"(<span class="math-formula">[^<]*</span>)|(\d+\s*[×÷+\-*/=]\s*\d+(?:\s*[×÷+\-*/=]\s*\d+)*)"#
  )
  .replace_all(html, |caps: &regex::Captures| match caps.get(1) {
    Some(wrapped) => wrapped.as_str().to_string(),
    None => format!("<span class=\"math-formula\">{}</span>", &caps[2]),
  })
  .into_owned()
}

/// A conclusion cue (`答案：`, `所以:`, `Therefore:` ...) and the rest of its sentence.
pub fn answer_highlights(html: &str) -> String {
  let html = regex!(r"(?:答案|答|结论|因此|所以)[：:]\s*([^<\n]+)").replace_all(
    html,
    "<div class=\"answer-highlight\"><span class=\"answer-label\">答案</span><span class=\"answer-content\">${1}</span></div>",
  );
  regex!(r"(?i)\b(?:answer|conclusion|therefore)\s*[：:]\s*([^<\n]+)")
    .replace_all(
      &html,
      "<div class=\"answer-highlight\"><span class=\"answer-label\">Answer</span><span class=\"answer-content\">${1}</span></div>",
    )
    .into_owned()
}
