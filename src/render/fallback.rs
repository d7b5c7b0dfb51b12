//! Minimal Markdown converter used when the standard engine is unavailable.

const BLOCK_PREFIXES: [&str; 8] = ["<h", "<ul", "<ol", "<li", "<div", "<p", "</", "<table"];

pub fn fallback_markdown(text: &str) -> String {
  let text = headings(text);
  let text = emphasis(&text);
  let text = code(&text);
  let text = lists(&text);
  paragraphs(&text)
}

fn headings(text: &str) -> String {
  let text = regex!(r"(?m)^### (.+)$").replace_all(text, "<h3>${1}</h3>");
  let text = regex!(r"(?m)^## (.+)$").replace_all(&text, "<h2>${1}</h2>");
  regex!(r"(?m)^# (.+)$")
    .replace_all(&text, "<h1>${1}</h1>")
    .into_owned()
}

/// Bold/italic with `*` and `_`, longest delimiter first. Never spans lines.
fn emphasis(text: &str) -> String {
  let text = regex!(r"\*\*\*([^*\n]+)\*\*\*").replace_all(text, "<strong><em>${1}</em></strong>");
  let text = regex!(r"\*\*([^*\n]+)\*\*").replace_all(&text, "<strong>${1}</strong>");
  let text = regex!(r"\*([^*\n]+)\*").replace_all(&text, "<em>${1}</em>");
  let text = regex!(r"___([^_\n]+)___").replace_all(&text, "<strong><em>${1}</em></strong>");
  let text = regex!(r"__([^_\n]+)__").replace_all(&text, "<strong>${1}</strong>");
  regex!(r"_([^_\n]+)_")
    .replace_all(&text, "<em>${1}</em>")
    .into_owned()
}

fn code(text: &str) -> String {
  let text = regex!(r"```(\w*)\n([\s\S]*?)```").replace_all(text, |caps: &regex::Captures| {
    let lang = &caps[1];
    if lang.is_empty() {
      format!("<pre><code>{}</code></pre>", &caps[2])
    } else {
      format!("<pre><code class=\"language-{lang}\">{}</code></pre>", &caps[2])
    }
  });
  regex!(r"`([^`\n]+)`")
    .replace_all(&text, "<code>${1}</code>")
    .into_owned()
}

/// Consecutive `-`/`*` items become one `<ul>`, numbered items one `<ol>`.
fn lists(text: &str) -> String {
  let bullet = regex!(r"^[ \t]*[-*][ \t]+(.+)$");
  let numbered = regex!(r"^[ \t]*\d+\.[ \t]+(.+)$");

  let mut out: Vec<String> = Vec::new();
  let mut open: Option<&'static str> = None;
  let mut in_pre = false;

  for line in text.lines() {
    if line.contains("<pre") {
      in_pre = true;
    }
    let item = if in_pre {
      None
    } else if let Some(caps) = bullet.captures(line) {
      Some(("ul", caps[1].to_string()))
    } else if let Some(caps) = numbered.captures(line) {
      Some(("ol", caps[1].to_string()))
    } else {
      None
    };
    if line.contains("</pre>") {
      in_pre = false;
    }

    match item {
      Some((kind, body)) => {
        let mut entry = String::new();
        if open != Some(kind) {
          close_list(&mut out, open.take());
          entry.push_str(&format!("<{kind}>"));
          open = Some(kind);
        }
        entry.push_str(&format!("<li>{body}</li>"));
        out.push(entry);
      }
      None => {
        close_list(&mut out, open.take());
        out.push(line.to_string());
      }
    }
  }
  close_list(&mut out, open);
  out.join("\n")
}

fn close_list(out: &mut [String], kind: Option<&str>) {
  if let (Some(kind), Some(last)) = (kind, out.last_mut()) {
    last.push_str(&format!("</{kind}>"));
  }
}

/// Groups loose lines into `<p>` blocks split on blank lines, `<br>` inside a block.
/// Block-level markup passes through; `<pre>` content keeps its newlines.
fn paragraphs(text: &str) -> String {
  let mut result = String::new();
  let mut in_paragraph = false;
  let mut in_pre = false;

  for raw in text.lines() {
    if in_pre {
      result.push('\n');
      result.push_str(raw);
      if raw.contains("</pre>") {
        in_pre = false;
      }
      continue;
    }

    let line = raw.trim();
    if line.is_empty() {
      if in_paragraph {
        result.push_str("</p>");
        in_paragraph = false;
      }
      continue;
    }

    if line.starts_with("<pre") {
      if in_paragraph {
        result.push_str("</p>");
        in_paragraph = false;
      }
      result.push_str(line);
      in_pre = !line.contains("</pre>");
    } else if BLOCK_PREFIXES.iter().any(|p| line.starts_with(p)) {
      if in_paragraph {
        result.push_str("</p>");
        in_paragraph = false;
      }
      result.push_str(line);
    } else if !in_paragraph {
      result.push_str("<p>");
      result.push_str(line);
      in_paragraph = true;
    } else {
      result.push_str("<br>");
      result.push_str(line);
    }
  }

  if in_paragraph {
    result.push_str("</p>");
  }
  result
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn heading_levels() {
    assert_eq!(headings("# a\n## b\n### c"), "<h1>a</h1>\n<h2>b</h2>\n<h3>c</h3>");
    assert_eq!(headings("#no space"), "#no space");
  }

  #[test]
  fn emphasis_variants() {
    assert_eq!(emphasis("***x***"), "<strong><em>x</em></strong>");
    assert_eq!(emphasis("**x** and *y*"), "<strong>x</strong> and <em>y</em>");
    assert_eq!(emphasis("__x__ _y_"), "<strong>x</strong> <em>y</em>");
    assert_eq!(emphasis("a * b\nc * d"), "a * b\nc * d");
  }

  #[test]
  fn fenced_and_inline_code() {
    assert_eq!(
      code("```py\nprint(1)\n```"),
      "<pre><code class=\"language-py\">print(1)\n</code></pre>"
    );
    assert_eq!(code("```\nx\n```"), "<pre><code>x\n</code></pre>");
    assert_eq!(code("use `let`"), "use <code>let</code>");
    assert_eq!(code("a ``` b"), "a ``` b");
  }

  #[test]
  fn list_runs() {
    assert_eq!(lists("- a\n- b\ntext"), "<ul><li>a</li>\n<li>b</li></ul>\ntext");
    assert_eq!(lists("1. a\n2. b"), "<ol><li>a</li>\n<li>b</li></ol>");
    assert_eq!(lists("- a\n1. b"), "<ul><li>a</li></ul>\n<ol><li>b</li></ol>");
  }

  #[test]
  fn paragraphs_split_on_blank_lines() {
    assert_eq!(paragraphs("a\nb\n\nc"), "<p>a<br>b</p><p>c</p>");
    assert_eq!(paragraphs("<h2>t</h2>\nbody"), "<h2>t</h2><p>body</p>");
  }

  #[test]
  fn pre_content_is_untouched() {
    let html = fallback_markdown("```\n- not a list\n\n  indented\n```");
    assert_eq!(html, "<pre><code>- not a list\n\n  indented\n</code></pre>");
  }

  #[test]
  fn full_document() {
    let html = fallback_markdown("## 知识点\n\n- 加法\n- 减法\n\n**答案** 是 3");
    assert_eq!(
      html,
      "<h2>知识点</h2><ul><li>加法</li><li>减法</li></ul><p><strong>答案</strong> 是 3</p>"
    );
  }
}
