use pulldown_cmark::{html, Event, Options, Parser};

/// CommonMark + GFM tables/strikethrough/task lists. Single newlines render as `<br />`.
pub fn to_html(markdown: &str) -> String {
  let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
  let parser = Parser::new_ext(markdown, options).map(|event| match event {
    Event::SoftBreak => Event::HardBreak,
    other => other,
  });

  let mut html_output = String::new();
  html::push_html(&mut html_output, parser);
  html_output
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn soft_breaks_become_line_breaks() {
    assert_eq!(to_html("a\nb"), "<p>a<br />\nb</p>\n");
  }

  #[test]
  fn raw_html_passes_through() {
    let html = to_html("<div class=\"math-block\">x</div>\n\ntext");
    assert!(html.starts_with("<div class=\"math-block\">x</div>"));
    assert!(html.contains("<p>text</p>"));
  }

  #[test]
  fn ordered_list() {
    let html = to_html("1. one\n2. two\n");
    assert!(html.contains("<ol>"));
    assert!(html.contains("<li>one</li>"));
  }
}
