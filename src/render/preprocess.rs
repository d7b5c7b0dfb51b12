//! Transforms applied to the raw answer before Markdown conversion.

/// A line that is nothing but `【label】` becomes a level-2 heading.
pub fn section_headings(text: &str) -> String {
  regex!(r"(?m)^【([^】\n]+)】[ \t]*$")
    .replace_all(text, "## ${1}")
    .into_owned()
}

/// Any other `【label】` is kept but emphasized. Emits `<strong>` directly since
/// CommonMark's flanking rules reject `**` next to CJK punctuation.
pub fn bracket_emphasis(text: &str) -> String {
  regex!(r"【([^】\n]+)】")
    .replace_all(text, "<strong>【${1}】</strong>")
    .into_owned()
}

/// `$$...$$` -> block container. Must run before [`math_inline`].
pub fn math_blocks(text: &str) -> String {
  regex!(r"\$\$([^$]+)\$\$")
    .replace_all(text, "<div class=\"math-block\">${1}</div>")
    .into_owned()
}

/// `$...$` -> inline span.
pub fn math_inline(text: &str) -> String {
  regex!(r"\$([^$]+)\$")
    .replace_all(text, "<span class=\"math-inline\">${1}</span>")
    .into_owned()
}
