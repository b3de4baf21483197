/* src/server/engine/rust/src/escape.rs */

/// Escape text for use inside an HTML attribute value or text node.
///
/// Covers the five characters that can break out of a quoted attribute or
/// open a tag: `&`, `<`, `>`, `"` and `'`. Everything else, including
/// non-ASCII, is passed through untouched since documents are served as UTF-8.
pub fn escape_html(input: &str) -> String {
  let mut out = String::with_capacity(input.len());
  for ch in input.chars() {
    match ch {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      _ => out.push(ch),
    }
  }
  out
}

/// Make raw content safe to place inside a `<script>` element.
///
/// Only `</` needs treatment: it is rewritten to `<\/`, which is equivalent
/// inside JSON and JavaScript string literals but can no longer close the tag.
pub fn escape_script_content(input: &str) -> String {
  let mut out = String::with_capacity(input.len());
  let mut chars = input.chars().peekable();
  while let Some(ch) = chars.next() {
    out.push(ch);
    if ch == '<' && chars.peek() == Some(&'/') {
      out.push('\\');
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn plain_text_passthrough() {
    assert_eq!(escape_html("hello world"), "hello world");
  }

  #[test]
  fn escapes_markup_characters() {
    assert_eq!(
      escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
      "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
    );
  }

  #[test]
  fn escapes_json_for_attribute() {
    let json = r#"{"component":"Home","props":{"q":"a&b"}}"#;
    assert_eq!(
      escape_html(json),
      "{&quot;component&quot;:&quot;Home&quot;,&quot;props&quot;:{&quot;q&quot;:&quot;a&amp;b&quot;}}"
    );
  }

  #[test]
  fn non_ascii_untouched() {
    assert_eq!(escape_html("café 你好"), "café 你好");
  }

  #[test]
  fn script_content_breaks_closing_tags() {
    assert_eq!(escape_script_content(r#"{"a":"</script>"}"#), r#"{"a":"<\/script>"}"#);
  }

  #[test]
  fn script_content_keeps_lone_angle_brackets() {
    assert_eq!(escape_script_content("1 < 2 && 3 > 2"), "1 < 2 && 3 > 2");
  }
}
