/// HTML sanitizer applied to visitor comment bodies before they are stored.
///
/// Comments are plain text with light formatting at most, so the rules are
/// deliberately strict: a small allowlist of formatting tags survives with
/// every attribute removed, `<script>`/`<style>` blocks are dropped together
/// with their content, every other tag is stripped, and stray angle brackets
/// are escaped. The stored value is safe to embed in a page as-is.
const ALLOWED_TAGS: &[&str] = &["b", "strong", "i", "em", "u", "p", "br"];

const CONTENT_STRIPPED_TAGS: &[&str] = &["script", "style"];

pub fn sanitize_comment_html(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let bytes = input.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() {
        let Some(offset) = input[pos..].find('<') else {
            output.push_str(&input[pos..]);
            break;
        };
        output.push_str(&input[pos..pos + offset]);
        let tag_start = pos + offset;

        match parse_tag(&input[tag_start..]) {
            Some(tag) => {
                let name = tag.name.to_ascii_lowercase();
                let after_tag = tag_start + tag.consumed;

                if CONTENT_STRIPPED_TAGS.contains(&name.as_str()) && !tag.closing {
                    pos = skip_stripped_block(input, after_tag, &name);
                } else if ALLOWED_TAGS.contains(&name.as_str()) {
                    if tag.closing {
                        output.push_str("</");
                        output.push_str(&name);
                        output.push('>');
                    } else {
                        output.push('<');
                        output.push_str(&name);
                        output.push('>');
                    }
                    pos = after_tag;
                } else {
                    // Disallowed tag: drop it, keep surrounding text.
                    pos = after_tag;
                }
            }
            None => {
                output.push_str("&lt;");
                pos = tag_start + 1;
            }
        }
    }

    output.trim().to_string()
}

struct ParsedTag<'a> {
    name: &'a str,
    closing: bool,
    consumed: usize,
}

/// Parse a tag starting at a `<`. Returns `None` when the bracket does not
/// open a recognizable tag, in which case the caller escapes it.
fn parse_tag(input: &str) -> Option<ParsedTag<'_>> {
    let rest = input.strip_prefix('<')?;
    let (closing, rest_offset) = match rest.strip_prefix('/') {
        Some(_) => (true, 2),
        None => (false, 1),
    };

    let body = &input[rest_offset..];
    let first = body.chars().next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }

    let name_len = body
        .char_indices()
        .find(|(_, c)| !c.is_ascii_alphanumeric())
        .map(|(idx, _)| idx)
        .unwrap_or(body.len());
    let name = &body[..name_len];

    // Everything up to the closing bracket (attributes included) is dropped.
    let close = body.find('>')?;
    Some(ParsedTag {
        name,
        closing,
        consumed: rest_offset + close + 1,
    })
}

/// Skip past the matching close tag of a content-stripped element. When the
/// element is never closed the rest of the input is dropped.
fn skip_stripped_block(input: &str, from: usize, name: &str) -> usize {
    let lowered = input[from..].to_ascii_lowercase();
    let close_tag = format!("</{name}");
    match lowered.find(&close_tag) {
        Some(idx) => {
            let after = from + idx + close_tag.len();
            match input[after..].find('>') {
                Some(end) => after + end + 1,
                None => input.len(),
            }
        }
        None => input.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(
            sanitize_comment_html("Artikel ini sangat membantu"),
            "Artikel ini sangat membantu"
        );
    }

    #[test]
    fn script_blocks_are_removed_with_content() {
        assert_eq!(
            sanitize_comment_html("sebelum <script>alert('xss')</script> sesudah"),
            "sebelum  sesudah"
        );
    }

    #[test]
    fn unterminated_script_drops_remainder() {
        assert_eq!(sanitize_comment_html("halo <script>alert(1)"), "halo");
    }

    #[test]
    fn style_blocks_are_removed() {
        assert_eq!(
            sanitize_comment_html("a<style>body { display: none; }</style>b"),
            "ab"
        );
    }

    #[test]
    fn allowed_formatting_survives_without_attributes() {
        assert_eq!(
            sanitize_comment_html(r#"<b onclick="steal()">tebal</b> dan <em>miring</em>"#),
            "<b>tebal</b> dan <em>miring</em>"
        );
    }

    #[test]
    fn disallowed_tags_are_stripped_keeping_text() {
        assert_eq!(
            sanitize_comment_html(r#"<img src=x onerror=alert(1)>foto <iframe src="x"></iframe>"#),
            "foto"
        );
    }

    #[test]
    fn anchors_are_stripped() {
        assert_eq!(
            sanitize_comment_html(r#"<a href="javascript:alert(1)">klik</a>"#),
            "klik"
        );
    }

    #[test]
    fn stray_angle_brackets_are_escaped() {
        assert_eq!(sanitize_comment_html("1 < 2 dan 3 <" ), "1 &lt; 2 dan 3 &lt;");
        assert_eq!(sanitize_comment_html("<3"), "&lt;3");
    }

    #[test]
    fn tag_names_are_case_insensitive() {
        assert_eq!(sanitize_comment_html("<B>x</B>"), "<b>x</b>");
        assert_eq!(sanitize_comment_html("<SCRIPT>x</SCRIPT>y"), "y");
    }

    #[test]
    fn result_is_trimmed() {
        assert_eq!(sanitize_comment_html("  rapi  "), "rapi");
    }
}
