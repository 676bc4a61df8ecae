/// Truncate a string to at most `max_bytes` bytes at a character boundary.
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) && end > 0 {
        end -= 1;
    }
    &s[..end]
}

/// Strip markdown code blocks from a response.
pub fn strip_code_blocks(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Find the first balanced `{...}` span in free text.
///
/// Braces inside JSON string literals are ignored, so a reply like
/// `Sure! {"a": "}"} hope that helps` yields `{"a": "}"}`.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_to_char_boundary() {
        let text = "Hello 世界";
        let truncated = truncate_to_char_boundary(text, 8);
        assert!(truncated.len() <= 8);
        assert!(text.starts_with(truncated));
    }

    #[test]
    fn test_truncate_within_bounds() {
        let text = "Hello";
        assert_eq!(truncate_to_char_boundary(text, 100), "Hello");
    }

    #[test]
    fn test_strip_code_blocks() {
        assert_eq!(strip_code_blocks("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("```\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("{}"), "{}");
    }

    #[test]
    fn extract_json_object_skips_prose() {
        let reply = "Here you go: {\"cypher_query\": null, \"text_explanation\": \"hi\"} enjoy";
        assert_eq!(
            extract_json_object(reply),
            Some("{\"cypher_query\": null, \"text_explanation\": \"hi\"}")
        );
    }

    #[test]
    fn extract_json_object_handles_nesting_and_braces_in_strings() {
        let reply = r#"x {"a": {"b": "}"}, "c": "\"{"} y"#;
        assert_eq!(extract_json_object(reply), Some(r#"{"a": {"b": "}"}, "c": "\"{"}"#));
    }

    #[test]
    fn extract_json_object_none_when_unbalanced() {
        assert_eq!(extract_json_object("no json {here"), None);
        assert_eq!(extract_json_object("nothing"), None);
    }
}
