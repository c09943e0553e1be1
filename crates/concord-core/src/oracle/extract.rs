//! Untrusted JSON extraction from free-text oracle replies.
//!
//! Replies may wrap the payload in prose or markdown fences. Extraction
//! first tries the widest span (first opener to last closer), then falls
//! back to scanning for the first opener that starts a well-formed value.
//! Nothing here validates the payload's schema; callers do that.

use serde_json::Value;

/// First well-formed JSON array embedded in `text`.
pub fn extract_json_array(text: &str) -> Option<&str> {
    extract_delimited(text, '[', ']', Value::is_array)
}

/// First well-formed JSON object embedded in `text`.
pub fn extract_json_object(text: &str) -> Option<&str> {
    extract_delimited(text, '{', '}', Value::is_object)
}

fn extract_delimited(text: &str, open: char, close: char, accept: fn(&Value) -> bool) -> Option<&str> {
    let first = text.find(open)?;

    if let Some(last) = text.rfind(close) {
        if last > first {
            let span = &text[first..=last];
            if matches!(serde_json::from_str::<Value>(span), Ok(ref v) if accept(v)) {
                return Some(span);
            }
        }
    }

    text.match_indices(open).find_map(|(start, _)| {
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value)) if accept(&value) => Some(&text[start..start + stream.byte_offset()]),
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_array() {
        assert_eq!(extract_json_array("[]"), Some("[]"));
        assert_eq!(extract_json_array("  [1, 2] "), Some("[1, 2]"));
    }

    #[test]
    fn test_array_in_prose_and_fences() {
        let text = "Here are the matches:\n```json\n[{\"existingId\": \"CLI-001\"}]\n```\nLet me know.";
        assert_eq!(extract_json_array(text), Some("[{\"existingId\": \"CLI-001\"}]"));
    }

    #[test]
    fn test_first_well_formed_array_when_span_is_invalid() {
        let text = "Scores [see below]: [{\"a\": 1}] and [2]";
        assert_eq!(extract_json_array(text), Some("[{\"a\": 1}]"));
    }

    #[test]
    fn test_no_array() {
        assert_eq!(extract_json_array("no matches found"), None);
        assert_eq!(extract_json_array("[unterminated"), None);
        assert_eq!(extract_json_array("{\"matches\": 3}"), None);
    }

    #[test]
    fn test_object_extraction() {
        let text = "Result:\n{\"hasConflicts\": false, \"riskLevel\": \"none\"}\nDone.";
        assert_eq!(
            extract_json_object(text),
            Some("{\"hasConflicts\": false, \"riskLevel\": \"none\"}")
        );
        assert_eq!(extract_json_object("nothing here"), None);
    }

    #[test]
    fn test_object_scan_skips_broken_prefix() {
        let text = "{oops} then {\"ok\": true}";
        assert_eq!(extract_json_object(text), Some("{\"ok\": true}"));
    }
}
