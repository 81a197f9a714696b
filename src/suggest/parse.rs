use serde_json::Value;
use tracing::warn;

const JSONP_PREFIX: &str = "window.google.ac.h(";
const ANTI_XSSI_PREFIX: &str = ")]}'";

/// Extract suggestion strings from a Google/YouTube completion body.
///
/// The endpoint answers in one of three framings depending on the `client`
/// parameter and service mood: JSONP (`window.google.ac.h(...)`), an
/// anti-XSSI `)]}'` prefix, or plain JSON. Unparseable bodies yield an
/// empty list rather than an error.
pub fn parse_google(body: &str) -> Vec<String> {
    let parsed = if let Some(after) = body.strip_prefix(JSONP_PREFIX) {
        after
            .rfind(')')
            .and_then(|end| serde_json::from_str(&after[..end]).ok())
            .map(|data| jsonp_suggestions(&data))
    } else if let Some(rest) = body.strip_prefix(ANTI_XSSI_PREFIX) {
        serde_json::from_str(rest)
            .ok()
            .map(|data| prefixed_suggestions(&data))
    } else {
        serde_json::from_str(body)
            .ok()
            .map(|data| plain_suggestions(&data))
    };

    parsed.unwrap_or_else(|| {
        warn!("unparseable completion body, returning no suggestions");
        Vec::new()
    })
}

/// Extract suggestion strings from an Amazon completion payload
/// (`{"suggestions": [{"value": ...}, ...]}`). Entries without a string
/// `value` are skipped.
pub fn parse_amazon(data: &Value) -> Vec<String> {
    let Some(items) = data.get("suggestions").and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| item.get("value").and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

fn jsonp_suggestions(data: &Value) -> Vec<String> {
    let Some(first) = data.as_array().and_then(|a| a.first()).and_then(Value::as_array) else {
        return Vec::new();
    };
    first
        .iter()
        .filter_map(Value::as_str)
        .map(strip_tags)
        .collect()
}

fn prefixed_suggestions(data: &Value) -> Vec<String> {
    let Some(items) = data
        .as_array()
        .filter(|a| a.len() > 1)
        .and_then(|a| a[1].as_array())
    else {
        return Vec::new();
    };

    let mut suggestions = Vec::new();
    for item in items {
        if let Some(entry) = item.as_array() {
            // completion entries carry plain text in the head position
            if let Some(first) = entry.first().and_then(Value::as_str) {
                suggestions.push(first.to_string());
            }
        } else if let Some(text) = item.as_str() {
            suggestions.push(strip_tags(text));
        }
    }
    suggestions
}

fn plain_suggestions(data: &Value) -> Vec<String> {
    let Some(items) = data.as_array() else {
        return Vec::new();
    };

    let mut suggestions = Vec::new();
    for item in items {
        match item {
            Value::Array(sub) => {
                for subitem in sub {
                    if let Some(text) = subitem.as_str() {
                        suggestions.push(strip_tags(text));
                    } else if let Some(first) =
                        subitem.as_array().and_then(|s| s.first()).and_then(Value::as_str)
                    {
                        suggestions.push(strip_tags(first));
                    }
                }
            }
            Value::String(text) => suggestions.push(strip_tags(text)),
            _ => {}
        }
    }
    suggestions
}

/// Remove `<...>` tag runs; Google bolds the completed fragment with `<b>`.
fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('<') {
        match rest[start + 1..].find('>') {
            // a bare "<>" is not a tag
            Some(0) => {
                out.push_str(&rest[..start + 2]);
                rest = &rest[start + 2..];
            }
            Some(len) => {
                out.push_str(&rest[..start]);
                rest = &rest[start + 1 + len + 1..];
            }
            None => {
                out.push_str(rest);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strip_tags_removes_markup() {
        assert_eq!(strip_tags("running <b>shoes</b>"), "running shoes");
        assert_eq!(strip_tags("<sc>shoe</sc> rack"), "shoe rack");
    }

    #[test]
    fn strip_tags_keeps_plain_angles() {
        assert_eq!(strip_tags("a < b"), "a < b");
        assert_eq!(strip_tags("empty <> pair"), "empty <> pair");
    }

    #[test]
    fn jsonp_extracts_first_list_strings() {
        let body = r#"window.google.ac.h([["running <b>shoes</b>","shoe repair"],{"q":"x"}])"#;
        assert_eq!(parse_google(body), vec!["running shoes", "shoe repair"]);
    }

    #[test]
    fn jsonp_skips_non_string_items() {
        let body = r#"window.google.ac.h([["shoes",42,["nested"]],[]])"#;
        assert_eq!(parse_google(body), vec!["shoes"]);
    }

    #[test]
    fn jsonp_without_closing_paren_is_empty() {
        assert!(parse_google("window.google.ac.h([[\"shoes\"]]").is_empty());
    }

    #[test]
    fn jsonp_wrong_shape_is_empty() {
        assert!(parse_google(r#"window.google.ac.h({"a":1})"#).is_empty());
        assert!(parse_google(r#"window.google.ac.h(["bare",2])"#).is_empty());
    }

    #[test]
    fn prefixed_takes_entry_heads_and_strings() {
        let body = ")]}'[[\"q\"],[[\"shoe polish\",0],\"<b>shoe</b> rack\"]]";
        assert_eq!(parse_google(body), vec!["shoe polish", "shoe rack"]);
    }

    #[test]
    fn prefixed_entry_heads_kept_verbatim() {
        let body = ")]}'[null,[[\"<b>shoes</b>\",0]]]";
        assert_eq!(parse_google(body), vec!["<b>shoes</b>"]);
    }

    #[test]
    fn prefixed_needs_second_element() {
        assert!(parse_google(")]}'[[\"only\"]]").is_empty());
        assert!(parse_google(")]}'[null,42]").is_empty());
    }

    #[test]
    fn plain_includes_top_level_strings() {
        assert_eq!(
            parse_google(r#"["shoe",["shoes","shoe repair"]]"#),
            vec!["shoe", "shoes", "shoe repair"]
        );
    }

    #[test]
    fn plain_takes_first_string_of_nested_entries() {
        assert_eq!(
            parse_google(r#"[[["<b>shoes</b>",1],["shoe rack",2]]]"#),
            vec!["shoes", "shoe rack"]
        );
    }

    #[test]
    fn plain_non_array_is_empty() {
        assert!(parse_google(r#"{"a":1}"#).is_empty());
    }

    #[test]
    fn garbage_body_is_empty() {
        assert!(parse_google("<html>forbidden</html>").is_empty());
    }

    #[test]
    fn amazon_extracts_values() {
        let data = json!({
            "suggestions": [
                {"value": "shoe rack"},
                {"value": "shoe organizer"}
            ]
        });
        assert_eq!(parse_amazon(&data), vec!["shoe rack", "shoe organizer"]);
    }

    #[test]
    fn amazon_skips_entries_without_value() {
        let data = json!({"suggestions": [{"value": "shoes"}, {"type": "KEYWORD"}, 7]});
        assert_eq!(parse_amazon(&data), vec!["shoes"]);
    }

    #[test]
    fn amazon_tolerates_missing_or_wrong_shape() {
        assert!(parse_amazon(&json!({})).is_empty());
        assert!(parse_amazon(&json!({"suggestions": "none"})).is_empty());
    }
}
