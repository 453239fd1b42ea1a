//! JSON settings files, as written by VS Code and its forks.
//!
//! Editors in the VS Code family accept JSON with comments and trailing commas
//! in `settings.json`. Those are tolerated on read; the file is written back
//! as plain JSON with the editor's four-space indentation. Key order is kept
//! (`serde_json` is built with `preserve_order`).

use serde::Serialize;
use serde_json::{Map, Value};

use super::FormatError;

/// Remove `//` and `/* */` comments and trailing commas, leaving string
/// contents alone.
pub fn strip_jsonc(input: &str) -> String {
    let without_comments = strip_comments(input);
    strip_trailing_commas(&without_comments)
}

fn strip_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        let next = chars.peek().copied();
        match (c, next) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                // Line comment: drop up to the newline, keep the newline.
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    if next == '\n' {
                        out.push('\n');
                    }
                    prev = next;
                }
            }
            _ => out.push(c),
        }
    }

    out
}

fn strip_trailing_commas(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if in_string {
            out.push(c);
            if c == '\\' {
                if let Some(&escaped) = chars.get(i + 1) {
                    out.push(escaped);
                    i += 1;
                }
            } else if c == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        if c == '"' {
            in_string = true;
        } else if c == ',' {
            let next = chars[i + 1..].iter().copied().find(|ch| !ch.is_whitespace());
            if matches!(next, Some('}' | ']')) {
                i += 1;
                continue;
            }
        }
        out.push(c);
        i += 1;
    }

    out
}

/// Parse a settings document into its top-level object.
///
/// An empty (or whitespace-only) document is an empty object.
pub fn parse_object(text: &str) -> Result<Map<String, Value>, FormatError> {
    let cleaned = strip_jsonc(text);
    if cleaned.trim().is_empty() {
        return Ok(Map::new());
    }

    match serde_json::from_str::<Value>(&cleaned)? {
        Value::Object(map) => Ok(map),
        other => Err(FormatError::NotAnObject(value_kind(&other))),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Serialize a top-level object with four-space indentation and a trailing
/// newline.
pub fn to_pretty_string(map: &Map<String, Value>) -> Result<String, FormatError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    map.serialize(&mut serializer)?;

    let mut text = String::from_utf8_lossy(&buf).into_owned();
    text.push('\n');
    Ok(text)
}

/// Set `key` to the string `value` in the document's top-level object,
/// replacing an existing entry in place or appending a new one.
pub fn set_top_level_key(text: &str, key: &str, value: &str) -> Result<String, FormatError> {
    let mut map = parse_object(text)?;
    map.insert(key.to_string(), Value::String(value.to_string()));
    to_pretty_string(&map)
}

/// Read a top-level string entry.
pub fn get_top_level_str(text: &str, key: &str) -> Result<Option<String>, FormatError> {
    let map = parse_object(text)?;
    Ok(map.get(key).and_then(Value::as_str).map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "workbench.colorTheme";

    #[test]
    fn test_empty_object_gets_the_key() {
        let out = set_top_level_key("{}", KEY, "Dracula").unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value, serde_json::json!({ "workbench.colorTheme": "Dracula" }));
    }

    #[test]
    fn test_empty_file_is_an_empty_object() {
        let out = set_top_level_key("  \n", KEY, "Dracula").unwrap();
        assert_eq!(
            get_top_level_str(&out, KEY).unwrap().as_deref(),
            Some("Dracula")
        );
    }

    #[test]
    fn test_unrelated_keys_and_order_are_preserved() {
        let input = r#"{
    "editor.fontSize": 14,
    "workbench.colorTheme": "Default Light+",
    "files.autoSave": "afterDelay"
}"#;
        let out = set_top_level_key(input, KEY, "Default Dark+").unwrap();
        let map = parse_object(&out).unwrap();

        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["editor.fontSize", KEY, "files.autoSave"]);
        assert_eq!(map["editor.fontSize"], 14);
        assert_eq!(map[KEY], "Default Dark+");
    }

    #[test]
    fn test_writing_twice_is_idempotent() {
        let once = set_top_level_key("{\"a\": 1}", KEY, "Dracula").unwrap();
        let twice = set_top_level_key(&once, KEY, "Dracula").unwrap();
        assert_eq!(once, twice);
        assert_eq!(twice.matches(KEY).count(), 1);
    }

    #[test]
    fn test_comments_and_trailing_commas_are_tolerated() {
        let input = r#"{
    // user settings
    "editor.tabSize": 2, /* inline */
    "url": "https://example.com/path",
    "list": [1, 2, 3,],
}"#;
        let map = parse_object(input).unwrap();
        assert_eq!(map["editor.tabSize"], 2);
        assert_eq!(map["url"], "https://example.com/path");
        assert_eq!(map["list"], serde_json::json!([1, 2, 3]));
    }

    #[test]
    fn test_comment_markers_inside_strings_are_kept() {
        let input = r#"{"a": "// not a comment", "b": "x,}", "c": "q\"/*"}"#;
        let map = parse_object(input).unwrap();
        assert_eq!(map["a"], "// not a comment");
        assert_eq!(map["b"], "x,}");
        assert_eq!(map["c"], "q\"/*");
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(matches!(
            parse_object("[1, 2]"),
            Err(FormatError::NotAnObject("an array"))
        ));
        assert!(matches!(parse_object("{"), Err(FormatError::Json(_))));
    }

    #[test]
    fn test_output_uses_four_space_indent() {
        let out = set_top_level_key("{}", KEY, "Dracula").unwrap();
        assert_eq!(out, "{\n    \"workbench.colorTheme\": \"Dracula\"\n}\n");
    }
}
