//! Recovery of JSON from free-form model output.
//!
//! Models wrap JSON in code fences, prefix it with prose, or stop
//! mid-object when they hit their token limit. Parsing tries the text as
//! given first; failing that, it cuts the text back to the last point where
//! every open container held only complete members and closes them.

use serde_json::Value;

/// A parsed response and whether it needed truncation recovery.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedJson {
    Direct(Value),
    Recovered(Value),
}

impl ParsedJson {
    pub fn into_value(self) -> Value {
        match self {
            ParsedJson::Direct(v) | ParsedJson::Recovered(v) => v,
        }
    }

    pub fn was_recovered(&self) -> bool {
        matches!(self, ParsedJson::Recovered(_))
    }
}

/// Remove surrounding Markdown code fences (```json ... ```).
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") up to the end of the fence line
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };
    rest.trim_end().trim_end_matches("```").trim()
}

/// Parse the first JSON object in `text`.
///
/// A `{` whose braces close without parsing (prose such as `{2}`) is
/// skipped and the search resumes after it.
pub fn parse_json_response(text: &str) -> Result<ParsedJson, String> {
    let body = strip_code_fences(text);
    let mut offset = body
        .find('{')
        .ok_or_else(|| "response contains no JSON object".to_string())?;
    let mut first_error: Option<String> = None;

    loop {
        let candidate = &body[offset..];

        // Parses one value and ignores any trailing prose
        let mut stream = serde_json::Deserializer::from_str(candidate).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value)) => return Ok(ParsedJson::Direct(value)),
            Some(Err(e)) => {
                first_error.get_or_insert_with(|| e.to_string());
            }
            None => {}
        }
        let direct_error = || {
            first_error
                .clone()
                .unwrap_or_else(|| "empty response".to_string())
        };

        let resume = match scan(candidate) {
            Extent::Truncated(repaired) => {
                let repaired = repaired
                    .ok_or_else(|| format!("{}; no recoverable prefix", direct_error()))?;
                return serde_json::from_str(&repaired)
                    .map(ParsedJson::Recovered)
                    .map_err(|e| format!("{}; recovery failed: {}", direct_error(), e));
            }
            Extent::Closed(end) | Extent::Mismatched(end) => offset + end,
        };
        match body[resume..].find('{') {
            Some(next) => offset = resume + next,
            None => return Err(format!("{}; no recoverable prefix", direct_error())),
        }
    }
}

/// How a candidate value starting at byte 0 ends.
enum Extent {
    /// Brackets balance just before this byte offset.
    Closed(usize),
    /// A closer that does not match its opener sits at this byte offset.
    Mismatched(usize),
    /// The text ends inside the value; holds the repaired prefix when a
    /// safe point exists.
    Truncated(Option<String>),
}

/// Walk `body` string-aware and classify how its leading value ends.
///
/// For a truncated value the text is cut back to its last safe point and
/// the missing closers are appended. A safe point is just after a nested
/// container closes, or just before a separating comma: everything before
/// it inside each open container is a complete member.
fn scan(body: &str) -> Extent {
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    let mut safe: Option<(usize, Vec<char>)> = None;

    for (idx, c) in body.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.pop() != Some(c) {
                    return Extent::Mismatched(idx);
                }
                if stack.is_empty() {
                    return Extent::Closed(idx + c.len_utf8());
                }
                safe = Some((idx + c.len_utf8(), stack.clone()));
            }
            ',' if !stack.is_empty() => safe = Some((idx, stack.clone())),
            _ => {}
        }
    }

    Extent::Truncated(safe.map(|(cut, open)| {
        let mut repaired = body[..cut].trim_end().to_string();
        repaired.extend(open.iter().rev());
        repaired
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn test_direct_parse_ignores_surrounding_prose() {
        let parsed = parse_json_response("Here you go: {\"a\": 1} hope that helps").unwrap();
        assert_eq!(parsed, ParsedJson::Direct(json!({"a": 1})));
    }

    #[test]
    fn test_brackets_in_leading_prose_are_skipped() {
        let parsed =
            parse_json_response("Here is the record [JSON below]:\n{\"company_name\": \"Acme\"}")
                .unwrap();
        assert_eq!(parsed, ParsedJson::Direct(json!({"company_name": "Acme"})));

        let truncated = r#"Notes [1] and {2}: {"a": "x", "b": "y", "c": "tr"#;
        assert_eq!(
            parse_json_response(truncated).unwrap(),
            ParsedJson::Recovered(json!({"a": "x", "b": "y"}))
        );
    }

    #[test]
    fn test_recovers_object_truncated_mid_member() {
        let text = r#"{"name": "Acme", "executives": [{"name": "Jane"}, {"name": "Jo"#;
        let parsed = parse_json_response(text).unwrap();
        assert!(parsed.was_recovered());
        assert_eq!(
            parsed.into_value(),
            json!({"name": "Acme", "executives": [{"name": "Jane"}]})
        );
    }

    #[test]
    fn test_recovers_flat_object_at_last_comma() {
        let text = r#"{"a": "x", "b": "y", "c": "tru"#;
        assert_eq!(
            parse_json_response(text).unwrap().into_value(),
            json!({"a": "x", "b": "y"})
        );
    }

    #[test]
    fn test_braces_inside_strings_are_ignored() {
        let text = r#"{"a": "{not} a [brace", "b": 2, "c": "#;
        assert_eq!(
            parse_json_response(text).unwrap().into_value(),
            json!({"a": "{not} a [brace", "b": 2})
        );
    }

    #[test]
    fn test_unrecoverable_text_is_an_error() {
        assert!(parse_json_response("no json here").is_err());
        assert!(parse_json_response(r#"{"a": "#).is_err());
    }
}
