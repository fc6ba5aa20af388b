//! Extraction of structured analysis from free-form model output.
//!
//! Upstream services rarely return clean JSON. Output arrives wrapped in
//! markdown fences, tucked inside a tagged block, embedded mid-sentence,
//! or with the usual LLM damage (trailing commas, unclosed brackets).
//! This module locates the structured block — by configured marker tag
//! first, then by scanning for the first balanced `{…}` region — and
//! applies light deterministic repairs before parsing.
//!
//! When no structured block can be recovered at all, extraction falls
//! back to plain text: first prose line as the summary, bullet lines as
//! impact points, confidence lowered to the fallback floor. Providers
//! therefore never fail on malformed output, only on transport errors.

use serde_json::Value;
use tracing::debug;

/// Confidence assigned when the provider supplied a structured block
/// but no explicit confidence value.
const STRUCTURED_DEFAULT_CONFIDENCE: f32 = 0.7;

/// Confidence floor for plain-text fallback extraction.
const FALLBACK_CONFIDENCE: f32 = 0.3;

/// Fields recovered from provider output, before normalization into a
/// full response.
#[derive(Debug, Clone)]
pub(crate) struct ParsedAnalysis {
    pub summary: String,
    pub impact_points: Vec<String>,
    pub confidence: f32,
    pub sentiment: Option<String>,
    /// Whether a structured block was recovered (vs. plain-text fallback).
    pub structured: bool,
}

/// Parse provider output into analysis fields.
///
/// Never fails: output without a usable structured block degrades to the
/// plain-text fallback with lowered confidence.
pub(crate) fn parse_analysis(content: &str, marker: Option<&str>) -> ParsedAnalysis {
    if let Some(value) = extract_block(content, marker) {
        if let Some(parsed) = analysis_fields(&value) {
            return parsed;
        }
        debug!("structured block found but carried no analysis fields");
    }
    best_effort_from_text(content)
}

/// Locate and parse the structured block inside `content`.
///
/// Resolution order: tagged block (when a marker is configured), whole
/// cleaned content, first balanced brace region.
pub(crate) fn extract_block(content: &str, marker: Option<&str>) -> Option<Value> {
    let cleaned = strip_code_fences(content.trim());

    if let Some(tag) = marker {
        if let Some(inner) = tagged_block(&cleaned, tag) {
            if let Some(value) = parse_lenient(inner) {
                return Some(value);
            }
        }
    }

    if let Some(value) = parse_lenient(&cleaned) {
        return Some(value);
    }

    balanced_brace_region(&cleaned).and_then(parse_lenient)
}

/// Strip a wrapping markdown code fence (```json … ```), if present.
fn strip_code_fences(s: &str) -> String {
    let mut result = s.to_string();
    if result.starts_with("```") {
        if let Some(first_newline) = result.find('\n') {
            result = result[first_newline + 1..].to_string();
        }
    }
    if result.ends_with("```") {
        result = result[..result.len() - 3].trim_end().to_string();
    }
    result
}

/// Find the content between `<tag>` and `</tag>`.
fn tagged_block<'a>(s: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = s.find(&open)? + open.len();
    let end = s[start..].find(&close)? + start;
    Some(s[start..end].trim())
}

/// Parse JSON, retrying once after trailing-comma and bracket repairs.
fn parse_lenient(s: &str) -> Option<Value> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return value.is_object().then_some(value);
    }
    let repaired = balance_brackets(&fix_trailing_commas(trimmed));
    serde_json::from_str::<Value>(&repaired)
        .ok()
        .filter(Value::is_object)
}

/// Slice out the first balanced `{…}` region, tracking string literals
/// so braces inside quoted text do not confuse the depth count. An
/// unterminated region runs to the end of input; bracket repair closes
/// it afterwards.
fn balanced_brace_region(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape = false;

    for (offset, ch) in s[start..].char_indices() {
        if escape {
            escape = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    Some(&s[start..])
}

/// Remove commas that directly precede a closing bracket.
fn fix_trailing_commas(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == ',' {
            let mut j = i + 1;
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }
            if j < chars.len() && (chars[j] == ']' || chars[j] == '}') {
                i += 1;
                continue;
            }
        }
        result.push(chars[i]);
        i += 1;
    }
    result
}

/// Append missing closers for unbalanced braces and brackets.
fn balance_brackets(s: &str) -> String {
    let mut brace_count = 0i32;
    let mut bracket_count = 0i32;
    let mut in_string = false;
    let mut escape = false;

    for ch in s.chars() {
        if escape {
            escape = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape = true,
            '"' => in_string = !in_string,
            '{' if !in_string => brace_count += 1,
            '}' if !in_string => brace_count -= 1,
            '[' if !in_string => bracket_count += 1,
            ']' if !in_string => bracket_count -= 1,
            _ => {}
        }
    }

    let mut result = s.to_string();
    if in_string {
        result.push('"');
    }
    for _ in 0..bracket_count.max(0) {
        result.push(']');
    }
    for _ in 0..brace_count.max(0) {
        result.push('}');
    }
    result
}

/// Map a parsed JSON object onto analysis fields.
///
/// Returns `None` when the object carries neither a summary nor impact
/// points, in which case plain-text fallback does better.
fn analysis_fields(value: &Value) -> Option<ParsedAnalysis> {
    let summary = value
        .get("summary")
        .or_else(|| value.get("summary_text"))
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim()
        .to_string();

    let impact_points: Vec<String> = value
        .get("impact_points")
        .or_else(|| value.get("points"))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();

    if summary.is_empty() && impact_points.is_empty() {
        return None;
    }

    let confidence = value
        .get("confidence")
        .and_then(Value::as_f64)
        .map(|c| (c as f32).clamp(0.0, 1.0))
        .unwrap_or(STRUCTURED_DEFAULT_CONFIDENCE);

    let sentiment = value
        .get("sentiment")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    Some(ParsedAnalysis {
        summary,
        impact_points,
        confidence,
        sentiment,
        structured: true,
    })
}

/// Best-effort extraction from plain prose: bullet lines become impact
/// points, the first non-bullet line becomes the summary.
fn best_effort_from_text(content: &str) -> ParsedAnalysis {
    let cleaned = strip_code_fences(content.trim());
    let mut summary = String::new();
    let mut impact_points = Vec::new();

    for line in cleaned.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(point) = bullet_text(trimmed) {
            impact_points.push(point.to_string());
        } else if summary.is_empty() {
            summary = trimmed.to_string();
        }
    }

    ParsedAnalysis {
        summary,
        impact_points,
        confidence: FALLBACK_CONFIDENCE,
        sentiment: None,
        structured: false,
    }
}

/// Text after a leading bullet or numbered marker, if the line has one.
fn bullet_text(line: &str) -> Option<&str> {
    if let Some(rest) = line
        .strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .or_else(|| line.strip_prefix("• "))
    {
        return Some(rest.trim());
    }
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(stripped) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            return Some(stripped.trim());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_clean_json() {
        let content = r#"{"summary": "ETF approved.", "impact_points": ["buyers increase"], "confidence": 0.9}"#;
        let parsed = parse_analysis(content, None);
        assert!(parsed.structured);
        assert_eq!(parsed.summary, "ETF approved.");
        assert_eq!(parsed.impact_points, vec!["buyers increase"]);
        assert!((parsed.confidence - 0.9).abs() < 0.001);
    }

    #[test]
    fn strips_markdown_fences() {
        let content = "```json\n{\"summary\": \"fenced\", \"impact_points\": []}\n```";
        let parsed = parse_analysis(content, None);
        assert!(parsed.structured);
        assert_eq!(parsed.summary, "fenced");
    }

    #[test]
    fn finds_tagged_block() {
        let content = "Preamble text.\n<analysis>{\"summary\": \"tagged\", \"impact_points\": [\"a\", \"b\"]}</analysis>\nPostscript.";
        let parsed = parse_analysis(content, Some("analysis"));
        assert!(parsed.structured);
        assert_eq!(parsed.summary, "tagged");
        assert_eq!(parsed.impact_points.len(), 2);
    }

    #[test]
    fn scans_first_balanced_brace_region() {
        let content = "The result is {\"summary\": \"embedded {braces} inside\", \"impact_points\": [\"x\"]} as requested.";
        let parsed = parse_analysis(content, None);
        assert!(parsed.structured);
        assert_eq!(parsed.summary, "embedded {braces} inside");
    }

    #[test]
    fn repairs_trailing_commas_and_missing_closers() {
        let content = r#"{"summary": "damaged", "impact_points": ["one", "two",]"#;
        let parsed = parse_analysis(content, None);
        assert!(parsed.structured);
        assert_eq!(parsed.summary, "damaged");
        assert_eq!(parsed.impact_points, vec!["one", "two"]);
    }

    #[test]
    fn defaults_confidence_when_absent() {
        let content = r#"{"summary": "no confidence", "impact_points": ["x"]}"#;
        let parsed = parse_analysis(content, None);
        assert!((parsed.confidence - STRUCTURED_DEFAULT_CONFIDENCE).abs() < 0.001);
    }

    #[test]
    fn falls_back_to_plain_text() {
        let content = "Markets reacted sharply to the approval.\n- buyers increase\n- supply tightens";
        let parsed = parse_analysis(content, None);
        assert!(!parsed.structured);
        assert_eq!(parsed.summary, "Markets reacted sharply to the approval.");
        assert_eq!(parsed.impact_points, vec!["buyers increase", "supply tightens"]);
        assert!((parsed.confidence - FALLBACK_CONFIDENCE).abs() < 0.001);
    }

    #[test]
    fn fallback_handles_numbered_lists() {
        let content = "Summary line.\n1. first effect\n2) second effect";
        let parsed = parse_analysis(content, None);
        assert_eq!(parsed.impact_points, vec!["first effect", "second effect"]);
    }

    #[test]
    fn object_without_analysis_fields_falls_back() {
        let content = r#"{"error": "quota exceeded"} Plain explanation line."#;
        let parsed = parse_analysis(content, None);
        assert!(!parsed.structured);
    }
}
