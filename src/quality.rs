//! Rule-based quality scoring and repair of analysis responses.
//!
//! Validation starts from a baseline score and moves it per rule:
//! missing required structure fails immediately, length violations and
//! hedging language cost points, concrete language and a well-formed
//! sentiment label earn small bonuses. A response is valid only when
//! the cumulative score clears the configured threshold AND the issue
//! count stays under the cap, so many small problems cannot be bought
//! back by one large bonus.
//!
//! Repair is strictly deterministic: strip known boilerplate, cut
//! over-length text at a word boundary, remove list markers, drop
//! unrecognized sentiment labels, clamp the point count. If cleanup
//! cannot restore the minimum required structure, `fix` gives up and
//! returns `None` rather than inventing content.

use crate::config::QualitySettings;
use crate::types::{AnalysisResponse, QualityScore, Sentiment};

/// Baseline score before any rule is applied.
const BASELINE: f32 = 1.0;

/// Penalty for a length-bound violation.
const LENGTH_PENALTY: f32 = 0.15;

/// Penalty per hedging phrase occurrence.
const HEDGING_PENALTY: f32 = 0.1;

/// Bonus per specificity phrase, and its cap.
const SPECIFICITY_BONUS: f32 = 0.05;
const SPECIFICITY_BONUS_CAP: f32 = 0.15;

/// Bonus for a well-formed sentiment label; penalty for an unrecognized one.
const SENTIMENT_BONUS: f32 = 0.05;

/// Summary prefixes stripped during repair, matched case-insensitively.
const BOILERPLATE_PREFIXES: &[&str] = &[
    "sure, ",
    "sure! ",
    "certainly, ",
    "certainly! ",
    "here is ",
    "here's ",
    "as an ai language model, ",
    "as an ai, ",
    "summary:",
];

/// Scores responses against configured rules and attempts deterministic
/// repairs on the ones that fall short.
pub struct QualityValidator {
    settings: QualitySettings,
}

impl QualityValidator {
    /// Create a validator from quality settings.
    pub fn new(settings: QualitySettings) -> Self {
        Self { settings }
    }

    /// Score a response. Pure function of the payload and settings:
    /// the same input always yields the same score.
    pub fn validate(&self, response: &AnalysisResponse) -> QualityScore {
        let summary = response.summary.trim();

        // Required structure first; its absence short-circuits scoring.
        if summary.is_empty() {
            return QualityScore::structural_failure("missing summary", response.confidence);
        }
        if response.impact_points.len() < self.settings.min_impact_points {
            return QualityScore::structural_failure(
                "insufficient impact points",
                response.confidence,
            );
        }

        let mut score = BASELINE;
        let mut issues = Vec::new();

        let summary_chars = summary.chars().count();
        if summary_chars < self.settings.min_summary_chars {
            score -= LENGTH_PENALTY;
            issues.push("summary too short".to_string());
        } else if summary_chars > self.settings.max_summary_chars {
            score -= LENGTH_PENALTY;
            issues.push("summary too long".to_string());
        }

        if response.impact_points.len() > self.settings.max_impact_points {
            score -= LENGTH_PENALTY;
            issues.push("too many impact points".to_string());
        }

        let oversized_points = response
            .impact_points
            .iter()
            .filter(|p| p.chars().count() > self.settings.max_point_chars)
            .count();
        if oversized_points > 0 {
            score -= LENGTH_PENALTY;
            issues.push(format!("{oversized_points} impact point(s) over length bound"));
        }

        let prose = self.full_prose(response);
        let hedges = count_phrases(&prose, &self.settings.hedging_phrases);
        if hedges > 0 {
            score -= HEDGING_PENALTY * hedges as f32;
            issues.push(format!("hedging language ({hedges} occurrence(s))"));
        }

        let specifics = count_phrases(&prose, &self.settings.specificity_phrases);
        if specifics > 0 {
            score += (SPECIFICITY_BONUS * specifics as f32).min(SPECIFICITY_BONUS_CAP);
        }

        match response.sentiment.as_deref() {
            Some(label) if Sentiment::parse(label).is_some() => score += SENTIMENT_BONUS,
            Some(_) => {
                score -= SENTIMENT_BONUS;
                issues.push("unrecognized sentiment label".to_string());
            }
            None => {}
        }

        let score = score.clamp(0.0, BASELINE + SPECIFICITY_BONUS_CAP + SENTIMENT_BONUS);
        let is_valid =
            score >= self.settings.min_score && issues.len() <= self.settings.max_issues;

        QualityScore {
            score,
            issues,
            is_valid,
            confidence: response.confidence,
        }
    }

    /// Attempt a deterministic repair of a rejected response.
    ///
    /// Returns `None` when cleanup cannot restore the minimum required
    /// structure (an empty summary, or fewer usable impact points than
    /// the configured minimum).
    pub fn fix(&self, response: &AnalysisResponse) -> Option<AnalysisResponse> {
        let mut summary = strip_boilerplate(response.summary.trim());
        summary = truncate_at_word(&summary, self.settings.max_summary_chars);
        if summary.trim().is_empty() {
            return None;
        }

        let mut points: Vec<String> = response
            .impact_points
            .iter()
            .map(|p| strip_list_marker(p))
            .filter(|p| !p.is_empty())
            .map(|p| truncate_at_word(&p, self.settings.max_point_chars))
            .collect();
        if points.len() < self.settings.min_impact_points {
            return None;
        }
        points.truncate(self.settings.max_impact_points);

        let sentiment = response
            .sentiment
            .as_deref()
            .and_then(Sentiment::parse)
            .map(|s| s.as_str().to_string());

        Some(AnalysisResponse {
            summary,
            impact_points: points,
            confidence: response.confidence.clamp(0.0, 1.0),
            sentiment,
            provider: response.provider.clone(),
            raw: response.raw.clone(),
        })
    }

    fn full_prose(&self, response: &AnalysisResponse) -> String {
        let mut prose = response.summary.to_lowercase();
        for point in &response.impact_points {
            prose.push(' ');
            prose.push_str(&point.to_lowercase());
        }
        prose
    }
}

/// Count occurrences of every phrase in the (already lowercased) text.
fn count_phrases(text: &str, phrases: &[String]) -> usize {
    phrases
        .iter()
        .map(|phrase| text.matches(phrase.to_lowercase().as_str()).count())
        .sum()
}

/// Strip known boilerplate prefixes, repeatedly, preserving the rest.
fn strip_boilerplate(summary: &str) -> String {
    let mut rest = summary.trim();
    'outer: loop {
        let lowered = rest.to_lowercase();
        for prefix in BOILERPLATE_PREFIXES {
            if lowered.starts_with(prefix) {
                rest = rest[prefix.len()..].trim_start();
                continue 'outer;
            }
        }
        break;
    }
    // Re-capitalization is not attempted; content is left as-is.
    rest.to_string()
}

/// Strip a leading list marker ("- ", "* ", "• ", "1. ", "2) " …).
fn strip_list_marker(point: &str) -> String {
    let trimmed = point.trim();
    let without_symbol = trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "))
        .or_else(|| trimmed.strip_prefix("• "));
    if let Some(rest) = without_symbol {
        return rest.trim().to_string();
    }

    // Numbered markers: digits followed by '.' or ')'.
    let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &trimmed[digits..];
        if let Some(stripped) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            return stripped.trim().to_string();
        }
    }
    trimmed.to_string()
}

/// Truncate to at most `max_chars` characters, cutting at the last word
/// boundary that fits. Falls back to a hard cut for a single long word.
fn truncate_at_word(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let hard: String = text.chars().take(max_chars).collect();
    match hard.rfind(char::is_whitespace) {
        Some(idx) if idx > 0 => hard[..idx].trim_end().to_string(),
        _ => hard,
    }
}
