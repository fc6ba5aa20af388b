//! Quality validator tests: scoring rules, the validity conditions,
//! and deterministic repair.

use huginn::{AnalysisResponse, QualitySettings, QualityValidator};

fn validator() -> QualityValidator {
    QualityValidator::new(QualitySettings::default())
}

fn response(summary: &str, points: Vec<&str>) -> AnalysisResponse {
    AnalysisResponse {
        summary: summary.to_string(),
        impact_points: points.into_iter().map(String::from).collect(),
        confidence: 0.85,
        sentiment: None,
        provider: "test".into(),
        raw: None,
    }
}

#[test]
fn well_formed_response_is_valid() {
    let score = validator().validate(&response(
        "ETF approval opens regulated exposure for institutions.",
        vec![
            "buyers increase because funds can allocate",
            "supply tightens due to custodial lockup",
        ],
    ));
    assert!(score.is_valid);
    assert!(score.issues.is_empty());
}

#[test]
fn validation_is_idempotent() {
    let payload = response(
        "Hard to predict, it depends on flows.",
        vec!["buyers may or may not increase", "time will tell"],
    );
    let v = validator();
    let first = v.validate(&payload);
    let second = v.validate(&payload);

    assert_eq!(first.score, second.score);
    assert_eq!(first.issues, second.issues);
    assert_eq!(first.is_valid, second.is_valid);
}

#[test]
fn missing_summary_fails_structurally() {
    let score = validator().validate(&response("  ", vec!["a point", "another point"]));
    assert!(!score.is_valid);
    assert_eq!(score.issues, vec!["missing summary"]);
    assert_eq!(score.score, 0.0);
}

#[test]
fn insufficient_impact_points_fails_and_cannot_be_repaired() {
    // The concrete rejection scenario: one point where two are required.
    let payload = response("ETF approved.", vec!["buyers increase"]);
    let v = validator();

    let score = v.validate(&payload);
    assert!(!score.is_valid);
    assert!(score.issues.iter().any(|i| i == "insufficient impact points"));

    // Repair cannot invent a second point.
    assert!(v.fix(&payload).is_none());
}

#[test]
fn hedging_language_is_penalised_per_occurrence() {
    let v = validator();
    let concrete = v.validate(&response(
        "Inflows rise because allocation mandates unlock.",
        vec!["buyers increase", "supply tightens"],
    ));
    let hedged = v.validate(&response(
        "It depends on flows and time will tell, it depends on macro.",
        vec!["hard to predict anything here", "could go either way"],
    ));
    assert!(hedged.score < concrete.score);
    assert!(hedged.issues.iter().any(|i| i.contains("hedging")));
}

#[test]
fn specificity_language_earns_a_bonus() {
    let v = validator();
    let plain = v.validate(&response(
        "Inflows rise on the approval.",
        vec!["buyers increase", "supply tightens"],
    ));
    let specific = v.validate(&response(
        "Inflows rise because allocation mandates unlock, compared to prior cycles.",
        vec!["buyers increase due to fund demand", "supply tightens"],
    ));
    assert!(specific.score > plain.score);
}

#[test]
fn sentiment_bonus_and_penalty() {
    let v = validator();
    let base = response(
        "Inflows rise on the approval.",
        vec!["buyers increase", "supply tightens"],
    );

    let mut labelled = base.clone();
    labelled.sentiment = Some("Bullish".into());
    let mut mislabelled = base.clone();
    mislabelled.sentiment = Some("rocket".into());

    let neutral_score = v.validate(&base).score;
    assert!(v.validate(&labelled).score > neutral_score);

    let bad = v.validate(&mislabelled);
    assert!(bad.score < neutral_score);
    assert!(bad.issues.iter().any(|i| i.contains("sentiment")));
}

#[test]
fn issue_cap_blocks_validity_even_with_a_passing_score() {
    // Threshold set to zero: the score always clears, so only the
    // issue cap can fail the response. Both conditions are required.
    let settings = QualitySettings {
        min_score: 0.0,
        max_issues: 1,
        ..QualitySettings::default()
    };
    let v = QualityValidator::new(settings);

    let mut payload = response(
        "Short.",
        vec![
            "one", "two", "three", "four", "five", "six",
        ],
    );
    payload.sentiment = Some("rocket".into());

    let score = v.validate(&payload);
    assert!(score.issues.len() > 1);
    assert!(!score.is_valid);
}

#[test]
fn fix_strips_boilerplate_markers_and_bad_labels() {
    let mut payload = response(
        "Sure, here is the analysis of the approval.",
        vec!["- buyers increase", "* supply tightens", "1. volatility spikes"],
    );
    payload.sentiment = Some("rocket".into());
    payload.confidence = 1.7;

    let fixed = validator().fix(&payload).expect("structure is repairable");
    assert_eq!(fixed.summary, "the analysis of the approval.");
    assert_eq!(
        fixed.impact_points,
        vec!["buyers increase", "supply tightens", "volatility spikes"]
    );
    assert_eq!(fixed.sentiment, None);
    assert!(fixed.confidence <= 1.0);
}

#[test]
fn fix_preserves_recognised_sentiment_canonically() {
    let mut payload = response(
        "Inflows rise on the approval.",
        vec!["buyers increase", "supply tightens"],
    );
    payload.sentiment = Some("  BULLISH ".into());

    let fixed = validator().fix(&payload).unwrap();
    assert_eq!(fixed.sentiment.as_deref(), Some("bullish"));
}

#[test]
fn fix_truncates_over_length_text_at_word_boundaries() {
    let long_summary = "word ".repeat(200);
    let long_point = "detail ".repeat(50);
    let payload = response(&long_summary, vec![long_point.as_str(), "short point"]);

    let fixed = validator().fix(&payload).unwrap();
    assert!(fixed.summary.chars().count() <= 500);
    assert!(!fixed.summary.ends_with(' '));
    assert!(fixed.impact_points[0].chars().count() <= 200);
}

#[test]
fn fix_clamps_point_count_to_the_maximum() {
    let payload = response(
        "A perfectly reasonable summary.",
        vec!["1", "2", "3", "4", "5", "6", "7"],
    );
    let fixed = validator().fix(&payload).unwrap();
    assert_eq!(fixed.impact_points.len(), 5);
}

#[test]
fn fix_gives_up_when_summary_is_pure_boilerplate() {
    let payload = response("Sure, here is ", vec!["a point", "another point"]);
    assert!(validator().fix(&payload).is_none());
}

#[test]
fn fix_is_deterministic() {
    let mut payload = response(
        "Sure, here is the analysis.",
        vec!["- buyers increase", "- supply tightens"],
    );
    payload.sentiment = Some("weird".into());

    let v = validator();
    let once = v.fix(&payload).unwrap();
    let twice = v.fix(&payload).unwrap();
    assert_eq!(once.summary, twice.summary);
    assert_eq!(once.impact_points, twice.impact_points);
}
