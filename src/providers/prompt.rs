//! Prompt assembly shared by the HTTP provider kinds.

use crate::types::{AnalysisRequest, Role};

/// System instruction sent with every analysis request.
///
/// Providers are asked for a single JSON object; the extraction layer
/// tolerates everything from clean JSON to plain prose, so this is a
/// request, not a contract.
pub(crate) fn instruction(request: &AnalysisRequest, marker: Option<&str>) -> String {
    let mut text = String::from(
        "You are a market impact analyst. Analyse the user's text and respond with a \
         single JSON object: {\"summary\": string, \"impact_points\": [string], \
         \"confidence\": number between 0 and 1, \"sentiment\": \
         \"bullish\"|\"bearish\"|\"neutral\"}.",
    );
    if let Some(tag) = marker {
        text.push_str(&format!(" Wrap the JSON object in <{tag}>...</{tag}> tags."));
    }
    if !request.hints.is_empty() {
        text.push_str(&format!(
            " The caller classified this text as: {}.",
            request.hints.join(", ")
        ));
    }
    text
}

/// Flatten the request into a single prompt string, for providers that
/// take a prompt rather than a message list.
pub(crate) fn transcript(request: &AnalysisRequest, marker: Option<&str>) -> String {
    let mut prompt = instruction(request, marker);
    prompt.push_str("\n\n");
    for turn in &request.context {
        let speaker = match turn.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        prompt.push_str(&format!("{speaker}: {}\n", turn.content));
    }
    prompt.push_str(&format!("user: {}", request.text));
    prompt
}
