//! Prompt templates rendered with minijinja.

use minijinja::{Environment, context};
use mindease_core::MindEaseError;
use mindease_core::conversation::Turn;
use mindease_core::error::Result;
use mindease_core::mood::MoodLabel;
use serde::Serialize;
use strum::IntoEnumIterator;

const ANALYSIS_TEMPLATE: &str = r#"Based on our conversation so far, please provide a brief analysis of:
1. My current mood and emotional state
2. Whether my main concern or problem seems to be addressed
3. Three key insights from our conversation
4. Two personalized recommendations to help me further

Format as JSON: {"mood": "...", "problemSolved": true/false, "insights": ["...", "...", "..."], "recommendations": ["...", "..."]}
Only respond with the JSON, nothing else.

Conversation so far:
{% for line in transcript -%}
{{ line.speaker }}: {{ line.text }}
{% endfor %}"#;

const EMOTION_TEMPLATE: &str = r#"Classify the emotional state expressed in this message from a therapy session.
Choose exactly one mood from: {{ labels | join(", ") }}.
Rate its intensity from 0 (barely present) to 10 (overwhelming).
Respond with only a JSON object: {"mood": "<mood>", "intensity": <0-10>}

Message: {{ message }}"#;

#[derive(Serialize)]
struct TranscriptLine<'a> {
    speaker: &'static str,
    text: &'a str,
}

fn render(name: &'static str, source: &'static str, ctx: minijinja::Value) -> Result<String> {
    let mut env = Environment::new();
    env.add_template(name, source)
        .map_err(|e| MindEaseError::internal(format!("template '{}': {}", name, e)))?;
    env.get_template(name)
        .and_then(|template| template.render(ctx))
        .map_err(|e| MindEaseError::internal(format!("template '{}': {}", name, e)))
}

/// Renders the analysis instruction followed by the whole transcript.
pub fn analysis_prompt(transcript: &[Turn]) -> Result<String> {
    let lines: Vec<TranscriptLine<'_>> = transcript
        .iter()
        .map(|turn| TranscriptLine {
            speaker: turn.role().label(),
            text: turn.text(),
        })
        .collect();
    render("analysis", ANALYSIS_TEMPLATE, context! { transcript => lines })
}

/// Renders the single-message mood classification instruction.
pub fn emotion_prompt(message: &str) -> Result<String> {
    let labels: Vec<String> = MoodLabel::iter().map(|label| label.to_string()).collect();
    render(
        "emotion",
        EMOTION_TEMPLATE,
        context! { labels => labels, message => message },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_prompt_embeds_transcript_in_order() {
        let transcript = vec![
            Turn::assistant("Hello! How are you feeling today?").unwrap(),
            Turn::user("Work has been overwhelming").unwrap(),
        ];
        let prompt = analysis_prompt(&transcript).unwrap();

        assert!(prompt.contains("Only respond with the JSON, nothing else."));
        assert!(prompt.contains(r#""problemSolved": true/false"#));
        let assistant = prompt.find("Assistant: Hello! How are you feeling today?").unwrap();
        let user = prompt.find("User: Work has been overwhelming").unwrap();
        assert!(assistant < user);
    }

    #[test]
    fn emotion_prompt_lists_every_label() {
        let prompt = emotion_prompt("I keep worrying about exams").unwrap();
        assert!(prompt.contains("calm, happy, sad, anxious, angry, stressed, neutral"));
        assert!(prompt.ends_with("Message: I keep worrying about exams"));
    }
}
