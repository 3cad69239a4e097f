//! Normalizing the generation endpoint's response bodies.
//!
//! The endpoint answers in several shapes depending on the model and backend. Each
//! shape is an entry in [`SHAPE_MATCHERS`]; matchers are tried in order and the first
//! one that recognizes the body decides the outcome. New provider shapes are added
//! by appending a matcher.

use crate::prompt::END_OF_TURN;
use serde_json::Value;
use tracing::{debug, warn};
use xbird_core::GenerationFailure;

type ShapeMatcher = fn(&Value) -> Option<Result<String, GenerationFailure>>;

pub const SHAPE_MATCHERS: &[(&str, ShapeMatcher)] = &[
    ("sequence", match_sequence),
    ("generated_text", match_generated_text),
    ("choices", match_choices),
    ("raw_string", match_raw_string),
    ("model_loading", match_model_loading),
    ("provider_error", match_provider_error),
];

const PREVIEW_CHARS: usize = 200;

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}

fn match_sequence(body: &Value) -> Option<Result<String, GenerationFailure>> {
    let first = body.as_array()?.first()?;
    non_empty_str(first.get("generated_text")?).map(|text| Ok(text.to_string()))
}

fn match_generated_text(body: &Value) -> Option<Result<String, GenerationFailure>> {
    let text = non_empty_str(body.as_object()?.get("generated_text")?)?;
    Some(Ok(text.to_string()))
}

fn match_choices(body: &Value) -> Option<Result<String, GenerationFailure>> {
    let choice = body.get("choices")?.as_array()?.first()?;
    choice
        .get("message")
        .and_then(|message| message.get("content"))
        .and_then(non_empty_str)
        .or_else(|| choice.get("text").and_then(non_empty_str))
        .map(|text| Ok(text.to_string()))
}

fn match_raw_string(body: &Value) -> Option<Result<String, GenerationFailure>> {
    body.as_str().map(|text| Ok(text.to_string()))
}

fn match_model_loading(body: &Value) -> Option<Result<String, GenerationFailure>> {
    let estimated = body.as_object()?.get("estimated_time")?;
    Some(Err(GenerationFailure::ModelLoading {
        estimated_secs: estimated.as_f64(),
    }))
}

fn match_provider_error(body: &Value) -> Option<Result<String, GenerationFailure>> {
    let error = body.as_object()?.get("error")?;
    let detail = match error {
        Value::String(message) => message.clone(),
        other => other.to_string(),
    };
    Some(Err(GenerationFailure::RequestFailed {
        detail: format!("provider error: {detail}"),
    }))
}

fn preview(raw: &str) -> String {
    let mut preview: String = raw.chars().take(PREVIEW_CHARS).collect();
    if raw.chars().count() > PREVIEW_CHARS {
        preview.push_str("...");
    }
    preview
}

/// Maps a parsed body to reply text or a classified failure.
pub fn normalize(body: &Value) -> Result<String, GenerationFailure> {
    for (name, matcher) in SHAPE_MATCHERS {
        if let Some(outcome) = matcher(body) {
            debug!("Response matched shape '{}'", name);
            return outcome;
        }
    }

    let raw = body.to_string();
    warn!("Unexpected API response format: {}", preview(&raw));
    Err(GenerationFailure::UnexpectedFormat {
        preview: preview(&raw),
    })
}

/// Parses and normalizes a raw success body.
pub fn normalize_body(raw: &str) -> Result<String, GenerationFailure> {
    match serde_json::from_str::<Value>(raw) {
        Ok(body) => normalize(&body),
        Err(e) => {
            warn!("Response body is not JSON: {}", e);
            Err(GenerationFailure::UnexpectedFormat {
                preview: preview(raw),
            })
        }
    }
}

/// Cuts at the first end-of-turn marker, trims, and caps the length in characters.
pub fn post_process(text: &str, max_chars: usize) -> String {
    let before_marker = match text.find(END_OF_TURN) {
        Some(index) => &text[..index],
        None => text,
    };
    before_marker.trim().chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sequence_shape() {
        let body = json!([{ "generated_text": "hot take incoming" }]);
        assert_eq!(normalize(&body), Ok("hot take incoming".to_string()));
    }

    #[test]
    fn test_object_shape() {
        let body = json!({ "generated_text": "fair point" });
        assert_eq!(normalize(&body), Ok("fair point".to_string()));
    }

    #[test]
    fn test_choices_shapes() {
        let chat = json!({ "choices": [{ "message": { "role": "assistant", "content": "ngl this slaps" } }] });
        assert_eq!(normalize(&chat), Ok("ngl this slaps".to_string()));

        let completion = json!({ "choices": [{ "text": "tbh agreed" }] });
        assert_eq!(normalize(&completion), Ok("tbh agreed".to_string()));
    }

    #[test]
    fn test_raw_string_shape() {
        assert_eq!(normalize_body("\"just text\""), Ok("just text".to_string()));
    }

    #[test]
    fn test_loading_shape_wins_over_error_field() {
        let body = json!({ "error": "Model is currently loading", "estimated_time": 20.5 });
        assert_eq!(
            normalize(&body),
            Err(GenerationFailure::ModelLoading {
                estimated_secs: Some(20.5)
            })
        );
    }

    #[test]
    fn test_provider_error_shape() {
        let body = json!({ "error": "Input validation error" });
        assert_eq!(
            normalize(&body),
            Err(GenerationFailure::RequestFailed {
                detail: "provider error: Input validation error".to_string()
            })
        );
    }

    #[test]
    fn test_unrecognized_shapes() {
        for body in [json!({ "output": "?" }), json!([]), json!([{ "text": "x" }]), json!(42)] {
            assert!(matches!(
                normalize(&body),
                Err(GenerationFailure::UnexpectedFormat { .. })
            ));
        }
        assert!(matches!(
            normalize_body("<html>bad gateway</html>"),
            Err(GenerationFailure::UnexpectedFormat { .. })
        ));
    }

    #[test]
    fn test_empty_text_falls_through() {
        let body = json!({ "generated_text": "" });
        assert!(matches!(
            normalize(&body),
            Err(GenerationFailure::UnexpectedFormat { .. })
        ));
    }

    #[test]
    fn test_post_process() {
        assert_eq!(
            post_process("  so true <|im_end|> trailing junk\nmore", 280),
            "so true"
        );
        assert_eq!(post_process("\n\nclean\n", 280), "clean");

        let long = "é".repeat(400);
        assert_eq!(post_process(&long, 280).chars().count(), 280);
    }
}
