use serde::Serialize;
use xbird_core::{ClientConfig, GenerationRequest, Mood};

const BASE_INSTRUCTIONS: [&str; 3] = [
    "You are a Twitter reply expert. Generate engaging, concise replies.",
    "Keep replies under 100 characters when possible.",
    "DO NOT use hashtags or excessive emojis.",
];

/// Tone lines switched on as the intensity reaches each breakpoint.
const GRADUATED_INSTRUCTIONS: [(u8, &str); 4] = [
    (20, "Make replies slightly controversial or attention-grabbing."),
    (40, "Be more casual and use internet slang occasionally."),
    (60, "Use controversial takes and unexpected angles."),
    (80, "Be extremely casual, use slang like 'imo', 'tbh', 'ngl'."),
];

pub const END_OF_TURN: &str = "<|im_end|>";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationPayload {
    pub inputs: String,
    pub parameters: GenerationParameters,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationParameters {
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub return_full_text: bool,
    pub do_sample: bool,
}

pub fn system_instruction(intensity: u8) -> String {
    BASE_INSTRUCTIONS
        .into_iter()
        .chain(
            GRADUATED_INSTRUCTIONS
                .into_iter()
                .filter(|(breakpoint, _)| intensity >= *breakpoint)
                .map(|(_, line)| line),
        )
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn user_instruction(request: &GenerationRequest) -> String {
    let mut parts = Vec::with_capacity(3);

    let intent = request.intent.trim();
    if !intent.is_empty() {
        parts.push(format!("Context: {intent}"));
    }
    if request.mood != Mood::Auto {
        parts.push(format!("Tone: {}", request.mood));
    }
    parts.push(format!(
        "Generate a Twitter reply to: \"{}\"",
        request.post_text
    ));

    parts.join(" ")
}

pub fn build_payload(request: &GenerationRequest, config: &ClientConfig) -> GenerationPayload {
    let system = system_instruction(request.intensity.value());
    let user = user_instruction(request);

    GenerationPayload {
        inputs: format!(
            "<|im_start|>system\n{system}\n{END_OF_TURN}\n<|im_start|>user\n{user}\n{END_OF_TURN}\n<|im_start|>assistant"
        ),
        parameters: GenerationParameters {
            max_new_tokens: config.max_new_tokens,
            temperature: config.temperature,
            return_full_text: false,
            do_sample: true,
        },
    }
}
