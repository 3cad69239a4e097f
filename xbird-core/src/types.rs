use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a host post, taken from the `/status/<id>` segment of its permalink.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PostId(String);

impl PostId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Extracts the id from a permalink such as `https://x.com/user/status/123/photo/1`.
    pub fn from_permalink(href: &str) -> Option<Self> {
        let (_, rest) = href.split_once("/status/")?;
        let id = rest.split(['/', '?', '#']).next()?.trim();
        if id.is_empty() {
            None
        } else {
            Some(Self(id.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Read-only snapshot of a post in the host feed.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: PostId,
    pub text: String,
    pub metrics_label: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Mood {
    #[default]
    Auto,
    Agree,
    Disagree,
    Motivate,
    Roast,
    Cute,
}

impl Mood {
    pub const ALL: [Mood; 6] = [
        Mood::Auto,
        Mood::Agree,
        Mood::Disagree,
        Mood::Motivate,
        Mood::Roast,
        Mood::Cute,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Auto => "Auto",
            Mood::Agree => "Agree",
            Mood::Disagree => "Disagree",
            Mood::Motivate => "Motivate",
            Mood::Roast => "Roast",
            Mood::Cute => "Cute",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mood::ALL
            .into_iter()
            .find(|mood| mood.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown mood: {s}"))
    }
}

/// Tone intensity in `0..=100`; out-of-range input is clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct Intensity(u8);

impl Intensity {
    pub const MAX: u8 = 100;

    pub fn new(value: i64) -> Self {
        Self(value.clamp(0, Self::MAX as i64) as u8)
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl Default for Intensity {
    fn default() -> Self {
        Self(50)
    }
}

impl From<i64> for Intensity {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl From<Intensity> for u8 {
    fn from(value: Intensity) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub post_text: String,
    pub intent: String,
    pub mood: Mood,
    pub intensity: Intensity,
}

/// Persisted extension settings, serialized with the extension's storage field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionSettings {
    #[serde(default)]
    pub brainrot_intensity: Intensity,
    #[serde(default)]
    pub default_mood: Mood,
    #[serde(default = "default_enabled")]
    pub extension_enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Default for ExtensionSettings {
    fn default() -> Self {
        Self {
            brainrot_intensity: Intensity::default(),
            default_mood: Mood::Auto,
            extension_enabled: true,
        }
    }
}
