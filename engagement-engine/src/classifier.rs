use crate::metrics::EngagementCounts;
use serde::{Deserialize, Serialize};

/// Visual severity bucket of a post, derived from its view count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    Low,
    Medium,
    High,
    Viral,
}

pub fn classify_tier(views: u64) -> Tier {
    match views {
        v if v >= 100_000 => Tier::Viral,
        v if v >= 50_000 => Tier::High,
        v if v >= 10_000 => Tier::Medium,
        _ => Tier::Low,
    }
}

impl Tier {
    pub fn background(&self) -> &'static str {
        match self {
            Tier::Viral => "hsl(0, 72%, 45%)",
            Tier::High => "hsl(30, 100%, 50%)",
            Tier::Medium => "hsl(45, 100%, 50%)",
            Tier::Low => "hsl(221.2 83.2% 53.3%)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierStyle {
    pub tier: Tier,
    pub background: String,
    /// Opacity rendered with two decimals, e.g. `"0.95"`.
    pub opacity: String,
}

pub fn tier_style(views: u64) -> TierStyle {
    let tier = classify_tier(views);
    let opacity = (0.7 + views as f64 / 100_000.0).min(0.95);
    TierStyle {
        tier,
        background: tier.background().to_string(),
        opacity: format!("{opacity:.2}"),
    }
}

/// The four ratios the engagement score is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ratio {
    ViewsPerLike,
    LikesPerReply,
    RepostsPerReply,
    BookmarksPerReply,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementScore {
    pub score: u8,
    pub reason: String,
    /// Ratios skipped because a count was missing or a divisor was zero.
    pub not_applicable: Vec<Ratio>,
}

impl EngagementScore {
    pub fn neutral() -> Self {
        Self {
            score: BASE_SCORE as u8,
            reason: UNABLE_TO_ANALYZE.to_string(),
            not_applicable: Vec::new(),
        }
    }

    pub fn band(&self) -> ScoreBand {
        match self.score {
            s if s > 70 => ScoreBand::Strong,
            s if s > 40 => ScoreBand::Moderate,
            _ => ScoreBand::Weak,
        }
    }
}

/// Colouring bucket for the score panel in the popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Strong,
    Moderate,
    Weak,
}

impl ScoreBand {
    pub fn background(&self) -> &'static str {
        match self {
            ScoreBand::Strong => "rgb(7 59 0)",
            ScoreBand::Moderate => "rgb(59 7 0)",
            ScoreBand::Weak => "rgb(59 0 0)",
        }
    }
}

const BASE_SCORE: i32 = 50;
pub const STRONG_SCORE_THRESHOLD: u8 = 60;

pub const UNABLE_TO_ANALYZE: &str = "Unable to analyze metrics";
const NOT_ENOUGH_DATA: &str = "Not enough engagement data to analyze";
const GOOD_ENGAGEMENT: &str = "Good engagement: Likes are proportional to views";
const LOW_CONVERSION: &str = "Low conversion: Many views but relatively few likes";
const HIGH_LIKES_PER_REPLY: &str = "High likes per reply ratio indicates strong engagement";
const HIGH_REPOSTS_PER_REPLY: &str = "High reposts per reply ratio shows good content sharing";
const GOOD_BOOKMARKING: &str = "Good bookmarking rate indicates valuable content";

fn ratio(numerator: Option<u64>, divisor: Option<u64>) -> Option<f64> {
    match (numerator, divisor) {
        (Some(n), Some(d)) if d > 0 => Some(n as f64 / d as f64),
        _ => None,
    }
}

/// Heuristic 0–100 success score; pure and deterministic for a given input.
pub fn score_engagement(counts: &EngagementCounts) -> EngagementScore {
    let mut score = BASE_SCORE;
    let mut messages: Vec<&'static str> = Vec::new();
    let mut not_applicable = Vec::new();

    match ratio(counts.views, counts.likes) {
        Some(r) if r < 100.0 => {
            score += 20;
            messages.push(GOOD_ENGAGEMENT);
        }
        Some(_) => {
            score -= 30;
            messages.push(LOW_CONVERSION);
        }
        None => not_applicable.push(Ratio::ViewsPerLike),
    }

    let per_reply = [
        (Ratio::LikesPerReply, counts.likes, 20.0, 15, HIGH_LIKES_PER_REPLY),
        (Ratio::RepostsPerReply, counts.reposts, 3.0, 10, HIGH_REPOSTS_PER_REPLY),
        (Ratio::BookmarksPerReply, counts.bookmarks, 0.8, 5, GOOD_BOOKMARKING),
    ];
    for (kind, numerator, threshold, delta, message) in per_reply {
        match ratio(numerator, counts.replies) {
            Some(r) if r > threshold => {
                score += delta;
                messages.push(message);
            }
            Some(_) => {}
            None => not_applicable.push(kind),
        }
    }

    let score = score.clamp(0, 100) as u8;

    let preferred = if score >= STRONG_SCORE_THRESHOLD {
        "strong engagement"
    } else {
        "Low conversion"
    };
    let reason = messages
        .iter()
        .find(|m| m.contains(preferred))
        .or_else(|| messages.first())
        .copied()
        .unwrap_or(NOT_ENOUGH_DATA);

    EngagementScore {
        score,
        reason: reason.to_string(),
        not_applicable,
    }
}

/// Scores a raw metrics label; `None` gives the neutral result.
pub fn score_label(label: Option<&str>) -> EngagementScore {
    match label {
        Some(label) => score_engagement(&EngagementCounts::from_label(label)),
        None => EngagementScore::neutral(),
    }
}
