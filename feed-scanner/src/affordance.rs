use engagement_engine::{tier_style, Tier, TierStyle};
use xbird_core::Post;

pub const AFFORDANCE_LABEL: &str = "Generate Reply";

/// The inline "generate reply" control attached to an eligible post.
#[derive(Debug, Clone, PartialEq)]
pub struct Affordance {
    pub post: Post,
    pub view_count: u64,
    pub style: TierStyle,
    pub title: String,
}

impl Affordance {
    pub fn new(post: Post, view_count: u64) -> Self {
        Self {
            post,
            view_count,
            style: tier_style(view_count),
            title: format!("Post Views: {}", group_thousands(view_count)),
        }
    }

    pub fn tier(&self) -> Tier {
        self.style.tier
    }

    pub fn label(&self) -> &'static str {
        AFFORDANCE_LABEL
    }
}

/// Formats a count with comma thousands separators, e.g. `75000` as `75,000`.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use xbird_core::PostId;

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(75000), "75,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[test]
    fn test_affordance_title_and_tier() {
        let post = Post {
            id: PostId::new("42"),
            text: "hello".to_string(),
            metrics_label: None,
        };
        let affordance = Affordance::new(post, 75000);
        assert_eq!(affordance.title, "Post Views: 75,000");
        assert_eq!(affordance.tier(), Tier::High);
        assert_eq!(affordance.style.opacity, "0.95");
    }
}
