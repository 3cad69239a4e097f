//! Reading engagement counts out of a post's accessibility label.
//!
//! Labels look like `"3 replies, 12 reposts, 450 likes, 20 bookmarks, 75000 views"`.

/// Returns the count of the last comma-separated phrase that contains `marker`.
///
/// Non-digits in that phrase are treated as separators and the first run of digits
/// wins. A missing phrase, a phrase without digits, or a count that does not fit in
/// a `u64` all yield `None`.
pub fn extract_count(label: &str, marker: &str) -> Option<u64> {
    let phrase = label
        .split(',')
        .map(str::trim)
        .rev()
        .find(|phrase| phrase.contains(marker))?;

    first_digit_run(phrase)
}

fn first_digit_run(phrase: &str) -> Option<u64> {
    phrase
        .split(|c: char| !c.is_ascii_digit())
        .find(|run| !run.is_empty())
        .and_then(|run| run.parse().ok())
}

/// Per-metric counts; a metric missing from the label stays `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngagementCounts {
    pub replies: Option<u64>,
    pub reposts: Option<u64>,
    pub likes: Option<u64>,
    pub bookmarks: Option<u64>,
    pub views: Option<u64>,
}

impl EngagementCounts {
    /// Reads every known metric from the label by keyword, in any order.
    pub fn from_label(label: &str) -> Self {
        let mut counts = Self::default();

        for phrase in label.split(',').map(str::trim) {
            let lower = phrase.to_ascii_lowercase();
            let Some(count) = first_digit_run(&lower) else {
                continue;
            };

            let slot = if lower.contains("repl") {
                &mut counts.replies
            } else if lower.contains("repost") || lower.contains("retweet") {
                &mut counts.reposts
            } else if lower.contains("like") {
                &mut counts.likes
            } else if lower.contains("bookmark") {
                &mut counts.bookmarks
            } else if lower.contains("view") {
                &mut counts.views
            } else {
                continue;
            };
            slot.get_or_insert(count);
        }

        counts
    }
}
