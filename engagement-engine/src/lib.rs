//! Engagement metrics for host posts: reading counts out of accessibility labels,
//! bucketing view counts into display tiers and scoring engagement ratios.

pub mod classifier;
pub mod metrics;

pub use classifier::*;
pub use metrics::*;
