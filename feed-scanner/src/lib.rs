//! Feed scanning: finds eligible posts in the host page, attaches the reply
//! affordance once per post, and decides when passes run.

pub mod affordance;
pub mod engine;
pub mod page;
pub mod processed;
pub mod selectors;
pub mod snapshot;

pub use affordance::{group_thousands, Affordance, AFFORDANCE_LABEL};
pub use engine::{ScanEngine, ScanReport};
pub use page::HostPage;
pub use processed::ProcessedSet;
pub use selectors::SelectorChain;
pub use snapshot::SnapshotPage;
