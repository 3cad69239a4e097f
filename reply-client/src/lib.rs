//! Reply generation against the hosted model endpoint: prompt assembly, the
//! bounded retry loop, and normalization of the provider's response shapes.

pub mod client;
pub mod prompt;
pub mod response;
pub mod retry;

pub use client::RequestClient;
pub use prompt::{build_payload, system_instruction, user_instruction, GenerationPayload};
pub use response::{normalize, normalize_body, post_process};
pub use retry::{RetryConfig, RetryExecutor, RetryMetrics, RetryStrategy};
