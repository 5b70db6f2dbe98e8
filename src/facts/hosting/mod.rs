mod client;
mod provider;
mod repo_stats;

pub use client::{Client, HostingApiResult, RateLimitInfo, RetryPolicy};
pub use provider::Provider;
pub use repo_stats::RepoStats;
