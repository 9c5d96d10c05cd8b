//! HTTP module
//!
//! Transport and call accounting for the remote API.
//!
//! # Features
//!
//! - **Single-attempt client**: timeouts and status mapping, no retries
//! - **Call budget**: hard per-process ceiling on API calls
//! - **Pacing**: optional token bucket limiter using governor

mod budget;
mod client;
mod rate_limit;

pub use budget::CallBudget;
pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder};
pub use rate_limit::{RateLimiter, RateLimiterConfig};

#[cfg(test)]
mod tests;
