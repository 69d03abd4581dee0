//! # Middleware
//!
//! - [`metrics`]: request counters and latency histograms.
//! - [`versioning`]: `api-version` media type negotiation.
//!
//! Authentication lives in [`crate::auth`] and response caching in
//! [`crate::cache`].

pub mod metrics;
pub mod versioning;
