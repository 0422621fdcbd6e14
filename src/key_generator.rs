//! Rate limit bucket derivation.
//!
//! The service limits requests per route and per major resource. Only the
//! `guild` and `channel` placeholders distinguish buckets; every other
//! placeholder (message id, member id, ...) is blanked so that, for example,
//! editing different messages in one channel shares a single bucket.

use crate::route::{Method, Route, RouteArgs};
use std::fmt;

/// Placeholders whose values are part of the bucket identity
pub const MAJOR_PARAMETERS: [&str; 2] = ["guild", "channel"];

/// Identity under which the rate limiter tracks capacity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketKey {
    pub method: Method,
    pub path: String,
}

impl BucketKey {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }

    /// Derive the bucket for a call. Pure and idempotent.
    pub fn derive(route: &Route, args: &RouteArgs) -> Self {
        let filtered: RouteArgs = args
            .iter()
            .map(|(name, value)| {
                if MAJOR_PARAMETERS.contains(&name) {
                    (name, value)
                } else {
                    (name, "")
                }
            })
            .collect();

        Self {
            method: route.method,
            path: route.format_lenient(&filtered),
        }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}
