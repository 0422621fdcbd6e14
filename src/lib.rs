pub mod backoff;
pub mod classifier;
pub mod client;
pub mod config;
pub mod error;
pub mod key_generator;
pub mod metrics;
pub mod options;
pub mod rate_limiter;
pub mod route;
pub mod routes;

pub use backoff::{Backoff, JitterBackoff};
pub use classifier::{classify, Outcome, StatusClass};
pub use client::HttpClient;
pub use config::Config;
pub use error::{DispatchError, Error, Result};
pub use key_generator::BucketKey;
pub use options::{RequestBody, RequestOptions};
pub use rate_limiter::{BucketRateLimiter, RateLimiter};
pub use route::{Method, Route, RouteArgs};
