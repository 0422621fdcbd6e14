//! The rate-limit-aware request dispatcher.

use crate::backoff::{Backoff, JitterBackoff};
use crate::classifier::Outcome;
use crate::config::Config;
use crate::error::{DispatchError, Error, Result};
use crate::key_generator::BucketKey;
use crate::metrics::DispatchMetrics;
use crate::options::RequestOptions;
use crate::rate_limiter::{BucketRateLimiter, RateLimiter};
use crate::route::{Method, Route, RouteArgs};
use crate::routes;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::Response;
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

/// Client for the REST service.
///
/// Every request goes through [`HttpClient::dispatch`], which waits on the
/// shared rate limiter, retries transient failures and returns either the
/// response or a single [`DispatchError`].
pub struct HttpClient {
    inner: reqwest::Client,
    base_url: String,
    headers: HeaderMap,
    limiter: Arc<dyn RateLimiter>,
    backoff: Arc<dyn Backoff>,
    max_retries: u32,
    metrics: DispatchMetrics,
}

impl HttpClient {
    pub fn new(config: Config) -> Result<Self> {
        config.check()?;

        let inner = reqwest::Client::builder()
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .use_rustls_tls()
            .gzip(true)
            .build()
            .map_err(Error::ClientBuild)?;

        let mut authorization = HeaderValue::from_str(&config.authorization())?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(USER_AGENT, HeaderValue::from_str(&config.user_agent)?);

        Ok(Self {
            inner,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            headers,
            limiter: Arc::new(BucketRateLimiter::new()),
            backoff: Arc::new(JitterBackoff::new(config.backoff_min, config.backoff_max)),
            max_retries: config.max_retries,
            metrics: DispatchMetrics::new(),
        })
    }

    /// Share a rate limiter between several clients, or substitute another one.
    pub fn with_rate_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn with_backoff(mut self, backoff: Arc<dyn Backoff>) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn rate_limiter(&self) -> &Arc<dyn RateLimiter> {
        &self.limiter
    }

    pub fn metrics(&self) -> &DispatchMetrics {
        &self.metrics
    }

    /// Headers attached to every request
    pub fn fixed_headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Full request URL for a route
    pub fn url_for(&self, route: &Route, args: &RouteArgs) -> Result<String> {
        Ok(format!("{}{}", self.base_url, route.format(args)?))
    }

    /// Dispatch a catalog route by operation name, e.g. `GUILDS_GET`.
    pub async fn call(&self, name: &str, args: &RouteArgs, options: &RequestOptions) -> Result<Response> {
        let route = routes::lookup(name)?;
        self.dispatch(route, args, options).await
    }

    /// Perform a request, honouring rate limits and retrying transient failures.
    ///
    /// Status codes below 400 return the response untouched. Other 4xx codes
    /// except 429 fail immediately. 429, 5xx and failures with no response at
    /// all are retried up to `max_retries` times with a random backoff, after
    /// which the last status and body are reported.
    #[instrument(
        skip_all,
        fields(call_id = %Uuid::new_v4(), method = %route.method, route = %route.template)
    )]
    pub async fn dispatch(&self, route: &Route, args: &RouteArgs, options: &RequestOptions) -> Result<Response> {
        let url = self.url_for(route, args)?;
        let mut retries = 0;

        loop {
            let bucket = BucketKey::derive(route, args);
            self.limiter.check(&bucket).await;

            let outcome = match self.send(route.method, &url, options).await {
                Ok(response) => {
                    self.limiter.update(&bucket, &response).await;
                    Outcome::from_response(response).await
                }
                Err(err) => {
                    warn!(url = %url, error = %err, "No response received");
                    Outcome::network_failure()
                }
            };
            self.metrics.record_attempt(&bucket, outcome.class()).await;

            let (status, body) = match outcome {
                Outcome::Success(response) => {
                    debug!(status = response.status().as_u16(), retries, "Request succeeded");
                    return Ok(response);
                }
                Outcome::FatalClientError { status, body } => {
                    return Err(DispatchError::new("Request failed", status, body).into());
                }
                Outcome::Transient { status, body } => (status, body),
            };

            if status == 429 {
                warn!("Request responded with 429, retrying (this should not happen, check your clock sync)");
            }

            retries += 1;
            if retries > self.max_retries {
                error!(status, "Failing request, hit max retries");
                self.metrics.record_exhausted(&bucket).await;
                return Err(DispatchError::new(
                    format!("Request failed after {} retries", self.max_retries),
                    status,
                    body,
                )
                .into());
            }

            let delay = self.backoff.next_delay();
            warn!(
                url = %url,
                status,
                retry = retries,
                backoff_ms = delay.as_millis() as u64,
                body = %body.as_deref().map(String::from_utf8_lossy).unwrap_or_default(),
                "Request failed, retrying after backoff"
            );
            self.metrics.record_retry(&bucket).await;
            tokio::time::sleep(delay).await;
        }
    }

    async fn send(&self, method: Method, url: &str, options: &RequestOptions) -> reqwest::Result<Response> {
        let builder = self.inner.request(method.into(), url);
        options.apply(builder, &self.headers).send().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::{CHANNELS_MESSAGES_GET, GUILDS_GET};

    fn client() -> HttpClient {
        HttpClient::new(Config::new("secret").with_base_url("https://example.com/api/v6/")).unwrap()
    }

    #[test]
    fn test_url_for() {
        let args = RouteArgs::from([("channel", "9"), ("message", "42")]);
        assert_eq!(
            client().url_for(&CHANNELS_MESSAGES_GET, &args).unwrap(),
            "https://example.com/api/v6/channels/9/messages/42"
        );
    }

    #[test]
    fn test_fixed_headers() {
        let client = client();
        assert_eq!(client.fixed_headers().get(AUTHORIZATION).unwrap(), "Bot secret");
        assert!(client.fixed_headers().get(AUTHORIZATION).unwrap().is_sensitive());
        assert!(client.fixed_headers().contains_key(USER_AGENT));
        assert_eq!(client.max_retries(), 5);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        assert!(matches!(HttpClient::new(Config::new("")), Err(Error::Configuration(_))));
    }

    #[tokio::test]
    async fn test_missing_placeholder_fails_before_any_request() {
        let result = client().dispatch(&GUILDS_GET, &RouteArgs::new(), &RequestOptions::new()).await;
        assert!(matches!(result, Err(Error::MissingPlaceholder { .. })));
    }

    #[tokio::test]
    async fn test_call_unknown_route() {
        let result = client().call("NOT_A_ROUTE", &RouteArgs::new(), &RequestOptions::new()).await;
        assert!(matches!(result, Err(Error::UnknownRoute(_))));
    }
}
