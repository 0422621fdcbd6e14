use crate::error::Result;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::RequestBuilder;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(serde_json::Value),
    Raw(Bytes),
}

/// Caller-supplied parts of a request.
///
/// Options are applied afresh on every attempt, so they are never consumed.
/// Headers set here sit underneath the client's fixed headers: a header the
/// client also sets (such as `Authorization`) is replaced by the client's value.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    headers: HeaderMap,
    query: Vec<(String, String)>,
    body: Option<RequestBody>,
    timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn try_header(self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())?;
        let value = HeaderValue::from_str(value)?;
        Ok(self.header(name, value))
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn json(mut self, value: serde_json::Value) -> Self {
        self.body = Some(RequestBody::Json(value));
        self
    }

    /// Serialize any value into a JSON body
    pub fn json_from<T: Serialize>(self, value: &T) -> Result<Self> {
        Ok(self.json(serde_json::to_value(value)?))
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(RequestBody::Raw(body.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn request_body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }

    /// Caller headers overlaid with `fixed`; fixed values always win.
    pub fn merged_headers(&self, fixed: &HeaderMap) -> HeaderMap {
        let mut headers = self.headers.clone();
        for (name, value) in fixed {
            headers.insert(name.clone(), value.clone());
        }
        headers
    }

    pub(crate) fn apply(&self, mut builder: RequestBuilder, fixed: &HeaderMap) -> RequestBuilder {
        builder = builder.headers(self.merged_headers(fixed));

        if !self.query.is_empty() {
            builder = builder.query(&self.query);
        }

        builder = match &self.body {
            Some(RequestBody::Json(value)) => builder.json(value),
            Some(RequestBody::Raw(bytes)) => builder.body(bytes.clone()),
            None => builder,
        };

        match self.timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        }
    }
}
