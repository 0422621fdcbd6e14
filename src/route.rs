//! Route descriptors and per-call URL arguments.
//!
//! A [`Route`] pairs an HTTP method with a URL template such as
//! `/channels/{channel}/messages/{message}`. Templates are filled in per call
//! from a [`RouteArgs`] mapping.

use crate::error::{Error, Result};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+)\}").expect("placeholder pattern is valid"));

/// HTTP methods used by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        [Method::Get, Method::Post, Method::Put, Method::Patch, Method::Delete]
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidMethod(s.to_string()))
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// An immutable (method, URL template) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Route {
    pub method: Method,
    pub template: Cow<'static, str>,
}

impl Route {
    pub const fn new(method: Method, template: &'static str) -> Self {
        Self {
            method,
            template: Cow::Borrowed(template),
        }
    }

    /// Build a route from a template only known at runtime.
    pub fn owned(method: Method, template: impl Into<String>) -> Self {
        Self {
            method,
            template: Cow::Owned(template.into()),
        }
    }

    /// Placeholder names in the order they appear in the template
    pub fn placeholders(&self) -> impl Iterator<Item = &str> + '_ {
        PLACEHOLDER
            .captures_iter(&self.template)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
    }

    /// Fill every placeholder from `args`. Missing values are an error.
    pub fn format(&self, args: &RouteArgs) -> Result<String> {
        if let Some(missing) = self.placeholders().find(|name| args.get(name).is_none()) {
            return Err(Error::MissingPlaceholder {
                placeholder: missing.to_string(),
                template: self.template.to_string(),
            });
        }

        Ok(self.format_lenient(args))
    }

    /// Fill placeholders from `args`, leaving absent ones empty.
    pub fn format_lenient(&self, args: &RouteArgs) -> String {
        PLACEHOLDER
            .replace_all(&self.template, |caps: &Captures| {
                args.get(&caps[1]).unwrap_or_default().to_string()
            })
            .into_owned()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.template)
    }
}

/// Placeholder values supplied for a single call.
///
/// Keys that the template does not reference are ignored when formatting the
/// URL but still take part in bucket derivation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteArgs {
    values: BTreeMap<String, String>,
}

impl RouteArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for RouteArgs
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for RouteArgs
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}
