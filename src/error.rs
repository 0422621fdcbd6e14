use bytes::Bytes;
use std::fmt;
use thiserror::Error;

/// Terminal failure of a dispatched request.
///
/// `status_code` is 0 when no response was ever received (connection refused,
/// timeout, DNS failure). `body` holds the raw bytes of the last response, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchError {
    pub message: String,
    pub status_code: u16,
    pub body: Option<Bytes>,
}

impl DispatchError {
    pub fn new(message: impl Into<String>, status_code: u16, body: Option<Bytes>) -> Self {
        Self {
            message: message.into(),
            status_code,
            body,
        }
    }

    /// Body of the failing response as lossy UTF-8, for diagnostics.
    pub fn body_text(&self) -> Option<String> {
        self.body
            .as_ref()
            .map(|body| String::from_utf8_lossy(body).into_owned())
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if self.status_code != 0 {
            write!(f, " code: {}", self.status_code)?;
        }
        Ok(())
    }
}

impl std::error::Error for DispatchError {}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("Missing value for placeholder `{placeholder}` in route `{template}`")]
    MissingPlaceholder { placeholder: String, template: String },

    #[error("Unsupported HTTP method: {0}")]
    InvalidMethod(String),

    #[error("Unknown route: {0}")]
    UnknownRoute(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Invalid header name: {0}")]
    InvalidHeaderName(#[from] reqwest::header::InvalidHeaderName),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Status code of the failing response, 0 when there is none.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Dispatch(err) => err.status_code,
            _ => 0,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_appends_status_code() {
        let err = DispatchError::new("Request failed", 404, None);
        assert_eq!(err.to_string(), "Request failed code: 404");
    }

    #[test]
    fn test_display_without_status_code() {
        let err = DispatchError::new("Request failed", 0, None);
        assert_eq!(err.to_string(), "Request failed");
    }

    #[test]
    fn test_body_text() {
        let err = DispatchError::new("Request failed", 400, Some(Bytes::from_static(b"{\"code\":50035}")));
        assert_eq!(err.body_text().as_deref(), Some("{\"code\":50035}"));
    }

    #[test]
    fn test_error_status_code() {
        let err: Error = DispatchError::new("Request failed", 403, None).into();
        assert_eq!(err.status_code(), 403);
        assert_eq!(Error::UnknownRoute("NOPE".to_string()).status_code(), 0);
    }
}
