use bytes::Bytes;
use reqwest::Response;

/// How a response status should be handled by the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    FatalClientError,
    Transient,
}

/// Classify a response status. `None` means no response was received.
pub fn classify(status: Option<u16>) -> StatusClass {
    match status {
        Some(code) if code < 400 => StatusClass::Success,
        Some(code) if code < 500 && code != 429 => StatusClass::FatalClientError,
        _ => StatusClass::Transient,
    }
}

/// Result of a single network attempt
#[derive(Debug)]
pub enum Outcome {
    Success(Response),
    FatalClientError { status: u16, body: Option<Bytes> },
    Transient { status: u16, body: Option<Bytes> },
}

impl Outcome {
    /// Classify a received response, consuming its body unless it succeeded.
    pub async fn from_response(response: Response) -> Self {
        let status = response.status().as_u16();
        match classify(Some(status)) {
            StatusClass::Success => Outcome::Success(response),
            StatusClass::FatalClientError => Outcome::FatalClientError {
                status,
                body: response.bytes().await.ok(),
            },
            StatusClass::Transient => Outcome::Transient {
                status,
                body: response.bytes().await.ok(),
            },
        }
    }

    /// No response at all: connection failure, timeout and the like.
    pub fn network_failure() -> Self {
        Outcome::Transient {
            status: 0,
            body: None,
        }
    }

    pub fn class(&self) -> StatusClass {
        match self {
            Outcome::Success(_) => StatusClass::Success,
            Outcome::FatalClientError { .. } => StatusClass::FatalClientError,
            Outcome::Transient { .. } => StatusClass::Transient,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &'static str) -> Response {
        http::Response::builder()
            .status(status)
            .body(body)
            .unwrap()
            .into()
    }

    #[test]
    fn test_classify_success() {
        assert_eq!(classify(Some(200)), StatusClass::Success);
        assert_eq!(classify(Some(204)), StatusClass::Success);
        assert_eq!(classify(Some(304)), StatusClass::Success);
        assert_eq!(classify(Some(399)), StatusClass::Success);
    }

    #[test]
    fn test_classify_fatal_client_errors() {
        assert_eq!(classify(Some(400)), StatusClass::FatalClientError);
        assert_eq!(classify(Some(403)), StatusClass::FatalClientError);
        assert_eq!(classify(Some(404)), StatusClass::FatalClientError);
        assert_eq!(classify(Some(428)), StatusClass::FatalClientError);
        assert_eq!(classify(Some(430)), StatusClass::FatalClientError);
        assert_eq!(classify(Some(499)), StatusClass::FatalClientError);
    }

    #[test]
    fn test_classify_transient() {
        assert_eq!(classify(Some(429)), StatusClass::Transient);
        assert_eq!(classify(Some(500)), StatusClass::Transient);
        assert_eq!(classify(Some(502)), StatusClass::Transient);
        assert_eq!(classify(Some(599)), StatusClass::Transient);
        assert_eq!(classify(None), StatusClass::Transient);
    }

    #[tokio::test]
    async fn test_outcome_keeps_body_on_failure() {
        match Outcome::from_response(response(404, "{\"message\": \"Unknown Guild\"}")).await {
            Outcome::FatalClientError { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body.as_deref(), Some(&b"{\"message\": \"Unknown Guild\"}"[..]));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_outcome_success_returns_response_untouched() {
        let outcome = Outcome::from_response(response(200, "{\"id\":\"123\"}")).await;
        match outcome {
            Outcome::Success(resp) => assert_eq!(resp.text().await.unwrap(), "{\"id\":\"123\"}"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_network_failure_is_transient_without_status() {
        let outcome = Outcome::network_failure();
        assert_eq!(outcome.class(), StatusClass::Transient);
        assert!(matches!(outcome, Outcome::Transient { status: 0, body: None }));
    }
}
