//! Async HTTP transport wrapping reqwest.
//!
//! One call is one attempt: no retries happen here, the retry loop lives in
//! [`super::retry`]. Transport errors are flattened into a
//! [`CapturedFailure`] whose name and message feed the classifier.

use super::{CapturedFailure, FetchRequest, RawResponse, Transport};
use async_trait::async_trait;

/// Maximum redirects followed before the request is treated as failed.
const MAX_REDIRECTS: usize = 10;

/// reqwest-backed [`Transport`].
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport sending `user_agent` on every request.
    pub fn new(user_agent: &str) -> Self {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(user_agent)
            .build()
            .unwrap_or_default();

        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &FetchRequest) -> Result<RawResponse, CapturedFailure> {
        let mut builder = self.client.get(&request.url).timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let r = builder.send().await.map_err(|e| capture(&e))?;
        let status = r.status().as_u16();
        let final_url = r.url().to_string();
        let body = r.text().await.map_err(|e| capture(&e))?;

        Ok(RawResponse {
            final_url,
            status,
            body,
        })
    }
}

/// Translate a reqwest error into the name/message pair the classifier reads.
fn capture(e: &reqwest::Error) -> CapturedFailure {
    if e.is_timeout() {
        CapturedFailure::new("TimeoutError", format!("request timeout: {e}"))
    } else if e.is_connect() || e.is_request() || e.is_body() {
        CapturedFailure::new("NetworkError", format!("network failure: {e}"))
    } else {
        CapturedFailure::new("Error", e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{classify, FailureCategory};
    use std::time::Duration;

    #[tokio::test]
    async fn test_sends_user_agent_and_headers() {
        use wiremock::matchers::{header, method};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("user-agent", "orgscope-test/1.0"))
            .and(header("x-proxy", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new("orgscope-test/1.0");
        let request = FetchRequest {
            url: format!("{}/page", server.uri()),
            headers: vec![("X-Proxy".to_string(), "secret".to_string())],
            timeout: Duration::from_secs(2),
        };
        let response = transport.send(&request).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, "ok");
        assert_eq!(response.final_url, request.url);
    }

    #[tokio::test]
    async fn test_expired_timeout_is_captured_as_timeout() {
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let transport = HttpTransport::new("orgscope-test/1.0");
        let request = FetchRequest {
            url: server.uri(),
            headers: Vec::new(),
            timeout: Duration::from_millis(150),
        };
        let failure = transport.send(&request).await.unwrap_err();
        assert_eq!(failure.name, "TimeoutError");
        assert_eq!(classify(Some(&failure), None), FailureCategory::Timeout);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_or_timeout() {
        let transport = HttpTransport::new("orgscope-test/1.0");
        let request = FetchRequest {
            // Port 9 on localhost is almost never listening.
            url: "http://127.0.0.1:9/".to_string(),
            headers: Vec::new(),
            timeout: Duration::from_millis(500),
        };
        let failure = transport.send(&request).await.unwrap_err();
        let category = classify(Some(&failure), None);
        assert!(matches!(
            category,
            FailureCategory::NetworkError | FailureCategory::Timeout
        ));
    }
}
