use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use mantis_common::{FetchError, MantisError};

use crate::traits::{FetchResponse, PageFetcher};

/// Identifies the collector to the remote service on every request.
pub const USER_AGENT: &str = "Mantis/1.0";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, MantisError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        debug!(url, status, bytes = body.len(), "Fetched");
        Ok(FetchResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn sends_collector_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/scores"))
            .and(header("user-agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string("<td>24</td>"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let resp = fetcher.get(&format!("{}/scores", server.uri())).await.unwrap();

        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, "<td>24</td>");
    }

    #[tokio::test]
    async fn rate_limit_then_success_are_both_responses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("user-agent", "Mantis/1.0"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(header("user-agent", "Mantis/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("week 2"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let url = format!("{}/week/2", server.uri());

        let first = fetcher.get(&url).await.unwrap();
        assert_eq!(first.status, 429);

        let second = fetcher.get(&url).await.unwrap();
        assert_eq!(second.status, 200);
        assert_eq!(second.body, "week 2");
    }

    #[tokio::test]
    async fn server_error_status_is_a_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let resp = fetcher.get(&server.uri()).await.unwrap();

        assert_eq!(resp.status, 503);
        assert_eq!(resp.body, "maintenance");
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher.get("http://127.0.0.1:1/nothing").await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
        assert_eq!(err.code(), 0);
    }

    #[tokio::test]
    async fn invalid_url_is_transport_error() {
        let fetcher = HttpFetcher::new().unwrap();
        let err = fetcher.get("not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }
}
