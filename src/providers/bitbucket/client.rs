use log::{debug, info};
use reqwest::header::ACCEPT;
use reqwest::Client;

use super::status::StatusPayload;
use crate::auth::Credentials;
use crate::error::{NotifierError, Result};

pub struct BitbucketClient {
    client: Client,
    api_url: String,
    credentials: Credentials,
}

impl BitbucketClient {
    pub fn new(api_url: &str, credentials: Credentials) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("bitbucket-notifier/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NotifierError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// Revision goes into the path as-is.
    pub fn commit_status_url(&self, revision: &str) -> String {
        format!("{}/rest/build-status/1.0/commits/{revision}", self.api_url)
    }

    /// Records one build status against a commit. The response body is read to
    /// the end but not interpreted.
    pub async fn post_build_status(&self, revision: &str, payload: &StatusPayload) -> Result<()> {
        let url = self.commit_status_url(revision);
        info!("Posting {:?} build status to {url}", payload.state);

        let request = self
            .client
            .post(&url)
            .header(ACCEPT, "application/json")
            .json(payload);
        let request = self.credentials.authorize(request);

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!("Bitbucket responded {status}: {body}");

        if !status.is_success() {
            return Err(NotifierError::Api(format!("{status}: {body}")));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Token;
    use crate::providers::bitbucket::status::BuildState;
    use mockito::Matcher;

    fn payload() -> StatusPayload {
        StatusPayload {
            state: BuildState::Successful,
            key: "abc123".to_string(),
            name: "42".to_string(),
            url: "https://gocd.example.com/go/pipelines/value_stream_map/build-1/42".to_string(),
        }
    }

    fn client(api_url: &str) -> BitbucketClient {
        BitbucketClient::new(api_url, Credentials::new("u", Token::from("k"))).unwrap()
    }

    #[test]
    fn test_commit_status_url() {
        let client = client("https://bitbucket.example.com");

        assert_eq!(
            client.commit_status_url("abc123"),
            "https://bitbucket.example.com/rest/build-status/1.0/commits/abc123"
        );
    }

    #[test]
    fn test_commit_status_url_trims_trailing_slash() {
        let client = client("https://bitbucket.example.com/");

        assert_eq!(
            client.commit_status_url("abc123"),
            "https://bitbucket.example.com/rest/build-status/1.0/commits/abc123"
        );
    }

    #[tokio::test]
    async fn test_post_build_status_sends_expected_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/rest/build-status/1.0/commits/abc123")
            .match_header("authorization", "Basic dTpr")
            .match_header("content-type", "application/json")
            .match_header("accept", "application/json")
            .match_body(Matcher::Json(serde_json::json!({
                "state": "SUCCESSFUL",
                "key": "abc123",
                "name": "42",
                "url": "https://gocd.example.com/go/pipelines/value_stream_map/build-1/42"
            })))
            .with_status(204)
            .expect(1)
            .create_async()
            .await;

        client(&server.url())
            .post_build_status("abc123", &payload())
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_post_build_status_drains_successful_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/rest/build-status/1.0/commits/abc123")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"unexpected": ["content", "is", "ignored"]}"#)
            .create_async()
            .await;

        let result = client(&server.url())
            .post_build_status("abc123", &payload())
            .await;

        assert!(result.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_post_build_status_non_success_is_api_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/rest/build-status/1.0/commits/abc123")
            .with_status(401)
            .with_body("Authentication failed")
            .create_async()
            .await;

        let err = client(&server.url())
            .post_build_status("abc123", &payload())
            .await
            .unwrap_err();

        assert!(matches!(err, NotifierError::Api(_)));
        assert_eq!(
            err.to_string(),
            "Bitbucket request failed: 401 Unauthorized: Authentication failed"
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_post_build_status_connection_refused_is_network_error() {
        let err = client("http://127.0.0.1:1")
            .post_build_status("abc123", &payload())
            .await
            .unwrap_err();

        assert!(matches!(err, NotifierError::Network(_)));
    }
}
