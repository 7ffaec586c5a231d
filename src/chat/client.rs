use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use crate::chat::types::{GetChatRequest, GetChatResponse, SendChatRequest, SendChatResponse};
use crate::error::{Error, Result};

/// Backend collaborator behind the chat widget. Only the two chat endpoints
/// and the health probe exist; everything else lives server-side.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send_chat(&self, request: &SendChatRequest) -> Result<SendChatResponse>;

    async fn get_chat(&self, request: &GetChatRequest) -> Result<GetChatResponse>;

    async fn health(&self) -> Result<()>;
}

/// HTTP implementation over the agentic server's REST API.
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;

        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    async fn post_json<Req, Resp>(&self, path: &str, request: &Req) -> Result<Resp>
    where
        Req: serde::Serialize + Sync,
        Resp: serde::de::DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        debug!(%url, "Posting to backend");

        let response = self.http.post(url).json(request).send().await?;
        if !response.status().is_success() {
            return Err(Error::backend_status(path, response.status().as_u16()));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn send_chat(&self, request: &SendChatRequest) -> Result<SendChatResponse> {
        self.post_json("/api/send_chat", request).await
    }

    async fn get_chat(&self, request: &GetChatRequest) -> Result<GetChatResponse> {
        self.post_json("/api/get_chat", request).await
    }

    async fn health(&self) -> Result<()> {
        let url = self.endpoint("/health")?;
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(Error::backend_status("/health", response.status().as_u16()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::types::SessionId;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend_for(server: &MockServer) -> HttpBackend {
        HttpBackend::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_send_chat_returns_session_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/send_chat"))
            .and(body_json(json!({"text": "hello"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "session_id": "abc-123"
            })))
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        let response = backend
            .send_chat(&SendChatRequest {
                text: "hello".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(response.session_id, SessionId::new("abc-123"));
    }

    #[tokio::test]
    async fn test_get_chat_parses_partial_poll() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/get_chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": "working on it",
                "chat_complete": false
            })))
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        let response = backend
            .get_chat(&GetChatRequest {
                session_id: SessionId::new("abc-123"),
            })
            .await
            .unwrap();

        assert_eq!(response.response.as_deref(), Some("working on it"));
        assert!(!response.chat_complete);
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/get_chat"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        let result = backend
            .get_chat(&GetChatRequest {
                session_id: SessionId::new("gone"),
            })
            .await;

        match result {
            Err(Error::BackendStatus { endpoint, status }) => {
                assert_eq!(endpoint, "/api/get_chat");
                assert_eq!(status, 404);
            }
            other => panic!("expected BackendStatus error, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_health_probe() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "healthy"})))
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        assert!(backend.health().await.is_ok());
    }
}
