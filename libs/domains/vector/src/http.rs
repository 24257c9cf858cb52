use reqwest::header::ACCEPT;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{VectorResult, translate_error};

/// Header carrying the API key on every request.
pub const API_KEY_HEADER: &str = "Api-Key";

/// Request issuer bound to one base URL and API key.
///
/// Every non-2xx response goes through the same error translation, so callers
/// get [`VectorError::Api`](crate::VectorError::Api) for structured service errors and
/// [`VectorError::Transport`](crate::VectorError::Transport) for everything else.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl HttpClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), api_key, base_url)
    }

    pub fn with_client(
        client: Client,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Same client and credentials, different host (e.g. the control plane).
    pub fn with_base_url(&self, base_url: impl Into<String>) -> Self {
        Self::with_client(self.client.clone(), self.api_key.clone(), base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.url(path))
            .header(API_KEY_HEADER, &self.api_key)
            .header(ACCEPT, "application/json")
    }

    /// POST a JSON body and decode the JSON response.
    pub async fn post_json<B, R>(&self, path: &str, body: &B) -> VectorResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self.send(self.request(Method::POST, path).json(body)).await?;
        Ok(response.json().await?)
    }

    /// Like [`post_json`](Self::post_json), but an empty success body decodes as `R::default()`.
    pub async fn post_json_or_default<B, R>(&self, path: &str, body: &B) -> VectorResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned + Default,
    {
        let response = self.send(self.request(Method::POST, path).json(body)).await?;
        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(R::default());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// POST a JSON body, ignoring whatever the service returns on success.
    pub async fn post<B>(&self, path: &str, body: &B) -> VectorResult<()>
    where
        B: Serialize + ?Sized,
    {
        self.send(self.request(Method::POST, path).json(body)).await?;
        Ok(())
    }

    /// GET with query parameters; repeated keys are sent in the given order.
    pub async fn get_json<R>(&self, path: &str, query: &[(&str, &str)]) -> VectorResult<R>
    where
        R: DeserializeOwned,
    {
        let response = self.send(self.request(Method::GET, path).query(query)).await?;
        Ok(response.json().await?)
    }

    pub async fn delete(&self, path: &str) -> VectorResult<()> {
        self.send(self.request(Method::DELETE, path)).await?;
        Ok(())
    }

    async fn send(&self, request: RequestBuilder) -> VectorResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "Response received");

        match response.error_for_status_ref().err() {
            None => Ok(response),
            Some(transport) => {
                let body = response.bytes().await.unwrap_or_default();
                Err(translate_error(transport, status, &body))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorCode, VectorError};
    use serde_json::{Value, json};
    use std::error::Error as _;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_url_joining() {
        let http = HttpClient::new("key", "https://index.example/");
        assert_eq!(http.url("query"), "https://index.example/query");
        assert_eq!(http.url("/vectors/upsert"), "https://index.example/vectors/upsert");

        let control = http.with_base_url("https://controller.example");
        assert_eq!(control.url("databases"), "https://controller.example/databases");
        assert_eq!(http.base_url(), "https://index.example");
    }

    #[test]
    fn test_debug_redacts_key() {
        let http = HttpClient::new("secret-key", "https://index.example");
        let printed = format!("{:?}", http);
        assert!(!printed.contains("secret-key"));
        assert!(printed.contains("index.example"));
    }

    #[tokio::test]
    async fn test_post_json_sends_key_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .and(header(API_KEY_HEADER, "key-1"))
            .and(body_json(json!({ "topK": 1 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .expect(1)
            .mount(&server)
            .await;

        let http = HttpClient::new("key-1", server.uri());
        let out: Value = http.post_json("query", &json!({ "topK": 1 })).await.unwrap();

        assert_eq!(out, json!({ "ok": true }));
    }

    #[tokio::test]
    async fn test_post_json_or_default_accepts_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/empty"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/full"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "a": 1 })))
            .mount(&server)
            .await;

        let http = HttpClient::new("k", server.uri());
        let empty: Value = http.post_json_or_default("empty", &json!({})).await.unwrap();
        assert_eq!(empty, Value::Null);
        let full: Value = http.post_json_or_default("full", &json!({})).await.unwrap();
        assert_eq!(full, json!({ "a": 1 }));
    }

    #[tokio::test]
    async fn test_get_json_with_repeated_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/vectors/fetch"))
            .and(query_param("namespace", "ns"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let http = HttpClient::new("k", server.uri());
        let _: Value = http
            .get_json("vectors/fetch", &[("ids", "a"), ("ids", "b"), ("namespace", "ns")])
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests[0].url.query(), Some("ids=a&ids=b&namespace=ns"));
    }

    #[tokio::test]
    async fn test_structured_error_becomes_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "code": 3,
                "message": "Vector dimension 2 does not match the dimension of the index 3",
                "details": [{ "typeUrl": "type.googleapis.com/x", "value": "abc" }],
            })))
            .mount(&server)
            .await;

        let http = HttpClient::new("k", server.uri());
        let err = http.post("vectors/upsert", &json!({})).await.unwrap_err();

        assert_eq!(err.status(), Some(400));
        let VectorError::Api(api) = &err else {
            panic!("expected Api error, got {:?}", err);
        };
        assert_eq!(api.code, ErrorCode::Numeric(3));
        assert_eq!(api.status, 400);
        assert!(api.message.contains("dimension"));
        assert_eq!(api.details.len(), 1);
        assert_eq!(api.details[0].type_url, "type.googleapis.com/x");

        // original transport failure is chained as the cause
        let cause = api.source().expect("cause");
        let transport = cause.downcast_ref::<reqwest::Error>().expect("reqwest error");
        assert_eq!(transport.status().map(|s| s.as_u16()), Some(400));
    }

    #[tokio::test]
    async fn test_unparseable_error_body_surfaces_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
            .mount(&server)
            .await;

        let http = HttpClient::new("k", server.uri());
        let err = http.delete("databases/x").await.unwrap_err();

        assert!(matches!(err, VectorError::Transport(_)));
        assert_eq!(err.status(), Some(503));
    }

    #[tokio::test]
    async fn test_error_body_without_message_surfaces_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "error": "nope" })))
            .mount(&server)
            .await;

        let http = HttpClient::new("k", server.uri());
        let err = http.post("query", &json!({})).await.unwrap_err();

        assert!(matches!(err, VectorError::Transport(_)));
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport_error() {
        // nothing listens on port 1
        let http = HttpClient::new("k", "http://127.0.0.1:1");
        let err = http.post("query", &json!({})).await.unwrap_err();

        assert!(matches!(err, VectorError::Transport(_)));
        assert_eq!(err.status(), None);
    }
}
