//! JSON-RPC client for NZBGet's control API

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::ControllerConfig;
use crate::error::{Error, Result};

#[derive(Serialize)]
struct RpcRequest<'a> {
    version: &'static str,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// Minimal JSON-RPC 1.1 client with HTTP basic auth
#[derive(Clone, Debug)]
pub struct RpcClient {
    http: reqwest::Client,
    endpoint: Url,
    username: String,
    password: String,
}

impl RpcClient {
    /// Create a client for the configured NZBGet instance
    pub fn new(config: &ControllerConfig) -> Result<Self> {
        Self::with_endpoint(
            config.endpoint()?,
            config.username.clone(),
            config.password.clone(),
            config.timeout,
        )
    }

    /// Create a client for an explicit endpoint URL
    pub fn with_endpoint(
        endpoint: Url,
        username: String,
        password: String,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint,
            username,
            password,
        })
    }

    /// Call `method` and decode its `result` member
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T> {
        debug!(method, "calling nzbget");

        let request = RpcRequest {
            version: "1.1",
            method,
            params,
        };
        let body = self
            .http
            .post(self.endpoint.clone())
            .basic_auth(&self.username, Some(&self.password))
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        let response: RpcResponse<T> = serde_json::from_slice(&body)?;
        if let Some(err) = response.error {
            return Err(Error::Rpc {
                method: method.to_string(),
                message: format!("{} (code {})", err.message, err.code),
            });
        }
        response.result.ok_or_else(|| Error::Rpc {
            method: method.to_string(),
            message: "response has no result".to_string(),
        })
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> RpcClient {
        let endpoint = Url::parse(&format!("{}/jsonrpc", server.uri())).unwrap();
        RpcClient::with_endpoint(
            endpoint,
            "nzbget".into(),
            "secret".into(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn call_decodes_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/jsonrpc"))
            .and(header_exists("authorization"))
            .and(body_partial_json(json!({"method": "version", "params": []})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"version": "1.1", "result": "24.1"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let version: String = client.call("version", json!([])).await.unwrap();

        assert_eq!(version, "24.1");
    }

    #[tokio::test]
    async fn call_surfaces_rpc_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "version": "1.1",
                "error": {"name": "JSONRPCError", "code": 1, "message": "Invalid procedure"}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .call::<bool>("nosuchmethod", json!([]))
            .await
            .unwrap_err();

        match err {
            Error::Rpc { method, message } => {
                assert_eq!(method, "nosuchmethod");
                assert!(message.contains("Invalid procedure"));
            }
            other => panic!("expected Rpc error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn call_reports_http_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.call::<bool>("editqueue", json!([])).await.unwrap_err();

        assert!(matches!(err, Error::Network(_)));
    }

    #[tokio::test]
    async fn call_reports_malformed_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.call::<bool>("listgroups", json!([0])).await.unwrap_err();

        assert!(matches!(err, Error::Serialization(_)));
    }
}
