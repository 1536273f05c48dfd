/// HTTP transport for the Kite endpoints
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::SET_COOKIE;
use reqwest::{Client, Method};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::broker::endpoints::ROOT_URL;
use crate::error::{KiteError, Result};
use crate::types::Session;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";

/// Payload of an outbound call.
#[derive(Debug, Clone)]
pub enum Payload {
    None,
    /// URL-encoded form body (login, two-factor, order placement)
    Form(Vec<(String, String)>),
    /// Query-string parameters
    Query(Vec<(String, String)>),
}

/// Unprocessed response: status, Set-Cookie values, raw body text.
///
/// The two-factor step and the instrument dump both need the response
/// before envelope handling.
#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    pub set_cookies: Vec<String>,
    pub body: String,
}

/// Seam over the broker's HTTP surface.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute a call and return the raw response.
    async fn request_raw(&self, method: Method, url: &str, payload: Payload)
        -> Result<RawResponse>;

    /// Execute a call and unwrap the broker's `{data: ...}` envelope.
    ///
    /// A 200 response yields the inner `data` payload (the whole body when
    /// no envelope is present); any other status logs the envelope message
    /// and returns a `BrokerApiError`. Callers check the `Result`, nothing
    /// panics past this boundary.
    async fn request(&self, method: Method, url: &str, payload: Payload) -> Result<Value> {
        let raw = self.request_raw(method, url, payload).await?;
        let body: Value = serde_json::from_str(&raw.body).unwrap_or(Value::Null);

        if raw.status == 200 {
            let data = body.get("data").cloned();
            return Ok(data.unwrap_or(body));
        }

        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("no message in response")
            .to_string();
        warn!(status = raw.status, %message, "broker call failed");
        Err(KiteError::BrokerApiError {
            status: raw.status,
            message,
        })
    }
}

/// reqwest-backed transport. Injects the enctoken bearer header on every
/// call targeting the trading-API host; the login/two-factor host never
/// receives it.
pub struct HttpTransport {
    client: Client,
    session: Arc<RwLock<Session>>,
}

impl HttpTransport {
    pub fn new(session: Arc<RwLock<Session>>, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .expect("Failed to build HTTP client");

        HttpTransport { client, session }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request_raw(
        &self,
        method: Method,
        url: &str,
        payload: Payload,
    ) -> Result<RawResponse> {
        let mut request = self.client.request(method, url);

        if url.starts_with(ROOT_URL) {
            let session = self.session.read().await;
            if session.is_authenticated() {
                request = request.header("Authorization", format!("enctoken {}", session.enctoken));
            }
        }

        request = match payload {
            Payload::None => request,
            Payload::Form(fields) => request.form(&fields),
            Payload::Query(params) => request.query(&params),
        };

        let response = request.send().await?;
        let status = response.status().as_u16();
        let set_cookies: Vec<String> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok().map(|s| s.to_string()))
            .collect();
        let body = response.text().await?;

        debug!(%url, status, "broker response");

        Ok(RawResponse {
            status,
            set_cookies,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EnvelopeTransport {
        status: u16,
        body: String,
    }

    #[async_trait]
    impl Transport for EnvelopeTransport {
        async fn request_raw(
            &self,
            _method: Method,
            _url: &str,
            _payload: Payload,
        ) -> Result<RawResponse> {
            Ok(RawResponse {
                status: self.status,
                set_cookies: vec![],
                body: self.body.clone(),
            })
        }
    }

    #[tokio::test]
    async fn test_envelope_unwraps_data_on_200() {
        let transport = EnvelopeTransport {
            status: 200,
            body: r#"{"status":"success","data":{"request_id":"abc123"}}"#.to_string(),
        };
        let value = transport
            .request(Method::POST, "https://kite.zerodha.com/api/login", Payload::None)
            .await
            .unwrap();
        assert_eq!(value["request_id"], "abc123");
    }

    #[tokio::test]
    async fn test_envelope_without_data_returns_body() {
        let transport = EnvelopeTransport {
            status: 200,
            body: r#"{"ok":true}"#.to_string(),
        };
        let value = transport
            .request(Method::GET, "https://api.kite.trade/user/margins", Payload::None)
            .await
            .unwrap();
        assert_eq!(value["ok"], true);
    }

    #[tokio::test]
    async fn test_non_200_is_broker_api_error() {
        let transport = EnvelopeTransport {
            status: 403,
            body: r#"{"status":"error","message":"Incorrect `api_key` or `access_token`."}"#
                .to_string(),
        };
        let err = transport
            .request(Method::GET, "https://api.kite.trade/user/margins", Payload::None)
            .await
            .unwrap_err();
        match err {
            KiteError::BrokerApiError { status, message } => {
                assert_eq!(status, 403);
                assert!(message.contains("access_token"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
