//! Dispatch: turning a signed parameter set into one HTTP exchange.
//!
//! [`OutgoingRequest::build`] decides where the parameters go (query string
//! for GET, JSON body for POST). A [`Transport`] performs the exchange, and
//! [`map_response`] classifies whatever came back.

use crate::config::ClientConfig;
use crate::signer::SignedParameters;
use crate::types::*;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header, Client as HttpClient};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

/// A fully formed request, consumed by exactly one dispatch
#[derive(Clone, PartialEq)]
pub struct OutgoingRequest {
    pub method: HttpMethod,
    /// Target URL, including the query string for GET
    pub url: String,
    /// Extra request headers. Values may be credentials and are never logged.
    pub headers: Vec<(String, String)>,
    /// JSON body for POST, `None` for GET
    pub body: Option<Vec<u8>>,
}

impl OutgoingRequest {
    pub fn build(endpoint: &str, method: HttpMethod, params: &SignedParameters) -> ApiResult<Self> {
        match method {
            HttpMethod::Get => Ok(Self {
                method,
                url: format!("{}?{}", endpoint, params.to_query_string()),
                headers: Vec::new(),
                body: None,
            }),
            HttpMethod::Post => Ok(Self {
                method,
                url: endpoint.to_string(),
                headers: Vec::new(),
                body: Some(params.to_json_body()?),
            }),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// URL with the query string removed, safe to log
    pub fn redacted_url(&self) -> &str {
        self.url.split('?').next().unwrap_or(&self.url)
    }
}

impl fmt::Debug for OutgoingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header_names: Vec<&str> = self.headers.iter().map(|(n, _)| n.as_str()).collect();
        f.debug_struct("OutgoingRequest")
            .field("method", &self.method)
            .field("url", &self.redacted_url())
            .field("headers", &header_names)
            .field("body_len", &self.body.as_ref().map(Vec::len))
            .finish()
    }
}

/// Status and body as delivered by the transport
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Bytes,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Performs a single HTTP exchange.
///
/// Implementations must report network failures as `ApiError::Transport`
/// and must not retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: OutgoingRequest) -> ApiResult<RawResponse>;
}

/// Production transport backed by a shared `reqwest::Client`
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    http_client: HttpClient,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let tls = config.tls();
        let mut builder = HttpClient::builder()
            .default_headers(headers)
            .user_agent(config.user_agent())
            .timeout(config.timeout())
            .danger_accept_invalid_certs(!tls.cert_verification);

        if let Some(connect_timeout) = config.connect_timeout() {
            builder = builder.connect_timeout(connect_timeout);
        }
        if let Some(version) = tls.min_tls_version {
            builder = builder.min_tls_version(version);
        }

        let http_client = builder.build().map_err(|e| {
            ApiError::configuration_error(format!("failed to create HTTP client: {}", e), None)
        })?;
        Ok(Self { http_client })
    }

    /// Wrap an existing client, e.g. one shared with other services
    pub fn from_client(http_client: HttpClient) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: OutgoingRequest) -> ApiResult<RawResponse> {
        let mut builder = self.http_client.request(request.method.into(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok(RawResponse { status, body })
    }
}

/// A successful call: the HTTP status and the parsed payload
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub payload: Value,
}

impl ApiResponse {
    /// Decode the payload into a caller-chosen type
    pub fn decode<T: DeserializeOwned>(&self) -> ApiResult<T> {
        T::deserialize(&self.payload).map_err(|e| {
            ApiError::protocol_error(
                format!("payload does not match expected shape: {}", e),
                Some(self.status),
                None,
                Some(e),
                None,
            )
        })
    }

    /// Top-level field of the payload, if the payload is an object
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.payload.get(name)
    }

    pub fn into_payload(self) -> Value {
        self.payload
    }
}

/// Classify a raw response.
///
/// Only a 2xx status with a JSON body is a success. The platform's own
/// `code` field is left for the caller to interpret.
pub fn map_response(raw: RawResponse) -> ApiResult<ApiResponse> {
    let RawResponse { status, body } = raw;

    if !(200..300).contains(&status) {
        let text = String::from_utf8_lossy(&body);
        tracing::warn!(status, "remote returned non-success status");
        return Err(ApiError::protocol_error(
            format!("remote returned HTTP {}", status),
            Some(status),
            Some(sanitize_error_message(&text)),
            None::<serde_json::Error>,
            Some(concat!(file!(), ":", line!())),
        ));
    }

    serde_json::from_slice::<Value>(&body)
        .map(|payload| ApiResponse { status, payload })
        .map_err(|e| {
            let text = String::from_utf8_lossy(&body);
            ApiError::protocol_error(
                format!("response body is not valid JSON: {}", e),
                Some(status),
                Some(sanitize_error_message(&text)),
                Some(e),
                Some(concat!(file!(), ":", line!())),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParameterSet;
    use crate::signer::{HmacSigner, UnsignedParameters};
    use pretty_assertions::assert_eq;
    use serde::Deserialize;

    fn signed() -> SignedParameters {
        let params = ParameterSet::new()
            .with("app_key", "123456")
            .with("timestamp", 1u64)
            .with("sign_method", "sha256")
            .with("status", "pending");
        UnsignedParameters { params }
            .sign("/orders/get", &HmacSigner::new("secret", SignMethod::HmacSha256))
            .unwrap()
    }

    #[test]
    fn get_puts_parameters_in_query() {
        let request = OutgoingRequest::build("https://h/rest/orders/get", HttpMethod::Get, &signed()).unwrap();
        assert!(request.url.starts_with("https://h/rest/orders/get?app_key=123456&"));
        assert!(request.body.is_none());
        assert_eq!(request.redacted_url(), "https://h/rest/orders/get");
    }

    #[test]
    fn debug_output_hides_query_and_header_values() {
        let request = OutgoingRequest::build("https://h/rest/orders/get", HttpMethod::Get, &signed())
            .unwrap()
            .with_header("x-goog-api-key", "very-secret-value");

        assert_eq!(request.header("X-Goog-Api-Key"), Some("very-secret-value"));
        let debug = format!("{:?}", request);
        assert!(debug.contains("x-goog-api-key"));
        assert!(!debug.contains("very-secret-value"));
        assert!(!debug.contains("app_key=123456"));
    }

    #[test]
    fn post_puts_parameters_in_body_only() {
        let params = signed();
        let request = OutgoingRequest::build("https://h/rest/orders/get", HttpMethod::Post, &params).unwrap();
        assert_eq!(request.url, "https://h/rest/orders/get");

        let body: Value = serde_json::from_slice(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["status"], "pending");
        assert_eq!(body["timestamp"], 1);
        assert_eq!(body["sign"], params.signature());
        assert_eq!(body.as_object().unwrap().len(), params.len());
    }

    #[test]
    fn success_with_json_body() {
        let response = map_response(RawResponse::new(200, r#"{"code":"0","data":{"message":"ok"}}"#)).unwrap();
        assert_eq!(response.payload, serde_json::json!({"code": "0", "data": {"message": "ok"}}));
        assert_eq!(response.field("code"), Some(&Value::from("0")));
    }

    #[test]
    fn success_with_garbage_body_is_protocol_error() {
        let err = map_response(RawResponse::new(200, "<html>oops</html>")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProtocolError);
        assert_eq!(err.status(), Some(200));
        assert!(err.source_error().is_some());
    }

    #[test]
    fn server_error_keeps_status_and_body() {
        let err = map_response(RawResponse::new(503, "maintenance")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProtocolError);
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.response_body(), Some("maintenance"));
    }

    #[test]
    fn decode_shape_mismatch_is_protocol_error() {
        #[derive(Debug, Deserialize)]
        struct Seller {
            #[allow(dead_code)]
            seller_id: u64,
        }

        let response = ApiResponse {
            status: 200,
            payload: serde_json::json!({"code": "0"}),
        };
        let err = response.decode::<Seller>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProtocolError);
    }
}
