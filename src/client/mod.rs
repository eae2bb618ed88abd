//! Typed wrappers over the Villa API for front-ends.
//!
//! Every call goes through [`ApiClient::send`], which serializes the body,
//! attaches the bearer token and decodes the response envelope regardless of
//! the status code.

pub mod auth;
pub mod villa;
pub mod villa_number;

use std::time::Duration;

use reqwest::{header, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::api::ApiEnvelope;
use crate::models::{pagination::PAGINATION_HEADER, Pagination};

pub use auth::AuthClient;
pub use villa::VillaClient;
pub use villa_number::VillaNumberClient;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Could not decode response ({status}): {message}")]
    Decode { status: u16, message: String },

    #[error("{}", .messages.first().map(String::as_str).unwrap_or("Request failed"))]
    Api { status: u16, messages: Vec<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiType {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl From<ApiType> for Method {
    fn from(api_type: ApiType) -> Self {
        match api_type {
            ApiType::Get => Method::GET,
            ApiType::Post => Method::POST,
            ApiType::Put => Method::PUT,
            ApiType::Patch => Method::PATCH,
            ApiType::Delete => Method::DELETE,
        }
    }
}

/// One call to the API
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub api_type: ApiType,
    pub url: Url,
    pub data: Option<Value>,
    pub token: Option<String>,
}

impl ApiRequest {
    pub fn new(api_type: ApiType, url: Url) -> Self {
        Self {
            api_type,
            url,
            data: None,
            token: None,
        }
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn token(mut self, token: Option<&str>) -> Self {
        self.token = token.map(str::to_string);
        self
    }
}

/// Decoded response: status, paging header, location and envelope
#[derive(Debug, Clone)]
pub struct Reply<T> {
    pub status: StatusCode,
    pub pagination: Option<Pagination>,
    pub location: Option<String>,
    pub body: ApiEnvelope<T>,
}

impl<T> Reply<T> {
    /// The result on success, or the envelope's error messages
    pub fn into_result(self) -> Result<Option<T>, ClientError> {
        if self.status.is_success() && self.body.is_success {
            Ok(self.body.result)
        } else {
            Err(ClientError::Api {
                status: self.status.as_u16(),
                messages: self.body.error_messages,
            })
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL for `path` with optional query parameters
    pub fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ClientError> {
        let mut url = self.base_url.join(path)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<Reply<T>, ClientError> {
        let mut builder = self
            .http
            .request(request.api_type.into(), request.url)
            .header(header::ACCEPT, "application/json");

        if let Some(token) = request.token.as_deref().filter(|t| !t.is_empty()) {
            builder = builder.bearer_auth(token);
        }
        if let Some(data) = &request.data {
            builder = builder.json(data);
        }

        let response = builder.send().await?;
        let status = response.status();
        let pagination = response
            .headers()
            .get(PAGINATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| serde_json::from_str(v).ok());
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let text = response.text().await?;
        let body = decode_envelope(status, &text)?;

        Ok(Reply {
            status,
            pagination,
            location,
            body,
        })
    }
}

/// Envelope for `text`. Empty bodies (204) become a bare envelope carrying the
/// status; other non-envelope bodies are an error.
fn decode_envelope<T: DeserializeOwned>(status: StatusCode, text: &str) -> Result<ApiEnvelope<T>, ClientError> {
    if text.trim().is_empty() {
        return Ok(if status.is_success() {
            ApiEnvelope::success(status.as_u16(), None)
        } else {
            ApiEnvelope::failure(status.as_u16(), vec![status.to_string()])
        });
    }

    serde_json::from_str(text).map_err(|e| ClientError::Decode {
        status: status.as_u16(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VillaDto;

    #[test]
    fn builds_urls_with_query_parameters() {
        let client = ApiClient::new("http://localhost:3000").unwrap();
        let url = client
            .url("/api/v1/VillaAPI", &[("search", "sea view".to_string()), ("pageSize", "5".to_string())])
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/v1/VillaAPI?search=sea+view&pageSize=5");
    }

    #[test]
    fn empty_no_content_body_is_success() {
        let env: ApiEnvelope<VillaDto> = decode_envelope(StatusCode::NO_CONTENT, "").unwrap();
        assert!(env.is_success);
        assert_eq!(env.status_code, 204);
    }

    #[test]
    fn error_envelopes_become_api_errors() {
        let body = r#"{"statusCode":400,"isSuccess":false,"errorMessages":["Villa already Exists!"],"result":null}"#;
        let reply = Reply::<VillaDto> {
            status: StatusCode::BAD_REQUEST,
            pagination: None,
            location: None,
            body: decode_envelope(StatusCode::BAD_REQUEST, body).unwrap(),
        };
        let err = reply.into_result().unwrap_err();
        assert_eq!(err.to_string(), "Villa already Exists!");
    }

    #[test]
    fn garbage_bodies_fail_to_decode() {
        let err = decode_envelope::<VillaDto>(StatusCode::BAD_GATEWAY, "<html>").unwrap_err();
        assert!(matches!(err, ClientError::Decode { status: 502, .. }));
    }
}
