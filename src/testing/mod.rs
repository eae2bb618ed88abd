use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use crate::auth::AuthService;
use crate::config::AppConfig;
use crate::database::seed_villas;
use crate::models::RegistrationRequestDto;
use crate::state::AppState;

pub const TEST_PASSWORD: &str = "Pa$$w0rd";

/// Router over a seeded in-memory store with a registered `admin` account, plus
/// bearer tokens for the admin and customer roles
pub struct TestContext {
    pub state: AppState,
    pub config: AppConfig,
    pub admin_token: String,
    pub customer_token: String,
}

/// Decoded response from [`TestContext::send`]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

impl TestContext {
    pub async fn new() -> anyhow::Result<Self> {
        Self::with_config(AppConfig::development()).await
    }

    /// Registrations pick up `config.security.default_role`
    pub async fn with_config(config: AppConfig) -> anyhow::Result<Self> {
        let auth = Arc::new(AuthService::from_config(&config.security).with_hash_cost(4));
        let state = AppState::memory(auth.clone(), &config);
        seed_villas(state.villas.as_ref()).await?;

        state
            .users
            .register(RegistrationRequestDto {
                user_name: "admin".to_string(),
                name: "admin".to_string(),
                password: TEST_PASSWORD.to_string(),
            })
            .await?;

        Ok(Self {
            admin_token: auth.issue("admin", "admin")?,
            customer_token: auth.issue("customer", "customer")?,
            state,
            config,
        })
    }

    pub fn router(&self) -> Router {
        crate::routes::app(self.state.clone(), &self.config)
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> anyhow::Result<TestResponse> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router().oneshot(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };

        Ok(TestResponse { status, headers, body })
    }
}
