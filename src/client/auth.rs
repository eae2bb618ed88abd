use serde_json::json;

use crate::client::{ApiClient, ApiRequest, ApiType, ClientError, Reply};
use crate::middleware::AuthUser;
use crate::models::{LoginRequestDto, LoginResponseDto, RegistrationRequestDto, UserDto};

const BASE: &str = "/api/v1/UsersAuth";

#[derive(Debug, Clone)]
pub struct AuthClient {
    api: ApiClient,
}

impl AuthClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn login(&self, request: &LoginRequestDto) -> Result<Reply<LoginResponseDto>, ClientError> {
        let url = self.api.url(&format!("{}/login", BASE), &[])?;
        self.api
            .send(ApiRequest::new(ApiType::Post, url).data(json!(request)))
            .await
    }

    pub async fn register(&self, request: &RegistrationRequestDto) -> Result<Reply<UserDto>, ClientError> {
        let url = self.api.url(&format!("{}/register", BASE), &[])?;
        self.api
            .send(ApiRequest::new(ApiType::Post, url).data(json!(request)))
            .await
    }

    /// Identity the server reads from `token`
    pub async fn whoami(&self, token: &str) -> Result<Reply<AuthUser>, ClientError> {
        let url = self.api.url(&format!("{}/whoami", BASE), &[])?;
        self.api
            .send(ApiRequest::new(ApiType::Get, url).token(Some(token)))
            .await
    }
}
