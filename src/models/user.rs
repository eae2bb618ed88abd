use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::Entity;
use crate::models::ValidationErrors;

/// Stored account. The password hash never leaves the service layer.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LocalUser {
    pub id: i32,
    pub user_name: String,
    pub name: String,
    pub password_hash: String,
}

impl Entity for LocalUser {
    const TABLE: &'static str = "local_users";
    const KEY: &'static str = "id";
    const GENERATED_KEY: bool = true;
    const UNIQUE: &'static [&'static str] = &["user_name"];

    fn key(&self) -> i32 {
        self.id
    }

    fn set_key(&mut self, key: i32) {
        self.id = key;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRole {
    pub id: i32,
    pub user_id: i32,
    pub role: String,
}

impl Entity for UserRole {
    const TABLE: &'static str = "user_roles";
    const KEY: &'static str = "id";
    const GENERATED_KEY: bool = true;

    fn key(&self) -> i32 {
        self.id
    }

    fn set_key(&mut self, key: i32) {
        self.id = key;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: i32,
    pub user_name: String,
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
}

impl UserDto {
    pub fn new(user: &LocalUser, role: Option<String>) -> Self {
        Self {
            id: user.id,
            user_name: user.user_name.clone(),
            name: user.name.clone(),
            role,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequestDto {
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub password: String,
}

impl LoginRequestDto {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.required("userName", &self.user_name);
        errors.required("password", &self.password);
        errors.finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponseDto {
    pub user: Option<UserDto>,
    pub token: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequestDto {
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub password: String,
}

impl RegistrationRequestDto {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.required("userName", &self.user_name);
        errors.required("password", &self.password);
        errors.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_requires_credentials() {
        let err = LoginRequestDto::default().validate().unwrap_err();
        assert_eq!(err.fields.len(), 2);
    }

    #[test]
    fn registration_ignores_a_requested_role() {
        let dto: RegistrationRequestDto =
            serde_json::from_str(r#"{"userName":"ana","name":"Ana","password":"pw","role":"admin"}"#).unwrap();
        assert!(dto.validate().is_ok());
        let echoed = serde_json::to_value(&dto).unwrap();
        assert!(echoed.get("role").is_none());
    }
}
