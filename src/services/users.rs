use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};

use crate::auth::AuthService;
use crate::database::{Page, Repository};
use crate::models::{LocalUser, LoginRequestDto, LoginResponseDto, RegistrationRequestDto, UserDto, UserRole};
use crate::services::ServiceError;

/// Account lookup, login and registration
pub struct UserService {
    users: Arc<dyn Repository<LocalUser>>,
    roles: Arc<dyn Repository<UserRole>>,
    auth: Arc<AuthService>,
    default_role: String,
}

impl UserService {
    pub fn new(
        users: Arc<dyn Repository<LocalUser>>,
        roles: Arc<dyn Repository<UserRole>>,
        auth: Arc<AuthService>,
        default_role: impl Into<String>,
    ) -> Self {
        Self {
            users,
            roles,
            auth,
            default_role: default_role.into(),
        }
    }

    /// True when no account uses exactly this user name
    pub async fn is_unique_user(&self, user_name: &str) -> Result<bool, ServiceError> {
        let existing = self.users.get(Some(json!({ "user_name": user_name }))).await?;
        Ok(existing.is_none())
    }

    /// First assigned role, by role id
    async fn first_role(&self, user_id: i32) -> Result<Option<String>, ServiceError> {
        let roles = self
            .roles
            .get_all(Some(json!({ "user_id": user_id })), Page::new(1, 1))
            .await?;
        Ok(roles.into_iter().next().map(|r| r.role))
    }

    /// Verify credentials and issue a token.
    ///
    /// `None` when the user is unknown, the password is wrong, or the account
    /// has no role. Callers report all of these the same way.
    pub async fn login(&self, request: LoginRequestDto) -> Result<Option<LoginResponseDto>, ServiceError> {
        request.validate()?;

        let Some(user) = self
            .users
            .get(Some(json!({ "user_name": { "$ieq": request.user_name } })))
            .await?
        else {
            warn!("Login failed: unknown user {}", request.user_name);
            return Ok(None);
        };

        if !self.auth.verify_password(&request.password, &user.password_hash)? {
            warn!("Login failed: bad password for {}", user.user_name);
            return Ok(None);
        }

        let Some(role) = self.first_role(user.id).await? else {
            warn!("Login failed: {} has no role", user.user_name);
            return Ok(None);
        };

        let token = self.auth.issue(&user.user_name, &role)?;
        info!("User {} logged in as {}", user.user_name, role);

        Ok(Some(LoginResponseDto {
            user: Some(UserDto::new(&user, Some(role))),
            token,
        }))
    }

    /// Create an account holding the configured default role.
    /// Callers check [`UserService::is_unique_user`] first.
    pub async fn register(&self, request: RegistrationRequestDto) -> Result<UserDto, ServiceError> {
        request.validate()?;

        let password_hash = self.auth.hash_password(&request.password)?;
        let user = self
            .users
            .create(LocalUser {
                id: 0,
                user_name: request.user_name,
                name: request.name,
                password_hash,
            })
            .await?;

        let role = self.default_role.clone();

        let assigned = self
            .roles
            .create(UserRole {
                id: 0,
                user_id: user.id,
                role: role.clone(),
            })
            .await;

        if let Err(e) = assigned {
            // Do not leave an account behind that can never log in
            if let Err(cleanup) = self.users.remove(&user).await {
                warn!("Could not remove user {} after failed role assignment: {}", user.user_name, cleanup);
            }
            return Err(e.into());
        }

        info!("Registered user {} with role {}", user.user_name, role);
        Ok(UserDto::new(&user, Some(role)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryRepository;

    fn service() -> UserService {
        UserService::new(
            Arc::new(MemoryRepository::<LocalUser>::new()),
            Arc::new(MemoryRepository::<UserRole>::new()),
            Arc::new(AuthService::new("test-secret", 168).with_hash_cost(4)),
            "admin",
        )
    }

    fn registration(user_name: &str) -> RegistrationRequestDto {
        RegistrationRequestDto {
            user_name: user_name.to_string(),
            name: "Test User".to_string(),
            password: "Pa$$w0rd".to_string(),
        }
    }

    #[tokio::test]
    async fn register_then_login_case_insensitively() {
        let users = service();
        assert!(users.is_unique_user("Alice").await.unwrap());

        let created = users.register(registration("Alice")).await.unwrap();
        assert_eq!(created.role.as_deref(), Some("admin"));
        assert!(!users.is_unique_user("Alice").await.unwrap());
        // uniqueness is an exact match
        assert!(users.is_unique_user("alice").await.unwrap());

        let login = users
            .login(LoginRequestDto {
                user_name: "ALICE".to_string(),
                password: "Pa$$w0rd".to_string(),
            })
            .await
            .unwrap()
            .unwrap();
        assert!(!login.token.is_empty());
        assert_eq!(login.user.unwrap().user_name, "Alice");
    }

    #[tokio::test]
    async fn registration_gets_the_configured_role() {
        let users = UserService::new(
            Arc::new(MemoryRepository::<LocalUser>::new()),
            Arc::new(MemoryRepository::<UserRole>::new()),
            Arc::new(AuthService::new("test-secret", 168).with_hash_cost(4)),
            "customer",
        );
        let created = users.register(registration("bob")).await.unwrap();
        assert_eq!(created.role.as_deref(), Some("customer"));

        let login = users
            .login(LoginRequestDto {
                user_name: "bob".to_string(),
                password: "Pa$$w0rd".to_string(),
            })
            .await
            .unwrap()
            .unwrap();
        let claims = AuthService::new("test-secret", 168).verify(&login.token).unwrap();
        assert_eq!(claims.role, "customer");
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_the_same() {
        let users = service();
        users.register(registration("carol")).await.unwrap();

        let wrong = users
            .login(LoginRequestDto {
                user_name: "carol".to_string(),
                password: "nope".to_string(),
            })
            .await
            .unwrap();
        let unknown = users
            .login(LoginRequestDto {
                user_name: "nobody".to_string(),
                password: "nope".to_string(),
            })
            .await
            .unwrap();
        assert!(wrong.is_none());
        assert!(unknown.is_none());
    }

    #[tokio::test]
    async fn blank_credentials_fail_validation() {
        let users = service();
        let err = users.login(LoginRequestDto::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
