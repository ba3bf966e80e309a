use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::password::{hash_password, verify_password};
use crate::models::{
    LoginRequest, LoginResponse, RepositoryError, ServiceError, ServiceResult, SignUpRequest,
    User, Validate,
};
use crate::repositories::UserRepository;

/// Issued on successful login. Session tokens are not implemented.
const PLACEHOLDER_TOKEN: &str = "not-a-real-token";

pub struct UserService {
    repository: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn sign_up(&self, request: SignUpRequest) -> ServiceResult<User> {
        request.validate()?;

        let email = request.email.trim().to_string();
        let password_hash = hash_password(&request.password)?;

        let user = self
            .repository
            .create(&email, request.username.trim(), &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::ConstraintViolation { .. } => {
                    ServiceError::EmailAlreadyRegistered {
                        email: email.clone(),
                    }
                }
                other => other.into(),
            })?;

        info!(user_id = user.id, "User signed up");
        Ok(user)
    }

    /// Unknown email and wrong password fail identically
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> ServiceResult<LoginResponse> {
        request.validate()?;

        let credentials = match self
            .repository
            .find_credentials_by_email(request.email.trim())
            .await?
        {
            Some(credentials) => credentials,
            None => {
                warn!("Login for unknown email");
                return Err(ServiceError::InvalidCredentials);
            }
        };

        if !verify_password(&credentials.password_hash, &request.password)? {
            warn!(user_id = credentials.user.id, "Login with wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        info!(user_id = credentials.user.id, "User logged in");
        Ok(LoginResponse {
            token: PLACEHOLDER_TOKEN.to_string(),
            user: credentials.user,
        })
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, user_id: i64) -> ServiceResult<User> {
        self.repository
            .find_by_id(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound { user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserCredentials;
    use async_trait::async_trait;
    use chrono::Utc;
    use mockall::mock;

    mock! {
        TestUserRepository {}

        #[async_trait]
        impl UserRepository for TestUserRepository {
            async fn create(&self, email: &str, username: &str, password_hash: &str) -> Result<User, RepositoryError>;
            async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepositoryError>;
            async fn find_credentials_by_email(&self, email: &str) -> Result<Option<UserCredentials>, RepositoryError>;
        }
    }

    fn test_user() -> User {
        User {
            id: 1,
            email: "ana@example.com".to_string(),
            username: "ana".to_string(),
            created_at: Utc::now(),
        }
    }

    fn sign_up_request() -> SignUpRequest {
        SignUpRequest {
            email: "ana@example.com".to_string(),
            password: "correct horse".to_string(),
            username: "ana".to_string(),
        }
    }

    #[tokio::test]
    async fn test_sign_up_stores_hash_not_password() {
        let mut mock_repo = MockTestUserRepository::new();
        mock_repo
            .expect_create()
            .withf(|email, username, hash| {
                email == "ana@example.com" && username == "ana" && hash.starts_with("$argon2")
            })
            .times(1)
            .returning(|_, _, _| Ok(test_user()));

        let user = UserService::new(Arc::new(mock_repo))
            .sign_up(sign_up_request())
            .await
            .unwrap();
        assert_eq!(user.id, 1);
    }

    #[tokio::test]
    async fn test_sign_up_duplicate_email() {
        let mut mock_repo = MockTestUserRepository::new();
        mock_repo.expect_create().times(1).returning(|_, _, _| {
            Err(RepositoryError::ConstraintViolation {
                message: "UNIQUE constraint failed: users.email".to_string(),
            })
        });

        let result = UserService::new(Arc::new(mock_repo))
            .sign_up(sign_up_request())
            .await;
        assert!(matches!(
            result,
            Err(ServiceError::EmailAlreadyRegistered { .. })
        ));
    }

    #[tokio::test]
    async fn test_login_checks_password() {
        let hash = hash_password("correct horse").unwrap();
        let mut mock_repo = MockTestUserRepository::new();
        mock_repo
            .expect_find_credentials_by_email()
            .returning(move |_| {
                Ok(Some(UserCredentials {
                    user: test_user(),
                    password_hash: hash.clone(),
                }))
            });
        let service = UserService::new(Arc::new(mock_repo));

        let response = service
            .login(LoginRequest {
                email: "ana@example.com".to_string(),
                password: "correct horse".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(response.user.id, 1);
        assert!(!response.token.is_empty());

        let wrong = service
            .login(LoginRequest {
                email: "ana@example.com".to_string(),
                password: "wrong horse".to_string(),
            })
            .await;
        assert!(matches!(wrong, Err(ServiceError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_unknown_email_looks_like_wrong_password() {
        let mut mock_repo = MockTestUserRepository::new();
        mock_repo
            .expect_find_credentials_by_email()
            .times(1)
            .returning(|_| Ok(None));

        let result = UserService::new(Arc::new(mock_repo))
            .login(LoginRequest {
                email: "nobody@example.com".to_string(),
                password: "whatever1".to_string(),
            })
            .await;
        assert!(matches!(result, Err(ServiceError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_get_user_not_found() {
        let mut mock_repo = MockTestUserRepository::new();
        mock_repo.expect_find_by_id().returning(|_| Ok(None));

        let result = UserService::new(Arc::new(mock_repo)).get_user(5).await;
        assert!(matches!(result, Err(ServiceError::UserNotFound { user_id: 5 })));
    }
}
