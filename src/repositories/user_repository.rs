use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use tracing::{info, instrument};

use super::database::Database;
use crate::models::{RepositoryError, RepositoryResult, User, UserCredentials};

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user. A taken email fails with `ConstraintViolation`.
    async fn create(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> RepositoryResult<User>;

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>>;

    /// Lookup for login, including the stored password hash
    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> RepositoryResult<Option<UserCredentials>>;
}

#[derive(Debug, Clone)]
pub struct SqlUserRepository {
    pool: SqlitePool,
}

impl SqlUserRepository {
    pub fn new(database: &Database) -> Self {
        Self {
            pool: database.pool().clone(),
        }
    }
}

fn user_from_row(row: &SqliteRow) -> RepositoryResult<User> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        username: row.try_get("username")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl UserRepository for SqlUserRepository {
    #[instrument(skip(self, password_hash))]
    async fn create(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> RepositoryResult<User> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO users (email, username, password_hash, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(email)
        .bind(username)
        .bind(password_hash)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match RepositoryError::from(e) {
            RepositoryError::ConstraintViolation { .. } => RepositoryError::ConstraintViolation {
                message: format!("email {} is already registered", email),
            },
            other => other,
        })?;

        let user = User {
            id: result.last_insert_rowid(),
            email: email.to_string(),
            username: username.to_string(),
            created_at: now,
        };

        info!(user_id = user.id, "User created");
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>> {
        let row = sqlx::query("SELECT id, email, username, created_at FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> RepositoryResult<Option<UserCredentials>> {
        let row = sqlx::query(
            "SELECT id, email, username, created_at, password_hash FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(UserCredentials {
                user: user_from_row(&row)?,
                password_hash: row.try_get("password_hash")?,
            })),
            None => Ok(None),
        }
    }
}
