use async_trait::async_trait;
use uuid::Uuid;
use std::{borrow::Cow, sync::Arc};

use crate::{
    entities::user::{User, UserInsert},
    errors::AppError,
    repositories::sqlx_repo::SqlxUserRepo,
    resilience::RetryPolicy,
};

const USER_COLUMNS: &str =
    "id, username, email, full_name, password_hash, role, is_active, created_at, updated_at";

/// Identity store. Reads must reflect the latest enable/disable state, so no
/// cache sits in front of it.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn check_connection(&self) -> Result<(), AppError>;
    async fn get_user_by_id(&self, id: &Uuid) -> Result<Option<User>, AppError>;
    async fn get_user_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, AppError>;
    async fn username_exists(&self, username: &str) -> Result<bool, AppError>;
    async fn email_exists(&self, email: &str) -> Result<bool, AppError>;
    async fn create_user(&self, user: &UserInsert) -> Result<Uuid, AppError>;
    /// Returns `false` when no user has this id.
    async fn set_user_active(&self, id: &Uuid, active: bool) -> Result<bool, AppError>;
}

#[async_trait]
impl<R> UserRepository for Arc<R>
where
    R: UserRepository + ?Sized,
{
    async fn check_connection(&self) -> Result<(), AppError> {
        (**self).check_connection().await
    }

    async fn get_user_by_id(&self, id: &Uuid) -> Result<Option<User>, AppError> {
        (**self).get_user_by_id(id).await
    }

    async fn get_user_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, AppError> {
        (**self).get_user_by_username_or_email(username, email).await
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AppError> {
        (**self).username_exists(username).await
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        (**self).email_exists(email).await
    }

    async fn create_user(&self, user: &UserInsert) -> Result<Uuid, AppError> {
        (**self).create_user(user).await
    }

    async fn set_user_active(&self, id: &Uuid, active: bool) -> Result<bool, AppError> {
        (**self).set_user_active(id, active).await
    }
}

impl SqlxUserRepo {
    pub fn new(pool: sqlx::PgPool) -> Self {
        SqlxUserRepo { pool }
    }
}

/// Connection-level failures worth another attempt; query errors are not.
fn is_transient(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::Protocol(_)
    )
}

#[async_trait]
impl UserRepository for SqlxUserRepo {
    async fn check_connection(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(AppError::from)
    }

    async fn get_user_by_id(&self, id: &Uuid) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        RetryPolicy::DATABASE
            .run("users.get_by_id", is_transient, || {
                sqlx::query_as::<_, User>(&sql)
                    .bind(id)
                    .fetch_optional(&self.pool)
            })
            .await
            .map_err(AppError::from)
    }

    async fn get_user_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, AppError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE ($1::TEXT IS NOT NULL AND username = $1) \
                OR ($2::TEXT IS NOT NULL AND email = LOWER($2)) \
             LIMIT 1"
        );

        RetryPolicy::DATABASE
            .run("users.get_by_username_or_email", is_transient, || {
                sqlx::query_as::<_, User>(&sql)
                    .bind(username)
                    .bind(email)
                    .fetch_optional(&self.pool)
            })
            .await
            .map_err(AppError::from)
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AppError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from)
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = LOWER($1))")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from)
    }

    async fn create_user(&self, user: &UserInsert) -> Result<Uuid, AppError> {
        sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO users (
                username,
                email,
                full_name,
                password_hash,
                role,
                is_active,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING id
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            match e {
                sqlx::Error::Database(db_err) if db_err.code() == Some(Cow::Borrowed("23505")) => {
                    AppError::Conflict("Username or email already registered".to_string())
                }
                _ => AppError::from(e),
            }
        })
    }

    async fn set_user_active(&self, id: &Uuid, active: bool) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE users SET is_active = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(active)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(result.rows_affected() > 0)
    }
}
