use async_trait::async_trait;
use chrono::{DateTime, Utc};
use marquee_model::{NewUser, User, UserUpdate};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::database::ports::users::UsersRepository;
use crate::error::{DomainError, Result};

const USER_COLUMNS: &str =
    "id, full_name, email, is_active, is_admin, created_at, updated_at";

const EMAIL_CONSTRAINT: &str = "ux_users_email";

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    full_name: String,
    email: String,
    is_active: bool,
    is_admin: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            full_name: row.full_name,
            email: row.email,
            is_active: row.is_active,
            is_admin: row.is_admin,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// PostgreSQL-backed implementation of the `UsersRepository` port.
#[derive(Clone, Debug)]
pub struct PostgresUsersRepository {
    pool: PgPool,
}

impl PostgresUsersRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn map_email_conflict(err: sqlx::Error, email: &str) -> DomainError {
    if let Some(db_err) = err.as_database_error()
        && db_err.constraint() == Some(EMAIL_CONSTRAINT)
    {
        return DomainError::Conflict(format!(
            "A user with email {email} already exists"
        ));
    }
    DomainError::Database(err)
}

#[async_trait]
impl UsersRepository for PostgresUsersRepository {
    async fn create_user(
        &self,
        user: &NewUser,
        password_hash: &str,
    ) -> Result<User> {
        let mut tx = self.pool().begin().await?;

        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)",
        )
        .bind(&user.email)
        .fetch_one(&mut *tx)
        .await?;
        if taken {
            return Err(DomainError::Conflict(format!(
                "A user with email {} already exists",
                user.email
            )));
        }

        let record = User::from_new(user.clone());
        let sql = format!(
            "INSERT INTO users (id, full_name, email, hashed_password, \
             is_active, is_admin, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {USER_COLUMNS}"
        );
        let row: UserRow = sqlx::query_as(&sql)
            .bind(record.id)
            .bind(&record.full_name)
            .bind(&record.email)
            .bind(password_hash)
            .bind(record.is_active)
            .bind(record.is_admin)
            .bind(record.created_at)
            .bind(record.updated_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_email_conflict(e, &user.email))?;

        tx.commit().await?;

        info!(user_id = %row.id, is_admin = row.is_admin, "created user");
        Ok(row.into())
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row.map(User::from))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(email)
            .fetch_optional(self.pool())
            .await?;
        Ok(row.map(User::from))
    }

    async fn update_user(&self, id: Uuid, update: &UserUpdate) -> Result<User> {
        let sql = format!(
            "UPDATE users SET \
             full_name = COALESCE($2, full_name), \
             email = COALESCE($3, email), \
             is_active = COALESCE($4, is_active), \
             is_admin = COALESCE($5, is_admin), \
             updated_at = NOW() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(update.full_name.as_deref())
            .bind(update.email.as_deref())
            .bind(update.is_active)
            .bind(update.is_admin)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| {
                let email = update.email.as_deref().unwrap_or_default();
                map_email_conflict(e, email)
            })?;

        row.map(User::from)
            .ok_or_else(|| DomainError::NotFound(format!("user {id}")))
    }

    async fn delete_user(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(|e| match e.as_database_error() {
                Some(db_err) if db_err.is_foreign_key_violation() => {
                    let reason = format!("user {id} still owns movies");
                    DomainError::Conflict(reason)
                }
                _ => DomainError::Database(e),
            })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound(format!("user {id}")));
        }
        info!(user_id = %id, "deleted user");
        Ok(())
    }

    async fn get_password_hash(&self, user_id: Uuid) -> Result<Option<String>> {
        let hash: Option<String> = sqlx::query_scalar(
            "SELECT hashed_password FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(hash)
    }

    async fn update_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE users SET hashed_password = $2, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(user_id)
        .bind(password_hash)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound(format!("user {user_id}")));
        }
        info!(user_id = %user_id, "updated password");
        Ok(())
    }
}
