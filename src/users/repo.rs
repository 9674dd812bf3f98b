use std::future::Future;
use std::time::Duration;

use axum::async_trait;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::users::dto::UpdateUserRequest;

/// Deadline on every statement; the pool has its own acquire timeout.
const STATEMENT_TIMEOUT: Duration = Duration::from_secs(5);

/// User row in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // argon2 hash, not exposed in JSON
    pub salary: i64,
}

/// Column values for an insert; the id is generated by the store.
#[derive(Debug)]
pub struct NewUser {
    pub username: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub salary: i64,
}

/// Persistence seam for user rows. Handlers only see this trait, so tests
/// can substitute an in-memory double for the Postgres store.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, new: NewUser) -> anyhow::Result<User>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    /// Overwrites name, email and salary. Returns the affected row count;
    /// zero means the id does not exist.
    async fn update(&self, id: Uuid, fields: &UpdateUserRequest) -> anyhow::Result<u64>;
    /// Returns the affected row count; zero means the id does not exist.
    async fn delete(&self, id: Uuid) -> anyhow::Result<u64>;
}

pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

async fn bounded<T>(fut: impl Future<Output = Result<T, sqlx::Error>>) -> anyhow::Result<T> {
    match tokio::time::timeout(STATEMENT_TIMEOUT, fut).await {
        Ok(res) => Ok(res?),
        Err(_) => anyhow::bail!("database statement timed out"),
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, new: NewUser) -> anyhow::Result<User> {
        let user = bounded(
            sqlx::query_as::<_, User>(
                r#"
                INSERT INTO users (username, name, email, password_hash, salary)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, username, name, email, password_hash, salary
                "#,
            )
            .bind(&new.username)
            .bind(&new.name)
            .bind(&new.email)
            .bind(&new.password_hash)
            .bind(new.salary)
            .fetch_one(&self.db),
        )
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = bounded(
            sqlx::query_as::<_, User>(
                r#"
                SELECT id, username, name, email, password_hash, salary
                FROM users
                WHERE id = $1
                "#,
            )
            .bind(id)
            .fetch_optional(&self.db),
        )
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = bounded(
            sqlx::query_as::<_, User>(
                r#"
                SELECT id, username, name, email, password_hash, salary
                FROM users
                WHERE email = $1
                "#,
            )
            .bind(email)
            .fetch_optional(&self.db),
        )
        .await?;
        Ok(user)
    }

    async fn update(&self, id: Uuid, fields: &UpdateUserRequest) -> anyhow::Result<u64> {
        let res = bounded(
            sqlx::query(
                r#"
                UPDATE users
                SET name = $2, email = $3, salary = $4
                WHERE id = $1
                "#,
            )
            .bind(id)
            .bind(&fields.name)
            .bind(&fields.email)
            .bind(fields.salary)
            .execute(&self.db),
        )
        .await?;
        Ok(res.rows_affected())
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<u64> {
        let res = bounded(
            sqlx::query(r#"DELETE FROM users WHERE id = $1"#)
                .bind(id)
                .execute(&self.db),
        )
        .await?;
        Ok(res.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_never_serializes_the_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            username: "ann".into(),
            name: "Ann".into(),
            email: "a@x.com".into(),
            password_hash: "$argon2id$very-secret".into(),
            salary: 100,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("very-secret"));
    }
}
