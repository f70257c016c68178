use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use crate::application::ports::{RepositoryError, UserRepository};
use crate::domain::{Submitter, User, UserId};

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: Option<String>,
    email: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        User {
            id: UserId::new(r.id),
            name: r.name,
            email: r.email,
            created_at: r.created_at,
        }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip(self, submitter))]
    async fn find_or_create(&self, submitter: &Submitter) -> Result<User, RepositoryError> {
        let row = match submitter.email() {
            Some(email) => sqlx::query_as::<_, UserRow>(
                r#"
                INSERT INTO users (name, email, created_at)
                VALUES ($1, $2, $3)
                ON CONFLICT (email) DO UPDATE
                    SET name = COALESCE(users.name, EXCLUDED.name)
                RETURNING id, name, email, created_at
                "#,
            )
            .bind(submitter.name())
            .bind(email)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await,
            None => sqlx::query_as::<_, UserRow>(
                r#"
                INSERT INTO users (name, email, created_at)
                VALUES ($1, NULL, $2)
                RETURNING id, name, email, created_at
                "#,
            )
            .bind(submitter.name())
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await,
        }
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(row.into())
    }

    #[instrument(skip(self), fields(user_id = %id))]
    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, created_at FROM users WHERE id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(row.map(User::from))
    }
}
