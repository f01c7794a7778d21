use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};

use crate::domain::email_address::EmailAddress;
use crate::domain::role::Role;
use crate::domain::user::User;
use crate::domain::user_repository::UserRepository;

#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    db_pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

fn user_from_row(row: &PgRow) -> Result<User, String> {
    let id = row.try_get("id").map_err(|e| e.to_string())?;
    let name = row.try_get("name").map_err(|e| e.to_string())?;
    let email = EmailAddress::parse(row.try_get("email").map_err(|e| e.to_string())?)?;
    let role = Role::parse(row.try_get("role").map_err(|e| e.to_string())?)?;

    Ok(User {
        id,
        name,
        email,
        role,
    })
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[tracing::instrument(name = "Fetch users by role", skip(self), fields(role = %role))]
    async fn find_by_role(&self, role: Role) -> Result<Vec<User>, anyhow::Error> {
        let rows = sqlx::query("SELECT id, name, email, role FROM users WHERE role = $1")
            .bind(role.as_ref())
            .fetch_all(&self.db_pool)
            .await
            .context("Failed to fetch users by role.")?;

        let users = rows
            .iter()
            .filter_map(|row| match user_from_row(row) {
                Ok(user) => Some(user),
                Err(e) => {
                    tracing::warn!("Invalid user retrieved from db: {}", e);
                    None
                }
            })
            .collect();

        Ok(users)
    }

    #[tracing::instrument(name = "Resolve a session token", skip(self, token))]
    async fn find_by_session_token(&self, token: &str) -> Result<Option<User>, anyhow::Error> {
        let row = sqlx::query(
            r#"
            SELECT users.id, users.name, users.email, users.role
            FROM user_sessions
            JOIN users ON users.id = user_sessions.user_id
            WHERE user_sessions.token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.db_pool)
        .await
        .context("Failed to resolve a session token.")?;

        match row {
            None => Ok(None),
            Some(row) => user_from_row(&row).map(Some).map_err(anyhow::Error::msg),
        }
    }
}
