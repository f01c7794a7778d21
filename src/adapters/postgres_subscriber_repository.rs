use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use crate::domain::email_address::EmailAddress;
use crate::domain::new_subscriber::NewSubscriber;
use crate::domain::subscriber::Subscriber;
use crate::domain::subscriber_name::SubscriberName;
use crate::domain::subscriber_repository::{InsertSubscriberError, SubscriberRepository};

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Clone)]
pub struct PostgresSubscriberRepository {
    db_pool: PgPool,
}

impl PostgresSubscriberRepository {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

fn subscriber_from_row(row: &PgRow) -> Result<Subscriber, anyhow::Error> {
    Ok(Subscriber {
        id: row.try_get("id")?,
        name: SubscriberName::from_stored(row.try_get("name")?),
        email: EmailAddress::parse(row.try_get("email")?).map_err(|e| anyhow!(e))?,
        date_subscribed: row.try_get("date_subscribed")?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some(UNIQUE_VIOLATION),
        _ => false,
    }
}

#[async_trait]
impl SubscriberRepository for PostgresSubscriberRepository {
    #[tracing::instrument(name = "Fetch all subscribers from the database", skip(self))]
    async fn list_newest_first(&self) -> Result<Vec<Subscriber>, anyhow::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, email, date_subscribed
            FROM subscribers
            ORDER BY date_subscribed DESC
            "#,
        )
        .fetch_all(&self.db_pool)
        .await
        .context("Failed to fetch subscribers.")?;

        rows.iter().map(subscriber_from_row).collect()
    }

    #[tracing::instrument(name = "Fetch a subscriber by email", skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<Option<Subscriber>, anyhow::Error> {
        sqlx::query("SELECT id, name, email, date_subscribed FROM subscribers WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.db_pool)
            .await
            .context("Failed to fetch a subscriber by email.")?
            .as_ref()
            .map(subscriber_from_row)
            .transpose()
    }

    #[tracing::instrument(name = "Fetch a subscriber by id", skip(self))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Subscriber>, anyhow::Error> {
        sqlx::query("SELECT id, name, email, date_subscribed FROM subscribers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await
            .context("Failed to fetch a subscriber by id.")?
            .as_ref()
            .map(subscriber_from_row)
            .transpose()
    }

    #[tracing::instrument(
        name = "Insert a new subscriber into the database",
        skip(self, new_subscriber),
        fields(subscriber_email = %new_subscriber.email)
    )]
    async fn insert(
        &self,
        new_subscriber: &NewSubscriber,
    ) -> Result<Subscriber, InsertSubscriberError> {
        let row = sqlx::query(
            r#"
            INSERT INTO subscribers (id, name, email, date_subscribed)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, date_subscribed
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_subscriber.name.as_ref())
        .bind(new_subscriber.email.as_ref())
        .bind(Utc::now())
        .fetch_one(&self.db_pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                InsertSubscriberError::AlreadySubscribed
            } else {
                tracing::error!("Failed to execute query: {:?}", err);
                anyhow::Error::new(err)
                    .context("Failed to insert a new subscriber.")
                    .into()
            }
        })?;

        Ok(subscriber_from_row(&row)?)
    }

    #[tracing::instrument(name = "Remove a subscriber by email", skip(self))]
    async fn remove_by_email(&self, email: &str) -> Result<bool, anyhow::Error> {
        let result = sqlx::query("DELETE FROM subscribers WHERE email = $1")
            .bind(email)
            .execute(&self.db_pool)
            .await
            .context("Failed to remove a subscriber.")?;

        Ok(result.rows_affected() > 0)
    }
}
