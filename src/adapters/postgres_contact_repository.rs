use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use crate::domain::contact::{Contact, NewContact, Reply};
use crate::domain::contact_repository::ContactRepository;

const CONTACT_COLUMNS: &str =
    "id, contact_name, email, contact_question, contact_date, extra, replies";

#[derive(Debug, Clone)]
pub struct PostgresContactRepository {
    db_pool: PgPool,
}

impl PostgresContactRepository {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

fn contact_from_row(row: &PgRow) -> Result<Contact, sqlx::Error> {
    let Json(extra): Json<Map<String, Value>> = row.try_get("extra")?;
    let Json(replies): Json<Vec<Reply>> = row.try_get("replies")?;

    Ok(Contact {
        id: row.try_get("id")?,
        contact_name: row.try_get("contact_name")?,
        email: row.try_get("email")?,
        contact_question: row.try_get("contact_question")?,
        contact_date: row.try_get("contact_date")?,
        replies,
        extra,
    })
}

#[async_trait]
impl ContactRepository for PostgresContactRepository {
    #[tracing::instrument(name = "Fetch all contacts from the database", skip(self))]
    async fn list_newest_first(&self) -> Result<Vec<Contact>, anyhow::Error> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM contacts ORDER BY contact_date DESC",
            CONTACT_COLUMNS
        ))
        .fetch_all(&self.db_pool)
        .await
        .context("Failed to fetch contacts.")?;

        rows.iter()
            .map(contact_from_row)
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to decode a stored contact.")
    }

    #[tracing::instrument(
        name = "Insert a new contact into the database",
        skip(self, new_contact),
        fields(contact_email = %new_contact.email)
    )]
    async fn insert(&self, new_contact: NewContact) -> Result<Contact, anyhow::Error> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO contacts (id, contact_name, email, contact_question, contact_date, extra, replies)
            VALUES ($1, $2, $3, $4, $5, $6, '[]'::jsonb)
            RETURNING {}
            "#,
            CONTACT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&new_contact.contact_name)
        .bind(new_contact.email.as_ref())
        .bind(&new_contact.contact_question)
        .bind(Utc::now())
        .bind(Json(&new_contact.extra))
        .fetch_one(&self.db_pool)
        .await
        .context("Failed to insert a new contact.")?;

        Ok(contact_from_row(&row)?)
    }

    #[tracing::instrument(name = "Fetch a contact by id", skip(self))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Contact>, anyhow::Error> {
        let row = sqlx::query(&format!("SELECT {} FROM contacts WHERE id = $1", CONTACT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await
            .context("Failed to fetch a contact.")?;

        Ok(row.as_ref().map(contact_from_row).transpose()?)
    }

    #[tracing::instrument(name = "Append a reply to a contact", skip(self, reply))]
    async fn push_reply(&self, id: Uuid, reply: Reply) -> Result<Option<Contact>, anyhow::Error> {
        // The append happens inside one UPDATE, so concurrent replies never drop each other.
        let row = sqlx::query(&format!(
            r#"
            UPDATE contacts
            SET replies = replies || jsonb_build_array($2::jsonb)
            WHERE id = $1
            RETURNING {}
            "#,
            CONTACT_COLUMNS
        ))
        .bind(id)
        .bind(Json(&reply))
        .fetch_optional(&self.db_pool)
        .await
        .context("Failed to append a reply.")?;

        Ok(row.as_ref().map(contact_from_row).transpose()?)
    }

    #[tracing::instrument(name = "Remove a contact", skip(self))]
    async fn remove(&self, id: Uuid) -> Result<bool, anyhow::Error> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = $1")
            .bind(id)
            .execute(&self.db_pool)
            .await
            .context("Failed to remove a contact.")?;

        Ok(result.rows_affected() > 0)
    }
}
