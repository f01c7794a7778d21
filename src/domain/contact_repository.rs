use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::contact::{Contact, NewContact, Reply};

#[async_trait]
pub trait ContactRepository: Send + Sync {
    /// Every contact, most recent `contact_date` first.
    async fn list_newest_first(&self) -> Result<Vec<Contact>, anyhow::Error>;

    async fn insert(&self, new_contact: NewContact) -> Result<Contact, anyhow::Error>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Contact>, anyhow::Error>;

    /// Appends `reply` to the contact's replies in a single atomic write.
    /// Returns `None` when no contact has this id.
    async fn push_reply(&self, id: Uuid, reply: Reply) -> Result<Option<Contact>, anyhow::Error>;

    async fn remove(&self, id: Uuid) -> Result<bool, anyhow::Error>;
}
