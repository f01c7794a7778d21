use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::new_subscriber::NewSubscriber;
use crate::domain::subscriber::Subscriber;
use crate::errors::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum InsertSubscriberError {
    #[error("You had already subscribed!")]
    AlreadySubscribed,
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for InsertSubscriberError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[async_trait]
pub trait SubscriberRepository: Send + Sync {
    /// Every subscriber, most recent `date_subscribed` first.
    async fn list_newest_first(&self) -> Result<Vec<Subscriber>, anyhow::Error>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Subscriber>, anyhow::Error>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Subscriber>, anyhow::Error>;

    async fn insert(&self, new_subscriber: &NewSubscriber)
        -> Result<Subscriber, InsertSubscriberError>;

    async fn remove_by_email(&self, email: &str) -> Result<bool, anyhow::Error>;
}
