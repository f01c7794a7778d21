use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::email_address::EmailAddress;
use crate::domain::subscriber_name::SubscriberName;

#[derive(Debug, Clone, Serialize)]
pub struct Subscriber {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: SubscriberName,
    pub email: EmailAddress,
    pub date_subscribed: DateTime<Utc>,
}

/// What a caller gets back after subscribing; the stored document stays private.
#[derive(Debug, Serialize)]
pub struct SubscriberSummary<'a> {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: &'a str,
    pub email: &'a str,
}

impl Subscriber {
    pub fn summary(&self) -> SubscriberSummary<'_> {
        SubscriberSummary {
            id: self.id,
            name: self.name.as_ref(),
            email: self.email.as_ref(),
        }
    }
}
