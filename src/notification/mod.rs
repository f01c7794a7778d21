//! Transactional email side effects.
//!
//! Deliveries run on detached tasks so a response never waits on the email
//! provider. A delivery that fails is reported on the dead-letter channel
//! instead of disappearing.

mod templates;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::Instrument;

use crate::domain::email_address::EmailAddress;
use crate::domain::role::Role;
use crate::domain::user_repository::UserRepository;

pub use templates::{
    contact_admin_alert, contact_thank_you, contact_reply, subscribe_welcome, Email,
};

#[async_trait]
pub trait EmailGateway: Send + Sync {
    async fn send_email(
        &self,
        recipient: &EmailAddress,
        subject: &str,
        html_content: &str,
    ) -> Result<(), anyhow::Error>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedNotification {
    pub recipient: String,
    pub subject: String,
    pub reason: String,
}

#[derive(Clone)]
pub struct Notifier {
    gateway: Arc<dyn EmailGateway>,
    dead_letters: UnboundedSender<FailedNotification>,
}

impl Notifier {
    pub fn new(gateway: Arc<dyn EmailGateway>) -> (Self, UnboundedReceiver<FailedNotification>) {
        let (dead_letters, receiver) = unbounded_channel();

        (
            Self {
                gateway,
                dead_letters,
            },
            receiver,
        )
    }

    /// Queues `email` for `recipient` and returns immediately.
    pub fn submit(&self, recipient: EmailAddress, email: Email) {
        let notifier = self.clone();
        let span = tracing::info_span!(
            "Deliver notification",
            recipient = %recipient,
            subject = %email.subject
        );

        tokio::spawn(async move { notifier.deliver(&recipient, &email).await }.instrument(span));
    }

    /// Queues `email` for every user holding `role`. The lookup itself runs
    /// on the detached task.
    pub fn submit_to_role(&self, users: Arc<dyn UserRepository>, role: Role, email: Email) {
        let notifier = self.clone();
        let span = tracing::info_span!(
            "Deliver notification to role",
            role = %role,
            subject = %email.subject
        );

        tokio::spawn(
            async move {
                let recipients = match users.find_by_role(role).await {
                    Ok(recipients) => recipients,
                    Err(err) => {
                        notifier.dead_letter(format!("role:{}", role), &email, &err);
                        return;
                    }
                };

                for user in recipients {
                    notifier.deliver(&user.email, &email).await;
                }
            }
            .instrument(span),
        );
    }

    async fn deliver(&self, recipient: &EmailAddress, email: &Email) {
        if let Err(err) = self
            .gateway
            .send_email(recipient, &email.subject, &email.html)
            .await
        {
            self.dead_letter(recipient.to_string(), email, &err);
        }
    }

    fn dead_letter(&self, recipient: String, email: &Email, err: &anyhow::Error) {
        let failed = FailedNotification {
            recipient,
            subject: email.subject.clone(),
            reason: format!("{:#}", err),
        };

        if let Err(unsent) = self.dead_letters.send(failed) {
            // Nobody drains the channel any more; keep the failure in the logs.
            tracing::error!(
                target: "dead_letter",
                recipient = %unsent.0.recipient,
                reason = %unsent.0.reason,
                "Notification could not be delivered"
            );
        }
    }
}

/// Logs every failed delivery until all notifiers are dropped.
pub async fn drain_dead_letters(mut receiver: UnboundedReceiver<FailedNotification>) {
    while let Some(failed) = receiver.recv().await {
        tracing::error!(
            target: "dead_letter",
            recipient = %failed.recipient,
            subject = %failed.subject,
            reason = %failed.reason,
            "Notification could not be delivered"
        );
    }
}
