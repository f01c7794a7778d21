use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use std::time;

use crate::domain::email_address::EmailAddress;
use crate::notification::EmailGateway;

const REQUEST_TIMEOUT: time::Duration = time::Duration::from_secs(10);

/// HTTP client for a SendGrid compatible `/mail/send` endpoint.
#[derive(Debug, Clone)]
pub struct EmailClient {
    http_client: Client,
    base_url: String,
    sender: EmailAddress,
    api_key: Secret<String>,
}

#[derive(serde::Serialize)]
pub struct SendEmailBody<'a> {
    personalizations: Vec<SengridPersonalization<'a>>,
    from: SengridEmail<'a>,
    subject: &'a str,
    content: Vec<SengridContent<'a>>,
}

#[derive(serde::Serialize)]
struct SengridEmail<'a> {
    email: &'a str,
}

#[derive(serde::Serialize)]
struct SengridPersonalization<'a> {
    to: Vec<SengridEmail<'a>>,
}

#[derive(serde::Serialize)]
struct SengridContent<'a> {
    #[serde(rename = "type")]
    content_type: &'a str,
    value: &'a str,
}

impl EmailClient {
    pub fn new(
        base_url: String,
        sender: EmailAddress,
        api_key: Secret<String>,
        timeout: Option<time::Duration>,
    ) -> Result<EmailClient, reqwest::Error> {
        let http_client = Client::builder()
            .timeout(timeout.unwrap_or(REQUEST_TIMEOUT))
            .build()?;

        Ok(EmailClient {
            http_client,
            base_url,
            sender,
            api_key,
        })
    }

    #[tracing::instrument(
        name = "Send an email through the provider",
        skip(self, html_content),
        fields(recipient = %recipient)
    )]
    pub async fn send_email(
        &self,
        recipient: &EmailAddress,
        subject: &str,
        html_content: &str,
    ) -> Result<(), reqwest::Error> {
        let url = format!("{}/mail/send", self.base_url);
        let body = SendEmailBody {
            from: SengridEmail {
                email: self.sender.as_ref(),
            },
            personalizations: vec![SengridPersonalization {
                to: vec![SengridEmail {
                    email: recipient.as_ref(),
                }],
            }],
            subject,
            content: vec![SengridContent {
                content_type: "text/html",
                value: html_content,
            }],
        };

        self.http_client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&body)
            .send()
            .await?
            .error_for_status()?; // return an error when server response status code is 4xx or 5xx

        Ok(())
    }
}

#[async_trait]
impl EmailGateway for EmailClient {
    async fn send_email(
        &self,
        recipient: &EmailAddress,
        subject: &str,
        html_content: &str,
    ) -> Result<(), anyhow::Error> {
        EmailClient::send_email(self, recipient, subject, html_content).await?;
        Ok(())
    }
}
