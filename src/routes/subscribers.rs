use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use anyhow::Context;
use serde_json::json;
use uuid::Uuid;

use crate::config::{ClientUrl, HandlerOptions};
use crate::domain::new_subscriber::{NewSubscriber, NewSubscriberBody, NewSubscriberError};
use crate::domain::subscriber_repository::{InsertSubscriberError, SubscriberRepository};
use crate::errors::error_chain_fmt;
use crate::notification::{subscribe_welcome, Notifier};

#[derive(thiserror::Error)]
pub enum SubscriberError {
    #[error("Please fill all the fields")]
    MissingFields,
    #[error("{0}")]
    ValidationError(String),
    #[error("You had already subscribed!")]
    AlreadySubscribed,
    #[error("{0}")]
    ListError(String),
    #[error("Failed to retrieve! {0}")]
    RetrieveError(String),
    #[error("{0}")]
    UnsubscribeError(String),
    #[error("Something went wrong while subscribing!")]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for SubscriberError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for SubscriberError {
    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            SubscriberError::RetrieveError(_) | SubscriberError::UnsubscribeError(_) => {
                json!({ "msg": self.to_string(), "success": false })
            }
            _ => json!({ "msg": self.to_string() }),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<NewSubscriberError> for SubscriberError {
    fn from(err: NewSubscriberError) -> Self {
        match err {
            NewSubscriberError::MissingFields => SubscriberError::MissingFields,
            NewSubscriberError::Invalid(message) => SubscriberError::ValidationError(message),
        }
    }
}

impl From<InsertSubscriberError> for SubscriberError {
    fn from(err: InsertSubscriberError) -> Self {
        match err {
            InsertSubscriberError::AlreadySubscribed => SubscriberError::AlreadySubscribed,
            InsertSubscriberError::UnexpectedError(err) => SubscriberError::UnexpectedError(err),
        }
    }
}

#[tracing::instrument(name = "List subscribers", skip(repo, options))]
pub async fn list_subscribers(
    repo: web::Data<dyn SubscriberRepository>,
    options: web::Data<HandlerOptions>,
) -> Result<HttpResponse, SubscriberError> {
    let subscribers = repo.list_newest_first().await.map_err(|err| {
        tracing::error!("Failed to list subscribers: {:?}", err);
        SubscriberError::ListError(err.to_string())
    })?;

    if subscribers.is_empty() && options.legacy_empty_list_error {
        return Err(SubscriberError::ListError(String::from(
            "No subscribers found",
        )));
    }

    Ok(HttpResponse::Ok().json(subscribers))
}

#[tracing::instrument(
    name = "Add a new subscriber",
    skip(body, repo, notifier, client_url),
    fields(
        subscriber_email = ?body.email,
        subscriber_name = ?body.name
    )
)]
pub async fn create_subscriber(
    body: web::Json<NewSubscriberBody>,
    repo: web::Data<dyn SubscriberRepository>,
    notifier: web::Data<Notifier>,
    client_url: web::Data<ClientUrl>,
) -> Result<HttpResponse, SubscriberError> {
    let new_subscriber: NewSubscriber = body.into_inner().try_into()?;

    let existing = repo
        .find_by_email(new_subscriber.email.as_ref())
        .await
        .context("Failed to look up an existing subscription.")?;
    if existing.is_some() {
        return Err(SubscriberError::AlreadySubscribed);
    }

    let subscriber = repo.insert(&new_subscriber).await?;

    notifier.submit(
        subscriber.email.clone(),
        subscribe_welcome(subscriber.name.as_ref(), &client_url.0),
    );

    Ok(HttpResponse::Ok().json(json!({ "subscriber": subscriber.summary() })))
}

#[tracing::instrument(name = "Get a subscriber", skip(repo))]
pub async fn get_subscriber(
    path: web::Path<String>,
    repo: web::Data<dyn SubscriberRepository>,
) -> Result<HttpResponse, SubscriberError> {
    let id = Uuid::parse_str(&path).map_err(|_| {
        SubscriberError::RetrieveError(format!("{} is not a valid subscriber id", path))
    })?;

    let subscriber = repo
        .find_by_id(id)
        .await
        .map_err(|err| {
            tracing::error!("Failed to fetch subscriber {}: {:?}", id, err);
            SubscriberError::RetrieveError(err.to_string())
        })?
        .ok_or_else(|| SubscriberError::RetrieveError(String::from("This subscriber does not exist!")))?;

    Ok(HttpResponse::Ok().json(subscriber))
}

#[tracing::instrument(name = "Unsubscribe", skip(repo))]
pub async fn unsubscribe(
    path: web::Path<String>,
    repo: web::Data<dyn SubscriberRepository>,
) -> Result<HttpResponse, SubscriberError> {
    let email = path.into_inner();

    let subscriber = repo
        .find_by_email(&email)
        .await
        .map_err(|err| {
            tracing::error!("Failed to look up subscriber: {:?}", err);
            SubscriberError::UnsubscribeError(err.to_string())
        })?
        .ok_or_else(|| SubscriberError::UnsubscribeError(String::from("subscriber is not found!")))?;

    let removed = repo
        .remove_by_email(subscriber.email.as_ref())
        .await
        .map_err(|err| {
            tracing::error!("Failed to remove subscriber: {:?}", err);
            SubscriberError::UnsubscribeError(err.to_string())
        })?;

    if !removed {
        return Err(SubscriberError::UnsubscribeError(String::from(
            "Something went wrong while unsubscribing!",
        )));
    }

    Ok(HttpResponse::Ok().json(json!({ "msg": "Unsubscribed successfully!" })))
}
