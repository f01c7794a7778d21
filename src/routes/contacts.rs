use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use serde::Serialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::authentication::AuthenticatedUser;
use crate::config::HandlerOptions;
use crate::domain::contact::{Contact, FieldErrors, NewContact, Reply};
use crate::domain::contact_repository::ContactRepository;
use crate::domain::email_address::EmailAddress;
use crate::domain::role::Role;
use crate::domain::user_repository::UserRepository;
use crate::errors::error_chain_fmt;
use crate::notification::{contact_admin_alert, contact_reply, contact_thank_you, Notifier};

#[derive(thiserror::Error)]
pub enum ContactError {
    #[error("{0}")]
    ListError(String),
    #[error("Contact validation failed: {0}")]
    ValidationError(FieldErrors),
    #[error("Something went wrong")]
    UnexpectedError(#[from] anyhow::Error),
    #[error("The contact does not exist or could not be reached.")]
    NotFound,
    #[error("Failed to update! {0}")]
    UpdateError(String),
}

impl std::fmt::Debug for ContactError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for ContactError {
    fn status_code(&self) -> StatusCode {
        match self {
            ContactError::ListError(_)
            | ContactError::ValidationError(_)
            | ContactError::UpdateError(_) => StatusCode::BAD_REQUEST,
            ContactError::NotFound => StatusCode::NOT_FOUND,
            ContactError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ContactError::ListError(msg) => json!({ "msg": msg }),
            ContactError::ValidationError(errors) => json!({ "errors": errors }),
            ContactError::UnexpectedError(_) => json!({ "msg": self.to_string() }),
            ContactError::NotFound => json!({ "success": false }),
            ContactError::UpdateError(_) => json!({ "msg": self.to_string(), "success": false }),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}

/// Outcome of a reply, shaped like a document store update result.
#[derive(Debug, Serialize)]
pub struct UpdateAcknowledgement {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
}

#[tracing::instrument(name = "List contacts", skip(repo, options))]
pub async fn list_contacts(
    repo: web::Data<dyn ContactRepository>,
    options: web::Data<HandlerOptions>,
) -> Result<HttpResponse, ContactError> {
    let contacts = repo.list_newest_first().await.map_err(|err| {
        tracing::error!("Failed to list contacts: {:?}", err);
        ContactError::ListError(err.to_string())
    })?;

    if contacts.is_empty() && options.legacy_empty_list_error {
        return Err(ContactError::ListError(String::from("No contacts found")));
    }

    Ok(HttpResponse::Ok().json(contacts))
}

#[tracing::instrument(
    name = "Create a contact",
    skip(body, repo, users, notifier),
    fields(contact_email = tracing::field::Empty)
)]
pub async fn create_contact(
    body: web::Json<Value>,
    repo: web::Data<dyn ContactRepository>,
    users: web::Data<dyn UserRepository>,
    notifier: web::Data<Notifier>,
) -> Result<HttpResponse, ContactError> {
    let new_contact = NewContact::parse(body.into_inner()).map_err(|errors| {
        tracing::error!("Validation error: {}", errors);
        ContactError::ValidationError(errors)
    })?;
    let contact_email = new_contact.email.clone();
    tracing::Span::current().record("contact_email", tracing::field::display(&contact_email));

    let contact = repo.insert(new_contact).await?;
    let response = HttpResponse::Ok().json(&contact);

    notifier.submit(
        contact_email.clone(),
        contact_thank_you(&contact.contact_name),
    );
    notifier.submit_to_role(
        users.into_inner(),
        Role::Admin,
        contact_admin_alert(contact_email.as_ref()),
    );

    Ok(response)
}

#[tracing::instrument(name = "Get a contact", skip(repo))]
pub async fn get_contact(
    path: web::Path<String>,
    repo: web::Data<dyn ContactRepository>,
) -> Result<HttpResponse, ContactError> {
    let id = Uuid::parse_str(&path).map_err(|_| ContactError::NotFound)?;

    match repo.find_by_id(id).await {
        Ok(Some(contact)) => Ok(HttpResponse::Ok().json(contact)),
        Ok(None) => Err(ContactError::NotFound),
        Err(err) => {
            tracing::error!("Failed to fetch contact {}: {:?}", id, err);
            Err(ContactError::NotFound)
        }
    }
}

#[tracing::instrument(
    name = "Reply to a contact",
    skip(body, caller, repo, notifier, options),
    fields(replied_by = %caller.0.email)
)]
pub async fn reply_to_contact(
    path: web::Path<String>,
    body: web::Json<Map<String, Value>>,
    caller: AuthenticatedUser,
    repo: web::Data<dyn ContactRepository>,
    notifier: web::Data<Notifier>,
    options: web::Data<HandlerOptions>,
) -> Result<HttpResponse, ContactError> {
    let id = Uuid::parse_str(&path)
        .map_err(|_| ContactError::UpdateError(format!("{} is not a valid contact id", path)))?;
    let reply = Reply::new(body.into_inner(), Some(caller.0.email.to_string()));

    let contact = repo
        .push_reply(id, reply.clone())
        .await
        .map_err(|err| {
            tracing::error!("Failed to append reply: {:?}", err);
            ContactError::UpdateError(err.to_string())
        })?
        .ok_or_else(|| ContactError::UpdateError(String::from("This contact does not exist!")))?;

    send_reply_email(&notifier, &contact, &reply, options.reply_to_stored_address);

    Ok(HttpResponse::Ok().json(UpdateAcknowledgement {
        acknowledged: true,
        matched_count: 1,
        modified_count: 1,
    }))
}

fn send_reply_email(notifier: &Notifier, contact: &Contact, reply: &Reply, to_stored: bool) {
    let target = if to_stored {
        Some(contact.email.as_str())
    } else {
        reply.to_contact()
    };

    let recipient = match target.map(|email| EmailAddress::parse(email.to_string())) {
        Some(Ok(recipient)) => recipient,
        Some(Err(err)) => {
            tracing::warn!("Reply stored without email, bad target: {}", err);
            return;
        }
        None => {
            tracing::warn!("Reply stored without email, no target address");
            return;
        }
    };

    let name = Some(reply.text("to_contact_name"))
        .filter(|name| !name.is_empty())
        .unwrap_or(contact.contact_name.as_str());
    let question = Some(reply.text("contact_question"))
        .filter(|question| !question.is_empty())
        .unwrap_or(contact.contact_question.as_str());

    notifier.submit(
        recipient,
        contact_reply(name, question, reply.text("message")),
    );
}

#[tracing::instrument(name = "Delete a contact", skip(repo))]
pub async fn delete_contact(
    path: web::Path<String>,
    repo: web::Data<dyn ContactRepository>,
) -> Result<HttpResponse, ContactError> {
    let id = Uuid::parse_str(&path).map_err(|_| ContactError::NotFound)?;

    let removed = match repo.find_by_id(id).await {
        Ok(Some(contact)) => repo.remove(contact.id).await,
        Ok(None) => return Err(ContactError::NotFound),
        Err(err) => Err(err),
    };

    match removed {
        Ok(true) => Ok(HttpResponse::Ok().json(json!({ "success": true }))),
        Ok(false) => Err(ContactError::NotFound),
        Err(err) => {
            tracing::error!("Failed to remove contact {}: {:?}", id, err);
            Err(ContactError::NotFound)
        }
    }
}
