use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::email_address::EmailAddress;

const REQUIRED_FIELDS: [&str; 3] = ["contact_name", "email", "contact_question"];
// Keys owned by the store; a client cannot set them.
const RESERVED_FIELDS: [&str; 3] = ["_id", "contact_date", "replies"];

/// A message left by a website visitor, together with every reply sent to it.
#[derive(Debug, Clone, Serialize)]
pub struct Contact {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub contact_name: String,
    pub email: String,
    pub contact_question: String,
    pub contact_date: DateTime<Utc>,
    pub replies: Vec<Reply>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct NewContact {
    pub contact_name: String,
    pub email: EmailAddress,
    pub contact_question: String,
    pub extra: Map<String, Value>,
}

/// One reply as sent by the caller, stamped with who stored it and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    #[serde(flatten)]
    pub body: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replied_by: Option<String>,
    pub reply_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub message: String,
    pub path: String,
}

/// Field-level schema violations, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(BTreeMap<String, FieldError>);

impl FieldErrors {
    fn add(&mut self, field: &str, message: String) {
        self.0.insert(
            field.to_string(),
            FieldError {
                message,
                path: field.to_string(),
            },
        );
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&FieldError> {
        self.0.get(field)
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields: Vec<&str> = self.0.keys().map(String::as_str).collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

impl NewContact {
    /// Validates a free-form body against the contact schema. Fields beyond the
    /// required ones are kept as they are.
    pub fn parse(body: Value) -> Result<NewContact, FieldErrors> {
        let mut errors = FieldErrors::default();

        let mut document = match body {
            Value::Object(document) => document,
            _ => {
                for field in REQUIRED_FIELDS {
                    errors.add(field, format!("Path `{}` is required.", field));
                }
                return Err(errors);
            }
        };

        for field in RESERVED_FIELDS {
            document.remove(field);
        }

        let mut required = BTreeMap::new();
        for field in REQUIRED_FIELDS {
            match document.remove(field) {
                Some(Value::String(value)) if !value.trim().is_empty() => {
                    required.insert(field, value);
                }
                Some(Value::String(_)) | Some(Value::Null) | None => {
                    errors.add(field, format!("Path `{}` is required.", field));
                }
                Some(other) => {
                    errors.add(
                        field,
                        format!("Cast to string failed for value `{}` at path `{}`", other, field),
                    );
                }
            }
        }

        let email = match required.remove("email").map(EmailAddress::parse) {
            Some(Ok(email)) => Some(email),
            Some(Err(message)) => {
                errors.add("email", message);
                None
            }
            None => None,
        };

        match (
            required.remove("contact_name"),
            email,
            required.remove("contact_question"),
        ) {
            (Some(contact_name), Some(email), Some(contact_question)) if errors.is_empty() => {
                Ok(NewContact {
                    contact_name,
                    email,
                    contact_question,
                    extra: document,
                })
            }
            _ => Err(errors),
        }
    }
}

impl Reply {
    pub fn new(mut body: Map<String, Value>, replied_by: Option<String>) -> Self {
        body.remove("reply_date");
        body.remove("replied_by");
        Self {
            body,
            replied_by,
            reply_date: Utc::now(),
        }
    }

    /// The address the caller asked the reply to be delivered to.
    pub fn to_contact(&self) -> Option<&str> {
        self.body.get("to_contact").and_then(Value::as_str)
    }

    pub fn text(&self, field: &str) -> &str {
        self.body.get(field).and_then(Value::as_str).unwrap_or_default()
    }
}
