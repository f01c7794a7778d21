use serde::Deserialize;

use crate::domain::email_address::EmailAddress;
use crate::domain::subscriber_name::SubscriberName;

#[derive(Debug)]
pub struct NewSubscriber {
    pub email: EmailAddress,
    pub name: SubscriberName,
}

#[derive(Deserialize, Debug, Default)]
pub struct NewSubscriberBody {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum NewSubscriberError {
    MissingFields,
    Invalid(String),
}

impl NewSubscriberBody {
    fn filled(field: Option<String>) -> Option<String> {
        field.filter(|value| !value.is_empty())
    }
}

impl TryFrom<NewSubscriberBody> for NewSubscriber {
    type Error = NewSubscriberError;

    fn try_from(body: NewSubscriberBody) -> Result<Self, Self::Error> {
        let (name, email) = match (
            NewSubscriberBody::filled(body.name),
            NewSubscriberBody::filled(body.email),
        ) {
            (Some(name), Some(email)) => (name, email),
            _ => return Err(NewSubscriberError::MissingFields),
        };

        let name = SubscriberName::parse(name).map_err(NewSubscriberError::Invalid)?;
        let email = EmailAddress::parse(email).map_err(NewSubscriberError::Invalid)?;

        Ok(NewSubscriber { email, name })
    }
}
