use uuid::Uuid;

use crate::domain::email_address::EmailAddress;
use crate::domain::role::Role;

/// A registered account. Only read here: to authenticate callers and to find
/// who should hear about new contact messages.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: EmailAddress,
    pub role: Role,
}
