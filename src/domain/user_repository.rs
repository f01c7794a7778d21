use async_trait::async_trait;

use crate::domain::role::Role;
use crate::domain::user::User;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_role(&self, role: Role) -> Result<Vec<User>, anyhow::Error>;

    /// Resolves an opaque session token to the user that owns it.
    async fn find_by_session_token(&self, token: &str) -> Result<Option<User>, anyhow::Error>;
}
