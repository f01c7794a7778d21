mod guard;

pub use guard::{AccessGuard, AuthenticatedUser};
