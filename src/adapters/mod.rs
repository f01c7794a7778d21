pub mod postgres_contact_repository;
pub mod postgres_subscriber_repository;
pub mod postgres_user_repository;

pub use postgres_contact_repository::PostgresContactRepository;
pub use postgres_subscriber_repository::PostgresSubscriberRepository;
pub use postgres_user_repository::PostgresUserRepository;
