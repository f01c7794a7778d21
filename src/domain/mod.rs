pub mod contact;
pub mod contact_repository;
pub mod email_address;
pub mod new_subscriber;
pub mod role;
pub mod subscriber;
pub mod subscriber_name;
pub mod subscriber_repository;
pub mod user;
pub mod user_repository;
