pub mod adapters;
pub mod authentication;
pub mod config;
pub mod domain;
pub mod email_client;
pub mod errors;
pub mod notification;
pub mod routes;
pub mod startup;
pub mod telemetry;
