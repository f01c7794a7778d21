use actix_web::dev::Server;
use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use anyhow::Context;
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::net::TcpListener;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

use crate::adapters::{
    PostgresContactRepository, PostgresSubscriberRepository, PostgresUserRepository,
};
use crate::config::{ClientUrl, DatabaseSettings, HandlerOptions, Settings};
use crate::domain::contact_repository::ContactRepository;
use crate::domain::subscriber_repository::SubscriberRepository;
use crate::domain::user_repository::UserRepository;
use crate::email_client::EmailClient;
use crate::notification::{drain_dead_letters, Notifier};
use crate::routes;

pub struct Application {
    pub port: u16,
    pub server: Server,
}

/// Everything the handlers reach through `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub contacts: Arc<dyn ContactRepository>,
    pub subscribers: Arc<dyn SubscriberRepository>,
    pub users: Arc<dyn UserRepository>,
    pub notifier: Notifier,
    pub client_url: ClientUrl,
    pub options: HandlerOptions,
}

impl Application {
    pub async fn build(config: Settings) -> Result<Self, anyhow::Error> {
        let db_pool = get_connection_db_pool(&config.database);
        let sender_email = config
            .get_email_client_sender()
            .map_err(anyhow::Error::msg)
            .context("Sender email is not valid.")?;
        let email_client = EmailClient::new(
            config.email_client.get_base_url(),
            sender_email,
            config.email_client.get_api_key(),
            Some(config.email_client.get_timeout()),
        )
        .context("Failed to build the email client.")?;

        let (notifier, dead_letters) = Notifier::new(Arc::new(email_client));
        tokio::spawn(drain_dead_letters(dead_letters));

        let state = AppState {
            contacts: Arc::new(PostgresContactRepository::new(db_pool.clone())),
            subscribers: Arc::new(PostgresSubscriberRepository::new(db_pool.clone())),
            users: Arc::new(PostgresUserRepository::new(db_pool)),
            notifier,
            client_url: config.get_client_url(),
            options: config.get_handler_options(),
        };

        let listener =
            TcpListener::bind(config.get_address()).context("Failed to bind the address.")?;
        let port = listener.local_addr()?.port();
        let server = run(listener, state)?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stop(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn run(listener: TcpListener, state: AppState) -> Result<Server, std::io::Error> {
    let contacts = web::Data::from(state.contacts);
    let subscribers = web::Data::from(state.subscribers);
    let users = web::Data::from(state.users);
    let notifier = web::Data::new(state.notifier);
    let client_url = web::Data::new(state.client_url);
    let options = web::Data::new(state.options);

    let server = HttpServer::new(move || {
        App::new()
            // Request logger: request id, status and latency for every call
            .wrap(TracingLogger::default())
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(contacts.clone())
            .app_data(subscribers.clone())
            .app_data(users.clone())
            .app_data(notifier.clone())
            .app_data(client_url.clone())
            .app_data(options.clone())
            .configure(routes::configure)
    })
    .listen(listener)?
    .run();

    Ok(server)
}

/// Malformed JSON bodies answer with the same `{msg}` envelope as the handlers.
fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = HttpResponse::BadRequest().json(json!({ "msg": err.to_string() }));
    InternalError::from_response(err, response).into()
}

pub fn get_connection_db_pool(config: &DatabaseSettings) -> Pool<Postgres> {
    PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(2))
        .connect_lazy_with(config.get_db_options())
}
