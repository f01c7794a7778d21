use actix_web::{HttpRequest, HttpResponse, Responder};

/// Endpoint used by clients to know if the server is working
#[tracing::instrument(name = "Health Check handler", skip(_req))]
pub async fn health_check(_req: HttpRequest) -> impl Responder {
    HttpResponse::Ok()
}
