use std::future::{ready, Ready};
use std::rc::Rc;

use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::{header, StatusCode};
use actix_web::{web, Error, FromRequest, HttpMessage, HttpRequest, HttpResponse};
use futures_util::future::LocalBoxFuture;

use crate::domain::role::Role;
use crate::domain::user::User;
use crate::domain::user_repository::UserRepository;

const SESSION_TOKEN_HEADER: &str = "x-auth-token";

#[derive(Debug, Clone)]
enum Access {
    Authenticated,
    Roles(Vec<Role>),
}

/// Per-route access check, applied with `.wrap(...)` on a resource.
///
/// The caller's session token is resolved to a [`User`] before the handler
/// runs; requests without a valid token get `401`, requests whose role is not
/// allowed get `403`. Admitted requests carry the caller as an
/// [`AuthenticatedUser`].
#[derive(Debug, Clone)]
pub struct AccessGuard {
    access: Access,
}

impl AccessGuard {
    /// Any caller with a valid session.
    pub fn authenticated() -> Self {
        Self {
            access: Access::Authenticated,
        }
    }

    /// Callers whose role is one of `roles`.
    pub fn require(roles: &[Role]) -> Self {
        Self {
            access: Access::Roles(roles.to_vec()),
        }
    }

    fn admits(access: &Access, role: Role) -> bool {
        match access {
            Access::Authenticated => true,
            Access::Roles(roles) => roles.contains(&role),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AccessGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AccessGuardMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AccessGuardMiddleware {
            service: Rc::new(service),
            access: self.access.clone(),
        }))
    }
}

pub struct AccessGuardMiddleware<S> {
    service: Rc<S>,
    access: Access,
}

impl<S, B> Service<ServiceRequest> for AccessGuardMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let access = self.access.clone();
        let token = session_token(&req);
        let users = req.app_data::<web::Data<dyn UserRepository>>().cloned();

        Box::pin(async move {
            let token = match token {
                Some(token) => token,
                None => {
                    return Ok(reject(
                        req,
                        StatusCode::UNAUTHORIZED,
                        "No token, authorization denied",
                    ))
                }
            };

            let users = match users {
                Some(users) => users,
                None => {
                    tracing::error!("No user repository registered for the access guard");
                    return Ok(reject(
                        req,
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Something went wrong",
                    ));
                }
            };

            let user = match users.find_by_session_token(&token).await {
                Ok(Some(user)) => user,
                Ok(None) => return Ok(reject(req, StatusCode::UNAUTHORIZED, "Token is not valid")),
                Err(err) => {
                    tracing::error!("Failed to resolve session token: {:?}", err);
                    return Ok(reject(
                        req,
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Something went wrong",
                    ));
                }
            };

            if !AccessGuard::admits(&access, user.role) {
                tracing::warn!(
                    user_id = %user.id,
                    role = %user.role,
                    "Caller role is not allowed on this route"
                );
                return Ok(reject(req, StatusCode::FORBIDDEN, "Access denied"));
            }

            req.extensions_mut().insert(AuthenticatedUser(user));

            service
                .call(req)
                .await
                .map(ServiceResponse::map_into_left_body)
        })
    }
}

fn session_token(req: &ServiceRequest) -> Option<String> {
    let headers = req.headers();

    let from_session_header = headers
        .get(SESSION_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());
    let from_bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    from_session_header
        .or(from_bearer)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(String::from)
}

fn reject<B>(req: ServiceRequest, status: StatusCode, msg: &str) -> ServiceResponse<EitherBody<B>> {
    let response = HttpResponse::build(status).json(serde_json::json!({ "msg": msg }));

    req.into_response(response).map_into_right_body()
}

/// The caller admitted by an [`AccessGuard`].
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let user = req.extensions().get::<AuthenticatedUser>().cloned();

        ready(user.ok_or_else(|| {
            actix_web::error::ErrorUnauthorized(serde_json::json!({
                "msg": "No token, authorization denied"
            }))
        }))
    }
}
