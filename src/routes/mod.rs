mod contacts;
mod health_check;
mod subscribers;

use actix_web::{guard, web};

use crate::authentication::AccessGuard;
use crate::domain::role::Role;

pub use contacts::*;
pub use health_check::*;
pub use subscribers::*;

/// Every route of the API. Access guards are attached per resource, so one
/// path can be public for one method and restricted for another.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health_check", web::get().to(health_check))
        .service(
            web::resource("/contacts")
                .guard(guard::Get())
                .wrap(AccessGuard::require(&[Role::Creator, Role::Admin]))
                .to(list_contacts),
        )
        .service(web::resource("/contacts").route(web::post().to(create_contact)))
        .service(
            web::resource("/contacts/{id}")
                .guard(guard::Get())
                .wrap(AccessGuard::require(&[Role::Admin]))
                .to(get_contact),
        )
        .service(
            web::resource("/contacts/{id}")
                .guard(guard::Put())
                .wrap(AccessGuard::require(&[Role::Creator, Role::Admin]))
                .to(reply_to_contact),
        )
        .service(
            web::resource("/contacts/{id}")
                .guard(guard::Delete())
                .wrap(AccessGuard::require(&[Role::Admin]))
                .to(delete_contact),
        )
        .service(
            web::resource("/subscribers")
                .guard(guard::Get())
                .wrap(AccessGuard::require(&[Role::Admin]))
                .to(list_subscribers),
        )
        .service(web::resource("/subscribers").route(web::post().to(create_subscriber)))
        .service(
            web::resource("/subscribers/{id}")
                .guard(guard::Get())
                .wrap(AccessGuard::require(&[Role::Admin]))
                .to(get_subscriber),
        )
        .service(
            web::resource("/subscribers/{uemail}")
                .guard(guard::Delete())
                .wrap(AccessGuard::authenticated())
                .to(unsubscribe),
        );
}
