use actix_web::error::{Error as ActixError, JsonPayloadError, UrlencodedError};
use actix_web::{web, HttpRequest};

use crate::error::AppError;

pub mod auth;
pub mod health;
pub mod users;

fn form_error_handler(err: UrlencodedError, _req: &HttpRequest) -> ActixError {
    AppError::malformed(format!("Invalid form body: {err}")).into()
}

fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> ActixError {
    AppError::malformed(format!("Invalid JSON body: {err}")).into()
}

/// Register every route. `api_prefix` is the versioned scope (`/api/v1`).
///
/// Used by `main.rs` and by the integration tests, so both see the same
/// paths and body-decoding error handling.
pub fn configure(cfg: &mut web::ServiceConfig, api_prefix: &str) {
    cfg.app_data(web::FormConfig::default().error_handler(form_error_handler))
        .app_data(web::JsonConfig::default().error_handler(json_error_handler));

    cfg.configure(health::configure_routes);
    cfg.service(
        web::scope(api_prefix)
            .configure(auth::configure_routes)
            .configure(users::configure_routes),
    );
}
