use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::app_state::AppState;

/// OAuth2 password-grant form. Extra fields (`grant_type`, `scope`, ...) are
/// accepted and ignored.
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// `POST {prefix}/token`: exchange credentials for a bearer token.
///
/// The client budget keys on the socket peer, not on forwarding headers a
/// caller could rotate.
async fn login(
    req: HttpRequest,
    form: web::Form<LoginForm>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let LoginForm { username, password } = form.into_inner();
    let client_addr = req.peer_addr().map(|addr| addr.ip().to_string());

    let issued = app_state
        .auth()
        .authenticate_from(&username, &password, client_addr.as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(issued))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/token").route(web::post().to(login)));
}
