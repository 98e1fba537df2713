use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthenticatedIdentity, Role};
use crate::error::AppError;
use crate::extractors::AuthToken;
use crate::services::users::{self as users_service, NewUser};
use crate::state::app_state::AppState;

#[derive(Debug, Serialize)]
struct MeResponse {
    email: String,
    role: Role,
}

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

fn require_admin(identity: &AuthenticatedIdentity) -> Result<(), AppError> {
    if identity.is_admin() {
        Ok(())
    } else {
        tracing::warn!(role = %identity.role, "admin-only endpoint refused");
        Err(AppError::forbidden())
    }
}

async fn me(token: AuthToken, app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let identity = app_state.auth().resolve(&token.token).await?;

    Ok(HttpResponse::Ok().json(MeResponse {
        email: identity.subject,
        role: identity.role,
    }))
}

async fn list_users(
    token: AuthToken,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let identity = app_state.auth().resolve(&token.token).await?;
    require_admin(&identity)?;

    let users = users_service::list_users(app_state.require_db()?).await?;
    Ok(HttpResponse::Ok().json(users))
}

async fn create_user(
    token: AuthToken,
    body: web::Json<CreateUserRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let identity = app_state.auth().resolve(&token.token).await?;
    require_admin(&identity)?;

    let CreateUserRequest {
        email,
        password,
        role,
    } = body.into_inner();
    let new_user = NewUser {
        email,
        password,
        role: role.unwrap_or(Role::User),
    };

    let created = users_service::register_user(app_state.require_db()?, new_user).await?;
    Ok(HttpResponse::Created().json(created))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/users/me").route(web::get().to(me)))
        .service(
            web::resource("/users")
                .route(web::get().to(list_users))
                .route(web::post().to(create_user)),
        );
}
