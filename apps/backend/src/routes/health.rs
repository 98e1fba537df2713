use actix_web::{web, HttpResponse};
use serde_json::json;

async fn root() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "Hello": "World" }))
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().content_type("text/plain").body("ok")
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(root))
        .route("/health", web::get().to(health));
}
