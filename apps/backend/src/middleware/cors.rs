use actix_cors::Cors;
use actix_web::http::header;

/// CORS for the configured browser origins only. Origins that are not
/// absolute http(s) URLs are skipped with a warning.
pub fn cors_middleware(origins: &[String]) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers(vec![
            header::HeaderName::from_static("x-trace-id"),
            header::RETRY_AFTER,
            header::WWW_AUTHENTICATE,
        ])
        .supports_credentials()
        .max_age(3600);

    for origin in origins {
        if origin.starts_with("http://") || origin.starts_with("https://") {
            cors = cors.allowed_origin(origin);
        } else {
            tracing::warn!(%origin, "ignoring CORS origin that is not an http(s) URL");
        }
    }

    cors
}
