use actix_web::{web, App, HttpServer};
use profile_doctor_backend::config::Settings;
use profile_doctor_backend::infra::state::StateBuilder;
use profile_doctor_backend::middleware::{
    cors_middleware, RequestTrace, SecurityHeaders, StructuredLogger, TraceSpan,
};
use profile_doctor_backend::routes;
use profile_doctor_backend::telemetry;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    // Environment variables must be set by the runtime environment
    // (docker-compose env_file, or `set -a; . ./.env; set +a` locally).
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    tracing::info!(
        service = %settings.project_name,
        host = %settings.host,
        port = settings.port,
        api_prefix = %settings.api_v1_prefix,
        "starting backend"
    );

    let app_state = match StateBuilder::from_settings(&settings).build().await {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "failed to build application state");
            std::process::exit(1);
        }
    };

    let data = web::Data::new(app_state);
    let api_prefix = settings.api_v1_prefix.clone();
    let cors_origins = settings.cors_origins.clone();

    HttpServer::new(move || {
        let api_prefix = api_prefix.clone();
        App::new()
            .wrap(cors_middleware(&cors_origins))
            .wrap(SecurityHeaders::new(&api_prefix))
            .wrap(StructuredLogger)
            .wrap(TraceSpan)
            .wrap(RequestTrace)
            .app_data(data.clone())
            .configure(move |cfg| routes::configure(cfg, &api_prefix))
    })
    .bind((settings.host.as_str(), settings.port))?
    .run()
    .await
}
