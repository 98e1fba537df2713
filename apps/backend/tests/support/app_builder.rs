use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use actix_http::Request;
use actix_web::body::BoxBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web, App, Error};
use profile_doctor_backend::auth::password::hash_password;
use profile_doctor_backend::auth::rate_limit::{InMemoryCounter, RateLimitConfig};
use profile_doctor_backend::auth::{InMemoryCredentialStore, Role};
use profile_doctor_backend::middleware::{RequestTrace, SecurityHeaders, StructuredLogger, TraceSpan};
use profile_doctor_backend::{routes, AppState, SecurityConfig, StateBuilder};
use sea_orm::DatabaseConnection;

pub const API: &str = "/api/v1";
pub const TEST_SECRET: &[u8] = b"integration-test-secret-0123456789abcdef";

/// Window wide enough that a test never straddles a bucket boundary.
const TEST_WINDOW: Duration = Duration::from_secs(1 << 32);

/// Application state over in-memory collaborators, with handles to them so
/// tests can inspect or mutate the store and counter directly.
pub struct TestContext {
    pub state: AppState,
    pub store: Arc<InMemoryCredentialStore>,
    pub counter: Arc<InMemoryCounter>,
}

pub struct TestContextBuilder {
    limit: u64,
    client_limit: Option<u64>,
    db: Option<DatabaseConnection>,
    users: Vec<(String, String, Role)>,
}

impl TestContext {
    pub fn builder() -> TestContextBuilder {
        TestContextBuilder {
            limit: 10,
            client_limit: None,
            db: None,
            users: Vec::new(),
        }
    }

    pub fn security() -> SecurityConfig {
        SecurityConfig::new(TEST_SECRET)
    }

    /// Service with the production routes and middleware (minus CORS).
    pub async fn app(
        &self,
    ) -> impl Service<Request, Response = ServiceResponse<BoxBody>, Error = Error> {
        test::init_service(
            App::new()
                .wrap(SecurityHeaders::new(API))
                .wrap(StructuredLogger)
                .wrap(TraceSpan)
                .wrap(RequestTrace)
                .app_data(web::Data::new(self.state.clone()))
                .configure(|cfg| routes::configure(cfg, API)),
        )
        .await
    }
}

impl TestContextBuilder {
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_client_limit(mut self, limit: u64) -> Self {
        self.client_limit = Some(limit);
        self
    }

    pub fn with_db(mut self, db: DatabaseConnection) -> Self {
        self.db = Some(db);
        self
    }

    pub fn with_user(mut self, email: &str, password: &str, role: Role) -> Self {
        self.users.push((email.to_string(), password.to_string(), role));
        self
    }

    pub async fn build(self) -> TestContext {
        let store = Arc::new(InMemoryCredentialStore::new());
        for (email, password, role) in &self.users {
            store.insert(email, hash_password(password).expect("hash"), *role);
        }
        let counter = Arc::new(InMemoryCounter::new());

        let mut builder = StateBuilder::new(TestContext::security())
            .with_rate_limit(RateLimitConfig {
                limit: self.limit,
                window: TEST_WINDOW,
            })
            .with_client_rate_limit(self.client_limit.map(|limit| RateLimitConfig {
                limit,
                window: TEST_WINDOW,
            }))
            .with_store(store.clone())
            .with_counter(counter.clone());
        if let Some(db) = self.db {
            builder = builder.with_db(db);
        }

        let state = builder.build().await.expect("state should build");
        TestContext {
            state,
            store,
            counter,
        }
    }
}

/// `POST {API}/token` with a form body.
pub async fn login<S>(app: &S, username: &str, password: &str) -> ServiceResponse<BoxBody>
where
    S: Service<Request, Response = ServiceResponse<BoxBody>, Error = Error>,
{
    let req = test::TestRequest::post()
        .uri(&format!("{API}/token"))
        .set_form([("username", username), ("password", password)])
        .to_request();
    test::call_service(app, req).await
}

/// `POST {API}/token` arriving from `peer`.
pub async fn login_from<S>(
    app: &S,
    username: &str,
    password: &str,
    peer: SocketAddr,
) -> ServiceResponse<BoxBody>
where
    S: Service<Request, Response = ServiceResponse<BoxBody>, Error = Error>,
{
    let req = test::TestRequest::post()
        .uri(&format!("{API}/token"))
        .peer_addr(peer)
        .set_form([("username", username), ("password", password)])
        .to_request();
    test::call_service(app, req).await
}

/// `GET` with an optional bearer token.
pub async fn bearer_get<S>(app: &S, uri: &str, token: Option<&str>) -> ServiceResponse<BoxBody>
where
    S: Service<Request, Response = ServiceResponse<BoxBody>, Error = Error>,
{
    let mut req = test::TestRequest::get().uri(uri);
    if let Some(token) = token {
        req = req.insert_header(("Authorization", format!("Bearer {token}")));
    }
    test::call_service(app, req.to_request()).await
}
