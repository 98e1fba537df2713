//! Fixed set of security headers on every response, plus `Cache-Control:
//! no-store` on the versioned API and health paths.

use std::rc::Rc;

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{self, HeaderName, HeaderValue};
use actix_web::Error as ActixError;
use futures_util::future::{ready, LocalBoxFuture, Ready};

const HEADERS: [(&str, &str); 4] = [
    ("x-frame-options", "SAMEORIGIN"),
    ("referrer-policy", "no-referrer"),
    ("content-security-policy", "default-src 'self'"),
    ("x-content-type-options", "nosniff"),
];

pub struct SecurityHeaders {
    api_prefix: Rc<str>,
}

impl SecurityHeaders {
    pub fn new(api_prefix: &str) -> Self {
        Self {
            api_prefix: Rc::from(api_prefix),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SecurityHeaders
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = ActixError;
    type InitError = ();
    type Transform = SecurityHeadersMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SecurityHeadersMiddleware {
            service,
            api_prefix: self.api_prefix.clone(),
        }))
    }
}

pub struct SecurityHeadersMiddleware<S> {
    service: S,
    api_prefix: Rc<str>,
}

impl<S> SecurityHeadersMiddleware<S> {
    fn is_api_path(&self, path: &str) -> bool {
        path == "/health" || path.starts_with(&*self.api_prefix)
    }
}

impl<S, B> Service<ServiceRequest> for SecurityHeadersMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let no_store = self.is_api_path(req.path());
        let fut = self.service.call(req);

        Box::pin(async move {
            let mut res = fut.await?;
            let headers = res.headers_mut();

            for (name, value) in HEADERS {
                headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
            }
            if no_store {
                headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
            }

            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{test, web, App, HttpResponse};

    use super::SecurityHeaders;

    #[actix_web::test]
    async fn api_paths_get_no_store() {
        let app = test::init_service(
            App::new()
                .wrap(SecurityHeaders::new("/api/v1"))
                .route("/", web::get().to(HttpResponse::Ok))
                .route("/api/v1/users/me", web::get().to(HttpResponse::Ok)),
        )
        .await;

        let api = test::call_service(&app, test::TestRequest::get().uri("/api/v1/users/me").to_request()).await;
        assert_eq!(api.headers().get("x-frame-options").unwrap(), "SAMEORIGIN");
        assert_eq!(api.headers().get("referrer-policy").unwrap(), "no-referrer");
        assert_eq!(api.headers().get("content-security-policy").unwrap(), "default-src 'self'");
        assert_eq!(api.headers().get("x-content-type-options").unwrap(), "nosniff");
        assert_eq!(api.headers().get("cache-control").unwrap(), "no-store");

        let root = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(root.headers().get("x-frame-options").unwrap(), "SAMEORIGIN");
        assert!(root.headers().get("cache-control").is_none());
    }
}
