use axum::extract::Request;
use axum::http::request::Parts;
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use maizebus::config::CorsConfig;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::debug;

/// Request headers browsers may send cross-origin.
const ALLOWED_HEADERS: [&str; 10] = [
    "x-csrf-token",
    "x-requested-with",
    "accept",
    "accept-version",
    "content-length",
    "content-md5",
    "content-type",
    "date",
    "x-api-version",
    "authorization",
];

/// Origin allowlist with credentials. Requests without an `Origin` header pass untouched.
pub(crate) fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let allowed = config.clone();

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &Parts| {
                let permitted = origin
                    .to_str()
                    .map(|value| allowed.allows(value))
                    .unwrap_or(false);
                if !permitted {
                    debug!(?origin, "CORS blocked origin");
                }
                permitted
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
            Method::PATCH,
        ])
        .allow_headers(ALLOWED_HEADERS.map(HeaderName::from_static))
}

/// Any `OPTIONS` request that is not a full preflight still gets an empty 200.
pub(crate) async fn answer_options(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    next.run(request).await
}
