//! Security headers middleware

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};

/// Headers set on every response of the JSON API.
const API_HEADERS: &[(&str, &str)] = &[
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("referrer-policy", "no-referrer"),
    ("content-security-policy", "default-src 'none'"),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-site"),
    // Lab results are patient data; keep them out of shared caches.
    ("cache-control", "no-store"),
];

fn is_https(req: &Request) -> bool {
    let forwarded = req
        .headers()
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("https"));

    forwarded
        || req
            .uri()
            .scheme_str()
            .is_some_and(|s| s.eq_ignore_ascii_case("https"))
}

fn apply_api_headers(headers: &mut HeaderMap, https: bool) {
    for &(name, value) in API_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }

    // HSTS only when HTTPS is used (or terminated upstream).
    if https {
        headers.insert(
            "strict-transport-security",
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        );
    }
}

/// Baseline hardening headers. Not a substitute for authentication.
pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let https = is_https(&req);
    let mut response = next.run(req).await;
    apply_api_headers(response.headers_mut(), https);
    response
}
