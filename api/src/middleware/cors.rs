use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::CorsLayer;

/// Build a CORS layer from a comma-separated origin list (`RECOLLECT_CORS_ORIGINS`).
///
/// - Methods: GET, POST, OPTIONS
/// - Headers: Content-Type plus the agent's call/chat correlation headers
/// - Max age: 3600s
pub fn build_cors_layer(origins_str: &str) -> CorsLayer {
    let origins: Vec<HeaderValue> = parse_origins(origins_str)
        .into_iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("x-call-id"),
            HeaderName::from_static("x-chat-id"),
        ])
        .max_age(std::time::Duration::from_secs(3600))
}

fn parse_origins(origins_str: &str) -> Vec<String> {
    let mut origins: Vec<String> = Vec::new();
    for origin in origins_str.split(',').map(str::trim) {
        if origin.is_empty() || origins.iter().any(|o| o.eq_ignore_ascii_case(origin)) {
            continue;
        }
        origins.push(origin.to_string());
    }
    origins
}
