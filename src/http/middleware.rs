use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::detection::header_evaluator::HeaderEvaluator;
use crate::logging;
use crate::models::request::RequestHeaders;

use super::ip_extract::{extract_client_ip, ClientIp};
use super::routes::AppState;

/// Per-request triage (spec §4.5): static assets bypass tracking entirely,
/// a document fetch opens a Visit Tracker session, and everything else is
/// scored once by the Header Evaluator for logging only.
///
/// Generalizes the teacher's `auth::auth_middleware` `from_fn_with_state`
/// shape — this middleware never rejects a request, it only classifies it
/// and stashes the extracted IP/headers as extensions for downstream
/// handlers.
pub async fn classify(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    mut req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();

    if is_static_asset(&path) {
        return next.run(req).await;
    }

    let headers = collect_headers(&req);
    let ip = extract_client_ip(req.headers(), Some(peer.ip()));

    let is_document = req.method() == axum::http::Method::GET
        && !path.starts_with("/api/")
        && headers.looks_like_document_request();

    if is_document {
        state.tracker.open(&ip);
        logging::log_header_analysis(&ip, "pending");
    } else {
        let verdict = HeaderEvaluator::new().evaluate(&headers);
        logging::log_header_analysis_verdict(&ip, &verdict);
    }

    req.extensions_mut().insert(ClientIp(ip));
    req.extensions_mut().insert(headers);

    next.run(req).await
}

/// A path whose final segment carries an extension other than `.html` is a
/// static asset (spec §4.5) — CSS, JS, images, fonts, the collector script.
fn is_static_asset(path: &str) -> bool {
    let last_segment = path.rsplit('/').next().unwrap_or("");
    match last_segment.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => !ext.eq_ignore_ascii_case("html"),
        _ => false,
    }
}

fn collect_headers(req: &Request) -> RequestHeaders {
    let mut headers = RequestHeaders::new();
    for (name, value) in req.headers() {
        if let Ok(v) = value.to_str() {
            headers.insert(name.as_str(), v);
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_suffixed_path_is_not_static() {
        assert!(!is_static_asset("/index.html"));
        assert!(!is_static_asset("/"));
        assert!(!is_static_asset("/api/bot"));
    }

    #[test]
    fn extensioned_paths_are_static() {
        assert!(is_static_asset("/collector.js"));
        assert!(is_static_asset("/assets/logo.png"));
        assert!(is_static_asset("/styles/app.css"));
    }
}
