//! HTTP surface: per-request language context, debug echo, health.

pub mod context;
pub mod handlers;
pub mod security;

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};
use warp::http::{HeaderMap, StatusCode};
use warp::{Filter, Rejection, Reply};

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::geo::server::{InboundRequest, ServerResolver};

pub use context::RequestContext;
pub use handlers::{debug_report, page_context, PageContext};

/// Request parts the resolver works from. A query string that does not parse
/// is treated as empty rather than rejecting the request.
fn inbound_request() -> impl Filter<Extract = (InboundRequest,), Error = Infallible> + Clone {
    let query = warp::query::<HashMap<String, String>>()
        .or(warp::any().map(HashMap::new))
        .unify();

    warp::header::headers_cloned()
        .and(query)
        .map(|headers: HeaderMap, query: HashMap<String, String>| {
            InboundRequest::new(headers, None, query)
        })
}

/// Turn an unmatched request into a JSON error reply, so it still passes
/// through the response header layer.
async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let status = if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        StatusCode::METHOD_NOT_ALLOWED
    } else {
        warn!(?err, "unhandled rejection");
        StatusCode::INTERNAL_SERVER_ERROR
    };

    let body = warp::reply::json(&json!({
        "error": status.canonical_reason().unwrap_or("Error"),
        "status": status.as_u16(),
    }));
    Ok(warp::reply::with_status(body, status))
}

/// All routes, with security headers and request tracing applied to every
/// response, error replies included.
pub fn routes(
    resolver: Arc<ServerResolver>,
    security_headers: bool,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let with_resolver = {
        let resolver = resolver.clone();
        warp::any().map(move || resolver.clone())
    };

    // GET / and GET /context -> page context for the rendering layer
    let context_path = warp::path::end().or(warp::path("context").and(warp::path::end())).unify();
    let context = warp::get()
        .and(context_path)
        .and(with_resolver.clone())
        .and(inbound_request())
        .map(|resolver: Arc<ServerResolver>, request: InboundRequest| {
            warp::reply::json(&page_context(&resolver, &request))
        });

    // GET /debug -> raw headers plus derived decision
    let debug = warp::get()
        .and(warp::path("debug"))
        .and(warp::path::end())
        .and(with_resolver)
        .and(inbound_request())
        .and(warp::addr::remote())
        .map(
            |resolver: Arc<ServerResolver>,
             request: InboundRequest,
             remote: Option<SocketAddr>| {
                warp::reply::json(&debug_report(&resolver, &request, remote))
            },
        );

    // GET /health
    let health = warp::get()
        .and(warp::path("health"))
        .and(warp::path::end())
        .map(|| warp::reply::json(&json!({ "ok": true })));

    context
        .or(debug)
        .or(health)
        .recover(handle_rejection)
        .with(warp::reply::with::headers(security::security_headers(
            security_headers,
        )))
        .with(warp::trace::request())
}

/// Serve until Ctrl-C.
pub async fn start_server(config: &AppConfig) -> Result<(), AppError> {
    let addr = config.bind_addr()?;
    let routes = routes(
        Arc::new(ServerResolver::new()),
        config.server.security_headers,
    );

    let (bound, server) = warp::serve(routes)
        .try_bind_with_graceful_shutdown(addr, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .map_err(|e| AppError::Server(format!("failed to bind {addr}: {e}")))?;

    info!(%bound, "geolang server listening");
    server.await;
    info!("geolang server shut down");
    Ok(())
}
