//! Context Middleware: attaches a [`CorrelationContext`] to every request
//! and echoes its identifiers back on the response.
//!
//! Header precedence: `X-Correlation-ID` > `traceparent` > `X-Trace-ID` >
//! minted. A malformed `traceparent` is treated as absent, never as an
//! error — this middleware can never fail the request.

use axum::{
    extract::{ConnectInfo, OriginalUri, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use observability_common::correlation::{mint_correlation_id, parse_traceparent};
use observability_common::CorrelationContext;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::ServiceIdentity;

#[derive(Clone)]
pub struct ContextState {
    pub identity: Arc<ServiceIdentity>,
}

fn client_ip(headers: &HeaderMap, connect_info: Option<&SocketAddr>) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        })
        .or_else(|| connect_info.map(SocketAddr::to_string))
}

fn resolve_ids(headers: &HeaderMap) -> (String, Option<String>, Option<String>) {
    if let Some(id) = headers
        .get("x-correlation-id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
    {
        return (id.to_string(), None, None);
    }
    if let Some(traceparent) = headers
        .get("traceparent")
        .and_then(|v| v.to_str().ok())
        .and_then(parse_traceparent)
    {
        return (
            mint_correlation_id(),
            Some(traceparent.trace_id),
            Some(traceparent.span_id),
        );
    }
    if let Some(trace_id) = headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
    {
        return (mint_correlation_id(), Some(trace_id.to_string()), None);
    }
    (mint_correlation_id(), None, None)
}

pub async fn context_middleware(
    State(state): State<ContextState>,
    OriginalUri(uri): OriginalUri,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    let (correlation_id, trace_id, span_id) = resolve_ids(&headers);
    let remote_addr = client_ip(&headers, connect_info.as_ref().map(|ci| &ci.0));

    let context = CorrelationContext {
        correlation_id: correlation_id.clone(),
        trace_id: trace_id.clone(),
        span_id,
        request_id: None,
        user_id: None,
        session_id: None,
        service: state.identity.service_name.clone(),
        hostname: state.identity.hostname.clone(),
        environment: state.identity.environment.clone(),
        version: state.identity.service_version.clone(),
        method: Some(request.method().to_string()),
        path: Some(uri.path().to_string()),
        remote_addr,
        timestamp: chrono::Utc::now(),
    };

    tracing::info!(
        correlation_id = %context.correlation_id,
        method = %request.method(),
        path = %uri.path(),
        "incoming request"
    );

    request.extensions_mut().insert(context.clone());

    let mut response = next.run(request).await;
    if let Ok(value) = context.correlation_id.parse() {
        response.headers_mut().insert("x-correlation-id", value);
    }
    if let Some(trace_id) = &trace_id {
        if let Ok(value) = trace_id.parse() {
            response.headers_mut().insert("x-trace-id", value);
        }
    }
    response
}

/// Accessor for handlers that need the context but don't want to depend on
/// axum's extension extractor directly.
pub trait RequestContextExt {
    fn correlation_context(&self) -> Option<&CorrelationContext>;
}

impl<B> RequestContextExt for axum::http::Request<B> {
    fn correlation_context(&self) -> Option<&CorrelationContext> {
        self.extensions().get::<CorrelationContext>()
    }
}
