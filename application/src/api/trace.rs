//! HTTP request tracing.

use std::time;

use axum::extract::MatchedPath;
use axum_client_ip::InsecureClientIp;
use tower_http::trace::{
    DefaultOnRequest, HttpMakeClassifier, MakeSpan, OnResponse, TraceLayer,
};
use tracing::{self as log, field, Span};

/// [`TraceLayer`] opening a [`RequestSpan`] per request and closing it with a
/// [`ResponseLog`].
pub type Layer =
    TraceLayer<HttpMakeClassifier, RequestSpan, DefaultOnRequest, ResponseLog>;

/// Creates a new tracing [`Layer`] for the REST API.
#[must_use]
pub fn layer() -> Layer {
    TraceLayer::new_for_http()
        .make_span_with(RequestSpan)
        .on_response(ResponseLog)
}

/// [`MakeSpan`] describing an incoming request with the OpenTelemetry HTTP
/// attributes.
#[derive(Clone, Copy, Debug)]
pub struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, r: &http::Request<B>) -> Span {
        let client_ip = InsecureClientIp::from(r.headers(), r.extensions())
            .ok()
            .map(|ip| ip.0.to_string());
        let route =
            r.extensions().get::<MatchedPath>().map(MatchedPath::as_str);
        let user_agent = r
            .headers()
            .get(http::header::USER_AGENT)
            .and_then(|h| h.to_str().ok());

        log::info_span!(
            "HTTP request",
            http.client_ip = client_ip,
            http.flavor = ?r.version(),
            http.host = r.uri().host(),
            http.method = r.method().as_str(),
            http.route = route,
            http.scheme = r.uri().scheme_str(),
            http.target = r.uri().path_and_query().map(http::uri::PathAndQuery::as_str),
            http.user_agent = user_agent,
            http.status_code = field::Empty,
        )
    }
}

/// [`OnResponse`] recording the response status and logging the request
/// duration.
///
/// Failed requests (`4xx` and `5xx`) are logged as errors.
#[derive(Clone, Copy, Debug)]
pub struct ResponseLog;

impl<B> OnResponse<B> for ResponseLog {
    fn on_response(
        self,
        r: &http::Response<B>,
        latency: time::Duration,
        span: &Span,
    ) {
        let status = r.status();
        _ = span.record("http.status_code", field::display(status.as_u16()));

        let duration = format!("{}ms", latency.as_millis());
        if status.is_client_error() || status.is_server_error() {
            log::error!(duration = %duration, "request failed");
        } else {
            log::info!(duration = %duration, "request served");
        }
    }
}
