//! Request tracking middleware.
//!
//! [`request_tracking_layer`] wraps every request in an `http_request` span
//! carrying a correlation id, logs the outcome with status and latency,
//! counts it in `http_requests_total{method,status}`, and echoes the
//! correlation id back in the `X-Correlation-ID` response header.
//!
//! # Example
//!
//! ```ignore
//! use axum::Router;
//! use eventmingle_web::middleware::request_tracking_layer;
//!
//! let app = Router::new()
//!     .route("/api/events", get(list_events))
//!     .layer(request_tracking_layer());
//! ```

use crate::extractors::CorrelationId;
use axum::{extract::Request, http::HeaderValue, response::Response};
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};
use tracing::Instrument;
use uuid::Uuid;

/// Header name for correlation ID.
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

/// Create the request tracking layer.
#[must_use]
pub const fn request_tracking_layer() -> RequestTrackingLayer {
    RequestTrackingLayer
}

/// Layer for request tracking.
#[derive(Clone, Copy, Debug)]
pub struct RequestTrackingLayer;

impl<S> Layer<S> for RequestTrackingLayer {
    type Service = RequestTracking<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestTracking { inner }
    }
}

/// Middleware service produced by [`RequestTrackingLayer`].
#[derive(Clone, Debug)]
pub struct RequestTracking<S> {
    inner: S,
}

impl<S> Service<Request> for RequestTracking<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let correlation_id = req
            .headers()
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);
        req.extensions_mut().insert(CorrelationId(correlation_id));

        let method = req.method().clone();
        let span = tracing::info_span!(
            "http_request",
            correlation_id = %correlation_id,
            method = %method,
            path = %req.uri().path(),
        );

        let started = Instant::now();
        let fut = self.inner.call(req);

        Box::pin(
            async move {
                let mut response = fut.await?;
                let status = response.status();
                let latency_ms = started.elapsed().as_millis();

                if status.is_server_error() {
                    tracing::warn!(status = status.as_u16(), latency_ms, "Request failed");
                } else {
                    tracing::info!(status = status.as_u16(), latency_ms, "Request completed");
                }
                metrics::counter!(
                    "http_requests_total",
                    "method" => method.to_string(),
                    "status" => status.as_u16().to_string(),
                )
                .increment(1);

                if let Ok(header_value) = HeaderValue::from_str(&correlation_id.to_string()) {
                    response
                        .headers_mut()
                        .insert(CORRELATION_ID_HEADER, header_value);
                }
                Ok(response)
            }
            .instrument(span),
        )
    }
}
