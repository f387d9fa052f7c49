use std::time::Duration;

use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, TextEncoder,
};

static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "alert_service_http_requests_total",
            "Total HTTP requests handled by alert-service",
        ),
        &["method", "path", "status"],
    )
    .expect("failed to create alert_service_http_requests_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register alert_service_http_requests_total");
    counter
});

static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let histogram = HistogramVec::new(
        HistogramOpts::new(
            "alert_service_http_request_duration_seconds",
            "HTTP request latency for alert-service",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
        &["method", "path", "status"],
    )
    .expect("failed to create alert_service_http_request_duration_seconds");
    prometheus::default_registry()
        .register(Box::new(histogram.clone()))
        .expect("failed to register alert_service_http_request_duration_seconds");
    histogram
});

static ALERTS_ENQUEUED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "alert_service_alerts_enqueued_total",
            "Alerts accepted by the alert center",
        ),
        &["priority", "placement"],
    )
    .expect("failed to create alert_service_alerts_enqueued_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register alert_service_alerts_enqueued_total");
    counter
});

static ALERTS_REMOVED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "alert_service_alerts_removed_total",
            "Alerts removed from the alert center",
        ),
        &["reason"],
    )
    .expect("failed to create alert_service_alerts_removed_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register alert_service_alerts_removed_total");
    counter
});

static ALERTS_VISIBLE: Lazy<IntGauge> = Lazy::new(|| {
    let gauge = IntGauge::new("alert_service_alerts_visible", "Currently visible alerts")
        .expect("failed to create alert_service_alerts_visible");
    prometheus::default_registry()
        .register(Box::new(gauge.clone()))
        .expect("failed to register alert_service_alerts_visible");
    gauge
});

static ALERTS_PENDING: Lazy<IntGauge> = Lazy::new(|| {
    let gauge = IntGauge::new(
        "alert_service_alerts_pending",
        "Alerts waiting for a toast slot",
    )
    .expect("failed to create alert_service_alerts_pending");
    prometheus::default_registry()
        .register(Box::new(gauge.clone()))
        .expect("failed to register alert_service_alerts_pending");
    gauge
});

static CHANNEL_DISPATCH_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "alert_service_channel_dispatch_total",
            "Inbound messages dispatched per channel",
        ),
        &["channel", "handled"],
    )
    .expect("failed to create alert_service_channel_dispatch_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register alert_service_channel_dispatch_total");
    counter
});

static OUTBOUND_SEND_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "alert_service_outbound_send_total",
            "Outbound messages by result",
        ),
        &["result"],
    )
    .expect("failed to create alert_service_outbound_send_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register alert_service_outbound_send_total");
    counter
});

static CONNECTION_LATENCY_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    let histogram = Histogram::with_opts(
        HistogramOpts::new(
            "alert_service_connection_latency_seconds",
            "Round-trip latency of the realtime connection",
        )
        .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
    )
    .expect("failed to create alert_service_connection_latency_seconds");
    prometheus::default_registry()
        .register(Box::new(histogram.clone()))
        .expect("failed to register alert_service_connection_latency_seconds");
    histogram
});

pub fn observe_http_request(method: &str, path: &str, status: u16, elapsed: Duration) {
    let status_label = status.to_string();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status_label])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path, &status_label])
        .observe(elapsed.as_secs_f64());
}

pub fn record_enqueued(priority: &str, placement: &str) {
    ALERTS_ENQUEUED_TOTAL
        .with_label_values(&[priority, placement])
        .inc();
}

pub fn record_removed(reason: &str) {
    ALERTS_REMOVED_TOTAL.with_label_values(&[reason]).inc();
}

pub fn set_queue_sizes(visible: usize, pending: usize) {
    ALERTS_VISIBLE.set(visible as i64);
    ALERTS_PENDING.set(pending as i64);
}

/// Channel label for dispatches no handler claimed
pub const UNROUTED_CHANNEL: &str = "unrouted";

/// Count a dispatch; only channels with a handler get their own series
pub fn record_dispatch(channel: &str, handlers: usize) {
    let (channel, handled) = if handlers > 0 {
        (channel, "true")
    } else {
        (UNROUTED_CHANNEL, "false")
    };
    CHANNEL_DISPATCH_TOTAL
        .with_label_values(&[channel, handled])
        .inc();
}

/// Number of series currently exported for a dispatch channel label
#[cfg(test)]
pub(crate) fn dispatch_series_for(predicate: impl Fn(&str) -> bool) -> usize {
    prometheus::default_registry()
        .gather()
        .iter()
        .filter(|family| family.get_name() == "alert_service_channel_dispatch_total")
        .flat_map(|family| family.get_metric().iter())
        .filter(|metric| {
            metric
                .get_label()
                .iter()
                .any(|label| label.get_name() == "channel" && predicate(label.get_value()))
        })
        .count()
}

pub fn record_send(result: &str) {
    OUTBOUND_SEND_TOTAL.with_label_values(&[result]).inc();
}

pub fn observe_connection_latency(latency: Duration) {
    CONNECTION_LATENCY_SECONDS.observe(latency.as_secs_f64());
}

pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;
use std::time::Instant;

pub struct MetricsMiddleware;

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = MetricsMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct MetricsMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        // Route pattern keeps alert ids out of the label set
        let path = req
            .match_pattern()
            .unwrap_or_else(|| req.path().to_string());
        let method = req.method().to_string();
        let start = Instant::now();

        Box::pin(async move {
            let result = service.call(req).await;
            let elapsed = start.elapsed();
            match &result {
                Ok(response) => {
                    observe_http_request(&method, &path, response.status().as_u16(), elapsed);
                }
                Err(_) => {
                    observe_http_request(&method, &path, 500, elapsed);
                }
            }
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn test_serve_metrics_exposes_alert_counters() {
        record_enqueued("critical", "shown");
        record_removed("expired");

        let response = serve_metrics().await;
        assert!(response.status().is_success());

        let body = actix_web::body::to_bytes(response.into_body()).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("alert_service_alerts_enqueued_total"));
        assert!(text.contains("alert_service_alerts_removed_total"));
    }
}
