use std::time::Duration;

use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, TextEncoder,
};

static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "notification_fanout_http_requests_total",
            "Total HTTP requests handled by notification-fanout",
        ),
        &["method", "path", "status"],
    )
    .expect("failed to create notification_fanout_http_requests_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register notification_fanout_http_requests_total");
    counter
});

static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let histogram = HistogramVec::new(
        HistogramOpts::new(
            "notification_fanout_http_request_duration_seconds",
            "HTTP request latency for notification-fanout",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["method", "path", "status"],
    )
    .expect("failed to create notification_fanout_http_request_duration_seconds");
    prometheus::default_registry()
        .register(Box::new(histogram.clone()))
        .expect("failed to register notification_fanout_http_request_duration_seconds");
    histogram
});

static FANOUT_NOTIFICATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "notification_fanout_notifications_total",
            "Admin notifications processed, by outcome",
        ),
        &["outcome"],
    )
    .expect("failed to create notification_fanout_notifications_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register notification_fanout_notifications_total");
    counter
});

static FANOUT_INBOX_WRITES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let counter = IntCounter::new(
        "notification_fanout_inbox_writes_total",
        "Inbox items written by successful fan-outs",
    )
    .expect("failed to create notification_fanout_inbox_writes_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register notification_fanout_inbox_writes_total");
    counter
});

static FANOUT_BATCHES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "notification_fanout_batches_total",
            "Inbox batch commits, by status",
        ),
        &["status"],
    )
    .expect("failed to create notification_fanout_batches_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register notification_fanout_batches_total");
    counter
});

static PUSH_BROADCASTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "notification_fanout_push_broadcasts_total",
            "Topic push broadcasts, by status",
        ),
        &["status"],
    )
    .expect("failed to create notification_fanout_push_broadcasts_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register notification_fanout_push_broadcasts_total");
    counter
});

pub fn record_fanout(success: bool, inbox_writes: usize) {
    let outcome = if success { "success" } else { "failed" };
    FANOUT_NOTIFICATIONS_TOTAL.with_label_values(&[outcome]).inc();
    FANOUT_INBOX_WRITES_TOTAL.inc_by(inbox_writes as u64);
}

pub fn record_batches(committed: usize, failed: usize) {
    FANOUT_BATCHES_TOTAL
        .with_label_values(&["committed"])
        .inc_by(committed as u64);
    FANOUT_BATCHES_TOTAL
        .with_label_values(&["failed"])
        .inc_by(failed as u64);
}

pub fn record_push(sent: bool) {
    let status = if sent { "sent" } else { "failed" };
    PUSH_BROADCASTS_TOTAL.with_label_values(&[status]).inc();
}

pub fn observe_http_request(method: &str, path: &str, status: u16, elapsed: Duration) {
    let status_label = status.to_string();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status_label])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path, &status_label])
        .observe(elapsed.as_secs_f64());
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
        let path = req.path().to_string();
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

    #[test]
    fn test_push_counter_increments() {
        let before = PUSH_BROADCASTS_TOTAL.with_label_values(&["failed"]).get();
        record_push(false);
        assert!(PUSH_BROADCASTS_TOTAL.with_label_values(&["failed"]).get() > before);
    }

    #[test]
    fn test_fanout_counters() {
        let before = FANOUT_INBOX_WRITES_TOTAL.get();
        record_fanout(true, 7);
        assert!(FANOUT_INBOX_WRITES_TOTAL.get() >= before + 7);
    }

    #[actix_web::test]
    async fn test_serve_metrics() {
        record_batches(3, 0);
        let response = serve_metrics().await;
        assert!(response.status().is_success());
    }
}
