use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use opentelemetry::{KeyValue, global, trace::TraceError};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    Resource,
    propagation::TraceContextPropagator,
    runtime,
    trace::{RandomIdGenerator, Sampler, Tracer},
};
use opentelemetry_semantic_conventions::resource::{SERVICE_NAME, SERVICE_VERSION};
use std::time::Instant;
use tracing::{Instrument, error, info, info_span, warn};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Logs every request inside a span carrying a fresh request id.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let span = info_span!(
        "request",
        request_id = %uuid::Uuid::new_v4(),
        method = %method,
        path = %path,
    );

    async move {
        info!("Incoming request");
        let response = next.run(req).await;
        let status = response.status().as_u16();
        let latency_ms = start.elapsed().as_millis() as u64;

        match status {
            400..=499 => warn!(status, latency_ms, "Client error"),
            500..=599 => error!(status, latency_ms, "Server error"),
            _ => info!(status, latency_ms, "Request completed"),
        }
        response
    }
    .instrument(span)
    .await
}

fn init_tracer() -> Result<Tracer, TraceError> {
    let otlp_endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
        .unwrap_or_else(|_| "http://localhost:4317".to_string());

    info!(
        "Initializing OpenTelemetry tracer with endpoint: {}",
        otlp_endpoint
    );

    global::set_text_map_propagator(TraceContextPropagator::new());

    let resource = Resource::new(vec![
        KeyValue::new(SERVICE_NAME, env!("CARGO_PKG_NAME")),
        KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
        KeyValue::new(
            "environment",
            std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        ),
    ]);

    let otlp_exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(otlp_endpoint);

    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(otlp_exporter)
        .with_trace_config(
            opentelemetry_sdk::trace::Config::default()
                .with_sampler(Sampler::AlwaysOn)
                .with_id_generator(RandomIdGenerator::default())
                .with_resource(resource),
        )
        .install_batch(runtime::Tokio)
}

/// Console, daily error file, daily JSON file and, when reachable, OTLP export.
///
/// `LOG_DIR` overrides the `storage/logs` default. `OTEL_ENABLED=false` skips the
/// exporter entirely.
pub fn init_tracing() {
    use std::fs;
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::fmt;

    let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "storage/logs".to_string());
    fs::create_dir_all(&log_dir).expect("Failed to create logs directory");

    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{}=info,campus_client=info,tower_http=warn,axum::rejection=trace",
            env!("CARGO_CRATE_NAME")
        ))
    });

    let console_layer = fmt::layer()
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .compact()
        .with_filter(console_filter);

    let error_layer = fmt::layer()
        .with_writer(RollingFileAppender::new(Rotation::DAILY, &log_dir, "campus.log"))
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_filter(EnvFilter::new("error"));

    let json_layer = fmt::layer()
        .json()
        .with_writer(RollingFileAppender::new(Rotation::DAILY, &log_dir, "campus.json"))
        .with_current_span(true)
        .with_span_list(true)
        .with_filter(EnvFilter::new("info"));

    let registry = tracing_subscriber::registry()
        .with(console_layer)
        .with(error_layer)
        .with(json_layer);

    let otel_enabled = std::env::var("OTEL_ENABLED")
        .map(|v| v.to_lowercase() != "false" && v != "0")
        .unwrap_or(true);

    match otel_enabled.then(init_tracer) {
        Some(Ok(tracer)) => {
            registry
                .with(tracing_opentelemetry::layer().with_tracer(tracer))
                .init();
            info!("Tracing initialized with OpenTelemetry and file logging");
        }
        Some(Err(e)) => {
            registry.init();
            warn!(error = %e, "OpenTelemetry unavailable, continuing with file logging only");
        }
        None => {
            registry.init();
            info!("Tracing initialized with file logging");
        }
    }
}

pub async fn shutdown_tracer() {
    info!("Shutting down OpenTelemetry tracer...");
    global::shutdown_tracer_provider();
}
