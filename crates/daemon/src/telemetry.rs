//! Telemetry setup for OpenTelemetry integration

use anyhow::Result;
use tracing_subscriber::{Layer, Registry};

/// Layer exporting spans, composed into the subscriber by main
pub type OtelLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Whether trace export was asked for
pub fn requested() -> bool {
    std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok()
}

/// Build the OpenTelemetry layer if enabled
///
/// # Environment Variables
///
/// - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (e.g., http://localhost:4317)
/// - `OTEL_SERVICE_NAME`: Service name (default: artistdb)
///
/// # Example
///
/// ```text
/// OTEL_EXPORTER_OTLP_ENDPOINT=http://localhost:4317 \
/// OTEL_SERVICE_NAME=artistdb-dev \
///     ./artistdb
/// ```
pub fn layer(sample_rate: f64) -> Result<Option<OtelLayer>> {
    if !requested() || sample_rate <= 0.0 {
        return Ok(None);
    }

    #[cfg(feature = "telemetry")]
    {
        layer_impl(sample_rate).map(Some)
    }

    #[cfg(not(feature = "telemetry"))]
    {
        Ok(None)
    }
}

#[cfg(feature = "telemetry")]
fn layer_impl(sample_rate: f64) -> Result<OtelLayer> {
    use anyhow::anyhow;
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::trace::{Sampler, TracerProvider};

    let service_name =
        std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "artistdb".to_string());
    let endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")?;

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&endpoint)
        .build()
        .map_err(|e| anyhow!("Failed to create OTLP exporter: {}", e))?;

    let resource =
        opentelemetry_sdk::Resource::new(vec![KeyValue::new("service.name", service_name)]);

    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
        .with_sampler(Sampler::TraceIdRatioBased(sample_rate))
        .with_resource(resource)
        .build();

    let tracer = provider.tracer("artistdb");

    // Keep the provider alive; dropping it stops the export
    let _ = opentelemetry::global::set_tracer_provider(provider);

    Ok(Box::new(tracing_opentelemetry::layer().with_tracer(tracer)))
}

/// Flush pending spans
#[cfg(feature = "telemetry")]
pub fn shutdown() {
    opentelemetry::global::shutdown_tracer_provider();
}

#[cfg(not(feature = "telemetry"))]
pub fn shutdown() {}

/// Compiled with the `telemetry` feature
pub const ENABLED: bool = cfg!(feature = "telemetry");
