//! OpenTelemetry meter and tracer providers exported over OTLP/gRPC.

use std::time::Duration;

use opentelemetry::global;
use opentelemetry::KeyValue;
use opentelemetry_otlp::{MetricExporter, SpanExporter, WithExportConfig};
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::propagation::{BaggagePropagator, TraceContextPropagator};
use opentelemetry_sdk::trace::{Sampler, SdkTracerProvider};
use opentelemetry_sdk::Resource;
use opentelemetry_semantic_conventions::resource as semconv;
use serde::{Deserialize, Serialize};

/// How often metrics are pushed to the collector.
pub const METRIC_EXPORT_INTERVAL: Duration = Duration::from_secs(2);

const SERVICE_NAMESPACE: &str = "service.namespace";

/// Ratio of root traces kept in production.
const PRODUCTION_SAMPLE_RATIO: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub enabled: bool,
    pub service_name: String,
    pub service_namespace: String,
    pub version: String,
    /// Collector address, e.g. `localhost:4317`.
    pub exporter_endpoint: String,
    /// Run mode used to pick the trace sampler (`dev` or `prod`).
    pub mode: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            service_name: String::new(),
            service_namespace: String::new(),
            version: String::new(),
            exporter_endpoint: "localhost:4317".to_string(),
            mode: "dev".to_string(),
        }
    }
}

/// Shuts the providers down when dropped, flushing pending exports.
#[must_use = "telemetry stops exporting when the guard is dropped"]
pub struct TelemetryGuard {
    meter_provider: Option<SdkMeterProvider>,
    tracer_provider: Option<SdkTracerProvider>,
}

impl TelemetryGuard {
    fn disabled() -> Self {
        Self {
            meter_provider: None,
            tracer_provider: None,
        }
    }

    /// Whether providers were installed.
    pub fn is_active(&self) -> bool {
        self.meter_provider.is_some() || self.tracer_provider.is_some()
    }

    pub fn shutdown(mut self) {
        self.shutdown_providers();
    }

    fn shutdown_providers(&mut self) {
        if let Some(provider) = self.tracer_provider.take() {
            if let Err(e) = provider.shutdown() {
                tracing::warn!(error = %e, "Failed to shut down tracer provider");
            }
        }
        if let Some(provider) = self.meter_provider.take() {
            if let Err(e) = provider.shutdown() {
                tracing::warn!(error = %e, "Failed to shut down meter provider");
            }
        }
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        self.shutdown_providers();
    }
}

/// Pick a sampler for the run mode.
///
/// Only the exact mode `prod` keeps half of the root traces and follows the
/// parent's decision otherwise; every other mode samples everything.
pub fn trace_sampler(mode: &str) -> Sampler {
    match mode {
        "prod" => Sampler::ParentBased(Box::new(Sampler::TraceIdRatioBased(
            PRODUCTION_SAMPLE_RATIO,
        ))),
        _ => Sampler::AlwaysOn,
    }
}

/// Set up the global meter and tracer providers and the W3C trace-context
/// and baggage propagators.
///
/// Exporters connect lazily, so an unreachable collector does not fail
/// startup. Hold the returned guard for the lifetime of the process.
///
/// With `enabled = false` nothing is installed and the guard is inert.
pub fn init_telemetry_providers(config: &TelemetryConfig) -> anyhow::Result<TelemetryGuard> {
    if !config.enabled {
        tracing::debug!("Open Telemetry disabled");
        return Ok(TelemetryGuard::disabled());
    }

    tracing::info!(endpoint = %config.exporter_endpoint, "Setting up Open Telemetry providers");

    let endpoint = normalize_endpoint(&config.exporter_endpoint);
    let resource = build_resource(config);

    let metric_exporter = MetricExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint.as_str())
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build OTLP metric exporter: {e}"))?;
    let reader = PeriodicReader::builder(metric_exporter)
        .with_interval(METRIC_EXPORT_INTERVAL)
        .build();
    let meter_provider = SdkMeterProvider::builder()
        .with_resource(resource.clone())
        .with_reader(reader)
        .build();

    let span_exporter = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint.as_str())
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build OTLP span exporter: {e}"))?;
    let tracer_provider = SdkTracerProvider::builder()
        .with_resource(resource)
        .with_sampler(trace_sampler(&config.mode))
        .with_batch_exporter(span_exporter)
        .build();

    global::set_meter_provider(meter_provider.clone());
    global::set_text_map_propagator(opentelemetry::propagation::TextMapCompositePropagator::new(
        vec![
            Box::new(TraceContextPropagator::new()),
            Box::new(BaggagePropagator::new()),
        ],
    ));
    global::set_tracer_provider(tracer_provider.clone());

    Ok(TelemetryGuard {
        meter_provider: Some(meter_provider),
        tracer_provider: Some(tracer_provider),
    })
}

fn build_resource(config: &TelemetryConfig) -> Resource {
    Resource::builder()
        .with_attributes([
            KeyValue::new(semconv::SERVICE_NAME, config.service_name.clone()),
            KeyValue::new(SERVICE_NAMESPACE, config.service_namespace.clone()),
            KeyValue::new(semconv::SERVICE_VERSION, config.version.trim().to_string()),
        ])
        .build()
}

/// The tonic exporter needs a URI; bare `host:port` is treated as plaintext.
fn normalize_endpoint(endpoint: &str) -> String {
    if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("http://{endpoint}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_sampler_is_parent_based_ratio() {
        assert_eq!(
            format!("{:?}", trace_sampler("prod")),
            "ParentBased(TraceIdRatioBased(0.5))"
        );
    }

    #[test]
    fn other_modes_sample_everything() {
        assert!(matches!(trace_sampler("dev"), Sampler::AlwaysOn));
        assert!(matches!(trace_sampler(""), Sampler::AlwaysOn));
        assert!(matches!(trace_sampler("staging"), Sampler::AlwaysOn));
        for mode in ["production", "PROD", " prod ", "Prod"] {
            assert!(
                matches!(trace_sampler(mode), Sampler::AlwaysOn),
                "mode = {mode:?}"
            );
        }
    }

    #[test]
    fn bare_endpoint_gets_http_scheme() {
        assert_eq!(normalize_endpoint("otel:4317"), "http://otel:4317");
        assert_eq!(
            normalize_endpoint("https://otel.example.com:4317"),
            "https://otel.example.com:4317"
        );
    }

    #[test]
    fn resource_trims_version() {
        let config = TelemetryConfig {
            service_name: "scanoss-api".to_string(),
            version: " 1.2.3\n".to_string(),
            ..Default::default()
        };
        let resource = build_resource(&config);
        assert_eq!(
            resource.get(&opentelemetry::Key::from_static_str(semconv::SERVICE_VERSION)),
            Some(opentelemetry::Value::from("1.2.3"))
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn providers_start_without_a_collector() {
        let config = TelemetryConfig {
            enabled: true,
            service_name: "gateway-kit-test".to_string(),
            exporter_endpoint: "127.0.0.1:1".to_string(),
            ..Default::default()
        };
        let guard = init_telemetry_providers(&config).unwrap();
        assert!(guard.is_active());
        guard.shutdown();
    }

    #[test]
    fn disabled_config_installs_nothing() {
        let config = TelemetryConfig {
            service_name: "gateway-kit-test".to_string(),
            exporter_endpoint: "not a valid endpoint".to_string(),
            ..Default::default()
        };
        assert!(!config.enabled);

        let guard = init_telemetry_providers(&config).unwrap();
        assert!(!guard.is_active());
        guard.shutdown();
    }
}
