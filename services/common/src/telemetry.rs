use anyhow::Result;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig as _;
use opentelemetry_otlp::WithHttpConfig as _;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// Installs the global `tracing` subscriber, and the OpenTelemetry exporters
/// when an OTLP endpoint is configured. Providers are flushed on drop.
pub struct TelemetryHandler {
    tracer_provider: Option<SdkTracerProvider>,
    meter_provider: Option<SdkMeterProvider>,
}

impl TelemetryHandler {
    const OTLP_ENDPOINT_ENV_VAR: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

    pub fn new(
        service_name: &'static str,
        service_version: &'static str,
        default_directive: &str,
    ) -> Result<Self> {
        let exporting = std::env::var_os(Self::OTLP_ENDPOINT_ENV_VAR).is_some();

        let (tracer_provider, meter_provider) = if exporting {
            (
                Some(Self::create_trace_exporter(service_name, service_version)?),
                Some(Self::create_metric_exporter(service_name, service_version)?),
            )
        } else {
            (None, None)
        };

        let env_filter = tracing_subscriber::EnvFilter::builder()
            .with_default_directive(default_directive.parse::<Directive>()?)
            .from_env_lossy();

        let metrics_layer = meter_provider
            .as_ref()
            .map(|provider| tracing_opentelemetry::MetricsLayer::new(provider.clone()));
        let trace_layer = tracer_provider.as_ref().map(|provider| {
            tracing_opentelemetry::OpenTelemetryLayer::new(provider.tracer(service_name))
        });

        // Logs go to stderr so that command output on stdout stays parseable
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .with(env_filter)
            .with(metrics_layer)
            .with(trace_layer)
            .try_init()?;

        Ok(Self {
            tracer_provider,
            meter_provider,
        })
    }

    fn create_metric_exporter(
        service_name: &'static str,
        service_version: &'static str,
    ) -> Result<SdkMeterProvider> {
        let exporter = opentelemetry_otlp::MetricExporter::builder()
            .with_http()
            .with_protocol(opentelemetry_otlp::Protocol::HttpBinary)
            .with_compression(opentelemetry_otlp::Compression::Gzip)
            .build()?;

        let meter_provider = SdkMeterProvider::builder()
            .with_resource(Self::create_resource(service_name, service_version))
            .with_periodic_exporter(exporter)
            .build();
        opentelemetry::global::set_meter_provider(meter_provider.clone());

        Ok(meter_provider)
    }

    fn create_trace_exporter(
        service_name: &'static str,
        service_version: &'static str,
    ) -> Result<SdkTracerProvider> {
        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_http()
            .with_protocol(opentelemetry_otlp::Protocol::HttpBinary)
            .with_compression(opentelemetry_otlp::Compression::Gzip)
            .build()?;

        let tracer_provider = SdkTracerProvider::builder()
            .with_resource(Self::create_resource(service_name, service_version))
            .with_batch_exporter(exporter)
            .build();
        opentelemetry::global::set_tracer_provider(tracer_provider.clone());

        opentelemetry::global::set_text_map_propagator(
            opentelemetry_sdk::propagation::TraceContextPropagator::new(),
        );

        Ok(tracer_provider)
    }

    fn create_resource(
        service_name: &'static str,
        service_version: &'static str,
    ) -> opentelemetry_sdk::Resource {
        opentelemetry_sdk::Resource::builder()
            .with_service_name(service_name)
            .with_attribute(opentelemetry::KeyValue::new(
                opentelemetry_semantic_conventions::resource::SERVICE_VERSION,
                service_version,
            ))
            .with_detectors(&[
                Box::new(opentelemetry_resource_detectors::OsResourceDetector),
                Box::new(opentelemetry_resource_detectors::ProcessResourceDetector),
            ])
            .build()
    }
}

impl Drop for TelemetryHandler {
    fn drop(&mut self) {
        if let Some(tracer_provider) = &self.tracer_provider
            && let Err(err) = tracer_provider.shutdown()
        {
            eprintln!("{err:?}");
        }
        if let Some(meter_provider) = &self.meter_provider
            && let Err(err) = meter_provider.shutdown()
        {
            eprintln!("{err:?}");
        }
    }
}
