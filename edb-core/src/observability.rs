//! Logging and OpenTelemetry initialisation
//!
//! The client logs through `tracing` everywhere. An application that wants
//! those events on stdout, or exported to an OTLP collector together with
//! spans and client metrics, calls [`init_observability`] once at startup.
//!
//! ```rust,no_run
//! use edb_core::ObservabilityConfig;
//!
//! let config = ObservabilityConfig::new("node-monitor")
//!     .with_endpoint("http://localhost:4317")
//!     .with_log_level("edb_client=debug,info");
//!
//! edb_core::init_observability(config).expect("observability");
//! // ... use the client ...
//! edb_core::shutdown_observability().expect("flush telemetry");
//! ```
//!
//! # Environment Variables
//!
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: default collector endpoint
//! - `RUST_LOG`: log filter, takes precedence over the configured level

use opentelemetry::{global, KeyValue};
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Boxed error returned by the initialisation functions
pub type InitError = Box<dyn std::error::Error + Send + Sync>;

const DEFAULT_OTLP_ENDPOINT: &str = "http://localhost:4317";
const METRIC_EXPORT_INTERVAL: Duration = Duration::from_secs(30);

/// Handles to the installed providers; the globals only hand out tracers and meters
struct Providers {
    tracer: Option<SdkTracerProvider>,
    meter: Option<SdkMeterProvider>,
}

static PROVIDERS: Mutex<Providers> = Mutex::new(Providers {
    tracer: None,
    meter: None,
});

fn providers() -> MutexGuard<'static, Providers> {
    PROVIDERS.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Observability configuration
///
/// Defaults: service name "edb", crate version, endpoint from
/// `OTEL_EXPORTER_OTLP_ENDPOINT`, traces and metrics enabled, level from
/// `RUST_LOG` or "info".
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Service name attached to every span and metric
    pub service_name: String,
    /// Service version attached to every span and metric
    pub service_version: String,
    /// OTLP/gRPC collector endpoint
    pub otlp_endpoint: String,
    /// Export spans to the collector
    pub enable_traces: bool,
    /// Export client metrics to the collector
    pub enable_metrics: bool,
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "edb".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            otlp_endpoint: std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_OTLP_ENDPOINT.to_string()),
            enable_traces: true,
            enable_metrics: true,
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }
}

impl ObservabilityConfig {
    /// Create a configuration with a custom service name
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    /// Set the OTLP collector endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.otlp_endpoint = endpoint.into();
        self
    }

    /// Set the log filter directive
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the service version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = version.into();
        self
    }

    /// Enable or disable span export
    pub fn with_traces(mut self, enable: bool) -> Self {
        self.enable_traces = enable;
        self
    }

    /// Enable or disable metric export
    pub fn with_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = enable;
        self
    }

    fn resource(&self) -> opentelemetry_sdk::Resource {
        opentelemetry_sdk::Resource::builder_empty()
            .with_attributes(vec![
                KeyValue::new(
                    opentelemetry_semantic_conventions::resource::SERVICE_NAME,
                    self.service_name.clone(),
                ),
                KeyValue::new(
                    opentelemetry_semantic_conventions::resource::SERVICE_VERSION,
                    self.service_version.clone(),
                ),
            ])
            .build()
    }
}

/// Install the tracing subscriber and, if enabled, the OTLP pipelines
///
/// Fails if a global subscriber is already installed, or if an exporter
/// cannot be built. Must be called from within a tokio runtime when traces or
/// metrics are enabled.
pub fn init_observability(config: ObservabilityConfig) -> Result<(), InitError> {
    let tracer = if config.enable_traces {
        Some(init_tracer(&config)?)
    } else {
        None
    };

    if config.enable_metrics {
        init_metrics(&config)?;
    }

    init_tracing_subscriber(&config, tracer)?;

    tracing::info!(
        service_name = %config.service_name,
        otlp_endpoint = %config.otlp_endpoint,
        traces = config.enable_traces,
        metrics = config.enable_metrics,
        "Observability initialized"
    );

    Ok(())
}

fn init_tracer(config: &ObservabilityConfig) -> Result<opentelemetry_sdk::trace::Tracer, InitError> {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::trace::{RandomIdGenerator, Sampler};

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .build()?;

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(config.resource())
        .with_sampler(Sampler::AlwaysOn)
        .with_id_generator(RandomIdGenerator::default())
        .build();

    // The subscriber layer needs the tracer before the provider goes global
    let tracer = provider.tracer(config.service_name.clone());
    providers().tracer = Some(provider.clone());
    global::set_tracer_provider(provider);

    Ok(tracer)
}

fn init_metrics(config: &ObservabilityConfig) -> Result<(), InitError> {
    use opentelemetry_otlp::WithExportConfig;

    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .build()?;

    let reader = opentelemetry_sdk::metrics::PeriodicReader::builder(exporter)
        .with_interval(METRIC_EXPORT_INTERVAL)
        .build();

    let provider = SdkMeterProvider::builder()
        .with_reader(reader)
        .with_resource(config.resource())
        .build();

    providers().meter = Some(provider.clone());
    global::set_meter_provider(provider);
    Ok(())
}

fn init_tracing_subscriber(
    config: &ObservabilityConfig,
    tracer: Option<opentelemetry_sdk::trace::Tracer>,
) -> Result<(), InitError> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_level))?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .json();

    // `Option<Layer>` is itself a layer, so one registry covers both cases
    let telemetry_layer = tracer.map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));

    tracing_subscriber::registry()
        .with(telemetry_layer)
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Flush pending spans and metrics, then shut the exporters down
///
/// Call once before the process exits. Without installed exporters, or on a
/// second call, there is nothing to do and this returns `Ok`. Returns the
/// first shutdown error; a failed flush is only logged.
pub fn shutdown_observability() -> Result<(), InitError> {
    let (tracer, meter) = {
        let mut providers = providers();
        (providers.tracer.take(), providers.meter.take())
    };

    let mut first_error: Option<InitError> = None;

    if let Some(provider) = tracer {
        if let Err(e) = provider.force_flush() {
            tracing::warn!(error = %e, "Failed to flush spans");
        }
        if let Err(e) = provider.shutdown() {
            first_error.get_or_insert(Box::new(e));
        }
    }

    if let Some(provider) = meter {
        if let Err(e) = provider.force_flush() {
            tracing::warn!(error = %e, "Failed to flush metrics");
        }
        if let Err(e) = provider.shutdown() {
            first_error.get_or_insert(Box::new(e));
        }
    }

    tracing::info!("Observability shut down");
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
