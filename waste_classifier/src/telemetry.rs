use opentelemetry::{
    global,
    metrics::{Counter, Histogram, MeterProvider},
    KeyValue,
};
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::Registry;

const DURATION_BOUNDARIES_MS: [f64; 12] = [
    5.0, 10.0, 25.0, 50.0, 75.0, 100.0, 150.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0,
];

pub struct Metrics {
    prediction_counter: Counter<u64>,
    failure_counter: Counter<u64>,
    prediction_duration: Histogram<u64>,
    // Keeps the pipeline alive if the global provider is replaced.
    _provider: SdkMeterProvider,
    pub registry: Registry,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();
        let exporter = opentelemetry_prometheus::exporter()
            .with_registry(registry.clone())
            .build()?;

        let provider = SdkMeterProvider::builder()
            .with_reader(exporter)
            .build();

        let meter = provider.meter("waste_classifier");
        global::set_meter_provider(provider.clone());

        let prediction_counter = meter
            .u64_counter("predictions_total")
            .with_description("Total number of predictions by predicted label")
            .build();

        let failure_counter = meter
            .u64_counter("prediction_failures_total")
            .with_description("Total number of rejected or failed prediction requests")
            .build();

        let prediction_duration = meter
            .u64_histogram("prediction_duration_ms")
            .with_boundaries(DURATION_BOUNDARIES_MS.to_vec())
            .with_description("Duration of preprocessing and inference in milliseconds")
            .build();

        Ok(Metrics {
            prediction_counter,
            failure_counter,
            prediction_duration,
            _provider: provider,
            registry,
        })
    }

    pub fn record_prediction(&self, label: &str, duration_ms: u64) {
        let attributes = [KeyValue::new("label", label.to_string())];
        self.prediction_counter.add(1, &attributes);
        self.prediction_duration.record(duration_ms, &attributes);
    }

    pub fn record_failure(&self, route: &str) {
        let attributes = [KeyValue::new("route", route.to_string())];
        self.failure_counter.add(1, &attributes);
    }
}
