use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

pub struct Metrics {
    predictions_total: IntCounterVec,
    predict_latency_seconds: Histogram,
    model_loaded: IntGauge,
    pub registry: Registry,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let predictions_total = IntCounterVec::new(
            Opts::new("wms_predictions_total", "Total number of prediction requests"),
            &["outcome"],
        )
        .expect("invalid counter definition");

        let predict_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "wms_predict_latency_seconds",
                "Latency of successful predictions in seconds",
            )
            .buckets(vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        )
        .expect("invalid histogram definition");

        let model_loaded = IntGauge::new(
            "wms_model_loaded",
            "Whether a model is loaded (1) or not (0)",
        )
        .expect("invalid gauge definition");

        registry
            .register(Box::new(predictions_total.clone()))
            .expect("failed to register counter");
        registry
            .register(Box::new(predict_latency_seconds.clone()))
            .expect("failed to register histogram");
        registry
            .register(Box::new(model_loaded.clone()))
            .expect("failed to register gauge");

        Metrics {
            predictions_total,
            predict_latency_seconds,
            model_loaded,
            registry,
        }
    }

    pub fn record_outcome(&self, outcome: &str) {
        self.predictions_total.with_label_values(&[outcome]).inc();
    }

    pub fn record_latency(&self, seconds: f64) {
        self.predict_latency_seconds.observe(seconds);
    }

    pub fn set_model_loaded(&self, loaded: bool) {
        self.model_loaded.set(if loaded { 1 } else { 0 });
    }

    pub fn outcome_count(&self, outcome: &str) -> u64 {
        self.predictions_total.with_label_values(&[outcome]).get()
    }

    pub fn render(&self) -> String {
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .expect("failed to encode metrics");

        String::from_utf8(buffer).expect("metrics text was not utf-8")
    }
}
