use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

// ============================================================================
// Metrics Module - Prometheus metrics for order adjustments
// ============================================================================
//
// Provides metrics for:
// - Adjustment outcomes (accepted, rejected, denied, failed)
// - Rejections by field and error code
// - End-to-end handling latency
// - Storage retries
// - History appends that failed after the order was committed
//
// ============================================================================

/// Outcome label values for `order_adjustments_total`
pub mod outcome {
    pub const ACCEPTED: &str = "accepted";
    pub const REJECTED: &str = "rejected";
    pub const DENIED: &str = "denied";
    pub const FAILED: &str = "failed";
}

pub struct Metrics {
    registry: Registry,

    pub adjustments_total: IntCounterVec,
    pub adjustment_rejections: IntCounterVec,
    pub adjustment_duration: Histogram,
    pub retry_attempts_total: IntCounterVec,
    pub history_failures_total: IntCounter,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let adjustments_total = IntCounterVec::new(
            Opts::new("order_adjustments_total", "Total discount/tax adjustment requests by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(adjustments_total.clone()))?;

        let adjustment_rejections = IntCounterVec::new(
            Opts::new("order_adjustment_rejections_total", "Rejected adjustments by field and error code"),
            &["field", "code"],
        )?;
        registry.register(Box::new(adjustment_rejections.clone()))?;

        let adjustment_duration = Histogram::with_opts(
            HistogramOpts::new("order_adjustment_duration_seconds", "Adjustment handling duration")
                .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        )?;
        registry.register(Box::new(adjustment_duration.clone()))?;

        let retry_attempts_total = IntCounterVec::new(
            Opts::new("order_adjustment_retry_attempts_total", "Retried attempts after transient storage failures"),
            &["operation"],
        )?;
        registry.register(Box::new(retry_attempts_total.clone()))?;

        let history_failures_total = IntCounter::new(
            "order_adjustment_history_failures_total",
            "Committed adjustments whose history event could not be appended",
        )?;
        registry.register(Box::new(history_failures_total.clone()))?;

        Ok(Self {
            registry,
            adjustments_total,
            adjustment_rejections,
            adjustment_duration,
            retry_attempts_total,
            history_failures_total,
        })
    }

    /// Helper to record how a request ended and how long it took
    pub fn record_outcome(&self, outcome: &str, duration_secs: f64) {
        self.adjustments_total.with_label_values(&[outcome]).inc();
        self.adjustment_duration.observe(duration_secs);
    }

    /// Helper to record a field-level rejection
    pub fn record_rejection(&self, field: &str, code: &str) {
        self.adjustment_rejections.with_label_values(&[field, code]).inc();
    }

    /// Helper to record a retried attempt
    pub fn record_retry_attempt(&self, operation: &str) {
        self.retry_attempts_total.with_label_values(&[operation]).inc();
    }

    pub fn record_history_failure(&self) {
        self.history_failures_total.inc();
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn encode_text(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
