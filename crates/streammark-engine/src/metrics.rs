//! Metrics collector (MC): accumulates per-stage timings into a
//! [`PerformanceMetrics`] over the course of one transaction, then rounds
//! everything to millisecond-thousandths before it's attached to a PATCH
//! message and exported standalone as a METRICS message.

use std::time::Instant;

use crate::model::PerformanceMetrics;

pub struct MetricsCollector {
    tx: u64,
    metrics: PerformanceMetrics,
    stage_start: Option<Instant>,
}

impl MetricsCollector {
    pub fn new(tx: u64) -> Self {
        Self {
            tx,
            metrics: PerformanceMetrics { tx, ..Default::default() },
            stage_start: None,
        }
    }

    pub fn begin_stage(&mut self) {
        self.stage_start = Some(Instant::now());
    }

    fn elapsed_ms(&mut self) -> f64 {
        self.stage_start.take().map(|t| t.elapsed().as_secs_f64() * 1000.0).unwrap_or(0.0)
    }

    pub fn end_parse(&mut self) {
        self.metrics.parse_ms += self.elapsed_ms();
    }

    pub fn end_enrich(&mut self) {
        self.metrics.enrich_ms += self.elapsed_ms();
    }

    pub fn end_diff(&mut self) {
        self.metrics.diff_ms += self.elapsed_ms();
    }

    pub fn end_serialize(&mut self) {
        self.metrics.serialize_ms += self.elapsed_ms();
    }

    pub fn end_coalesce(&mut self) {
        self.metrics.coalesce_ms += self.elapsed_ms();
    }

    pub fn record_highlighter(&mut self, lang: &str, ms: f64) {
        *self.metrics.highlighter_ms.entry(lang.to_string()).or_insert(0.0) += ms;
    }

    pub fn record_mdx_detection(&mut self, ms: f64) {
        self.metrics.mdx_detection_ms += ms;
    }

    pub fn record_patches(&mut self, count: usize, bytes: usize) {
        self.metrics.patch_count = count;
        self.metrics.patch_bytes = bytes;
    }

    pub fn record_queue_depth(&mut self, depth: usize) {
        self.metrics.queue_depth = depth;
    }

    pub fn record_append_line_batch(&mut self) {
        self.metrics.append_line_batches += 1;
    }

    pub fn record_block_counts(&mut self, counts: std::collections::BTreeMap<String, usize>) {
        self.metrics.block_counts = counts;
    }

    pub fn finish(mut self) -> PerformanceMetrics {
        self.metrics.grammar_engine = "streammark".to_string();
        self.metrics.rounded()
    }

    pub fn tx(&self) -> u64 {
        self.tx
    }
}
