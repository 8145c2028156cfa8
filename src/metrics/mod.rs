use prometheus::{Counter, Gauge, Histogram, HistogramOpts, Opts, Registry};
use std::sync::Arc;

/// Prometheus metrics for the index writer
#[derive(Clone)]
pub struct IndexMetrics {
    // Counters
    pub documents_inserted: Counter,
    pub documents_removed: Counter,
    pub fields_indexed: Counter,
    pub commits: Counter,

    // Gauges
    pub live_segments: Gauge,
    pub live_documents: Gauge,

    // Histograms
    pub commit_latency: Histogram,

    // Registry
    registry: Arc<Registry>,
}

impl IndexMetrics {
    /// Create a new IndexMetrics instance
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        // Counters
        let documents_inserted = Counter::with_opts(Opts::new(
            "doclink_documents_inserted_total",
            "Total number of documents inserted",
        ))?;
        registry.register(Box::new(documents_inserted.clone()))?;

        let documents_removed = Counter::with_opts(Opts::new(
            "doclink_documents_removed_total",
            "Total number of documents removed by primary key",
        ))?;
        registry.register(Box::new(documents_removed.clone()))?;

        let fields_indexed = Counter::with_opts(Opts::new(
            "doclink_fields_indexed_total",
            "Total number of fields indexed",
        ))?;
        registry.register(Box::new(fields_indexed.clone()))?;

        let commits = Counter::with_opts(Opts::new(
            "doclink_commits_total",
            "Total number of published commits",
        ))?;
        registry.register(Box::new(commits.clone()))?;

        // Gauges
        let live_segments = Gauge::with_opts(Opts::new(
            "doclink_live_segments",
            "Segments in the latest snapshot",
        ))?;
        registry.register(Box::new(live_segments.clone()))?;

        let live_documents = Gauge::with_opts(Opts::new(
            "doclink_live_documents",
            "Non-deleted documents in the latest snapshot",
        ))?;
        registry.register(Box::new(live_documents.clone()))?;

        // Histograms
        let commit_latency = Histogram::with_opts(
            HistogramOpts::new("doclink_commit_latency_seconds", "Commit latency in seconds")
                .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        )?;
        registry.register(Box::new(commit_latency.clone()))?;

        Ok(Self {
            documents_inserted,
            documents_removed,
            fields_indexed,
            commits,
            live_segments,
            live_documents,
            commit_latency,
            registry: Arc::new(registry),
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Record an inserted document and its field count
    pub fn record_insert(&self, fields: usize) {
        self.documents_inserted.inc();
        self.fields_indexed.inc_by(fields as f64);
    }

    pub fn record_removed(&self, count: usize) {
        self.documents_removed.inc_by(count as f64);
    }

    /// Record a published commit
    pub fn record_commit(&self, duration_secs: f64, segments: usize, live_documents: u64) {
        self.commits.inc();
        self.commit_latency.observe(duration_secs);
        self.live_segments.set(segments as f64);
        self.live_documents.set(live_documents as f64);
    }
}
