//! Index bootstrap and fixed-size batch upserts.

use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::pinecone::{IndexCatalog, IndexSpec, VectorSink};
use crate::records::VectorRecord;

/// Records buffered before each upsert call.
pub const DEFAULT_UPSERT_BATCH: usize = 100;

/// Makes sure `spec.name` exists, creating it when absent.
///
/// After a creation, polls readiness every `poll` until `max_wait` elapses. Returns whether the
/// index was created by this call.
pub fn ensure_index<C>(catalog: &C, spec: &IndexSpec, poll: Duration, max_wait: Duration) -> Result<bool>
where
    C: IndexCatalog + ?Sized,
{
    let existing = catalog
        .list_index_names()
        .context("failed to list existing indexes")?;
    if existing.iter().any(|name| name == &spec.name) {
        debug!(index = %spec.name, "index already exists");
        return Ok(false);
    }

    info!(
        index = %spec.name,
        dimension = spec.dimension,
        metric = %spec.metric,
        region = %spec.region,
        "creating new index"
    );
    catalog
        .create_index(spec)
        .with_context(|| format!("failed to create index '{}'", spec.name))?;

    let started = Instant::now();
    loop {
        if catalog.is_ready(&spec.name)? {
            info!(index = %spec.name, "index is ready");
            return Ok(true);
        }
        anyhow::ensure!(
            started.elapsed() < max_wait,
            "index '{}' not ready after {:?}",
            spec.name,
            max_wait
        );
        thread::sleep(poll);
    }
}

/// Totals reported once the upserter is finished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertSummary {
    /// Number of upsert calls issued.
    pub batches: usize,
    /// Records sent across all calls.
    pub records: usize,
}

/// Buffers records and forwards them to a [`VectorSink`] in fixed-size batches.
///
/// Batches are independent: a failure leaves earlier batches stored.
pub struct BatchUpserter<'a, S: ?Sized> {
    sink: &'a S,
    batch_size: usize,
    pending: Vec<VectorRecord>,
    summary: UpsertSummary,
}

impl<'a, S: VectorSink + ?Sized> BatchUpserter<'a, S> {
    /// Creates an upserter flushing every `batch_size` records (minimum one).
    pub fn new(sink: &'a S, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            sink,
            batch_size,
            pending: Vec::with_capacity(batch_size),
            summary: UpsertSummary::default(),
        }
    }

    /// Queues one record, flushing when the batch fills up.
    pub fn push(&mut self, record: VectorRecord) -> Result<()> {
        self.pending.push(record);
        if self.pending.len() >= self.batch_size {
            self.flush()?;
        }
        Ok(())
    }

    /// Sends any remainder and returns the totals.
    pub fn finish(mut self) -> Result<UpsertSummary> {
        self.flush()?;
        Ok(self.summary)
    }

    fn flush(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let count = self.pending.len();
        let acknowledged = self
            .sink
            .upsert(&self.pending)
            .with_context(|| format!("upsert batch {} failed", self.summary.batches + 1))?;
        self.summary.batches += 1;
        self.summary.records += count;
        debug!(
            batch = self.summary.batches,
            sent = count,
            acknowledged,
            "upserted batch"
        );
        info!("upserted {} vectors so far...", self.summary.records);
        self.pending.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::EmbeddingPair;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct RecordingSink {
        calls: RefCell<Vec<usize>>,
        fail_on_call: Option<usize>,
    }

    impl VectorSink for RecordingSink {
        fn upsert(&self, records: &[VectorRecord]) -> Result<usize> {
            let call = self.calls.borrow().len() + 1;
            if self.fail_on_call == Some(call) {
                anyhow::bail!("503 Service Unavailable");
            }
            self.calls.borrow_mut().push(records.len());
            Ok(records.len())
        }
    }

    struct FakeCatalog {
        names: Vec<String>,
        created: RefCell<Vec<IndexSpec>>,
        ready_after: usize,
        polls: Cell<usize>,
    }

    impl FakeCatalog {
        fn with(names: &[&str], ready_after: usize) -> Self {
            Self {
                names: names.iter().map(|n| n.to_string()).collect(),
                created: RefCell::new(Vec::new()),
                ready_after,
                polls: Cell::new(0),
            }
        }
    }

    impl IndexCatalog for FakeCatalog {
        fn list_index_names(&self) -> Result<Vec<String>> {
            Ok(self.names.clone())
        }

        fn create_index(&self, spec: &IndexSpec) -> Result<()> {
            self.created.borrow_mut().push(spec.clone());
            Ok(())
        }

        fn is_ready(&self, _name: &str) -> Result<bool> {
            self.polls.set(self.polls.get() + 1);
            Ok(self.polls.get() > self.ready_after)
        }
    }

    fn record(i: usize) -> VectorRecord {
        VectorRecord::from_pair(
            EmbeddingPair {
                text: format!("snippet {i}"),
                vector: vec![0.0; 4],
            },
            "mlb-chicago-cubs",
        )
    }

    #[test]
    fn two_hundred_fifty_records_make_three_calls() {
        let sink = RecordingSink::default();
        let mut upserter = BatchUpserter::new(&sink, DEFAULT_UPSERT_BATCH);
        for i in 0..250 {
            upserter.push(record(i)).expect("push");
        }
        let summary = upserter.finish().expect("finish");
        assert_eq!(*sink.calls.borrow(), vec![100, 100, 50]);
        assert_eq!(
            summary,
            UpsertSummary {
                batches: 3,
                records: 250
            }
        );
    }

    #[test]
    fn exact_multiple_has_no_trailing_call() {
        let sink = RecordingSink::default();
        let mut upserter = BatchUpserter::new(&sink, 100);
        for i in 0..200 {
            upserter.push(record(i)).expect("push");
        }
        upserter.finish().expect("finish");
        assert_eq!(*sink.calls.borrow(), vec![100, 100]);
    }

    #[test]
    fn nothing_pushed_means_no_calls() {
        let sink = RecordingSink::default();
        let summary = BatchUpserter::new(&sink, 100).finish().expect("finish");
        assert!(sink.calls.borrow().is_empty());
        assert_eq!(summary, UpsertSummary::default());
    }

    #[test]
    fn failure_keeps_earlier_batches() {
        let sink = RecordingSink {
            fail_on_call: Some(2),
            ..RecordingSink::default()
        };
        let mut upserter = BatchUpserter::new(&sink, 10);
        let err = (0..25)
            .map(record)
            .try_for_each(|r| upserter.push(r))
            .unwrap_err();
        assert!(format!("{err:#}").contains("upsert batch 2 failed"));
        assert_eq!(*sink.calls.borrow(), vec![10]);
    }

    #[test]
    fn existing_index_is_left_alone() {
        let catalog = FakeCatalog::with(&["cubs-index"], 0);
        let spec = IndexSpec::cosine("cubs-index", 1536, "aws", "us-east-1");
        let created = ensure_index(&catalog, &spec, Duration::ZERO, Duration::from_secs(1))
            .expect("ensure");
        assert!(!created);
        assert!(catalog.created.borrow().is_empty());
        assert_eq!(catalog.polls.get(), 0);
    }

    #[test]
    fn missing_index_is_created_with_cosine_metric() {
        let catalog = FakeCatalog::with(&["other"], 2);
        let spec = IndexSpec::cosine("cubs-index", 1536, "aws", "us-east-1");
        let created = ensure_index(&catalog, &spec, Duration::ZERO, Duration::from_secs(5))
            .expect("ensure");
        assert!(created);
        let specs = catalog.created.borrow();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].metric, "cosine");
        assert_eq!(specs[0].dimension, 1536);
        assert_eq!(catalog.polls.get(), 3);
    }

    #[test]
    fn readiness_wait_is_bounded() {
        let catalog = FakeCatalog::with(&[], usize::MAX);
        let spec = IndexSpec::cosine("cubs-index", 1536, "aws", "us-east-1");
        let result = ensure_index(&catalog, &spec, Duration::from_millis(1), Duration::from_millis(20));
        assert!(result.is_err());
    }
}
