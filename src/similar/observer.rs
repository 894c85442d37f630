//! Pipeline diagnostics.
//!
//! The similarity engine never logs directly. It reports notable events to a
//! [`PipelineObserver`] injected at construction, which keeps the core
//! functions pure and lets tests assert on what happened.

use std::fmt;

use tracing::{debug, warn};

use crate::error::RelataError;
use crate::similar::mode::FusionMode;
use crate::similar::retriever::Signal;

/// Receiver of pipeline events. Every method defaults to doing nothing.
pub trait PipelineObserver: Send + Sync + fmt::Debug {
    /// The source identifier matched no document.
    fn source_not_found(&self, _source_id: &str) {}

    /// A filter expression could not be parsed and was skipped.
    fn filter_rejected(&self, _expression: &str, _error: &RelataError) {}

    /// The source document has no vector in the requested field.
    fn missing_vector(&self, _source_id: &str, _field: &str) {}

    /// A retriever produced its candidates.
    fn signal_retrieved(&self, _signal: Signal, _candidates: usize) {}

    /// A request finished with this many documents.
    fn completed(&self, _source_id: &str, _mode: FusionMode, _num_found: usize) {}
}

/// Observer that emits `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn source_not_found(&self, source_id: &str) {
        debug!(source_id, "source document not found");
    }

    fn filter_rejected(&self, expression: &str, error: &RelataError) {
        warn!(expression, %error, "skipping invalid filter expression");
    }

    fn missing_vector(&self, source_id: &str, field: &str) {
        debug!(source_id, field, "source document has no vector");
    }

    fn signal_retrieved(&self, signal: Signal, candidates: usize) {
        debug!(signal = signal.as_str(), candidates, "retrieved candidates");
    }

    fn completed(&self, source_id: &str, mode: FusionMode, num_found: usize) {
        debug!(source_id, mode = mode.as_str(), num_found, "similarity request completed");
    }
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}
