//! Collects the diagnostics of compiler runs that finish in parallel.

use crate::diagnostic::Diagnostic;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Diagnostics reported by concurrently running compiler tasks.
///
/// A task reports the whole output of one compiler run in a single
/// [`report`](Self::report) call, so batches from different runs never
/// interleave. The running error count is readable without the lock.
#[derive(Default)]
pub struct DiagnosticSink {
    batches: Mutex<Vec<Vec<Diagnostic>>>,
    errors: AtomicUsize,
}

impl DiagnosticSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the diagnostics of one compiler run. Returns how many of them
    /// are errors.
    pub fn report(&self, batch: impl IntoIterator<Item = Diagnostic>) -> usize {
        let batch: Vec<Diagnostic> = batch.into_iter().collect();
        let errors = batch.iter().filter(|d| d.severity.is_error()).count();
        self.errors.fetch_add(errors, Ordering::Relaxed);
        if !batch.is_empty() {
            self.batches().push(batch);
        }
        errors
    }

    /// Returns `true` once any reported diagnostic is an error.
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Errors reported so far, drained or not.
    pub fn error_count(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }

    /// Number of non-empty batches waiting to be drained.
    pub fn pending_batches(&self) -> usize {
        self.batches().len()
    }

    /// Removes everything reported so far, flattened in reporting order.
    pub fn drain(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.batches())
            .into_iter()
            .flatten()
            .collect()
    }

    fn batches(&self) -> MutexGuard<'_, Vec<Vec<Diagnostic>>> {
        // A panicking reporter leaves whole batches behind.
        self.batches
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
