/// Explicit progress context passed into the fetch and consolidation loops,
/// so neither stage depends on process-wide display state. Implementations
/// must be shareable across a blocking task boundary.
pub trait Reporter: Send + Sync {
    /// Announces how many units the upcoming loop will process.
    fn begin(&self, _total: u64) {}

    /// Records `delta` completed units.
    fn advance(&self, _delta: u64) {}
}

/// Reporter that discards all progress. Useful for library callers and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl Reporter for NoopReporter {}
