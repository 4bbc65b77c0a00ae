use crate::domain::model::RecordFailure;
use crate::domain::ports::{BatchObserver, BatchPhase};
use std::path::Path;
use std::time::{Duration, Instant};

/// Console progress for interactive runs.
///
/// Per-record failures are printed the moment they happen; the timings of
/// each phase are logged once the run returns to idle.
pub struct ConsoleObserver {
    start_time: Instant,
    phase_started: Instant,
    current: BatchPhase,
    written: usize,
    failed: usize,
    quiet: bool,
}

impl ConsoleObserver {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start_time: now,
            phase_started: now,
            current: BatchPhase::Idle,
            written: 0,
            failed: 0,
            quiet: false,
        }
    }

    /// Keeps logging but stops printing to stdout and stderr.
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    fn log_phase_time(&self) {
        match self.current {
            BatchPhase::Idle | BatchPhase::Filling { .. } => {}
            phase => tracing::debug!(
                "⏱️ {:?} took {:?}",
                phase,
                self.phase_started.elapsed()
            ),
        }
    }

    pub fn log_final_stats(&self) {
        tracing::info!(
            "📊 Final Stats - Total Time: {:?}, Written: {}, Failed: {}",
            self.elapsed(),
            self.written,
            self.failed
        );
    }
}

impl Default for ConsoleObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchObserver for ConsoleObserver {
    fn phase_changed(&mut self, phase: BatchPhase) {
        // Filling is reported once per row; only time it as a whole.
        let same_phase = matches!(
            (self.current, phase),
            (BatchPhase::Filling { .. }, BatchPhase::Filling { .. })
        );
        if same_phase {
            self.current = phase;
            return;
        }

        self.log_phase_time();
        self.current = phase;
        self.phase_started = Instant::now();

        if phase == BatchPhase::Idle {
            self.log_final_stats();
        }
    }

    fn record_written(&mut self, _row: usize, path: &Path) {
        self.written += 1;
        if !self.quiet {
            println!("📄 {}", path.display());
        }
    }

    fn record_failed(&mut self, failure: &RecordFailure) {
        self.failed += 1;
        if !self.quiet {
            eprintln!(
                "❌ Error while creating PDF for number {}: {}",
                failure.external_number, failure.message
            );
        }
    }
}
