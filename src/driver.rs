/// One polling cycle: scan, parse, reconcile, then refresh the display and
/// pulse the light if anything notable happened.
///
/// The driver owns the registry, the display buffer and the two output
/// collaborators. The scan source is passed per cycle so platform code keeps
/// control over how (and whether) a scan runs.
use core::fmt;

use crate::display::DisplayBuffer;
use crate::reconciler::{reconcile, Outcome, Policy};
use crate::registry::Registry;
use crate::scanner::parse_scan;

/// Capacity of the raw scan capture.
pub const MAX_SCAN_LEN: usize = 4096;

/// Raw scan text, filled by a [`ScanSource`].
pub type ScanBuffer = heapless::String<MAX_SCAN_LEN>;

/// Produces raw scan output.
pub trait ScanSource {
    type Error: fmt::Display;

    /// Run one scan and write its text output into `out` (cleared by the
    /// caller).
    fn scan(&mut self, out: &mut ScanBuffer) -> Result<(), Self::Error>;
}

/// Shows rendered buffer text.
pub trait DisplaySink {
    type Error: fmt::Display;

    fn show(&mut self, text: &str) -> Result<(), Self::Error>;
}

/// Notification light.
pub trait Notifier {
    type Error: fmt::Display;

    fn set(&mut self, on: bool) -> Result<(), Self::Error>;
}

/// Tally of one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub new: u32,
    pub known: u32,
    pub ignored: u32,
    pub failed: u32,
    pub conflicts: u32,
    /// The scan itself failed; nothing else ran
    pub scan_failed: bool,
}

impl CycleReport {
    fn add(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::New => self.new += 1,
            Outcome::Known { conflict, .. } => {
                self.known += 1;
                if conflict {
                    self.conflicts += 1;
                }
            }
            Outcome::Ignored => self.ignored += 1,
            Outcome::Failed => self.failed += 1,
        }
    }

    /// At least one sighting was notable.
    pub fn is_notable(&self) -> bool {
        self.new + self.known > 0
    }
}

/// Running totals since startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub cycles: u32,
    pub new: u32,
    pub known: u32,
    pub ignored: u32,
    pub failed: u32,
    pub scan_errors: u32,
}

impl Stats {
    fn record(&mut self, report: &CycleReport) {
        self.cycles = self.cycles.wrapping_add(1);
        self.new = self.new.wrapping_add(report.new);
        self.known = self.known.wrapping_add(report.known);
        self.ignored = self.ignored.wrapping_add(report.ignored);
        self.failed = self.failed.wrapping_add(report.failed);
        if report.scan_failed {
            self.scan_errors = self.scan_errors.wrapping_add(1);
        }
    }
}

pub struct Driver<R, D, N> {
    registry: R,
    buffer: DisplayBuffer,
    display: D,
    light: N,
    policy: Policy,
    stats: Stats,
    scan_buf: ScanBuffer,
}

impl<R, D, N> Driver<R, D, N>
where
    R: Registry,
    D: DisplaySink,
    N: Notifier,
{
    pub fn new(registry: R, display: D, light: N, policy: Policy) -> Self {
        Self {
            registry,
            buffer: DisplayBuffer::new(),
            display,
            light,
            policy,
            stats: Stats::default(),
            scan_buf: ScanBuffer::new(),
        }
    }

    /// Run one full cycle with `now` as the observation time.
    pub fn run_cycle<S: ScanSource>(&mut self, source: &mut S, now: u64) -> CycleReport {
        self.scan_buf.clear();
        let report = match source.scan(&mut self.scan_buf) {
            Ok(()) => self.process(now),
            Err(e) => {
                log::error!("Scan failed: {}", e);
                CycleReport {
                    scan_failed: true,
                    ..Default::default()
                }
            }
        };

        self.stats.record(&report);
        report
    }

    /// Reconcile the captured scan and fire the outputs once if warranted.
    fn process(&mut self, now: u64) -> CycleReport {
        let mut report = CycleReport::default();

        for sighting in parse_scan(&self.scan_buf, now).iter() {
            let outcome = reconcile(sighting, &self.policy, &mut self.registry, &mut self.buffer);
            report.add(outcome);
        }

        if report.is_notable() {
            self.flush();
            self.pulse();
        }

        report
    }

    fn flush(&mut self) {
        let text = self.buffer.render();
        if let Err(e) = self.display.show(&text) {
            log::error!("Display update failed: {}", e);
        }
    }

    fn pulse(&mut self) {
        if let Err(e) = self.light.set(true) {
            log::error!("Light on failed: {}", e);
        }
        if let Err(e) = self.light.set(false) {
            log::error!("Light off failed: {}", e);
        }
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn buffer(&self) -> &DisplayBuffer {
        &self.buffer
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut R {
        &mut self.registry
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scan_failed {
            return f.write_str("scan failed");
        }
        write!(
            f,
            "{} new, {} known, {} ignored, {} failed",
            self.new, self.known, self.ignored, self.failed
        )
    }
}
