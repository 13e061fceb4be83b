//! btwatch: Bluetooth presence daemon for Linux boards
//!
//! Single-threaded polling loop around the portable `btwatch` driver, with
//! the platform pieces behind its traits: `hcitool` for scans, a directory of
//! JSON files for the registry, and the Omega2 expansion tools for output.
//! A second thread only waits for SIGINT/SIGTERM and forwards them. A second
//! signal exits at once, without waiting for the in-flight cycle.

mod command;
mod config;
mod display;
mod led;
mod scan;
mod store;

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::Context;
use clap::Parser;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;

use btwatch::board;
use btwatch::driver::{DisplaySink, Driver, Notifier, ScanSource};
use btwatch::protocol::{self, StatusReport, MAX_MSG_LEN, VERSION};
use btwatch::registry::Registry;

use config::Config;
use display::OledDisplay;
use led::ExpLed;
use scan::CommandScan;
use store::DirStore;

fn main() -> anyhow::Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::init();

    let config = Config::parse();
    log::info!("btwatch v{} starting on {}", VERSION, board::BOARD_NAME);

    let store = DirStore::open(&config.store)
        .with_context(|| format!("opening store at {}", config.store.display()))?;
    log::info!("Registry: {}", store.base().display());

    if !config.no_radio_setup {
        scan::radio_up(&config.radio_command());
    }

    let display = if config.display_enabled() {
        OledDisplay::init(&config.display_init_command());
        OledDisplay::new(config.display_command())
    } else {
        OledDisplay::disabled()
    };

    let light = if config.led_enabled() {
        ExpLed::new(
            config.led_command(),
            config.led_on_color.clone(),
            config.led_off_color.clone(),
            config.led_hold(),
        )
    } else {
        ExpLed::disabled()
    };

    // ── Signal thread ────────────────────────────────────────────────

    let (stop_tx, stop_rx) = mpsc::sync_channel::<i32>(1);
    let mut signals = Signals::new([SIGINT, SIGTERM]).context("installing signal handlers")?;
    thread::Builder::new()
        .name("signals".into())
        .spawn(move || {
            if let Some(sig) = forward_signals(signals.forever(), &stop_tx) {
                log::warn!("Got signal {} again, exiting now", sig);
                std::process::exit(128 + sig);
            }
        })
        .context("spawning signal thread")?;

    // ── Scan loop ────────────────────────────────────────────────────

    let mut driver = Driver::new(store, display, light, config.policy());
    let mut source = CommandScan::new(config.scan_command());
    let timing = Timing {
        interval: config.interval(),
        status_every: config.status_every(),
    };

    run_loop(&mut driver, &mut source, &stop_rx, &timing, Instant::now());

    log::info!(
        "Stopped after {} cycles ({} new, {} known)",
        driver.stats().cycles,
        driver.stats().new,
        driver.stats().known,
    );
    Ok(())
}

/// Forward the first signal to the scan loop. Returns the next one, which
/// means the loop did not stop in time.
fn forward_signals(
    signals: impl IntoIterator<Item = i32>,
    stop: &SyncSender<i32>,
) -> Option<i32> {
    let mut signals = signals.into_iter();
    let first = signals.next()?;
    let _ = stop.try_send(first);
    signals.next()
}

struct Timing {
    interval: Duration,
    status_every: Option<Duration>,
}

/// Run cycles until a signal arrives on `stop` (or its sender goes away).
/// Returns the signal number, if any.
fn run_loop<R, D, N, S>(
    driver: &mut Driver<R, D, N>,
    source: &mut S,
    stop: &Receiver<i32>,
    timing: &Timing,
    boot: Instant,
) -> Option<i32>
where
    R: Registry,
    D: DisplaySink,
    N: Notifier,
    S: ScanSource,
{
    let mut last_status = Instant::now();

    loop {
        match stop.recv_timeout(timing.interval) {
            Ok(sig) => {
                log::info!("Got signal {}, quitting...", sig);
                return Some(sig);
            }
            Err(RecvTimeoutError::Disconnected) => {
                log::info!("Signal channel closed, quitting...");
                return None;
            }
            Err(RecvTimeoutError::Timeout) => {}
        }

        let cycle = panic::catch_unwind(AssertUnwindSafe(|| {
            driver.run_cycle(&mut *source, unix_now())
        }));
        match cycle {
            Ok(report) if report.is_notable() => log::info!("Cycle: {}", report),
            Ok(report) => log::debug!("Cycle: {}", report),
            Err(_) => log::error!("Scan cycle panicked, continuing"),
        }

        if let Some(every) = timing.status_every {
            if last_status.elapsed() >= every {
                log_status(driver, boot);
                last_status = Instant::now();
            }
        }
    }
}

fn log_status<R, D, N>(driver: &Driver<R, D, N>, boot: Instant)
where
    R: Registry,
    D: DisplaySink,
    N: Notifier,
{
    let stats = driver.stats();
    let report = StatusReport {
        cycles: stats.cycles,
        new: stats.new,
        known: stats.known,
        ignored: stats.ignored,
        failed: stats.failed,
        scan_errors: stats.scan_errors,
        uptime: boot.elapsed().as_secs(),
        board: board::BOARD_NAME,
        version: VERSION,
    };

    let mut buf = [0u8; MAX_MSG_LEN];
    match protocol::serialize_status(&report, &mut buf) {
        Some(len) => match std::str::from_utf8(&buf[..len]) {
            Ok(line) => log::info!("{}", line.trim_end()),
            Err(e) => log::warn!("Status report not UTF-8: {}", e),
        },
        None => log::warn!("Status report does not fit in {} bytes", MAX_MSG_LEN),
    }
}

/// Seconds since the Unix epoch; 0 if the clock is before it.
fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
