//! Inquiry scan through `hcitool`.

use anyhow::Result;

use btwatch::driver::{ScanBuffer, ScanSource};

use crate::command;

/// Scan source backed by an external command (`hcitool scan --flush`).
pub struct CommandScan {
    argv: Vec<String>,
}

impl CommandScan {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }
}

impl ScanSource for CommandScan {
    type Error = anyhow::Error;

    fn scan(&mut self, out: &mut ScanBuffer) -> Result<()> {
        let stdout = command::run(&self.argv)?;
        let dropped = capture(&stdout, out);
        if dropped > 0 {
            log::warn!("Scan output truncated, {} lines dropped", dropped);
        }
        Ok(())
    }
}

/// Copy whole lines of `text` into `out` until it is full.
/// Returns the number of lines that did not fit.
pub fn capture(text: &str, out: &mut ScanBuffer) -> usize {
    let mut dropped = 0;
    for line in text.split_inclusive('\n') {
        if dropped > 0 || out.push_str(line).is_err() {
            dropped += 1;
        }
    }
    dropped
}

/// Bring the HCI interface up. Failure is logged; the scan will report it
/// again on every cycle if the radio really is down.
pub fn radio_up(argv: &[String]) {
    command::run_logged("Radio bring-up", argv);
}
