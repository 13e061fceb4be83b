//! Command-line and environment configuration.
//!
//! Every option falls back to the board constants and library defaults, so a
//! plain `btwatch` on an Omega2 with OLED and RGB expansions needs no flags.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use btwatch::reconciler::Policy;
use btwatch::{board, defaults};

#[derive(Debug, Parser)]
#[command(name = "btwatch", version, about = "Watch for nearby Bluetooth devices")]
pub struct Config {
    /// Directory holding one record file per known device
    #[arg(long, env = "BTWATCH_STORE", default_value = defaults::STORE_DIR)]
    pub store: PathBuf,

    /// Seconds to wait between scan cycles
    #[arg(long, env = "BTWATCH_INTERVAL", default_value_t = defaults::POLL_INTERVAL_SECS)]
    pub interval: u64,

    /// Seconds before a known device is reported again
    #[arg(long, env = "BTWATCH_DEBOUNCE", default_value_t = defaults::DEBOUNCE_SECS)]
    pub debounce: u64,

    /// Seconds between status reports (0 disables them)
    #[arg(long, env = "BTWATCH_STATUS_INTERVAL", default_value_t = defaults::STATUS_INTERVAL_SECS)]
    pub status_interval: u64,

    /// HCI interface to bring up at startup
    #[arg(long, env = "BTWATCH_HCI", default_value = board::HCI_DEVICE)]
    pub hci: String,

    /// Scan command line (default: hcitool scan --flush)
    #[arg(long, env = "BTWATCH_SCAN_CMD")]
    pub scan_cmd: Option<String>,

    /// Display write command; the rendered text is appended as one argument
    #[arg(long, env = "BTWATCH_DISPLAY_CMD")]
    pub display_cmd: Option<String>,

    /// LED command; the color is appended
    #[arg(long, env = "BTWATCH_LED_CMD")]
    pub led_cmd: Option<String>,

    /// LED color for a notable event
    #[arg(long, default_value = board::LED_ON_COLOR)]
    pub led_on_color: String,

    /// LED color when idle
    #[arg(long, default_value = board::LED_OFF_COLOR)]
    pub led_off_color: String,

    /// Milliseconds the LED stays lit per event
    #[arg(long, default_value_t = 0)]
    pub led_hold_ms: u64,

    /// Log display output instead of driving the OLED
    #[arg(long)]
    pub no_display: bool,

    /// Do not drive the notification LED
    #[arg(long)]
    pub no_led: bool,

    /// Skip bringing the radio up at startup
    #[arg(long)]
    pub no_radio_setup: bool,
}

impl Config {
    pub fn policy(&self) -> Policy {
        Policy {
            debounce_secs: self.debounce,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }

    pub fn status_every(&self) -> Option<Duration> {
        (self.status_interval > 0).then(|| Duration::from_secs(self.status_interval))
    }

    pub fn led_hold(&self) -> Duration {
        Duration::from_millis(self.led_hold_ms)
    }

    pub fn display_enabled(&self) -> bool {
        board::HAS_DISPLAY && !self.no_display
    }

    pub fn led_enabled(&self) -> bool {
        board::HAS_LED && !self.no_led
    }

    pub fn scan_command(&self) -> Vec<String> {
        command_line(self.scan_cmd.as_deref(), defaults::SCAN_COMMAND)
    }

    pub fn radio_command(&self) -> Vec<String> {
        let mut argv = command_line(None, defaults::RADIO_UP_COMMAND);
        argv.push(self.hci.clone());
        argv.push("up".into());
        argv
    }

    pub fn display_init_command(&self) -> Vec<String> {
        command_line(None, defaults::DISPLAY_INIT_COMMAND)
    }

    pub fn display_command(&self) -> Vec<String> {
        command_line(self.display_cmd.as_deref(), defaults::DISPLAY_WRITE_COMMAND)
    }

    pub fn led_command(&self) -> Vec<String> {
        command_line(self.led_cmd.as_deref(), defaults::LED_COMMAND)
    }
}

/// Split a user-supplied command on whitespace, or fall back to the default.
fn command_line(custom: Option<&str>, default: &[&str]) -> Vec<String> {
    match custom {
        Some(cmd) => cmd.split_whitespace().map(String::from).collect(),
        None => default.iter().map(|s| s.to_string()).collect(),
    }
}
