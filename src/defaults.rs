/// Default policy values and external command lines.
///
/// The daemon exposes every one of these as a command-line override; the
/// library only relies on the policy numbers.

/// Minimum time between two notable sightings of the same device (5 hours).
///
/// A radio that keeps re-advertising inside this window is ignored so the
/// display does not fill up with the same handful of phones.
pub const DEBOUNCE_SECS: u64 = 5 * 60 * 60;

/// Delay between the end of one scan cycle and the start of the next.
///
/// `hcitool scan` itself blocks for roughly ten seconds, so a short idle
/// period is enough to keep the radio busy without spinning.
pub const POLL_INTERVAL_SECS: u64 = 1;

/// How often the daemon logs an NDJSON status report.
pub const STATUS_INTERVAL_SECS: u64 = 300;

/// Directory holding one file per known device.
pub const STORE_DIR: &str = "btwatch-data";

/// Inquiry scan; prints `\tAA:BB:CC:DD:EE:FF\tName` per discovered device.
pub const SCAN_COMMAND: &[&str] = &["hcitool", "scan", "--flush"];

/// Brings the HCI interface up (the device name is appended).
pub const RADIO_UP_COMMAND: &[&str] = &["hciconfig"];

/// One-time OLED expansion initialization.
pub const DISPLAY_INIT_COMMAND: &[&str] = &["oled-exp", "-i"];

/// Writes the rendered buffer to the OLED (the text is appended as one argument).
pub const DISPLAY_WRITE_COMMAND: &[&str] = &["/bin/sh", "write-oled.sh"];

/// Sets the RGB expansion LED (the color is appended).
pub const LED_COMMAND: &[&str] = &["expled"];
