/// JSON encodings used by the daemon.
///
/// Record values in the store and status reports on the log are compact JSON.
/// Uses `serde-json-core` so encoding works without an allocator.
use serde::Serialize;

use crate::registry::DeviceRecord;

/// Upper bound for an encoded [`DeviceRecord`]. A 64-byte name that needs
/// escaping on every byte still fits.
pub const MAX_RECORD_LEN: usize = 512;

/// Maximum size of a serialized status message
pub const MAX_MSG_LEN: usize = 512;

/// Scratch space for unescaping a stored name
const UNESCAPE_BUF_LEN: usize = 256;

/// Daemon version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Periodic status report, one NDJSON line.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename = "status")]
pub struct StatusReport {
    /// Completed scan cycles
    pub cycles: u32,
    /// Devices recorded for the first time
    pub new: u32,
    /// Known devices re-reported after the debounce window
    pub known: u32,
    /// Sightings suppressed by the debounce window
    pub ignored: u32,
    /// Sightings whose registry step failed
    pub failed: u32,
    /// Scans that returned an error
    pub scan_errors: u32,
    /// Uptime in seconds
    pub uptime: u64,
    /// Board identifier
    pub board: &'static str,
    /// Daemon version
    pub version: &'static str,
}

/// Encode a record for storage. Returns the number of bytes written.
pub fn encode_record(record: &DeviceRecord, buf: &mut [u8]) -> Option<usize> {
    serde_json_core::to_slice(record, buf).ok()
}

/// Decode a stored record. `None` means the bytes are not a valid record.
pub fn decode_record(data: &[u8]) -> Option<DeviceRecord> {
    let trimmed = trim_trailing_whitespace(data);
    if trimmed.is_empty() {
        return None;
    }
    let mut scratch = [0u8; UNESCAPE_BUF_LEN];
    serde_json_core::de::from_slice_escaped::<DeviceRecord>(trimmed, &mut scratch)
        .ok()
        .map(|(record, _)| record)
}

/// Serialize a status report as one NDJSON line (trailing newline included
/// when it fits). Returns the number of bytes written.
pub fn serialize_status(report: &StatusReport, buf: &mut [u8]) -> Option<usize> {
    match serde_json_core::to_slice(report, buf) {
        Ok(len) => {
            if len < buf.len() {
                buf[len] = b'\n';
                Some(len + 1)
            } else {
                Some(len)
            }
        }
        Err(_) => None,
    }
}

fn trim_trailing_whitespace(data: &[u8]) -> &[u8] {
    let mut end = data.len();
    while end > 0 && data[end - 1].is_ascii_whitespace() {
        end -= 1;
    }
    &data[..end]
}
