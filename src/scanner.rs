/// Scan output parser.
///
/// Turns the text printed by an inquiry scan (`hcitool scan`) into typed
/// sightings. The format is line oriented: every line that carries a
/// `AA:BB:CC:DD:EE:FF` token, preceded only by non-hex characters, is a
/// device; anything after the address is its advertised name.
///
/// Parsing never fails. Malformed lines are skipped, so bad input only means
/// fewer sightings.
use core::fmt;

use heapless::Vec;

/// Maximum stored length of an advertised name, in bytes.
pub const MAX_NAME_LEN: usize = 64;

/// Maximum number of distinct devices taken from a single scan.
pub const MAX_SIGHTINGS: usize = 64;

/// Length of a formatted address ("aa:bb:cc:dd:ee:ff").
pub const MAC_STR_LEN: usize = 17;

/// Bounded device name
pub type NameString = heapless::String<MAX_NAME_LEN>;

/// Formatted device address
pub type MacString = heapless::String<MAC_STR_LEN>;

/// All sightings from one scan, at most one per device.
pub type Sightings = Vec<Sighting, MAX_SIGHTINGS>;

/// A transceiver address.
///
/// Parsing accepts either case; formatting is always lowercase so the same
/// radio maps to the same registry key no matter how the scanner prints it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId([u8; 6]);

impl DeviceId {
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Parse exactly one `AA:BB:CC:DD:EE:FF` token.
    pub fn parse(token: &str) -> Option<Self> {
        let bytes = token.as_bytes();
        if bytes.len() != MAC_STR_LEN {
            return None;
        }

        let mut octets = [0u8; 6];
        for (i, octet) in octets.iter_mut().enumerate() {
            let at = i * 3;
            if i < 5 && bytes[at + 2] != b':' {
                return None;
            }
            *octet = hex_val(bytes[at])? << 4 | hex_val(bytes[at + 1])?;
        }
        Some(Self(octets))
    }

    /// Registry key form of the address.
    pub fn to_key(&self) -> MacString {
        let mut key = MacString::new();
        let _ = fmt::write(&mut key, format_args!("{}", self));
        key
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            m[0], m[1], m[2], m[3], m[4], m[5]
        )
    }
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// One matched scan line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedLine<'a> {
    pub id: DeviceId,
    /// Advertised name, `None` when the line ends after the address.
    pub name: Option<&'a str>,
}

/// A device seen during one scan cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sighting {
    pub id: DeviceId,
    /// Advertised name, or the formatted address when none was advertised.
    pub name: NameString,
    /// Unix time (seconds) of the scan that produced this sighting.
    pub seen_at: u64,
}

impl Sighting {
    pub fn new(id: DeviceId, name: Option<&str>, seen_at: u64) -> Self {
        let name = match name {
            Some(n) if !n.is_empty() => truncate_str(n),
            _ => truncate_str(&id.to_key()),
        };
        Self { id, name, seen_at }
    }
}

/// Match a single line of scan output.
pub fn parse_line(line: &str) -> Option<ParsedLine<'_>> {
    // The address must be the first hex digit on the line
    let start = line.find(|c: char| c.is_ascii_hexdigit())?;
    let rest = &line[start..];
    let id = DeviceId::parse(rest.get(..MAC_STR_LEN)?)?;

    let name = rest[MAC_STR_LEN..].trim();
    Some(ParsedLine {
        id,
        name: if name.is_empty() { None } else { Some(name) },
    })
}

/// Parse a whole scan result.
///
/// A device listed twice keeps its last name. Devices beyond
/// [`MAX_SIGHTINGS`] are dropped with a warning.
pub fn parse_scan(raw: &str, seen_at: u64) -> Sightings {
    let mut sightings = Sightings::new();

    for line in raw.lines() {
        let Some(parsed) = parse_line(line) else {
            continue;
        };
        let sighting = Sighting::new(parsed.id, parsed.name, seen_at);

        if let Some(slot) = sightings.iter_mut().find(|s| s.id == parsed.id) {
            *slot = sighting;
        } else if sightings.push(sighting).is_err() {
            log::warn!("Scan result full, dropping {}", parsed.id);
        }
    }

    sightings
}

/// Copy as many whole characters of `s` as fit into a bounded string.
pub(crate) fn truncate_str<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
