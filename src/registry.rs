/// Device registry: the durable memory of every device worth reporting.
///
/// The library only defines the record type and the storage contract;
/// platform binaries provide the backing store (a directory of small JSON
/// files on Linux).
use core::fmt;

use serde::{Deserialize, Serialize};

use crate::scanner::{DeviceId, NameString};

/// Last known state of a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Advertised name at the last notable sighting
    pub name: NameString,
    /// Number of notable sightings, starting at 1
    pub count: u32,
    /// Unix time (seconds) of the last notable sighting
    pub last_seen: u64,
}

impl DeviceRecord {
    /// Record for a device seen for the first time.
    pub fn first_sighting(name: NameString, now: u64) -> Self {
        Self {
            name,
            count: 1,
            last_seen: now,
        }
    }

    /// Seconds since the last notable sighting. A clock that went backwards
    /// counts as no time at all.
    pub fn elapsed(&self, now: u64) -> u64 {
        now.saturating_sub(self.last_seen)
    }

    /// The record after another notable sighting under `name`, or `None`
    /// once the count can no longer grow.
    pub fn bumped(&self, name: NameString, now: u64) -> Option<Self> {
        Some(Self {
            name,
            count: self.count.checked_add(1)?,
            last_seen: now,
        })
    }
}

/// Same address, different name. Stored for the operator, never acted on.
#[derive(Debug, Clone, Copy)]
pub struct ConflictNote<'a> {
    pub id: DeviceId,
    pub observed: &'a str,
    pub known: &'a str,
}

impl fmt::Display for ConflictNote<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {} (new) vs. {} (known)",
            self.id, self.observed, self.known
        )
    }
}

/// Storage contract for device records.
///
/// Single writer: the reconciler reads then writes one key at a time, so an
/// implementation only needs atomic writes per key.
pub trait Registry {
    type Error: fmt::Display;

    /// Last stored record, `None` if the device was never recorded.
    fn read(&mut self, id: &DeviceId) -> Result<Option<DeviceRecord>, Self::Error>;

    /// Replace the stored record.
    fn write(&mut self, id: &DeviceId, record: &DeviceRecord) -> Result<(), Self::Error>;

    /// Append a conflict note under its own key. `now` keeps notes for the
    /// same device from overwriting each other.
    fn record_conflict(&mut self, note: &ConflictNote<'_>, now: u64) -> Result<(), Self::Error>;

    fn exists(&mut self, id: &DeviceId) -> Result<bool, Self::Error> {
        self.read(id).map(|record| record.is_some())
    }
}

/// In-memory registry for unit tests.
#[cfg(test)]
pub(crate) mod mem {
    use std::collections::HashMap;
    use std::string::{String, ToString};
    use std::vec::Vec;

    use super::*;

    #[derive(Default)]
    pub struct MemRegistry {
        pub records: HashMap<DeviceId, DeviceRecord>,
        pub conflicts: Vec<(u64, String)>,
        pub fail_writes: bool,
        pub fail_reads: bool,
        pub fail_conflicts: bool,
        pub writes: usize,
    }

    impl MemRegistry {
        pub fn with(id: DeviceId, record: DeviceRecord) -> Self {
            let mut reg = Self::default();
            reg.records.insert(id, record);
            reg
        }
    }

    impl Registry for MemRegistry {
        type Error = &'static str;

        fn read(&mut self, id: &DeviceId) -> Result<Option<DeviceRecord>, Self::Error> {
            if self.fail_reads {
                return Err("corrupt record");
            }
            Ok(self.records.get(id).cloned())
        }

        fn write(&mut self, id: &DeviceId, record: &DeviceRecord) -> Result<(), Self::Error> {
            if self.fail_writes {
                return Err("disk full");
            }
            self.writes += 1;
            self.records.insert(*id, record.clone());
            Ok(())
        }

        fn record_conflict(&mut self, note: &ConflictNote<'_>, now: u64) -> Result<(), Self::Error> {
            if self.fail_conflicts {
                return Err("read-only filesystem");
            }
            self.conflicts.push((now, note.to_string()));
            Ok(())
        }
    }
}
