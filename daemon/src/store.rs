//! Directory-backed device registry.
//!
//! One file per key, all in a single flat directory:
//! - `aa:bb:cc:dd:ee:ff` holds the device record as compact JSON
//! - `nameclash-<mac>-<unix time>` holds name conflict notes, one per line
//!
//! Record writes go to a temporary file that is synced, renamed over the old
//! one, and followed by a sync of the directory, so a power cut leaves either
//! the old or the new record, never half of one.
//! Records are also kept in memory, up to [`CACHE_CAPACITY`] entries with
//! the oldest evicted first; the daemon is the only writer.

use std::collections::{HashMap, VecDeque};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use btwatch::protocol::{decode_record, encode_record, MAX_RECORD_LEN};
use btwatch::registry::{ConflictNote, DeviceRecord, Registry};
use btwatch::scanner::DeviceId;

/// Prefix for conflict note keys
pub const CONFLICT_PREFIX: &str = "nameclash-";

/// Records kept in memory before the oldest is evicted
pub const CACHE_CAPACITY: usize = 1024;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("corrupt record for {key}")]
    Corrupt { key: String },
    #[error("record for {key} does not fit in {} bytes", MAX_RECORD_LEN)]
    Encode { key: String },
}

fn io_error(path: &Path, source: io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

pub struct DirStore {
    base: PathBuf,
    cache: RecordCache,
}

impl DirStore {
    /// Open (creating if needed) the store directory.
    pub fn open(base: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::with_cache_capacity(base, CACHE_CAPACITY)
    }

    /// Like [`DirStore::open`], keeping at most `capacity` records in memory.
    pub fn with_cache_capacity(
        base: impl Into<PathBuf>,
        capacity: usize,
    ) -> Result<Self, StoreError> {
        let base = base.into();
        fs::create_dir_all(&base).map_err(|e| io_error(&base, e))?;
        Ok(Self {
            base,
            cache: RecordCache::new(capacity),
        })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base.join(key)
    }

    fn write_atomic(&self, key: &str, data: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let tmp = self.base.join(format!(".{key}.tmp"));

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp)
            .map_err(|e| io_error(&tmp, e))?;
        file.write_all(data).map_err(|e| io_error(&tmp, e))?;
        file.sync_all().map_err(|e| io_error(&tmp, e))?;
        drop(file);

        fs::rename(&tmp, &path).map_err(|e| io_error(&path, e))?;

        // Persist the rename itself. Some filesystems refuse to sync a
        // directory; the record file is already on disk by then.
        if let Err(e) = File::open(&self.base).and_then(|dir| dir.sync_all()) {
            log::warn!("Directory sync failed for {}: {}", self.base.display(), e);
        }
        Ok(())
    }
}

/// Bounded record cache, evicting the oldest inserted entry when full.
struct RecordCache {
    records: HashMap<DeviceId, DeviceRecord>,
    order: VecDeque<DeviceId>,
    capacity: usize,
}

impl RecordCache {
    fn new(capacity: usize) -> Self {
        Self {
            records: HashMap::new(),
            order: VecDeque::new(),
            capacity,
        }
    }

    fn get(&self, id: &DeviceId) -> Option<&DeviceRecord> {
        self.records.get(id)
    }

    fn insert(&mut self, id: DeviceId, record: DeviceRecord) {
        if self.capacity == 0 {
            return;
        }
        if self.records.insert(id, record).is_none() {
            self.order.push_back(id);
            while self.order.len() > self.capacity {
                if let Some(old) = self.order.pop_front() {
                    self.records.remove(&old);
                }
            }
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.records.len()
    }
}

impl Registry for DirStore {
    type Error = StoreError;

    fn read(&mut self, id: &DeviceId) -> Result<Option<DeviceRecord>, StoreError> {
        if let Some(record) = self.cache.get(id) {
            return Ok(Some(record.clone()));
        }

        let key = id.to_key();
        let path = self.path_for(&key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(&path, e)),
        };

        let record = decode_record(&bytes).ok_or_else(|| StoreError::Corrupt {
            key: key.to_string(),
        })?;
        self.cache.insert(*id, record.clone());
        Ok(Some(record))
    }

    fn write(&mut self, id: &DeviceId, record: &DeviceRecord) -> Result<(), StoreError> {
        let key = id.to_key();
        let mut buf = [0u8; MAX_RECORD_LEN];
        let len = encode_record(record, &mut buf).ok_or_else(|| StoreError::Encode {
            key: key.to_string(),
        })?;

        self.write_atomic(&key, &buf[..len])?;
        self.cache.insert(*id, record.clone());
        Ok(())
    }

    fn record_conflict(&mut self, note: &ConflictNote<'_>, now: u64) -> Result<(), StoreError> {
        let path = self.path_for(&format!("{CONFLICT_PREFIX}{}-{now}", note.id));
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| io_error(&path, e))?;
        writeln!(file, "{note}").map_err(|e| io_error(&path, e))
    }
}
