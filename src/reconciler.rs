/// Observation policy: decides what a sighting means given what the registry
/// already knows.
///
/// - unknown device: store it with `count = 1`, show "new device: <name>"
/// - known device seen inside the debounce window: ignore it completely
/// - known device seen after the window: bump the count, show
///   "<count>x known device: <name>", and note a name conflict if the
///   advertised name changed
///
/// The record is persisted before the display line is pushed, so the screen
/// never shows an event the registry does not know about.
use crate::defaults::DEBOUNCE_SECS;
use crate::display::DisplayBuffer;
use crate::registry::{ConflictNote, DeviceRecord, Registry};
use crate::scanner::Sighting;

/// Tunable policy values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    /// Minimum seconds between two notable sightings of one device
    pub debounce_secs: u64,
}

impl Policy {
    pub const fn new() -> Self {
        Self {
            debounce_secs: DEBOUNCE_SECS,
        }
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self::new()
    }
}

/// What happened to a single sighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// First sighting, stored with count 1
    New,
    /// Re-observation after the debounce window, stored with the new count
    Known { count: u32, conflict: bool },
    /// Inside the debounce window, nothing changed
    Ignored,
    /// The registry step could not complete, nothing shown
    Failed,
}

impl Outcome {
    /// Whether the event deserves the display and the light.
    pub fn is_notable(&self) -> bool {
        matches!(self, Outcome::New | Outcome::Known { .. })
    }
}

/// Apply the policy to one sighting.
pub fn reconcile<R: Registry>(
    sighting: &Sighting,
    policy: &Policy,
    registry: &mut R,
    display: &mut DisplayBuffer,
) -> Outcome {
    let id = &sighting.id;
    let now = sighting.seen_at;

    let known = match registry.read(id) {
        Ok(known) => known,
        Err(e) => {
            log::error!("Registry read failed for {}: {}", id, e);
            return Outcome::Failed;
        }
    };

    let Some(known) = known else {
        let record = DeviceRecord::first_sighting(sighting.name.clone(), now);
        if let Err(e) = registry.write(id, &record) {
            log::error!("Failed to persist new device {}: {}", id, e);
            return Outcome::Failed;
        }
        log::info!("New device {}: {}", sighting.name, id);
        display.push_fmt(format_args!("new device: {}", sighting.name));
        return Outcome::New;
    };

    let elapsed = known.elapsed(now);
    if elapsed < policy.debounce_secs {
        log::debug!("{} seen {}s ago, ignoring", id, elapsed);
        return Outcome::Ignored;
    }

    let Some(record) = known.bumped(sighting.name.clone(), now) else {
        log::error!("Sighting count for {} cannot grow past {}", id, known.count);
        return Outcome::Failed;
    };

    let conflict = known.name != sighting.name;
    if conflict {
        log::warn!(
            "Same MAC but different name: {} (new) vs. {} (known)",
            sighting.name,
            known.name
        );
        let note = ConflictNote {
            id: *id,
            observed: &sighting.name,
            known: &known.name,
        };
        if let Err(e) = registry.record_conflict(&note, now) {
            log::error!("Failed to record name conflict for {}: {}", id, e);
        }
    }

    if let Err(e) = registry.write(id, &record) {
        log::error!("Failed to persist known device {}: {}", id, e);
        return Outcome::Failed;
    }

    log::info!("{}x Known device {}: {}", record.count, record.name, id);
    display.push_fmt(format_args!("{}x known device: {}", record.count, record.name));

    Outcome::Known {
        count: record.count,
        conflict,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::mem::MemRegistry;
    use crate::scanner::{DeviceId, NameString};

    const MAC: DeviceId = DeviceId::new([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
    const HOUR: u64 = 3600;
    const NOW: u64 = 1_700_000_000;

    fn name(s: &str) -> NameString {
        NameString::try_from(s).unwrap()
    }

    fn sighting(n: &str) -> Sighting {
        Sighting::new(MAC, Some(n), NOW)
    }

    fn stored(n: &str, count: u32, last_seen: u64) -> MemRegistry {
        MemRegistry::with(
            MAC,
            DeviceRecord {
                name: name(n),
                count,
                last_seen,
            },
        )
    }

    // ── New devices ─────────────────────────────────────────────────

    #[test]
    fn unknown_device_is_new() {
        let mut reg = MemRegistry::default();
        let mut display = DisplayBuffer::new();

        let outcome = reconcile(&sighting("Pixel 7"), &Policy::new(), &mut reg, &mut display);

        assert_eq!(outcome, Outcome::New);
        assert!(outcome.is_notable());
        let rec = &reg.records[&MAC];
        assert_eq!(rec.count, 1);
        assert_eq!(rec.last_seen, NOW);
        assert_eq!(rec.name.as_str(), "Pixel 7");
        assert_eq!(display.front(), Some("new device: Pixel 7"));
    }

    #[test]
    fn nameless_device_uses_identifier() {
        let mut reg = MemRegistry::default();
        let mut display = DisplayBuffer::new();

        let s = Sighting::new(MAC, None, NOW);
        reconcile(&s, &Policy::new(), &mut reg, &mut display);

        assert_eq!(reg.records[&MAC].name.as_str(), "aa:bb:cc:dd:ee:ff");
        assert_eq!(display.front(), Some("new device: aa:bb:cc:dd:ee:ff"));
    }

    #[test]
    fn new_device_write_failure_shows_nothing() {
        let mut reg = MemRegistry {
            fail_writes: true,
            ..Default::default()
        };
        let mut display = DisplayBuffer::new();

        let outcome = reconcile(&sighting("Pixel"), &Policy::new(), &mut reg, &mut display);

        assert_eq!(outcome, Outcome::Failed);
        assert!(!outcome.is_notable());
        assert!(display.is_empty());
    }

    #[test]
    fn read_failure_is_not_treated_as_new() {
        let mut reg = MemRegistry {
            fail_reads: true,
            ..Default::default()
        };
        let mut display = DisplayBuffer::new();

        let outcome = reconcile(&sighting("Pixel"), &Policy::new(), &mut reg, &mut display);

        assert_eq!(outcome, Outcome::Failed);
        assert_eq!(reg.writes, 0);
        assert!(display.is_empty());
    }

    // ── Debounce ────────────────────────────────────────────────────

    #[test]
    fn sighting_inside_window_is_ignored() {
        let mut reg = stored("Pixel 7", 3, NOW - HOUR);
        let mut display = DisplayBuffer::new();

        let outcome = reconcile(&sighting("Pixel 7"), &Policy::new(), &mut reg, &mut display);

        assert_eq!(outcome, Outcome::Ignored);
        assert!(!outcome.is_notable());
        let rec = &reg.records[&MAC];
        assert_eq!(rec.count, 3);
        assert_eq!(rec.last_seen, NOW - HOUR);
        assert_eq!(reg.writes, 0);
        assert!(display.is_empty());
    }

    #[test]
    fn renamed_device_inside_window_is_still_ignored() {
        let mut reg = stored("Alice", 1, NOW - HOUR);
        let mut display = DisplayBuffer::new();

        let outcome = reconcile(&sighting("Bob"), &Policy::new(), &mut reg, &mut display);

        assert_eq!(outcome, Outcome::Ignored);
        assert!(reg.conflicts.is_empty());
        assert_eq!(reg.records[&MAC].name.as_str(), "Alice");
    }

    #[test]
    fn clock_going_backwards_is_ignored() {
        let mut reg = stored("Pixel", 2, NOW + HOUR);
        let mut display = DisplayBuffer::new();

        let outcome = reconcile(&sighting("Pixel"), &Policy::new(), &mut reg, &mut display);
        assert_eq!(outcome, Outcome::Ignored);
    }

    #[test]
    fn window_boundary_counts_as_reobservation() {
        let mut reg = stored("Pixel", 1, NOW - DEBOUNCE_SECS);
        let mut display = DisplayBuffer::new();

        let outcome = reconcile(&sighting("Pixel"), &Policy::new(), &mut reg, &mut display);
        assert_eq!(
            outcome,
            Outcome::Known {
                count: 2,
                conflict: false
            }
        );
    }

    #[test]
    fn custom_window_is_honoured() {
        let mut reg = stored("Pixel", 1, NOW - 120);
        let mut display = DisplayBuffer::new();
        let policy = Policy { debounce_secs: 60 };

        let outcome = reconcile(&sighting("Pixel"), &policy, &mut reg, &mut display);
        assert!(outcome.is_notable());
    }

    // ── Re-observation ──────────────────────────────────────────────

    #[test]
    fn sighting_after_window_bumps_count() {
        let mut reg = stored("Pixel 7", 3, NOW - 6 * HOUR);
        let mut display = DisplayBuffer::new();

        let outcome = reconcile(&sighting("Pixel 7"), &Policy::new(), &mut reg, &mut display);

        assert_eq!(
            outcome,
            Outcome::Known {
                count: 4,
                conflict: false
            }
        );
        let rec = &reg.records[&MAC];
        assert_eq!(rec.count, 4);
        assert_eq!(rec.last_seen, NOW);
        assert!(reg.conflicts.is_empty());
        assert_eq!(display.front(), Some("4x known device: Pixel 7"));
    }

    #[test]
    fn known_device_write_failure_shows_nothing() {
        let mut reg = stored("Pixel", 3, NOW - 6 * HOUR);
        reg.fail_writes = true;
        let mut display = DisplayBuffer::new();

        let outcome = reconcile(&sighting("Pixel"), &Policy::new(), &mut reg, &mut display);

        assert_eq!(outcome, Outcome::Failed);
        assert_eq!(reg.records[&MAC].count, 3);
        assert!(display.is_empty());
    }

    #[test]
    fn saturated_count_is_a_failed_step() {
        let mut reg = stored("Pixel", u32::MAX, NOW - 6 * HOUR);
        let mut display = DisplayBuffer::new();

        let outcome = reconcile(&sighting("Pixel"), &Policy::new(), &mut reg, &mut display);

        assert_eq!(outcome, Outcome::Failed);
        assert_eq!(reg.writes, 0);
        assert_eq!(reg.records[&MAC].last_seen, NOW - 6 * HOUR);
        assert!(display.is_empty());
    }

    // ── Conflicts ───────────────────────────────────────────────────

    #[test]
    fn name_change_records_conflict_and_takes_new_name() {
        let mut reg = stored("Alice", 1, NOW - 5 * HOUR);
        let mut display = DisplayBuffer::new();

        let outcome = reconcile(&sighting("Bob"), &Policy::new(), &mut reg, &mut display);

        assert_eq!(
            outcome,
            Outcome::Known {
                count: 2,
                conflict: true
            }
        );
        assert_eq!(reg.conflicts.len(), 1);
        let (at, note) = &reg.conflicts[0];
        assert_eq!(*at, NOW);
        assert!(note.contains("Alice"));
        assert!(note.contains("Bob"));
        assert!(note.contains("aa:bb:cc:dd:ee:ff"));
        assert_eq!(reg.records[&MAC].name.as_str(), "Bob");
        assert_eq!(display.front(), Some("2x known device: Bob"));
    }

    #[test]
    fn conflict_note_failure_still_reports_known() {
        let mut reg = stored("Alice", 1, NOW - 6 * HOUR);
        reg.fail_conflicts = true;
        let mut display = DisplayBuffer::new();

        let outcome = reconcile(&sighting("Bob"), &Policy::new(), &mut reg, &mut display);

        assert_eq!(
            outcome,
            Outcome::Known {
                count: 2,
                conflict: true
            }
        );
        assert!(reg.conflicts.is_empty());
        let rec = &reg.records[&MAC];
        assert_eq!(rec.count, 2);
        assert_eq!(rec.last_seen, NOW);
        assert_eq!(rec.name.as_str(), "Bob");
        assert_eq!(display.front(), Some("2x known device: Bob"));
    }

    #[test]
    fn same_name_on_two_addresses_are_independent() {
        let other = DeviceId::new([0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);
        let mut reg = stored("Phone", 5, NOW - HOUR);
        let mut display = DisplayBuffer::new();

        let outcome = reconcile(
            &Sighting::new(other, Some("Phone"), NOW),
            &Policy::new(),
            &mut reg,
            &mut display,
        );

        assert_eq!(outcome, Outcome::New);
        assert_eq!(reg.records[&other].count, 1);
        assert_eq!(reg.records[&MAC].count, 5);
    }
}
