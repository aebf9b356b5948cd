//! Autosave slot allocation.
//!
//! The ring of autosave slots never grows past its capacity: a new autosave
//! fills the lowest empty slot, or evicts the least recently modified one.

use std::time::SystemTime;

/// Metadata for an autosave slot that currently exists on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotState {
    /// 1-based slot index.
    pub index: u32,
    pub mtime: SystemTime,
}

/// Choose the slot index to (re)write next.
///
/// Returns the lowest index in `1..=capacity` without an existing slot. When
/// every slot exists, returns the one with the oldest `mtime`, preferring the
/// lowest index among ties. Entries outside `1..=capacity` are ignored.
///
/// `capacity` must be at least 1.
pub fn acquire(existing: &[SlotState], capacity: u32) -> u32 {
    let in_range = |slot: &&SlotState| (1..=capacity).contains(&slot.index);

    if let Some(free) =
        (1..=capacity).find(|index| !existing.iter().any(|slot| slot.index == *index))
    {
        return free;
    }

    existing
        .iter()
        .filter(in_range)
        .min_by(|a, b| a.mtime.cmp(&b.mtime).then(a.index.cmp(&b.index)))
        .map_or(1, |slot| slot.index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn at(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn slot(index: u32, secs: u64) -> SlotState {
        SlotState {
            index,
            mtime: at(secs),
        }
    }

    #[test]
    fn empty_ring_starts_at_first_slot() {
        assert_eq!(acquire(&[], 10), 1);
    }

    #[test]
    fn picks_lowest_missing_slot() {
        let existing = vec![slot(1, 5), slot(2, 1), slot(4, 3)];
        assert_eq!(acquire(&existing, 10), 3);
    }

    #[test]
    fn picks_lowest_missing_even_when_unordered() {
        let existing = vec![slot(3, 5), slot(1, 1)];
        assert_eq!(acquire(&existing, 10), 2);
    }

    #[test]
    fn full_ring_evicts_oldest() {
        let existing: Vec<SlotState> = (1..=10).map(|i| slot(i, 100 - u64::from(i))).collect();
        assert_eq!(acquire(&existing, 10), 10);
    }

    #[test]
    fn full_ring_breaks_ties_by_lowest_index() {
        let mut existing: Vec<SlotState> = (1..=10).map(|i| slot(i, 50)).collect();
        existing[6].mtime = at(10);
        existing[3].mtime = at(10);
        assert_eq!(acquire(&existing, 10), 4);

        let all_equal: Vec<SlotState> = (1..=10).rev().map(|i| slot(i, 7)).collect();
        assert_eq!(acquire(&all_equal, 10), 1);
    }

    #[test]
    fn out_of_range_entries_do_not_fill_the_ring() {
        let mut existing: Vec<SlotState> = (1..=9).map(|i| slot(i, 50)).collect();
        existing.push(slot(11, 1));
        assert_eq!(acquire(&existing, 10), 10);
    }

    #[test]
    fn result_is_always_in_range() {
        for capacity in 1..=6u32 {
            for filled in 0..=capacity {
                let existing: Vec<SlotState> = (1..=filled)
                    .map(|i| slot(i, u64::from((i * 7) % 5)))
                    .collect();
                let chosen = acquire(&existing, capacity);
                assert!(
                    (1..=capacity).contains(&chosen),
                    "capacity={capacity} filled={filled} chosen={chosen}"
                );
            }
        }
    }
}
