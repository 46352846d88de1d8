// --- File: crates/dimple_scheduling/src/schedule.rs ---
//! Recurring weekly availability declared by a provider.
//!
//! A schedule is a list of per-weekday slot lists. Slots are clock-time
//! intervals at minute resolution; a slot can be declared but temporarily
//! closed (`open == false`). Invariants are checked when a schedule is
//! built, so the rest of the system can treat a `WeeklySchedule` as valid.

use chrono::{NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("slot start must be before slot end ({start} >= {end})")]
    InvalidSlot { start: NaiveTime, end: NaiveTime },
    #[error("slots overlap on {day}")]
    OverlappingSlots { day: Weekday },
    #[error("weekday {day} appears more than once")]
    DuplicateDay { day: Weekday },
}

/// A bounded clock-time interval during which a provider is bookable.
///
/// The interval is half-open: a slot `09:00–17:00` covers bookings that end
/// at 17:00 sharp but not ones that start there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AvailabilitySlot {
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "09:00:00"))]
    pub start: NaiveTime,
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "17:00:00"))]
    pub end: NaiveTime,
    #[serde(default = "default_open")]
    pub open: bool,
}

fn default_open() -> bool {
    true
}

impl AvailabilitySlot {
    pub fn start_minute(&self) -> u32 {
        self.start.num_seconds_from_midnight() / 60
    }

    pub fn end_minute(&self) -> u32 {
        self.end.num_seconds_from_midnight() / 60
    }
}

/// Slots declared for one weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DayAvailability {
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "Mon"))]
    pub day: Weekday,
    pub slots: Vec<AvailabilitySlot>,
}

/// A provider's full recurring week.
///
/// Weekdays with no entry (or an entry with zero slots) are closed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct WeeklySchedule {
    days: Vec<DayAvailability>,
}

impl WeeklySchedule {
    /// Builds a schedule, enforcing the slot invariants: every slot has
    /// `start < end`, a weekday appears at most once, and slots within one
    /// weekday do not overlap (touching boundaries are fine).
    pub fn new(days: Vec<DayAvailability>) -> Result<Self, ScheduleError> {
        for entry in &days {
            if days.iter().filter(|d| d.day == entry.day).count() > 1 {
                return Err(ScheduleError::DuplicateDay { day: entry.day });
            }
            for slot in &entry.slots {
                if slot.start >= slot.end {
                    return Err(ScheduleError::InvalidSlot {
                        start: slot.start,
                        end: slot.end,
                    });
                }
            }
            let mut sorted = entry.slots.clone();
            sorted.sort_by_key(|s| s.start);
            for pair in sorted.windows(2) {
                if pair[1].start < pair[0].end {
                    return Err(ScheduleError::OverlappingSlots { day: entry.day });
                }
            }
        }
        Ok(WeeklySchedule { days })
    }

    /// The declared slots for a weekday, if any.
    pub fn slots_for(&self, day: Weekday) -> Option<&[AvailabilitySlot]> {
        self.days
            .iter()
            .find(|d| d.day == day)
            .map(|d| d.slots.as_slice())
    }

    pub fn days(&self) -> &[DayAvailability] {
        &self.days
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn slot(start: NaiveTime, end: NaiveTime) -> AvailabilitySlot {
        AvailabilitySlot {
            start,
            end,
            open: true,
        }
    }

    #[test]
    fn rejects_inverted_slot() {
        let result = WeeklySchedule::new(vec![DayAvailability {
            day: Weekday::Mon,
            slots: vec![slot(t(17, 0), t(9, 0))],
        }]);
        assert!(matches!(result, Err(ScheduleError::InvalidSlot { .. })));
    }

    #[test]
    fn rejects_overlapping_slots_within_a_day() {
        let result = WeeklySchedule::new(vec![DayAvailability {
            day: Weekday::Mon,
            slots: vec![slot(t(9, 0), t(12, 0)), slot(t(11, 0), t(14, 0))],
        }]);
        assert_eq!(
            result,
            Err(ScheduleError::OverlappingSlots { day: Weekday::Mon })
        );
    }

    #[test]
    fn accepts_touching_slots() {
        let result = WeeklySchedule::new(vec![DayAvailability {
            day: Weekday::Mon,
            slots: vec![slot(t(9, 0), t(12, 0)), slot(t(12, 0), t(17, 0))],
        }]);
        assert!(result.is_ok());
    }

    #[test]
    fn rejects_duplicate_weekday_entries() {
        let result = WeeklySchedule::new(vec![
            DayAvailability {
                day: Weekday::Tue,
                slots: vec![slot(t(9, 0), t(12, 0))],
            },
            DayAvailability {
                day: Weekday::Tue,
                slots: vec![slot(t(13, 0), t(17, 0))],
            },
        ]);
        assert_eq!(
            result,
            Err(ScheduleError::DuplicateDay { day: Weekday::Tue })
        );
    }

    #[test]
    fn missing_weekday_has_no_slots() {
        let schedule = WeeklySchedule::new(vec![DayAvailability {
            day: Weekday::Mon,
            slots: vec![slot(t(9, 0), t(17, 0))],
        }])
        .unwrap();
        assert!(schedule.slots_for(Weekday::Sun).is_none());
        assert_eq!(schedule.slots_for(Weekday::Mon).unwrap().len(), 1);
    }
}
