// --- File: crates/dimple_scheduling/src/logic.rs ---
//! Availability evaluation and booking conflict detection.
//!
//! All windows here are half-open minute intervals `[start, end)` on a
//! single calendar date, so two back-to-back bookings never conflict and a
//! window ending exactly at a slot boundary still fits the slot.

use crate::schedule::WeeklySchedule;
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MINUTES_PER_DAY: u32 = 24 * 60;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum WindowError {
    #[error("duration must be positive")]
    ZeroDuration,
    #[error("window may not cross midnight (start {start_minute}m + {duration_minutes}m)")]
    CrossesMidnight {
        start_minute: u32,
        duration_minutes: u32,
    },
}

/// A requested or booked service window on one calendar date.
///
/// Stored as minutes from midnight so that `end_minute == 1440` (a window
/// running right up to midnight) stays representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BookingWindow {
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "2025-06-02"))]
    pub date: NaiveDate,
    pub start_minute: u32,
    pub end_minute: u32,
}

impl BookingWindow {
    /// Builds a window from a start clock time and a duration in minutes.
    ///
    /// Fails when the duration is zero or the window would spill past
    /// midnight; bounds on the duration itself (e.g. 30–240 minutes) are a
    /// business rule checked by the booking layer, not here.
    pub fn new(
        date: NaiveDate,
        start_time: NaiveTime,
        duration_minutes: u32,
    ) -> Result<Self, WindowError> {
        if duration_minutes == 0 {
            return Err(WindowError::ZeroDuration);
        }
        let start_minute = start_time.num_seconds_from_midnight() / 60;
        let end_minute = start_minute + duration_minutes;
        if end_minute > MINUTES_PER_DAY {
            return Err(WindowError::CrossesMidnight {
                start_minute,
                duration_minutes,
            });
        }
        Ok(BookingWindow {
            date,
            start_minute,
            end_minute,
        })
    }

    pub fn duration_minutes(&self) -> u32 {
        self.end_minute - self.start_minute
    }

    pub fn start_time(&self) -> NaiveTime {
        NaiveTime::from_num_seconds_from_midnight_opt(self.start_minute * 60, 0)
            .expect("start_minute is always < 1440")
    }

    /// End clock time; a window ending at midnight reads as `00:00`.
    pub fn end_time(&self) -> NaiveTime {
        NaiveTime::from_num_seconds_from_midnight_opt((self.end_minute % MINUTES_PER_DAY) * 60, 0)
            .expect("end_minute modulo day length is always < 1440")
    }
}

/// Half-open interval overlap: `[s1,e1)` and `[s2,e2)` overlap iff
/// `s1 < e2 && s2 < e1`.
///
/// This single comparison covers every containment/straddle arrangement;
/// callers must not re-derive the sub-cases separately.
pub fn windows_overlap(s1: u32, e1: u32, s2: u32, e2: u32) -> bool {
    s1 < e2 && s2 < e1
}

/// Whether a candidate window lies entirely inside one open slot of the
/// provider's recurring week.
///
/// The weekday comes from `window.date`. A weekday with no entry, or no
/// slots, is closed. A window spanning two adjacent open slots is not
/// accepted; it must fit a single slot. Boundary-touching is fine on both
/// ends (`slot.start <= start` and `end <= slot.end`).
pub fn is_within_availability(schedule: &WeeklySchedule, window: &BookingWindow) -> bool {
    let Some(slots) = schedule.slots_for(window.date.weekday()) else {
        return false;
    };
    slots.iter().any(|slot| {
        slot.open
            && slot.start_minute() <= window.start_minute
            && window.end_minute <= slot.end_minute()
    })
}

/// Whether a candidate window overlaps any of the given windows.
///
/// `existing` must already be scoped to the same provider and restricted to
/// blocking bookings (confirmed or in progress); windows on other dates are
/// skipped defensively.
pub fn has_conflict(candidate: &BookingWindow, existing: &[BookingWindow]) -> bool {
    existing.iter().any(|other| {
        other.date == candidate.date
            && windows_overlap(
                candidate.start_minute,
                candidate.end_minute,
                other.start_minute,
                other.end_minute,
            )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{AvailabilitySlot, DayAvailability};
    use chrono::Weekday;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    // 2025-06-02 is a Monday.
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    fn monday_nine_to_five() -> WeeklySchedule {
        WeeklySchedule::new(vec![DayAvailability {
            day: Weekday::Mon,
            slots: vec![AvailabilitySlot {
                start: t(9, 0),
                end: t(17, 0),
                open: true,
            }],
        }])
        .unwrap()
    }

    fn window(date: NaiveDate, h: u32, m: u32, duration: u32) -> BookingWindow {
        BookingWindow::new(date, t(h, m), duration).unwrap()
    }

    #[test]
    fn window_inside_open_slot_is_accepted() {
        let schedule = monday_nine_to_five();
        assert!(is_within_availability(&schedule, &window(monday(), 10, 0, 60)));
    }

    #[test]
    fn window_touching_both_slot_boundaries_is_accepted() {
        let schedule = monday_nine_to_five();
        // Starts exactly at slot start and ends exactly at slot end.
        assert!(is_within_availability(
            &schedule,
            &window(monday(), 9, 0, 8 * 60)
        ));
    }

    #[test]
    fn window_past_slot_end_is_rejected() {
        let schedule = monday_nine_to_five();
        assert!(!is_within_availability(
            &schedule,
            &window(monday(), 16, 30, 60)
        ));
    }

    #[test]
    fn closed_weekday_is_rejected() {
        let schedule = monday_nine_to_five();
        let tuesday = NaiveDate::from_ymd_opt(2025, 6, 3).unwrap();
        assert!(!is_within_availability(&schedule, &window(tuesday, 10, 0, 60)));
    }

    #[test]
    fn closed_slot_is_rejected() {
        let schedule = WeeklySchedule::new(vec![DayAvailability {
            day: Weekday::Mon,
            slots: vec![AvailabilitySlot {
                start: t(9, 0),
                end: t(17, 0),
                open: false,
            }],
        }])
        .unwrap();
        assert!(!is_within_availability(&schedule, &window(monday(), 10, 0, 60)));
    }

    #[test]
    fn window_spanning_two_adjacent_open_slots_is_rejected() {
        let schedule = WeeklySchedule::new(vec![DayAvailability {
            day: Weekday::Mon,
            slots: vec![
                AvailabilitySlot {
                    start: t(9, 0),
                    end: t(12, 0),
                    open: true,
                },
                AvailabilitySlot {
                    start: t(12, 0),
                    end: t(17, 0),
                    open: true,
                },
            ],
        }])
        .unwrap();
        // 11:30–12:30 touches both slots but fits neither.
        assert!(!is_within_availability(
            &schedule,
            &window(monday(), 11, 30, 60)
        ));
    }

    #[test]
    fn overlapping_windows_conflict() {
        let existing = vec![window(monday(), 10, 0, 60)];
        assert!(has_conflict(&window(monday(), 10, 30, 60), &existing));
        assert!(has_conflict(&window(monday(), 9, 30, 60), &existing));
        // New window fully contains the existing one.
        assert!(has_conflict(&window(monday(), 9, 0, 180), &existing));
        // Existing window fully contains the new one.
        assert!(has_conflict(&window(monday(), 10, 15, 30), &existing));
    }

    #[test]
    fn back_to_back_windows_do_not_conflict() {
        let existing = vec![window(monday(), 9, 0, 60)];
        assert!(!has_conflict(&window(monday(), 10, 0, 60), &existing));
        assert!(!has_conflict(&window(monday(), 8, 0, 60), &existing));
    }

    #[test]
    fn windows_on_other_dates_never_conflict() {
        let tuesday = NaiveDate::from_ymd_opt(2025, 6, 3).unwrap();
        let existing = vec![window(tuesday, 10, 0, 60)];
        assert!(!has_conflict(&window(monday(), 10, 0, 60), &existing));
    }

    #[test]
    fn window_may_not_cross_midnight() {
        let result = BookingWindow::new(monday(), t(23, 30), 60);
        assert!(matches!(result, Err(WindowError::CrossesMidnight { .. })));
        // Ending exactly at midnight is still within the date.
        assert!(BookingWindow::new(monday(), t(23, 0), 60).is_ok());
    }

    #[test]
    fn zero_duration_is_rejected() {
        assert_eq!(
            BookingWindow::new(monday(), t(10, 0), 0),
            Err(WindowError::ZeroDuration)
        );
    }
}
