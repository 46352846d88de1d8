#[cfg(test)]
mod tests {
    use crate::logic::{has_conflict, is_within_availability, windows_overlap, BookingWindow};
    use crate::schedule::{AvailabilitySlot, DayAvailability, WeeklySchedule};
    use chrono::{Datelike, NaiveDate, NaiveTime};
    use proptest::prelude::*;

    // Helper to build a window directly from minute offsets
    fn window_from_minutes(date: NaiveDate, start_minute: u32, duration: u32) -> BookingWindow {
        let start = NaiveTime::from_num_seconds_from_midnight_opt(start_minute * 60, 0).unwrap();
        BookingWindow::new(date, start, duration).unwrap()
    }

    // Helper to build a one-slot schedule for the weekday of `date`
    fn single_slot_schedule(date: NaiveDate, slot_start: u32, slot_end: u32) -> WeeklySchedule {
        WeeklySchedule::new(vec![DayAvailability {
            day: date.weekday(),
            slots: vec![AvailabilitySlot {
                start: NaiveTime::from_num_seconds_from_midnight_opt(slot_start * 60, 0).unwrap(),
                end: NaiveTime::from_num_seconds_from_midnight_opt(slot_end * 60, 0).unwrap(),
                open: true,
            }],
        }])
        .unwrap()
    }

    fn arb_date() -> impl Strategy<Value = NaiveDate> {
        (0i64..365).prop_map(|offset| {
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + chrono::Duration::days(offset)
        })
    }

    proptest! {
        // Overlap is symmetric and matches the arithmetic definition
        #[test]
        fn overlap_is_symmetric(
            s1 in 0u32..1380, d1 in 1u32..240,
            s2 in 0u32..1380, d2 in 1u32..240,
        ) {
            let (e1, e2) = ((s1 + d1).min(1440), (s2 + d2).min(1440));
            prop_assert_eq!(
                windows_overlap(s1, e1, s2, e2),
                windows_overlap(s2, e2, s1, e1)
            );
        }

        // A window fully inside a single open slot is always accepted
        #[test]
        fn window_inside_open_slot_is_accepted(
            date in arb_date(),
            slot_start in 0u32..600,
            slot_len in 60u32..720,
            offset in 0u32..600,
            duration in 1u32..240,
        ) {
            let slot_end = (slot_start + slot_len).min(1439);
            let start = slot_start + (offset % slot_len.min(slot_end - slot_start));
            prop_assume!(start + duration <= slot_end);

            let schedule = single_slot_schedule(date, slot_start, slot_end);
            let window = window_from_minutes(date, start, duration);
            prop_assert!(is_within_availability(&schedule, &window));
        }

        // A window that pokes outside the slot on either side is rejected
        #[test]
        fn window_outside_slot_is_rejected(
            date in arb_date(),
            slot_start in 60u32..600,
            slot_len in 60u32..600,
            duration in 1u32..240,
        ) {
            let slot_end = (slot_start + slot_len).min(1439);
            let schedule = single_slot_schedule(date, slot_start, slot_end);

            // Starts one minute before the slot opens
            let before = window_from_minutes(date, slot_start - 1, duration);
            prop_assert!(!is_within_availability(&schedule, &before));

            // Ends one minute after the slot closes
            prop_assume!(slot_end + 1 >= duration && slot_end + 1 - duration < 1440);
            let after = window_from_minutes(date, slot_end + 1 - duration, duration);
            prop_assert!(!is_within_availability(&schedule, &after));
        }

        // Back-to-back windows never conflict, overlapping ones always do
        #[test]
        fn conflict_matches_overlap_definition(
            date in arb_date(),
            start in 0u32..1200,
            duration in 1u32..120,
            gap in 0u32..60,
        ) {
            let first = window_from_minutes(date, start, duration);

            // Adjacent (or later) window: no conflict
            let adjacent_start = start + duration + gap;
            prop_assume!(adjacent_start + duration <= 1440);
            let adjacent = window_from_minutes(date, adjacent_start, duration);
            prop_assert!(!has_conflict(&adjacent, std::slice::from_ref(&first)));

            // Window shifted inside the first one: conflict
            let inside = window_from_minutes(date, start + (duration - 1).min(duration / 2), duration);
            prop_assert!(has_conflict(&inside, std::slice::from_ref(&first)));
        }
    }
}
