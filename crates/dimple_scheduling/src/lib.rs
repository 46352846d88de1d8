// --- File: crates/dimple_scheduling/src/lib.rs ---
//! Availability schedules and slot conflict logic for Dimple.
//!
//! This crate is pure domain logic: given a provider's recurring weekly
//! schedule and the windows of existing bookings, it answers whether a
//! requested window is inside declared open hours and whether it collides
//! with an active booking. No I/O happens here.

pub mod logic;
#[cfg(test)]
mod logic_proptest;
pub mod schedule;

pub use logic::{
    has_conflict, is_within_availability, windows_overlap, BookingWindow, WindowError,
    MINUTES_PER_DAY,
};
pub use schedule::{AvailabilitySlot, DayAvailability, ScheduleError, WeeklySchedule};
