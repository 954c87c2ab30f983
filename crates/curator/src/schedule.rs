//! Wall-clock scheduling helpers.
//!
//! Pure functions of an explicit `now` so the wrap-around arithmetic is
//! testable without waiting for 3 AM.

use chrono::{Datelike, Local, NaiveDateTime, NaiveTime, Timelike};
use std::time::Duration;

/// Time to sleep from `now` until the next occurrence of `target`.
///
/// If `target` has already passed today, the result wraps to tomorrow. At
/// exactly `target` the delay is zero.
pub fn delay_until(target: NaiveTime, now: NaiveDateTime) -> Duration {
    let target_today = now.date().and_time(target);
    let mut delta = target_today - now;
    if delta < chrono::Duration::zero() {
        delta += chrono::Duration::hours(24);
    }
    delta.to_std().unwrap_or(Duration::ZERO)
}

/// [`delay_until`] against the local clock.
pub fn delay_until_local(target: NaiveTime) -> Duration {
    delay_until(target, Local::now().naive_local())
}

/// Whether the monthly re-assertion sweep is due at `now`.
///
/// Due for the whole configured hour of the configured day; the sweep itself
/// is idempotent, so firing more than once in that hour is harmless.
pub fn resweep_due(day_of_month: u32, hour: u32, now: NaiveDateTime) -> bool {
    now.day() == day_of_month && now.hour() == hour
}

/// Whether the monthly re-assertion sweep is due right now (local clock).
pub fn resweep_due_local(day_of_month: u32, hour: u32) -> bool {
    resweep_due(day_of_month, hour, Local::now().naive_local())
}
