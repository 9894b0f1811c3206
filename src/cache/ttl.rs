//! TTL presets in milliseconds.

/// One minute.
pub const SHORT: u64 = 60_000;
/// Five minutes.
pub const MEDIUM: u64 = 300_000;
/// Thirty minutes.
pub const LONG: u64 = 1_800_000;
/// One hour.
pub const HOUR: u64 = 3_600_000;
/// One day.
pub const DAY: u64 = 86_400_000;

/// TTL applied when the caller does not pick one.
pub const DEFAULT: u64 = MEDIUM;
