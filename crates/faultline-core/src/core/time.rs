// faultline-core/src/core/time.rs
// ============================================================================
// Module: Faultline Time Model
// Description: Canonical wall-clock timestamps for telemetry and lifecycle rows.
// Purpose: Provide one RFC 3339 timestamp representation across all records.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Every persisted record and every bus message carries an RFC 3339 timestamp.
//! [`Timestamp`] wraps [`time::OffsetDateTime`] so arithmetic stays in one
//! place and serialization is uniform. Engines take `now` as an argument where
//! determinism matters (alert ticks, muting windows) so tests can replay fixed
//! clocks.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use time::Duration;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// RFC 3339 wall-clock timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(#[serde(with = "time::serde::rfc3339")] OffsetDateTime);

impl Timestamp {
    /// Returns the current wall-clock time in UTC.
    #[must_use]
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    /// Wraps an existing [`OffsetDateTime`].
    #[must_use]
    pub const fn from_datetime(value: OffsetDateTime) -> Self {
        Self(value)
    }

    /// Parses an RFC 3339 string.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::Parse`] when the value is not valid RFC 3339.
    pub fn parse(value: &str) -> Result<Self, TimeError> {
        OffsetDateTime::parse(value, &Rfc3339)
            .map(Self)
            .map_err(|err| TimeError::Parse(err.to_string()))
    }

    /// Renders the timestamp as an RFC 3339 string.
    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        self.0.format(&Rfc3339).unwrap_or_else(|_| self.0.to_string())
    }

    /// Returns the timestamp as unix epoch milliseconds.
    #[must_use]
    pub fn unix_millis(&self) -> i64 {
        let nanos = self.0.unix_timestamp_nanos();
        i64::try_from(nanos / 1_000_000).unwrap_or(i64::MAX)
    }

    /// Builds a timestamp from unix epoch milliseconds.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::Range`] when the value is outside the supported
    /// datetime range.
    pub fn from_unix_millis(millis: i64) -> Result<Self, TimeError> {
        OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
            .map(Self)
            .map_err(|err| TimeError::Range(err.to_string()))
    }

    /// Returns the timestamp shifted back by the provided number of minutes.
    #[must_use]
    pub fn minus_minutes(&self, minutes: u32) -> Self {
        Self(self.0.saturating_sub(Duration::minutes(i64::from(minutes))))
    }

    /// Returns the timestamp shifted back by the provided number of seconds.
    #[must_use]
    pub fn minus_seconds(&self, seconds: u32) -> Self {
        Self(self.0.saturating_sub(Duration::seconds(i64::from(seconds))))
    }

    /// Returns the timestamp shifted forward by the provided number of days.
    #[must_use]
    pub fn plus_days(&self, days: u32) -> Self {
        Self(self.0.saturating_add(Duration::days(i64::from(days))))
    }

    /// Returns the whole milliseconds elapsed between `self` and `later`.
    #[must_use]
    pub fn millis_until(&self, later: &Self) -> i64 {
        (later.0 - self.0).whole_milliseconds().try_into().unwrap_or(i64::MAX)
    }

    /// Returns the underlying [`OffsetDateTime`].
    #[must_use]
    pub const fn as_datetime(&self) -> OffsetDateTime {
        self.0
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Timestamp conversion errors.
#[derive(Debug, thiserror::Error)]
pub enum TimeError {
    /// RFC 3339 parsing failed.
    #[error("invalid rfc3339 timestamp: {0}")]
    Parse(String),
    /// Value outside the representable datetime range.
    #[error("timestamp out of range: {0}")]
    Range(String),
}
