//! Due-time resolution.
//!
//! Task schedules arrive as loosely formatted strings. [`DueTimeResolver`]
//! tries a fixed list of shapes in priority order and stops at the first one
//! that yields a valid calendar date; later shapes are never consulted, so
//! an ambiguous string always resolves the same way.
//!
//! Priority order:
//! 1. timestamp with offset (`2024-01-01T09:00:00+02:00`, `...Z`)
//! 2. `YYYY-MM-DD HH:MM:SS`
//! 3. `YYYY-MM-DD HH:MM`
//! 4. the space swapped for `T` (`YYYY-MM-DDTHH:MM[:SS[.fff]]`)
//! 5. generic fallbacks (slashed dates, RFC 2822, bare dates at midnight)
//!
//! Naive shapes are read in the resolver's zone, and every result is rendered
//! in that zone. The host zone follows its daylight-saving rules: a wall time
//! that occurs twice takes the earlier instant, and one that is skipped is
//! unparseable.

use crate::error::{DashboardError, Result};
use chrono::{
    DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Timelike,
    Utc,
};
use std::fmt;

/// Canonical rendering of a due slot.
pub const SLOT_FORMAT: &str = "%Y-%m-%d %H:%M";

const SECONDS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const MINUTES_FORMAT: &str = "%Y-%m-%d %H:%M";
const ISO_LOCAL_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];
const GENERIC_DATETIME_FORMATS: &[&str] = &["%Y/%m/%d %H:%M:%S", "%Y/%m/%d %H:%M"];
const GENERIC_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// A wall-clock minute in the resolver's zone. Two schedules that round
/// to the same minute share a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DueSlot(NaiveDateTime);

impl DueSlot {
    /// Truncate a wall-clock time to its minute.
    pub fn from_local(local: NaiveDateTime) -> Self {
        let truncated = local
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(local);
        Self(truncated)
    }

    /// Canonical key, e.g. `2024-01-01 09:00`.
    pub fn key(&self) -> String {
        self.0.format(SLOT_FORMAT).to_string()
    }

    /// The minute as a naive wall-clock time.
    pub fn as_naive(&self) -> NaiveDateTime {
        self.0
    }

    /// Whole minutes from `earlier` to `self`; negative when `self` is earlier.
    pub fn minutes_since(&self, earlier: &DueSlot) -> i64 {
        (self.0 - earlier.0).num_minutes()
    }
}

impl fmt::Display for DueSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(SLOT_FORMAT))
    }
}

/// A resolved schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueTime {
    /// Full-precision instant, carrying the zone's offset at that instant.
    pub instant: DateTime<FixedOffset>,
    /// Minute-truncated slot.
    pub slot: DueSlot,
}

/// Which shape matched a schedule string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleShape {
    /// RFC 3339 timestamp carrying its own offset.
    OffsetTimestamp,
    /// `YYYY-MM-DD HH:MM:SS`.
    DateTimeSeconds,
    /// `YYYY-MM-DD HH:MM`.
    DateTimeMinutes,
    /// Date and time joined with `T`, no offset.
    IsoLocal,
    /// Anything the generic fallbacks accepted.
    Generic,
}

/// Zone that naive schedules are read in and slots are rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverZone {
    /// A fixed UTC offset.
    Fixed(FixedOffset),
    /// The host's local zone, daylight-saving changes included.
    Local,
}

/// Parses schedule strings into [`DueTime`]s.
#[derive(Debug, Clone, Copy)]
pub struct DueTimeResolver {
    zone: ResolverZone,
}

impl Default for DueTimeResolver {
    fn default() -> Self {
        Self::utc()
    }
}

impl DueTimeResolver {
    /// Resolver reading naive schedules in `offset`.
    pub fn new(offset: FixedOffset) -> Self {
        Self::in_zone(ResolverZone::Fixed(offset))
    }

    /// Resolver working in UTC.
    pub fn utc() -> Self {
        Self::new(Utc.fix())
    }

    /// Resolver following the host's local zone.
    pub fn local() -> Self {
        Self::in_zone(ResolverZone::Local)
    }

    /// Resolver working in `zone`.
    pub fn in_zone(zone: ResolverZone) -> Self {
        Self { zone }
    }

    /// The zone naive schedules are read in.
    pub fn zone(&self) -> ResolverZone {
        self.zone
    }

    /// Resolve a schedule string.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::DueTimeUnparseable`] when no shape matches.
    pub fn resolve(&self, raw: &str) -> Result<DueTime> {
        self.resolve_with_shape(raw).map(|(due, _)| due)
    }

    /// Resolve a schedule string and report which shape matched.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::DueTimeUnparseable`] when no shape matches.
    pub fn resolve_with_shape(&self, raw: &str) -> Result<(DueTime, ScheduleShape)> {
        let input = raw.trim();
        if input.is_empty() {
            return Err(DashboardError::DueTimeUnparseable(raw.to_owned()));
        }

        if let Ok(instant) = DateTime::parse_from_rfc3339(input) {
            return Ok((self.at_instant(instant), ScheduleShape::OffsetTimestamp));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, SECONDS_FORMAT) {
            return self.at_naive(raw, naive, ScheduleShape::DateTimeSeconds);
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, MINUTES_FORMAT) {
            return self.at_naive(raw, naive, ScheduleShape::DateTimeMinutes);
        }

        let joined = input.replacen(' ', "T", 1);
        for format in ISO_LOCAL_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(&joined, format) {
                return self.at_naive(raw, naive, ScheduleShape::IsoLocal);
            }
        }

        self.resolve_generic(raw, input)
    }

    /// The slot `now` falls in.
    pub fn slot_of(&self, now: DateTime<Utc>) -> DueSlot {
        let local = match self.zone {
            ResolverZone::Fixed(offset) => now.with_timezone(&offset).naive_local(),
            ResolverZone::Local => now.with_timezone(&Local).naive_local(),
        };
        DueSlot::from_local(local)
    }

    fn resolve_generic(&self, raw: &str, input: &str) -> Result<(DueTime, ScheduleShape)> {
        for format in GENERIC_DATETIME_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
                return self.at_naive(raw, naive, ScheduleShape::Generic);
            }
        }
        if let Ok(instant) = DateTime::parse_from_rfc2822(input) {
            return Ok((self.at_instant(instant), ScheduleShape::Generic));
        }
        for format in GENERIC_DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(input, format) {
                let midnight = date.and_time(NaiveTime::MIN);
                return self.at_naive(raw, midnight, ScheduleShape::Generic);
            }
        }
        Err(DashboardError::DueTimeUnparseable(raw.to_owned()))
    }

    fn at_instant(&self, instant: DateTime<FixedOffset>) -> DueTime {
        let instant = match self.zone {
            ResolverZone::Fixed(offset) => instant.with_timezone(&offset),
            ResolverZone::Local => instant.with_timezone(&Local).fixed_offset(),
        };
        DueTime {
            instant,
            slot: DueSlot::from_local(instant.naive_local()),
        }
    }

    fn at_naive(
        &self,
        raw: &str,
        naive: NaiveDateTime,
        shape: ScheduleShape,
    ) -> Result<(DueTime, ScheduleShape)> {
        let instant = match self.zone {
            ResolverZone::Fixed(offset) => offset.from_local_datetime(&naive).single(),
            ResolverZone::Local => Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|local| local.fixed_offset()),
        };
        let instant =
            instant.ok_or_else(|| DashboardError::DueTimeUnparseable(raw.to_owned()))?;
        Ok((self.at_instant(instant), shape))
    }
}
