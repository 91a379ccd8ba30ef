//! Timestamp parsing and index encoding.
//!
//! Clinical dates arrive with variable precision (`2020`, `2020-01`,
//! `2020-01-01`, or a full instant). Each parse yields the first and last
//! instant covered by the value.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Text layout of timestamps in the index. Fixed width, so lexical order is chronological.
pub const INDEX_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Lowest representable instant, used for open interval starts.
pub fn min_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(1, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Highest representable instant, used for open interval ends.
pub fn max_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59)
        .single()
        .map(|dt| dt + Duration::microseconds(999_999))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// The first and last instant covered by a date or date-time literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateBounds {
    /// First covered instant.
    pub start: DateTime<Utc>,
    /// Last covered instant (inclusive).
    pub end: DateTime<Utc>,
}

impl DateBounds {
    /// Parses a literal of year, month, day or full instant precision.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.len() > 10 {
            let instant = parse_instant(value)?;
            return Some(Self {
                start: instant,
                end: instant,
            });
        }

        let mut parts = value.split('-');
        let year: i32 = parts.next()?.parse().ok()?;
        let month: Option<u32> = match parts.next() {
            Some(m) => Some(m.parse().ok()?),
            None => None,
        };
        let day: Option<u32> = match parts.next() {
            Some(d) => Some(d.parse().ok()?),
            None => None,
        };
        if parts.next().is_some() {
            return None;
        }

        let (first, next) = match (month, day) {
            (None, _) => (
                NaiveDate::from_ymd_opt(year, 1, 1)?,
                NaiveDate::from_ymd_opt(year + 1, 1, 1)?,
            ),
            (Some(m), None) => {
                let first = NaiveDate::from_ymd_opt(year, m, 1)?;
                let next = if m == 12 {
                    NaiveDate::from_ymd_opt(year + 1, 1, 1)?
                } else {
                    NaiveDate::from_ymd_opt(year, m + 1, 1)?
                };
                (first, next)
            }
            (Some(m), Some(d)) => {
                let first = NaiveDate::from_ymd_opt(year, m, d)?;
                (first, first.succ_opt()?)
            }
        };

        let start = first.and_hms_opt(0, 0, 0)?.and_utc();
        let end = next.and_hms_opt(0, 0, 0)?.and_utc() - Duration::microseconds(1);
        Some(Self { start, end })
    }

    /// True if the literal denotes a single instant.
    pub fn is_point(&self) -> bool {
        self.start == self.end
    }
}

/// Parses a full date-time. Values without an offset are read as UTC.
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Encodes an instant for storage in the index.
pub fn to_index_text(value: &DateTime<Utc>) -> String {
    // Years outside 1..=9999 would break the fixed width.
    let clamped = if value.year() < 1 {
        min_instant()
    } else if value.year() > 9999 {
        max_instant()
    } else {
        *value
    };
    clamped.format(INDEX_FORMAT).to_string()
}

/// Decodes an instant written by [`to_index_text`].
pub fn from_index_text(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, INDEX_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}
