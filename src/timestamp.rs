//! Timestamp scalars.
//!
//! Two lexical families are recognized: a date (`2001-12-14`) and a full
//! timestamp (`2001-12-14 21:59:43.10 -5` or with `T`/`t` separators and a
//! `Z` or `±hh:mm` zone). Full timestamps normalize to UTC; a missing zone
//! means the time already is UTC.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};

/// A calendar-time value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Timestamp {
    /// A date with no time-of-day component.
    Date(NaiveDate),
    /// A point in time, normalized to UTC.
    DateTime(DateTime<Utc>),
}

pub(crate) fn looks_like_timestamp(s: &str) -> bool {
    parse_timestamp(s).is_ok()
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(s: &'a str) -> Self {
        Self {
            bytes: s.as_bytes(),
            pos: 0,
        }
    }

    /// Consume between `min` and `max` ASCII digits and return their value.
    fn digits(&mut self, min: usize, max: usize) -> Option<(u32, usize)> {
        let mut count = 0;
        let mut value: u32 = 0;
        while count < max {
            match self.bytes.get(self.pos) {
                Some(b @ b'0'..=b'9') => {
                    value = value.checked_mul(10)?.checked_add((b - b'0') as u32)?;
                    self.pos += 1;
                    count += 1;
                }
                _ => break,
            }
        }
        if count >= min {
            Some((value, count))
        } else {
            None
        }
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.bytes.get(self.pos) == Some(&b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_blanks(&mut self) -> usize {
        let mut n = 0;
        while matches!(self.bytes.get(self.pos), Some(b' ') | Some(b'\t')) {
            self.pos += 1;
            n += 1;
        }
        n
    }

    fn done(&self) -> bool {
        self.pos == self.bytes.len()
    }
}

/// Parse one of the two timestamp families.
pub(crate) fn parse_timestamp(s: &str) -> Result<Timestamp, String> {
    let malformed = || format!("invalid timestamp: `{s}`");
    let mut c = Cursor::new(s);

    let (year, year_digits) = c.digits(4, 4).ok_or_else(malformed)?;
    debug_assert_eq!(year_digits, 4);
    if !c.eat(b'-') {
        return Err(malformed());
    }
    let (month, month_digits) = c.digits(1, 2).ok_or_else(malformed)?;
    if !c.eat(b'-') {
        return Err(malformed());
    }
    let (day, day_digits) = c.digits(1, 2).ok_or_else(malformed)?;

    let date = NaiveDate::from_ymd_opt(year as i32, month, day).ok_or_else(malformed)?;

    if c.done() {
        // The date-only family is strict: two-digit month and day.
        if month_digits == 2 && day_digits == 2 {
            return Ok(Timestamp::Date(date));
        }
        return Err(malformed());
    }

    // Separator: 'T', 't', or at least one blank.
    if !c.eat(b'T') && !c.eat(b't') && c.eat_blanks() == 0 {
        return Err(malformed());
    }

    let (hour, _) = c.digits(1, 2).ok_or_else(malformed)?;
    if !c.eat(b':') {
        return Err(malformed());
    }
    let (minute, minute_digits) = c.digits(2, 2).ok_or_else(malformed)?;
    debug_assert_eq!(minute_digits, 2);
    if !c.eat(b':') {
        return Err(malformed());
    }
    let (second, _) = c.digits(2, 2).ok_or_else(malformed)?;

    let mut nanos: u32 = 0;
    if c.eat(b'.') {
        // Up to nine fractional digits matter; the rest are ignored.
        let mut scale = 100_000_000u32;
        while let Some(b @ b'0'..=b'9') = c.bytes.get(c.pos).copied() {
            nanos += (b - b'0') as u32 * scale;
            scale /= 10;
            c.pos += 1;
            if scale == 0 {
                while matches!(c.bytes.get(c.pos), Some(b'0'..=b'9')) {
                    c.pos += 1;
                }
                break;
            }
        }
    }

    let mut offset_seconds: i64 = 0;
    c.eat_blanks();
    if !c.done() {
        if c.eat(b'Z') {
            // UTC already.
        } else {
            let sign = if c.eat(b'+') {
                1
            } else if c.eat(b'-') {
                -1
            } else {
                return Err(malformed());
            };
            let (tz_hour, _) = c.digits(1, 2).ok_or_else(malformed)?;
            let tz_minute = if c.eat(b':') {
                c.digits(2, 2).ok_or_else(malformed)?.0
            } else {
                0
            };
            offset_seconds = sign * (tz_hour as i64 * 3600 + tz_minute as i64 * 60);
        }
    }
    if !c.done() {
        return Err(malformed());
    }

    let time = NaiveTime::from_hms_nano_opt(hour, minute, second, nanos).ok_or_else(malformed)?;
    let naive = date.and_time(time) - TimeDelta::seconds(offset_seconds);
    Ok(Timestamp::DateTime(DateTime::from_naive_utc_and_offset(
        naive, Utc,
    )))
}
