//! Slack message timestamp tokens.
//!
//! A `ts` such as `"1512085950.000216"` is both the identity of a message and
//! its position in time. It is parsed as a fixed-point decimal (whole seconds
//! plus a fraction scaled to nanoseconds) so that ordering never goes through
//! a float.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use chrono::{NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use super::{AppError, Result};

/// Maximum number of fractional digits representable in nanoseconds.
const MAX_FRACTION_DIGITS: usize = 9;

/// A parsed Slack timestamp token.
///
/// Equality, ordering and hashing use the numeric value; the original text is
/// kept verbatim for serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MessageTs {
    raw: String,
    seconds: i64,
    nanos: u32,
}

impl MessageTs {
    /// Whole seconds since the Unix epoch.
    #[must_use]
    pub const fn seconds(&self) -> i64 {
        self.seconds
    }

    /// Sub-second part in nanoseconds.
    #[must_use]
    pub const fn nanos(&self) -> u32 {
        self.nanos
    }

    /// The token exactly as received.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Calendar date of this instant on the wall clock of `tz`.
    #[must_use]
    pub fn date_in<Tz: TimeZone>(&self, tz: &Tz) -> Option<NaiveDate> {
        tz.timestamp_opt(self.seconds, self.nanos)
            .earliest()
            .map(|dt| dt.date_naive())
    }
}

impl FromStr for MessageTs {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || AppError::InvalidData {
            message: format!("Invalid message timestamp: {s:?}"),
        };

        let (whole, fraction) = s.split_once('.').unwrap_or((s, ""));

        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if fraction.len() > MAX_FRACTION_DIGITS || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }
        if s.contains('.') && fraction.is_empty() {
            return Err(invalid());
        }

        let seconds = whole.parse::<i64>().map_err(|_| invalid())?;

        let mut nanos = 0u32;
        for (i, digit) in fraction.bytes().enumerate() {
            nanos += u32::from(digit - b'0') * 10u32.pow((MAX_FRACTION_DIGITS - 1 - i) as u32);
        }

        Ok(Self {
            raw: s.to_string(),
            seconds,
            nanos,
        })
    }
}

impl TryFrom<String> for MessageTs {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<MessageTs> for String {
    fn from(ts: MessageTs) -> Self {
        ts.raw
    }
}

impl fmt::Display for MessageTs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl PartialEq for MessageTs {
    fn eq(&self, other: &Self) -> bool {
        self.seconds == other.seconds && self.nanos == other.nanos
    }
}

impl Eq for MessageTs {}

impl Hash for MessageTs {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.seconds.hash(state);
        self.nanos.hash(state);
    }
}

impl PartialOrd for MessageTs {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MessageTs {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.seconds, self.nanos).cmp(&(other.seconds, other.nanos))
    }
}
