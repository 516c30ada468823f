//! ADM time values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::DocumentError;

const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// A non-negative time expressed in integer nanoseconds.
///
/// Scene files may spell a time either as a nanosecond count or as an ADM
/// timecode (`hh:mm:ss.fffff`, any number of fractional digits up to
/// nanosecond precision).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "u64")]
pub struct AdmTime(u64);

impl AdmTime {
    pub const ZERO: AdmTime = AdmTime(0);

    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    pub fn from_millis(millis: u64) -> Self {
        Self(millis * 1_000_000)
    }

    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    /// Seconds as handed to renderers (nanoseconds divided by 1e9).
    pub fn as_seconds(self) -> f64 {
        self.0 as f64 / NANOS_PER_SECOND as f64
    }

    pub fn parse_timecode(text: &str) -> Result<Self, DocumentError> {
        let invalid = || DocumentError::InvalidTime(text.to_string());
        let mut parts = text.trim().split(':');
        let (Some(hours), Some(minutes), Some(seconds), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        let hours: u64 = hours.parse().map_err(|_| invalid())?;
        let minutes: u64 = minutes.parse().map_err(|_| invalid())?;
        if minutes >= 60 {
            return Err(invalid());
        }

        let (whole, fraction) = match seconds.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (seconds, ""),
        };
        let whole: u64 = whole.parse().map_err(|_| invalid())?;
        if whole >= 60 || fraction.len() > 9 || !fraction.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let mut nanos = 0u64;
        for (position, digit) in fraction.bytes().enumerate() {
            nanos += u64::from(digit - b'0') * 10u64.pow(8 - position as u32);
        }

        let total = hours
            .checked_mul(3600)
            .and_then(|value| value.checked_add(minutes * 60 + whole))
            .and_then(|value| value.checked_mul(NANOS_PER_SECOND))
            .and_then(|value| value.checked_add(nanos))
            .ok_or_else(invalid)?;
        Ok(Self(total))
    }
}

impl From<AdmTime> for u64 {
    fn from(time: AdmTime) -> Self {
        time.0
    }
}

impl FromStr for AdmTime {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_timecode(s)
    }
}

impl fmt::Display for AdmTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_seconds = self.0 / NANOS_PER_SECOND;
        let nanos = self.0 % NANOS_PER_SECOND;
        write!(
            f,
            "{:02}:{:02}:{:02}.{:09}",
            total_seconds / 3600,
            (total_seconds / 60) % 60,
            total_seconds % 60,
            nanos
        )
    }
}

impl<'de> Deserialize<'de> for AdmTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Nanos(u64),
            Timecode(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Nanos(nanos) => Ok(AdmTime(nanos)),
            Raw::Timecode(text) => AdmTime::parse_timecode(&text).map_err(serde::de::Error::custom),
        }
    }
}
