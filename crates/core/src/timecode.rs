use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ShotlistError;

/// An instant in the source video, millisecond precision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timecode(u64);

impl Timecode {
    pub const ZERO: Timecode = Timecode(0);

    pub fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub fn from_secs_f64(seconds: f64) -> Self {
        Self((seconds.max(0.0) * 1000.0).round() as u64)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// `None` when `earlier` is after `self`.
    pub fn since(&self, earlier: Timecode) -> Option<Duration> {
        self.0.checked_sub(earlier.0).map(Duration::from_millis)
    }
}

impl FromStr for Timecode {
    type Err = ShotlistError;

    /// Accepts `M:SS`, `MM:SS` and `H:MM:SS`, each with optional fractional seconds.
    /// Fractions are kept to the millisecond; further digits are dropped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ShotlistError::InvalidTimecode(s.to_string());
        let trimmed = s.trim();

        let (clock, fraction) = match trimmed.split_once('.') {
            Some((clock, fraction)) => (clock, Some(fraction)),
            None => (trimmed, None),
        };

        let parts: Vec<&str> = clock.split(':').collect();
        if parts.len() < 2 || parts.len() > 3 {
            return Err(invalid());
        }
        let numbers = parts
            .iter()
            .map(|p| {
                if p.is_empty() || !p.chars().all(|c| c.is_ascii_digit()) {
                    return None;
                }
                p.parse::<u64>().ok()
            })
            .collect::<Option<Vec<u64>>>()
            .ok_or_else(invalid)?;

        let (hours, minutes, seconds) = match numbers.as_slice() {
            [m, s] => (0, *m, *s),
            [h, m, s] => {
                if *m >= 60 {
                    return Err(invalid());
                }
                (*h, *m, *s)
            }
            _ => return Err(invalid()),
        };
        if seconds >= 60 || parts.last().is_some_and(|p| p.len() != 2) {
            return Err(invalid());
        }

        let millis = match fraction {
            None => 0,
            Some(f) if !f.is_empty() && f.chars().all(|c| c.is_ascii_digit()) => {
                let digits: String = f.chars().chain("000".chars()).take(3).collect();
                digits.parse::<u64>().map_err(|_| invalid())?
            }
            Some(_) => return Err(invalid()),
        };

        hours
            .checked_mul(60)
            .and_then(|m| m.checked_add(minutes))
            .and_then(|m| m.checked_mul(60))
            .and_then(|s| s.checked_add(seconds))
            .and_then(|s| s.checked_mul(1000))
            .and_then(|ms| ms.checked_add(millis))
            .map(Timecode)
            .ok_or_else(invalid)
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_secs = self.0 / 1000;
        let millis = self.0 % 1000;
        let hours = total_secs / 3600;
        let mins = (total_secs % 3600) / 60;
        let secs = total_secs % 60;

        if hours > 0 {
            write!(f, "{}:{:02}:{:02}", hours, mins, secs)?;
        } else {
            write!(f, "{:02}:{:02}", mins, secs)?;
        }
        if millis > 0 {
            let fraction = format!("{:03}", millis);
            write!(f, ".{}", fraction.trim_end_matches('0'))?;
        }
        Ok(())
    }
}

impl Serialize for Timecode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timecode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Format a span as seconds with one decimal, e.g. `4.0 seconds`
pub fn format_seconds(duration: Duration) -> String {
    format!("{:.1} seconds", duration.as_secs_f64())
}
