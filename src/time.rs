use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::{MapError, Result};

/// Julian day of the J2000.0 epoch.
pub const J2000: f64 = 2_451_545.0;

const UNIX_EPOCH_JD: f64 = 2_440_587.5;
const MJD_OFFSET: f64 = 2_400_000.5;

/// Observation time, always in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObsTime(DateTime<Utc>);

impl ObsTime {
    pub fn new(datetime: DateTime<Utc>) -> Self {
        Self(datetime)
    }

    /// Parse `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS[.fff]` (or with a space
    /// separator), or an RFC 3339 timestamp.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self(dt.with_timezone(&Utc)));
        }
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
                return Ok(Self(naive.and_utc()));
            }
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| Self(naive.and_utc()))
            .ok_or_else(|| MapError::InvalidTime(s.to_string()))
    }

    pub fn datetime(&self) -> DateTime<Utc> {
        self.0
    }

    pub fn julian_day(&self) -> f64 {
        let seconds =
            self.0.timestamp() as f64 + self.0.timestamp_subsec_nanos() as f64 * 1e-9;
        seconds / 86_400.0 + UNIX_EPOCH_JD
    }

    pub fn mjd(&self) -> f64 {
        self.julian_day() - MJD_OFFSET
    }

    /// Julian centuries elapsed since J2000.0.
    pub fn julian_centuries(&self) -> f64 {
        (self.julian_day() - J2000) / 36_525.0
    }

    /// `DATE-OBS` formatting, millisecond precision.
    pub fn to_fits_string(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
    }
}

impl fmt::Display for ObsTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_fits_string())
    }
}

impl std::str::FromStr for ObsTime {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(feature = "serialize")]
impl serde::Serialize for ObsTime {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_fits_string())
    }
}

#[cfg(feature = "serialize")]
impl<'de> serde::Deserialize<'de> for ObsTime {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
