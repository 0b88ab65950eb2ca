//! Shared utility functions for sunpath crates.

/// Date and clock-time utility functions
pub mod dates {
    use anyhow::anyhow;
    use chrono::{Datelike, FixedOffset, NaiveDate, NaiveTime, Timelike};

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")?)
    }

    /// Parse a wall-clock time in "HH:MM" format
    pub fn parse_hhmm(s: &str) -> anyhow::Result<NaiveTime> {
        Ok(NaiveTime::parse_from_str(s.trim(), "%H:%M")?)
    }

    /// Format any clock-like value as "HH:MM"
    pub fn format_hhmm<T: Timelike>(t: &T) -> String {
        format!("{:02}:{:02}", t.hour(), t.minute())
    }

    /// Whole-hour UTC offset approximating local solar time for a longitude.
    ///
    /// Uses `round(longitude / 15)` with ties to even, so 112.5°E maps to +8.
    pub fn solar_utc_offset(longitude: f64) -> anyhow::Result<FixedOffset> {
        let hours = (longitude / 15.0).round_ties_even() as i32;
        FixedOffset::east_opt(hours * 3600)
            .ok_or_else(|| anyhow!("no UTC offset for longitude {}", longitude))
    }

    /// Day of year, 1 = January 1st
    pub fn day_of_year(date: &NaiveDate) -> u32 {
        date.ordinal()
    }

}

/// Number sanitising helpers
pub mod numbers {
    /// `Some(value)` when finite, `None` for NaN and infinities.
    pub fn finite(value: f64) -> Option<f64> {
        value.is_finite().then_some(value)
    }

    /// Format a coordinate with at most six decimals and no trailing zeros.
    ///
    /// `37.566500` becomes `"37.5665"`, `127.0` becomes `"127"`.
    pub fn format_coordinate(value: f64) -> String {
        let fixed = format!("{:.6}", value);
        let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
        match trimmed {
            "-0" | "" => "0".to_string(),
            s => s.to_string(),
        }
    }

}

/// Serde adapters that write non-finite floats as JSON `null`.
///
/// JSON has no NaN or Infinity, so values that can legitimately be
/// non-finite go through one of these via `#[serde(with = "...")]`.
pub mod serde_float {
    /// NaN and infinities become `null`; `null` reads back as NaN.
    pub mod finite_or_null {
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
            if value.is_finite() {
                serializer.serialize_f64(*value)
            } else {
                serializer.serialize_none()
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
            Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
        }
    }

    /// Unbounded lengths become `null`; `null` reads back as +infinity.
    pub mod unbounded_or_null {
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
            if value.is_finite() {
                serializer.serialize_f64(*value)
            } else {
                serializer.serialize_none()
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
            Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
        }
    }

}
