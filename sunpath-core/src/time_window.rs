use crate::error::{Result, SunpathError};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone};
use std::mem::replace;
use sunpath_utils::dates::{parse_date, parse_hhmm};

/// Largest sampling interval accepted, one full day.
pub const MAX_INTERVAL_MINUTES: u32 = 1440;

/// A calendar date, an inclusive clock-time window and a sampling interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub interval_minutes: u32,
}

impl TimeWindow {
    /// Parse a window from its textual parts ("YYYY-MM-DD", "HH:MM", "HH:MM").
    pub fn parse(date: &str, start: &str, end: &str, interval_minutes: u32) -> Result<Self> {
        let date = parse_date(date).map_err(|_| {
            SunpathError::invalid(format!("date must be in YYYY-MM-DD format, got {:?}", date))
        })?;
        let start = parse_hhmm(start).map_err(|_| {
            SunpathError::invalid(format!("start time must be HH:MM, got {:?}", start))
        })?;
        let end = parse_hhmm(end)
            .map_err(|_| SunpathError::invalid(format!("end time must be HH:MM, got {:?}", end)))?;
        if !(1..=MAX_INTERVAL_MINUTES).contains(&interval_minutes) {
            return Err(SunpathError::invalid(format!(
                "interval must be between 1 and {} minutes, got {}",
                MAX_INTERVAL_MINUTES, interval_minutes
            )));
        }
        Ok(Self {
            date,
            start,
            end,
            interval_minutes,
        })
    }

    /// Iterate the local wall-clock instants of the window.
    ///
    /// Empty when the start time is after the end time.
    pub fn instants(&self) -> TimestampRange {
        TimestampRange {
            next: self.date.and_time(self.start),
            end: self.date.and_time(self.end),
            step: TimeDelta::minutes(i64::from(self.interval_minutes)),
        }
    }

    /// All instants of the window pinned to a fixed UTC offset.
    pub fn timestamps(&self, offset: FixedOffset) -> Result<Vec<DateTime<FixedOffset>>> {
        self.instants()
            .map(|local| {
                offset.from_local_datetime(&local).single().ok_or_else(|| {
                    SunpathError::ComputationError(format!("unrepresentable local time {}", local))
                })
            })
            .collect()
    }

    /// Sampling interval in hours.
    pub fn interval_hours(&self) -> f64 {
        f64::from(self.interval_minutes) / 60.0
    }
}

/// An iterator that yields equally spaced instants from start through end (inclusive).
#[derive(Clone, Eq, PartialEq, Copy, Debug)]
pub struct TimestampRange {
    next: NaiveDateTime,
    end: NaiveDateTime,
    step: TimeDelta,
}

impl Iterator for TimestampRange {
    type Item = NaiveDateTime;
    fn next(&mut self) -> Option<Self::Item> {
        if self.next <= self.end {
            let following = self.next + self.step;
            Some(replace(&mut self.next, following))
        } else {
            None
        }
    }
}
