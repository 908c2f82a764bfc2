//! Booking Date Ranges

use jiff::{civil::Date, tz::TimeZone};
use thiserror::Error;

const SECONDS_PER_DAY: i64 = 86_400;

/// Errors raised while validating a booking date range.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DateRangeError {
    /// The input is not a `YYYY-MM-DD` calendar date.
    #[error("invalid date {input:?}; expected YYYY-MM-DD")]
    InvalidDateFormat {
        /// Offending input.
        input: String,
    },

    /// The end does not fall at least one whole day after the start.
    #[error("start date {start} must be at least one day before end date {end}")]
    InvalidDateRange {
        /// Requested start.
        start: Date,

        /// Requested end.
        end: Date,
    },

    /// The date lies before the Unix epoch and cannot be submitted as an unsigned timestamp.
    #[error("date {date} is before 1970-01-01")]
    BeforeEpoch {
        /// Offending date.
        date: Date,
    },
}

/// A validated booking period of whole days, starting and ending at local midnight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    start: Date,
    end: Date,
    start_timestamp: u64,
    end_timestamp: u64,
    days: u64,
}

impl DateRange {
    /// Parse two `YYYY-MM-DD` dates as midnight in the system time zone.
    ///
    /// # Errors
    ///
    /// See [`DateRange::from_dates`]; additionally [`DateRangeError::InvalidDateFormat`] when
    /// either input does not parse.
    pub fn parse(start: &str, end: &str) -> Result<Self, DateRangeError> {
        Self::parse_in(start, end, &TimeZone::system())
    }

    /// Parse two `YYYY-MM-DD` dates as midnight in `time_zone`.
    ///
    /// # Errors
    ///
    /// See [`DateRange::from_dates`]; additionally [`DateRangeError::InvalidDateFormat`] when
    /// either input does not parse.
    pub fn parse_in(start: &str, end: &str, time_zone: &TimeZone) -> Result<Self, DateRangeError> {
        Self::from_dates(parse_date(start)?, parse_date(end)?, time_zone)
    }

    /// Build a range from two calendar dates.
    ///
    /// The day count is the number of whole days between the two midnights, measured on the
    /// civil calendar so that daylight-saving shifts never shorten a booking by a day.
    ///
    /// # Errors
    ///
    /// - [`DateRangeError::InvalidDateRange`]: `start >= end`.
    /// - [`DateRangeError::BeforeEpoch`]: either midnight precedes the Unix epoch.
    /// - [`DateRangeError::InvalidDateFormat`]: the date has no midnight in `time_zone`.
    pub fn from_dates(start: Date, end: Date, time_zone: &TimeZone) -> Result<Self, DateRangeError> {
        let elapsed = utc_midnight(end)? - utc_midnight(start)?;
        let days = elapsed.div_euclid(SECONDS_PER_DAY);

        if start >= end || days < 1 {
            return Err(DateRangeError::InvalidDateRange { start, end });
        }

        Ok(Self {
            start,
            end,
            start_timestamp: local_midnight(start, time_zone)?,
            end_timestamp: local_midnight(end, time_zone)?,
            days: days.unsigned_abs(),
        })
    }

    /// First booked day.
    pub const fn start(&self) -> Date {
        self.start
    }

    /// Day the booking ends (exclusive).
    pub const fn end(&self) -> Date {
        self.end
    }

    /// Epoch seconds of the start midnight.
    pub const fn start_timestamp(&self) -> u64 {
        self.start_timestamp
    }

    /// Epoch seconds of the end midnight.
    pub const fn end_timestamp(&self) -> u64 {
        self.end_timestamp
    }

    /// Number of whole days booked; always at least one.
    pub const fn days(&self) -> u64 {
        self.days
    }
}

fn parse_date(input: &str) -> Result<Date, DateRangeError> {
    input
        .trim()
        .parse::<Date>()
        .map_err(|_error| DateRangeError::InvalidDateFormat {
            input: input.to_string(),
        })
}

fn utc_midnight(date: Date) -> Result<i64, DateRangeError> {
    date.to_zoned(TimeZone::UTC)
        .map(|zoned| zoned.timestamp().as_second())
        .map_err(|_error| DateRangeError::InvalidDateFormat {
            input: date.to_string(),
        })
}

fn local_midnight(date: Date, time_zone: &TimeZone) -> Result<u64, DateRangeError> {
    let seconds = date
        .to_zoned(time_zone.clone())
        .map(|zoned| zoned.timestamp().as_second())
        .map_err(|_error| DateRangeError::InvalidDateFormat {
            input: date.to_string(),
        })?;

    u64::try_from(seconds).map_err(|_negative| DateRangeError::BeforeEpoch { date })
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn three_day_range_in_utc() -> TestResult {
        let range = DateRange::parse_in("2024-01-01", "2024-01-04", &TimeZone::UTC)?;

        assert_eq!(range.days(), 3);
        assert_eq!(range.start_timestamp(), 1_704_067_200);
        assert_eq!(range.end_timestamp(), 1_704_326_400);
        assert_eq!(range.start(), date(2024, 1, 1));
        assert_eq!(range.end(), date(2024, 1, 4));

        Ok(())
    }

    #[test]
    fn timestamps_follow_the_local_zone() -> TestResult {
        let zone = TimeZone::get("Europe/Lisbon")?;
        let range = DateRange::parse_in("2024-07-01", "2024-07-02", &zone)?;

        // Lisbon is UTC+1 in July.
        assert_eq!(range.start_timestamp(), 1_719_788_400);
        assert_eq!(range.days(), 1);

        Ok(())
    }

    #[test]
    fn daylight_saving_shift_keeps_whole_days() -> TestResult {
        let zone = TimeZone::get("America/New_York")?;

        // 2024-03-10 is only 23 hours long in New York.
        let range = DateRange::parse_in("2024-03-10", "2024-03-11", &zone)?;

        assert_eq!(range.days(), 1);
        assert_eq!(range.end_timestamp() - range.start_timestamp(), 23 * 3_600);

        Ok(())
    }

    #[test]
    fn equal_dates_are_rejected() {
        let result = DateRange::parse_in("2024-01-01", "2024-01-01", &TimeZone::UTC);

        assert_eq!(
            result,
            Err(DateRangeError::InvalidDateRange {
                start: date(2024, 1, 1),
                end: date(2024, 1, 1),
            })
        );
    }

    #[test]
    fn reversed_dates_are_rejected() {
        let result = DateRange::parse_in("2024-02-10", "2024-02-01", &TimeZone::UTC);

        assert!(
            matches!(result, Err(DateRangeError::InvalidDateRange { .. })),
            "expected InvalidDateRange, got {result:?}"
        );
    }

    #[test]
    fn malformed_dates_are_rejected() {
        for (start, end) in [
            ("01/01/2024", "2024-01-04"),
            ("2024-01-01", "tomorrow"),
            ("2024-02-30", "2024-03-01"),
            ("", "2024-03-01"),
        ] {
            let result = DateRange::parse_in(start, end, &TimeZone::UTC);

            assert!(
                matches!(result, Err(DateRangeError::InvalidDateFormat { .. })),
                "expected InvalidDateFormat for ({start:?}, {end:?}), got {result:?}"
            );
        }
    }

    #[test]
    fn pre_epoch_dates_are_rejected() {
        let result = DateRange::parse_in("1969-12-01", "1970-01-05", &TimeZone::UTC);

        assert_eq!(
            result,
            Err(DateRangeError::BeforeEpoch {
                date: date(1969, 12, 1)
            })
        );
    }
}
