//! Calendar fields derived from observation timestamps.

use crate::error::{ConvertError, Result};
use chrono::{DateTime, Datelike, NaiveDateTime, Timelike};

/// Everything the AMOF time variables and file name need.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeFields {
    pub unix_times:  Vec<f64>,
    pub day_of_year: Vec<u32>,
    pub years:       Vec<i32>,
    pub months:      Vec<u32>,
    pub days:        Vec<u32>,
    pub hours:       Vec<u32>,
    pub minutes:     Vec<u32>,
    pub seconds:     Vec<f64>,
    pub time_coverage_start: f64,
    pub time_coverage_end:   f64,
    /// `YYYYMMDD` of the first observation
    pub file_date:   String,
}

/// Timestamps are taken as UTC. Coverage runs from the first to the last
/// timestamp in input order.
pub fn get_times(times: &[NaiveDateTime]) -> Result<TimeFields> {
    let (first, last) = match (times.first(), times.last()) {
        (Some(f), Some(l)) => (f, l),
        _ => return Err(ConvertError::NoObservations),
    };

    let unix_times: Vec<f64> = times.iter().map(epoch_seconds).collect();

    Ok(TimeFields {
        day_of_year: times.iter().map(|t| t.ordinal()).collect(),
        years:       times.iter().map(|t| t.year()).collect(),
        months:      times.iter().map(|t| t.month()).collect(),
        days:        times.iter().map(|t| t.day()).collect(),
        hours:       times.iter().map(|t| t.hour()).collect(),
        minutes:     times.iter().map(|t| t.minute()).collect(),
        seconds:     times
            .iter()
            .map(|t| f64::from(t.second()) + f64::from(t.nanosecond()) / 1e9)
            .collect(),
        time_coverage_start: epoch_seconds(first),
        time_coverage_end:   epoch_seconds(last),
        file_date:   first.format("%Y%m%d").to_string(),
        unix_times,
    })
}

fn epoch_seconds(t: &NaiveDateTime) -> f64 {
    let utc = t.and_utc();
    utc.timestamp() as f64 + f64::from(utc.timestamp_subsec_micros()) / 1e6
}

/// Epoch seconds → `YYYY-MM-DDTHH:MM:SS` (UTC), as used by the coverage attributes.
pub fn format_coverage(epoch: f64) -> Result<String> {
    if !epoch.is_finite() || epoch.abs() > i64::MAX as f64 {
        return Err(ConvertError::TimeOutOfRange(epoch));
    }
    let secs = epoch.floor();
    let nanos = ((epoch - secs) * 1e9).round() as u32;
    DateTime::from_timestamp(secs as i64, nanos.min(999_999_999))
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S").to_string())
        .ok_or(ConvertError::TimeOutOfRange(epoch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::parse_timestamp;

    fn stamps(v: &[&str]) -> Vec<NaiveDateTime> {
        v.iter().map(|s| parse_timestamp(s, 0).unwrap()).collect()
    }

    #[test]
    fn ten_minutes_on_new_years_day() {
        let tf = get_times(&stamps(&["2023-01-01 00:00:00", "2023-01-01 00:10:00"])).unwrap();
        assert_eq!(tf.day_of_year, vec![1, 1]);
        assert_eq!(tf.hours, vec![0, 0]);
        assert_eq!(tf.minutes, vec![0, 10]);
        assert_eq!(tf.seconds, vec![0.0, 0.0]);
        assert_eq!(tf.unix_times, vec![1_672_531_200.0, 1_672_531_800.0]);
        assert_eq!(tf.file_date, "20230101");
        assert_eq!(format_coverage(tf.time_coverage_start).unwrap(), "2023-01-01T00:00:00");
        assert_eq!(format_coverage(tf.time_coverage_end).unwrap(), "2023-01-01T00:10:00");
    }

    #[test]
    fn leap_year_day_of_year() {
        let tf = get_times(&stamps(&["2024-12-31 23:59:59"])).unwrap();
        assert_eq!(tf.day_of_year, vec![366]);
        assert_eq!(tf.years, vec![2024]);
        assert_eq!(tf.months, vec![12]);
        assert_eq!(tf.days, vec![31]);
    }

    #[test]
    fn file_date_comes_from_first_row() {
        let tf = get_times(&stamps(&["2023-03-02 23:50:00", "2023-03-03 00:05:00"])).unwrap();
        assert_eq!(tf.file_date, "20230302");
        assert_eq!(format_coverage(tf.time_coverage_end).unwrap(), "2023-03-03T00:05:00");
    }

    #[test]
    fn coverage_outside_chrono_range_is_an_error() {
        assert!(matches!(format_coverage(1e20), Err(ConvertError::TimeOutOfRange(_))));
        assert!(matches!(format_coverage(f64::NAN), Err(ConvertError::TimeOutOfRange(_))));
        assert_eq!(format_coverage(0.0).unwrap(), "1970-01-01T00:00:00");
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(get_times(&[]), Err(ConvertError::NoObservations)));
    }
}
