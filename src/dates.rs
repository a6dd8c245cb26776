//! Observing days and the ways a caller can name one.

use crate::errors::SrsDataErr;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

/// A Modified Julian Date, days since 1858-11-17 00:00 UTC.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Mjd(pub f64);

impl Mjd {
    /// MJD of the UNIX epoch.
    const UNIX_EPOCH: f64 = 40_587.0;

    /// Convert a UTC time to a Modified Julian Date.
    pub fn from_datetime(time: &NaiveDateTime) -> Self {
        let time = time.and_utc();
        let secs = time.timestamp() as f64 + f64::from(time.timestamp_subsec_nanos()) / 1.0e9;

        Mjd(secs / 86_400.0 + Self::UNIX_EPOCH)
    }

    /// The UTC time of this MJD, `None` if it is not finite or out of range.
    pub fn to_datetime(self) -> Option<NaiveDateTime> {
        let millis = ((self.0 - Self::UNIX_EPOCH) * 86_400_000.0).round();
        if !millis.is_finite() || millis.abs() > 1.0e18 {
            return None;
        }

        DateTime::from_timestamp_millis(millis as i64).map(|dt| dt.naive_utc())
    }
}

/// Anything that names a UTC observing day.
pub trait ToObservingDate {
    /// Resolve to a calendar date.
    fn to_observing_date(&self) -> Result<NaiveDate, SrsDataErr>;
}

impl ToObservingDate for NaiveDate {
    fn to_observing_date(&self) -> Result<NaiveDate, SrsDataErr> {
        Ok(*self)
    }
}

impl ToObservingDate for NaiveDateTime {
    fn to_observing_date(&self) -> Result<NaiveDate, SrsDataErr> {
        Ok(self.date())
    }
}

impl ToObservingDate for DateTime<Utc> {
    fn to_observing_date(&self) -> Result<NaiveDate, SrsDataErr> {
        Ok(self.date_naive())
    }
}

impl ToObservingDate for Mjd {
    fn to_observing_date(&self) -> Result<NaiveDate, SrsDataErr> {
        self.to_datetime()
            .map(|dt| dt.date())
            .ok_or_else(|| SrsDataErr::InvalidDate(format!("MJD {}", self.0)))
    }
}

impl ToObservingDate for str {
    fn to_observing_date(&self) -> Result<NaiveDate, SrsDataErr> {
        parse_date(self)
    }
}

impl ToObservingDate for &str {
    fn to_observing_date(&self) -> Result<NaiveDate, SrsDataErr> {
        parse_date(self)
    }
}

impl ToObservingDate for String {
    fn to_observing_date(&self) -> Result<NaiveDate, SrsDataErr> {
        parse_date(self)
    }
}

/// Parse `YYYY-MM-DD` or `YYYY/MM/DD`.
pub fn parse_date(text: &str) -> Result<NaiveDate, SrsDataErr> {
    let normalized = text.trim().replace('/', "-");

    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .map_err(|_| SrsDataErr::InvalidDate(text.to_owned()))
}

/// Every day from `start` through `end`, inclusive.
pub fn days_between(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    debug_assert!(start <= end);

    let steps = (end - start).num_days();

    (0..=steps).map(move |step| start + Duration::days(step))
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
#[cfg(test)]
mod unit {
    use super::*;

    #[test]
    fn test_parse_both_separators() {
        let expected = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();

        assert_eq!(parse_date("2025-01-10").unwrap(), expected);
        assert_eq!(parse_date("2025/01/10").unwrap(), expected);
        assert_eq!("2025-01-10".to_observing_date().unwrap(), expected);
        assert_eq!(
            String::from(" 2025/01/10 ").to_observing_date().unwrap(),
            expected
        );
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(
            parse_date("2025-02-30"),
            Err(SrsDataErr::InvalidDate(_))
        ));
        assert!(parse_date("yesterday").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn test_mjd() {
        let date = NaiveDate::from_ymd_opt(2024, 10, 1).unwrap();
        let noon = date.and_hms_opt(12, 0, 0).unwrap();

        let mjd = Mjd::from_datetime(&noon);
        assert!((mjd.0 - 60584.5).abs() < 1.0e-9);
        assert_eq!(Mjd(60584.5).to_observing_date().unwrap(), date);
        assert_eq!(
            Mjd(0.0).to_observing_date().unwrap(),
            NaiveDate::from_ymd_opt(1858, 11, 17).unwrap()
        );
        assert!(Mjd(f64::NAN).to_observing_date().is_err());
    }

    #[test]
    fn test_days_between() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 27).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        let days: Vec<_> = days_between(start, end).collect();
        assert_eq!(days.len(), 4);
        assert_eq!(days[2], NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(days_between(start, start).count(), 1);
    }
}
