use chrono::{Duration, NaiveDate};

use crate::errors::SrsDataErr;

/// Inventory lists the first & last observing days in the archive for a site. It also contains a
/// list of days that are missing between the first and last.
#[allow(missing_docs)]
#[derive(Debug, PartialEq, Eq)]
pub struct Inventory {
    pub first: NaiveDate,
    pub last: NaiveDate,
    pub missing: Vec<NaiveDate>,
}

impl Inventory {
    /// Create a new inventory. Assume the provided data is sorted from earliest to latest.
    pub fn new(dates: impl IntoIterator<Item = NaiveDate>) -> Result<Self, SrsDataErr> {
        let mut dates = dates.into_iter();
        let one_day = Duration::days(1);

        let first = dates.by_ref().next().ok_or(SrsDataErr::NotEnoughData)?;
        let mut missing = vec![];

        let mut last = first;

        for date in dates {
            let mut next_date = last + one_day;

            while next_date < date {
                missing.push(next_date);
                next_date += one_day;
            }

            last = date.max(last);
        }

        Ok(Inventory {
            first,
            last,
            missing,
        })
    }

    /// True if there are no gaps.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
