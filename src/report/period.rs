//! The calendar month a report is computed over.

use serde::{Serialize, ser::SerializeStruct};
use time::{Date, Month};

use crate::Error;

/// A calendar month, the unit all period reports are parameterized by.
///
/// Reports cover the half-open interval `[start, end_exclusive)` so that
/// every instant of the month belongs to exactly one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportPeriod {
    year: i32,
    month: Month,
}

impl ReportPeriod {
    /// Create a period from a year and a 1-based month number.
    ///
    /// # Errors
    /// Returns an [Error::InvalidMonth] if `month` is outside 1-12.
    pub fn new(year: i32, month: u8) -> Result<Self, Error> {
        let month = Month::try_from(month).map_err(|_| Error::InvalidMonth(month))?;

        Ok(Self { year, month })
    }

    /// The period containing `today`.
    pub fn current(today: Date) -> Self {
        Self {
            year: today.year(),
            month: today.month(),
        }
    }

    /// Resolve optional query parameters, defaulting to the current month
    /// when either is missing.
    ///
    /// # Errors
    /// Returns an [Error::InvalidMonth] if an explicit month is outside 1-12.
    pub fn from_query(year: Option<i32>, month: Option<u8>, today: Date) -> Result<Self, Error> {
        match (year, month) {
            (Some(year), Some(month)) => Self::new(year, month),
            _ => Ok(Self::current(today)),
        }
    }

    /// The year of the period.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The 1-based month number of the period.
    pub fn month(&self) -> u8 {
        u8::from(self.month)
    }

    /// The first day of the month.
    pub fn start(&self) -> Date {
        Date::from_calendar_date(self.year, self.month, 1)
            .expect("the first of a month always exists")
    }

    /// The first day of the following month, i.e. the exclusive upper bound
    /// of the period.
    pub fn end_exclusive(&self) -> Date {
        self.next().start()
    }

    /// The period immediately after this one.
    pub fn next(&self) -> Self {
        match self.month {
            Month::December => Self {
                year: self.year + 1,
                month: Month::January,
            },
            month => Self {
                year: self.year,
                month: month.next(),
            },
        }
    }

    /// The period immediately before this one.
    pub fn previous(&self) -> Self {
        match self.month {
            Month::January => Self {
                year: self.year - 1,
                month: Month::December,
            },
            month => Self {
                year: self.year,
                month: month.previous(),
            },
        }
    }

    /// The period `n` months before this one.
    pub fn months_back(&self, n: u32) -> Self {
        let mut period = *self;
        for _ in 0..n {
            period = period.previous();
        }
        period
    }
}

impl Serialize for ReportPeriod {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ReportPeriod", 2)?;
        state.serialize_field("year", &self.year)?;
        state.serialize_field("month", &self.month())?;
        state.end()
    }
}
