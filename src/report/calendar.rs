//! The per-day calendar rollup for one month.

use std::collections::BTreeMap;

use rusqlite::Connection;
use serde::Serialize;

use crate::{Error, user::UserId};

use super::period::ReportPeriod;

/// A user's spending for one month, summed per calendar day.
///
/// Days with no expenses are absent from the map rather than present with a
/// zero total.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarRollup {
    /// The month the rollup covers.
    pub period: ReportPeriod,
    /// Total spent per day of the month, keyed by day number.
    pub daily_totals: BTreeMap<u8, f64>,
}

/// Sum a user's spending per calendar day over one month.
///
/// # Errors
/// This function will return an [Error::SqlError] if the query fails.
pub fn calendar_rollup(
    user_id: UserId,
    period: ReportPeriod,
    connection: &Connection,
) -> Result<CalendarRollup, Error> {
    let daily_totals = connection
        .prepare(
            "SELECT CAST(strftime('%d', date) AS INTEGER), SUM(total)
             FROM expense
             WHERE user_id = :user_id AND date >= :start AND date < :end
             GROUP BY 1
             ORDER BY 1",
        )?
        .query_map(
            rusqlite::named_params! {
                ":user_id": user_id,
                ":start": period.start(),
                ":end": period.end_exclusive(),
            },
            |row| Ok((row.get::<_, u8>(0)?, row.get::<_, f64>(1)?)),
        )?
        .collect::<Result<BTreeMap<u8, f64>, _>>()?;

    Ok(CalendarRollup {
        period,
        daily_totals,
    })
}
