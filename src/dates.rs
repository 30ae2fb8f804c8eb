//! Date and month helpers shared by the managers, reports and the facade.

use chrono::{Datelike, Months, NaiveDate};

use crate::error::{Error, Result};

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

/// Today's date in the local timezone.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Parse a strict `YYYY-MM-DD` date string.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let bad = || Error::Validation(format!("date \"{s}\" must be in YYYY-MM-DD format"));
    if !has_shape(s, &[4, 2, 2]) {
        return Err(bad());
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| bad())
}

/// Parse a strict `YYYY-MM` month string into `(year, month)`.
pub fn parse_month(s: &str) -> Result<(i32, u32)> {
    let bad = || Error::Validation(format!("month \"{s}\" must be in YYYY-MM format"));
    if !has_shape(s, &[4, 2]) {
        return Err(bad());
    }
    let (year, month) = s.split_once('-').ok_or_else(bad)?;
    let year: i32 = year.parse().map_err(|_| bad())?;
    let month: u32 = month.parse().map_err(|_| bad())?;
    if !(1..=12).contains(&month) {
        return Err(bad());
    }
    Ok((year, month))
}

/// Format `(year, month)` as `YYYY-MM`.
pub fn month_label(year: i32, month: u32) -> String {
    format!("{year:04}-{month:02}")
}

/// First and last day of a calendar month.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| Error::Validation(format!("{} is not a valid month", month_label(year, month))))?;
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .ok_or_else(|| Error::Validation(format!("{} is out of range", month_label(year, month))))?;
    Ok((first, last))
}

/// The calendar month `back` months before `(year, month)`, rolling over years.
pub fn months_back(year: i32, month: u32, back: u32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 - back as i32;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

/// The first day of the month containing `date`.
pub fn start_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Dash-separated groups of ASCII digits with the given widths.
fn has_shape(s: &str, widths: &[usize]) -> bool {
    let parts: Vec<&str> = s.split('-').collect();
    parts.len() == widths.len()
        && parts
            .iter()
            .zip(widths)
            .all(|(part, &width)| part.len() == width && part.bytes().all(|b| b.is_ascii_digit()))
}
