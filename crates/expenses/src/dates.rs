//! Calendar helpers and the UTC-midnight compensation.
//!
//! The backend stores expense dates as UTC midnight. Read back in a timezone
//! west of UTC they would land on the previous day, so every stored value is
//! shifted by the local offset before its calendar fields are used.

use chrono::{
    DateTime, Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeDelta, TimeZone,
    Utc,
};
use chrono_tz::Tz;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Parses a stored date into an instant.
///
/// Accepted shapes: RFC 3339, RFC 2822 (what the backend's JSON encoder emits
/// for dates), a bare `YYYY-MM-DD` (UTC midnight) and a naive date-time, which
/// is read as wall-clock time in `tz`.
pub fn parse_instant(raw: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc));
    }
    if let Ok(instant) = DateTime::parse_from_rfc2822(raw) {
        return Some(instant.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.and_time(NaiveTime::MIN).and_utc());
    }

    NAIVE_FORMATS.iter().find_map(|format| {
        let naive = NaiveDateTime::parse_from_str(raw, format).ok()?;
        tz.from_local_datetime(&naive)
            .earliest()
            .map(|local| local.with_timezone(&Utc))
    })
}

/// Wall-clock date-time of a stored date after adding the local offset back.
///
/// The instant is moved by `utc - local` (minutes west of UTC, as observed at
/// that instant) and then read in `tz`. Returns `None` for empty or
/// unparsable input.
pub fn adjust_for_timezone(raw: &str, tz: Tz) -> Option<NaiveDateTime> {
    let instant = parse_instant(raw, tz)?;
    let local_minus_utc = tz
        .offset_from_utc_datetime(&instant.naive_utc())
        .fix()
        .local_minus_utc();
    let shifted = instant + TimeDelta::seconds(i64::from(-local_minus_utc));
    Some(shifted.with_timezone(&tz).naive_local())
}

/// Number of days in `month` (1-12) of `year`; `0` for an invalid month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return 0;
    };
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .map_or(0, |last| last.day())
}

/// English month name for `month` (1-12).
pub fn month_name(month: u32) -> Option<&'static str> {
    let index = usize::try_from(month.checked_sub(1)?).ok()?;
    MONTH_NAMES.get(index).copied()
}

/// Name of the month `offset` months before `today`.
pub fn relative_month_name(today: NaiveDate, offset: u32) -> &'static str {
    let date = today
        .checked_sub_months(Months::new(offset))
        .unwrap_or(today);
    MONTH_NAMES[date.month0() as usize]
}

/// First and last day of `month` (1-12) of `year`.
pub fn month_date_range(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let end = NaiveDate::from_ymd_opt(year, month, days_in_month(year, month))?;
    Some((start, end))
}

pub fn is_current_month(date: NaiveDate, today: NaiveDate) -> bool {
    date.year() == today.year() && date.month() == today.month()
}

pub fn is_current_year(date: NaiveDate, today: NaiveDate) -> bool {
    date.year() == today.year()
}

/// `January 5, 2024`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// `Jan 5, 2024`
pub fn format_short_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Compact range label.
///
/// - same month: `Jan 1 - 31, 2023`
/// - same year: `Jan 1 - Feb 3, 2023`
/// - otherwise: `Dec 30, 2023 - Jan 2, 2024`
pub fn format_date_range(start: NaiveDate, end: NaiveDate) -> String {
    if start.year() == end.year() && start.month() == end.month() {
        format!(
            "{} {} - {}, {}",
            start.format("%b"),
            start.day(),
            end.day(),
            start.year()
        )
    } else if start.year() == end.year() {
        format!(
            "{} {} - {} {}, {}",
            start.format("%b"),
            start.day(),
            end.format("%b"),
            end.day(),
            start.year()
        )
    } else {
        format!("{} - {}", format_short_date(start), format_short_date(end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn utc_midnight_keeps_its_day_west_of_utc() {
        let adjusted = adjust_for_timezone("2024-01-15", chrono_tz::America::New_York).unwrap();
        assert_eq!(adjusted.date(), ymd(2024, 1, 15));
        assert_eq!(adjusted.hour(), 0);
    }

    #[test]
    fn utc_midnight_keeps_its_day_east_of_utc() {
        let adjusted = adjust_for_timezone("2024-01-15", chrono_tz::Asia::Tokyo).unwrap();
        assert_eq!(adjusted.date(), ymd(2024, 1, 15));
    }

    #[test]
    fn http_dates_are_accepted() {
        let adjusted = adjust_for_timezone(
            "Mon, 15 Jan 2024 00:00:00 GMT",
            chrono_tz::America::Los_Angeles,
        )
        .unwrap();
        assert_eq!(adjusted.date(), ymd(2024, 1, 15));
    }

    #[test]
    fn rfc3339_dates_are_accepted() {
        let adjusted =
            adjust_for_timezone("2024-03-01T00:00:00Z", chrono_tz::Europe::Rome).unwrap();
        assert_eq!(adjusted.date(), ymd(2024, 3, 1));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(adjust_for_timezone("", chrono_tz::UTC).is_none());
        assert!(adjust_for_timezone("not a date", chrono_tz::UTC).is_none());
    }

    #[test]
    fn days_in_month_handles_leap_years() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(2023, 12), 31);
        assert_eq!(days_in_month(2023, 4), 30);
        assert_eq!(days_in_month(2023, 13), 0);
        assert_eq!(days_in_month(2023, 0), 0);
    }

    #[test]
    fn month_names() {
        assert_eq!(month_name(1), Some("January"));
        assert_eq!(month_name(12), Some("December"));
        assert_eq!(month_name(0), None);
        assert_eq!(month_name(13), None);
        assert_eq!(relative_month_name(ymd(2024, 1, 10), 1), "December");
        assert_eq!(relative_month_name(ymd(2024, 3, 31), 1), "February");
    }

    #[test]
    fn month_range_spans_the_whole_month() {
        assert_eq!(
            month_date_range(2024, 2),
            Some((ymd(2024, 2, 1), ymd(2024, 2, 29)))
        );
        assert_eq!(month_date_range(2024, 0), None);
    }

    #[test]
    fn formats() {
        assert_eq!(format_date(ymd(2024, 1, 5)), "January 5, 2024");
        assert_eq!(format_short_date(ymd(2024, 1, 5)), "Jan 5, 2024");
        assert_eq!(
            format_date_range(ymd(2023, 1, 1), ymd(2023, 1, 31)),
            "Jan 1 - 31, 2023"
        );
        assert_eq!(
            format_date_range(ymd(2023, 1, 1), ymd(2023, 2, 3)),
            "Jan 1 - Feb 3, 2023"
        );
        assert_eq!(
            format_date_range(ymd(2023, 12, 30), ymd(2024, 1, 2)),
            "Dec 30, 2023 - Jan 2, 2024"
        );
    }
}
