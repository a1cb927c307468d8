//! Relative and absolute date expressions for search bounds
//!
//! Accepted forms:
//! - `YYYY-MM-DD`, `YYYY/MM/DD` (midnight UTC)
//! - `Nm` minutes, `Nh` hours, `Nd` days, `Nw` weeks, `NM` months
//!   (uppercase), `Ny` years of 365 days
//! - `today`, `tomorrow` (start of day), `yesterday` (24 hours ago)
//! - `this-week`, `this-month`, `this-year` (start of the period)
//! - `last-week`, `last-month`, `last-year` (one period ago)
//! - weekday names or abbreviations (`friday`, `fri`) and `last-friday`

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};

use crate::error::{MailError, Result};

/// Parse `input` relative to `now`
pub fn parse_date_expression(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let raw = input.trim();
    let lower = raw.to_ascii_lowercase();
    let invalid = || MailError::invalid_argument(format!("Invalid date format: '{}'", raw));

    if let Some(date) = parse_absolute(raw) {
        return Ok(date);
    }
    if let Some(date) = parse_offset(raw, now) {
        return date.ok_or_else(invalid);
    }

    let date = match lower.as_str() {
        "today" => Some(start_of_day(now)),
        "tomorrow" => Some(start_of_day(now + Duration::days(1))),
        "yesterday" => Some(now - Duration::days(1)),
        "this-week" => {
            let monday = now - Duration::days(i64::from(now.weekday().num_days_from_monday()));
            Some(start_of_day(monday))
        }
        "last-week" => Some(now - Duration::weeks(1)),
        "this-month" => now.with_day(1).map(start_of_day),
        "last-month" => now.checked_sub_months(Months::new(1)),
        "this-year" => now.with_day(1).and_then(|d| d.with_month(1)).map(start_of_day),
        "last-year" => now.checked_sub_months(Months::new(12)),
        other => match other.strip_prefix("last-") {
            Some(day) => weekday(day).map(|w| previous_weekday(now, w, true)),
            None => weekday(other).map(|w| previous_weekday(now, w, false)),
        },
    };
    date.ok_or_else(invalid)
}

/// Reject a range whose start lies after its end
pub fn validate_range(since: Option<DateTime<Utc>>, until: Option<DateTime<Utc>>) -> Result<()> {
    match (since, until) {
        (Some(since), Some(until)) if since > until => Err(MailError::invalid_argument(
            "Invalid date range: 'since' must be before or equal to 'until'",
        )),
        _ => Ok(()),
    }
}

fn parse_absolute(input: &str) -> Option<DateTime<Utc>> {
    ["%Y-%m-%d", "%Y/%m/%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
        .map(|date| Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
}

/// `Some(None)` means the form matched but the arithmetic overflowed
fn parse_offset(input: &str, now: DateTime<Utc>) -> Option<Option<DateTime<Utc>>> {
    let unit = input.chars().last()?;
    let amount: u32 = input[..input.len() - unit.len_utf8()].parse().ok()?;
    let n = i64::from(amount);

    let date = match unit {
        'm' => Duration::try_minutes(n).and_then(|d| now.checked_sub_signed(d)),
        'h' | 'H' => Duration::try_hours(n).and_then(|d| now.checked_sub_signed(d)),
        'd' | 'D' => Duration::try_days(n).and_then(|d| now.checked_sub_signed(d)),
        'w' | 'W' => Duration::try_weeks(n).and_then(|d| now.checked_sub_signed(d)),
        'M' => now.checked_sub_months(Months::new(amount)),
        'y' | 'Y' => Duration::try_days(n * 365).and_then(|d| now.checked_sub_signed(d)),
        _ => return None,
    };
    Some(date)
}

fn weekday(name: &str) -> Option<Weekday> {
    match name {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Start of the most recent `target` day
///
/// A bare weekday naming today resolves to today only during the first
/// hour of the day; `last-` always goes back at least a week.
fn previous_weekday(now: DateTime<Utc>, target: Weekday, strictly_past: bool) -> DateTime<Utc> {
    let current = now.weekday().num_days_from_monday();
    let wanted = target.num_days_from_monday();
    let mut days_back = (current + 7 - wanted) % 7;
    if days_back == 0 && (strictly_past || now.time() >= NaiveTime::from_hms_opt(1, 0, 0).unwrap_or(NaiveTime::MIN)) {
        days_back = 7;
    }
    start_of_day(now - Duration::days(i64::from(days_back)))
}

fn start_of_day(dt: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&dt.date_naive().and_time(NaiveTime::MIN))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Wednesday 2024-06-12 15:30 UTC
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 12, 15, 30, 0).unwrap()
    }

    fn parse(input: &str) -> DateTime<Utc> {
        parse_date_expression(input, now()).unwrap()
    }

    fn ymd_hm(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_absolute_dates() {
        assert_eq!(parse("2024-01-15"), ymd_hm(2024, 1, 15, 0, 0));
        assert_eq!(parse("2024/12/31"), ymd_hm(2024, 12, 31, 0, 0));
    }

    #[test]
    fn test_relative_offsets() {
        assert_eq!(parse("30m"), ymd_hm(2024, 6, 12, 15, 0));
        assert_eq!(parse("2h"), ymd_hm(2024, 6, 12, 13, 30));
        assert_eq!(parse("7d"), ymd_hm(2024, 6, 5, 15, 30));
        assert_eq!(parse("2w"), ymd_hm(2024, 5, 29, 15, 30));
        assert_eq!(parse("1y"), ymd_hm(2023, 6, 13, 15, 30));
    }

    #[test]
    fn test_months_are_uppercase_and_clamp() {
        assert_eq!(parse("3M"), ymd_hm(2024, 3, 12, 15, 30));
        let end_of_march = ymd_hm(2024, 3, 31, 8, 0);
        assert_eq!(
            parse_date_expression("1M", end_of_march).unwrap(),
            ymd_hm(2024, 2, 29, 8, 0)
        );
    }

    #[test]
    fn test_named_periods() {
        assert_eq!(parse("today"), ymd_hm(2024, 6, 12, 0, 0));
        assert_eq!(parse("tomorrow"), ymd_hm(2024, 6, 13, 0, 0));
        assert_eq!(parse("yesterday"), ymd_hm(2024, 6, 11, 15, 30));
        assert_eq!(parse("this-week"), ymd_hm(2024, 6, 10, 0, 0));
        assert_eq!(parse("last-week"), ymd_hm(2024, 6, 5, 15, 30));
        assert_eq!(parse("this-month"), ymd_hm(2024, 6, 1, 0, 0));
        assert_eq!(parse("last-month"), ymd_hm(2024, 5, 12, 15, 30));
        assert_eq!(parse("This-Year"), ymd_hm(2024, 1, 1, 0, 0));
        assert_eq!(parse("last-year"), ymd_hm(2023, 6, 12, 15, 30));
    }

    #[test]
    fn test_weekdays() {
        assert_eq!(parse("monday"), ymd_hm(2024, 6, 10, 0, 0));
        assert_eq!(parse("fri"), ymd_hm(2024, 6, 7, 0, 0));
        // Same weekday later in the day goes back a full week
        assert_eq!(parse("wednesday"), ymd_hm(2024, 6, 5, 0, 0));
        assert_eq!(parse("last-monday"), ymd_hm(2024, 6, 10, 0, 0));
        assert_eq!(parse("last-wed"), ymd_hm(2024, 6, 5, 0, 0));
    }

    #[test]
    fn test_invalid_expressions() {
        for input in ["soon", "2024-13-01", "d", "-3d", "last-never", ""] {
            let err = parse_date_expression(input, now()).unwrap_err();
            assert!(matches!(err, MailError::InvalidArgument(_)), "{input}");
        }
    }

    #[test]
    fn test_validate_range() {
        let early = ymd_hm(2024, 1, 1, 0, 0);
        let late = ymd_hm(2024, 2, 1, 0, 0);
        assert!(validate_range(Some(early), Some(late)).is_ok());
        assert!(validate_range(Some(early), Some(early)).is_ok());
        assert!(validate_range(None, Some(early)).is_ok());
        assert!(matches!(
            validate_range(Some(late), Some(early)),
            Err(MailError::InvalidArgument(_))
        ));
    }
}
