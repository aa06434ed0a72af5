//! Five-field cron expression parsing and evaluation.
//!
//! Conventional cron syntax at minute resolution: `minute hour day-of-month
//! month day-of-week`, with `0` = Sunday. Each field accepts `*`, a bare
//! value, `a-b` ranges, `a,b,c` lists, and `a/n` or `*/n` steps (steps keep
//! the values congruent with the range start modulo `n`).
//!
//! No external cron crate is involved; expressions parse into explicit value
//! sets and evaluation walks forward minute by minute.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use thiserror::Error;

/// Upper bound on the forward search: one year of minutes.
const MAX_SEARCH_MINUTES: u32 = 525_600;

/// Error produced while parsing a cron expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CronError {
    /// The expression did not have exactly five whitespace-separated fields.
    #[error("cron expression must have 5 fields, got {0}")]
    FieldCount(usize),

    /// A field contained something that is not a number, range, list, or step.
    #[error("invalid value '{value}' in {field} field")]
    InvalidValue {
        /// Field name (e.g. `"minute"`).
        field: &'static str,
        /// The offending text.
        value: String,
    },

    /// A numeric value fell outside the field's allowed range.
    #[error("value {value} out of range {min}-{max} in {field} field")]
    OutOfRange {
        /// Field name.
        field: &'static str,
        /// The offending value.
        value: u32,
        /// Minimum allowed value.
        min: u32,
        /// Maximum allowed value.
        max: u32,
    },

    /// A step of zero was given (`a/0`).
    #[error("step must be at least 1 in {field} field")]
    ZeroStep {
        /// Field name.
        field: &'static str,
    },
}

/// A parsed five-field cron expression.
///
/// Each field is stored as the explicit set of matching values, so
/// evaluation is pure set membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronExpression {
    source: String,
    minutes: BTreeSet<u32>,
    hours: BTreeSet<u32>,
    days_of_month: BTreeSet<u32>,
    months: BTreeSet<u32>,
    days_of_week: BTreeSet<u32>,
}

impl CronExpression {
    /// Parse a five-field cron expression.
    pub fn parse(expression: &str) -> Result<Self, CronError> {
        let fields: Vec<&str> = expression.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(CronError::FieldCount(fields.len()));
        }

        Ok(Self {
            source: fields.join(" "),
            minutes: parse_field(fields[0], "minute", 0, 59)?,
            hours: parse_field(fields[1], "hour", 0, 23)?,
            days_of_month: parse_field(fields[2], "day-of-month", 1, 31)?,
            months: parse_field(fields[3], "month", 1, 12)?,
            days_of_week: parse_field(fields[4], "day-of-week", 0, 6)?,
        })
    }

    /// The normalized source expression.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the given instant satisfies all five fields, at minute
    /// granularity.
    pub fn matches(&self, instant: DateTime<Utc>) -> bool {
        self.minutes.contains(&instant.minute())
            && self.hours.contains(&instant.hour())
            && self.days_of_month.contains(&instant.day())
            && self.months.contains(&instant.month())
            && self
                .days_of_week
                .contains(&instant.weekday().num_days_from_sunday())
    }

    /// The next instant strictly after `reference` that satisfies the
    /// expression, at minute granularity (seconds are truncated).
    ///
    /// The search is bounded at one year of minutes. An expression that is
    /// never satisfiable within that window (e.g. day-of-month 31 combined
    /// with a mismatched weekday) falls back to `reference` + 60 seconds.
    /// The fallback is logged at warn so the misconfiguration is visible.
    pub fn next_after(&self, reference: DateTime<Utc>) -> DateTime<Utc> {
        let mut candidate = reference
            - Duration::seconds(i64::from(reference.second()))
            - Duration::nanoseconds(i64::from(reference.nanosecond()))
            + Duration::minutes(1);

        for _ in 0..MAX_SEARCH_MINUTES {
            if self.matches(candidate) {
                return candidate;
            }
            candidate += Duration::minutes(1);
        }

        tracing::warn!(
            "Cron expression '{}' has no match within a year of {}; falling back to +60s",
            self.source,
            reference
        );
        reference + Duration::seconds(60)
    }
}

impl FromStr for CronExpression {
    type Err = CronError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CronExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

/// Parse one cron field into its explicit set of values.
fn parse_field(
    text: &str,
    field: &'static str,
    min: u32,
    max: u32,
) -> Result<BTreeSet<u32>, CronError> {
    let mut values = BTreeSet::new();
    for part in text.split(',') {
        parse_part(part, field, min, max, &mut values)?;
    }
    if values.is_empty() {
        return Err(CronError::InvalidValue {
            field,
            value: text.to_string(),
        });
    }
    Ok(values)
}

/// Parse one comma-separated element of a field: `*`, `a`, `a-b`, or any of
/// those with a `/n` step suffix.
fn parse_part(
    part: &str,
    field: &'static str,
    min: u32,
    max: u32,
    values: &mut BTreeSet<u32>,
) -> Result<(), CronError> {
    let (base, step) = match part.split_once('/') {
        Some((base, step_text)) => {
            let step = parse_number(step_text, field, part)?;
            if step == 0 {
                return Err(CronError::ZeroStep { field });
            }
            (base, step)
        }
        None => (part, 1),
    };

    let (start, end) = if base == "*" {
        (min, max)
    } else if let Some((a, b)) = base.split_once('-') {
        let start = parse_number(a, field, part)?;
        let end = parse_number(b, field, part)?;
        if start > end {
            return Err(CronError::InvalidValue {
                field,
                value: part.to_string(),
            });
        }
        (start, end)
    } else {
        let value = parse_number(base, field, part)?;
        // A bare value with a step (`a/n`) implies the range a..=max.
        if part.contains('/') {
            (value, max)
        } else {
            (value, value)
        }
    };

    for bound in [start, end] {
        if bound < min || bound > max {
            return Err(CronError::OutOfRange {
                field,
                value: bound,
                min,
                max,
            });
        }
    }

    values.extend((start..=end).step_by(step as usize));
    Ok(())
}

fn parse_number(text: &str, field: &'static str, part: &str) -> Result<u32, CronError> {
    text.parse().map_err(|_| CronError::InvalidValue {
        field,
        value: part.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_wildcard_next_whole_minute() {
        let expr = CronExpression::parse("* * * * *").unwrap();
        assert_eq!(
            expr.next_after(utc(2024, 1, 1, 10, 30, 45)),
            utc(2024, 1, 1, 10, 31, 0)
        );
        // On an exact minute boundary the next match is strictly after.
        assert_eq!(
            expr.next_after(utc(2024, 1, 1, 10, 30, 0)),
            utc(2024, 1, 1, 10, 31, 0)
        );
    }

    #[test]
    fn test_daily_at_two() {
        let expr = CronExpression::parse("0 2 * * *").unwrap();
        assert_eq!(
            expr.next_after(utc(2024, 1, 1, 1, 0, 0)),
            utc(2024, 1, 1, 2, 0, 0)
        );
        assert_eq!(
            expr.next_after(utc(2024, 1, 1, 2, 0, 0)),
            utc(2024, 1, 2, 2, 0, 0)
        );
    }

    #[test]
    fn test_step_minutes() {
        let expr = CronExpression::parse("*/15 * * * *").unwrap();
        let mut at = utc(2024, 3, 10, 7, 2, 11);
        for _ in 0..8 {
            at = expr.next_after(at);
            assert!([0, 15, 30, 45].contains(&at.minute()), "minute {}", at.minute());
            assert_eq!(at.second(), 0);
        }
    }

    #[test]
    fn test_step_from_explicit_start() {
        // 10-30/5 keeps values congruent with the range start.
        let expr = CronExpression::parse("10-30/5 * * * *").unwrap();
        let mut at = utc(2024, 1, 1, 0, 0, 0);
        let mut minutes = Vec::new();
        for _ in 0..5 {
            at = expr.next_after(at);
            minutes.push(at.minute());
        }
        assert_eq!(minutes, vec![10, 15, 20, 25, 30]);
    }

    #[test]
    fn test_step_with_implied_range() {
        // 30/15 implies the range 30..=59.
        let expr = CronExpression::parse("30/15 * * * *").unwrap();
        assert_eq!(
            expr.next_after(utc(2024, 1, 1, 0, 0, 0)),
            utc(2024, 1, 1, 0, 30, 0)
        );
        assert_eq!(
            expr.next_after(utc(2024, 1, 1, 0, 30, 0)),
            utc(2024, 1, 1, 0, 45, 0)
        );
        assert_eq!(
            expr.next_after(utc(2024, 1, 1, 0, 45, 0)),
            utc(2024, 1, 1, 1, 30, 0)
        );
    }

    #[test]
    fn test_list_field() {
        let expr = CronExpression::parse("0 9,17 * * *").unwrap();
        assert_eq!(
            expr.next_after(utc(2024, 1, 1, 9, 0, 0)),
            utc(2024, 1, 1, 17, 0, 0)
        );
        assert_eq!(
            expr.next_after(utc(2024, 1, 1, 17, 0, 0)),
            utc(2024, 1, 2, 9, 0, 0)
        );
    }

    #[test]
    fn test_weekday_zero_is_sunday() {
        // 2024-01-01 is a Monday; the following Sunday is 2024-01-07.
        let expr = CronExpression::parse("0 12 * * 0").unwrap();
        assert_eq!(
            expr.next_after(utc(2024, 1, 1, 0, 0, 0)),
            utc(2024, 1, 7, 12, 0, 0)
        );
    }

    #[test]
    fn test_weekday_monday() {
        let expr = CronExpression::parse("0 9 * * 1").unwrap();
        assert_eq!(
            expr.next_after(utc(2024, 1, 1, 0, 0, 0)),
            utc(2024, 1, 1, 9, 0, 0)
        );
    }

    #[test]
    fn test_month_boundary() {
        let expr = CronExpression::parse("30 8 1 * *").unwrap();
        assert_eq!(
            expr.next_after(utc(2024, 1, 15, 0, 0, 0)),
            utc(2024, 2, 1, 8, 30, 0)
        );
    }

    #[test]
    fn test_unsatisfiable_falls_back_to_next_minute() {
        // February 31st never exists; the search gives up after a year.
        let expr = CronExpression::parse("0 0 31 2 *").unwrap();
        let reference = utc(2024, 6, 1, 12, 0, 30);
        assert_eq!(
            expr.next_after(reference),
            reference + Duration::seconds(60)
        );
    }

    #[test]
    fn test_field_count_errors() {
        assert_eq!(
            CronExpression::parse("* * *").unwrap_err(),
            CronError::FieldCount(3)
        );
        assert_eq!(
            CronExpression::parse("* * * * * *").unwrap_err(),
            CronError::FieldCount(6)
        );
        assert_eq!(
            CronExpression::parse("").unwrap_err(),
            CronError::FieldCount(0)
        );
    }

    #[test]
    fn test_out_of_range_errors() {
        assert!(matches!(
            CronExpression::parse("60 * * * *").unwrap_err(),
            CronError::OutOfRange { field: "minute", value: 60, .. }
        ));
        assert!(matches!(
            CronExpression::parse("* 24 * * *").unwrap_err(),
            CronError::OutOfRange { field: "hour", .. }
        ));
        assert!(matches!(
            CronExpression::parse("* * 0 * *").unwrap_err(),
            CronError::OutOfRange { field: "day-of-month", .. }
        ));
        assert!(matches!(
            CronExpression::parse("* * * 13 *").unwrap_err(),
            CronError::OutOfRange { field: "month", .. }
        ));
        assert!(matches!(
            CronExpression::parse("* * * * 7").unwrap_err(),
            CronError::OutOfRange { field: "day-of-week", .. }
        ));
    }

    #[test]
    fn test_invalid_value_errors() {
        assert!(matches!(
            CronExpression::parse("abc * * * *").unwrap_err(),
            CronError::InvalidValue { field: "minute", .. }
        ));
        // Reversed range.
        assert!(matches!(
            CronExpression::parse("30-10 * * * *").unwrap_err(),
            CronError::InvalidValue { .. }
        ));
        assert_eq!(
            CronExpression::parse("*/0 * * * *").unwrap_err(),
            CronError::ZeroStep { field: "minute" }
        );
    }

    #[test]
    fn test_source_is_normalized() {
        let expr = CronExpression::parse("  0   2 * *   *  ").unwrap();
        assert_eq!(expr.source(), "0 2 * * *");
        assert_eq!(expr.to_string(), "0 2 * * *");
    }

    #[test]
    fn test_from_str() {
        let expr: CronExpression = "5 4 * * *".parse().unwrap();
        assert_eq!(
            expr.next_after(utc(2024, 1, 1, 0, 0, 0)),
            utc(2024, 1, 1, 4, 5, 0)
        );
    }
}
