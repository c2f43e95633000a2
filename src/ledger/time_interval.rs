use std::fmt;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// How a schedule repeats; combined with `repeat_every` to form the interval.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum RepeatType {
    Daily,
    #[default]
    Weekly,
    Monthly,
    Yearly,
    /// Same n-th weekday of the month as the start date ("second Saturday").
    WeekdayOfMonth,
    /// Last occurrence of the start date's weekday in the month.
    LastWeekdayOfMonth,
}

impl RepeatType {
    pub const ALL: [RepeatType; 6] = [
        RepeatType::Daily,
        RepeatType::Weekly,
        RepeatType::Monthly,
        RepeatType::Yearly,
        RepeatType::WeekdayOfMonth,
        RepeatType::LastWeekdayOfMonth,
    ];

    /// User-facing description of the repeat choice for a schedule starting on `start`.
    pub fn label(self, start: NaiveDate) -> String {
        match self {
            RepeatType::Daily => "Daily".into(),
            RepeatType::Weekly => "Weekly".into(),
            RepeatType::Monthly => "Monthly".into(),
            RepeatType::Yearly => "Yearly".into(),
            RepeatType::WeekdayOfMonth => format!(
                "Every {} {} of the month",
                ordinal_label(week_number_in_month(start)),
                weekday_label(start.weekday())
            ),
            RepeatType::LastWeekdayOfMonth => format!(
                "Every last {} of the month",
                weekday_label(start.weekday())
            ),
        }
    }

    /// Unit shown next to the interval multiplier.
    pub fn unit_label(self, every: u32) -> &'static str {
        let plural = every > 1;
        match (self, plural) {
            (RepeatType::Daily, false) => "day",
            (RepeatType::Daily, true) => "days",
            (RepeatType::Weekly, false) => "week",
            (RepeatType::Weekly, true) => "weeks",
            (RepeatType::Yearly, false) => "year",
            (RepeatType::Yearly, true) => "years",
            (_, false) => "month",
            (_, true) => "months",
        }
    }

    fn months_per_step(self) -> Option<i32> {
        match self {
            RepeatType::Daily | RepeatType::Weekly => None,
            RepeatType::Monthly
            | RepeatType::WeekdayOfMonth
            | RepeatType::LastWeekdayOfMonth => Some(1),
            RepeatType::Yearly => Some(12),
        }
    }
}

impl fmt::Display for RepeatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RepeatType::Daily => "Daily",
            RepeatType::Weekly => "Weekly",
            RepeatType::Monthly => "Monthly",
            RepeatType::Yearly => "Yearly",
            RepeatType::WeekdayOfMonth => "Weekday of month",
            RepeatType::LastWeekdayOfMonth => "Last weekday of month",
        };
        f.write_str(label)
    }
}

/// Repeat type and multiplier; `every` is validated by the schedule that owns it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeInterval {
    pub every: u32,
    pub unit: RepeatType,
}

impl TimeInterval {
    pub fn new(unit: RepeatType, every: u32) -> Self {
        Self { every, unit }
    }

    /// Date of the `index`-th step from `anchor`, computed from the anchor directly so
    /// that day clamping never accumulates. `None` when the target month has no
    /// matching weekday.
    pub fn nth_date(&self, anchor: NaiveDate, index: u32) -> Option<NaiveDate> {
        let steps = i64::from(index).checked_mul(i64::from(self.every))?;
        match self.unit {
            RepeatType::Daily => anchor.checked_add_signed(Duration::try_days(steps)?),
            RepeatType::Weekly => anchor.checked_add_signed(Duration::try_weeks(steps)?),
            RepeatType::Monthly => shift_month(anchor, i32::try_from(steps).ok()?),
            RepeatType::Yearly => shift_month(anchor, i32::try_from(steps.checked_mul(12)?).ok()?),
            RepeatType::WeekdayOfMonth => {
                let (year, month) = month_after(anchor, i32::try_from(steps).ok()?)?;
                nth_weekday_of_month(year, month, anchor.weekday(), week_number_in_month(anchor))
            }
            RepeatType::LastWeekdayOfMonth => {
                let (year, month) = month_after(anchor, i32::try_from(steps).ok()?)?;
                last_weekday_of_month(year, month, anchor.weekday())
            }
        }
    }

    /// Smallest step index whose period can reach `reference`; never overshoots.
    pub fn index_floor(&self, anchor: NaiveDate, reference: NaiveDate) -> u32 {
        if reference <= anchor {
            return 0;
        }
        let every = i64::from(self.every.max(1));
        let steps = match self.unit.months_per_step() {
            None => {
                let unit_days = if self.unit == RepeatType::Weekly { 7 } else { 1 };
                (reference - anchor).num_days() / (unit_days * every)
            }
            Some(months) => {
                let diff = month_index(reference) - month_index(anchor);
                // One period of slack: clamped or weekday-based dates can fall before the
                // calendar position of the month.
                (i64::from(diff) / (i64::from(months) * every) - 1).max(0)
            }
        };
        u32::try_from(steps).unwrap_or(u32::MAX)
    }

    /// First day of the period addressed by step `index`. For month-based intervals this
    /// is the first of the target month, which exists even when no date matches in it.
    pub fn period_start(&self, anchor: NaiveDate, index: u32) -> Option<NaiveDate> {
        match self.unit.months_per_step() {
            None => self.nth_date(anchor, index),
            Some(months) => {
                let steps = i64::from(index)
                    .checked_mul(i64::from(self.every))?
                    .checked_mul(i64::from(months))?;
                let (year, month) = month_after(anchor, i32::try_from(steps).ok()?)?;
                NaiveDate::from_ymd_opt(year, month, 1)
            }
        }
    }

    pub fn label(&self, start: NaiveDate) -> String {
        if self.every == 1 {
            return self.unit.label(start);
        }
        format!(
            "{} (every {} {})",
            self.unit.label(start),
            self.every,
            self.unit.unit_label(self.every)
        )
    }
}

fn month_index(date: NaiveDate) -> i32 {
    date.year() * 12 + date.month0() as i32
}

fn month_after(date: NaiveDate, months: i32) -> Option<(i32, u32)> {
    let idx = month_index(date).checked_add(months)?;
    Some((idx.div_euclid(12), idx.rem_euclid(12) as u32 + 1))
}

/// Moves `date` by `months`, clamping the day to the target month's length. `None`
/// past the representable calendar.
pub fn shift_month(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    let (year, month) = month_after(date, months)?;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first_next| first_next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}

/// 1-based rank of `date`'s weekday within its month (the 13th is always the second).
pub fn week_number_in_month(date: NaiveDate) -> u32 {
    (date.day() - 1) / 7 + 1
}

fn nth_weekday_of_month(year: i32, month: u32, weekday: Weekday, nth: u32) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let offset = (7 + weekday.num_days_from_monday() - first.weekday().num_days_from_monday()) % 7;
    let day = 1 + offset + (nth - 1) * 7;
    if day > days_in_month(year, month) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

fn last_weekday_of_month(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let last = NaiveDate::from_ymd_opt(year, month, days_in_month(year, month))?;
    let back = (7 + last.weekday().num_days_from_monday() - weekday.num_days_from_monday()) % 7;
    last.checked_sub_signed(Duration::days(i64::from(back)))
}

fn ordinal_label(nth: u32) -> &'static str {
    match nth {
        1 => "first",
        2 => "second",
        3 => "third",
        4 => "fourth",
        _ => "fifth",
    }
}

fn weekday_label(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
