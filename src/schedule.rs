use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use crate::error::ScheduleError;
use crate::models::Schedule;

/// Parses a 24-hour "HH:MM" time of day.
pub fn parse_time(raw: &str) -> Result<NaiveTime, ScheduleError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|_| ScheduleError::InvalidTime(raw.to_string()))
}

impl Schedule {
    /// Checks that the anchor is in range for the frequency.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        match *self {
            Schedule::Daily => Ok(()),
            Schedule::Weekly { day_of_week } | Schedule::Biweekly { day_of_week } => {
                if day_of_week <= 6 {
                    Ok(())
                } else {
                    Err(ScheduleError::InvalidDayOfWeek(day_of_week))
                }
            }
            Schedule::Monthly { day_of_month } => {
                if (1..=31).contains(&day_of_month) {
                    Ok(())
                } else {
                    Err(ScheduleError::InvalidDayOfMonth(day_of_month))
                }
            }
        }
    }
}

/// Computes the next occurrence of `schedule` at `time`, strictly after `now`.
///
/// - **Daily**: today at `time`, or tomorrow if that has passed.
/// - **Weekly**: the next day whose weekday matches the anchor. When today is
///   the anchor day but `time` has passed, the result is one week out.
/// - **Monthly**: the anchor day of this month, or of next month if that has
///   passed. Anchors past the end of a month clamp to its last day.
///
/// `now` is local wall-clock time; seconds are dropped from `time`.
pub fn compute_next_run(
    schedule: &Schedule,
    time: NaiveTime,
    now: NaiveDateTime,
) -> Result<NaiveDateTime, ScheduleError> {
    schedule.validate()?;
    let time = NaiveTime::from_hms_opt(time.hour(), time.minute(), 0)
        .ok_or(ScheduleError::OutOfRange)?;
    let today = now.date();
    let candidate = today.and_time(time);

    let next = match *schedule {
        Schedule::Daily => {
            if candidate <= now {
                candidate + Duration::days(1)
            } else {
                candidate
            }
        }
        Schedule::Weekly { day_of_week } => {
            let current = today.weekday().num_days_from_sunday() as i64;
            let mut days_until = (day_of_week as i64 - current).rem_euclid(7);
            if days_until == 0 && candidate <= now {
                days_until = 7;
            }
            candidate + Duration::days(days_until)
        }
        Schedule::Biweekly { .. } => {
            return Err(ScheduleError::UnsupportedFrequency("biweekly"));
        }
        Schedule::Monthly { day_of_month } => {
            let this_month = clamped_date(today.year(), today.month(), day_of_month)?.and_time(time);
            if this_month <= now {
                let (year, month) = if today.month() == 12 {
                    (today.year() + 1, 1)
                } else {
                    (today.year(), today.month() + 1)
                };
                clamped_date(year, month, day_of_month)?.and_time(time)
            } else {
                this_month
            }
        }
    };
    Ok(next)
}

/// [`compute_next_run`] against the current local time.
pub fn next_run_from_now(schedule: &Schedule, time: NaiveTime) -> Result<NaiveDateTime, ScheduleError> {
    compute_next_run(schedule, time, Local::now().naive_local())
}

/// The `day` of the given month, or the month's last day if it is shorter.
fn clamped_date(year: i32, month: u32, day: u8) -> Result<NaiveDate, ScheduleError> {
    let last = days_in_month(year, month)?;
    NaiveDate::from_ymd_opt(year, month, (day as u32).min(last)).ok_or(ScheduleError::OutOfRange)
}

fn days_in_month(year: i32, month: u32) -> Result<u32, ScheduleError> {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    first_of_next
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .ok_or(ScheduleError::OutOfRange)
}
