use chrono::{DateTime, Datelike, Duration, NaiveTime, Timelike, Utc, Weekday};

/// A recurring weekly window: `window_minutes` minutes starting at `hour`:00 UTC on `weekday`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyWindow {
    pub weekday: Weekday,
    pub hour: u32,
    pub window_minutes: u32,
}

impl WeeklyWindow {
    pub fn new(weekday: Weekday, hour: u32, window_minutes: u32) -> Self {
        Self {
            weekday,
            hour,
            window_minutes,
        }
    }

    /// Start of the window containing `now`, or `None` when `now` is outside every window
    pub fn window_start(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if now.weekday() != self.weekday
            || now.hour() != self.hour
            || now.minute() >= self.window_minutes
        {
            return None;
        }

        let start = NaiveTime::from_hms_opt(self.hour, 0, 0)?;
        Some(now.date_naive().and_time(start).and_utc())
    }

    /// Next window start strictly after `now`
    pub fn next_start(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let start = NaiveTime::from_hms_opt(self.hour, 0, 0)?;
        let days_ahead = (7 + self.weekday.num_days_from_monday()
            - now.weekday().num_days_from_monday())
            % 7;

        let candidate = (now.date_naive() + Duration::days(days_ahead as i64))
            .and_time(start)
            .and_utc();

        if candidate > now {
            Some(candidate)
        } else {
            Some(candidate + Duration::weeks(1))
        }
    }
}
