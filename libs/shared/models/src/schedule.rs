use std::fmt;
use std::str::FromStr;

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MINUTES_PER_DAY: u16 = 24 * 60;

#[derive(Error, Debug, PartialEq)]
#[error("invalid time '{0}', expected zero-padded 24-hour HH:MM")]
pub struct SlotTimeParseError(String);

/// A minute-of-day time value, rendered as zero-padded `"HH:MM"` on the wire.
/// This is the unit slot arithmetic is done in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotTime(u16);

impl SlotTime {
    pub fn from_minute_of_day(minute: u16) -> Option<Self> {
        (minute < MINUTES_PER_DAY).then_some(Self(minute))
    }

    pub fn minute_of_day(self) -> u16 {
        self.0
    }

    /// Next grid step, or `None` when it would run past midnight.
    pub fn step(self, interval_minutes: u16) -> Option<Self> {
        self.0
            .checked_add(interval_minutes)
            .and_then(Self::from_minute_of_day)
    }
}

impl FromStr for SlotTime {
    type Err = SlotTimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SlotTimeParseError(s.to_string());

        let (hours, minutes) = s.split_once(':').ok_or_else(invalid)?;
        if hours.len() != 2 || minutes.len() != 2 {
            return Err(invalid());
        }

        let hours: u16 = hours.parse().map_err(|_| invalid())?;
        let minutes: u16 = minutes.parse().map_err(|_| invalid())?;
        if hours >= 24 || minutes >= 60 {
            return Err(invalid());
        }

        Ok(Self(hours * 60 + minutes))
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl TryFrom<String> for SlotTime {
    type Error = SlotTimeParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<SlotTime> for String {
    fn from(time: SlotTime) -> Self {
        time.to_string()
    }
}

/// One weekday's configuration. Wire format matches the stored per-dentist
/// blob: `{"start":"09:00","end":"17:00"}` or `{"closed":true}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DaySchedule {
    Open { start: SlotTime, end: SlotTime },
    Closed { closed: bool },
}

impl DaySchedule {
    pub fn closed() -> Self {
        DaySchedule::Closed { closed: true }
    }

    pub fn open_hours(&self) -> Option<(SlotTime, SlotTime)> {
        match self {
            DaySchedule::Open { start, end } => Some((*start, *end)),
            DaySchedule::Closed { .. } => None,
        }
    }

    fn validate(&self, day: &'static str) -> Result<(), ScheduleValidationError> {
        match self {
            DaySchedule::Open { start, end } if start >= end => {
                Err(ScheduleValidationError::StartNotBeforeEnd { day })
            }
            DaySchedule::Open { .. } => Ok(()),
            // `{"closed": false}` is neither open nor closed; reject it.
            DaySchedule::Closed { closed: false } => {
                Err(ScheduleValidationError::InvalidClosedFlag { day })
            }
            DaySchedule::Closed { .. } => Ok(()),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum ScheduleValidationError {
    #[error("{day}: start must be strictly before end")]
    StartNotBeforeEnd { day: &'static str },

    #[error("{day}: closed flag must be true")]
    InvalidClosedFlag { day: &'static str },
}

/// Per-dentist weekly schedule with the seven fixed weekday keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkingHours {
    pub monday: DaySchedule,
    pub tuesday: DaySchedule,
    pub wednesday: DaySchedule,
    pub thursday: DaySchedule,
    pub friday: DaySchedule,
    pub saturday: DaySchedule,
    pub sunday: DaySchedule,
}

impl WorkingHours {
    pub fn for_weekday(&self, weekday: Weekday) -> &DaySchedule {
        match weekday {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
        }
    }

    pub fn days(&self) -> [(&'static str, &DaySchedule); 7] {
        [
            ("monday", &self.monday),
            ("tuesday", &self.tuesday),
            ("wednesday", &self.wednesday),
            ("thursday", &self.thursday),
            ("friday", &self.friday),
            ("saturday", &self.saturday),
            ("sunday", &self.sunday),
        ]
    }

    /// Boundary validation: every open day must have `start < end`. Fails on
    /// the first offending day so the error can name it.
    pub fn validate(&self) -> Result<(), ScheduleValidationError> {
        for (day, schedule) in self.days() {
            schedule.validate(day)?;
        }
        Ok(())
    }
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self {
            monday: DaySchedule::closed(),
            tuesday: DaySchedule::closed(),
            wednesday: DaySchedule::closed(),
            thursday: DaySchedule::closed(),
            friday: DaySchedule::closed(),
            saturday: DaySchedule::closed(),
            sunday: DaySchedule::closed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn slot(s: &str) -> SlotTime {
        s.parse().unwrap()
    }

    #[test]
    fn slot_time_parses_zero_padded_only() {
        assert_eq!(slot("09:30").minute_of_day(), 9 * 60 + 30);
        assert_eq!(slot("00:00").minute_of_day(), 0);
        assert_eq!(slot("23:59").minute_of_day(), 23 * 60 + 59);

        assert!("9:30".parse::<SlotTime>().is_err());
        assert!("09:3".parse::<SlotTime>().is_err());
        assert!("24:00".parse::<SlotTime>().is_err());
        assert!("09:60".parse::<SlotTime>().is_err());
        assert!("0930".parse::<SlotTime>().is_err());
        assert!("-1:00".parse::<SlotTime>().is_err());
    }

    #[test]
    fn slot_time_displays_zero_padded() {
        assert_eq!(slot("08:05").to_string(), "08:05");
        assert_eq!(SlotTime::from_minute_of_day(0).unwrap().to_string(), "00:00");
    }

    #[test]
    fn slot_time_step_stops_at_midnight() {
        assert_eq!(slot("23:30").step(30), None);
        assert_eq!(slot("23:00").step(30), Some(slot("23:30")));
    }

    #[test]
    fn day_schedule_round_trips_both_variants() {
        let open: DaySchedule =
            serde_json::from_value(json!({"start": "09:00", "end": "17:00"})).unwrap();
        assert_eq!(open.open_hours(), Some((slot("09:00"), slot("17:00"))));

        let closed: DaySchedule = serde_json::from_value(json!({"closed": true})).unwrap();
        assert_eq!(closed, DaySchedule::closed());

        assert_eq!(
            serde_json::to_value(&open).unwrap(),
            json!({"start": "09:00", "end": "17:00"})
        );
        assert_eq!(serde_json::to_value(&closed).unwrap(), json!({"closed": true}));
    }

    #[test]
    fn validation_names_the_offending_day() {
        let mut hours = WorkingHours::default();
        hours.monday = DaySchedule::Open {
            start: slot("10:00"),
            end: slot("09:00"),
        };

        assert_eq!(
            hours.validate(),
            Err(ScheduleValidationError::StartNotBeforeEnd { day: "monday" })
        );
        assert_eq!(
            hours.validate().unwrap_err().to_string(),
            "monday: start must be strictly before end"
        );
    }

    #[test]
    fn validation_rejects_false_closed_flag() {
        let mut hours = WorkingHours::default();
        hours.friday = DaySchedule::Closed { closed: false };

        assert_eq!(
            hours.validate(),
            Err(ScheduleValidationError::InvalidClosedFlag { day: "friday" })
        );
    }

    #[test]
    fn equal_start_and_end_is_invalid() {
        let mut hours = WorkingHours::default();
        hours.tuesday = DaySchedule::Open {
            start: slot("09:00"),
            end: slot("09:00"),
        };
        assert!(hours.validate().is_err());
    }

    #[test]
    fn for_weekday_maps_all_seven_days() {
        let mut hours = WorkingHours::default();
        hours.wednesday = DaySchedule::Open {
            start: slot("08:00"),
            end: slot("12:00"),
        };

        assert!(hours.for_weekday(Weekday::Wed).open_hours().is_some());
        assert!(hours.for_weekday(Weekday::Sun).open_hours().is_none());
    }
}
