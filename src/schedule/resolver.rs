use crate::content_store::{PlaylistId, WeeklyScheduleConfig};
use anyhow::{Context, Result};
use jiff::{civil::Weekday, tz::TimeZone, Timestamp, Zoned};

/// Playlist bound to the weekday of `now`, if any.
///
/// The weekday is taken in the zone carried by `now`. A missing config
/// behaves as one with every slot empty.
pub fn resolve_today(config: Option<&WeeklyScheduleConfig>, now: &Zoned) -> Option<PlaylistId> {
    config.and_then(|config| config.slot(now.weekday()))
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Monday => "monday",
        Weekday::Tuesday => "tuesday",
        Weekday::Wednesday => "wednesday",
        Weekday::Thursday => "thursday",
        Weekday::Friday => "friday",
        Weekday::Saturday => "saturday",
        Weekday::Sunday => "sunday",
    }
}

/// The zone in which "today" is decided.
#[derive(Debug, Clone)]
pub struct ScheduleClock {
    name: String,
    tz: TimeZone,
}

impl ScheduleClock {
    /// `name` is an IANA zone such as `Europe/Rome`.
    pub fn new(name: &str) -> Result<Self> {
        let tz = TimeZone::get(name).with_context(|| format!("Unknown time zone '{}'", name))?;
        Ok(ScheduleClock {
            name: name.to_string(),
            tz,
        })
    }

    pub fn utc() -> Self {
        ScheduleClock {
            name: "UTC".to_string(),
            tz: TimeZone::UTC,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn now(&self) -> Zoned {
        self.at(Timestamp::now())
    }

    pub fn at(&self, instant: Timestamp) -> Zoned {
        instant.to_zoned(self.tz.clone())
    }
}
