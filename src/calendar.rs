use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Classification of an explicit calendar event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Holiday,
    Anniversary,
}

/// An explicit dated entry: a display label plus its classification.
/// Every event makes its date non-working, independent of the weekly pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayEvent {
    pub display: String,
    pub kind: EventKind,
}

impl HolidayEvent {
    pub fn new(display: impl Into<String>, kind: EventKind) -> Self {
        Self {
            display: display.into(),
            kind,
        }
    }

    pub fn holiday(display: impl Into<String>) -> Self {
        Self::new(display, EventKind::Holiday)
    }

    pub fn anniversary(display: impl Into<String>) -> Self {
        Self::new(display, EventKind::Anniversary)
    }
}

/// Non-working-day predicate: a weekly pattern of regular holidays plus
/// explicit dated events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calendar {
    regular_holidays: HashSet<Weekday>,
    events: BTreeMap<NaiveDate, HolidayEvent>,
}

/// Sorted, deduplicated serialization form of a [`Calendar`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarConfig {
    regular_holidays: Vec<Weekday>,
    events: Vec<CalendarEventEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEventEntry {
    pub date: NaiveDate,
    pub display: String,
    pub kind: EventKind,
}

impl Default for Calendar {
    fn default() -> Self {
        Self::with_weekend()
    }
}

impl Calendar {
    const ALL_WEEKDAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    /// Calendar with a Sat/Sun weekend and no explicit events.
    pub fn with_weekend() -> Self {
        Self {
            regular_holidays: HashSet::from([Weekday::Sat, Weekday::Sun]),
            events: BTreeMap::new(),
        }
    }

    /// Calendar with every day working and no events.
    pub fn empty() -> Self {
        Self {
            regular_holidays: HashSet::new(),
            events: BTreeMap::new(),
        }
    }

    pub fn custom<I, J>(regular_holidays: I, events: J) -> Self
    where
        I: IntoIterator<Item = Weekday>,
        J: IntoIterator<Item = (NaiveDate, HolidayEvent)>,
    {
        let mut calendar = Self::empty();
        calendar.set_regular_holidays(regular_holidays);
        calendar.events = events.into_iter().collect();
        calendar
    }

    pub fn from_config(config: &CalendarConfig) -> Self {
        Self::custom(
            config.regular_holidays.iter().copied(),
            config.events.iter().map(|entry| {
                (
                    entry.date,
                    HolidayEvent::new(entry.display.clone(), entry.kind),
                )
            }),
        )
    }

    pub fn to_config(&self) -> CalendarConfig {
        CalendarConfig::from(self)
    }

    /// Replace the weekly non-working pattern.
    pub fn set_regular_holidays<I: IntoIterator<Item = Weekday>>(&mut self, days: I) {
        let regulars: HashSet<Weekday> = days.into_iter().collect();
        if regulars.len() == Self::ALL_WEEKDAYS.len() {
            panic!("Calendar requires at least one working weekday");
        }
        self.regular_holidays = regulars;
    }

    pub fn regular_holidays(&self) -> impl Iterator<Item = Weekday> + '_ {
        Self::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| self.regular_holidays.contains(day))
    }

    /// Add or replace the event on a date.
    pub fn add_event(&mut self, date: NaiveDate, event: HolidayEvent) {
        self.events.insert(date, event);
    }

    pub fn remove_event(&mut self, date: NaiveDate) -> Option<HolidayEvent> {
        self.events.remove(&date)
    }

    pub fn event(&self, date: NaiveDate) -> Option<&HolidayEvent> {
        self.events.get(&date)
    }

    pub fn events(&self) -> impl Iterator<Item = (NaiveDate, &HolidayEvent)> {
        self.events.iter().map(|(date, event)| (*date, event))
    }

    /// True if the weekday is a regular holiday or the date carries an event.
    pub fn is_non_working_day(&self, date: NaiveDate) -> bool {
        self.regular_holidays.contains(&date.weekday()) || self.events.contains_key(&date)
    }

    /// Working days in the closed interval `[begin, end]`.
    pub fn working_days_in_range(&self, begin: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        let mut days = Vec::new();
        let mut current = begin;
        while current <= end {
            if !self.is_non_working_day(current) {
                days.push(current);
            }
            current = current + Duration::days(1);
        }
        days
    }

    /// Count working days in the closed interval `[begin, end]`.
    pub fn count_working_days(&self, begin: NaiveDate, end: NaiveDate) -> i64 {
        let mut count = 0;
        let mut current = begin;
        while current <= end {
            if !self.is_non_working_day(current) {
                count += 1;
            }
            current = current + Duration::days(1);
        }
        count
    }

    /// Advance `from` by `days` working days; non-working days are skipped
    /// without consuming workload. The weekly pattern always keeps at least
    /// one working weekday, so the walk terminates.
    pub fn add_working_days(&self, from: NaiveDate, days: i64) -> NaiveDate {
        let mut current = from;
        let mut remaining = days;
        while remaining > 0 {
            if !self.is_non_working_day(current) {
                remaining -= 1;
            }
            current = current + Duration::days(1);
        }
        current
    }
}

impl CalendarConfig {
    pub fn new<I, J>(regular_holidays: I, events: J) -> Self
    where
        I: IntoIterator<Item = Weekday>,
        J: IntoIterator<Item = CalendarEventEntry>,
    {
        let mut regulars: Vec<Weekday> = regular_holidays.into_iter().collect();
        regulars.sort_by_key(|wd| wd.num_days_from_monday());
        regulars.dedup_by(|a, b| a.num_days_from_monday() == b.num_days_from_monday());

        let mut events: Vec<CalendarEventEntry> = events.into_iter().collect();
        events.sort_by_key(|entry| entry.date);
        events.dedup_by(|a, b| a.date == b.date);

        Self {
            regular_holidays: regulars,
            events,
        }
    }

    pub fn regular_holidays(&self) -> &[Weekday] {
        &self.regular_holidays
    }

    pub fn events(&self) -> &[CalendarEventEntry] {
        &self.events
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        CalendarConfig::from(&Calendar::default())
    }
}

impl From<&Calendar> for CalendarConfig {
    fn from(calendar: &Calendar) -> Self {
        let mut regulars: Vec<Weekday> = calendar.regular_holidays.iter().copied().collect();
        regulars.sort_by_key(|wd| wd.num_days_from_monday());

        let events = calendar
            .events
            .iter()
            .map(|(date, event)| CalendarEventEntry {
                date: *date,
                display: event.display.clone(),
                kind: event.kind,
            })
            .collect();

        Self {
            regular_holidays: regulars,
            events,
        }
    }
}
