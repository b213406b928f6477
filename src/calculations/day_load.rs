use crate::calendar::Calendar;
use crate::timeline::{Timeline, TimelineId};
use crate::work_range::WorkRangeMap;
use chrono::{Duration, NaiveDate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A member booked on two or more tasks over the same working day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayConflict {
    pub date: NaiveDate,
    pub member_id: String,
    /// Contributing tasks, sorted; always at least two.
    pub timelines: Vec<TimelineId>,
}

/// Derives per-day double-booking info from resolved ranges and resource
/// assignments. Purely advisory; rebuilt from the current map on demand.
pub struct DayLoadAggregator<'a> {
    nodes: Vec<&'a Timeline>,
    calendar: &'a Calendar,
    ranges: &'a WorkRangeMap,
}

impl<'a> DayLoadAggregator<'a> {
    pub fn new<I>(nodes: I, calendar: &'a Calendar, ranges: &'a WorkRangeMap) -> Self
    where
        I: IntoIterator<Item = &'a Timeline>,
    {
        Self {
            nodes: nodes.into_iter().collect(),
            calendar,
            ranges,
        }
    }

    /// Conflicts ordered by (date, member). A task occupies the working days
    /// of `[begin, end)`, so a zero-workload range books nothing and overlap
    /// confined to non-working days never conflicts.
    pub fn overbooked(&self) -> Vec<DayConflict> {
        let bookings: Vec<(NaiveDate, &str, &TimelineId)> = self
            .nodes
            .par_iter()
            .flat_map(|&node| self.bookings_for(node))
            .collect();

        let mut cells: BTreeMap<(NaiveDate, &str), Vec<&TimelineId>> = BTreeMap::new();
        for (date, member, id) in bookings {
            cells.entry((date, member)).or_default().push(id);
        }

        cells
            .into_iter()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|((date, member), mut ids)| {
                ids.sort();
                DayConflict {
                    date,
                    member_id: member.to_string(),
                    timelines: ids.into_iter().cloned().collect(),
                }
            })
            .collect()
    }

    fn bookings_for(&self, node: &'a Timeline) -> Vec<(NaiveDate, &'a str, &'a TimelineId)> {
        let Timeline::Task(task) = node else {
            return Vec::new();
        };
        let Some(member) = task.member_id.as_deref() else {
            return Vec::new();
        };
        let Some((begin, end)) = self.ranges.get(&task.id).and_then(|r| r.as_success()) else {
            return Vec::new();
        };
        if begin >= end {
            return Vec::new();
        }
        self.calendar
            .working_days_in_range(begin, end - Duration::days(1))
            .into_iter()
            .map(|date| (date, member, &task.id))
            .collect()
    }
}
