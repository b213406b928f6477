use crate::calendar::Calendar;
use crate::timeline::{TaskTimeline, Timeline, TimelineId};
use crate::work_range::{WorkRange, WorkRangeMap};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// How a task's workload is added onto its begin date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadMode {
    /// Raw elapsed days: `end = begin + workload`.
    #[default]
    Elapsed,
    /// Only calendar working days consume workload.
    WorkingDays,
}

/// Computes a work range for every node of a flattened timeline set.
///
/// Tasks with no predecessors are seeded from their pinned start; everything
/// else is derived by a bounded fixed-point iteration over the dependency
/// overlay and the containment tree. The input graph may be cyclic: members
/// of an unsatisfiable cycle never resolve and are simply absent from the
/// output map once the iteration budget runs out.
///
/// All scratch state is call-local; the resolver can be rebuilt and rerun
/// freely and two runs over the same input yield identical maps regardless
/// of node order.
pub struct WorkRangeResolver<'a> {
    nodes: Vec<&'a Timeline>,
    calendar: &'a Calendar,
    max_iterations: usize,
    workload_mode: WorkloadMode,
}

impl<'a> WorkRangeResolver<'a> {
    /// `nodes` must list every node exactly once, in any order.
    /// `max_iterations` is clamped to at least one pass.
    pub fn new<I>(nodes: I, calendar: &'a Calendar, max_iterations: usize) -> Self
    where
        I: IntoIterator<Item = &'a Timeline>,
    {
        Self {
            nodes: nodes.into_iter().collect(),
            calendar,
            max_iterations: max_iterations.max(1),
            workload_mode: WorkloadMode::default(),
        }
    }

    pub fn with_workload_mode(mut self, mode: WorkloadMode) -> Self {
        self.workload_mode = mode;
        self
    }

    pub fn resolve(&self) -> WorkRangeMap {
        let mut map = WorkRangeMap::new();

        // Seed tasks that need no propagation.
        for node in &self.nodes {
            if let Timeline::Task(task) = node {
                if task.previous.is_empty() {
                    map.insert(task.id.clone(), self.seed_task(task));
                }
            }
        }

        // One-hop fast path: a task whose sole predecessor was seeded above.
        // Results are staged so the pass only sees seed-phase entries.
        let mut staged: Vec<(TimelineId, WorkRange)> = Vec::new();
        for node in &self.nodes {
            if let Timeline::Task(task) = node {
                if task.previous.len() == 1 && task.pinned_start.is_none() && !map.contains(&task.id)
                {
                    if let Some(WorkRange::Success { end, .. }) = map.get(&task.previous[0]) {
                        let begin = *end;
                        let end = self.finish_from(begin, task.workload_days);
                        staged.push((task.id.clone(), WorkRange::success(begin, end)));
                    }
                }
            }
        }
        for (id, range) in staged.drain(..) {
            map.insert(id, range);
        }

        let mut remaining: Vec<&Timeline> = self
            .nodes
            .iter()
            .copied()
            .filter(|node| !map.contains(node.id()))
            .collect();

        for pass in 0..self.max_iterations {
            if remaining.is_empty() {
                break;
            }
            // Rules are evaluated against the map as committed at pass
            // start; results merge afterwards, so traversal order within a
            // pass cannot change the outcome.
            let mut unresolved: Vec<&Timeline> = Vec::new();
            for node in remaining {
                match self.step(node, &map) {
                    Some(range) => staged.push((node.id().clone(), range)),
                    None => unresolved.push(node),
                }
            }
            trace!(
                pass,
                settled = staged.len(),
                unresolved = unresolved.len(),
                "resolution pass"
            );
            if staged.is_empty() {
                // A stalled pass stays stalled; further passes are no-ops.
                remaining = unresolved;
                break;
            }
            for (id, range) in staged.drain(..) {
                map.insert(id, range);
            }
            remaining = unresolved;
        }

        debug!(
            nodes = self.nodes.len(),
            resolved = map.len(),
            unresolved = remaining.len(),
            "work range resolution finished"
        );
        map
    }

    fn seed_task(&self, task: &TaskTimeline) -> WorkRange {
        match task.pinned_start {
            Some(begin) => WorkRange::success(begin, self.finish_from(begin, task.workload_days)),
            None => WorkRange::NoInput,
        }
    }

    fn step(&self, node: &Timeline, map: &WorkRangeMap) -> Option<WorkRange> {
        match node {
            Timeline::Task(task) => self.step_task(task, map),
            Timeline::Group(group) => Self::step_group(&group.children, map),
        }
    }

    fn step_task(&self, task: &TaskTimeline, map: &WorkRangeMap) -> Option<WorkRange> {
        if task.references_self() {
            return Some(WorkRange::SelfReference);
        }
        if task.previous.is_empty() {
            return Some(self.seed_task(task));
        }

        // A predecessor already known to carry no input decides the task
        // even while other predecessors are still pending.
        let resolved: Vec<Option<&WorkRange>> =
            task.previous.iter().map(|prev| map.get(prev)).collect();
        if resolved
            .iter()
            .any(|entry| matches!(entry, Some(WorkRange::NoInput)))
        {
            return Some(WorkRange::RelationNoInput);
        }
        if resolved.iter().any(Option::is_none) {
            return None;
        }
        if resolved
            .iter()
            .any(|entry| entry.is_some_and(|range| range.is_error()))
        {
            return Some(WorkRange::RelationError);
        }

        let max_prev_end = resolved
            .iter()
            .filter_map(|entry| entry.and_then(WorkRange::as_success))
            .map(|(_, end)| end)
            .max()?;
        let begin = match task.pinned_start {
            Some(pinned) => pinned.max(max_prev_end),
            None => max_prev_end,
        };
        Some(WorkRange::success(
            begin,
            self.finish_from(begin, task.workload_days),
        ))
    }

    fn step_group(children: &[TimelineId], map: &WorkRangeMap) -> Option<WorkRange> {
        if children.is_empty() {
            return Some(WorkRange::NoChildren);
        }
        let resolved: Vec<Option<&WorkRange>> =
            children.iter().map(|child| map.get(child)).collect();
        if resolved.iter().any(Option::is_none) {
            return None;
        }
        if resolved
            .iter()
            .any(|entry| entry.is_some_and(|range| range.is_error()))
        {
            return Some(WorkRange::RelationError);
        }

        let mut span: Option<(NaiveDate, NaiveDate)> = None;
        for (begin, end) in resolved
            .iter()
            .filter_map(|entry| entry.and_then(WorkRange::as_success))
        {
            span = Some(match span {
                Some((lo, hi)) => (lo.min(begin), hi.max(end)),
                None => (begin, end),
            });
        }
        span.map(|(begin, end)| WorkRange::success(begin, end))
    }

    fn finish_from(&self, begin: NaiveDate, workload_days: i64) -> NaiveDate {
        match self.workload_mode {
            WorkloadMode::Elapsed => begin + Duration::days(workload_days),
            WorkloadMode::WorkingDays => self.calendar.add_working_days(begin, workload_days),
        }
    }
}
