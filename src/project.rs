use crate::calculations::day_load::{DayConflict, DayLoadAggregator};
use crate::calculations::resolver::{WorkRangeResolver, WorkloadMode};
use crate::calendar::{Calendar, CalendarConfig, HolidayEvent};
use crate::graph::DependencyGraph;
use crate::metadata::ProjectMetadata;
use crate::timeline::{GroupTimeline, TaskTimeline, Timeline, TimelineId};
use crate::timeline_validation::{self, TimelineValidationError};
use crate::tree::{TimelineTree, TreeError};
use crate::work_range::{WorkRange, WorkRangeMap};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveSummary {
    pub node_count: usize,
    pub success_count: usize,
    pub error_count: usize,
    /// Nodes without a map entry after the iteration budget ran out, sorted.
    pub unresolved: Vec<TimelineId>,
    pub begin: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl ResolveSummary {
    pub fn to_status_line(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("nodes={}", self.node_count));
        parts.push(format!("success={}", self.success_count));
        if self.error_count > 0 {
            parts.push(format!("errors={}", self.error_count));
        }
        if let (Some(begin), Some(end)) = (self.begin, self.end) {
            parts.push(format!("span={begin}..{end}"));
        }
        if !self.unresolved.is_empty() {
            let chain = self
                .unresolved
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",");
            parts.push(format!("unresolved={chain}"));
        }
        parts.join(", ")
    }
}

#[derive(Debug, Clone)]
pub enum ProjectError {
    Tree(TreeError),
    Validation(String),
    InvalidWorkload { id: TimelineId, days: i64 },
    InvalidProgress { id: TimelineId, progress: f64 },
    UnknownPredecessor { id: TimelineId, previous: TimelineId },
}

impl fmt::Display for ProjectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectError::Tree(err) => write!(f, "{err}"),
            ProjectError::Validation(message) => write!(f, "{message}"),
            ProjectError::InvalidWorkload { id, days } => {
                write!(f, "task {id} cannot take negative workload {days}")
            }
            ProjectError::InvalidProgress { id, progress } => {
                write!(f, "task {id} progress {progress} must be between 0 and 1")
            }
            ProjectError::UnknownPredecessor { id, previous } => {
                write!(f, "task {id} references unknown predecessor {previous}")
            }
        }
    }
}

impl std::error::Error for ProjectError {}

impl From<TreeError> for ProjectError {
    fn from(value: TreeError) -> Self {
        ProjectError::Tree(value)
    }
}

impl From<TimelineValidationError> for ProjectError {
    fn from(value: TimelineValidationError) -> Self {
        ProjectError::Validation(value.to_string())
    }
}

/// The editable document: timeline tree, calendar, metadata, and the latest
/// work-range map. Every edit that is a scheduling input ends in a full
/// recomputation of the map; it is never patched in place.
#[derive(Debug)]
pub struct Project {
    metadata: ProjectMetadata,
    tree: TimelineTree,
    calendar: Calendar,
    workload_mode: WorkloadMode,
    iteration_budget: Option<usize>,
    ranges: WorkRangeMap,
}

impl Project {
    pub fn new() -> Self {
        Self::new_with_metadata(ProjectMetadata::default())
    }

    pub fn new_with_metadata(metadata: ProjectMetadata) -> Self {
        let tree = TimelineTree::new(metadata.project_name.clone());
        Self::from_parts(metadata, Calendar::default(), WorkloadMode::default(), tree)
    }

    pub(crate) fn from_parts(
        metadata: ProjectMetadata,
        calendar: Calendar,
        workload_mode: WorkloadMode,
        tree: TimelineTree,
    ) -> Self {
        let mut project = Self {
            metadata,
            tree,
            calendar,
            workload_mode,
            iteration_budget: None,
            ranges: WorkRangeMap::new(),
        };
        project.refresh();
        project
    }

    pub fn metadata(&self) -> &ProjectMetadata {
        &self.metadata
    }

    pub fn tree(&self) -> &TimelineTree {
        &self.tree
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn calendar_config(&self) -> CalendarConfig {
        self.calendar.to_config()
    }

    pub fn workload_mode(&self) -> WorkloadMode {
        self.workload_mode
    }

    /// Pass budget for resolution; `None` falls back to the node count,
    /// which covers any acyclic dependency chain.
    pub fn iteration_budget(&self) -> Option<usize> {
        self.iteration_budget
    }

    pub fn work_ranges(&self) -> &WorkRangeMap {
        &self.ranges
    }

    /// The range for a node this document knows: the map entry, or
    /// `Unresolved` when the map omitted the node (exhausted budget).
    /// `None` only for foreign ids.
    pub fn work_range(&self, id: &TimelineId) -> Option<WorkRange> {
        if !self.tree.contains(id) {
            return None;
        }
        Some(
            self.ranges
                .get(id)
                .cloned()
                .unwrap_or(WorkRange::Unresolved),
        )
    }

    /// Only tasks without predecessors expose an editable start date;
    /// everything else shows computed, read-only dates.
    pub fn can_edit_start(&self, id: &TimelineId) -> bool {
        self.tree
            .get(id)
            .and_then(Timeline::as_task)
            .is_some_and(|task| task.previous.is_empty())
    }

    pub fn set_metadata(&mut self, metadata: ProjectMetadata) {
        self.metadata = metadata;
    }

    pub fn add_task(
        &mut self,
        parent: &TimelineId,
        task: TaskTimeline,
    ) -> Result<(), ProjectError> {
        let node = Timeline::Task(task);
        timeline_validation::validate_node(&node)?;
        if let Timeline::Task(task) = &node {
            for prev in &task.previous {
                if *prev != task.id && !self.tree.contains(prev) {
                    return Err(ProjectError::UnknownPredecessor {
                        id: task.id.clone(),
                        previous: prev.clone(),
                    });
                }
            }
        }
        self.tree.insert(parent, node)?;
        self.refresh();
        Ok(())
    }

    pub fn add_group(
        &mut self,
        parent: &TimelineId,
        group: GroupTimeline,
    ) -> Result<(), ProjectError> {
        let node = Timeline::Group(group);
        timeline_validation::validate_node(&node)?;
        self.tree.insert(parent, node)?;
        self.refresh();
        Ok(())
    }

    /// Remove a node with its subtree; surviving tasks lose any predecessor
    /// reference into the removed set.
    pub fn remove_timeline(&mut self, id: &TimelineId) -> Result<(), ProjectError> {
        let removed = self.tree.remove(id)?;
        self.tree.strip_previous(&removed);
        self.refresh();
        Ok(())
    }

    pub fn move_timeline(
        &mut self,
        id: &TimelineId,
        new_parent: &TimelineId,
        position: Option<usize>,
    ) -> Result<(), ProjectError> {
        self.tree.move_to(id, new_parent, position)?;
        self.refresh();
        Ok(())
    }

    pub fn set_subject(
        &mut self,
        id: &TimelineId,
        subject: impl Into<String>,
    ) -> Result<(), ProjectError> {
        self.tree
            .get_mut(id)
            .ok_or_else(|| TreeError::UnknownTimeline(id.clone()))?
            .set_subject(subject);
        Ok(())
    }

    pub fn set_comment(
        &mut self,
        id: &TimelineId,
        comment: impl Into<String>,
    ) -> Result<(), ProjectError> {
        self.tree
            .get_mut(id)
            .ok_or_else(|| TreeError::UnknownTimeline(id.clone()))?
            .set_comment(comment);
        Ok(())
    }

    pub fn set_workload(&mut self, id: &TimelineId, days: i64) -> Result<(), ProjectError> {
        if days < 0 {
            return Err(ProjectError::InvalidWorkload {
                id: id.clone(),
                days,
            });
        }
        self.tree.task_mut(id)?.workload_days = days;
        self.refresh();
        Ok(())
    }

    pub fn set_pinned_start(
        &mut self,
        id: &TimelineId,
        date: Option<NaiveDate>,
    ) -> Result<(), ProjectError> {
        self.tree.task_mut(id)?.pinned_start = date;
        self.refresh();
        Ok(())
    }

    /// Replace a task's predecessor list. The list is an ordered set: later
    /// duplicates are dropped. A task may list itself (the resolver reports
    /// it); any other unknown target is rejected.
    pub fn set_previous(
        &mut self,
        id: &TimelineId,
        previous: Vec<TimelineId>,
    ) -> Result<(), ProjectError> {
        self.tree.task(id)?;
        let mut deduped: Vec<TimelineId> = Vec::with_capacity(previous.len());
        for prev in previous {
            if deduped.contains(&prev) {
                continue;
            }
            if prev != *id && !self.tree.contains(&prev) {
                return Err(ProjectError::UnknownPredecessor {
                    id: id.clone(),
                    previous: prev,
                });
            }
            deduped.push(prev);
        }
        self.tree.task_mut(id)?.previous = deduped;
        self.refresh();
        Ok(())
    }

    pub fn set_member(
        &mut self,
        id: &TimelineId,
        member_id: Option<String>,
    ) -> Result<(), ProjectError> {
        if let Some(member) = &member_id {
            if member.trim().is_empty() {
                return Err(ProjectError::Validation(format!(
                    "task {id} cannot take an empty member id"
                )));
            }
        }
        self.tree.task_mut(id)?.member_id = member_id;
        self.refresh();
        Ok(())
    }

    pub fn set_progress(&mut self, id: &TimelineId, progress: f64) -> Result<(), ProjectError> {
        if !progress.is_finite() || !(0.0..=1.0).contains(&progress) {
            return Err(ProjectError::InvalidProgress {
                id: id.clone(),
                progress,
            });
        }
        self.tree.task_mut(id)?.progress = progress;
        Ok(())
    }

    pub fn set_calendar(&mut self, calendar: Calendar) {
        self.calendar = calendar;
        self.refresh();
    }

    pub fn set_calendar_from_config(&mut self, config: &CalendarConfig) {
        self.set_calendar(Calendar::from_config(config));
    }

    pub fn add_calendar_event(&mut self, date: NaiveDate, event: HolidayEvent) {
        self.calendar.add_event(date, event);
        self.refresh();
    }

    pub fn remove_calendar_event(&mut self, date: NaiveDate) -> Option<HolidayEvent> {
        let removed = self.calendar.remove_event(date);
        if removed.is_some() {
            self.refresh();
        }
        removed
    }

    pub fn set_workload_mode(&mut self, mode: WorkloadMode) {
        self.workload_mode = mode;
        self.refresh();
    }

    pub fn set_iteration_budget(&mut self, budget: Option<usize>) {
        self.iteration_budget = budget;
        self.refresh();
    }

    /// Recompute the whole work-range map from the current document.
    pub fn refresh(&mut self) -> ResolveSummary {
        let nodes = self.tree.flatten();
        let budget = self.iteration_budget.unwrap_or_else(|| nodes.len().max(1));
        let resolver = WorkRangeResolver::new(nodes, &self.calendar, budget)
            .with_workload_mode(self.workload_mode);
        let ranges = resolver.resolve();
        self.ranges = ranges;

        let summary = self.summary();
        debug!(status = %summary.to_status_line(), "project refreshed");
        summary
    }

    pub fn summary(&self) -> ResolveSummary {
        let mut unresolved: Vec<TimelineId> = self
            .tree
            .flatten()
            .into_iter()
            .map(Timeline::id)
            .filter(|id| !self.ranges.contains(id))
            .cloned()
            .collect();
        unresolved.sort();

        let span = self.ranges.resolved_span();
        ResolveSummary {
            node_count: self.tree.len(),
            success_count: self.ranges.success_count(),
            error_count: self.ranges.error_count(),
            unresolved,
            begin: span.map(|(begin, _)| begin),
            end: span.map(|(_, end)| end),
        }
    }

    /// Advisory double-booking view over the current map.
    pub fn overbooked_days(&self) -> Vec<DayConflict> {
        DayLoadAggregator::new(self.tree.flatten(), &self.calendar, &self.ranges).overbooked()
    }

    /// Dependency cycles in the current document, for diagnosis of
    /// unresolved nodes.
    pub fn dependency_cycles(&self) -> Vec<Vec<TimelineId>> {
        DependencyGraph::build(self.tree.flatten()).cycles()
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}
