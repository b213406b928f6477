use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, tree-wide-unique identifier for a timeline node.
///
/// Ids are stable strings chosen by the document; the single reserved id
/// [`TimelineId::ROOT`] names the root group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimelineId(String);

impl TimelineId {
    pub const ROOT: &'static str = "root";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn root() -> Self {
        Self(Self::ROOT.to_string())
    }

    pub fn is_root(&self) -> bool {
        self.0 == Self::ROOT
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TimelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TimelineId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TimelineId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A node of the project tree: either a group of other nodes or a task.
///
/// Two graphs share these nodes: the strict containment tree (groups own
/// their `children` id lists) and the dependency overlay (`previous` id
/// lists on tasks), which is independent of the tree and may be cyclic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Timeline {
    Group(GroupTimeline),
    Task(TaskTimeline),
}

impl Timeline {
    pub fn id(&self) -> &TimelineId {
        match self {
            Timeline::Group(group) => &group.id,
            Timeline::Task(task) => &task.id,
        }
    }

    pub fn subject(&self) -> &str {
        match self {
            Timeline::Group(group) => &group.subject,
            Timeline::Task(task) => &task.subject,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Timeline::Group(_))
    }

    pub fn is_task(&self) -> bool {
        matches!(self, Timeline::Task(_))
    }

    pub fn as_group(&self) -> Option<&GroupTimeline> {
        match self {
            Timeline::Group(group) => Some(group),
            Timeline::Task(_) => None,
        }
    }

    pub fn as_task(&self) -> Option<&TaskTimeline> {
        match self {
            Timeline::Group(_) => None,
            Timeline::Task(task) => Some(task),
        }
    }

    pub(crate) fn as_group_mut(&mut self) -> Option<&mut GroupTimeline> {
        match self {
            Timeline::Group(group) => Some(group),
            Timeline::Task(_) => None,
        }
    }

    pub(crate) fn as_task_mut(&mut self) -> Option<&mut TaskTimeline> {
        match self {
            Timeline::Group(_) => None,
            Timeline::Task(task) => Some(task),
        }
    }

    pub(crate) fn set_subject(&mut self, subject: impl Into<String>) {
        match self {
            Timeline::Group(group) => group.subject = subject.into(),
            Timeline::Task(task) => task.subject = subject.into(),
        }
    }

    pub(crate) fn set_comment(&mut self, comment: impl Into<String>) {
        match self {
            Timeline::Group(group) => group.comment = comment.into(),
            Timeline::Task(task) => task.comment = comment.into(),
        }
    }
}

impl From<GroupTimeline> for Timeline {
    fn from(group: GroupTimeline) -> Self {
        Timeline::Group(group)
    }
}

impl From<TaskTimeline> for Timeline {
    fn from(task: TaskTimeline) -> Self {
        Timeline::Task(task)
    }
}

/// A grouping node with an ordered list of child ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupTimeline {
    pub id: TimelineId,
    pub subject: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub children: Vec<TimelineId>,
}

impl GroupTimeline {
    pub fn new(id: impl Into<TimelineId>, subject: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            subject: subject.into(),
            comment: String::new(),
            children: Vec::new(),
        }
    }

    /// The root group carries the reserved root id.
    pub fn root(subject: impl Into<String>) -> Self {
        Self::new(TimelineId::root(), subject)
    }
}

/// A schedulable leaf node.
///
/// `pinned_start` is a user-fixed start date; when predecessors exist it
/// still acts as an earliest-start floor. `workload_days` is elapsed effort,
/// `previous` the ordered set of predecessor ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskTimeline {
    pub id: TimelineId,
    pub subject: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned_start: Option<NaiveDate>,
    #[serde(default)]
    pub previous: Vec<TimelineId>,
    #[serde(default)]
    pub workload_days: i64,
    #[serde(default)]
    pub progress: f64,
}

impl TaskTimeline {
    pub fn new(id: impl Into<TimelineId>, subject: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            subject: subject.into(),
            comment: String::new(),
            member_id: None,
            pinned_start: None,
            previous: Vec::new(),
            workload_days: 0,
            progress: 0.0,
        }
    }

    pub fn with_workload(mut self, days: i64) -> Self {
        self.workload_days = days;
        self
    }

    pub fn with_pinned_start(mut self, date: NaiveDate) -> Self {
        self.pinned_start = Some(date);
        self
    }

    pub fn with_previous<I, T>(mut self, previous: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TimelineId>,
    {
        self.previous = previous.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_member(mut self, member_id: impl Into<String>) -> Self {
        self.member_id = Some(member_id.into());
        self
    }

    pub fn with_progress(mut self, progress: f64) -> Self {
        self.progress = progress;
        self
    }

    /// Whether this task lists itself as its own predecessor.
    pub fn references_self(&self) -> bool {
        self.previous.contains(&self.id)
    }
}
