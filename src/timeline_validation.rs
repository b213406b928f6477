use crate::timeline::{TaskTimeline, Timeline, TimelineId};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

const EPSILON: f64 = 1e-6;

#[derive(Debug, Clone)]
pub struct TimelineValidationError {
    message: String,
}

impl TimelineValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for TimelineValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TimelineValidationError {}

pub fn validate_node(node: &Timeline) -> Result<(), TimelineValidationError> {
    if node.id().as_str().trim().is_empty() {
        return Err(TimelineValidationError::new("timeline id must not be empty"));
    }
    if let Timeline::Task(task) = node {
        validate_task(task)?;
    }
    Ok(())
}

fn validate_task(task: &TaskTimeline) -> Result<(), TimelineValidationError> {
    if task.workload_days < 0 {
        return Err(TimelineValidationError::new(format!(
            "task {} has negative workload {}",
            task.id, task.workload_days
        )));
    }
    if !task.progress.is_finite() || task.progress < -EPSILON || task.progress > 1.0 + EPSILON {
        return Err(TimelineValidationError::new(format!(
            "task {} has invalid progress {} (must be between 0 and 1)",
            task.id, task.progress
        )));
    }
    if let Some(member) = &task.member_id {
        if member.trim().is_empty() {
            return Err(TimelineValidationError::new(format!(
                "task {} has an empty member id",
                task.id
            )));
        }
    }
    Ok(())
}

/// Whole-document integrity: unique ids, a root group, a well-formed
/// containment tree, and resolvable references on both overlays. Runs on
/// every load/save so malformed documents never reach resolution.
pub fn validate_node_collection(nodes: &[Timeline]) -> Result<(), TimelineValidationError> {
    let mut ids: HashSet<&TimelineId> = HashSet::with_capacity(nodes.len());
    for node in nodes {
        validate_node(node)?;
        if !ids.insert(node.id()) {
            return Err(TimelineValidationError::new(format!(
                "duplicate timeline id {}",
                node.id()
            )));
        }
    }

    let root_id = TimelineId::root();
    match nodes.iter().find(|node| *node.id() == root_id) {
        Some(node) if node.is_group() => {}
        Some(_) => {
            return Err(TimelineValidationError::new("the root timeline must be a group"));
        }
        None => {
            return Err(TimelineValidationError::new(format!(
                "missing root timeline '{root_id}'"
            )));
        }
    }

    let mut parent_of: HashMap<&TimelineId, &TimelineId> = HashMap::new();
    for node in nodes {
        if let Timeline::Group(group) = node {
            for child in &group.children {
                if !ids.contains(child) {
                    return Err(TimelineValidationError::new(format!(
                        "group {} references missing child {}",
                        group.id, child
                    )));
                }
                if child.is_root() {
                    return Err(TimelineValidationError::new(format!(
                        "group {} lists the root as a child",
                        group.id
                    )));
                }
                if parent_of.insert(child, &group.id).is_some() {
                    return Err(TimelineValidationError::new(format!(
                        "timeline {child} has more than one parent"
                    )));
                }
            }
        }
    }

    for node in nodes {
        if !node.id().is_root() && !parent_of.contains_key(node.id()) {
            return Err(TimelineValidationError::new(format!(
                "timeline {} is not attached to any group",
                node.id()
            )));
        }
    }

    // Single parent per node plus full reachability from the root rules out
    // containment cycles.
    let by_id: HashMap<&TimelineId, &Timeline> =
        nodes.iter().map(|node| (node.id(), node)).collect();
    let mut reached: HashSet<&TimelineId> = HashSet::with_capacity(nodes.len());
    let mut queue: VecDeque<&TimelineId> = VecDeque::new();
    queue.push_back(by_id.keys().find(|id| id.is_root()).copied().unwrap());
    while let Some(id) = queue.pop_front() {
        if !reached.insert(id) {
            continue;
        }
        if let Some(Timeline::Group(group)) = by_id.get(id) {
            queue.extend(group.children.iter());
        }
    }
    if reached.len() != nodes.len() {
        let stranded = nodes
            .iter()
            .map(Timeline::id)
            .find(|id| !reached.contains(id))
            .unwrap();
        return Err(TimelineValidationError::new(format!(
            "timeline {stranded} is not reachable from the root"
        )));
    }

    for node in nodes {
        if let Timeline::Task(task) = node {
            for prev in &task.previous {
                if !ids.contains(prev) {
                    return Err(TimelineValidationError::new(format!(
                        "task {} references missing predecessor {}",
                        task.id, prev
                    )));
                }
            }
        }
    }

    Ok(())
}
