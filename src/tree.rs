use crate::timeline::{GroupTimeline, TaskTimeline, Timeline, TimelineId};
use crate::timeline_validation::{self, TimelineValidationError};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    UnknownTimeline(TimelineId),
    DuplicateTimeline(TimelineId),
    NotAGroup(TimelineId),
    NotATask(TimelineId),
    RootImmutable,
    WouldCreateCycle {
        id: TimelineId,
        parent: TimelineId,
    },
    /// Incrementally inserted groups start empty; children are attached
    /// through further inserts or moves.
    ChildrenNotEmpty(TimelineId),
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::UnknownTimeline(id) => write!(f, "unknown timeline '{id}'"),
            TreeError::DuplicateTimeline(id) => write!(f, "timeline id '{id}' already exists"),
            TreeError::NotAGroup(id) => write!(f, "timeline '{id}' is not a group"),
            TreeError::NotATask(id) => write!(f, "timeline '{id}' is not a task"),
            TreeError::RootImmutable => write!(f, "the root timeline cannot be moved or removed"),
            TreeError::WouldCreateCycle { id, parent } => write!(
                f,
                "moving '{id}' under '{parent}' would make it its own descendant"
            ),
            TreeError::ChildrenNotEmpty(id) => {
                write!(f, "group '{id}' must be inserted without children")
            }
        }
    }
}

impl std::error::Error for TreeError {}

/// The strict ownership tree: an id-indexed arena of timeline nodes plus a
/// parent map. Groups reference children by id; the dependency overlay on
/// tasks is not the tree's concern and is never followed here.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineTree {
    nodes: HashMap<TimelineId, Timeline>,
    parents: HashMap<TimelineId, TimelineId>,
}

impl TimelineTree {
    pub fn new(root_subject: impl Into<String>) -> Self {
        let root = GroupTimeline::root(root_subject);
        let mut nodes = HashMap::new();
        nodes.insert(root.id.clone(), Timeline::Group(root));
        Self {
            nodes,
            parents: HashMap::new(),
        }
    }

    /// Rebuild a tree from a flat node list (persistence path). The list is
    /// validated as a whole first; the build cannot fail afterwards.
    pub(crate) fn from_nodes(nodes: Vec<Timeline>) -> Result<Self, TimelineValidationError> {
        timeline_validation::validate_node_collection(&nodes)?;

        let mut parents = HashMap::new();
        for node in &nodes {
            if let Timeline::Group(group) = node {
                for child in &group.children {
                    parents.insert(child.clone(), group.id.clone());
                }
            }
        }
        let nodes = nodes
            .into_iter()
            .map(|node| (node.id().clone(), node))
            .collect();
        Ok(Self { nodes, parents })
    }

    pub fn root(&self) -> &GroupTimeline {
        self.nodes[&TimelineId::root()]
            .as_group()
            .expect("root is a group")
    }

    pub fn get(&self, id: &TimelineId) -> Option<&Timeline> {
        self.nodes.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &TimelineId) -> Option<&mut Timeline> {
        self.nodes.get_mut(id)
    }

    pub fn task(&self, id: &TimelineId) -> Result<&TaskTimeline, TreeError> {
        self.nodes
            .get(id)
            .ok_or_else(|| TreeError::UnknownTimeline(id.clone()))?
            .as_task()
            .ok_or_else(|| TreeError::NotATask(id.clone()))
    }

    pub(crate) fn task_mut(&mut self, id: &TimelineId) -> Result<&mut TaskTimeline, TreeError> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| TreeError::UnknownTimeline(id.clone()))?
            .as_task_mut()
            .ok_or_else(|| TreeError::NotATask(id.clone()))
    }

    pub fn contains(&self, id: &TimelineId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Node count, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn parent(&self, id: &TimelineId) -> Option<&TimelineId> {
        self.parents.get(id)
    }

    /// True if `ancestor` appears on `id`'s parent chain (strict; a node is
    /// not its own ancestor).
    pub fn is_ancestor(&self, ancestor: &TimelineId, id: &TimelineId) -> bool {
        let mut current = self.parents.get(id);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.parents.get(parent);
        }
        false
    }

    /// Attach a new node at the end of `parent_id`'s children.
    pub fn insert(&mut self, parent_id: &TimelineId, node: Timeline) -> Result<(), TreeError> {
        if self.nodes.contains_key(node.id()) {
            return Err(TreeError::DuplicateTimeline(node.id().clone()));
        }
        if let Timeline::Group(group) = &node {
            if !group.children.is_empty() {
                return Err(TreeError::ChildrenNotEmpty(group.id.clone()));
            }
        }
        let id = node.id().clone();
        let parent = self.group_mut(parent_id)?;
        parent.children.push(id.clone());
        self.parents.insert(id.clone(), parent_id.clone());
        self.nodes.insert(id, node);
        Ok(())
    }

    /// Remove a node and its whole subtree; returns the removed ids.
    pub fn remove(&mut self, id: &TimelineId) -> Result<Vec<TimelineId>, TreeError> {
        if id.is_root() {
            return Err(TreeError::RootImmutable);
        }
        if !self.nodes.contains_key(id) {
            return Err(TreeError::UnknownTimeline(id.clone()));
        }

        let parent_id = self.parents[id].clone();
        let parent = self.group_mut(&parent_id)?;
        parent.children.retain(|child| child != id);

        let removed = self.collect_subtree(id);
        for removed_id in &removed {
            self.nodes.remove(removed_id);
            self.parents.remove(removed_id);
        }
        Ok(removed)
    }

    /// Reparent (and optionally reposition) a node. The target group must
    /// not lie inside the moved subtree.
    pub fn move_to(
        &mut self,
        id: &TimelineId,
        new_parent: &TimelineId,
        position: Option<usize>,
    ) -> Result<(), TreeError> {
        if id.is_root() {
            return Err(TreeError::RootImmutable);
        }
        if !self.nodes.contains_key(id) {
            return Err(TreeError::UnknownTimeline(id.clone()));
        }
        if !self
            .nodes
            .get(new_parent)
            .is_some_and(|node| node.is_group())
        {
            return Err(match self.nodes.get(new_parent) {
                Some(_) => TreeError::NotAGroup(new_parent.clone()),
                None => TreeError::UnknownTimeline(new_parent.clone()),
            });
        }
        if new_parent == id || self.is_ancestor(id, new_parent) {
            return Err(TreeError::WouldCreateCycle {
                id: id.clone(),
                parent: new_parent.clone(),
            });
        }

        let old_parent_id = self.parents[id].clone();
        let old_parent = self.group_mut(&old_parent_id)?;
        old_parent.children.retain(|child| child != id);

        let target = self.group_mut(new_parent)?;
        let index = position.unwrap_or(target.children.len());
        let index = index.min(target.children.len());
        target.children.insert(index, id.clone());
        self.parents.insert(id.clone(), new_parent.clone());
        Ok(())
    }

    /// Every node once, depth-first from the root, children in order.
    pub fn flatten(&self) -> Vec<&Timeline> {
        let mut out = Vec::with_capacity(self.nodes.len());
        self.flatten_into(&TimelineId::root(), &mut out);
        out
    }

    fn flatten_into<'a>(&'a self, id: &TimelineId, out: &mut Vec<&'a Timeline>) {
        let node = &self.nodes[id];
        out.push(node);
        if let Timeline::Group(group) = node {
            for child in &group.children {
                self.flatten_into(child, out);
            }
        }
    }

    fn collect_subtree(&self, id: &TimelineId) -> Vec<TimelineId> {
        let mut out = Vec::new();
        let mut stack = vec![id.clone()];
        while let Some(current) = stack.pop() {
            if let Some(Timeline::Group(group)) = self.nodes.get(&current) {
                stack.extend(group.children.iter().cloned());
            }
            out.push(current);
        }
        out
    }

    /// Drop references to the given ids from every task's predecessor list.
    pub(crate) fn strip_previous(&mut self, removed: &[TimelineId]) {
        for node in self.nodes.values_mut() {
            if let Timeline::Task(task) = node {
                task.previous.retain(|prev| !removed.contains(prev));
            }
        }
    }

    fn group_mut(&mut self, id: &TimelineId) -> Result<&mut GroupTimeline, TreeError> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| TreeError::UnknownTimeline(id.clone()))?
            .as_group_mut()
            .ok_or_else(|| TreeError::NotAGroup(id.clone()))
    }
}

impl Default for TimelineTree {
    fn default() -> Self {
        Self::new("Project")
    }
}
