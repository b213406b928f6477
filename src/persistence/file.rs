use super::{PersistenceError, PersistenceResult};
use crate::calculations::resolver::WorkloadMode;
use crate::calendar::{Calendar, CalendarConfig};
use crate::metadata::ProjectMetadata;
use crate::project::Project;
use crate::timeline::{GroupTimeline, TaskTimeline, Timeline, TimelineId};
use crate::tree::TimelineTree;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

#[derive(Serialize, Deserialize)]
struct ProjectSnapshot {
    metadata: ProjectMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    calendar: Option<CalendarConfig>,
    #[serde(default)]
    workload_mode: WorkloadMode,
    nodes: Vec<Timeline>,
}

impl ProjectSnapshot {
    fn from_project(project: &Project) -> PersistenceResult<Self> {
        let nodes: Vec<Timeline> = project.tree().flatten().into_iter().cloned().collect();
        super::validate_nodes(&nodes)?;
        Ok(Self {
            metadata: project.metadata().clone(),
            calendar: Some(project.calendar_config()),
            workload_mode: project.workload_mode(),
            nodes,
        })
    }

    fn into_project(self) -> PersistenceResult<Project> {
        super::validate_nodes(&self.nodes)?;
        let calendar = self
            .calendar
            .map(|config| Calendar::from_config(&config))
            .unwrap_or_default();
        let tree = TimelineTree::from_nodes(self.nodes)
            .map_err(|err| PersistenceError::InvalidData(err.to_string()))?;
        Ok(Project::from_parts(
            self.metadata,
            calendar,
            self.workload_mode,
            tree,
        ))
    }
}

pub fn save_project_to_json<P: AsRef<Path>>(project: &Project, path: P) -> PersistenceResult<()> {
    let snapshot = ProjectSnapshot::from_project(project)?;
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    Ok(())
}

pub fn load_project_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Project> {
    let file = File::open(path)?;
    let snapshot: ProjectSnapshot = serde_json::from_reader(file)?;
    snapshot.into_project()
}

#[derive(Default, Serialize, Deserialize)]
struct NodeCsvRecord {
    id: String,
    kind: String,
    subject: String,
    comment: String,
    children: String,
    member_id: String,
    pinned_start: String,
    previous: String,
    workload_days: i64,
    progress: f64,
    #[serde(default)]
    metadata_json: String,
    #[serde(default)]
    calendar_json: String,
    #[serde(default)]
    workload_mode_json: String,
}

impl From<&Timeline> for NodeCsvRecord {
    fn from(node: &Timeline) -> Self {
        let mut record = NodeCsvRecord::default();
        record.id = node.id().to_string();
        record.subject = node.subject().to_string();
        match node {
            Timeline::Group(group) => {
                record.kind = "group".to_string();
                record.comment = group.comment.clone();
                record.children = join_ids(&group.children);
            }
            Timeline::Task(task) => {
                record.kind = "task".to_string();
                record.comment = task.comment.clone();
                record.member_id = task.member_id.clone().unwrap_or_default();
                record.pinned_start = format_date(task.pinned_start);
                record.previous = join_ids(&task.previous);
                record.workload_days = task.workload_days;
                record.progress = task.progress;
            }
        }
        record
    }
}

impl NodeCsvRecord {
    fn metadata_row(project: &Project) -> PersistenceResult<Self> {
        let mut record = NodeCsvRecord::default();
        record.subject = "__metadata__".to_string();
        record.metadata_json = serde_json::to_string(project.metadata())?;
        record.calendar_json = serde_json::to_string(&project.calendar_config())?;
        record.workload_mode_json = serde_json::to_string(&project.workload_mode())?;
        Ok(record)
    }

    fn is_metadata_row(&self) -> bool {
        !self.metadata_json.trim().is_empty()
    }

    fn into_timeline(self) -> PersistenceResult<Timeline> {
        if self.is_metadata_row() {
            return Err(PersistenceError::InvalidData(
                "metadata row cannot be converted to a timeline".into(),
            ));
        }
        let id = TimelineId::new(self.id.trim());
        match self.kind.trim() {
            "group" => {
                let mut group = GroupTimeline::new(id, self.subject);
                group.comment = self.comment;
                group.children = split_ids(&self.children);
                Ok(Timeline::Group(group))
            }
            "task" => {
                let mut task = TaskTimeline::new(id, self.subject);
                task.comment = self.comment;
                task.member_id = parse_string_option(self.member_id);
                task.pinned_start = parse_date(&self.pinned_start)?;
                task.previous = split_ids(&self.previous);
                task.workload_days = self.workload_days;
                task.progress = self.progress;
                Ok(Timeline::Task(task))
            }
            other => Err(PersistenceError::InvalidData(format!(
                "invalid timeline kind '{other}'"
            ))),
        }
    }
}

pub fn save_project_to_csv<P: AsRef<Path>>(project: &Project, path: P) -> PersistenceResult<()> {
    super::validate_project(project)?;
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    writer.serialize(NodeCsvRecord::metadata_row(project)?)?;
    for node in project.tree().flatten() {
        writer.serialize(NodeCsvRecord::from(node))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_project_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Project> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut nodes = Vec::new();
    let mut metadata: Option<ProjectMetadata> = None;
    let mut calendar_config: Option<CalendarConfig> = None;
    let mut workload_mode = WorkloadMode::default();
    for record in reader.deserialize::<NodeCsvRecord>() {
        let record = record?;
        if record.is_metadata_row() {
            if metadata.is_some() {
                return Err(PersistenceError::InvalidData(
                    "CSV file contained multiple metadata rows".into(),
                ));
            }
            metadata = Some(serde_json::from_str(&record.metadata_json).map_err(|err| {
                PersistenceError::InvalidData(format!("invalid metadata json: {err}"))
            })?);
            if !record.calendar_json.trim().is_empty() {
                calendar_config =
                    Some(serde_json::from_str(&record.calendar_json).map_err(|err| {
                        PersistenceError::InvalidData(format!("invalid calendar json: {err}"))
                    })?);
            }
            if !record.workload_mode_json.trim().is_empty() {
                workload_mode = serde_json::from_str(&record.workload_mode_json).map_err(|err| {
                    PersistenceError::InvalidData(format!("invalid workload mode: {err}"))
                })?;
            }
            continue;
        }
        nodes.push(record.into_timeline()?);
    }

    if nodes.is_empty() {
        return Err(PersistenceError::InvalidData(
            "CSV file contained no timeline rows".into(),
        ));
    }

    super::validate_nodes(&nodes)?;
    let tree = TimelineTree::from_nodes(nodes)
        .map_err(|err| PersistenceError::InvalidData(err.to_string()))?;
    let calendar = calendar_config
        .map(|config| Calendar::from_config(&config))
        .unwrap_or_default();
    Ok(Project::from_parts(
        metadata.unwrap_or_default(),
        calendar,
        workload_mode,
        tree,
    ))
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn parse_date(input: &str) -> PersistenceResult<Option<NaiveDate>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map(Some)
        .map_err(|e| PersistenceError::InvalidData(format!("invalid date '{input}': {e}")))
}

fn join_ids(values: &[TimelineId]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn split_ids(input: &str) -> Vec<TimelineId> {
    if input.trim().is_empty() {
        return Vec::new();
    }
    input
        .split(',')
        .map(|part| TimelineId::new(part.trim()))
        .collect()
}

fn parse_string_option(value: String) -> Option<String> {
    if value.trim().is_empty() { None } else { Some(value) }
}
