pub mod calculations;
pub mod calendar;
pub mod graph;
pub mod metadata;
pub mod persistence;
pub mod project;
pub mod timeline;
pub(crate) mod timeline_validation;
pub mod tree;
pub mod work_range;

pub use calculations::day_load::{DayConflict, DayLoadAggregator};
pub use calculations::resolver::{WorkRangeResolver, WorkloadMode};
pub use calendar::{Calendar, CalendarConfig, EventKind, HolidayEvent};
pub use graph::DependencyGraph;
pub use metadata::ProjectMetadata;
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteProjectStore;
pub use persistence::{
    PersistenceError, ProjectStore, load_project_from_csv, load_project_from_json,
    save_project_to_csv, save_project_to_json, validate_nodes, validate_project,
};
pub use project::{Project, ProjectError, ResolveSummary};
pub use timeline::{GroupTimeline, TaskTimeline, Timeline, TimelineId};
pub use tree::{TimelineTree, TreeError};
pub use work_range::{WorkRange, WorkRangeMap};
