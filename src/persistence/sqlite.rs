use super::{PersistenceResult, ProjectStore};
use crate::calculations::resolver::WorkloadMode;
use crate::calendar::{Calendar, CalendarConfig};
use crate::metadata::ProjectMetadata;
use crate::persistence::PersistenceError;
use crate::project::Project;
use crate::timeline::Timeline;
use crate::tree::TimelineTree;
use rusqlite::{Connection, OptionalExtension, params};
use std::sync::Mutex;

pub struct SqliteProjectStore {
    connection: Mutex<Connection>,
}

impl SqliteProjectStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS project_metadata (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                metadata_json TEXT NOT NULL,
                calendar_json TEXT NOT NULL,
                workload_mode_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS timelines (
                id TEXT PRIMARY KEY,
                node_json TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn save_metadata(
        &self,
        tx: &rusqlite::Transaction,
        project: &Project,
    ) -> PersistenceResult<()> {
        let metadata_json = serde_json::to_string(project.metadata())?;
        let calendar_json = serde_json::to_string(&project.calendar_config())?;
        let workload_mode_json = serde_json::to_string(&project.workload_mode())?;
        tx.execute("DELETE FROM project_metadata", [])?;
        tx.execute(
            "INSERT INTO project_metadata (id, metadata_json, calendar_json, workload_mode_json)
             VALUES (1, ?1, ?2, ?3)",
            params![metadata_json, calendar_json, workload_mode_json],
        )?;
        Ok(())
    }

    fn save_timelines(
        &self,
        tx: &rusqlite::Transaction,
        project: &Project,
    ) -> PersistenceResult<()> {
        tx.execute("DELETE FROM timelines", [])?;
        let mut stmt = tx.prepare("INSERT INTO timelines (id, node_json) VALUES (?1, ?2)")?;
        for node in project.tree().flatten() {
            let json = serde_json::to_string(node)?;
            stmt.execute(params![node.id().as_str(), json])?;
        }
        Ok(())
    }
}

impl ProjectStore for SqliteProjectStore {
    fn save_project(&self, project: &Project) -> PersistenceResult<()> {
        super::validate_project(project)?;
        let mut conn = self.connection.lock().expect("sqlite mutex poisoned");
        let tx = conn.transaction()?;
        self.save_metadata(&tx, project)?;
        self.save_timelines(&tx, project)?;
        tx.commit()?;
        Ok(())
    }

    fn load_project(&self) -> PersistenceResult<Option<Project>> {
        let conn = self.connection.lock().expect("sqlite mutex poisoned");

        let mut stmt = conn.prepare(
            "SELECT metadata_json, calendar_json, workload_mode_json
             FROM project_metadata WHERE id = 1",
        )?;
        let row: Option<(String, String, String)> = stmt
            .query_row([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
            .optional()?;

        let Some((metadata_json, calendar_json, workload_mode_json)) = row else {
            return Ok(None);
        };

        let metadata: ProjectMetadata = serde_json::from_str(&metadata_json)?;
        let calendar_config: CalendarConfig = serde_json::from_str(&calendar_json)?;
        let workload_mode: WorkloadMode = serde_json::from_str(&workload_mode_json)?;

        let mut stmt = conn.prepare("SELECT node_json FROM timelines ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut nodes = Vec::new();
        for json in rows {
            let json = json?;
            let node: Timeline = serde_json::from_str(&json)?;
            nodes.push(node);
        }

        super::validate_nodes(&nodes)?;
        let tree = TimelineTree::from_nodes(nodes)
            .map_err(|err| PersistenceError::InvalidData(err.to_string()))?;

        Ok(Some(Project::from_parts(
            metadata,
            Calendar::from_config(&calendar_config),
            workload_mode,
            tree,
        )))
    }
}
