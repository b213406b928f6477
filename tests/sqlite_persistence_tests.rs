#![cfg(feature = "sqlite")]

use chrono::NaiveDate;
use timeline_tool::{
    Project, ProjectStore, SqliteProjectStore, TaskTimeline, TimelineId, WorkRange,
};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn load_from_a_fresh_store_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteProjectStore::new(dir.path().join("plan.db")).unwrap();
    assert!(store.load_project().unwrap().is_none());
}

#[test]
fn save_and_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.db");

    let mut project = Project::new();
    project
        .add_task(
            &TimelineId::root(),
            TaskTimeline::new("t1", "Design")
                .with_pinned_start(d(2024, 1, 1))
                .with_workload(2)
                .with_member("alice"),
        )
        .unwrap();
    project
        .add_task(
            &TimelineId::root(),
            TaskTimeline::new("t2", "Build").with_previous(["t1"]).with_workload(1),
        )
        .unwrap();

    let store = SqliteProjectStore::new(&path).unwrap();
    store.save_project(&project).unwrap();

    let loaded = store.load_project().unwrap().unwrap();
    assert_eq!(loaded.metadata(), project.metadata());
    assert_eq!(loaded.tree().flatten(), project.tree().flatten());
    assert_eq!(loaded.work_ranges(), project.work_ranges());
    assert_eq!(
        loaded.work_range(&TimelineId::new("t2")),
        Some(WorkRange::success(d(2024, 1, 3), d(2024, 1, 4)))
    );
}

#[test]
fn saving_twice_replaces_the_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.db");
    let store = SqliteProjectStore::new(&path).unwrap();

    let mut project = Project::new();
    project
        .add_task(
            &TimelineId::root(),
            TaskTimeline::new("t1", "Design")
                .with_pinned_start(d(2024, 1, 1))
                .with_workload(2),
        )
        .unwrap();
    store.save_project(&project).unwrap();

    project.remove_timeline(&TimelineId::new("t1")).unwrap();
    store.save_project(&project).unwrap();

    let loaded = store.load_project().unwrap().unwrap();
    assert_eq!(loaded.tree().len(), 1);
    assert!(!loaded.tree().contains(&TimelineId::new("t1")));
}
