use chrono::NaiveDate;
use timeline_tool::{
    Calendar, GroupTimeline, HolidayEvent, Project, ProjectError, TaskTimeline, TimelineId,
    WorkRange, WorkloadMode,
};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn id(s: &str) -> TimelineId {
    TimelineId::new(s)
}

fn root() -> TimelineId {
    TimelineId::root()
}

#[test]
fn empty_project_reports_root_without_children() {
    let project = Project::new();
    assert_eq!(project.work_range(&root()), Some(WorkRange::NoChildren));
    let summary = project.summary();
    assert_eq!(summary.node_count, 1);
    assert_eq!(summary.error_count, 1);
    assert!(summary.unresolved.is_empty());
}

#[test]
fn edits_recompute_the_whole_map() {
    let mut project = Project::new();
    project
        .add_task(
            &root(),
            TaskTimeline::new("t1", "Design")
                .with_pinned_start(d(2024, 1, 1))
                .with_workload(1),
        )
        .unwrap();
    project
        .add_task(
            &root(),
            TaskTimeline::new("t2", "Build")
                .with_previous(["t1"])
                .with_workload(2),
        )
        .unwrap();

    assert_eq!(
        project.work_range(&id("t2")),
        Some(WorkRange::success(d(2024, 1, 2), d(2024, 1, 4)))
    );
    assert_eq!(
        project.work_range(&root()),
        Some(WorkRange::success(d(2024, 1, 1), d(2024, 1, 4)))
    );

    // Stretching t1 pushes t2 and the root span forward.
    project.set_workload(&id("t1"), 3).unwrap();
    assert_eq!(
        project.work_range(&id("t2")),
        Some(WorkRange::success(d(2024, 1, 4), d(2024, 1, 6)))
    );

    project.set_pinned_start(&id("t1"), Some(d(2024, 2, 1))).unwrap();
    assert_eq!(
        project.work_range(&id("t2")),
        Some(WorkRange::success(d(2024, 2, 4), d(2024, 2, 6)))
    );
}

#[test]
fn removing_a_predecessor_strips_references() {
    let mut project = Project::new();
    project
        .add_task(
            &root(),
            TaskTimeline::new("t1", "Design")
                .with_pinned_start(d(2024, 1, 1))
                .with_workload(1),
        )
        .unwrap();
    project
        .add_task(
            &root(),
            TaskTimeline::new("t2", "Build").with_previous(["t1"]),
        )
        .unwrap();

    project.remove_timeline(&id("t1")).unwrap();
    // t2 lost its only predecessor and carries no pinned start.
    assert_eq!(project.work_range(&id("t2")), Some(WorkRange::NoInput));
    assert!(project.can_edit_start(&id("t2")));
}

#[test]
fn unknown_predecessors_are_rejected_self_is_not() {
    let mut project = Project::new();
    project
        .add_task(&root(), TaskTimeline::new("t1", "Design"))
        .unwrap();

    let err = project
        .set_previous(&id("t1"), vec![id("ghost")])
        .unwrap_err();
    assert!(matches!(err, ProjectError::UnknownPredecessor { .. }));

    project.set_previous(&id("t1"), vec![id("t1")]).unwrap();
    assert_eq!(project.work_range(&id("t1")), Some(WorkRange::SelfReference));
}

#[test]
fn set_previous_dedups_preserving_order() {
    let mut project = Project::new();
    project
        .add_task(
            &root(),
            TaskTimeline::new("a", "A")
                .with_pinned_start(d(2024, 1, 1))
                .with_workload(1),
        )
        .unwrap();
    project
        .add_task(
            &root(),
            TaskTimeline::new("b", "B")
                .with_pinned_start(d(2024, 1, 1))
                .with_workload(1),
        )
        .unwrap();
    project
        .add_task(&root(), TaskTimeline::new("c", "C"))
        .unwrap();

    project
        .set_previous(&id("c"), vec![id("b"), id("a"), id("b")])
        .unwrap();
    let task = project.tree().task(&id("c")).unwrap();
    assert_eq!(task.previous, vec![id("b"), id("a")]);
}

#[test]
fn exhausted_nodes_read_as_unresolved() {
    let mut project = Project::new();
    project
        .add_task(&root(), TaskTimeline::new("a", "A"))
        .unwrap();
    project
        .add_task(&root(), TaskTimeline::new("b", "B"))
        .unwrap();
    project.set_previous(&id("a"), vec![id("b")]).unwrap();
    project.set_previous(&id("b"), vec![id("a")]).unwrap();

    assert_eq!(project.work_range(&id("a")), Some(WorkRange::Unresolved));
    assert_eq!(project.work_range(&id("b")), Some(WorkRange::Unresolved));
    assert!(project.work_ranges().get(&id("a")).is_none());
    assert_eq!(project.work_range(&id("ghost")), None);

    let summary = project.summary();
    assert_eq!(summary.unresolved, vec![id("a"), id("b"), root()]);
    assert_eq!(project.dependency_cycles(), vec![vec![id("a"), id("b")]]);

    let status = summary.to_status_line();
    assert!(status.contains("unresolved=a,b,root"), "{status}");
}

#[test]
fn only_independent_tasks_expose_editable_starts() {
    let mut project = Project::new();
    project
        .add_group(&root(), GroupTimeline::new("g", "Phase"))
        .unwrap();
    project
        .add_task(
            &id("g"),
            TaskTimeline::new("t1", "Design").with_pinned_start(d(2024, 1, 1)),
        )
        .unwrap();
    project
        .add_task(&id("g"), TaskTimeline::new("t2", "Build").with_previous(["t1"]))
        .unwrap();

    assert!(project.can_edit_start(&id("t1")));
    assert!(!project.can_edit_start(&id("t2")));
    assert!(!project.can_edit_start(&id("g")));
    assert!(!project.can_edit_start(&id("ghost")));
}

#[test]
fn moving_the_last_child_empties_a_group() {
    let mut project = Project::new();
    project
        .add_group(&root(), GroupTimeline::new("g", "Phase"))
        .unwrap();
    project
        .add_task(
            &id("g"),
            TaskTimeline::new("t1", "Design")
                .with_pinned_start(d(2024, 1, 1))
                .with_workload(2),
        )
        .unwrap();

    assert_eq!(
        project.work_range(&id("g")),
        Some(WorkRange::success(d(2024, 1, 1), d(2024, 1, 3)))
    );

    project.move_timeline(&id("t1"), &root(), None).unwrap();
    assert_eq!(project.work_range(&id("g")), Some(WorkRange::NoChildren));
    // The root aggregates over an error child now.
    assert_eq!(project.work_range(&root()), Some(WorkRange::RelationError));
}

#[test]
fn workload_and_progress_bounds_are_enforced() {
    let mut project = Project::new();
    project
        .add_task(&root(), TaskTimeline::new("t1", "Design"))
        .unwrap();

    assert!(matches!(
        project.set_workload(&id("t1"), -1),
        Err(ProjectError::InvalidWorkload { .. })
    ));
    assert!(matches!(
        project.set_progress(&id("t1"), 1.5),
        Err(ProjectError::InvalidProgress { .. })
    ));
    assert!(matches!(
        project.set_member(&id("t1"), Some("  ".into())),
        Err(ProjectError::Validation(_))
    ));
    project.set_progress(&id("t1"), 0.25).unwrap();
    assert_eq!(project.tree().task(&id("t1")).unwrap().progress, 0.25);
}

#[test]
fn calendar_edits_recompute_in_working_days_mode() {
    let mut project = Project::new();
    project.set_workload_mode(WorkloadMode::WorkingDays);
    project
        .add_task(
            &root(),
            TaskTimeline::new("t1", "Design")
                .with_pinned_start(d(2024, 1, 8)) // Monday
                .with_workload(2),
        )
        .unwrap();

    assert_eq!(
        project.work_range(&id("t1")),
        Some(WorkRange::success(d(2024, 1, 8), d(2024, 1, 10)))
    );

    project.add_calendar_event(d(2024, 1, 9), HolidayEvent::holiday("Patch Day"));
    assert_eq!(
        project.work_range(&id("t1")),
        Some(WorkRange::success(d(2024, 1, 8), d(2024, 1, 11)))
    );

    project.remove_calendar_event(d(2024, 1, 9));
    assert_eq!(
        project.work_range(&id("t1")),
        Some(WorkRange::success(d(2024, 1, 8), d(2024, 1, 10)))
    );
}

#[test]
fn overbooked_days_surface_through_the_project() {
    let mut project = Project::new();
    for task_id in ["t1", "t2"] {
        project
            .add_task(
                &root(),
                TaskTimeline::new(task_id, task_id.to_uppercase())
                    .with_member("alice")
                    .with_pinned_start(d(2024, 1, 1))
                    .with_workload(2),
            )
            .unwrap();
    }

    let conflicts = project.overbooked_days();
    let dates: Vec<NaiveDate> = conflicts.iter().map(|c| c.date).collect();
    assert_eq!(dates, vec![d(2024, 1, 1), d(2024, 1, 2)]);

    project.set_member(&id("t2"), None).unwrap();
    assert!(project.overbooked_days().is_empty());
}

#[test]
fn tight_iteration_budget_leaves_deep_nodes_unresolved() {
    let mut project = Project::new();
    project
        .add_task(
            &root(),
            TaskTimeline::new("t1", "T1")
                .with_pinned_start(d(2024, 1, 1))
                .with_workload(1),
        )
        .unwrap();
    for (task_id, prev) in [("t2", "t1"), ("t3", "t2"), ("t4", "t3"), ("t5", "t4")] {
        project
            .add_task(
                &root(),
                TaskTimeline::new(task_id, task_id.to_uppercase())
                    .with_previous([prev])
                    .with_workload(1),
            )
            .unwrap();
    }

    // The default budget (node count) resolves the whole chain.
    assert_eq!(
        project.work_range(&id("t5")),
        Some(WorkRange::success(d(2024, 1, 5), d(2024, 1, 6)))
    );

    project.set_iteration_budget(Some(1));
    assert_eq!(project.work_range(&id("t5")), Some(WorkRange::Unresolved));

    project.set_iteration_budget(None);
    assert!(project.work_range(&id("t5")).unwrap().is_success());
}

#[test]
fn subject_and_comment_edits_do_not_touch_schedule_inputs() {
    let mut project = Project::new();
    project
        .add_task(
            &root(),
            TaskTimeline::new("t1", "Design")
                .with_pinned_start(d(2024, 1, 1))
                .with_workload(1),
        )
        .unwrap();

    project.set_subject(&id("t1"), "Design v2").unwrap();
    project.set_comment(&id("t1"), "reviewed").unwrap();
    let task = project.tree().task(&id("t1")).unwrap();
    assert_eq!(task.subject, "Design v2");
    assert_eq!(task.comment, "reviewed");
    assert_eq!(
        project.work_range(&id("t1")),
        Some(WorkRange::success(d(2024, 1, 1), d(2024, 1, 2)))
    );
}
