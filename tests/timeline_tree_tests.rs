use timeline_tool::{GroupTimeline, TaskTimeline, Timeline, TimelineId, TimelineTree, TreeError};

fn id(s: &str) -> TimelineId {
    TimelineId::new(s)
}

fn sample_tree() -> TimelineTree {
    // root -> g1 -> (t1, t2), root -> t3
    let mut tree = TimelineTree::new("Plan");
    tree.insert(&TimelineId::root(), GroupTimeline::new("g1", "Phase 1").into())
        .unwrap();
    tree.insert(&id("g1"), TaskTimeline::new("t1", "Design").into())
        .unwrap();
    tree.insert(&id("g1"), TaskTimeline::new("t2", "Build").into())
        .unwrap();
    tree.insert(&TimelineId::root(), TaskTimeline::new("t3", "Review").into())
        .unwrap();
    tree
}

#[test]
fn flatten_is_depth_first_in_child_order() {
    let tree = sample_tree();
    let order: Vec<&str> = tree
        .flatten()
        .into_iter()
        .map(|node| node.id().as_str())
        .collect();
    assert_eq!(order, vec!["root", "g1", "t1", "t2", "t3"]);
    assert_eq!(tree.len(), 5);
}

#[test]
fn parents_are_tracked() {
    let tree = sample_tree();
    assert_eq!(tree.parent(&id("t1")), Some(&id("g1")));
    assert_eq!(tree.parent(&id("g1")), Some(&TimelineId::root()));
    assert_eq!(tree.parent(&TimelineId::root()), None);
    assert!(tree.is_ancestor(&TimelineId::root(), &id("t1")));
    assert!(tree.is_ancestor(&id("g1"), &id("t1")));
    assert!(!tree.is_ancestor(&id("t1"), &id("g1")));
    assert!(!tree.is_ancestor(&id("t1"), &id("t1")));
}

#[test]
fn duplicate_ids_are_rejected() {
    let mut tree = sample_tree();
    let err = tree
        .insert(&TimelineId::root(), TaskTimeline::new("t1", "Again").into())
        .unwrap_err();
    assert_eq!(err, TreeError::DuplicateTimeline(id("t1")));
}

#[test]
fn inserting_under_a_task_is_rejected() {
    let mut tree = sample_tree();
    let err = tree
        .insert(&id("t1"), TaskTimeline::new("t9", "Nested").into())
        .unwrap_err();
    assert_eq!(err, TreeError::NotAGroup(id("t1")));
}

#[test]
fn groups_must_be_inserted_empty() {
    let mut tree = sample_tree();
    let mut group = GroupTimeline::new("g2", "Phase 2");
    group.children.push(id("t3"));
    let err = tree.insert(&TimelineId::root(), group.into()).unwrap_err();
    assert_eq!(err, TreeError::ChildrenNotEmpty(id("g2")));
}

#[test]
fn remove_takes_the_whole_subtree() {
    let mut tree = sample_tree();
    let mut removed = tree.remove(&id("g1")).unwrap();
    removed.sort();
    assert_eq!(removed, vec![id("g1"), id("t1"), id("t2")]);
    assert!(!tree.contains(&id("t1")));
    assert_eq!(tree.len(), 2);
    assert_eq!(tree.root().children, vec![id("t3")]);
}

#[test]
fn root_cannot_be_removed_or_moved() {
    let mut tree = sample_tree();
    assert_eq!(tree.remove(&TimelineId::root()), Err(TreeError::RootImmutable));
    assert_eq!(
        tree.move_to(&TimelineId::root(), &id("g1"), None),
        Err(TreeError::RootImmutable)
    );
}

#[test]
fn move_reparents_and_repositions() {
    let mut tree = sample_tree();
    tree.move_to(&id("t3"), &id("g1"), Some(0)).unwrap();
    let g1 = tree.get(&id("g1")).unwrap().as_group().unwrap();
    assert_eq!(g1.children, vec![id("t3"), id("t1"), id("t2")]);
    assert_eq!(tree.parent(&id("t3")), Some(&id("g1")));
    assert_eq!(tree.root().children, vec![id("g1")]);

    // Reorder within the same parent; out-of-range positions clamp.
    tree.move_to(&id("t3"), &id("g1"), Some(99)).unwrap();
    let g1 = tree.get(&id("g1")).unwrap().as_group().unwrap();
    assert_eq!(g1.children, vec![id("t1"), id("t2"), id("t3")]);
}

#[test]
fn moving_a_group_into_its_own_subtree_is_rejected() {
    let mut tree = sample_tree();
    tree.insert(&id("g1"), GroupTimeline::new("g2", "Inner").into())
        .unwrap();
    let err = tree.move_to(&id("g1"), &id("g2"), None).unwrap_err();
    assert_eq!(
        err,
        TreeError::WouldCreateCycle {
            id: id("g1"),
            parent: id("g2"),
        }
    );
    let err = tree.move_to(&id("g1"), &id("g1"), None).unwrap_err();
    assert!(matches!(err, TreeError::WouldCreateCycle { .. }));
}

#[test]
fn unknown_ids_surface_as_errors() {
    let mut tree = sample_tree();
    assert_eq!(
        tree.remove(&id("ghost")),
        Err(TreeError::UnknownTimeline(id("ghost")))
    );
    assert_eq!(
        tree.move_to(&id("t1"), &id("ghost"), None),
        Err(TreeError::UnknownTimeline(id("ghost")))
    );
    assert!(tree.task(&id("ghost")).is_err());
    assert_eq!(
        tree.task(&id("g1")).unwrap_err(),
        TreeError::NotATask(id("g1"))
    );
}
