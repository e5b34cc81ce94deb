use rethread_tree::{build, Inconsistency, ReplyNode, TreeError};
use rethread_types::{Post, Reply};
use std::collections::HashSet;

fn post() -> Post {
    Post::new("abc123", "op", 100)
}

#[test]
fn test_every_reply_appears_exactly_once() {
    let replies = vec![
        Reply::new("c1", "abc123", "abc123", "bob", 101),
        Reply::new("c2", "abc123", "c1", "carol", 102),
        Reply::new("c3", "abc123", "c2", "alice", 103),
        Reply::new("c4", "abc123", "abc123", "dave", 104),
        Reply::new("c5", "abc123", "deleted", "erin", 105),
        Reply::new("c6", "abc123", "c5", "frank", 106),
        Reply::new("c7", "abc123", "c1", "gina", 107),
    ];

    let forest = build("abc123", &post(), &replies).unwrap();

    let seen: Vec<&str> = forest.walk().map(ReplyNode::id).collect();
    let unique: HashSet<&str> = seen.iter().copied().collect();
    assert_eq!(seen.len(), replies.len());
    assert_eq!(unique.len(), replies.len());

    let roots: Vec<_> = forest.roots.iter().map(ReplyNode::id).collect();
    assert_eq!(roots, vec!["c1", "c4"]);
    let orphans: Vec<_> = forest.orphans.iter().map(ReplyNode::id).collect();
    assert_eq!(orphans, vec!["c5"]);

    let c1_children: Vec<_> = forest.roots[0].children.iter().map(ReplyNode::id).collect();
    assert_eq!(c1_children, vec!["c2", "c7"]);
}

#[test]
fn test_author_seeded_snapshot_is_all_orphans() {
    // Only alice's reply is cached; its ancestors were never fetched
    let replies = vec![Reply::new("c3", "abc123", "c2", "alice", 103)];

    let forest = build("abc123", &post(), &replies).unwrap();

    assert!(forest.roots.is_empty());
    assert!(forest.orphans.iter().all(|node| node.orphan));
}

#[test]
fn test_rebuild_after_full_fetch_promotes_orphan() {
    let partial = vec![Reply::new("c3", "abc123", "c2", "alice", 103)];
    let full = vec![
        Reply::new("c1", "abc123", "abc123", "bob", 101),
        Reply::new("c2", "abc123", "c1", "carol", 102),
        Reply::new("c3", "abc123", "c2", "alice", 103),
    ];

    let before = build("abc123", &post(), &partial).unwrap();
    let after = build("abc123", &post(), &full).unwrap();

    assert_eq!(before.orphans.len(), 1);
    assert!(after.orphans.is_empty());
    assert!(!after.find("c3").unwrap().orphan);
}

#[test]
fn test_build_is_deterministic_over_input_order() {
    let mut replies = vec![
        Reply::new("b", "abc123", "abc123", "u", 5),
        Reply::new("a", "abc123", "abc123", "u", 5),
        Reply::new("c", "abc123", "a", "u", 6),
    ];

    let first = build("abc123", &post(), &replies).unwrap();
    replies.reverse();
    let second = build("abc123", &post(), &replies).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_cycle_error_names_the_thread() {
    let replies = vec![
        Reply::new("a", "abc123", "b", "u", 1),
        Reply::new("b", "abc123", "a", "u", 2),
    ];

    let err = build("abc123", &post(), &replies).unwrap_err();
    assert_eq!(err.thread_id(), "abc123");
    assert!(matches!(
        err,
        TreeError::StructuralInconsistency { reason: Inconsistency::Cycle(_), .. }
    ));
    assert!(err.to_string().contains("a -> b"));
}
