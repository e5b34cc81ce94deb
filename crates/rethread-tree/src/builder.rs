use rethread_types::{Post, Reply};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::{Inconsistency, Result, TreeError};
use crate::node::{ReplyForest, ReplyNode};

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Unvisited,
    OnPath,
    Done,
}

fn chronological(a: &Reply, b: &Reply) -> Ordering {
    a.created_utc
        .cmp(&b.created_utc)
        .then_with(|| a.id.cmp(&b.id))
}

/// Rebuild the reply hierarchy of `thread_id` from a flat snapshot.
///
/// Replies answering `post` become roots, replies answering another reply
/// in the snapshot become its children, and replies whose parent is absent
/// become orphans. Every input reply ends up in exactly one place. Sibling
/// order is creation time, then id.
///
/// Rejects the whole snapshot on duplicate ids, replies from another thread,
/// self-parented replies and parent cycles.
pub fn build(thread_id: &str, post: &Post, replies: &[Reply]) -> Result<ReplyForest> {
    let inconsistent = |reason: Inconsistency| TreeError::StructuralInconsistency {
        thread_id: thread_id.to_string(),
        reason,
    };

    let mut order: Vec<usize> = (0..replies.len()).collect();
    order.sort_by(|&a, &b| chronological(&replies[a], &replies[b]));

    let mut index: HashMap<&str, usize> = HashMap::with_capacity(replies.len());
    for &i in &order {
        let reply = &replies[i];
        if reply.thread_id != thread_id {
            return Err(inconsistent(Inconsistency::ForeignReply {
                reply_id: reply.id.clone(),
                thread_id: reply.thread_id.clone(),
            }));
        }
        if reply.parent_id.as_deref() == Some(reply.id.as_str()) {
            return Err(inconsistent(Inconsistency::SelfParent(reply.id.clone())));
        }
        if index.insert(reply.id.as_str(), i).is_some() {
            return Err(inconsistent(Inconsistency::DuplicateReply(reply.id.clone())));
        }
    }

    if let Some(cycle) = find_cycle(replies, &order, &index, &post.id) {
        return Err(inconsistent(Inconsistency::Cycle(cycle)));
    }

    // Walking in chronological order keeps every child list sorted
    let mut children: HashMap<usize, Vec<usize>> = HashMap::new();
    let mut roots = Vec::new();
    let mut orphans = Vec::new();

    for &i in &order {
        let reply = &replies[i];
        match reply.parent_id.as_deref() {
            Some(parent) if parent == post.id => roots.push(i),
            Some(parent) => match index.get(parent) {
                Some(&p) => children.entry(p).or_default().push(i),
                None => {
                    tracing::warn!(
                        "Reply {} in thread {}: parent {} not found, kept as orphan",
                        reply.id,
                        thread_id,
                        parent
                    );
                    orphans.push(i);
                }
            },
            None => {
                tracing::warn!(
                    "Reply {} in thread {} has no parent reference, kept as orphan",
                    reply.id,
                    thread_id
                );
                orphans.push(i);
            }
        }
    }

    let (roots, orphans) = assemble(replies, &children, roots, orphans);
    let forest = ReplyForest {
        thread_id: thread_id.to_string(),
        roots,
        orphans,
    };

    tracing::debug!(
        "Built thread {}: {} roots, {} orphans, {} replies",
        thread_id,
        forest.roots.len(),
        forest.orphans.len(),
        replies.len()
    );
    Ok(forest)
}

/// First parent cycle found, as reply ids in parent-walk order
fn find_cycle(
    replies: &[Reply],
    order: &[usize],
    index: &HashMap<&str, usize>,
    post_id: &str,
) -> Option<Vec<String>> {
    let mut marks = vec![Mark::Unvisited; replies.len()];

    for &start in order {
        let mut path: Vec<usize> = Vec::new();
        let mut current = start;

        loop {
            match marks[current] {
                Mark::Done => break,
                Mark::OnPath => {
                    // OnPath marks only ever belong to the current walk
                    if let Some(from) = path.iter().position(|&i| i == current) {
                        return Some(path[from..].iter().map(|&i| replies[i].id.clone()).collect());
                    }
                    break;
                }
                Mark::Unvisited => {
                    marks[current] = Mark::OnPath;
                    path.push(current);

                    let parent = replies[current]
                        .parent_id
                        .as_deref()
                        .filter(|parent| *parent != post_id)
                        .and_then(|parent| index.get(parent));
                    match parent {
                        Some(&next) => current = next,
                        None => break,
                    }
                }
            }
        }

        for i in path {
            marks[i] = Mark::Done;
        }
    }

    None
}

/// Turn the index lists into nodes, children before parents, with an
/// explicit stack so arbitrarily deep chains stay off the call stack.
fn assemble(
    replies: &[Reply],
    children: &HashMap<usize, Vec<usize>>,
    roots: Vec<usize>,
    orphans: Vec<usize>,
) -> (Vec<ReplyNode>, Vec<ReplyNode>) {
    let mut built: Vec<Option<ReplyNode>> = (0..replies.len()).map(|_| None).collect();
    let mut stack: Vec<(usize, bool)> = roots
        .iter()
        .chain(orphans.iter())
        .map(|&i| (i, false))
        .collect();

    while let Some((i, expanded)) = stack.pop() {
        let kids = children.get(&i).map(Vec::as_slice).unwrap_or_default();
        if expanded {
            let node = ReplyNode {
                reply: replies[i].clone(),
                orphan: false,
                children: kids.iter().filter_map(|&k| built[k].take()).collect(),
            };
            built[i] = Some(node);
        } else {
            stack.push((i, true));
            stack.extend(kids.iter().map(|&k| (k, false)));
        }
    }

    let roots = roots.into_iter().filter_map(|i| built[i].take()).collect();
    let orphans = orphans
        .into_iter()
        .filter_map(|i| built[i].take())
        .map(|mut node| {
            node.orphan = true;
            node
        })
        .collect();
    (roots, orphans)
}
