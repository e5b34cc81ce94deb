use rethread_types::Reply;
use serde::{Deserialize, Serialize};

/// A reply and its direct answers, ordered by creation time then id.
///
/// Built fresh for every request and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyNode {
    pub reply: Reply,
    /// Set on root-level nodes whose declared parent is not in the input
    pub orphan: bool,
    pub children: Vec<ReplyNode>,
}

impl ReplyNode {
    pub fn id(&self) -> &str {
        &self.reply.id
    }

    /// This node plus all descendants
    pub fn size(&self) -> usize {
        self.walk().count()
    }

    /// Longest path to a leaf, counting this node
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1)];
        while let Some((node, level)) = stack.pop() {
            deepest = deepest.max(level);
            stack.extend(node.children.iter().map(|child| (child, level + 1)));
        }
        deepest
    }

    /// Pre-order traversal starting at this node
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }
}

// Reply chains can run thousands of levels deep; the derived drop would
// recurse once per level.
impl Drop for ReplyNode {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children);
        }
    }
}

/// Pre-order iterator over nodes
pub struct Walk<'a> {
    stack: Vec<&'a ReplyNode>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a ReplyNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Reply hierarchy of one thread
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplyForest {
    pub thread_id: String,
    /// Replies answering the post directly
    pub roots: Vec<ReplyNode>,
    /// Root-level nodes whose parent is missing, all tagged `orphan`
    pub orphans: Vec<ReplyNode>,
}

impl ReplyForest {
    /// Number of replies in the forest, orphans included
    pub fn len(&self) -> usize {
        self.top_level().map(ReplyNode::size).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty() && self.orphans.is_empty()
    }

    /// Genuine roots first, then orphans
    pub fn top_level(&self) -> impl Iterator<Item = &ReplyNode> {
        self.roots.iter().chain(self.orphans.iter())
    }

    /// Every node, pre-order, roots before orphans
    pub fn walk(&self) -> impl Iterator<Item = &ReplyNode> {
        self.top_level().flat_map(ReplyNode::walk)
    }

    pub fn find(&self, reply_id: &str) -> Option<&ReplyNode> {
        self.walk().find(|node| node.id() == reply_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, children: Vec<ReplyNode>) -> ReplyNode {
        ReplyNode {
            reply: Reply::new(id, "t", "t", "u", 0),
            orphan: false,
            children,
        }
    }

    #[test]
    fn test_walk_is_pre_order() {
        let tree = node("a", vec![node("b", vec![node("c", vec![])]), node("d", vec![])]);
        let ids: Vec<_> = tree.walk().map(ReplyNode::id).collect();

        assert_eq!(ids, vec!["a", "b", "c", "d"]);
        assert_eq!(tree.size(), 4);
        assert_eq!(tree.depth(), 3);
    }

    #[test]
    fn test_deep_nesting_counts_and_drops() {
        let mut tree = node("leaf", vec![]);
        for i in 0..50_000 {
            tree = node(&format!("n{}", i), vec![tree]);
        }

        assert_eq!(tree.size(), 50_001);
        assert_eq!(tree.depth(), 50_001);
        drop(tree);
    }

    #[test]
    fn test_forest_counts_orphans() {
        let mut orphan = node("o", vec![node("p", vec![])]);
        orphan.orphan = true;
        let forest = ReplyForest {
            thread_id: "t".into(),
            roots: vec![node("a", vec![])],
            orphans: vec![orphan],
        };

        assert_eq!(forest.len(), 3);
        assert!(forest.find("p").is_some());
        assert!(forest.find("zzz").is_none());
        assert!(forest.find("o").unwrap().orphan);
    }
}
