//! Plain-text rendering of a thread for downstream indexing

use chrono::DateTime;
use rethread_types::{Post, Reply, Timestamp};
use serde::{Deserialize, Serialize};

use crate::node::{ReplyForest, ReplyNode};

const RULE: &str = "---------------------------------------------";
const BANNER: &str = "============================================";

/// Searchable attributes of a rendered thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadMetadata {
    pub id: String,
    pub author: String,
    pub title: String,
    pub url: String,
    pub created: Timestamp,
    pub score: i64,
    pub num_replies: usize,
    pub num_orphans: usize,
}

impl ThreadMetadata {
    pub fn from_thread(post: &Post, forest: &ReplyForest) -> Self {
        Self {
            id: post.id.clone(),
            author: post.author.clone(),
            title: post.title().unwrap_or_default().to_string(),
            url: post.url().unwrap_or_default().to_string(),
            created: post.created_utc,
            score: post.score().unwrap_or(0),
            num_replies: forest.len(),
            num_orphans: forest.orphans.len(),
        }
    }
}

fn format_time(ts: Timestamp) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ts.to_string())
}

fn or_unknown(value: Option<&str>) -> &str {
    value.unwrap_or("[unknown]")
}

fn push_reply(reply: &Reply, lines: &mut Vec<String>) {
    lines.push(RULE.to_string());
    lines.push(format!("Author: {}", reply.author));
    lines.push(format!(
        "Score: {}",
        reply.score().map(|s| s.to_string()).unwrap_or_else(|| "[unknown]".to_string())
    ));
    lines.push(format!("Created on: {}", format_time(reply.created_utc)));
    lines.push(format!("Reply: {}", or_unknown(reply.body())));
    lines.push(BANNER.to_string());
}

/// Siblings numbered from 1, nested as `1.`, `1.1.`, `1.1.2.`
fn push_level(nodes: &[ReplyNode], prefix: &str, lines: &mut Vec<String>) {
    // Reversed so the first sibling is popped first
    fn numbered<'a>(nodes: &'a [ReplyNode], prefix: &str) -> Vec<(String, &'a ReplyNode)> {
        nodes
            .iter()
            .enumerate()
            .rev()
            .map(|(position, node)| (format!("{}{}.", prefix, position + 1), node))
            .collect()
    }

    let mut stack = numbered(nodes, prefix);
    while let Some((number, node)) = stack.pop() {
        if node.orphan {
            lines.push(format!(
                "{} Reply (detached: parent {} not available)",
                number,
                node.reply.parent_id.as_deref().unwrap_or("unknown")
            ));
        } else {
            lines.push(format!("{} Reply", number));
        }
        push_reply(&node.reply, lines);
        stack.extend(numbered(&node.children, &number));
    }
}

/// Render the post followed by its replies, numbered hierarchically.
/// Orphan subtrees come last under their own heading.
pub fn render_thread(post: &Post, forest: &ReplyForest) -> String {
    let mut lines = vec![
        "POST".to_string(),
        RULE.to_string(),
        format!("Title: {} (Post ID: {})", or_unknown(post.title()), post.id),
        format!("Community: {}", or_unknown(post.community())),
        format!("Author: {}", post.author),
        format!("URL: {}", or_unknown(post.url())),
        format!(
            "Score: {}",
            post.score().map(|s| s.to_string()).unwrap_or_else(|| "[unknown]".to_string())
        ),
        format!("Created on: {}", format_time(post.created_utc)),
        format!("Text: {}", post.body().unwrap_or_default()),
    ];

    if !forest.roots.is_empty() {
        lines.push(BANNER.to_string());
        lines.push("Replies posted under the post:".to_string());
        lines.push(BANNER.to_string());
        push_level(&forest.roots, "", &mut lines);
    }

    if !forest.orphans.is_empty() {
        lines.push(BANNER.to_string());
        lines.push("Detached replies (parent missing from the cache):".to_string());
        lines.push(BANNER.to_string());
        push_level(&forest.orphans, "D", &mut lines);
    }

    tracing::info!(
        "Rendered thread {} with {} replies to a document",
        post.id,
        forest.len()
    );
    lines.join("\n")
}
