//! Append-only event comment streams and their threaded view.

use super::EVENT_CHAT_LIST;
use crate::store::{ListEntry, StoreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One entry of `event_chat/{eventID}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Push key assigned by the store.
    #[serde(skip)]
    pub key: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(rename = "photoURL", default)]
    pub photo_url: String,
    pub uid: String,
    pub text: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date: DateTime<Utc>,
    /// Key of the comment this one replies to.
    #[serde(rename = "parentID", default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl Comment {
    pub fn from_entry(entry: &ListEntry) -> StoreResult<Self> {
        let mut comment: Self =
            serde_json::from_value(serde_json::Value::Object(entry.data.clone()))?;
        comment.key = entry.key.clone();
        Ok(comment)
    }
}

/// A comment with its direct replies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentNode {
    pub comment: Comment,
    pub replies: Vec<CommentNode>,
}

pub fn comment_list_path(event_id: &str) -> String {
    format!("{EVENT_CHAT_LIST}/{event_id}")
}

/// Folds a push-ordered comment list into threads.
///
/// Roots and replies keep push order. A reply whose parent is not in the list
/// is promoted to a root.
pub fn build_comment_tree(comments: &[Comment]) -> Vec<CommentNode> {
    let known: HashSet<&str> = comments.iter().map(|c| c.key.as_str()).collect();
    let mut children: HashMap<&str, Vec<&Comment>> = HashMap::new();
    let mut roots = Vec::new();

    for comment in comments {
        match comment.parent_id.as_deref() {
            Some(parent) if parent != comment.key && known.contains(parent) => {
                children.entry(parent).or_default().push(comment);
            }
            _ => roots.push(comment),
        }
    }

    let mut visited = HashSet::new();
    roots
        .into_iter()
        .map(|root| build_node(root, &children, &mut visited))
        .collect()
}

fn build_node<'a>(
    comment: &'a Comment,
    children: &HashMap<&'a str, Vec<&'a Comment>>,
    visited: &mut HashSet<&'a str>,
) -> CommentNode {
    visited.insert(comment.key.as_str());
    let mut replies = Vec::new();
    for reply in children.get(comment.key.as_str()).into_iter().flatten() {
        if visited.contains(reply.key.as_str()) {
            continue;
        }
        replies.push(build_node(*reply, children, visited));
    }
    CommentNode {
        comment: comment.clone(),
        replies,
    }
}
