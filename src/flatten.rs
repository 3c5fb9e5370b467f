//! Tree flattener — turns one fetched post tree into an ordered row batch
//!
//! Pure transformation, no I/O. The output order is fully deterministic for
//! a given tree: root row first, then the root's reactions, then a
//! depth-first walk of the reply tree where every reply is followed by its
//! own reactions and then its sub-replies, before the next sibling.

use crate::types::{Comment, Post, Reaction, Row};
use chrono::DateTime;

/// Wire format of remote timestamps, e.g. `2016-01-27T10:47:30+0000`
const REMOTE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Output format of normalized timestamps (UTC)
const OUTPUT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Group linkage resolved once from the root document and copied into every
/// descendant row.
#[derive(Clone, Debug, Default)]
struct GroupLink {
    id: Option<String>,
    name: Option<String>,
}

/// Flatten one post tree into its ordered row sequence.
///
/// Row counts follow directly from the tree: one row per node, so a root
/// with R direct reactions and a reply tree of m replies carrying r
/// reactions in total yields `1 + R + m + r` rows.
pub fn flatten(post: &Post) -> Vec<Row> {
    // Group linkage comes from the first linked-group entry; a post without
    // one (timeline posts) just leaves the group columns empty.
    let group = match post.to.data.first() {
        Some(entry) => GroupLink {
            id: Some(entry.id.clone()),
            name: entry.name.clone(),
        },
        None => GroupLink::default(),
    };

    let mut rows = Vec::new();

    rows.push(Row {
        id: post.id.clone(),
        level: Some(0),
        from_id: post.from.as_ref().map(|f| f.id.clone()),
        from_name: post.from.as_ref().and_then(|f| f.name.clone()),
        group_id: group.id.clone(),
        group_name: group.name.clone(),
        message: post.message.clone(),
        created_time: normalize_time(&post.id, post.created_time.as_deref()),
        updated_time: normalize_time(&post.id, post.updated_time.as_deref()),
        kind: post.kind.clone(),
        picture: post.picture.clone(),
        link: post.link.clone(),
        source: post.source.clone(),
        name: post.name.clone(),
        caption: post.caption.clone(),
        description: post.description.clone(),
        like_count: Some(post.reactions.data.len()),
        comment_count: Some(post.comments.data.len()),
        parent_id: group.id.clone(),
        parent_type: group.id.as_ref().map(|_| "group".to_string()),
        comment_index: None,
    });

    for reaction in &post.reactions.data {
        rows.push(reaction_row(reaction, &post.id, post.kind.as_deref(), &group));
    }

    walk_replies(
        &post.comments.data,
        1,
        &post.id,
        post.kind.as_deref(),
        &group,
        &mut rows,
    );

    rows
}

/// Depth-first, sibling-order walk of a reply level.
///
/// `parent_kind` is the resource-type tag of the parent node: the post's own
/// type at depth 1, the literal `comment` below that.
fn walk_replies(
    replies: &[Comment],
    depth: u32,
    parent_id: &str,
    parent_kind: Option<&str>,
    group: &GroupLink,
    rows: &mut Vec<Row>,
) {
    for (index, reply) in replies.iter().enumerate() {
        rows.push(Row {
            id: reply.id.clone(),
            level: Some(depth),
            from_id: reply.from.as_ref().map(|f| f.id.clone()),
            from_name: reply.from.as_ref().and_then(|f| f.name.clone()),
            group_id: group.id.clone(),
            group_name: group.name.clone(),
            message: reply.message.clone(),
            created_time: normalize_time(&reply.id, reply.created_time.as_deref()),
            kind: Some("comment".to_string()),
            like_count: Some(reply.reactions.data.len()),
            parent_id: Some(parent_id.to_string()),
            parent_type: parent_kind.map(str::to_string),
            comment_index: Some(index),
            ..Row::default()
        });

        for reaction in &reply.reactions.data {
            rows.push(reaction_row(reaction, &reply.id, Some("comment"), group));
        }

        walk_replies(
            &reply.comments.data,
            depth + 1,
            &reply.id,
            Some("comment"),
            group,
            rows,
        );
    }
}

/// Build the row for one reaction attached to `parent_id`.
///
/// Reaction rows identify the reacting profile in both the id and from
/// columns and carry no level, dates, or counts.
fn reaction_row(
    reaction: &Reaction,
    parent_id: &str,
    parent_kind: Option<&str>,
    group: &GroupLink,
) -> Row {
    Row {
        id: reaction.id.clone(),
        from_id: Some(reaction.id.clone()),
        from_name: reaction.name.clone(),
        group_id: group.id.clone(),
        group_name: group.name.clone(),
        kind: reaction.kind.clone(),
        parent_id: Some(parent_id.to_string()),
        parent_type: parent_kind.map(str::to_string),
        ..Row::default()
    }
}

/// Normalize one remote timestamp to `YYYY-MM-DD HH:MM:SS` UTC.
pub fn normalize_timestamp(raw: &str) -> crate::error::Result<String> {
    DateTime::parse_from_str(raw, REMOTE_TIME_FORMAT)
        .map(|parsed| parsed.naive_utc().format(OUTPUT_TIME_FORMAT).to_string())
        .map_err(|_| crate::error::Error::InvalidTimestamp(raw.to_string()))
}

/// Soft wrapper around [`normalize_timestamp`] for row construction.
///
/// A missing field stays empty silently; a present-but-unparseable field is
/// logged and rendered empty. Neither aborts flattening.
fn normalize_time(node_id: &str, raw: Option<&str>) -> Option<String> {
    let raw = raw?;
    match normalize_timestamp(raw) {
        Ok(normalized) => Some(normalized),
        Err(error) => {
            tracing::warn!(node_id, raw, %error, "Unparseable timestamp, leaving field empty");
            None
        }
    }
}
