//! Core types for graph-export
//!
//! Two families live here:
//! - the wire document model deserialized from the remote API (`Post`,
//!   `Comment`, `Reaction`, `Connection`), and
//! - the flat output schema (`Row`, [`COLUMNS`]) shared by the flattener
//!   and the CSV writer so the two can never disagree on column order.

use serde::Deserialize;

/// Author of a post or comment (the `from` field)
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Author {
    /// Profile identifier
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
}

/// A group the root post was published to
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct GroupRef {
    /// Group identifier
    pub id: String,
    /// Group display name
    #[serde(default)]
    pub name: Option<String>,
}

/// A single reaction — a leaf node with no children
///
/// The `id`/`name` pair identifies the reacting profile; `kind` is the
/// reaction type tag as delivered by the remote (e.g. `LIKE`, `LOVE`).
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Reaction {
    /// Reacting profile's identifier
    pub id: String,
    /// Reacting profile's display name
    #[serde(default)]
    pub name: Option<String>,
    /// Reaction type tag
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// A paginated collection envelope (`{ "data": [...], "paging": {...} }`)
///
/// Missing collections on a node deserialize as an empty connection, so
/// callers can treat "no reactions field" and "empty reactions" uniformly.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Connection<T> {
    /// Items on this page
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    /// Pagination metadata; absent on the last page
    #[serde(default)]
    pub paging: Option<Paging>,
}

impl<T> Default for Connection<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            paging: None,
        }
    }
}

/// Pagination metadata embedded in a listing response
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Paging {
    /// Fully-formed URL of the next page; absent when exhausted
    #[serde(default)]
    pub next: Option<String>,
}

/// A threaded reply — recursive, may carry its own reactions and replies
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Comment {
    /// Comment identifier
    pub id: String,
    /// Comment author
    #[serde(default)]
    pub from: Option<Author>,
    /// Textual body
    #[serde(default)]
    pub message: Option<String>,
    /// Creation timestamp as delivered by the remote
    #[serde(default)]
    pub created_time: Option<String>,
    /// Direct reactions to this comment
    #[serde(default)]
    pub reactions: Connection<Reaction>,
    /// Nested replies to this comment
    #[serde(default)]
    pub comments: Connection<Comment>,
}

/// The root document fetched for one identifier
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Post {
    /// Post identifier
    pub id: String,
    /// Post author
    #[serde(default)]
    pub from: Option<Author>,
    /// Groups/targets the post was published to; the first entry resolves
    /// the group linkage copied into every derived row
    #[serde(default)]
    pub to: Connection<GroupRef>,
    /// Textual body
    #[serde(default)]
    pub message: Option<String>,
    /// Creation timestamp as delivered by the remote
    #[serde(default)]
    pub created_time: Option<String>,
    /// Last-update timestamp as delivered by the remote
    #[serde(default)]
    pub updated_time: Option<String>,
    /// Resource-type tag (`status`, `photo`, `video`, `link`, ...)
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Preview picture URL
    #[serde(default)]
    pub picture: Option<String>,
    /// Attached link URL
    #[serde(default)]
    pub link: Option<String>,
    /// Media source URL (video posts)
    #[serde(default)]
    pub source: Option<String>,
    /// Attachment name
    #[serde(default)]
    pub name: Option<String>,
    /// Attachment caption
    #[serde(default)]
    pub caption: Option<String>,
    /// Attachment description
    #[serde(default)]
    pub description: Option<String>,
    /// Direct reactions to the post
    #[serde(default)]
    pub reactions: Connection<Reaction>,
    /// Top-level comments on the post
    #[serde(default)]
    pub comments: Connection<Comment>,
}

/// Column names of the output schema, in output order
///
/// This is the single source of truth for the row layout: the header, the
/// flattener's row construction, and the post-hoc filter all index into it.
pub const COLUMNS: [&str; 21] = [
    "id",
    "level",
    "from_id",
    "from_name",
    "group_id",
    "group_name",
    "message",
    "created_time",
    "updated_time",
    "type",
    "picture",
    "link",
    "source",
    "name",
    "caption",
    "description",
    "like_count",
    "comment_count",
    "parent_id",
    "parent_type",
    "comment_index",
];

/// One fixed-schema output record derived from exactly one tree node
///
/// Each row kind (post, comment, reaction) populates a subset of the fields;
/// the rest render as empty cells. That sparsity is the schema's design, not
/// an error condition.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Row {
    /// Node identifier
    pub id: String,
    /// Nesting depth: 0 for the root, n for replies n levels deep; unset on
    /// reaction rows
    pub level: Option<u32>,
    /// Author/reactor profile id
    pub from_id: Option<String>,
    /// Author/reactor display name
    pub from_name: Option<String>,
    /// Group id resolved from the root document
    pub group_id: Option<String>,
    /// Group name resolved from the root document
    pub group_name: Option<String>,
    /// Textual body
    pub message: Option<String>,
    /// Normalized creation timestamp
    pub created_time: Option<String>,
    /// Normalized update timestamp
    pub updated_time: Option<String>,
    /// Resource-type tag of the node
    pub kind: Option<String>,
    /// Preview picture URL
    pub picture: Option<String>,
    /// Attached link URL
    pub link: Option<String>,
    /// Media source URL
    pub source: Option<String>,
    /// Attachment name
    pub name: Option<String>,
    /// Attachment caption
    pub caption: Option<String>,
    /// Attachment description
    pub description: Option<String>,
    /// Count of the node's direct reactions only
    pub like_count: Option<usize>,
    /// Count of the root's direct top-level replies only
    pub comment_count: Option<usize>,
    /// Identifier of the parent node (group for the root row)
    pub parent_id: Option<String>,
    /// Resource-type tag of the parent node
    pub parent_type: Option<String>,
    /// Zero-based position among immediate siblings; reply rows only
    pub comment_index: Option<usize>,
}

impl Row {
    /// Render the row as the fixed 21-cell record, unset fields as empty
    /// strings, in [`COLUMNS`] order.
    pub fn to_record(&self) -> [String; 21] {
        fn opt(value: &Option<String>) -> String {
            value.clone().unwrap_or_default()
        }
        fn num<N: ToString>(value: &Option<N>) -> String {
            value.as_ref().map(N::to_string).unwrap_or_default()
        }
        [
            self.id.clone(),
            num(&self.level),
            opt(&self.from_id),
            opt(&self.from_name),
            opt(&self.group_id),
            opt(&self.group_name),
            opt(&self.message),
            opt(&self.created_time),
            opt(&self.updated_time),
            opt(&self.kind),
            opt(&self.picture),
            opt(&self.link),
            opt(&self.source),
            opt(&self.name),
            opt(&self.caption),
            opt(&self.description),
            num(&self.like_count),
            num(&self.comment_count),
            opt(&self.parent_id),
            opt(&self.parent_type),
            num(&self.comment_index),
        ]
    }
}
