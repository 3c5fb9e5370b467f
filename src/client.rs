//! Fetch client for the Graph-style API
//!
//! One GET per root identifier pulls the whole tree in a single response via
//! a wide field-expansion query. The client classifies failures but never
//! retries; the retry policy around it owns that decision. No request
//! timeout is configured: a hung call blocks its worker indefinitely, and no
//! cancellation mechanism exists.

use crate::error::{Error, Result};
use crate::types::{Connection, Post};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Field-expansion list sent with every post fetch.
///
/// This is a wire contract with the remote API: reactions plus two levels of
/// nested comments, 5000 items per level. Reproduce verbatim for
/// compatibility with outputs of prior versions.
pub const POST_FIELDS: &str = "id,from,to,message,created_time,updated_time,type,picture,link,\
     source,name,caption,description,reactions.limit(5000){id,name,type},\
     comments.limit(5000){id,from,message,created_time,\
     reactions.limit(5000){id,name,type},\
     comments.limit(5000){id,from,message,created_time,\
     reactions.limit(5000){id,name,type}}}";

/// Shape of the application-level error object the remote may return in
/// place of a document, distinguished by the reserved top-level `error` key.
#[derive(Debug, Deserialize)]
struct RemoteErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

/// HTTP client for fetching post trees and walking paginated listings
pub struct GraphClient {
    http: reqwest::Client,
    api_base: String,
    token: String,
}

impl GraphClient {
    /// Create a client against `api_base` authenticating with `token`.
    pub fn new(api_base: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// Fetch one post tree by identifier.
    pub async fn fetch_post(&self, id: &str) -> Result<Post> {
        let url = format!("{}/{}", self.api_base, id);
        let response = self
            .http
            .get(&url)
            .query(&[("fields", POST_FIELDS), ("access_token", &self.token)])
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        parse_reply(status, &body)
    }

    /// List post identifiers of a feed node, walking `paging.next` cursor
    /// URLs until the last page. Returns ids in page order.
    pub async fn feed_ids(&self, node: &str, page_size: u32) -> Result<Vec<String>> {
        #[derive(Debug, Deserialize)]
        struct IdOnly {
            id: String,
        }

        let url = format!("{}/{}/feed", self.api_base, node);
        let mut response = self
            .http
            .get(&url)
            .query(&[
                ("fields", "id"),
                ("limit", page_size.to_string().as_str()),
                ("access_token", &self.token),
            ])
            .send()
            .await?;

        let mut ids = Vec::new();
        loop {
            let status = response.status();
            let body = response.text().await?;
            let page: Connection<IdOnly> = parse_reply(status, &body)?;
            ids.extend(page.data.into_iter().map(|item| item.id));

            // The next-page link is a fully-formed URL including the token.
            match page.paging.and_then(|paging| paging.next) {
                Some(next) => {
                    tracing::debug!(ids = ids.len(), "Following feed pagination cursor");
                    response = self.http.get(&next).send().await?;
                }
                None => break,
            }
        }
        Ok(ids)
    }
}

/// Parse a response body, surfacing application-level error objects and
/// non-success statuses as [`Error::Remote`] / [`Error::RateLimited`].
fn parse_reply<T: DeserializeOwned>(status: reqwest::StatusCode, body: &str) -> Result<T> {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(error) if status.is_success() => return Err(error.into()),
        // Non-JSON error page from a proxy or the server itself.
        Err(_) => {
            return Err(Error::Remote {
                kind: status.to_string(),
                message: body.chars().take(200).collect(),
            });
        }
    };

    if let Some(error_object) = value.get("error") {
        let body: RemoteErrorBody = serde_json::from_value(error_object.clone())?;
        return Err(classify_remote_error(body));
    }

    if !status.is_success() {
        return Err(Error::Remote {
            kind: status.to_string(),
            message: body.chars().take(200).collect(),
        });
    }

    Ok(serde_json::from_value(value)?)
}

/// Turn a remote error object into the matching error kind.
///
/// The remote flags throttling only in the error message text, never in the
/// transport status, so a case-insensitive substring match on "limit" is the
/// discriminator (kept from the observed remote behavior).
fn classify_remote_error(body: RemoteErrorBody) -> Error {
    let message = body.message.unwrap_or_default();
    if message.to_lowercase().contains("limit") {
        Error::RateLimited { message }
    } else {
        Error::Remote {
            kind: body.kind.unwrap_or_else(|| "unknown".to_string()),
            message,
        }
    }
}
