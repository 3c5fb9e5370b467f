//! Orchestrator — drives the identifier stream through the fetch pipeline
//!
//! One producer (this module's read loop) and N pool workers. The dedup set
//! lives on the producer's stack and is never shared with the workers, so it
//! needs no synchronization; admitting an identifier is permanent, even when
//! its fetch later fails. Per-task failures are isolated: a permanently
//! failing identifier is logged and abandoned without disturbing the pool.

use crate::client::GraphClient;
use crate::config::Config;
use crate::error::Result;
use crate::flatten::flatten;
use crate::pool::WorkerPool;
use crate::retry::with_rate_limit_retry;
use crate::writer::CsvWriter;
use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Consume identifiers from `input` (one per line) until end of stream,
/// fetch-flatten-write each distinct one on the worker pool, then drain the
/// pool before returning.
///
/// The header row goes out before any work is scheduled, so it precedes all
/// data rows regardless of completion order.
pub async fn export_posts<R, W>(
    config: &Config,
    client: Arc<GraphClient>,
    writer: Arc<CsvWriter<W>>,
    input: R,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write + Send + 'static,
{
    writer.write_header().await?;

    let pool = WorkerPool::new(config.workers);
    let mut seen: HashSet<String> = HashSet::new();

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let id = line.trim();
        if id.is_empty() {
            continue;
        }
        if !seen.insert(id.to_string()) {
            tracing::debug!(post_id = id, "Duplicate identifier skipped");
            continue;
        }

        let client = Arc::clone(&client);
        let writer = Arc::clone(&writer);
        let backoff = config.rate_limit_backoff;
        let id = id.to_string();
        pool.schedule(async move {
            process_post(client, writer, backoff, id).await;
        });
    }

    pool.shutdown().await;
    tracing::info!(distinct = seen.len(), "Export complete");
    Ok(())
}

/// One task's execution: retrying fetch, flatten, atomic batch write.
async fn process_post<W: Write + Send>(
    client: Arc<GraphClient>,
    writer: Arc<CsvWriter<W>>,
    backoff: Duration,
    id: String,
) {
    match with_rate_limit_retry(backoff, || client.fetch_post(&id)).await {
        Ok(post) => {
            let rows = flatten(&post);
            tracing::info!(post_id = %id, rows = rows.len(), "Flattened post");
            if let Err(error) = writer.write_batch(&rows).await {
                tracing::error!(post_id = %id, %error, "Failed to write row batch");
            }
        }
        Err(error) => {
            tracing::error!(post_id = %id, %error, "Abandoning post after permanent failure");
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> Config {
        Config {
            workers: 4,
            rate_limit_backoff: Duration::from_millis(50),
            ..Config::default()
        }
    }

    async fn run_export(server: &MockServer, input: &'static str) -> String {
        let config = test_config();
        let client = Arc::new(GraphClient::new(server.uri(), "tok"));
        let writer = Arc::new(CsvWriter::new(Vec::new()));
        export_posts(
            &config,
            client,
            Arc::clone(&writer),
            tokio::io::BufReader::new(input.as_bytes()),
        )
        .await
        .unwrap();
        let writer = Arc::into_inner(writer).unwrap();
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[tokio::test]
    async fn duplicate_identifiers_are_fetched_once_and_batches_stay_whole() {
        let server = MockServer::start().await;

        // A: always succeeds, tree = root + 1 reaction.
        Mock::given(method("GET"))
            .and(path("/A"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "A",
                "type": "status",
                "reactions": {"data": [{"id": "r1", "name": "Ada", "type": "LIKE"}]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        // B: rate-limited once, then succeeds with one top-level reply.
        Mock::given(method("GET"))
            .and(path("/B"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"message": "request limit reached", "type": "OAuthException"}
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/B"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "B",
                "type": "status",
                "comments": {"data": [{"id": "B_1", "message": "only reply"}]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let started = std::time::Instant::now();
        let output = run_export(&server, "A\nA\nB\n").await;
        assert!(
            started.elapsed() >= Duration::from_millis(50),
            "B's retry must wait out one back-off"
        );

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 5, "header + 2 rows for A + 2 rows for B:\n{output}");
        assert!(lines[0].starts_with("id,level,"));

        let ids: Vec<&str> = lines[1..]
            .iter()
            .map(|line| line.split(',').next().unwrap())
            .collect();
        // Batch order across identifiers is completion order; within each
        // identifier the order is fixed.
        let a_pos = ids.iter().position(|id| *id == "A").unwrap();
        assert_eq!(ids[a_pos + 1], "r1", "A's reaction follows A's root row");
        let b_pos = ids.iter().position(|id| *id == "B").unwrap();
        assert_eq!(ids[b_pos + 1], "B_1", "B's reply follows B's root row");
        assert_eq!(ids.iter().filter(|id| **id == "A").count(), 1);
    }

    #[tokio::test]
    async fn permanently_failing_identifier_is_abandoned_without_rows() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bad"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"message": "Unsupported get request", "type": "GraphMethodException"}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/good"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "good"})))
            .mount(&server)
            .await;

        let output = run_export(&server, "bad\ngood\n").await;
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2, "header + good's root row only:\n{output}");
        assert!(lines[1].starts_with("good,0,"));
    }

    #[tokio::test]
    async fn blank_lines_and_surrounding_whitespace_are_ignored() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/X"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "X"})))
            .expect(1)
            .mount(&server)
            .await;

        let output = run_export(&server, "\n  X  \n\nX\n").await;
        assert_eq!(output.lines().count(), 2, "header + one row for X");
    }

    #[tokio::test]
    async fn empty_input_produces_just_the_header() {
        let server = MockServer::start().await;
        let output = run_export(&server, "").await;
        assert_eq!(output.lines().count(), 1);
        assert!(output.starts_with("id,level,"));
    }
}
