//! Client for the placeholder REST endpoint that plays the "server" role.
//!
//! The endpoint returns generic `{id, title, ...}` posts. Only the id and a
//! title-like field are used; writes are best effort and never persisted
//! remotely.

use quote_types::Quote;
use serde::Deserialize;
use std::time::Duration;

pub const REMOTE_ID_PREFIX: &str = "srv-";
pub const REMOTE_CATEGORY: &str = "Server";

/// A post as returned by the endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RemotePost {
    pub id: serde_json::Value,
    #[serde(alias = "text")]
    pub title: String,
}

impl RemotePost {
    fn remote_id(&self) -> String {
        match &self.id {
            serde_json::Value::String(s) => format!("{}{}", REMOTE_ID_PREFIX, s),
            other => format!("{}{}", REMOTE_ID_PREFIX, other),
        }
    }
}

/// Map the first `limit` posts into quotes stamped with `fetched_at`.
pub fn posts_to_quotes(posts: Vec<RemotePost>, limit: usize, fetched_at: i64) -> Vec<Quote> {
    posts
        .into_iter()
        .take(limit)
        .map(|post| Quote {
            id: post.remote_id(),
            text: post.title,
            category: REMOTE_CATEGORY.to_string(),
            updated_at: fetched_at,
        })
        .collect()
}

/// Client shared by sync and best-effort posts. The timeout turns a hung
/// endpoint into an ordinary failed cycle.
pub fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            log::warn!("[SYNC] Failed to build HTTP client: {}, using defaults", e);
            reqwest::Client::new()
        })
}

async fn get_posts(client: &reqwest::Client, url: &str) -> Result<Vec<RemotePost>, String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| format!("Remote request failed: {}", e))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| format!("Failed to read response: {}", e))?;

    if !status.is_success() {
        return Err(format!("Remote error ({}): {}", status, truncate_error(&body)));
    }

    serde_json::from_str(&body).map_err(|e| format!("Invalid posts payload: {}", e))
}

/// Fetch the remote snapshot. Any failure is logged and yields an empty
/// list so the caller simply skips merging this cycle.
pub async fn fetch_remote(
    client: &reqwest::Client,
    url: &str,
    limit: usize,
    fetched_at: i64,
) -> Vec<Quote> {
    match get_posts(client, url).await {
        Ok(posts) => posts_to_quotes(posts, limit, fetched_at),
        Err(e) => {
            log::warn!("[SYNC] Server sync failed: {}", e);
            Vec::new()
        }
    }
}

/// Best-effort POST of a quote. The acknowledgement is only logged.
pub async fn post_quote(client: &reqwest::Client, url: &str, quote: &Quote) {
    match client.post(url).json(quote).send().await {
        Ok(resp) if resp.status().is_success() => {
            log::debug!("[SYNC] Posted {} ({})", quote.id, resp.status());
        }
        Ok(resp) => {
            log::warn!("[SYNC] Remote rejected {} ({})", quote.id, resp.status());
        }
        Err(e) => {
            log::warn!("[SYNC] Failed to post {}: {}", quote.id, e);
        }
    }
}

fn truncate_error(body: &str) -> String {
    if body.len() > 200 {
        let mut end = 200;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::http::{header, StatusCode};
    use axum::routing::get;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Serve `body` at `/posts` on an ephemeral local port.
    pub(crate) async fn serve_posts(body: &'static str) -> String {
        serve_posts_with(body, Duration::ZERO, 0).await
    }

    /// Like `serve_posts`, but every GET waits `delay` first and the first
    /// `failures` GETs answer 503.
    pub(crate) async fn serve_posts_with(
        body: &'static str,
        delay: Duration,
        failures: usize,
    ) -> String {
        let calls = Arc::new(AtomicUsize::new(0));
        let app = axum::Router::new().route(
            "/posts",
            get(move || {
                let calls = calls.clone();
                async move {
                    tokio::time::sleep(delay).await;
                    let status = if calls.fetch_add(1, Ordering::SeqCst) < failures {
                        StatusCode::SERVICE_UNAVAILABLE
                    } else {
                        StatusCode::OK
                    };
                    (status, [(header::CONTENT_TYPE, "application/json")], body)
                }
            })
            .post(|| async { (StatusCode::CREATED, "{\"id\":101}") }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        format!("http://{}/posts", addr)
    }

    pub(crate) async fn unreachable_url() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}/posts", addr)
    }

    #[test]
    fn test_posts_to_quotes_maps_and_limits() {
        let posts: Vec<RemotePost> = serde_json::from_str(
            r#"[{"id":1,"title":"one","body":"x","userId":1},
                {"id":"b","title":"two"},
                {"id":3,"text":"three"}]"#,
        )
        .unwrap();
        let quotes = posts_to_quotes(posts, 2, 777);
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].id, "srv-1");
        assert_eq!(quotes[0].text, "one");
        assert_eq!(quotes[0].category, "Server");
        assert_eq!(quotes[1].id, "srv-b");
        assert!(quotes.iter().all(|q| q.updated_at == 777));
    }

    #[test]
    fn test_truncate_error() {
        assert_eq!(truncate_error("short"), "short");
        let long = "é".repeat(150);
        assert!(truncate_error(&long).ends_with("..."));
    }

    #[tokio::test]
    async fn test_fetch_remote_success() {
        let url = serve_posts(r#"[{"id":1,"title":"a"},{"id":2,"title":"b"}]"#).await;
        let quotes = fetch_remote(&reqwest::Client::new(), &url, 5, 10).await;
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[1].id, "srv-2");
    }

    #[tokio::test]
    async fn test_fetch_remote_absorbs_failures() {
        let client = reqwest::Client::new();
        let url = unreachable_url().await;
        assert!(fetch_remote(&client, &url, 5, 10).await.is_empty());

        let url = serve_posts(r#"{"not":"a list"}"#).await;
        assert!(fetch_remote(&client, &url, 5, 10).await.is_empty());

        let url = serve_posts_with(r#"[{"id":1,"title":"a"}]"#, Duration::ZERO, 1).await;
        assert!(fetch_remote(&client, &url, 5, 10).await.is_empty());
        assert_eq!(fetch_remote(&client, &url, 5, 10).await.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_remote_gives_up_on_slow_endpoint() {
        let url = serve_posts_with("[]", Duration::from_secs(30), 0).await;
        let client = http_client(Duration::from_millis(200));
        let quotes = tokio::time::timeout(Duration::from_secs(5), fetch_remote(&client, &url, 5, 10))
            .await
            .expect("fetch was not cut off by the client timeout");
        assert!(quotes.is_empty());
    }

    #[tokio::test]
    async fn test_post_quote_is_fire_and_forget() {
        let client = reqwest::Client::new();
        let quote = Quote {
            id: "id-1234567".to_string(),
            text: "t".to_string(),
            category: "c".to_string(),
            updated_at: 1,
        };
        post_quote(&client, &serve_posts("[]").await, &quote).await;
        post_quote(&client, &unreachable_url().await, &quote).await;
    }
}
