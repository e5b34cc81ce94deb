// PullPush archive client (HTTP direct, no SDK)

use async_stream::try_stream;
use async_trait::async_trait;
use reqwest::StatusCode;
use rethread_types::{Post, Timestamp};
use serde_json::Value;
use std::collections::HashSet;

use crate::config::PullPushConfig;
use crate::error::{Result, SourceError};
use crate::pullpush::decode::{to_post, to_reply};
use crate::traits::{ItemSource, ItemStream, SourceItem, SourceScope};

/// `ItemSource` backed by the PullPush Reddit archive
#[derive(Clone)]
pub struct PullPushClient {
    http_client: reqwest::Client,
    config: PullPushConfig,
}

impl PullPushClient {
    pub fn new(config: PullPushConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self { http_client, config })
    }

    pub fn config(&self) -> &PullPushConfig {
        &self.config
    }

    fn scope_query(scope: &SourceScope) -> (&'static str, Vec<(String, String)>) {
        match scope {
            SourceScope::AuthorPosts(author) => ("submission", vec![("author".to_string(), author.clone())]),
            SourceScope::AuthorReplies(author) => ("comment", vec![("author".to_string(), author.clone())]),
            SourceScope::ThreadReplies(thread) => ("comment", vec![("link_id".to_string(), thread.clone())]),
        }
    }

    /// One GET against `{base}/{endpoint}/`, retried on transport errors,
    /// timeouts, 429 and 5xx. Returns the `data` array.
    async fn api_request(&self, endpoint: &str, params: &[(String, String)]) -> Result<Vec<Value>> {
        let url = format!("{}/{}/", self.config.base_url.trim_end_matches('/'), endpoint);
        let attempts = self.config.max_retries + 1;
        let mut last_error = None;

        for attempt in 1..=attempts {
            if attempt > 1 {
                let delay = self.config.retry_delay(attempt - 1);
                tracing::warn!("Retrying {} (attempt {}/{}) in {:?}", url, attempt, attempts, delay);
                tokio::time::sleep(delay).await;
            }

            let response = match self.http_client.get(&url).query(params).send().await {
                Ok(response) => response,
                Err(e) if e.is_timeout() => {
                    last_error = Some(SourceError::Timeout { attempts: attempt });
                    continue;
                }
                Err(e) if e.is_connect() || e.is_request() => {
                    last_error = Some(SourceError::Http(e));
                    continue;
                }
                Err(e) => return Err(SourceError::Http(e)),
            };

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                last_error = Some(SourceError::Unavailable(format!("{} returned {}", url, status)));
                continue;
            }
            if !status.is_success() {
                return Err(SourceError::Unavailable(format!("{} returned {}", url, status)));
            }

            let body: Value = response.json().await?;
            let data = match body.get("data") {
                Some(Value::Array(items)) => items.clone(),
                _ => Vec::new(),
            };
            return Ok(data);
        }

        Err(match last_error {
            Some(SourceError::Timeout { .. }) => SourceError::Timeout { attempts },
            Some(e) => SourceError::Unavailable(format!("{} failed after {} attempt(s): {}", url, attempts, e)),
            None => SourceError::Unavailable(format!("{} was never attempted", url)),
        })
    }
}

#[async_trait]
impl ItemSource for PullPushClient {
    fn name(&self) -> &str {
        "pullpush"
    }

    async fn fetch_post(&self, post_id: &str) -> Result<Option<Post>> {
        let params = vec![("ids".to_string(), post_id.to_string())];
        let data = self.api_request("submission", &params).await?;

        match data.into_iter().next() {
            Some(raw) => Ok(Some(to_post(raw)?)),
            None => Ok(None),
        }
    }

    async fn list_items(&self, scope: SourceScope, lower_bound: Option<Timestamp>) -> Result<ItemStream> {
        let client = self.clone();
        let (endpoint, scope_params) = Self::scope_query(&scope);

        tracing::info!("Listing {} from {} (lower bound {:?})", scope, client.name(), lower_bound);

        let stream = try_stream! {
            // `after` is exclusive upstream, so step back one second to keep
            // the lower bound inclusive; ids already yielded at the page
            // boundary timestamp are skipped on the next page.
            let mut after = lower_bound.map(|bound| bound - 1);
            let mut boundary_ts: Option<Timestamp> = None;
            let mut boundary_ids: HashSet<String> = HashSet::new();
            let mut count = 0usize;

            loop {
                let mut params = scope_params.clone();
                params.push(("size".to_string(), client.config.batch_size.to_string()));
                params.push(("sort".to_string(), "asc".to_string()));
                params.push(("sort_type".to_string(), "created_utc".to_string()));
                if let Some(after) = after {
                    params.push(("after".to_string(), after.to_string()));
                }

                let page = client.api_request(endpoint, &params).await?;
                if page.is_empty() {
                    break;
                }
                let full_page = page.len() >= client.config.batch_size as usize;

                let mut fresh = 0usize;
                for raw in page {
                    let item = match scope {
                        SourceScope::AuthorPosts(_) => SourceItem::Post(to_post(raw)?),
                        _ => SourceItem::Reply(to_reply(raw)?),
                    };
                    let ts = item.created_utc();

                    if lower_bound.is_some_and(|bound| ts < bound) {
                        continue;
                    }
                    if boundary_ts == Some(ts) && boundary_ids.contains(item.id()) {
                        continue;
                    }

                    if boundary_ts == Some(ts) {
                        boundary_ids.insert(item.id().to_string());
                    } else if boundary_ts.map_or(true, |b| ts > b) {
                        boundary_ts = Some(ts);
                        boundary_ids.clear();
                        boundary_ids.insert(item.id().to_string());
                    }

                    fresh += 1;
                    yield item;
                }

                if fresh == 0 {
                    // A full page of already-seen ids means more items share the
                    // boundary second than one page holds; the rest cannot be reached.
                    if full_page {
                        Err::<(), _>(SourceError::Unavailable(format!(
                            "{} stalled at page boundary {:?} after {} items",
                            scope, boundary_ts, count
                        )))?;
                    }
                    break;
                }
                count += fresh;
                tracing::debug!("Fetched {} items for {}", count, scope);

                after = boundary_ts.map(|ts| ts - 1);
                tokio::time::sleep(client.config.rate_limit).await;
            }

            tracing::info!("Finished listing {}: {} items", scope, count);
        };

        Ok(Box::pin(stream))
    }
}
