use crate::model::{BugCollection, RawBug, SeriesInfo, SourceError};
use crate::normalizer::normalize_all;
use crate::source::traits::BugSource;

use futures::future::join_all;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct Collection<T> {
    #[serde(default = "Vec::new")]
    entries: Vec<T>,
    #[serde(default)]
    next_collection_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SeriesEntry {
    name: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    active: bool,
}

#[derive(Debug, Deserialize)]
struct BugTaskEntry {
    bug_link: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BugEntry {
    id: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    date_created: Option<String>,
    #[serde(default)]
    date_last_updated: Option<String>,
}

/// Reads the public (anonymous) Launchpad web service.
pub struct LaunchpadSource {
    client: Client,
    base_url: String,
}

impl LaunchpadSource {
    pub fn new(base_url: &str, timeout_seconds: u64) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(concat!("bug-radar/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn build_url(&self, path: &[&str]) -> String {
        let mut url = self.base_url.clone();
        for segment in path {
            url.push('/');
            url.push_str(segment);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        what: &str,
    ) -> Result<T, SourceError> {
        debug!("GET {}", url);
        let response = self.client.get(url).query(query).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(what.to_string()));
        }
        if !status.is_success() {
            return Err(SourceError::SourceUnavailable(format!(
                "{} answered {}",
                url, status
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SourceError::SourceUnavailable(format!("bad payload from {}: {}", url, e)))
    }

    /// Reads every page of a collection. Follow-up links already carry the query.
    async fn collect_pages<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        what: &str,
    ) -> Result<Vec<T>, SourceError> {
        let mut page: Collection<T> = self.get_json(url, query, what).await?;
        let mut items = std::mem::take(&mut page.entries);

        while let Some(next) = page.next_collection_link.take() {
            page = self.get_json(&next, &[], what).await?;
            items.append(&mut page.entries);
        }
        Ok(items)
    }

    async fn fetch_bug(&self, task: &BugTaskEntry) -> Result<RawBug, SourceError> {
        let bug: BugEntry = self.get_json(&task.bug_link, &[], &task.bug_link).await?;
        Ok(raw_bug(task, bug))
    }
}

fn raw_bug(task: &BugTaskEntry, bug: BugEntry) -> RawBug {
    RawBug {
        id: bug.id,
        title: bug.title,
        description: bug.description,
        status: task.status.clone(),
        date_created: bug.date_created,
        date_last_updated: bug.date_last_updated,
    }
}

#[async_trait::async_trait]
impl BugSource for LaunchpadSource {
    async fn list_series(&self, project: &str) -> Result<Vec<SeriesInfo>, SourceError> {
        let url = self.build_url(&[project, "series"]);
        let entries: Vec<SeriesEntry> = self
            .collect_pages(&url, &[], &format!("project {}", project))
            .await?;

        for entry in &entries {
            info!(
                "Series: {} (Version: {})",
                entry.name,
                entry.version.as_deref().unwrap_or("-")
            );
        }

        Ok(entries
            .into_iter()
            .map(|e| SeriesInfo {
                name: e.name,
                version: e.version,
                active: e.active,
            })
            .collect())
    }

    async fn fetch(
        &self,
        project: &str,
        series: &str,
        statuses: &[String],
    ) -> Result<BugCollection, SourceError> {
        info!("Fetching bugs for project: {}, release: {}...", project, series);
        let url = self.build_url(&[project, series]);
        let mut query = vec![("ws.op", "searchTasks")];
        query.extend(statuses.iter().map(|s| ("status", s.as_str())));

        let tasks: Vec<BugTaskEntry> = self
            .collect_pages(&url, &query, &format!("release {} of project {}", series, project))
            .await?;
        info!("Found {} bug tasks, resolving bugs...", tasks.len());

        let mut raw = Vec::with_capacity(tasks.len());
        for chunk in tasks.chunks(BUG_FETCH_CONCURRENCY) {
            let results = join_all(chunk.iter().map(|task| self.fetch_bug(task))).await;
            for result in results {
                match result {
                    Ok(bug) => raw.push(bug),
                    Err(SourceError::NotFound(link)) => warn!("Bug vanished while fetching: {}", link),
                    Err(e) => return Err(e),
                }
            }
        }

        let mut collection = BugCollection::new(project, series);
        collection.bugs = normalize_all(raw);
        Ok(collection)
    }
}

const BUG_FETCH_CONCURRENCY: usize = 16;
