use crate::model::{BugCollection, SeriesInfo, SourceError};

/// Where bug collections come from. Implementations own transport and
/// authentication; callers only see collections or a `SourceError`.
#[async_trait::async_trait]
pub trait BugSource: Send + Sync {
    async fn list_series(&self, project: &str) -> Result<Vec<SeriesInfo>, SourceError>;

    async fn fetch(
        &self,
        project: &str,
        series: &str,
        statuses: &[String],
    ) -> Result<BugCollection, SourceError>;
}

/// Picks the first active series, falling back to the first listed one.
pub fn default_series(series: &[SeriesInfo]) -> Option<&SeriesInfo> {
    series.iter().find(|s| s.active).or_else(|| series.first())
}
