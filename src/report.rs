// Plain-text dashboard: bug table, distributions and clusters
use crate::analyzer::ClusterReport;
use crate::analyzer::statistics::{cluster_sizes, creation_timeline, projection, status_distribution};
use crate::model::BugCollection;
use crate::utils::truncate_chars;
use chrono::NaiveDateTime;
use std::fmt;

const TITLE_WIDTH: usize = 60;
const BAR_WIDTH: usize = 40;

pub struct Dashboard<'a> {
    pub collection: &'a BugCollection,
    pub clusters: &'a ClusterReport<'a>,
}

impl<'a> Dashboard<'a> {
    pub fn new(collection: &'a BugCollection, clusters: &'a ClusterReport<'a>) -> Self {
        Self { collection, clusters }
    }

    fn write_table(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>9}  {:<14}  {:<16}  {:<16}  {:>7}  Title",
            "Bug ID", "Status", "Date Created", "Date Updated", "Cluster"
        )?;
        // Annotations are index-aligned with the collection; absent when clustering was skipped.
        for (i, bug) in self.collection.bugs.iter().enumerate() {
            let cluster = self
                .clusters
                .annotated
                .get(i)
                .map(|a| a.cluster.to_string())
                .unwrap_or_else(|| "-".into());
            writeln!(
                f,
                "{:>9}  {:<14}  {:<16}  {:<16}  {:>7}  {}",
                bug.id,
                truncate_chars(bug.status.as_str(), 14),
                format_time(bug.created_at),
                format_time(bug.updated_at),
                cluster,
                truncate_chars(&bug.title, TITLE_WIDTH)
            )?;
        }
        Ok(())
    }

    fn write_status_distribution(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\nBug Status Distribution")?;
        let dist = status_distribution(&self.collection.bugs);
        let max = dist.values().copied().max().unwrap_or(0);
        for (status, count) in &dist {
            writeln!(f, "  {:<16} {:>5}  {}", status, count, bar(*count, max))?;
        }
        Ok(())
    }

    fn write_timeline(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\nBug Creation Timeline")?;
        let timeline = creation_timeline(&self.collection.bugs);
        if timeline.is_empty() {
            return writeln!(f, "  (no creation dates)");
        }
        let max = timeline.values().copied().max().unwrap_or(0);
        for (day, count) in &timeline {
            writeln!(f, "  {}  {:>5}  {}", day, count, bar(*count, max))?;
        }
        Ok(())
    }

    fn write_clusters(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.clusters;
        let Some(assignment) = &report.assignment else {
            if let Some(reason) = &report.skipped {
                writeln!(f, "\nBug Clusters: skipped ({})", reason)?;
            }
            return Ok(());
        };
        writeln!(
            f,
            "\nBug Clusters (k = {}, seed = {}, {} terms, {} iterations)",
            assignment.k, assignment.seed, report.vocabulary_size, assignment.iterations
        )?;

        let sizes = cluster_sizes(&report.annotated, report.k());
        for (cluster, size) in sizes.iter().enumerate() {
            let terms = report
                .cluster_terms
                .get(cluster)
                .map(|t| t.join(", "))
                .unwrap_or_default();
            writeln!(f, "  #{:<3} {:>5} bugs  [{}]", cluster, size, terms)?;
            let members: Vec<String> = report
                .annotated
                .iter()
                .filter(|a| a.cluster == cluster)
                .map(|a| a.bug.id.to_string())
                .collect();
            if !members.is_empty() {
                writeln!(f, "        {}", members.join(" "))?;
            }
        }

        let points = projection(&report.annotated);
        if !points.is_empty() {
            writeln!(f, "\nCluster Timeline (created, cluster, bug)")?;
            for p in points {
                writeln!(f, "  {}  {:>3}  {}", p.created_at.format("%Y-%m-%d %H:%M"), p.cluster, p.bug_id)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Dashboard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Found {} bugs for release: {} ({})",
            self.collection.len(),
            self.collection.series,
            self.collection.project
        )?;
        if self.collection.is_empty() {
            return writeln!(f, "No data: nothing matched the selected statuses.");
        }
        self.write_table(f)?;
        self.write_status_distribution(f)?;
        self.write_timeline(f)?;
        self.write_clusters(f)
    }
}

fn format_time(time: Option<NaiveDateTime>) -> String {
    time.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".into())
}

fn bar(count: usize, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let len = (count * BAR_WIDTH).div_ceil(max);
    "#".repeat(len)
}
