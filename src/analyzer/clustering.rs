use crate::analyzer::annotate::annotate;
use crate::analyzer::kmeans::KMeans;
use crate::analyzer::vectorizer::{top_terms, Vectorizer};
use crate::config::ClusteringConfig;
use crate::model::{AnnotatedBug, BugCollection, ClusterAssignment, ClusterError};
use crate::normalizer::normalize;
use tracing::{debug, info};

/// Trait defining the interface for a bug clustering analyzer.
pub trait Analyzer {
    fn cluster_bugs<'a>(&self, collection: &'a BugCollection) -> Result<ClusterReport<'a>, ClusterError>;
}

/// Result of one clustering run over a collection.
#[derive(Debug)]
pub struct ClusterReport<'a> {
    /// `None` when clustering was skipped.
    pub assignment: Option<ClusterAssignment>,
    pub annotated: Vec<AnnotatedBug<'a>>,
    /// Most characteristic terms per cluster label.
    pub cluster_terms: Vec<Vec<String>>,
    pub vocabulary_size: usize,
    /// Why no clustering was done, if it was not.
    pub skipped: Option<String>,
}

impl ClusterReport<'_> {
    /// A report with no clusters, so the rest of the dashboard can still render.
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            assignment: None,
            annotated: Vec::new(),
            cluster_terms: Vec::new(),
            vocabulary_size: 0,
            skipped: Some(reason.into()),
        }
    }

    pub fn k(&self) -> usize {
        self.assignment.as_ref().map(|a| a.k).unwrap_or(0)
    }
}

/// normalize -> vectorize -> cluster -> annotate, recomputed on every call.
pub struct ClusterPipeline {
    vectorizer: Vectorizer,
    k: usize,
    seed: u64,
    max_iterations: usize,
    clamp_k: bool,
    top_terms: usize,
}

impl ClusterPipeline {
    #[cfg(test)]
    pub fn new(k: usize, seed: u64) -> Self {
        Self::from_config(&ClusteringConfig {
            cluster_count: k,
            seed,
            ..ClusteringConfig::default()
        })
    }

    pub fn from_config(cfg: &ClusteringConfig) -> Self {
        Self {
            vectorizer: Vectorizer::new(cfg.max_features),
            k: cfg.cluster_count,
            seed: cfg.seed,
            max_iterations: cfg.max_iterations,
            clamp_k: cfg.clamp_k,
            top_terms: cfg.top_terms,
        }
    }

    fn effective_k(&self, n: usize) -> usize {
        if self.clamp_k && self.k > n {
            debug!("Clamping cluster count {} to {} records", self.k, n);
            n
        } else {
            self.k
        }
    }
}

impl Analyzer for ClusterPipeline {
    fn cluster_bugs<'a>(&self, collection: &'a BugCollection) -> Result<ClusterReport<'a>, ClusterError> {
        if collection.is_empty() {
            info!("No bugs for {}/{}, skipping clustering", collection.project, collection.series);
            return Ok(ClusterReport::skipped("no bugs"));
        }

        let k = self.effective_k(collection.len());
        if self.clamp_k && k < 2 {
            info!("Only {} bug(s), skipping clustering", collection.len());
            return Ok(ClusterReport::skipped(format!(
                "{} bug(s) is too few to cluster",
                collection.len()
            )));
        }

        let documents = normalize(&collection.bugs);
        let features = self.vectorizer.vectorize(&documents)?;
        debug!("Vectorized {} documents over {} terms", documents.len(), features.width());

        let assignment = KMeans::new(k, self.seed)
            .with_max_iterations(self.max_iterations)
            .fit(&features.rows)?;
        info!(
            "Clustered {} bugs into {} groups in {} iterations",
            collection.len(),
            k,
            assignment.iterations
        );

        let cluster_terms = (0..k)
            .map(|c| top_terms(&features, &assignment.labels, c, self.top_terms))
            .collect();
        let annotated = annotate(&collection.bugs, &assignment.labels)?;

        Ok(ClusterReport {
            assignment: Some(assignment),
            annotated,
            cluster_terms,
            vocabulary_size: features.width(),
            skipped: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BugRecord, BugStatus};

    fn collection(titles: &[&str]) -> BugCollection {
        let mut c = BugCollection::new("demo", "trunk");
        c.bugs = titles
            .iter()
            .enumerate()
            .map(|(i, t)| BugRecord {
                id: i as u64 + 1,
                title: t.to_string(),
                description: String::new(),
                status: BugStatus::New,
                created_at: None,
                updated_at: None,
            })
            .collect();
        c
    }

    const TITLES: [&str; 6] = [
        "crash on boot",
        "boot fails",
        "UI freeze",
        "freeze on click",
        "crash on shutdown",
        "network drop",
    ];

    #[test]
    fn related_titles_cluster_together_more_often() {
        let bugs = collection(&TITLES);
        let mut crash_pair = 0;
        let mut unrelated_pair = 0;
        for seed in 0..50 {
            let report = ClusterPipeline::new(3, seed).cluster_bugs(&bugs).unwrap();
            let labels: Vec<usize> = report.annotated.iter().map(|a| a.cluster).collect();
            if labels[0] == labels[4] {
                crash_pair += 1;
            }
            if labels[0] == labels[5] {
                unrelated_pair += 1;
            }
        }
        assert!(crash_pair > unrelated_pair, "{crash_pair} vs {unrelated_pair}");
    }

    #[test]
    fn every_bug_gets_a_label_in_range() {
        let bugs = collection(&TITLES);
        let report = ClusterPipeline::new(3, 0).cluster_bugs(&bugs).unwrap();
        assert_eq!(report.annotated.len(), bugs.len());
        assert!(report.annotated.iter().all(|a| a.cluster < 3));
        assert_eq!(report.cluster_terms.len(), 3);
        assert_eq!(report.k(), 3);
    }

    #[test]
    fn runs_are_reproducible() {
        let bugs = collection(&TITLES);
        let pipeline = ClusterPipeline::new(3, 42);
        let a = pipeline.cluster_bugs(&bugs).unwrap();
        let b = pipeline.cluster_bugs(&bugs).unwrap();
        assert_eq!(a.assignment, b.assignment);
    }

    #[test]
    fn empty_collection_is_not_an_error() {
        let bugs = collection(&[]);
        let report = ClusterPipeline::new(3, 0).cluster_bugs(&bugs).unwrap();
        assert!(report.annotated.is_empty());
        assert!(report.assignment.is_none());
        assert!(report.skipped.is_some());
        assert_eq!(report.k(), 0);
    }

    #[test]
    fn too_many_clusters_is_invalid_unless_clamped() {
        let bugs = collection(&["crash", "freeze", "drop"]);
        assert!(ClusterPipeline::new(5, 0).cluster_bugs(&bugs).is_err());

        let clamped = ClusterPipeline::from_config(&ClusteringConfig {
            cluster_count: 5,
            clamp_k: true,
            ..ClusteringConfig::default()
        });
        let report = clamped.cluster_bugs(&bugs).unwrap();
        assert_eq!(report.k(), 3);
    }

    #[test]
    fn clamping_a_single_bug_skips_clustering() {
        let bugs = collection(&["crash on boot"]);
        let clamped = ClusterPipeline::from_config(&ClusteringConfig {
            cluster_count: 5,
            clamp_k: true,
            ..ClusteringConfig::default()
        });
        let report = clamped.cluster_bugs(&bugs).unwrap();
        assert!(report.assignment.is_none());
        assert!(report.annotated.is_empty());
        assert!(report.skipped.as_deref().unwrap().contains("too few"));
    }

    #[test]
    fn blank_documents_still_cluster() {
        let bugs = collection(&["", "", "the"]);
        let report = ClusterPipeline::new(2, 1).cluster_bugs(&bugs).unwrap();
        assert_eq!(report.vocabulary_size, 0);
        assert!(report.annotated.iter().all(|a| a.cluster == 0));
    }
}
