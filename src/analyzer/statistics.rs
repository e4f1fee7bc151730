use crate::model::{AnnotatedBug, BugRecord};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;

/// Number of bugs per status.
pub fn status_distribution(bugs: &[BugRecord]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for bug in bugs {
        *counts.entry(bug.status.to_string()).or_default() += 1;
    }
    counts
}

/// Bugs created per day. Bugs without a creation time are left out.
pub fn creation_timeline(bugs: &[BugRecord]) -> BTreeMap<NaiveDate, usize> {
    let mut days = BTreeMap::new();
    for created in bugs.iter().filter_map(|b| b.created_at) {
        *days.entry(created.date()).or_default() += 1;
    }
    days
}

/// Member count per cluster label, zero for empty clusters.
pub fn cluster_sizes(annotated: &[AnnotatedBug<'_>], k: usize) -> Vec<usize> {
    let mut sizes = vec![0; k];
    for item in annotated {
        if let Some(size) = sizes.get_mut(item.cluster) {
            *size += 1;
        }
    }
    sizes
}

/// A bug plotted as (creation time, cluster label).
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionPoint {
    pub created_at: NaiveDateTime,
    pub cluster: usize,
    pub bug_id: u64,
}

/// Points for every annotated bug that has a creation time, oldest first.
pub fn projection(annotated: &[AnnotatedBug<'_>]) -> Vec<ProjectionPoint> {
    let mut points: Vec<ProjectionPoint> = annotated
        .iter()
        .filter_map(|item| {
            item.bug.created_at.map(|created_at| ProjectionPoint {
                created_at,
                cluster: item.cluster,
                bug_id: item.bug.id,
            })
        })
        .collect();
    points.sort_by_key(|p| (p.created_at, p.bug_id));
    points
}
