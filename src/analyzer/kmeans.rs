use crate::model::{ClusterAssignment, ClusterError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const DEFAULT_MAX_ITERATIONS: usize = 300;

/// Lloyd's K-means with k-means++ seeding. Same input and seed, same labels.
#[derive(Debug, Clone)]
pub struct KMeans {
    k: usize,
    seed: u64,
    max_iterations: usize,
}

impl KMeans {
    pub fn new(k: usize, seed: u64) -> Self {
        Self {
            k,
            seed,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn fit(&self, rows: &[Vec<f64>]) -> Result<ClusterAssignment, ClusterError> {
        self.check_input(rows)?;

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut centroids = self.initial_centroids(rows, &mut rng);
        let mut labels = vec![usize::MAX; rows.len()];
        let mut iterations = 0;

        for _ in 0..self.max_iterations {
            iterations += 1;

            let mut changed = false;
            for (label, row) in labels.iter_mut().zip(rows) {
                let best = nearest(row, &centroids);
                if *label != best {
                    *label = best;
                    changed = true;
                }
            }
            if !changed {
                break;
            }

            update_centroids(rows, &labels, &mut centroids);
        }

        Ok(ClusterAssignment {
            k: self.k,
            seed: self.seed,
            labels,
            iterations,
        })
    }

    fn check_input(&self, rows: &[Vec<f64>]) -> Result<(), ClusterError> {
        if self.k < 2 {
            return Err(ClusterError::InvalidInput(format!(
                "cluster count must be at least 2, got {}",
                self.k
            )));
        }
        if self.k > rows.len() {
            return Err(ClusterError::InvalidInput(format!(
                "cluster count {} exceeds the {} available rows",
                self.k,
                rows.len()
            )));
        }
        let width = rows[0].len();
        if rows.iter().any(|r| r.len() != width) {
            return Err(ClusterError::InvalidInput("feature rows differ in width".into()));
        }
        Ok(())
    }

    /// k-means++: each next centroid is drawn with probability proportional to
    /// its squared distance from the closest centroid chosen so far.
    fn initial_centroids(&self, rows: &[Vec<f64>], rng: &mut StdRng) -> Vec<Vec<f64>> {
        let n = rows.len();
        let mut centroids = Vec::with_capacity(self.k);
        centroids.push(rows[rng.random_range(0..n)].clone());

        let mut closest: Vec<f64> = rows
            .iter()
            .map(|r| squared_distance(r, &centroids[0]))
            .collect();

        while centroids.len() < self.k {
            let total: f64 = closest.iter().sum();
            let pick = if total > 0.0 {
                weighted_pick(&closest, rng.random::<f64>() * total)
            } else {
                // Every point coincides with a centroid already.
                rng.random_range(0..n)
            };
            let centroid = rows[pick].clone();
            for (d, row) in closest.iter_mut().zip(rows) {
                *d = d.min(squared_distance(row, &centroid));
            }
            centroids.push(centroid);
        }
        centroids
    }
}

fn weighted_pick(weights: &[f64], mut target: f64) -> usize {
    let mut last_positive = 0;
    for (i, &w) in weights.iter().enumerate() {
        if w <= 0.0 {
            continue;
        }
        if target < w {
            return i;
        }
        target -= w;
        last_positive = i;
    }
    last_positive
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Index of the closest centroid; ties go to the lower index.
fn nearest(row: &[f64], centroids: &[Vec<f64>]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        let d = squared_distance(row, c);
        if d < best_dist {
            best = i;
            best_dist = d;
        }
    }
    best
}

/// Moves each centroid to the mean of its members. Empty clusters keep theirs.
fn update_centroids(rows: &[Vec<f64>], labels: &[usize], centroids: &mut [Vec<f64>]) {
    let width = centroids.first().map(Vec::len).unwrap_or(0);
    let mut sums = vec![vec![0.0; width]; centroids.len()];
    let mut counts = vec![0usize; centroids.len()];

    for (row, &label) in rows.iter().zip(labels) {
        counts[label] += 1;
        for (s, v) in sums[label].iter_mut().zip(row) {
            *s += v;
        }
    }

    for ((centroid, sum), count) in centroids.iter_mut().zip(sums).zip(counts) {
        if count == 0 {
            continue;
        }
        *centroid = sum.into_iter().map(|s| s / count as f64).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs() -> Vec<Vec<f64>> {
        vec![
            vec![0.0, 0.1],
            vec![0.2, 0.0],
            vec![10.0, 10.1],
            vec![0.1, 0.2],
            vec![10.2, 9.9],
            vec![9.9, 10.0],
        ]
    }

    fn co_clustered(labels: &[usize], a: usize, b: usize) -> bool {
        labels[a] == labels[b]
    }

    /// Pairs of points sharing a cluster; independent of label numbering.
    fn same_partition(a: &[usize], b: &[usize]) -> bool {
        (0..a.len()).all(|i| (0..a.len()).all(|j| co_clustered(a, i, j) == co_clustered(b, i, j)))
    }

    #[test]
    fn separates_obvious_groups() {
        for seed in 0..20 {
            let result = KMeans::new(2, seed).fit(&blobs()).unwrap();
            let l = &result.labels;
            assert!(co_clustered(l, 0, 1) && co_clustered(l, 0, 3));
            assert!(co_clustered(l, 2, 4) && co_clustered(l, 2, 5));
            assert!(!co_clustered(l, 0, 2));
        }
    }

    #[test]
    fn labels_stay_in_range() {
        for k in 2..=6 {
            let result = KMeans::new(k, 7).fit(&blobs()).unwrap();
            assert_eq!(result.labels.len(), 6);
            assert!(result.labels.iter().all(|&l| l < k));
        }
    }

    #[test]
    fn same_seed_same_partition() {
        let first = KMeans::new(3, 42).fit(&blobs()).unwrap();
        let second = KMeans::new(3, 42).fit(&blobs()).unwrap();
        assert!(same_partition(&first.labels, &second.labels));
        assert_eq!(first, second);
    }

    #[test]
    fn rejects_k_below_two() {
        let err = KMeans::new(1, 0).fit(&blobs()).unwrap_err();
        assert!(matches!(err, ClusterError::InvalidInput(_)));
    }

    #[test]
    fn rejects_k_above_row_count() {
        let rows = blobs();
        let err = KMeans::new(rows.len() + 5, 0).fit(&rows).unwrap_err();
        assert!(matches!(err, ClusterError::InvalidInput(_)));
    }

    #[test]
    fn rejects_ragged_rows() {
        let rows = vec![vec![0.0, 1.0], vec![1.0], vec![2.0, 2.0]];
        assert!(KMeans::new(2, 0).fit(&rows).is_err());
    }

    #[test]
    fn duplicate_points_leave_empty_clusters() {
        let rows = vec![vec![1.0, 0.0]; 4];
        let result = KMeans::new(3, 5).fit(&rows).unwrap();
        assert_eq!(result.labels, vec![0, 0, 0, 0]);
    }

    #[test]
    fn zero_width_rows_are_accepted() {
        let rows = vec![Vec::new(); 3];
        let result = KMeans::new(2, 0).fit(&rows).unwrap();
        assert!(result.labels.iter().all(|&l| l < 2));
    }

    #[test]
    fn stops_at_iteration_cap() {
        let result = KMeans::new(2, 3).with_max_iterations(1).fit(&blobs()).unwrap();
        assert_eq!(result.iterations, 1);
        assert!(result.labels.iter().all(|&l| l < 2));
    }
}
