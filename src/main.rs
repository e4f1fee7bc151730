mod analyzer;
mod config;
mod model;
mod normalizer;
mod report;
mod source;
mod storage;
mod utils;

use analyzer::{Analyzer, ClusterPipeline, ClusterReport};
use config::{load_config, AppConfig};
use model::BugCollection;
use report::Dashboard;
use source::{default_series, BugSource, LaunchpadSource};
use storage::SqliteStorage;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.json".to_string());
    let config: Arc<AppConfig> = match load_config(&config_path) {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            error!("Config load error ({}): {}", config_path, e);
            return;
        }
    };

    let source = match LaunchpadSource::new(&config.api_base_url, config.request_timeout_seconds) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to create bug source: {}", e);
            return;
        }
    };

    let storage = match SqliteStorage::new(&config.db_path) {
        Ok(s) => Arc::new(Mutex::new(s)),
        Err(e) => {
            error!("Failed to initialize storage: {}", e);
            return;
        }
    };

    loop {
        run_once(config.clone(), &source, storage.clone()).await;

        if config.refresh_interval_seconds == 0 {
            break;
        }
        info!("Waiting {}s before the next refresh...", config.refresh_interval_seconds);
        tokio::select! {
            _ = sleep(Duration::from_secs(config.refresh_interval_seconds)) => {
                info!("Timer triggered.");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down.");
                break;
            }
        }
    }
}

/// Fetches (or restores) one collection, clusters it and prints the dashboard.
async fn run_once(config: Arc<AppConfig>, source: &impl BugSource, storage: Arc<Mutex<SqliteStorage>>) {
    let Some(series) = resolve_series(&config, source, &storage).await else {
        warn!("No release available for project {}", config.project);
        return;
    };

    // Optionally, report the previous clustering of this release for comparison
    if let Ok(Some(prev)) = storage.lock().await.load_assignment(&config.project, &series) {
        info!(
            "Previous clustering: {} bugs in {} groups (seed {})",
            prev.labels.len(),
            prev.k,
            prev.seed
        );
    }

    let collection = match source.fetch(&config.project, &series, &config.statuses).await {
        Ok(collection) => {
            if let Err(e) = storage.lock().await.save_collection(&collection) {
                warn!("Snapshot save failed: {}", e);
            }
            collection
        }
        Err(e) => {
            warn!("Fetch failed: {}", e);
            match storage.lock().await.load_collection(&config.project, &series) {
                Ok(Some(snapshot)) => {
                    warn!("Using stored snapshot of {} bugs", snapshot.len());
                    snapshot
                }
                Ok(None) => {
                    error!("No stored snapshot for {}/{}", config.project, series);
                    return;
                }
                Err(e) => {
                    error!("Snapshot load failed: {}", e);
                    return;
                }
            }
        }
    };
    info!("Found {} bugs for release: {}", collection.len(), series);

    let outcome = tokio::task::spawn_blocking(move || analyze_and_render(&config, &collection, &storage)).await;
    match outcome {
        Ok(dashboard) => println!("{}", dashboard),
        Err(e) => error!("Clustering task panicked: {}", e),
    }
}

/// The whole pipeline as one blocking unit of work. A rejected cluster count
/// only drops the cluster section; the rest of the dashboard still renders.
fn analyze_and_render(config: &AppConfig, collection: &BugCollection, storage: &Mutex<SqliteStorage>) -> String {
    let pipeline = ClusterPipeline::from_config(&config.clustering);
    let clusters = match pipeline.cluster_bugs(collection) {
        Ok(report) => report,
        Err(e) => {
            warn!("Clustering skipped: {}", e);
            ClusterReport::skipped(e.to_string())
        }
    };

    if let Some(assignment) = &clusters.assignment {
        let saved = storage.blocking_lock().save_assignment(
            &collection.project,
            &collection.series,
            assignment.k,
            assignment.seed,
            &clusters.annotated,
        );
        if let Err(e) = saved {
            warn!("Cluster labels not saved: {}", e);
        }
    }

    Dashboard::new(collection, &clusters).to_string()
}

/// Configured series, else the project's current one, else the newest snapshot.
async fn resolve_series(
    config: &AppConfig,
    source: &impl BugSource,
    storage: &Mutex<SqliteStorage>,
) -> Option<String> {
    if let Some(series) = &config.series {
        return Some(series.clone());
    }

    info!("Fetching available releases (series) for project: {}...", config.project);
    match source.list_series(&config.project).await {
        Ok(list) => default_series(&list).map(|s| {
            info!(
                "Selected release: {} (Version: {})",
                s.name,
                s.version.as_deref().unwrap_or("-")
            );
            s.name.clone()
        }),
        Err(e) => {
            warn!("Series lookup failed: {}", e);
            match storage.lock().await.snapshot_series(&config.project) {
                Ok(list) => list.into_iter().next(),
                Err(e) => {
                    warn!("Snapshot lookup failed: {}", e);
                    None
                }
            }
        }
    }
}
