use crate::model::{AnnotatedBug, BugCollection, BugRecord, BugStatus, StorageError};
use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Last fetched collection per (project, series) plus its latest clustering.
pub struct SqliteStorage {
    conn: Connection,
}

/// Stored cluster labels for one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredAssignment {
    pub k: usize,
    pub seed: u64,
    pub labels: Vec<(u64, usize)>,
}

impl SqliteStorage {
    /// Opens the database (`:memory:` works too) and creates missing tables.
    pub fn new(db_path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(db_path)?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS snapshots (
                project TEXT NOT NULL,
                series TEXT NOT NULL,
                fetched_at TEXT NOT NULL,
                PRIMARY KEY (project, series)
            );

            CREATE TABLE IF NOT EXISTS bugs (
                project TEXT NOT NULL,
                series TEXT NOT NULL,
                position INTEGER NOT NULL,
                id INTEGER NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL,
                created_at TEXT,
                updated_at TEXT,
                PRIMARY KEY (project, series, id)
            );

            CREATE TABLE IF NOT EXISTS clusters (
                project TEXT NOT NULL,
                series TEXT NOT NULL,
                bug_id INTEGER NOT NULL,
                cluster INTEGER NOT NULL,
                k INTEGER NOT NULL,
                seed INTEGER NOT NULL,
                PRIMARY KEY (project, series, bug_id)
            );
            "
        )?;

        Ok(Self { conn })
    }

    /// Replaces the stored snapshot for the collection's (project, series).
    pub fn save_collection(&mut self, collection: &BugCollection) -> Result<(), StorageError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM bugs WHERE project = ?1 AND series = ?2",
            params![&collection.project, &collection.series],
        )?;
        tx.execute(
            "DELETE FROM clusters WHERE project = ?1 AND series = ?2",
            params![&collection.project, &collection.series],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO bugs (
                    project, series, position, id, title,
                    description, status, created_at, updated_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for (position, bug) in collection.bugs.iter().enumerate() {
                stmt.execute(params![
                    &collection.project,
                    &collection.series,
                    position as i64,
                    bug.id as i64,
                    &bug.title,
                    &bug.description,
                    bug.status.as_str(),
                    &bug.created_at,
                    &bug.updated_at,
                ])?;
            }
        }
        tx.execute(
            "INSERT OR REPLACE INTO snapshots (project, series, fetched_at) VALUES (?1, ?2, ?3)",
            params![&collection.project, &collection.series, Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Loads a stored snapshot in its original order, if one exists.
    pub fn load_collection(&self, project: &str, series: &str) -> Result<Option<BugCollection>, StorageError> {
        let known: Option<String> = self
            .conn
            .query_row(
                "SELECT fetched_at FROM snapshots WHERE project = ?1 AND series = ?2",
                params![project, series],
                |row| row.get(0),
            )
            .optional()?;
        if known.is_none() {
            return Ok(None);
        }

        let mut stmt = self.conn.prepare(
            "SELECT id, title, description, status, created_at, updated_at
             FROM bugs WHERE project = ?1 AND series = ?2 ORDER BY position ASC",
        )?;
        let rows = stmt.query_map(params![project, series], Self::map_bug)?;

        let mut collection = BugCollection::new(project, series);
        for bug in rows {
            collection.bugs.push(bug?);
        }
        Ok(Some(collection))
    }

    /// Series of `project` with a stored snapshot, most recently fetched first.
    pub fn snapshot_series(&self, project: &str) -> Result<Vec<String>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT series FROM snapshots WHERE project = ?1 ORDER BY fetched_at DESC, series ASC",
        )?;
        let rows = stmt.query_map(params![project], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Replaces the stored labels for one collection.
    pub fn save_assignment(
        &mut self,
        project: &str,
        series: &str,
        k: usize,
        seed: u64,
        annotated: &[AnnotatedBug<'_>],
    ) -> Result<(), StorageError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM clusters WHERE project = ?1 AND series = ?2",
            params![project, series],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO clusters (project, series, bug_id, cluster, k, seed)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for item in annotated {
                stmt.execute(params![
                    project,
                    series,
                    item.bug.id as i64,
                    item.cluster as i64,
                    k as i64,
                    seed as i64,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn load_assignment(&self, project: &str, series: &str) -> Result<Option<StoredAssignment>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT bug_id, cluster, k, seed FROM clusters
             WHERE project = ?1 AND series = ?2 ORDER BY bug_id ASC",
        )?;
        let rows = stmt.query_map(params![project, series], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?;

        let mut stored: Option<StoredAssignment> = None;
        for row in rows {
            let (bug_id, cluster, k, seed) = row?;
            if cluster < 0 || cluster >= k {
                return Err(StorageError::InvalidData(format!(
                    "bug {} has label {} outside 0..{}",
                    bug_id, cluster, k
                )));
            }
            let entry = stored.get_or_insert_with(|| StoredAssignment {
                k: k as usize,
                seed: seed as u64,
                labels: Vec::new(),
            });
            entry.labels.push((bug_id as u64, cluster as usize));
        }
        Ok(stored)
    }

    fn map_bug(row: &Row) -> Result<BugRecord, rusqlite::Error> {
        let id: i64 = row.get(0)?;
        let status: String = row.get(3)?;
        let created_at: Option<NaiveDateTime> = row.get(4)?;
        let updated_at: Option<NaiveDateTime> = row.get(5)?;

        Ok(BugRecord {
            id: id as u64,
            title: row.get(1)?,
            description: row.get(2)?,
            status: BugStatus::parse(&status),
            created_at,
            updated_at,
        })
    }
}
