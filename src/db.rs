use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;

use crate::models::{ApplicationStatus, DigestSnapshot, Preferences, StatusEvent};

/// Most-recent-first application activity log, oldest dropped past this.
const HISTORY_CAP: usize = 20;

pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    pub fn open() -> Result<Self> {
        let path = Self::default_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)?;
        Ok(Self { conn, path })
    }

    /// In-memory database for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn,
            path: PathBuf::from(":memory:"),
        };
        db.init()?;
        Ok(db)
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn default_path() -> Result<PathBuf> {
        // Use XDG data directory or fallback
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "jobtrack") {
            Ok(proj_dirs.data_dir().join("jobtrack.db"))
        } else {
            Ok(PathBuf::from("jobtrack.db"))
        }
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS preferences (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                json TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS saved_jobs (
                job_id INTEGER PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS statuses (
                job_id INTEGER PRIMARY KEY,
                status TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS status_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                job_id INTEGER NOT NULL,
                status TEXT NOT NULL,
                changed_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS digests (
                date_key TEXT PRIMARY KEY,
                json TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    pub fn ensure_initialized(&self) -> Result<()> {
        let tables: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='preferences'",
            [],
            |row| row.get(0),
        )?;
        if tables == 0 {
            return Err(anyhow!(
                "Database not initialized. Run 'jobtrack init' first."
            ));
        }
        Ok(())
    }

    // --- Preference store (single JSON blob, replaced wholesale) ---

    /// Fails closed: a missing or malformed blob reads as "no preferences
    /// configured", never as an error.
    pub fn load_preferences(&self) -> Result<Option<Preferences>> {
        let json: Option<String> = self
            .conn
            .query_row("SELECT json FROM preferences WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?;

        Ok(json.and_then(|j| serde_json::from_str(&j).ok()))
    }

    pub fn save_preferences(&self, prefs: &Preferences) -> Result<()> {
        let json = serde_json::to_string(prefs)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO preferences (id, json) VALUES (1, ?1)",
            [json],
        )?;
        Ok(())
    }

    pub fn clear_preferences(&self) -> Result<()> {
        self.conn.execute("DELETE FROM preferences", [])?;
        Ok(())
    }

    // --- Saved-job set ---

    pub fn save_job(&self, job_id: i64) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO saved_jobs (job_id) VALUES (?1)",
            [job_id],
        )?;
        Ok(())
    }

    pub fn unsave_job(&self, job_id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM saved_jobs WHERE job_id = ?1", [job_id])?;
        Ok(())
    }

    pub fn is_saved(&self, job_id: i64) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM saved_jobs WHERE job_id = ?1",
            [job_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn saved_ids(&self) -> Result<Vec<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT job_id FROM saved_jobs ORDER BY job_id")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to list saved jobs")
    }

    // --- Application status + bounded history ---

    pub fn record_status(&self, job_id: i64, status: ApplicationStatus) -> Result<()> {
        self.conn.execute(
            "INSERT INTO statuses (job_id, status) VALUES (?1, ?2)
             ON CONFLICT(job_id) DO UPDATE SET status = ?2, updated_at = datetime('now')",
            params![job_id, status.to_string()],
        )?;
        self.conn.execute(
            "INSERT INTO status_history (job_id, status) VALUES (?1, ?2)",
            params![job_id, status.to_string()],
        )?;
        // Trim to the newest HISTORY_CAP rows.
        self.conn.execute(
            "DELETE FROM status_history WHERE id NOT IN
             (SELECT id FROM status_history ORDER BY id DESC LIMIT ?1)",
            [HISTORY_CAP as i64],
        )?;
        Ok(())
    }

    /// Fails closed: an unparseable stored status reads as Not Applied.
    pub fn current_status(&self, job_id: i64) -> Result<ApplicationStatus> {
        let status: Option<String> = self
            .conn
            .query_row(
                "SELECT status FROM statuses WHERE job_id = ?1",
                [job_id],
                |row| row.get(0),
            )
            .optional()?;

        Ok(status
            .and_then(|s| s.parse().ok())
            .unwrap_or(ApplicationStatus::NotApplied))
    }

    /// All recorded statuses, for building the view pipeline's status map.
    /// Rows with an unparseable status are skipped, so a corrupted row reads
    /// as the Not Applied default rather than failing the operation.
    pub fn all_statuses(&self) -> Result<Vec<(i64, ApplicationStatus)>> {
        let mut stmt = self.conn.prepare("SELECT job_id, status FROM statuses")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (job_id, status) = row?;
            if let Ok(status) = status.parse() {
                out.push((job_id, status));
            }
        }
        Ok(out)
    }

    pub fn history(&self) -> Result<Vec<StatusEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT job_id, status, changed_at FROM status_history ORDER BY id DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (job_id, status, changed_at) = row?;
            events.push(StatusEvent {
                job_id,
                status: status.parse()?,
                changed_at,
            });
        }
        Ok(events)
    }

    // --- Digest store, keyed by local calendar date ---

    pub fn put_digest(&self, snapshot: &DigestSnapshot) -> Result<()> {
        let json = serde_json::to_string(snapshot)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO digests (date_key, json) VALUES (?1, ?2)",
            params![snapshot.date, json],
        )?;
        Ok(())
    }

    /// Fails closed on a malformed snapshot blob.
    pub fn get_digest(&self, date_key: &str) -> Result<Option<DigestSnapshot>> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT json FROM digests WHERE date_key = ?1",
                [date_key],
                |row| row.get(0),
            )
            .optional()?;

        Ok(json.and_then(|j| serde_json::from_str(&j).ok()))
    }
}
