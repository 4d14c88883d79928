use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

use super::models::*;
use super::repository::{Cas, CourseRepository, ProposalRepository};

/// Async-safe handle to the catalog database.
///
/// Wraps `CatalogDb` behind `Arc<Mutex>` and runs all access on tokio's
/// blocking thread pool via `spawn_blocking`. The mutex also makes each
/// closure passed to [`DbHandle::call`] atomic with respect to every other.
#[derive(Clone)]
pub struct DbHandle {
    inner: Arc<std::sync::Mutex<CatalogDb>>,
}

impl DbHandle {
    pub fn new(db: CatalogDb) -> Self {
        Self {
            inner: Arc::new(std::sync::Mutex::new(db)),
        }
    }

    /// Run a closure with access to the database on a blocking thread.
    /// All data passed into `f` must be owned (`'static`).
    pub async fn call<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&CatalogDb) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let db = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = db
                .lock()
                .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
            f(&guard)
        })
        .await
        .context("DB task panicked")?
    }
}

const PROPOSAL_COLUMNS: &str = "id, author_id, title, summary, target_audience, \
     learning_objectives, outline, assumed_prerequisites, qualifications, status, \
     review_notes, reviewer_id, created_at, updated_at";

const COURSE_COLUMNS: &str = "id, proposal_id, instructor_id, title, summary, \
     target_audience, learning_objectives, assumed_prerequisites, status, created_at, updated_at";

fn now_text() -> String {
    Utc::now().to_rfc3339()
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .with_context(|| format!("Invalid timestamp in database: {}", value))
}

/// Raw proposal row; statuses and timestamps are parsed in `into_proposal`.
struct ProposalRow {
    id: i64,
    author_id: i64,
    fields: ProposalFields,
    status: String,
    review_notes: String,
    reviewer_id: Option<i64>,
    created_at: String,
    updated_at: String,
}

impl ProposalRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            author_id: row.get(1)?,
            fields: ProposalFields {
                title: row.get(2)?,
                summary: row.get(3)?,
                target_audience: row.get(4)?,
                learning_objectives: row.get(5)?,
                outline: row.get(6)?,
                assumed_prerequisites: row.get(7)?,
                qualifications: row.get(8)?,
            },
            status: row.get(9)?,
            review_notes: row.get(10)?,
            reviewer_id: row.get(11)?,
            created_at: row.get(12)?,
            updated_at: row.get(13)?,
        })
    }

    fn into_proposal(self) -> Result<Proposal> {
        Ok(Proposal {
            id: self.id,
            author_id: self.author_id,
            fields: self.fields,
            status: ProposalStatus::from_str(&self.status).map_err(|e| anyhow::anyhow!(e))?,
            review_notes: self.review_notes,
            reviewer_id: self.reviewer_id,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

struct CourseRow {
    id: i64,
    proposal_id: Option<i64>,
    instructor_id: i64,
    content: CourseContent,
    status: String,
    created_at: String,
    updated_at: String,
}

impl CourseRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            proposal_id: row.get(1)?,
            instructor_id: row.get(2)?,
            content: CourseContent {
                title: row.get(3)?,
                summary: row.get(4)?,
                target_audience: row.get(5)?,
                learning_objectives: row.get(6)?,
                assumed_prerequisites: row.get(7)?,
            },
            status: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    fn into_course(self) -> Result<Course> {
        Ok(Course {
            id: self.id,
            proposal_id: self.proposal_id,
            instructor_id: self.instructor_id,
            content: self.content,
            status: CourseStatus::from_str(&self.status).map_err(|e| anyhow::anyhow!(e))?,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

pub struct CatalogDb {
    conn: Connection,
}

impl CatalogDb {
    /// Open (or create) a SQLite database at the given path and run migrations.
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).context("Failed to open SQLite database")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Create an in-memory SQLite database (for testing).
    pub fn new_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> Result<()> {
        self.conn
            .execute_batch("PRAGMA foreign_keys = ON;")
            .context("Failed to enable foreign keys")?;
        self.run_migrations().context("Failed to run migrations")?;
        Ok(())
    }

    fn run_migrations(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS proposals (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    author_id INTEGER NOT NULL,
                    title TEXT NOT NULL DEFAULT '',
                    summary TEXT NOT NULL DEFAULT '',
                    target_audience TEXT NOT NULL DEFAULT '',
                    learning_objectives TEXT NOT NULL DEFAULT '',
                    outline TEXT NOT NULL DEFAULT '',
                    assumed_prerequisites TEXT NOT NULL DEFAULT '',
                    qualifications TEXT NOT NULL DEFAULT '',
                    status TEXT NOT NULL DEFAULT 'draft',
                    review_notes TEXT NOT NULL DEFAULT '',
                    reviewer_id INTEGER,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS courses (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    proposal_id INTEGER UNIQUE REFERENCES proposals(id),
                    instructor_id INTEGER NOT NULL,
                    title TEXT NOT NULL DEFAULT '',
                    summary TEXT NOT NULL DEFAULT '',
                    target_audience TEXT NOT NULL DEFAULT '',
                    learning_objectives TEXT NOT NULL DEFAULT '',
                    assumed_prerequisites TEXT NOT NULL DEFAULT '',
                    status TEXT NOT NULL DEFAULT 'draft',
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_proposals_author ON proposals(author_id);
                CREATE INDEX IF NOT EXISTS idx_proposals_status ON proposals(status);
                CREATE INDEX IF NOT EXISTS idx_courses_instructor ON courses(instructor_id);
                CREATE INDEX IF NOT EXISTS idx_courses_status ON courses(status);
                ",
            )
            .context("Failed to create tables")?;

        // Additive: databases created before reviews were attributed.
        match self
            .conn
            .execute("ALTER TABLE proposals ADD COLUMN reviewer_id INTEGER", [])
        {
            Ok(_) => {}
            Err(e) if e.to_string().contains("duplicate column") => {}
            Err(e) => return Err(anyhow::anyhow!("Failed to add reviewer_id column: {}", e)),
        }
        Ok(())
    }

    // ── Proposal CRUD ─────────────────────────────────────────────────

    pub fn create_proposal(&self, author_id: i64, fields: &ProposalFields) -> Result<Proposal> {
        let now = now_text();
        self.conn
            .execute(
                "INSERT INTO proposals (author_id, title, summary, target_audience, learning_objectives,
                     outline, assumed_prerequisites, qualifications, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 'draft', ?9, ?9)",
                params![
                    author_id,
                    fields.title,
                    fields.summary,
                    fields.target_audience,
                    fields.learning_objectives,
                    fields.outline,
                    fields.assumed_prerequisites,
                    fields.qualifications,
                    now,
                ],
            )
            .context("Failed to insert proposal")?;
        let id = self.conn.last_insert_rowid();
        self.get_proposal(id)?
            .context("Proposal not found after insert")
    }

    pub fn get_proposal(&self, id: i64) -> Result<Option<Proposal>> {
        let sql = format!("SELECT {} FROM proposals WHERE id = ?1", PROPOSAL_COLUMNS);
        let row = self
            .conn
            .query_row(&sql, params![id], ProposalRow::from_row)
            .optional()
            .context("Failed to query proposal")?;
        row.map(ProposalRow::into_proposal).transpose()
    }

    pub fn list_proposals_by_author(&self, author_id: i64) -> Result<Vec<Proposal>> {
        let sql = format!(
            "SELECT {} FROM proposals WHERE author_id = ?1 ORDER BY id",
            PROPOSAL_COLUMNS
        );
        let mut stmt = self
            .conn
            .prepare(&sql)
            .context("Failed to prepare list_proposals_by_author")?;
        let rows = stmt
            .query_map(params![author_id], ProposalRow::from_row)
            .context("Failed to query proposals")?;
        let mut proposals = Vec::new();
        for row in rows {
            let r = row.context("Failed to read proposal row")?;
            proposals.push(r.into_proposal()?);
        }
        Ok(proposals)
    }

    pub fn list_proposals_by_status(&self, statuses: &[ProposalStatus]) -> Result<Vec<Proposal>> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = (1..=statuses.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {} FROM proposals WHERE status IN ({}) ORDER BY id",
            PROPOSAL_COLUMNS, placeholders
        );
        let mut stmt = self
            .conn
            .prepare(&sql)
            .context("Failed to prepare list_proposals_by_status")?;
        let rows = stmt
            .query_map(
                params_from_iter(statuses.iter().map(|s| s.as_str())),
                ProposalRow::from_row,
            )
            .context("Failed to query proposals")?;
        let mut proposals = Vec::new();
        for row in rows {
            let r = row.context("Failed to read proposal row")?;
            proposals.push(r.into_proposal()?);
        }
        Ok(proposals)
    }

    /// Conditional status write; a zero row count means the expectation failed.
    pub fn set_proposal_status(
        &self,
        id: i64,
        expected: ProposalStatus,
        next: ProposalStatus,
        review: Option<&ReviewStamp>,
    ) -> Result<Cas<Proposal>> {
        let changed = self
            .conn
            .execute(
                "UPDATE proposals
                 SET status = ?1, reviewer_id = COALESCE(?2, reviewer_id),
                     review_notes = COALESCE(?3, review_notes), updated_at = ?4
                 WHERE id = ?5 AND status = ?6",
                params![
                    next.as_str(),
                    review.map(|r| r.reviewer_id),
                    review.map(|r| r.notes.as_str()),
                    now_text(),
                    id,
                    expected.as_str()
                ],
            )
            .context("Failed to update proposal status")?;
        self.cas_outcome(id, changed)
    }

    pub fn replace_proposal_fields(
        &self,
        id: i64,
        expected: ProposalStatus,
        fields: &ProposalFields,
    ) -> Result<Cas<Proposal>> {
        let changed = self
            .conn
            .execute(
                "UPDATE proposals
                 SET title = ?1, summary = ?2, target_audience = ?3, learning_objectives = ?4,
                     outline = ?5, assumed_prerequisites = ?6, qualifications = ?7, updated_at = ?8
                 WHERE id = ?9 AND status = ?10",
                params![
                    fields.title,
                    fields.summary,
                    fields.target_audience,
                    fields.learning_objectives,
                    fields.outline,
                    fields.assumed_prerequisites,
                    fields.qualifications,
                    now_text(),
                    id,
                    expected.as_str(),
                ],
            )
            .context("Failed to update proposal fields")?;
        self.cas_outcome(id, changed)
    }

    pub fn delete_proposal(&self, id: i64, expected: ProposalStatus) -> Result<Cas<Proposal>> {
        let Some(current) = self.get_proposal(id)? else {
            return Ok(Cas::Missing);
        };
        if current.status != expected {
            return Ok(Cas::Stale(current));
        }
        self.conn
            .execute(
                "DELETE FROM proposals WHERE id = ?1 AND status = ?2",
                params![id, expected.as_str()],
            )
            .context("Failed to delete proposal")?;
        Ok(Cas::Applied(current))
    }

    fn cas_outcome(&self, id: i64, changed: usize) -> Result<Cas<Proposal>> {
        match self.get_proposal(id)? {
            None => Ok(Cas::Missing),
            Some(p) if changed > 0 => Ok(Cas::Applied(p)),
            Some(p) => Ok(Cas::Stale(p)),
        }
    }

    // ── Course CRUD ───────────────────────────────────────────────────

    fn insert_course_row(
        &self,
        proposal_id: Option<i64>,
        instructor_id: i64,
        content: &CourseContent,
        on_conflict_ignore: bool,
    ) -> Result<usize> {
        let verb = if on_conflict_ignore {
            "INSERT OR IGNORE"
        } else {
            "INSERT"
        };
        let sql = format!(
            "{} INTO courses (proposal_id, instructor_id, title, summary, target_audience,
                 learning_objectives, assumed_prerequisites, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'draft', ?8, ?8)",
            verb
        );
        self.conn
            .execute(
                &sql,
                params![
                    proposal_id,
                    instructor_id,
                    content.title,
                    content.summary,
                    content.target_audience,
                    content.learning_objectives,
                    content.assumed_prerequisites,
                    now_text(),
                ],
            )
            .context("Failed to insert course")
    }

    pub fn create_course(&self, instructor_id: i64, content: &CourseContent) -> Result<Course> {
        self.insert_course_row(None, instructor_id, content, false)?;
        let id = self.conn.last_insert_rowid();
        self.get_course(id)?.context("Course not found after insert")
    }

    /// Relies on the UNIQUE constraint on `proposal_id`: the insert is a
    /// no-op when a course for the proposal already exists.
    pub fn create_course_if_absent(
        &self,
        proposal_id: i64,
        instructor_id: i64,
        content: &CourseContent,
    ) -> Result<(Course, bool)> {
        let inserted = self.insert_course_row(Some(proposal_id), instructor_id, content, true)?;
        let course = self
            .find_course_by_proposal(proposal_id)?
            .context("Course not found after insert")?;
        Ok((course, inserted == 0))
    }

    pub fn get_course(&self, id: i64) -> Result<Option<Course>> {
        let sql = format!("SELECT {} FROM courses WHERE id = ?1", COURSE_COLUMNS);
        let row = self
            .conn
            .query_row(&sql, params![id], CourseRow::from_row)
            .optional()
            .context("Failed to query course")?;
        row.map(CourseRow::into_course).transpose()
    }

    pub fn find_course_by_proposal(&self, proposal_id: i64) -> Result<Option<Course>> {
        let sql = format!("SELECT {} FROM courses WHERE proposal_id = ?1", COURSE_COLUMNS);
        let row = self
            .conn
            .query_row(&sql, params![proposal_id], CourseRow::from_row)
            .optional()
            .context("Failed to query course by proposal")?;
        row.map(CourseRow::into_course).transpose()
    }

    fn list_courses_where(&self, clause: &str, param: rusqlite::types::Value) -> Result<Vec<Course>> {
        let sql = format!(
            "SELECT {} FROM courses WHERE {} ORDER BY id",
            COURSE_COLUMNS, clause
        );
        let mut stmt = self.conn.prepare(&sql).context("Failed to prepare course list")?;
        let rows = stmt
            .query_map(params![param], CourseRow::from_row)
            .context("Failed to query courses")?;
        let mut courses = Vec::new();
        for row in rows {
            let r = row.context("Failed to read course row")?;
            courses.push(r.into_course()?);
        }
        Ok(courses)
    }

    pub fn list_published_courses(&self) -> Result<Vec<Course>> {
        self.list_courses_where(
            "status = ?1",
            CourseStatus::Published.as_str().to_string().into(),
        )
    }

    pub fn list_courses_by_instructor(&self, instructor_id: i64) -> Result<Vec<Course>> {
        self.list_courses_where("instructor_id = ?1", instructor_id.into())
    }

    pub fn replace_course_content(&self, id: i64, content: &CourseContent) -> Result<Option<Course>> {
        let changed = self
            .conn
            .execute(
                "UPDATE courses
                 SET title = ?1, summary = ?2, target_audience = ?3, learning_objectives = ?4,
                     assumed_prerequisites = ?5, updated_at = ?6
                 WHERE id = ?7",
                params![
                    content.title,
                    content.summary,
                    content.target_audience,
                    content.learning_objectives,
                    content.assumed_prerequisites,
                    now_text(),
                    id,
                ],
            )
            .context("Failed to update course content")?;
        if changed == 0 {
            return Ok(None);
        }
        self.get_course(id)
    }

    pub fn publish_course(&self, id: i64) -> Result<Cas<Course>> {
        let changed = self
            .conn
            .execute(
                "UPDATE courses SET status = 'published', updated_at = ?1
                 WHERE id = ?2 AND status = 'draft'",
                params![now_text(), id],
            )
            .context("Failed to publish course")?;
        match self.get_course(id)? {
            None => Ok(Cas::Missing),
            Some(c) if changed > 0 => Ok(Cas::Applied(c)),
            Some(c) => Ok(Cas::Stale(c)),
        }
    }
}

/// SQLite-backed repositories.
#[derive(Clone)]
pub struct SqliteStore {
    db: DbHandle,
}

impl SqliteStore {
    pub fn new(db: CatalogDb) -> Self {
        Self {
            db: DbHandle::new(db),
        }
    }

    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(CatalogDb::new(path)?))
    }
}

#[async_trait]
impl ProposalRepository for SqliteStore {
    async fn insert_proposal(&self, author_id: i64, fields: ProposalFields) -> Result<Proposal> {
        self.db
            .call(move |db| db.create_proposal(author_id, &fields))
            .await
    }

    async fn get_proposal(&self, id: i64) -> Result<Option<Proposal>> {
        self.db.call(move |db| db.get_proposal(id)).await
    }

    async fn list_proposals_by_author(&self, author_id: i64) -> Result<Vec<Proposal>> {
        self.db
            .call(move |db| db.list_proposals_by_author(author_id))
            .await
    }

    async fn list_proposals_by_status(&self, statuses: &[ProposalStatus]) -> Result<Vec<Proposal>> {
        let statuses = statuses.to_vec();
        self.db
            .call(move |db| db.list_proposals_by_status(&statuses))
            .await
    }

    async fn set_proposal_status(
        &self,
        id: i64,
        expected: ProposalStatus,
        next: ProposalStatus,
        review: Option<ReviewStamp>,
    ) -> Result<Cas<Proposal>> {
        self.db
            .call(move |db| db.set_proposal_status(id, expected, next, review.as_ref()))
            .await
    }

    async fn replace_proposal_fields(
        &self,
        id: i64,
        expected: ProposalStatus,
        fields: ProposalFields,
    ) -> Result<Cas<Proposal>> {
        self.db
            .call(move |db| db.replace_proposal_fields(id, expected, &fields))
            .await
    }

    async fn delete_proposal(&self, id: i64, expected: ProposalStatus) -> Result<Cas<Proposal>> {
        self.db.call(move |db| db.delete_proposal(id, expected)).await
    }
}

#[async_trait]
impl CourseRepository for SqliteStore {
    async fn insert_course(&self, instructor_id: i64, content: CourseContent) -> Result<Course> {
        self.db
            .call(move |db| db.create_course(instructor_id, &content))
            .await
    }

    async fn create_course_if_absent(
        &self,
        proposal_id: i64,
        instructor_id: i64,
        content: CourseContent,
    ) -> Result<(Course, bool)> {
        self.db
            .call(move |db| db.create_course_if_absent(proposal_id, instructor_id, &content))
            .await
    }

    async fn get_course(&self, id: i64) -> Result<Option<Course>> {
        self.db.call(move |db| db.get_course(id)).await
    }

    async fn find_course_by_proposal(&self, proposal_id: i64) -> Result<Option<Course>> {
        self.db
            .call(move |db| db.find_course_by_proposal(proposal_id))
            .await
    }

    async fn list_published_courses(&self) -> Result<Vec<Course>> {
        self.db.call(|db| db.list_published_courses()).await
    }

    async fn list_courses_by_instructor(&self, instructor_id: i64) -> Result<Vec<Course>> {
        self.db
            .call(move |db| db.list_courses_by_instructor(instructor_id))
            .await
    }

    async fn replace_course_content(
        &self,
        id: i64,
        content: CourseContent,
    ) -> Result<Option<Course>> {
        self.db
            .call(move |db| db.replace_course_content(id, &content))
            .await
    }

    async fn publish_course(&self, id: i64) -> Result<Cas<Course>> {
        self.db.call(move |db| db.publish_course(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::repository::contract;

    fn store() -> SqliteStore {
        SqliteStore::new(CatalogDb::new_in_memory().unwrap())
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let db = CatalogDb::new_in_memory().unwrap();
        db.run_migrations().unwrap();
        db.run_migrations().unwrap();
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.db");
        {
            let db = CatalogDb::new(&path).unwrap();
            db.create_proposal(1, &ProposalFields::default()).unwrap();
        }
        let reopened = CatalogDb::new(&path).unwrap();
        assert_eq!(reopened.list_proposals_by_author(1).unwrap().len(), 1);
    }

    #[test]
    fn test_timestamps_roundtrip() {
        let db = CatalogDb::new_in_memory().unwrap();
        let p = db.create_proposal(1, &ProposalFields::default()).unwrap();
        assert_eq!(p.created_at, p.updated_at);
        let fetched = db.get_proposal(p.id).unwrap().unwrap();
        assert_eq!(fetched.created_at, p.created_at);
    }

    #[test]
    fn test_unique_proposal_id_enforced_by_schema() {
        let db = CatalogDb::new_in_memory().unwrap();
        let p = db.create_proposal(1, &ProposalFields::default()).unwrap();
        let content = CourseContent::default();
        db.insert_course_row(Some(p.id), 1, &content, false).unwrap();
        assert!(db.insert_course_row(Some(p.id), 1, &content, false).is_err());
    }

    #[test]
    fn test_unknown_status_in_row_is_an_error() {
        let db = CatalogDb::new_in_memory().unwrap();
        let p = db.create_proposal(1, &ProposalFields::default()).unwrap();
        db.conn
            .execute(
                "UPDATE proposals SET status = 'archived' WHERE id = ?1",
                params![p.id],
            )
            .unwrap();
        assert!(db.get_proposal(p.id).is_err());
    }

    #[test]
    fn test_reviewer_column_added_to_existing_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE proposals (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    author_id INTEGER NOT NULL,
                    title TEXT NOT NULL DEFAULT '',
                    summary TEXT NOT NULL DEFAULT '',
                    target_audience TEXT NOT NULL DEFAULT '',
                    learning_objectives TEXT NOT NULL DEFAULT '',
                    outline TEXT NOT NULL DEFAULT '',
                    assumed_prerequisites TEXT NOT NULL DEFAULT '',
                    qualifications TEXT NOT NULL DEFAULT '',
                    status TEXT NOT NULL DEFAULT 'draft',
                    review_notes TEXT NOT NULL DEFAULT '',
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
                INSERT INTO proposals (author_id, title, status, created_at, updated_at)
                VALUES (4, 'Legacy', 'submitted', '2024-01-01T00:00:00+00:00', '2024-01-01T00:00:00+00:00');",
            )
            .unwrap();
        }

        let db = CatalogDb::new(&path).unwrap();
        let legacy = db.list_proposals_by_author(4).unwrap().remove(0);
        assert_eq!(legacy.reviewer_id, None);

        let review = ReviewStamp {
            reviewer_id: 77,
            notes: "ok".into(),
        };
        let applied = db
            .set_proposal_status(
                legacy.id,
                ProposalStatus::Submitted,
                ProposalStatus::Approved,
                Some(&review),
            )
            .unwrap();
        assert!(matches!(applied, Cas::Applied(ref p) if p.reviewer_id == Some(77)));
    }

    #[test]
    fn test_list_by_status_filters_in_sql() {
        let db = CatalogDb::new_in_memory().unwrap();
        let a = db.create_proposal(1, &ProposalFields::default()).unwrap();
        let b = db.create_proposal(1, &ProposalFields::default()).unwrap();
        db.create_proposal(1, &ProposalFields::default()).unwrap();
        db.set_proposal_status(a.id, ProposalStatus::Draft, ProposalStatus::Submitted, None)
            .unwrap();
        db.set_proposal_status(b.id, ProposalStatus::Draft, ProposalStatus::Withdrawn, None)
            .unwrap();

        let ids = |statuses: &[ProposalStatus]| -> Vec<i64> {
            db.list_proposals_by_status(statuses)
                .unwrap()
                .into_iter()
                .map(|p| p.id)
                .collect()
        };
        assert_eq!(ids(&[ProposalStatus::Submitted]), vec![a.id]);
        assert_eq!(
            ids(&[ProposalStatus::Withdrawn, ProposalStatus::Submitted]),
            vec![a.id, b.id]
        );
        assert!(ids(&[]).is_empty());
        assert!(ids(&[ProposalStatus::Approved]).is_empty());
    }

    #[tokio::test]
    async fn test_proposal_crud_contract() {
        contract::proposal_crud(&store()).await;
    }

    #[tokio::test]
    async fn test_status_cas_contract() {
        contract::status_cas(&store()).await;
    }

    #[tokio::test]
    async fn test_field_replace_contract() {
        contract::field_replace(&store()).await;
    }

    #[tokio::test]
    async fn test_delete_contract() {
        contract::delete_only_expected(&store()).await;
    }

    #[tokio::test]
    async fn test_course_contract() {
        contract::course_lifecycle(&store()).await;
    }

    #[tokio::test]
    async fn test_create_if_absent_contract() {
        contract::create_if_absent(&store()).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_create_if_absent() {
        contract::concurrent_create_if_absent(Arc::new(store())).await;
    }
}
