use anyhow::Context;
use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::models::{
    default_avatar, default_image, today, Comment, ImageRef, Issue, IssueFilter, IssueStatus,
    NewIssue, TimelineEntry,
};
use crate::store::{upvote_limit, validate_comment_text, validate_new_issue, IssueStore};

const SCHEMA_VERSION: i32 = 1;

const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

const ISSUE_COLUMNS: &str = "i.id, i.title, i.description, i.category, i.location, i.reporter, i.date, i.status, i.image_id, i.image_fallback, i.upvotes";

impl ToSql for IssueStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for IssueStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: StoreError| FromSqlError::Other(Box::new(e)))
    }
}

/// Issue store persisted in SQLite: one row per issue, with timeline
/// entries and comments in child tables.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path).context("Failed to open database")?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .context("Failed to set busy timeout")?;
        let store = SqliteStore { conn };
        store.init_schema().context("Failed to initialize schema")?;
        Ok(store)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let version: i32 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?;

        if version < SCHEMA_VERSION {
            self.conn.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS issues (
                    seq INTEGER PRIMARY KEY AUTOINCREMENT,
                    id TEXT NOT NULL UNIQUE,
                    title TEXT NOT NULL,
                    description TEXT NOT NULL DEFAULT '',
                    category TEXT NOT NULL,
                    location TEXT NOT NULL DEFAULT '',
                    reporter TEXT NOT NULL,
                    date TEXT NOT NULL,
                    status TEXT NOT NULL DEFAULT 'Open',
                    image_id TEXT NOT NULL,
                    image_fallback TEXT NOT NULL,
                    upvotes INTEGER NOT NULL DEFAULT 0 CHECK (upvotes >= 0)
                );

                -- Status history, append-only
                CREATE TABLE IF NOT EXISTS timeline (
                    seq INTEGER PRIMARY KEY AUTOINCREMENT,
                    issue_id TEXT NOT NULL,
                    status TEXT NOT NULL,
                    date TEXT NOT NULL,
                    FOREIGN KEY (issue_id) REFERENCES issues(id)
                );

                -- Comments, append-only; seq doubles as the comment id
                CREATE TABLE IF NOT EXISTS comments (
                    seq INTEGER PRIMARY KEY AUTOINCREMENT,
                    issue_id TEXT NOT NULL,
                    author TEXT NOT NULL,
                    avatar TEXT NOT NULL,
                    text TEXT NOT NULL,
                    date TEXT NOT NULL,
                    FOREIGN KEY (issue_id) REFERENCES issues(id)
                );

                CREATE INDEX IF NOT EXISTS idx_issues_status ON issues(status);
                CREATE INDEX IF NOT EXISTS idx_issues_reporter ON issues(reporter);
                CREATE INDEX IF NOT EXISTS idx_timeline_issue ON timeline(issue_id);
                CREATE INDEX IF NOT EXISTS idx_comments_issue ON comments(issue_id);
                "#,
            )?;

            self.conn
                .execute(&format!("PRAGMA user_version = {}", SCHEMA_VERSION), [])?;
        }

        self.conn.execute("PRAGMA foreign_keys = ON", [])?;

        Ok(())
    }

    fn load_issue(&self, row: &Row<'_>) -> rusqlite::Result<Issue> {
        let id: String = row.get(0)?;
        Ok(Issue {
            title: row.get(1)?,
            description: row.get(2)?,
            category: row.get(3)?,
            location: row.get(4)?,
            reporter: row.get(5)?,
            date: row.get(6)?,
            status: row.get(7)?,
            image: ImageRef {
                id: row.get(8)?,
                fallback_url: row.get(9)?,
            },
            upvotes: row.get(10)?,
            comments: self.get_comments(&id)?,
            timeline: self.get_timeline(&id)?,
            id,
        })
    }

    fn get_timeline(&self, issue_id: &str) -> rusqlite::Result<Vec<TimelineEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT status, date FROM timeline WHERE issue_id = ?1 ORDER BY seq")?;
        let entries = stmt
            .query_map([issue_id], |row| {
                Ok(TimelineEntry {
                    status: row.get(0)?,
                    date: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    fn get_comments(&self, issue_id: &str) -> rusqlite::Result<Vec<Comment>> {
        let mut stmt = self.conn.prepare(
            "SELECT seq, author, avatar, text, date FROM comments WHERE issue_id = ?1 ORDER BY seq",
        )?;
        let comments = stmt
            .query_map([issue_id], |row| {
                Ok(Comment {
                    id: comment_id(row.get(0)?),
                    author: row.get(1)?,
                    avatar: row.get(2)?,
                    text: row.get(3)?,
                    date: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(comments)
    }

    pub fn count_issues(&self) -> StoreResult<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM issues", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn comment_id(seq: i64) -> String {
    format!("c{}", seq)
}

impl IssueStore for SqliteStore {
    fn create(&mut self, new: NewIssue) -> StoreResult<Issue> {
        validate_new_issue(&new)?;
        let date: NaiveDate = new.date.unwrap_or_else(today);

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let seq: i64 = tx.query_row(
            "SELECT COALESCE(MAX(seq), 0) + 1 FROM issues",
            [],
            |row| row.get(0),
        )?;
        let id = format!("ISS-{}", seq);
        let image = default_image(&id, new.image_id.as_deref());
        tx.execute(
            "INSERT INTO issues (seq, id, title, description, category, location, reporter, date, status, image_id, image_fallback) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                seq,
                id,
                new.title,
                new.description,
                new.category,
                new.location,
                new.reporter,
                date,
                IssueStatus::Open,
                image.id,
                image.fallback_url
            ],
        )?;
        tx.execute(
            "INSERT INTO timeline (issue_id, status, date) VALUES (?1, ?2, ?3)",
            params![id, IssueStatus::Open, date],
        )?;
        tx.commit()?;

        info!(issue = %id, reporter = %new.reporter, "issue reported");
        self.find(&id)
    }

    fn find(&self, id: &str) -> StoreResult<Issue> {
        let sql = format!("SELECT {} FROM issues i WHERE i.id = ?1", ISSUE_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let issue = stmt
            .query_row([id], |row| self.load_issue(row))
            .optional()?;
        issue.ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn list(&self, filter: &IssueFilter) -> StoreResult<Vec<Issue>> {
        let mut sql = format!("SELECT {} FROM issues i", ISSUE_COLUMNS);
        let mut conditions = Vec::new();
        let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(status) = filter.status {
            conditions.push("i.status = ?".to_string());
            params_vec.push(Box::new(status));
        }

        if let Some(category) = &filter.category {
            conditions.push("i.category = ? COLLATE NOCASE".to_string());
            params_vec.push(Box::new(category.clone()));
        }

        if let Some(reporter) = &filter.reporter {
            conditions.push("i.reporter = ?".to_string());
            params_vec.push(Box::new(reporter.clone()));
        }

        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        sql.push_str(" ORDER BY i.date DESC, i.seq DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();

        let issues = stmt
            .query_map(params_refs.as_slice(), |row| self.load_issue(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(issues)
    }

    fn update_status(&mut self, id: &str, status: IssueStatus) -> StoreResult<Issue> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let previous: Option<IssueStatus> = tx
            .query_row("SELECT status FROM issues WHERE id = ?1", [id], |row| {
                row.get(0)
            })
            .optional()?;
        let previous = previous.ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        tx.execute(
            "UPDATE issues SET status = ?1 WHERE id = ?2",
            params![status, id],
        )?;
        tx.execute(
            "INSERT INTO timeline (issue_id, status, date) VALUES (?1, ?2, ?3)",
            params![id, status, today()],
        )?;
        tx.commit()?;

        info!(issue = %id, from = %previous, to = %status, "status updated");
        self.find(id)
    }

    fn add_comment(&mut self, id: &str, author: &str, text: &str) -> StoreResult<Comment> {
        validate_comment_text(text)?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let found = tx
            .query_row("SELECT 1 FROM issues WHERE id = ?1", [id], |_| Ok(()))
            .optional()?;
        if found.is_none() {
            return Err(StoreError::NotFound(id.to_string()));
        }

        let comment = Comment {
            id: String::new(),
            author: author.to_string(),
            avatar: default_avatar(author),
            text: text.to_string(),
            date: today(),
        };
        tx.execute(
            "INSERT INTO comments (issue_id, author, avatar, text, date) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, comment.author, comment.avatar, comment.text, comment.date],
        )?;
        let seq = tx.last_insert_rowid();
        tx.commit()?;

        let comment = Comment {
            id: comment_id(seq),
            ..comment
        };
        debug!(issue = %id, comment = %comment.id, "comment added");
        Ok(comment)
    }

    fn upvote(&mut self, id: &str) -> StoreResult<u32> {
        let upvotes: Option<u32> = self
            .conn
            .query_row(
                "UPDATE issues SET upvotes = upvotes + 1 WHERE id = ?1 AND upvotes < ?2 RETURNING upvotes",
                params![id, u32::MAX],
                |row| row.get(0),
            )
            .optional()?;
        match upvotes {
            Some(upvotes) => {
                debug!(issue = %id, upvotes, "upvoted");
                Ok(upvotes)
            }
            None => {
                let found = self
                    .conn
                    .query_row("SELECT 1 FROM issues WHERE id = ?1", [id], |_| Ok(()))
                    .optional()?;
                match found {
                    Some(()) => Err(upvote_limit(id)),
                    None => Err(StoreError::NotFound(id.to_string())),
                }
            }
        }
    }
}
