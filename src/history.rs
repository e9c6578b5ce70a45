use chrono::{DateTime, Local};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::{
    app_dirs::AppDirs,
    error::StoreError,
    question::Direction,
    session::{SessionResult, SessionStatus},
};

/// Number of results kept in the history list
pub const HISTORY_LIMIT: usize = 50;

/// Best result per question-count bucket
pub type BestScores = BTreeMap<usize, SessionResult>;

/// Where finished sessions are kept
pub trait ResultRecorder {
    fn append_result(&mut self, result: &SessionResult) -> Result<(), StoreError>;

    /// Most recent first, at most [`HISTORY_LIMIT`] entries
    fn load_history(&self) -> Result<Vec<SessionResult>, StoreError>;

    fn load_best_scores(&self) -> Result<BestScores, StoreError>;

    fn clear_all(&mut self) -> Result<(), StoreError>;
}

/// A result replaces the stored best for its bucket only if it was not quit
/// early and strictly beats the stored percentage.
pub fn improves_best(current: Option<&SessionResult>, candidate: &SessionResult) -> bool {
    if candidate.status == SessionStatus::Quit {
        return false;
    }
    match current {
        Some(best) => candidate.percentage > best.percentage,
        None => true,
    }
}

/// Highest percentage across all buckets
pub fn overall_best(best: &BestScores) -> Option<&SessionResult> {
    best.values().max_by_key(|r| r.percentage)
}

const CREATE_RESULTS: &str = r#"
    CREATE TABLE IF NOT EXISTS session_results (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        total_questions INTEGER NOT NULL,
        correct_count INTEGER NOT NULL,
        wrong_count INTEGER NOT NULL,
        skipped_count INTEGER NOT NULL,
        percentage INTEGER NOT NULL,
        timer_seconds INTEGER NOT NULL,
        direction TEXT NOT NULL,
        status TEXT NOT NULL,
        timestamp TEXT NOT NULL
    )
"#;

const CREATE_BEST: &str = r#"
    CREATE TABLE IF NOT EXISTS best_scores (
        question_count INTEGER PRIMARY KEY,
        total_questions INTEGER NOT NULL,
        correct_count INTEGER NOT NULL,
        wrong_count INTEGER NOT NULL,
        skipped_count INTEGER NOT NULL,
        percentage INTEGER NOT NULL,
        timer_seconds INTEGER NOT NULL,
        direction TEXT NOT NULL,
        status TEXT NOT NULL,
        timestamp TEXT NOT NULL
    )
"#;

const RESULT_COLUMNS: &str = "total_questions, correct_count, wrong_count, skipped_count, \
     percentage, timer_seconds, direction, status, timestamp";

/// SQLite-backed history and best scores
#[derive(Debug)]
pub struct SqliteResultStore {
    conn: Connection,
}

impl SqliteResultStore {
    /// Opens the store at the default state location
    pub fn new() -> Result<Self, StoreError> {
        let path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("wordup_history.db"));
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(CREATE_RESULTS, [])?;
        conn.execute(CREATE_BEST, [])?;
        Ok(Self { conn })
    }

    fn read_result(row: &Row) -> rusqlite::Result<RawResult> {
        Ok(RawResult {
            total_questions: row.get(0)?,
            correct_count: row.get(1)?,
            wrong_count: row.get(2)?,
            skipped_count: row.get(3)?,
            percentage: row.get(4)?,
            timer_seconds: row.get(5)?,
            direction: row.get(6)?,
            status: row.get(7)?,
            timestamp: row.get(8)?,
        })
    }
}

impl ResultRecorder for SqliteResultStore {
    fn append_result(&mut self, result: &SessionResult) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;

        tx.execute(
            &format!(
                "INSERT INTO session_results ({RESULT_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
            ),
            params![
                result.total_questions as i64,
                result.correct_count as i64,
                result.wrong_count as i64,
                result.skipped_count as i64,
                result.percentage as i64,
                result.timer_seconds as i64,
                result.direction.to_string(),
                result.status.to_string(),
                result.timestamp.to_rfc3339(),
            ],
        )?;

        tx.execute(
            "DELETE FROM session_results WHERE id NOT IN \
             (SELECT id FROM session_results ORDER BY id DESC LIMIT ?1)",
            [HISTORY_LIMIT as i64],
        )?;

        let current = tx
            .query_row(
                &format!(
                    "SELECT {RESULT_COLUMNS} FROM best_scores WHERE question_count = ?1"
                ),
                [result.total_questions as i64],
                Self::read_result,
            )
            .optional()?
            .map(RawResult::into_result)
            .transpose()?;

        if improves_best(current.as_ref(), result) {
            tx.execute(
                &format!(
                    "INSERT OR REPLACE INTO best_scores (question_count, {RESULT_COLUMNS}) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
                ),
                params![
                    result.total_questions as i64,
                    result.total_questions as i64,
                    result.correct_count as i64,
                    result.wrong_count as i64,
                    result.skipped_count as i64,
                    result.percentage as i64,
                    result.timer_seconds as i64,
                    result.direction.to_string(),
                    result.status.to_string(),
                    result.timestamp.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn load_history(&self) -> Result<Vec<SessionResult>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RESULT_COLUMNS} FROM session_results ORDER BY id DESC LIMIT ?1"
        ))?;

        let rows = stmt.query_map([HISTORY_LIMIT as i64], Self::read_result)?;

        let mut history = Vec::new();
        for row in rows {
            history.push(row?.into_result()?);
        }
        Ok(history)
    }

    fn load_best_scores(&self) -> Result<BestScores, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RESULT_COLUMNS} FROM best_scores ORDER BY question_count"
        ))?;

        let rows = stmt.query_map([], Self::read_result)?;

        let mut best = BestScores::new();
        for row in rows {
            let result = row?.into_result()?;
            best.insert(result.total_questions, result);
        }
        Ok(best)
    }

    fn clear_all(&mut self) -> Result<(), StoreError> {
        self.conn.execute("DELETE FROM session_results", [])?;
        self.conn.execute("DELETE FROM best_scores", [])?;
        Ok(())
    }
}

/// Row as stored, before enum and timestamp parsing
struct RawResult {
    total_questions: i64,
    correct_count: i64,
    wrong_count: i64,
    skipped_count: i64,
    percentage: i64,
    timer_seconds: i64,
    direction: String,
    status: String,
    timestamp: String,
}

impl RawResult {
    fn into_result(self) -> Result<SessionResult, StoreError> {
        let direction = match self.direction.as_str() {
            "normal" => Direction::Normal,
            "reverse" => Direction::Reverse,
            other => return Err(StoreError::Corrupt(format!("direction '{other}'"))),
        };
        let status = match self.status.as_str() {
            "completed" => SessionStatus::Completed,
            "quit" => SessionStatus::Quit,
            other => return Err(StoreError::Corrupt(format!("status '{other}'"))),
        };
        let timestamp = DateTime::parse_from_rfc3339(&self.timestamp)
            .map_err(|e| StoreError::Corrupt(format!("timestamp: {e}")))?
            .with_timezone(&Local);

        Ok(SessionResult {
            total_questions: self.total_questions as usize,
            correct_count: self.correct_count as usize,
            wrong_count: self.wrong_count as usize,
            skipped_count: self.skipped_count as usize,
            percentage: self.percentage as u8,
            timer_seconds: self.timer_seconds as u32,
            direction,
            status,
            timestamp,
        })
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    history: Vec<SessionResult>,
    best: BestScores,
}

/// In-process store with the same policies as the database. Clones share state.
#[derive(Debug, Default, Clone)]
pub struct MemoryResultStore {
    inner: Rc<RefCell<MemoryInner>>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResultRecorder for MemoryResultStore {
    fn append_result(&mut self, result: &SessionResult) -> Result<(), StoreError> {
        let mut inner = self.inner.borrow_mut();
        inner.history.insert(0, result.clone());
        inner.history.truncate(HISTORY_LIMIT);

        if improves_best(inner.best.get(&result.total_questions), result) {
            inner.best.insert(result.total_questions, result.clone());
        }
        Ok(())
    }

    fn load_history(&self) -> Result<Vec<SessionResult>, StoreError> {
        Ok(self.inner.borrow().history.clone())
    }

    fn load_best_scores(&self) -> Result<BestScores, StoreError> {
        Ok(self.inner.borrow().best.clone())
    }

    fn clear_all(&mut self) -> Result<(), StoreError> {
        let mut inner = self.inner.borrow_mut();
        inner.history.clear();
        inner.best.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::tempdir;

    fn result(total: usize, correct: usize, status: SessionStatus) -> SessionResult {
        SessionResult {
            total_questions: total,
            correct_count: correct,
            wrong_count: total - correct,
            skipped_count: 0,
            percentage: ((correct as f64 / total as f64) * 100.0).round() as u8,
            timer_seconds: 10,
            direction: Direction::Reverse,
            status,
            timestamp: Local::now(),
        }
    }

    fn stores() -> Vec<Box<dyn ResultRecorder>> {
        vec![
            Box::new(SqliteResultStore::open_in_memory().unwrap()),
            Box::new(MemoryResultStore::new()),
        ]
    }

    #[test]
    fn test_improves_best_policy() {
        let good = result(20, 15, SessionStatus::Completed);
        let better = result(20, 18, SessionStatus::Completed);
        let quit = result(20, 20, SessionStatus::Quit);

        assert!(improves_best(None, &good));
        assert!(improves_best(Some(&good), &better));
        assert!(!improves_best(Some(&better), &good));
        assert!(!improves_best(Some(&good), &good.clone()));
        assert!(!improves_best(None, &quit));
    }

    #[test]
    fn test_history_is_most_recent_first() {
        for mut store in stores() {
            store.append_result(&result(10, 3, SessionStatus::Completed)).unwrap();
            store.append_result(&result(10, 7, SessionStatus::Quit)).unwrap();

            let history = store.load_history().unwrap();
            assert_eq!(history.len(), 2);
            assert_eq!(history[0].correct_count, 7);
            assert_eq!(history[0].status, SessionStatus::Quit);
            assert_eq!(history[1].correct_count, 3);
        }
    }

    #[test]
    fn test_history_capped() {
        for mut store in stores() {
            for i in 0..(HISTORY_LIMIT + 5) {
                store
                    .append_result(&result(100, i % 100, SessionStatus::Completed))
                    .unwrap();
            }

            let history = store.load_history().unwrap();
            assert_eq!(history.len(), HISTORY_LIMIT);
            assert_eq!(history[0].correct_count, HISTORY_LIMIT + 4);
        }
    }

    #[test]
    fn test_best_scores_per_bucket() {
        for mut store in stores() {
            store.append_result(&result(20, 10, SessionStatus::Completed)).unwrap();
            store.append_result(&result(20, 16, SessionStatus::Completed)).unwrap();
            store.append_result(&result(20, 12, SessionStatus::Completed)).unwrap();
            store.append_result(&result(50, 20, SessionStatus::Completed)).unwrap();

            let best = store.load_best_scores().unwrap();
            assert_eq!(best.len(), 2);
            assert_eq!(best[&20].correct_count, 16);
            assert_eq!(best[&50].percentage, 40);
            assert_eq!(overall_best(&best).unwrap().percentage, 80);
        }
    }

    #[test]
    fn test_quit_never_sets_best() {
        for mut store in stores() {
            store.append_result(&result(10, 10, SessionStatus::Quit)).unwrap();

            assert!(store.load_best_scores().unwrap().is_empty());
            assert_eq!(store.load_history().unwrap().len(), 1);
        }
    }

    #[test]
    fn test_clear_all() {
        for mut store in stores() {
            store.append_result(&result(10, 5, SessionStatus::Completed)).unwrap();
            store.clear_all().unwrap();

            assert!(store.load_history().unwrap().is_empty());
            assert!(store.load_best_scores().unwrap().is_empty());
        }
    }

    #[test]
    fn test_sqlite_roundtrips_fields() {
        let mut store = SqliteResultStore::open_in_memory().unwrap();
        let mut original = result(7, 4, SessionStatus::Completed);
        original.skipped_count = 1;
        original.wrong_count = 2;
        original.timestamp = Local::now() - Duration::days(2);

        store.append_result(&original).unwrap();
        let loaded = store.load_history().unwrap().remove(0);

        assert_eq!(loaded.total_questions, 7);
        assert_eq!(loaded.skipped_count, 1);
        assert_eq!(loaded.wrong_count, 2);
        assert_eq!(loaded.percentage, original.percentage);
        assert_eq!(loaded.direction, Direction::Reverse);
        assert_eq!(loaded.timer_seconds, 10);
        assert_eq!(loaded.timestamp.timestamp(), original.timestamp.timestamp());
    }

    #[test]
    fn test_sqlite_persists_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("history.db");

        {
            let mut store = SqliteResultStore::open(&path).unwrap();
            store.append_result(&result(20, 20, SessionStatus::Completed)).unwrap();
        }

        let store = SqliteResultStore::open(&path).unwrap();
        assert_eq!(store.load_history().unwrap().len(), 1);
        assert_eq!(store.load_best_scores().unwrap()[&20].percentage, 100);
    }

    #[test]
    fn test_memory_store_clones_share_state() {
        let store = MemoryResultStore::new();
        let mut handle = store.clone();

        handle.append_result(&result(5, 5, SessionStatus::Completed)).unwrap();
        assert_eq!(store.load_history().unwrap().len(), 1);
    }
}
