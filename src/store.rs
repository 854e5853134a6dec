use rusqlite::types::Value;
use rusqlite::Connection;
use std::cell::RefCell;
use std::path::Path;
use std::rc::{Rc, Weak};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::db;
use crate::model::{Assessment, Gender, Roster, Scores, StudentDraft, StudentRecord};

pub type SnapshotCallback = Box<dyn FnMut(Roster)>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("student not found: {0}")]
    NotFound(String),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Database(_) => "db_failed",
            StoreError::NotFound(_) => "not_found",
        }
    }
}

/// Live record store feeding full roster snapshots.
///
/// `subscribe` delivers the current roster immediately and again after every
/// change. `create` does not hand back the new record: the next snapshot is
/// the only confirmation.
pub trait RosterStore {
    fn subscribe(&mut self, on_snapshot: SnapshotCallback) -> Result<Subscription, StoreError>;
    fn create(&mut self, draft: &StudentDraft) -> Result<(), StoreError>;
    fn delete(&mut self, id: &str) -> Result<(), StoreError>;

    /// Re-deliver a snapshot that a committed write failed to push.
    fn catch_up(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Handle for a live feed. Released exactly once: either by `unsubscribe`,
/// which consumes the handle, or on drop.
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    pub fn unsubscribe(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if let Some(f) = self.release.take() {
            f();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_once();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("live", &self.release.is_some())
            .finish()
    }
}

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    entries: Vec<(u64, SnapshotCallback)>,
    // Ids released while their callback was checked out by `publish`.
    cancelled: Vec<u64>,
}

/// Registry of snapshot callbacks shared between a store and its handles.
#[derive(Clone, Default)]
pub struct SubscriberList {
    inner: Rc<RefCell<Subscribers>>,
}

impl SubscriberList {
    pub fn add(&self, callback: SnapshotCallback) -> Subscription {
        let id = {
            let mut s = self.inner.borrow_mut();
            let id = s.next_id;
            s.next_id += 1;
            s.entries.push((id, callback));
            id
        };
        let weak: Weak<RefCell<Subscribers>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let mut s = inner.borrow_mut();
            let before = s.entries.len();
            s.entries.retain(|(sid, _)| *sid != id);
            if s.entries.len() == before {
                s.cancelled.push(id);
            }
            debug!(subscription = id, "snapshot feed released");
        })
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Push one full roster to every live subscriber.
    pub fn publish(&self, roster: &Roster) {
        let mut checked_out = std::mem::take(&mut self.inner.borrow_mut().entries);
        for (_, cb) in checked_out.iter_mut() {
            cb(roster.clone());
        }
        let mut s = self.inner.borrow_mut();
        let cancelled = std::mem::take(&mut s.cancelled);
        checked_out.retain(|(id, _)| !cancelled.contains(id));
        // Subscribers added during the push go after the existing ones.
        checked_out.append(&mut s.entries);
        s.entries = checked_out;
    }
}

pub struct SqliteRosterStore {
    conn: Connection,
    subscribers: SubscriberList,
    // Set when a write committed but its snapshot could not be read back.
    missed_push: bool,
}

impl SqliteRosterStore {
    pub fn open(workspace: &Path) -> anyhow::Result<Self> {
        let conn = db::open_db(workspace)?;
        Ok(Self {
            conn,
            subscribers: SubscriberList::default(),
            missed_push: false,
        })
    }

    #[cfg(test)]
    pub fn from_connection(conn: Connection) -> anyhow::Result<Self> {
        db::init_schema(&conn)?;
        Ok(Self {
            conn,
            subscribers: SubscriberList::default(),
            missed_push: false,
        })
    }

    /// Current roster ordered by student number. Rows with a gender outside
    /// the two known values never enter a snapshot.
    pub fn load_roster(&self) -> Result<Roster, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, student_no, full_name, gender, class_name, score1, score2, score3
             FROM students
             ORDER BY student_no ASC, rowid ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    [
                        row.get::<_, Value>(5)?,
                        row.get::<_, Value>(6)?,
                        row.get::<_, Value>(7)?,
                    ],
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut roster = Vec::with_capacity(rows.len());
        for (id, student_no, full_name, gender_raw, class_name, raw_scores) in rows {
            let Some(gender) = Gender::parse(&gender_raw) else {
                warn!(student_id = %id, gender = %gender_raw, "skipping record with unknown gender");
                continue;
            };
            let mut scores = Scores::default();
            for (a, v) in Assessment::ALL.iter().zip(raw_scores.iter()) {
                scores.set(*a, coerce_score(v));
            }
            roster.push(StudentRecord::from_parts(
                id,
                StudentDraft {
                    student_no,
                    full_name,
                    gender,
                    class_name,
                    scores,
                },
            ));
        }
        Ok(roster)
    }

    fn publish_current(&mut self) -> Result<(), StoreError> {
        let roster = match self.load_roster() {
            Ok(roster) => roster,
            Err(e) => {
                self.missed_push = true;
                return Err(e);
            }
        };
        self.missed_push = false;
        debug!(
            subscribers = self.subscribers.len(),
            records = roster.len(),
            "pushing roster snapshot"
        );
        self.subscribers.publish(&roster);
        Ok(())
    }

    /// Push after a committed write. A failed reload is kept for `catch_up`
    /// instead of failing the write.
    fn publish_after_write(&mut self) {
        if let Err(e) = self.publish_current() {
            warn!(error = %e, "failed to reload roster after write; push deferred");
        }
    }
}

/// Missing or non-numeric stored scores read as 0.
fn coerce_score(v: &Value) -> f64 {
    let n = match v {
        Value::Real(f) => *f,
        Value::Integer(i) => *i as f64,
        Value::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Null | Value::Blob(_) => 0.0,
    };
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

impl RosterStore for SqliteRosterStore {
    fn subscribe(&mut self, mut on_snapshot: SnapshotCallback) -> Result<Subscription, StoreError> {
        let roster = self.load_roster()?;
        on_snapshot(roster);
        let sub = self.subscribers.add(on_snapshot);
        info!(subscribers = self.subscribers.len(), "roster feed subscribed");
        Ok(sub)
    }

    fn create(&mut self, draft: &StudentDraft) -> Result<(), StoreError> {
        let id = Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO students(
               id,
               student_no,
               full_name,
               gender,
               class_name,
               score1,
               score2,
               score3,
               created_at
             ) VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                &id,
                &draft.student_no,
                &draft.full_name,
                draft.gender.as_str(),
                &draft.class_name,
                draft.scores.get(Assessment::First),
                draft.scores.get(Assessment::Second),
                draft.scores.get(Assessment::Third),
                &created_at,
            ),
        )?;
        info!(student_id = %id, class_name = %draft.class_name, "student created");
        self.publish_after_write();
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        let changed = self
            .conn
            .execute("DELETE FROM students WHERE id = ?", [id])?;
        if changed == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        info!(student_id = %id, "student deleted");
        self.publish_after_write();
        Ok(())
    }

    fn catch_up(&mut self) -> Result<(), StoreError> {
        if !self.missed_push {
            return Ok(());
        }
        info!("retrying deferred roster push");
        self.publish_current()
    }
}
