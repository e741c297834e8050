use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use crate::workflows::recruitment::domain::{
    Assignment, Candidate, CandidateId, StatusTransition, VerificationStatus,
};
use crate::workflows::recruitment::repository::{
    CandidateRepository, CasOutcome, RepositoryError,
};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Candidate schema. The CHECK keeps status and assignment columns in lockstep.
const CANDIDATE_SCHEMA_SQL: &str = r"
    CREATE TABLE IF NOT EXISTS candidates (
        id TEXT PRIMARY KEY,
        full_name TEXT NOT NULL,
        email TEXT NOT NULL,
        date_of_birth TEXT NOT NULL,
        exam_id TEXT NOT NULL,
        enrollment_number TEXT NOT NULL UNIQUE,
        verification_status TEXT NOT NULL,
        dossier_url TEXT,
        rejection_reason TEXT,
        assigned_zone TEXT,
        assigned_ward TEXT,
        hired_at TEXT,
        hired_by TEXT,
        registered_at TEXT NOT NULL,
        submitted_at TEXT,
        updated_at TEXT NOT NULL,
        CHECK (
            (verification_status = 'Approved'
                AND assigned_zone IS NOT NULL AND assigned_ward IS NOT NULL
                AND hired_at IS NOT NULL AND hired_by IS NOT NULL)
            OR (verification_status <> 'Approved'
                AND assigned_zone IS NULL AND assigned_ward IS NULL
                AND hired_at IS NULL AND hired_by IS NULL)
        )
    );

    CREATE INDEX IF NOT EXISTS idx_candidates_status ON candidates(verification_status, submitted_at);
    CREATE INDEX IF NOT EXISTS idx_candidates_zone ON candidates(assigned_zone, hired_at);
";

const CANDIDATE_COLUMNS: &str = "id, full_name, email, date_of_birth, exam_id, enrollment_number, \
     verification_status, dossier_url, rejection_reason, assigned_zone, assigned_ward, hired_at, \
     hired_by, registered_at, submitted_at, updated_at";

/// SQLite-backed store. Claims commit through a single conditional `UPDATE`, so
/// separate processes sharing the database file still see one winner.
#[derive(Clone)]
pub struct SqliteCandidateRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCandidateRepository {
    /// Opens (or creates) the database file and applies the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let conn = Connection::open(path).map_err(storage_error)?;
        Self::from_connection(conn)
    }

    pub fn in_memory() -> Result<Self, RepositoryError> {
        let conn = Connection::open_in_memory().map_err(storage_error)?;
        Self::from_connection(conn)
    }

    pub fn from_connection(conn: Connection) -> Result<Self, RepositoryError> {
        conn.busy_timeout(BUSY_TIMEOUT).map_err(storage_error)?;
        conn.execute_batch(CANDIDATE_SCHEMA_SQL)
            .map_err(|e| RepositoryError::Unavailable(format!("schema init failed: {e}")))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, RepositoryError> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::Unavailable(format!("mutex poisoned: {e}")))
    }

    fn select(conn: &Connection, id: &CandidateId) -> rusqlite::Result<Option<Candidate>> {
        conn.query_row(
            &format!("SELECT {CANDIDATE_COLUMNS} FROM candidates WHERE id = ?1"),
            params![id.as_str()],
            candidate_from_row,
        )
        .optional()
    }

    fn select_many(
        conn: &Connection,
        sql: &str,
        filter: &str,
    ) -> Result<Vec<Candidate>, RepositoryError> {
        let mut stmt = conn.prepare(sql).map_err(storage_error)?;
        let rows = stmt
            .query_map(params![filter], candidate_from_row)
            .map_err(storage_error)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(storage_error)
    }
}

impl CandidateRepository for SqliteCandidateRepository {
    fn insert(&self, candidate: Candidate) -> Result<Candidate, RepositoryError> {
        let conn = self.lock()?;
        let assignment = candidate.assignment.as_ref();
        conn.execute(
            &format!(
                "INSERT INTO candidates ({CANDIDATE_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"
            ),
            params![
                candidate.id.as_str(),
                candidate.full_name,
                candidate.email,
                candidate.date_of_birth,
                candidate.exam_id,
                candidate.enrollment_number,
                candidate.verification_status.label(),
                candidate.dossier_url,
                candidate.rejection_reason,
                assignment.map(|a| a.assigned_zone.as_str()),
                assignment.map(|a| a.assigned_ward.as_str()),
                assignment.map(|a| a.hired_at),
                assignment.map(|a| a.hired_by.as_str()),
                candidate.registered_at,
                candidate.submitted_at,
                candidate.updated_at,
            ],
        )
        .map_err(storage_error)?;
        Ok(candidate)
    }

    fn fetch(&self, id: &CandidateId) -> Result<Option<Candidate>, RepositoryError> {
        let conn = self.lock()?;
        Self::select(&conn, id).map_err(storage_error)
    }

    fn with_status(&self, status: VerificationStatus) -> Result<Vec<Candidate>, RepositoryError> {
        let conn = self.lock()?;
        Self::select_many(
            &conn,
            &format!(
                "SELECT {CANDIDATE_COLUMNS} FROM candidates
                 WHERE verification_status = ?1 ORDER BY submitted_at, id"
            ),
            status.label(),
        )
    }

    fn hired_into(&self, zone: &str) -> Result<Vec<Candidate>, RepositoryError> {
        let conn = self.lock()?;
        Self::select_many(
            &conn,
            &format!(
                "SELECT {CANDIDATE_COLUMNS} FROM candidates
                 WHERE verification_status = 'Approved' AND assigned_zone = ?1
                 ORDER BY hired_at, id"
            ),
            zone,
        )
    }

    fn compare_and_set(
        &self,
        id: &CandidateId,
        transition: &StatusTransition,
    ) -> Result<CasOutcome, RepositoryError> {
        let mut conn = self.lock()?;
        // IMMEDIATE takes the write lock up front so the read-back sees our own write.
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(storage_error)?;

        let filter = status_filter(transition.accepted_from());
        let target = transition.target().label();
        let changed = match transition {
            StatusTransition::Verify { at } => tx.execute(
                &format!(
                    "UPDATE candidates SET verification_status = ?2, updated_at = ?3
                     WHERE id = ?1 AND verification_status IN ({filter})"
                ),
                params![id.as_str(), target, at],
            ),
            StatusTransition::SubmitDocuments { dossier_url, at } => tx.execute(
                &format!(
                    "UPDATE candidates
                     SET verification_status = ?2, dossier_url = ?3, submitted_at = ?4,
                         rejection_reason = NULL, updated_at = ?4
                     WHERE id = ?1 AND verification_status IN ({filter})"
                ),
                params![id.as_str(), target, dossier_url, at],
            ),
            StatusTransition::Hire(assignment) => tx.execute(
                &format!(
                    "UPDATE candidates
                     SET verification_status = ?2, assigned_zone = ?3, assigned_ward = ?4,
                         hired_at = ?5, hired_by = ?6, rejection_reason = NULL, updated_at = ?5
                     WHERE id = ?1 AND verification_status IN ({filter})"
                ),
                params![
                    id.as_str(),
                    target,
                    assignment.assigned_zone,
                    assignment.assigned_ward,
                    assignment.hired_at,
                    assignment.hired_by,
                ],
            ),
            StatusTransition::Reject { reason, at } => tx.execute(
                &format!(
                    "UPDATE candidates
                     SET verification_status = ?2, rejection_reason = ?3,
                         assigned_zone = NULL, assigned_ward = NULL, hired_at = NULL,
                         hired_by = NULL, updated_at = ?4
                     WHERE id = ?1 AND verification_status IN ({filter})"
                ),
                params![id.as_str(), target, reason, at],
            ),
        }
        .map_err(storage_error)?;

        let current = Self::select(&tx, id).map_err(storage_error)?;
        tx.commit().map_err(storage_error)?;

        Ok(match current {
            None => CasOutcome::Missing,
            Some(candidate) if changed == 1 => CasOutcome::Applied(candidate),
            Some(candidate) => CasOutcome::Stale(candidate),
        })
    }
}

/// Renders the accepted statuses as an SQL `IN` list. Labels are fixed identifiers.
fn status_filter(statuses: &[VerificationStatus]) -> String {
    statuses
        .iter()
        .map(|status| format!("'{}'", status.label()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Only key collisions are conflicts; any other constraint failure is an integrity fault.
fn storage_error(err: rusqlite::Error) -> RepositoryError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            match failure.extended_code {
                rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                | rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE => RepositoryError::Conflict,
                _ => RepositoryError::Integrity(err.to_string()),
            }
        }
        _ => RepositoryError::Unavailable(err.to_string()),
    }
}

fn candidate_from_row(row: &Row<'_>) -> rusqlite::Result<Candidate> {
    let status_label: String = row.get("verification_status")?;
    let verification_status = VerificationStatus::from_label(&status_label).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            6,
            Type::Text,
            format!("unknown verification status '{status_label}'").into(),
        )
    })?;

    let assignment = match (
        row.get::<_, Option<String>>("assigned_zone")?,
        row.get::<_, Option<String>>("assigned_ward")?,
        row.get::<_, Option<DateTime<Utc>>>("hired_at")?,
        row.get::<_, Option<String>>("hired_by")?,
    ) {
        (Some(assigned_zone), Some(assigned_ward), Some(hired_at), Some(hired_by)) => {
            Some(Assignment {
                assigned_zone,
                assigned_ward,
                hired_at,
                hired_by,
            })
        }
        _ => None,
    };

    Ok(Candidate {
        id: CandidateId(row.get("id")?),
        full_name: row.get("full_name")?,
        email: row.get("email")?,
        date_of_birth: row.get("date_of_birth")?,
        exam_id: row.get("exam_id")?,
        enrollment_number: row.get("enrollment_number")?,
        verification_status,
        dossier_url: row.get("dossier_url")?,
        rejection_reason: row.get("rejection_reason")?,
        assignment,
        registered_at: row.get("registered_at")?,
        submitted_at: row.get("submitted_at")?,
        updated_at: row.get("updated_at")?,
    })
}
