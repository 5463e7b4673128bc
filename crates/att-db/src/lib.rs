//! Storage layer for card-tap attendance.
//!
//! Persists the append-only tap log and the card holder registry using
//! `rusqlite`, and implements [`RecordStore`] so the report facade can read
//! from it.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` can be moved between threads but not shared across them without
//! external synchronization. The report facade therefore reads the store from one
//! thread and only parallelizes the computation over fetched events.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Timestamps are local wall-clock times stored as TEXT in the fixed-width form
//! `YYYY-MM-DD HH:MM:SS.ffffff`, so lexicographic order matches chronological
//! order and range queries can compare strings directly.
//!
//! ## Event Kinds
//!
//! The `type` column stores the integer code of [`EventKind`]
//! (`1` = clock in, `2` = clock out).

use std::path::Path;

use att_core::offset::offset_delta;
use att_core::{AttendanceEvent, CardHolder, CardId, EventKind, RecordStore, ValidationError};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use thiserror::Error;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
const EXPORT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Failed to parse a stored timestamp.
    #[error("invalid timestamp for record {record_id}: {timestamp}")]
    TimestampParse {
        record_id: i64,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored row or caller input violates a domain rule.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Month outside `1..=12`.
    #[error("invalid month: {0}")]
    InvalidMonth(u32),
    /// Year outside the supported calendar range.
    #[error("invalid year: {0}")]
    InvalidYear(i32),
    /// A new holder was registered without a name.
    #[error("card {0} is not registered; a name is required")]
    MissingName(CardId),
    /// Failed to write an export file.
    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// Optional criteria for [`Database::search_records`].
///
/// `month` narrows a `year` search and is ignored without one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub card_id: Option<CardId>,
    pub kind: Option<EventKind>,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

/// Partial update for a holder. `None` fields keep their stored value.
#[derive(Debug, Clone, PartialEq)]
pub struct HolderUpdate {
    pub card_id: CardId,
    pub name: Option<String>,
    pub is_admin: Option<bool>,
    pub student_number: Option<String>,
    pub offset_hours: Option<f64>,
}

impl HolderUpdate {
    /// An update that changes nothing yet.
    #[must_use]
    pub const fn new(card_id: CardId) -> Self {
        Self {
            card_id,
            name: None,
            is_admin: None,
            student_number: None,
            offset_hours: None,
        }
    }
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- Append-only tap log
            -- timestamp: local time, 'YYYY-MM-DD HH:MM:SS.ffffff'
            -- type: 1 = clock in, 2 = clock out
            CREATE TABLE IF NOT EXISTS attendance (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                card_id TEXT NOT NULL,
                type INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_attendance_card_time ON attendance(card_id, timestamp);
            CREATE INDEX IF NOT EXISTS idx_attendance_timestamp ON attendance(timestamp);

            CREATE TABLE IF NOT EXISTS card_holders (
                card_id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                is_admin INTEGER NOT NULL DEFAULT 0,
                student_number TEXT,
                offset_hours REAL NOT NULL DEFAULT 0
            );
            ",
        )?;
        Ok(())
    }

    /// Appends a tap and returns its id.
    pub fn add_record(
        &mut self,
        card_id: &CardId,
        kind: EventKind,
        timestamp: NaiveDateTime,
    ) -> Result<i64, DbError> {
        self.conn.execute(
            "INSERT INTO attendance (timestamp, card_id, type) VALUES (?, ?, ?)",
            params![format_timestamp(timestamp), card_id.as_str(), kind.code()],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::debug!(id, card_id = %card_id, kind = %kind, %timestamp, "recorded tap");
        Ok(id)
    }

    /// Deletes a tap. Returns `false` when no record has that id.
    pub fn delete_record(&mut self, record_id: i64) -> Result<bool, DbError> {
        let deleted = self
            .conn
            .execute("DELETE FROM attendance WHERE id = ?", params![record_id])?;
        Ok(deleted > 0)
    }

    /// Taps matching every given criterion, oldest first.
    pub fn search_records(&self, filter: &RecordFilter) -> Result<Vec<AttendanceEvent>, DbError> {
        let mut clauses = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(card_id) = &filter.card_id {
            clauses.push("card_id = ?");
            values.push(Value::Text(card_id.as_str().to_string()));
        }
        if let Some(kind) = filter.kind {
            clauses.push("type = ?");
            values.push(Value::Integer(kind.code()));
        }
        if let Some(year) = filter.year {
            let (from, to) = calendar_range(year, filter.month)?;
            clauses.push("timestamp >= ? AND timestamp < ?");
            values.push(Value::Text(format_timestamp(from)));
            values.push(Value::Text(format_timestamp(to)));
        }

        let mut sql = String::from("SELECT id, timestamp, card_id, type FROM attendance");
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY timestamp ASC, id ASC");

        self.query_events(&sql, values)
    }

    /// Taps of every card with `start <= timestamp <= end`.
    pub fn records_in_range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<AttendanceEvent>, DbError> {
        self.query_events(
            "
            SELECT id, timestamp, card_id, type
            FROM attendance
            WHERE timestamp >= ? AND timestamp <= ?
            ORDER BY timestamp ASC, id ASC
            ",
            vec![
                Value::Text(format_timestamp(start)),
                Value::Text(format_timestamp(end)),
            ],
        )
    }

    fn query_events(&self, sql: &str, values: Vec<Value>) -> Result<Vec<AttendanceEvent>, DbError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params_from_iter(values), |row| {
            Ok(EventRow {
                id: row.get(0)?,
                timestamp: row.get(1)?,
                card_id: row.get(2)?,
                kind: row.get(3)?,
            })
        })?;
        let mut events = Vec::new();
        for row in rows {
            events.push(row?.into_event()?);
        }
        Ok(events)
    }

    /// Creates or updates a holder and returns the stored result.
    ///
    /// Registering a new card requires a name. Offsets must be finite.
    pub fn upsert_holder(&mut self, update: HolderUpdate) -> Result<CardHolder, DbError> {
        if let Some(offset_hours) = update.offset_hours {
            if offset_delta(offset_hours).is_none() {
                return Err(ValidationError::OffsetNotFinite {
                    value: offset_hours,
                }
                .into());
            }
        }
        if update.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err(ValidationError::Empty { field: "name" }.into());
        }

        let existing = self.get_holder(&update.card_id)?;
        let holder = match existing {
            Some(current) => CardHolder {
                card_id: current.card_id,
                name: update.name.unwrap_or(current.name),
                is_admin: update.is_admin.unwrap_or(current.is_admin),
                student_number: update.student_number.or(current.student_number),
                offset_hours: update.offset_hours.unwrap_or(current.offset_hours),
            },
            None => {
                let Some(name) = update.name else {
                    return Err(DbError::MissingName(update.card_id));
                };
                CardHolder {
                    card_id: update.card_id,
                    name,
                    is_admin: update.is_admin.unwrap_or(false),
                    student_number: update.student_number,
                    offset_hours: update.offset_hours.unwrap_or(0.0),
                }
            }
        };

        self.conn.execute(
            "
            INSERT INTO card_holders (card_id, name, is_admin, student_number, offset_hours)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(card_id) DO UPDATE SET
                name = excluded.name,
                is_admin = excluded.is_admin,
                student_number = excluded.student_number,
                offset_hours = excluded.offset_hours
            ",
            params![
                holder.card_id.as_str(),
                holder.name,
                holder.is_admin,
                holder.student_number,
                holder.offset_hours,
            ],
        )?;
        tracing::debug!(card_id = %holder.card_id, name = %holder.name, "saved holder");
        Ok(holder)
    }

    /// Looks up one holder.
    pub fn get_holder(&self, card_id: &CardId) -> Result<Option<CardHolder>, DbError> {
        let row = self
            .conn
            .query_row(
                "
                SELECT card_id, name, is_admin, student_number, offset_hours
                FROM card_holders
                WHERE card_id = ?
                ",
                params![card_id.as_str()],
                HolderRow::from_row,
            )
            .optional()?;
        row.map(HolderRow::into_holder).transpose()
    }

    /// Every holder, ordered by name then card id.
    pub fn list_holders(&self) -> Result<Vec<CardHolder>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT card_id, name, is_admin, student_number, offset_hours
            FROM card_holders
            ORDER BY name ASC, card_id ASC
            ",
        )?;
        let rows = stmt.query_map([], HolderRow::from_row)?;
        let mut holders = Vec::new();
        for row in rows {
            holders.push(row?.into_holder()?);
        }
        Ok(holders)
    }

    /// Writes the raw taps of a year, or of one month, as CSV.
    ///
    /// Columns are `id,timestamp,card_id,type` with `type` as its integer code.
    /// Returns the number of rows written.
    pub fn export_records_csv(
        &self,
        year: i32,
        month: Option<u32>,
        path: &Path,
    ) -> Result<usize, DbError> {
        let records = self.search_records(&RecordFilter {
            year: Some(year),
            month,
            ..RecordFilter::default()
        })?;

        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["id", "timestamp", "card_id", "type"])?;
        for record in &records {
            writer.write_record([
                record.id.to_string(),
                record.timestamp.format(EXPORT_TIMESTAMP_FORMAT).to_string(),
                record.card_id.to_string(),
                record.kind.code().to_string(),
            ])?;
        }
        writer.flush().map_err(csv::Error::from)?;
        tracing::info!(path = %path.display(), rows = records.len(), "exported records");
        Ok(records.len())
    }
}

impl RecordStore for Database {
    type Error = DbError;

    fn fetch(
        &self,
        card_id: &CardId,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<AttendanceEvent>, Self::Error> {
        self.query_events(
            "
            SELECT id, timestamp, card_id, type
            FROM attendance
            WHERE card_id = ? AND timestamp >= ? AND timestamp <= ?
            ORDER BY timestamp ASC, id ASC
            ",
            vec![
                Value::Text(card_id.as_str().to_string()),
                Value::Text(format_timestamp(start)),
                Value::Text(format_timestamp(end)),
            ],
        )
    }

    fn get_holder(&self, card_id: &CardId) -> Result<Option<CardHolder>, Self::Error> {
        Self::get_holder(self, card_id)
    }

    fn list_holders(&self) -> Result<Vec<CardHolder>, Self::Error> {
        Self::list_holders(self)
    }
}

#[derive(Debug)]
struct EventRow {
    id: i64,
    timestamp: String,
    card_id: String,
    kind: i64,
}

impl EventRow {
    fn into_event(self) -> Result<AttendanceEvent, DbError> {
        let timestamp = parse_timestamp(&self.timestamp, self.id)?;
        Ok(AttendanceEvent {
            id: self.id,
            card_id: CardId::new(self.card_id)?,
            kind: EventKind::from_code(self.kind)?,
            timestamp,
        })
    }
}

#[derive(Debug)]
struct HolderRow {
    card_id: String,
    name: String,
    is_admin: bool,
    student_number: Option<String>,
    offset_hours: f64,
}

impl HolderRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            card_id: row.get(0)?,
            name: row.get(1)?,
            is_admin: row.get(2)?,
            student_number: row.get(3)?,
            offset_hours: row.get(4)?,
        })
    }

    fn into_holder(self) -> Result<CardHolder, DbError> {
        Ok(CardHolder {
            card_id: CardId::new(self.card_id)?,
            name: self.name,
            is_admin: self.is_admin,
            student_number: self.student_number,
            offset_hours: self.offset_hours,
        })
    }
}

/// Half-open `[from, to)` range covering a calendar year or one of its months.
fn calendar_range(
    year: i32,
    month: Option<u32>,
) -> Result<(NaiveDateTime, NaiveDateTime), DbError> {
    let next_year = year.checked_add(1).ok_or(DbError::InvalidYear(year))?;
    let (from, to) = match month {
        None => (
            NaiveDate::from_ymd_opt(year, 1, 1),
            NaiveDate::from_ymd_opt(next_year, 1, 1),
        ),
        Some(month @ 1..=11) => (
            NaiveDate::from_ymd_opt(year, month, 1),
            NaiveDate::from_ymd_opt(year, month + 1, 1),
        ),
        Some(12) => (
            NaiveDate::from_ymd_opt(year, 12, 1),
            NaiveDate::from_ymd_opt(next_year, 1, 1),
        ),
        Some(other) => return Err(DbError::InvalidMonth(other)),
    };
    match (from, to) {
        (Some(from), Some(to)) => Ok((
            from.and_time(chrono::NaiveTime::MIN),
            to.and_time(chrono::NaiveTime::MIN),
        )),
        _ => Err(DbError::InvalidYear(year)),
    }
}

fn parse_timestamp(timestamp: &str, record_id: i64) -> Result<NaiveDateTime, DbError> {
    NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).map_err(|source| {
        DbError::TimestampParse {
            record_id,
            timestamp: timestamp.to_string(),
            source,
        }
    })
}

fn format_timestamp(timestamp: NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}
