//! SQLite database operations for snag records.
//!
//! Holds snag and photo metadata. Photos reference their bytes by blob
//! key only; this module never touches the blob directory.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params};
use tracing::{debug, info, instrument, trace};
use uuid::Uuid;

use super::schema::{
    Photo, RecordCounts, Snag, SnagFilter, SnagPatch, SnagSummary, advance_timestamp,
};
use crate::blob::BlobKey;
use crate::error::{Result, SnagError};

/// SQLite schema for snag storage.
const SCHEMA_SQL: &str = r"
-- Snag metadata
CREATE TABLE IF NOT EXISTS snags (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    notes TEXT NOT NULL DEFAULT '',
    location TEXT NOT NULL DEFAULT '',
    priority TEXT NOT NULL,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    CHECK (updated_at >= created_at)
);

-- Photo metadata; bytes live in the blob store under `filename`
CREATE TABLE IF NOT EXISTS photos (
    id TEXT PRIMARY KEY,
    snag_id TEXT NOT NULL REFERENCES snags(id) ON DELETE CASCADE,
    filename TEXT NOT NULL UNIQUE,
    width INTEGER,
    height INTEGER,
    created_at TEXT NOT NULL
);

-- Indexes for performance
CREATE INDEX IF NOT EXISTS idx_photos_snag ON photos(snag_id);
CREATE INDEX IF NOT EXISTS idx_snags_updated ON snags(updated_at);
";

const SNAG_COLUMNS: &str =
    "id, title, notes, location, priority, status, created_at, updated_at";
const PHOTO_COLUMNS: &str = "id, snag_id, filename, width, height, created_at";

/// Shortest id prefix accepted in place of a full UUID.
pub const MIN_PREFIX_LEN: usize = 4;

/// Tables addressable by id prefix.
#[derive(Debug, Clone, Copy)]
enum IdTable {
    Snags,
    Photos,
}

impl IdTable {
    const fn name(self) -> &'static str {
        match self {
            Self::Snags => "snags",
            Self::Photos => "photos",
        }
    }

    fn not_found(self, id: String) -> SnagError {
        match self {
            Self::Snags => SnagError::SnagNotFound { id },
            Self::Photos => SnagError::PhotoNotFound { id },
        }
    }
}

/// Fixed-width, lexically sortable timestamp form.
fn ts(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SnagError::CorruptRecord(format!("invalid timestamp '{raw}': {e}")))
}

fn parse_uuid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| SnagError::CorruptRecord(format!("invalid id '{raw}': {e}")))
}

/// Raw `snags` row before field parsing.
struct SnagRow {
    id: String,
    title: String,
    notes: String,
    location: String,
    priority: String,
    status: String,
    created_at: String,
    updated_at: String,
}

impl SnagRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            notes: row.get(2)?,
            location: row.get(3)?,
            priority: row.get(4)?,
            status: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }

    fn into_snag(self, photos: Vec<Photo>) -> Result<Snag> {
        Ok(Snag {
            id: parse_uuid(&self.id)?,
            title: self.title,
            notes: self.notes,
            location: self.location,
            priority: self.priority.parse()?,
            status: self.status.parse()?,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
            photos,
        })
    }
}

/// Raw `photos` row before field parsing.
struct PhotoRow {
    id: String,
    snag_id: String,
    filename: String,
    width: Option<u32>,
    height: Option<u32>,
    created_at: String,
}

impl PhotoRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            snag_id: row.get(1)?,
            filename: row.get(2)?,
            width: row.get(3)?,
            height: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    fn into_photo(self) -> Result<Photo> {
        Ok(Photo {
            id: parse_uuid(&self.id)?,
            snag_id: parse_uuid(&self.snag_id)?,
            filename: BlobKey::parse(&self.filename)
                .map_err(|e| SnagError::CorruptRecord(e.to_string()))?,
            width: self.width,
            height: self.height,
            created_at: parse_ts(&self.created_at)?,
        })
    }
}

/// Database wrapper for snag storage.
pub struct SnagDb {
    conn: Connection,
}

impl SnagDb {
    /// Opens or creates a database at the given path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SnagError::Other(format!(
                    "Failed to create directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        debug!(path = %path.display(), "Opening snag database");
        let conn = Connection::open(path)?;

        let db = Self { conn };
        db.init_schema()?;
        info!(path = %path.display(), "Snag database ready");
        Ok(db)
    }

    /// Creates an in-memory database (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Initializes the database schema.
    fn init_schema(&self) -> Result<()> {
        // Cascade deletes depend on this, and it is per-connection.
        self.conn.execute_batch("PRAGMA foreign_keys = ON")?;
        self.conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    // === Snag Operations ===

    /// Inserts a new snag together with any photos it already carries.
    #[instrument(skip(self, snag), fields(id = %snag.id))]
    pub fn create_snag(&mut self, snag: &Snag) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            &format!("INSERT INTO snags ({SNAG_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
            params![
                snag.id.to_string(),
                snag.title,
                snag.notes,
                snag.location,
                snag.priority.as_str(),
                snag.status.as_str(),
                ts(&snag.created_at),
                ts(&snag.updated_at),
            ],
        )?;
        for photo in &snag.photos {
            insert_photo_row(&tx, photo)?;
        }
        tx.commit()?;

        info!(id = %snag.id, title = %snag.title, photos = snag.photos.len(), "Snag created");
        Ok(())
    }

    /// Loads a snag and its photos.
    #[instrument(skip(self))]
    pub fn get_snag(&self, id: &Uuid) -> Result<Option<Snag>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {SNAG_COLUMNS} FROM snags WHERE id = ?1"),
                params![id.to_string()],
                SnagRow::from_row,
            )
            .optional()?;

        let Some(row) = row else {
            debug!("Snag not found");
            return Ok(None);
        };

        let photos = self.photos_for_snag(id)?;
        row.into_snag(photos).map(Some)
    }

    /// Like [`get_snag`](Self::get_snag) but a missing snag is an error.
    pub fn require_snag(&self, id: &Uuid) -> Result<Snag> {
        self.get_snag(id)?.ok_or_else(|| SnagError::SnagNotFound {
            id: id.to_string(),
        })
    }

    /// Resolves a full snag id or a unique prefix (at least 4 characters).
    #[instrument(skip(self))]
    pub fn resolve_snag_id(&self, input: &str) -> Result<Uuid> {
        self.resolve_prefix(IdTable::Snags, input)
    }

    /// Resolves a full photo id or a unique prefix (at least 4 characters).
    #[instrument(skip(self))]
    pub fn resolve_photo_id(&self, input: &str) -> Result<Uuid> {
        self.resolve_prefix(IdTable::Photos, input)
    }

    fn resolve_prefix(&self, table: IdTable, input: &str) -> Result<Uuid> {
        let input = input.trim().to_lowercase();
        if let Ok(id) = Uuid::parse_str(&input) {
            return Ok(id);
        }
        if input.len() < MIN_PREFIX_LEN || !input.chars().all(|c| c.is_ascii_hexdigit() || c == '-')
        {
            return Err(table.not_found(input));
        }

        let name = table.name();
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT id FROM {name} WHERE id LIKE ?1 || '%' LIMIT 2"))?;
        let matches: Vec<String> = stmt
            .query_map(params![input], |row| row.get(0))?
            .collect::<std::result::Result<_, _>>()?;

        match matches.as_slice() {
            [] => Err(table.not_found(input)),
            [only] => parse_uuid(only),
            _ => {
                let count: i64 = self.conn.query_row(
                    &format!("SELECT COUNT(*) FROM {name} WHERE id LIKE ?1 || '%'"),
                    params![input],
                    |row| row.get(0),
                )?;
                Err(SnagError::AmbiguousId {
                    prefix: input,
                    count: usize::try_from(count).unwrap_or_default(),
                })
            }
        }
    }

    /// Lists snag summaries matching `filter`, most recently updated first.
    #[instrument(skip(self))]
    pub fn list_snags(&self, filter: &SnagFilter) -> Result<Vec<SnagSummary>> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", escape_like(s)));

        let mut stmt = self.conn.prepare(
            r"SELECT s.id, s.title, s.location, s.priority, s.status, s.updated_at,
                    (SELECT COUNT(*) FROM photos p WHERE p.snag_id = s.id)
             FROM snags s
             WHERE (?1 IS NULL
                    OR s.title LIKE ?1 ESCAPE '\'
                    OR s.location LIKE ?1 ESCAPE '\'
                    OR s.notes LIKE ?1 ESCAPE '\')
               AND (?2 IS NULL OR s.status = ?2)
               AND (?3 IS NULL OR s.priority = ?3)
             ORDER BY s.updated_at DESC, s.rowid DESC",
        )?;

        let rows = stmt
            .query_map(
                params![
                    search,
                    filter.status.map(|s| s.as_str()),
                    filter.priority.map(|p| p.as_str()),
                ],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, i64>(6)?,
                    ))
                },
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let summaries = rows
            .into_iter()
            .map(|(id, title, location, priority, status, updated_at, photos)| {
                Ok(SnagSummary {
                    id: parse_uuid(&id)?,
                    title,
                    location,
                    priority: priority.parse()?,
                    status: status.parse()?,
                    photo_count: usize::try_from(photos).unwrap_or_default(),
                    updated_at: parse_ts(&updated_at)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(count = summaries.len(), "Listed snags");
        Ok(summaries)
    }

    /// Applies `patch` to a snag.
    ///
    /// `updated_at` advances only if a field actually changed.
    #[instrument(skip(self, patch))]
    pub fn update_snag(&mut self, id: &Uuid, patch: &SnagPatch) -> Result<Snag> {
        let mut snag = self.require_snag(id)?;
        if !patch.apply(&mut snag) {
            debug!("Patch changes nothing");
            return Ok(snag);
        }
        snag.updated_at = advance_timestamp(snag.updated_at);

        self.conn.execute(
            "UPDATE snags SET title = ?1, notes = ?2, location = ?3, priority = ?4,
                    status = ?5, updated_at = ?6
             WHERE id = ?7",
            params![
                snag.title,
                snag.notes,
                snag.location,
                snag.priority.as_str(),
                snag.status.as_str(),
                ts(&snag.updated_at),
                id.to_string(),
            ],
        )?;

        info!(id = %id, "Snag updated");
        Ok(snag)
    }

    /// Deletes a snag; its photo rows go with it.
    ///
    /// Returns true if a snag was deleted, false if not found.
    #[instrument(skip(self))]
    pub fn delete_snag(&mut self, id: &Uuid) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM snags WHERE id = ?1", params![id.to_string()])?;

        if deleted > 0 {
            info!(%id, "Snag deleted");
            Ok(true)
        } else {
            debug!(%id, "Snag not found for deletion");
            Ok(false)
        }
    }

    // === Photo Operations ===

    /// Commits a photo row and advances the owning snag's `updated_at`.
    ///
    /// Returns the snag's new `updated_at`.
    #[instrument(skip(self, photo), fields(photo = %photo.id, snag = %photo.snag_id))]
    pub fn insert_photo(&mut self, photo: &Photo) -> Result<DateTime<Utc>> {
        let tx = self.conn.transaction()?;
        insert_photo_row(&tx, photo)?;
        let updated_at = touch_snag(&tx, &photo.snag_id)?;
        tx.commit()?;

        info!(filename = %photo.filename, "Photo committed");
        Ok(updated_at)
    }

    /// Loads one photo row.
    #[instrument(skip(self))]
    pub fn get_photo(&self, id: &Uuid) -> Result<Option<Photo>> {
        self.conn
            .query_row(
                &format!("SELECT {PHOTO_COLUMNS} FROM photos WHERE id = ?1"),
                params![id.to_string()],
                PhotoRow::from_row,
            )
            .optional()?
            .map(PhotoRow::into_photo)
            .transpose()
    }

    /// Like [`get_photo`](Self::get_photo) but a missing photo is an error.
    pub fn require_photo(&self, id: &Uuid) -> Result<Photo> {
        self.get_photo(id)?.ok_or_else(|| SnagError::PhotoNotFound {
            id: id.to_string(),
        })
    }

    /// Photos owned by a snag, oldest first.
    #[instrument(skip(self))]
    pub fn photos_for_snag(&self, snag_id: &Uuid) -> Result<Vec<Photo>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PHOTO_COLUMNS} FROM photos WHERE snag_id = ?1 ORDER BY created_at, rowid"
        ))?;
        let rows = stmt
            .query_map(params![snag_id.to_string()], PhotoRow::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        trace!(count = rows.len(), "Loaded photo rows");
        rows.into_iter().map(PhotoRow::into_photo).collect()
    }

    /// Deletes a photo row and advances the owning snag's `updated_at`.
    ///
    /// Returns true if a photo was deleted, false if not found.
    #[instrument(skip(self))]
    pub fn delete_photo(&mut self, id: &Uuid) -> Result<bool> {
        let tx = self.conn.transaction()?;
        let snag_id: Option<String> = tx
            .query_row(
                "SELECT snag_id FROM photos WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        let Some(snag_id) = snag_id else {
            debug!(%id, "Photo not found for deletion");
            return Ok(false);
        };

        tx.execute("DELETE FROM photos WHERE id = ?1", params![id.to_string()])?;
        touch_snag(&tx, &parse_uuid(&snag_id)?)?;
        tx.commit()?;

        info!(%id, "Photo deleted");
        Ok(true)
    }

    // === Reconciliation Support ===

    /// Every blob key referenced by a live photo row.
    #[instrument(skip(self))]
    pub fn referenced_keys(&self) -> Result<HashSet<BlobKey>> {
        let mut stmt = self.conn.prepare("SELECT filename FROM photos")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let keys = names
            .iter()
            .map(|name| {
                BlobKey::parse(name).map_err(|e| SnagError::CorruptRecord(e.to_string()))
            })
            .collect::<Result<HashSet<_>>>()?;
        debug!(count = keys.len(), "Collected referenced blob keys");
        Ok(keys)
    }

    /// Row totals.
    pub fn counts(&self) -> Result<RecordCounts> {
        let (snags, photos): (i64, i64) = self.conn.query_row(
            "SELECT (SELECT COUNT(*) FROM snags), (SELECT COUNT(*) FROM photos)",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(RecordCounts {
            snags: usize::try_from(snags).unwrap_or_default(),
            photos: usize::try_from(photos).unwrap_or_default(),
        })
    }
}

fn insert_photo_row(tx: &Transaction<'_>, photo: &Photo) -> Result<()> {
    trace!(photo = %photo.id, "Inserting photo row");
    tx.execute(
        &format!("INSERT INTO photos ({PHOTO_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
        params![
            photo.id.to_string(),
            photo.snag_id.to_string(),
            photo.filename.as_str(),
            photo.width,
            photo.height,
            ts(&photo.created_at),
        ],
    )?;
    Ok(())
}

/// Advances a snag's `updated_at` inside `tx`.
fn touch_snag(tx: &Transaction<'_>, snag_id: &Uuid) -> Result<DateTime<Utc>> {
    let current: Option<String> = tx
        .query_row(
            "SELECT updated_at FROM snags WHERE id = ?1",
            params![snag_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    let current = current.ok_or_else(|| SnagError::SnagNotFound {
        id: snag_id.to_string(),
    })?;

    let next = advance_timestamp(parse_ts(&current)?);
    tx.execute(
        "UPDATE snags SET updated_at = ?1 WHERE id = ?2",
        params![ts(&next), snag_id.to_string()],
    )?;
    Ok(next)
}

fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}
