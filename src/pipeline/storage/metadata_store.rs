use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use super::StorageError;
use crate::models::{AnalysisRecord, ItemStatus, KeyEvent, MetadataRow, Protagonist, StatusRecord};

/// Table store holding one metadata row per item.
pub trait MetadataStore {
    /// Insert or replace the row for `row.item_id()`. No merge with prior state.
    fn upsert(&self, row: &MetadataRow) -> Result<(), StorageError>;

    fn get(&self, item_id: &str) -> Result<Option<MetadataRow>, StorageError>;

    fn count(&self) -> Result<usize, StorageError>;
}

/// SQLite-backed metadata table.
pub struct SqliteMetadataStore {
    conn: Connection,
}

impl SqliteMetadataStore {
    /// Open (or create) the database at `path` and run migrations.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// In-memory database (for tests and dry runs).
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch("PRAGMA journal_mode=DELETE;")?;
        run_migrations(&conn)?;
        Ok(Self { conn })
    }
}

/// Run all pending migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), StorageError> {
    let current_version = get_current_version(conn);

    let migrations: Vec<(i64, &str)> = vec![(
        1,
        include_str!("../../../resources/migrations/001_book_metadata.sql"),
    )];

    for (version, sql) in migrations {
        if version > current_version {
            tracing::info!("Running migration v{version}");
            conn.execute_batch(sql)
                .map_err(|e| StorageError::MigrationFailed {
                    version,
                    reason: e.to_string(),
                })?;
        }
    }

    Ok(())
}

/// Current schema version (0 if no schema exists yet).
fn get_current_version(conn: &Connection) -> i64 {
    conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
        row.get::<_, Option<i64>>(0)
    })
    .ok()
    .flatten()
    .unwrap_or(0)
}

impl MetadataStore for SqliteMetadataStore {
    fn upsert(&self, row: &MetadataRow) -> Result<(), StorageError> {
        let status = &row.status;
        let analysis = row.analysis.as_ref();

        let protagonist_json = analysis
            .and_then(|a| a.protagonist.as_ref())
            .map(serde_json::to_string)
            .transpose()?;
        let key_events_json = analysis
            .map(|a| serde_json::to_string(&a.key_events))
            .transpose()?;

        self.conn.execute(
            "INSERT OR REPLACE INTO book_metadata
             (item_id, status, original_key, processed_key, error_message,
              last_processed_timestamp, title, author, genre, protagonist,
              worldbuilding, temporal_spatial_setting, plot_summary, key_events,
              ending_summary, book_overview, raw_model_text)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            params![
                status.item_id,
                status.status.as_str(),
                status.original_key,
                status.processed_key,
                status.error_message,
                status.last_processed_timestamp,
                analysis.map(|a| a.title.as_str()),
                analysis.map(|a| a.author.as_str()),
                analysis.map(|a| a.genre.as_str()),
                protagonist_json,
                analysis.map(|a| a.worldbuilding.as_str()),
                analysis.map(|a| a.temporal_spatial_setting.as_str()),
                analysis.map(|a| a.plot_summary.as_str()),
                key_events_json,
                analysis.map(|a| a.ending_summary.as_str()),
                analysis.map(|a| a.book_overview.as_str()),
                analysis.and_then(|a| a.raw_model_text.as_deref()),
            ],
        )?;

        tracing::debug!(
            item_id = status.item_id.as_str(),
            status = status.status.as_str(),
            "Metadata row written"
        );
        Ok(())
    }

    fn get(&self, item_id: &str) -> Result<Option<MetadataRow>, StorageError> {
        let row = self
            .conn
            .query_row(
                "SELECT item_id, status, original_key, processed_key, error_message,
                        last_processed_timestamp, title, author, genre, protagonist,
                        worldbuilding, temporal_spatial_setting, plot_summary, key_events,
                        ending_summary, book_overview, raw_model_text
                 FROM book_metadata WHERE item_id = ?1",
                params![item_id],
                |row| {
                    Ok(DbRow {
                        item_id: row.get(0)?,
                        status: row.get(1)?,
                        original_key: row.get(2)?,
                        processed_key: row.get(3)?,
                        error_message: row.get(4)?,
                        last_processed_timestamp: row.get(5)?,
                        title: row.get(6)?,
                        author: row.get(7)?,
                        genre: row.get(8)?,
                        protagonist: row.get(9)?,
                        worldbuilding: row.get(10)?,
                        temporal_spatial_setting: row.get(11)?,
                        plot_summary: row.get(12)?,
                        key_events: row.get(13)?,
                        ending_summary: row.get(14)?,
                        book_overview: row.get(15)?,
                        raw_model_text: row.get(16)?,
                    })
                },
            )
            .optional()?;

        row.map(metadata_from_row).transpose()
    }

    fn count(&self) -> Result<usize, StorageError> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM book_metadata", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

struct DbRow {
    item_id: String,
    status: String,
    original_key: String,
    processed_key: Option<String>,
    error_message: Option<String>,
    last_processed_timestamp: i64,
    title: Option<String>,
    author: Option<String>,
    genre: Option<String>,
    protagonist: Option<String>,
    worldbuilding: Option<String>,
    temporal_spatial_setting: Option<String>,
    plot_summary: Option<String>,
    key_events: Option<String>,
    ending_summary: Option<String>,
    book_overview: Option<String>,
    raw_model_text: Option<String>,
}

fn metadata_from_row(row: DbRow) -> Result<MetadataRow, StorageError> {
    let status: ItemStatus = row.status.parse()?;

    let status_record = StatusRecord {
        item_id: row.item_id,
        status,
        original_key: row.original_key,
        processed_key: row.processed_key,
        error_message: row.error_message,
        last_processed_timestamp: row.last_processed_timestamp,
    };

    if status == ItemStatus::Failed {
        return Ok(MetadataRow::failed(status_record));
    }

    let protagonist: Option<Protagonist> = row
        .protagonist
        .as_deref()
        .map(serde_json::from_str::<Protagonist>)
        .transpose()?;
    let key_events: Vec<KeyEvent> = row
        .key_events
        .as_deref()
        .map(serde_json::from_str::<Vec<KeyEvent>>)
        .transpose()?
        .unwrap_or_default();

    let defaults = AnalysisRecord::default();
    let analysis = AnalysisRecord {
        title: row.title.unwrap_or(defaults.title),
        author: row.author.unwrap_or(defaults.author),
        genre: row.genre.unwrap_or(defaults.genre),
        protagonist,
        worldbuilding: row.worldbuilding.unwrap_or_default(),
        temporal_spatial_setting: row.temporal_spatial_setting.unwrap_or_default(),
        plot_summary: row.plot_summary.unwrap_or_default(),
        key_events,
        ending_summary: row.ending_summary.unwrap_or_default(),
        book_overview: row.book_overview.unwrap_or_default(),
        raw_model_text: row.raw_model_text,
    };

    Ok(MetadataRow::processed(status_record, analysis))
}
