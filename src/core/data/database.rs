//! SQLite connections and schema migrations
//!
//! Both stores follow the same pattern: open, switch to WAL, check
//! `PRAGMA user_version`, and run any outstanding migration inside a
//! transaction.

use std::path::Path;

use parking_lot::{Mutex, MutexGuard};
use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{DatabaseError, Result};

const CONTENT_DB_VERSION: u32 = 1;
const STATS_DB_VERSION: u32 = 1;

/// The content store: publications, releases, pages, blocks, files.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub async fn new(db_path: &Path) -> Result<Self> {
        info!("Opening content database at: {}", db_path.display());

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path).map_err(DatabaseError::Connection)?;
        Self::prepare(conn)
    }

    /// In-memory store used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::Connection)?;
        Self::prepare(conn)
    }

    fn prepare(mut conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(DatabaseError::Connection)?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(DatabaseError::Connection)?;

        let existing_version: u32 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .map_err(DatabaseError::Query)?;

        if existing_version < CONTENT_DB_VERSION {
            Self::upgrade_database(&mut conn, existing_version)?;
        }

        Ok(Database {
            conn: Mutex::new(conn),
        })
    }

    fn upgrade_database(conn: &mut Connection, existing_version: u32) -> Result<()> {
        debug!(
            "Upgrading content database from version {} to {}",
            existing_version, CONTENT_DB_VERSION
        );

        if existing_version == 0 {
            let tx = conn.transaction().map_err(DatabaseError::Query)?;

            tx.pragma_update(None, "user_version", CONTENT_DB_VERSION)
                .map_err(DatabaseError::Query)?;

            tx.execute_batch(
                r#"
                CREATE TABLE publications (
                    id TEXT PRIMARY KEY,
                    title TEXT NOT NULL,
                    slug TEXT NOT NULL UNIQUE
                );

                CREATE TABLE releases (
                    id TEXT PRIMARY KEY,
                    publication_id TEXT NOT NULL REFERENCES publications(id),
                    version INTEGER NOT NULL,
                    previous_version_id TEXT REFERENCES releases(id),
                    time_period TEXT NOT NULL,
                    year INTEGER NOT NULL,
                    label TEXT,
                    approval_status TEXT NOT NULL,
                    publish_scheduled TEXT,
                    next_release_date TEXT,
                    published TEXT,
                    notify_subscribers INTEGER NOT NULL DEFAULT 0,
                    update_published_date INTEGER NOT NULL DEFAULT 0,
                    data_guidance TEXT,
                    created_by TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    soft_deleted INTEGER NOT NULL DEFAULT 0
                );
                CREATE INDEX idx_releases_publication ON releases(publication_id);

                CREATE TABLE release_statuses (
                    id TEXT PRIMARY KEY,
                    release_id TEXT NOT NULL REFERENCES releases(id),
                    approval_status TEXT NOT NULL,
                    internal_note TEXT,
                    created_by TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );
                CREATE INDEX idx_statuses_release ON release_statuses(release_id);

                CREATE TABLE pages (
                    id TEXT PRIMARY KEY,
                    kind TEXT NOT NULL,
                    release_id TEXT REFERENCES releases(id),
                    title TEXT NOT NULL,
                    slug TEXT NOT NULL
                );

                CREATE TABLE content_sections (
                    id TEXT PRIMARY KEY,
                    page_id TEXT NOT NULL REFERENCES pages(id),
                    ord INTEGER NOT NULL,
                    heading TEXT NOT NULL
                );
                CREATE INDEX idx_sections_page ON content_sections(page_id);

                CREATE TABLE content_blocks (
                    id TEXT PRIMARY KEY,
                    section_id TEXT NOT NULL REFERENCES content_sections(id),
                    ord INTEGER NOT NULL,
                    kind TEXT NOT NULL,
                    body TEXT,
                    data_block_version_id TEXT,
                    embed_id TEXT
                );
                CREATE INDEX idx_blocks_section ON content_blocks(section_id);

                CREATE TABLE tiles (
                    id TEXT PRIMARY KEY,
                    block_id TEXT NOT NULL REFERENCES content_blocks(id),
                    ord INTEGER NOT NULL,
                    kind TEXT NOT NULL,
                    title TEXT NOT NULL,
                    statistic TEXT,
                    trend TEXT,
                    link_text TEXT,
                    link_url TEXT
                );
                CREATE INDEX idx_tiles_block ON tiles(block_id);

                CREATE TABLE comments (
                    id TEXT PRIMARY KEY,
                    block_id TEXT NOT NULL REFERENCES content_blocks(id),
                    content TEXT NOT NULL,
                    created_by TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    resolved INTEGER NOT NULL DEFAULT 0
                );

                CREATE TABLE embeds (
                    id TEXT PRIMARY KEY,
                    title TEXT NOT NULL,
                    url TEXT NOT NULL
                );

                CREATE TABLE data_block_parents (
                    id TEXT PRIMARY KEY,
                    publication_id TEXT NOT NULL REFERENCES publications(id),
                    name TEXT NOT NULL
                );

                CREATE TABLE data_block_versions (
                    id TEXT PRIMARY KEY,
                    parent_id TEXT NOT NULL REFERENCES data_block_parents(id),
                    release_id TEXT NOT NULL REFERENCES releases(id),
                    name TEXT NOT NULL,
                    heading TEXT,
                    source TEXT,
                    query TEXT NOT NULL,
                    table_config TEXT NOT NULL,
                    chart_config TEXT,
                    version INTEGER NOT NULL
                );
                CREATE INDEX idx_dbv_release ON data_block_versions(release_id);

                CREATE TABLE key_statistics (
                    id TEXT PRIMARY KEY,
                    release_id TEXT NOT NULL REFERENCES releases(id),
                    ord INTEGER NOT NULL,
                    kind TEXT NOT NULL,
                    title TEXT,
                    statistic TEXT,
                    trend TEXT,
                    guidance_title TEXT,
                    guidance_text TEXT,
                    data_block_version_id TEXT
                );
                CREATE INDEX idx_keystats_release ON key_statistics(release_id);

                CREATE TABLE files (
                    id TEXT PRIMARY KEY,
                    filename TEXT NOT NULL,
                    content_type TEXT NOT NULL,
                    size INTEGER NOT NULL,
                    kind TEXT NOT NULL,
                    source_archive_id TEXT,
                    paired_file_id TEXT,
                    replacing_id TEXT,
                    replaced_by_id TEXT,
                    created_by TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE release_files (
                    id TEXT PRIMARY KEY,
                    release_id TEXT NOT NULL REFERENCES releases(id),
                    file_id TEXT NOT NULL REFERENCES files(id),
                    name TEXT,
                    ord INTEGER NOT NULL DEFAULT 0,
                    UNIQUE (release_id, file_id)
                );
                CREATE INDEX idx_release_files_release ON release_files(release_id);

                CREATE TABLE user_release_roles (
                    id TEXT PRIMARY KEY,
                    release_id TEXT NOT NULL REFERENCES releases(id),
                    user_email TEXT NOT NULL,
                    role TEXT NOT NULL
                );

                CREATE TABLE prerelease_invites (
                    id TEXT PRIMARY KEY,
                    release_id TEXT NOT NULL REFERENCES releases(id),
                    email TEXT NOT NULL,
                    sent INTEGER NOT NULL DEFAULT 0
                );

                CREATE TABLE release_notes (
                    id TEXT PRIMARY KEY,
                    release_id TEXT NOT NULL REFERENCES releases(id),
                    ord INTEGER NOT NULL,
                    reason TEXT NOT NULL,
                    created_by TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE related_links (
                    id TEXT PRIMARY KEY,
                    release_id TEXT NOT NULL REFERENCES releases(id),
                    ord INTEGER NOT NULL,
                    title TEXT NOT NULL,
                    url TEXT NOT NULL
                );

                CREATE TABLE featured_tables (
                    id TEXT PRIMARY KEY,
                    release_id TEXT NOT NULL REFERENCES releases(id),
                    ord INTEGER NOT NULL,
                    name TEXT NOT NULL,
                    description TEXT,
                    data_block_version_id TEXT NOT NULL
                );

                CREATE TABLE data_imports (
                    file_id TEXT PRIMARY KEY,
                    status TEXT NOT NULL,
                    total_rows INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL
                );
                "#,
            )
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;

            tx.commit().map_err(DatabaseError::Query)?;
        }

        info!("Content database migrated");
        Ok(())
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }
}

/// The statistics store: subjects, footnotes and their associations.
pub struct StatsDatabase {
    conn: Mutex<Connection>,
}

impl StatsDatabase {
    pub async fn new(db_path: &Path) -> Result<Self> {
        info!("Opening statistics database at: {}", db_path.display());

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path).map_err(DatabaseError::Connection)?;
        Self::prepare(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::Connection)?;
        Self::prepare(conn)
    }

    fn prepare(mut conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(DatabaseError::Connection)?;

        let existing_version: u32 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .map_err(DatabaseError::Query)?;

        if existing_version < STATS_DB_VERSION {
            Self::upgrade_database(&mut conn, existing_version)?;
        }

        Ok(StatsDatabase {
            conn: Mutex::new(conn),
        })
    }

    fn upgrade_database(conn: &mut Connection, existing_version: u32) -> Result<()> {
        debug!(
            "Upgrading statistics database from version {} to {}",
            existing_version, STATS_DB_VERSION
        );

        if existing_version == 0 {
            let tx = conn.transaction().map_err(DatabaseError::Query)?;

            tx.pragma_update(None, "user_version", STATS_DB_VERSION)
                .map_err(DatabaseError::Query)?;

            tx.execute_batch(
                r#"
                CREATE TABLE stat_releases (
                    id TEXT PRIMARY KEY,
                    publication_id TEXT NOT NULL
                );

                CREATE TABLE subjects (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL
                );

                CREATE TABLE release_subjects (
                    release_id TEXT NOT NULL,
                    subject_id TEXT NOT NULL,
                    PRIMARY KEY (release_id, subject_id)
                );

                CREATE TABLE footnotes (
                    id TEXT PRIMARY KEY,
                    content TEXT NOT NULL
                );

                CREATE TABLE release_footnotes (
                    release_id TEXT NOT NULL,
                    footnote_id TEXT NOT NULL,
                    ord INTEGER NOT NULL,
                    PRIMARY KEY (release_id, footnote_id)
                );

                CREATE TABLE footnote_subjects (
                    footnote_id TEXT NOT NULL,
                    subject_id TEXT NOT NULL,
                    PRIMARY KEY (footnote_id, subject_id)
                );

                CREATE TABLE footnote_filters (
                    footnote_id TEXT NOT NULL,
                    filter_id TEXT NOT NULL,
                    PRIMARY KEY (footnote_id, filter_id)
                );

                CREATE TABLE footnote_filter_items (
                    footnote_id TEXT NOT NULL,
                    filter_item_id TEXT NOT NULL,
                    PRIMARY KEY (footnote_id, filter_item_id)
                );

                CREATE TABLE footnote_indicators (
                    footnote_id TEXT NOT NULL,
                    indicator_id TEXT NOT NULL,
                    PRIMARY KEY (footnote_id, indicator_id)
                );
                "#,
            )
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;

            tx.commit().map_err(DatabaseError::Query)?;
        }

        info!("Statistics database migrated");
        Ok(())
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }
}
