use domain::errors::ConfigError;
use domain::models::IndexedChunk;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Result as SqlResult};
use shared::types::Result;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

pub const INDEX_FILE: &str = "index.sqlite3";

const EMBEDDING_MODEL_KEY: &str = "embedding_model";

const INDEX_TABLES: [&str; 3] = ["chunks", "sources", "index_meta"];

/// SQLite-backed persistence for statute chunks and their vectors.
pub struct EmbeddingStorage {
    conn: Mutex<Connection>,
    path: PathBuf,
}

impl EmbeddingStorage {
    /// Opens, read-only, an index that an earlier ingestion run produced.
    /// The file is never written; a database without the index tables is rejected.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let path = dir.as_ref().join(INDEX_FILE);
        if !path.is_file() {
            return Err(ConfigError::MissingIndex(path.display().to_string()).into());
        }
        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        let found = Self::count_index_tables(&conn)
            .map_err(|_| ConfigError::NotAnIndex(path.display().to_string()))?;
        if found == 0 {
            return Err(ConfigError::MissingIndex(path.display().to_string()).into());
        }
        if found != INDEX_TABLES.len() {
            return Err(ConfigError::NotAnIndex(path.display().to_string()).into());
        }
        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Opens or creates the index under `dir`.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        std::fs::create_dir_all(dir.as_ref())?;
        Self::connect(dir.as_ref().join(INDEX_FILE))
    }

    fn connect(path: PathBuf) -> Result<Self> {
        let conn = Connection::open(&path)?;
        Self::setup_db(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn count_index_tables(conn: &Connection) -> SqlResult<usize> {
        let mut stmt = conn.prepare(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN (?1, ?2, ?3)",
        )?;
        let count: i64 = stmt.query_row(
            params![INDEX_TABLES[0], INDEX_TABLES[1], INDEX_TABLES[2]],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn setup_db(conn: &Connection) -> SqlResult<()> {
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA temp_store=MEMORY;
            CREATE TABLE IF NOT EXISTS chunks (
                id TEXT PRIMARY KEY,
                vector BLOB NOT NULL,
                text TEXT NOT NULL,
                source TEXT NOT NULL,
                start_offset INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source);
            CREATE TABLE IF NOT EXISTS sources (
                path TEXT PRIMARY KEY,
                hash TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS index_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
        ",
        )
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("index connection lock poisoned"))
    }

    pub fn insert_chunks(&self, chunks: &[IndexedChunk]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO chunks (id, vector, text, source, start_offset) VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for chunk in chunks {
                let vector_bytes = serde_json::to_vec(&chunk.vector)?;
                stmt.execute(params![
                    chunk.id,
                    vector_bytes,
                    chunk.text,
                    chunk.source,
                    chunk.offset as i64
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// All chunks in insertion order.
    pub fn get_all_chunks(&self) -> Result<Vec<IndexedChunk>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT id, vector, text, source, start_offset FROM chunks ORDER BY rowid")?;
        let mut rows = stmt.query([])?;
        let mut chunks = Vec::new();
        while let Some(row) = rows.next()? {
            let vector_bytes: Vec<u8> = row.get(1)?;
            let offset: i64 = row.get(4)?;
            chunks.push(IndexedChunk {
                id: row.get(0)?,
                vector: serde_json::from_slice(&vector_bytes)?,
                text: row.get(2)?,
                source: row.get(3)?,
                offset: usize::try_from(offset).unwrap_or_default(),
            });
        }
        Ok(chunks)
    }

    pub fn chunk_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn get_source_hash(&self, path: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        let hash = conn
            .query_row(
                "SELECT hash FROM sources WHERE path = ?1",
                [path],
                |row| row.get(0),
            )
            .optional()?;
        Ok(hash)
    }

    pub fn upsert_source_hash(&self, path: &str, hash: &str) -> Result<()> {
        self.lock()?.execute(
            "INSERT OR REPLACE INTO sources (path, hash) VALUES (?1, ?2)",
            params![path, hash],
        )?;
        Ok(())
    }

    pub fn list_sources(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT path FROM sources ORDER BY path")?;
        let sources = stmt
            .query_map([], |row| row.get(0))?
            .collect::<SqlResult<Vec<String>>>()?;
        Ok(sources)
    }

    /// Drops a source's chunks and its recorded hash.
    pub fn delete_source(&self, path: &str) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM chunks WHERE source = ?1", params![path])?;
        tx.execute("DELETE FROM sources WHERE path = ?1", params![path])?;
        tx.commit()?;
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        self.lock()?
            .execute_batch("DELETE FROM chunks; DELETE FROM sources; DELETE FROM index_meta;")?;
        Ok(())
    }

    pub fn embedding_model(&self) -> Result<Option<String>> {
        let conn = self.lock()?;
        let model = conn
            .query_row(
                "SELECT value FROM index_meta WHERE key = ?1",
                [EMBEDDING_MODEL_KEY],
                |row| row.get(0),
            )
            .optional()?;
        Ok(model)
    }

    pub fn set_embedding_model(&self, model: &str) -> Result<()> {
        self.lock()?.execute(
            "INSERT OR REPLACE INTO index_meta (key, value) VALUES (?1, ?2)",
            params![EMBEDDING_MODEL_KEY, model],
        )?;
        Ok(())
    }
}
