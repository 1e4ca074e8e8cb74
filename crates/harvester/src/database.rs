//! Persistent catalog storage.
//!
//! The catalog is persisted as a single SQLite table with one row per record, holding the record
//! ID, its version and the full entry as JSON. Saving replaces the whole table inside one
//! transaction, so a reader never observes a half-written catalog: either the previous contents
//! or the new ones.
//!
//! # Examples
//!
//! ```no_run
//! use harvester::{database::Database, prelude::*};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Database::open("catalog.db").await?;
//! let catalog = store.load().await;
//! store.save(&catalog).await?;
//! # Ok(())
//! # }
//! ```

use rusqlite::params;
use tokio_rusqlite::Connection;

use super::*;

/// Whole-catalog persistence.
#[async_trait]
pub trait CatalogStore: Send + Sync {
  /// Reads the persisted catalog.
  ///
  /// A missing or unreadable store yields an empty catalog; the failure is logged, not returned.
  async fn load(&self) -> Catalog;

  /// Replaces the persisted catalog with `catalog`, atomically.
  async fn save(&self, catalog: &Catalog) -> Result<()>;
}

/// SQLite-backed [`CatalogStore`].
pub struct Database {
  /// Async SQLite connection handle
  conn: Connection,
}

impl Database {
  /// Opens an existing database or creates a new one at the specified path.
  ///
  /// Parent directories are created as needed and the schema is initialized. A file that is not
  /// a usable database still opens: [`CatalogStore::load`] then yields an empty catalog and
  /// [`CatalogStore::save`] fails, leaving the file untouched.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      tokio::fs::create_dir_all(parent).await?;
    }
    let conn = Connection::open(path).await?;

    let migrated = conn
      .call(|conn| {
        conn.execute_batch(include_str!(concat!(
          env!("CARGO_MANIFEST_DIR"),
          "/migrations/init.sql"
        )))?;
        Ok(())
      })
      .await;
    if let Err(e) = migrated {
      warn!("Could not initialize catalog schema at {path:?}: {e}");
    }

    debug!("Opened catalog database at {path:?}");
    Ok(Self { conn })
  }

  /// Returns the default path for the database file.
  ///
  /// - On Unix: `~/.local/share/harvester/catalog.db`
  /// - On macOS: `~/Library/Application Support/harvester/catalog.db`
  /// - On Windows: `%APPDATA%\harvester\catalog.db`
  /// - Fallback: `./harvester/catalog.db`
  pub fn default_path() -> PathBuf { Config::default_database_path() }

  async fn read_all(&self) -> Result<Catalog> {
    let bodies = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare_cached("SELECT body FROM entries ORDER BY id")?;
        let bodies = stmt
          .query_map([], |row| row.get::<_, String>(0))?
          .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(bodies)
      })
      .await?;

    bodies
      .iter()
      .map(|body| serde_json::from_str::<Entry>(body).map_err(HarvesterError::from))
      .collect()
  }
}

#[async_trait]
impl CatalogStore for Database {
  async fn load(&self) -> Catalog {
    match self.read_all().await {
      Ok(catalog) => {
        debug!("Loaded {} entries", catalog.len());
        catalog
      },
      Err(e) => {
        warn!("Could not read catalog, starting from an empty one: {e}");
        Catalog::new()
      },
    }
  }

  async fn save(&self, catalog: &Catalog) -> Result<()> {
    let rows = catalog
      .entries()
      .map(|entry| -> Result<_> {
        Ok((entry.id.clone(), entry.version, serde_json::to_string(entry)?))
      })
      .collect::<Result<Vec<_>>>()?;
    let count = rows.len();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM entries", [])?;
        {
          let mut stmt =
            tx.prepare_cached("INSERT INTO entries (id, version, body) VALUES (?1, ?2, ?3)")?;
          for (id, version, body) in &rows {
            stmt.execute(params![id, version, body])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    debug!("Saved {count} entries");
    Ok(())
  }
}
