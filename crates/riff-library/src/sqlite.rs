//! SQLite implementation of [`TrackStore`].
//!
//! `sqlx::migrate!("./migrations")` resolves the path **at compile time**
//! relative to `CARGO_MANIFEST_DIR`, so the schema is embedded into the
//! binary.  The database file itself is chosen at runtime by the URL given to
//! [`SqliteLibrary::connect`].
//!
//! The runtime-checked `sqlx::query` form is used so that no `DATABASE_URL`
//! is needed at compile time.

use std::str::FromStr;

use riff_types::LibraryTrack;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::debug;

use crate::{LibraryError, TrackStore};

type TrackRow = (String, String, String, String, f64, i64, Vec<u8>);

/// SQLite-backed track library.
#[derive(Clone, Debug)]
pub struct SqliteLibrary {
    pool: SqlitePool,
}

impl SqliteLibrary {
    /// Open (or create) the database at `url` and run pending migrations.
    ///
    /// `url` is a sqlx SQLite URL such as `"sqlite://riff_library.db"`.
    pub async fn connect(url: &str) -> Result<Self, LibraryError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        Self::migrate(pool).await
    }

    /// A private in-memory database.
    ///
    /// Every SQLite `:memory:` connection is its own database, so the pool is
    /// pinned to a single connection that never expires.
    pub async fn in_memory() -> Result<Self, LibraryError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::migrate(pool).await
    }

    async fn migrate(pool: SqlitePool) -> Result<Self, LibraryError> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }
}

impl TrackStore for SqliteLibrary {
    async fn save_track(&self, track: LibraryTrack) -> Result<(), LibraryError> {
        debug!(id = %track.id, title = %track.title, bytes = track.audio.len(), "saving track");
        sqlx::query(
            "INSERT OR REPLACE INTO tracks (id, title, caption, lyrics, duration, created_at, audio) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&track.id)
        .bind(&track.title)
        .bind(&track.caption)
        .bind(&track.lyrics)
        .bind(track.duration)
        .bind(track.created_at)
        .bind(&track.audio)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_all_tracks(&self) -> Result<Vec<LibraryTrack>, LibraryError> {
        let rows: Vec<TrackRow> = sqlx::query_as(
            "SELECT id, title, caption, lyrics, duration, created_at, audio \
             FROM tracks ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, title, caption, lyrics, duration, created_at, audio)| LibraryTrack {
                id,
                title,
                caption,
                lyrics,
                duration,
                created_at,
                audio,
            })
            .collect())
    }
}
