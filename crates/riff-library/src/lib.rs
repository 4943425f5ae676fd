//! Local library of generated tracks.
//!
//! [`TrackStore`] defines the persistence contract: insert-or-overwrite by id
//! and a full listing, newest first.  Two implementations ship with the
//! crate: [`SqliteLibrary`] for on-disk storage and [`MemoryLibrary`] for
//! tests and throwaway sessions.
//!
//! Trait methods return `impl Future` (stable since Rust 1.75), so no extra
//! `async-trait` crate is required.

pub mod error;
pub mod memory;
pub mod sqlite;

use std::future::Future;

use riff_types::LibraryTrack;

pub use error::LibraryError;
pub use memory::MemoryLibrary;
pub use sqlite::SqliteLibrary;

/// Persistence for [`LibraryTrack`] records.
pub trait TrackStore: Send + Sync + 'static {
    /// Insert `track`, replacing any record with the same id.
    fn save_track(
        &self,
        track: LibraryTrack,
    ) -> impl Future<Output = Result<(), LibraryError>> + Send;

    /// Every stored track ordered by `created_at`, newest first.
    fn get_all_tracks(&self) -> impl Future<Output = Result<Vec<LibraryTrack>, LibraryError>> + Send;
}
