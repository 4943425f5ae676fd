use std::collections::HashMap;
use std::sync::Arc;

use riff_types::LibraryTrack;
use tokio::sync::RwLock;

use crate::{LibraryError, TrackStore};

/// In-memory track library; contents are lost when the last clone is dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryLibrary {
    inner: Arc<RwLock<HashMap<String, LibraryTrack>>>,
}

impl MemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

impl TrackStore for MemoryLibrary {
    async fn save_track(&self, track: LibraryTrack) -> Result<(), LibraryError> {
        self.inner.write().await.insert(track.id.clone(), track);
        Ok(())
    }

    async fn get_all_tracks(&self) -> Result<Vec<LibraryTrack>, LibraryError> {
        let mut tracks: Vec<LibraryTrack> = self.inner.read().await.values().cloned().collect();
        tracks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tracks)
    }
}
