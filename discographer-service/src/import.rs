//! Metadata acquisition seams and file import.
//!
//! Tag extraction is pluggable: a primary [`MetadataSource`] reads tags
//! straight from the file, and an optional [`PlayerMetadata`] probe asks
//! the playback engine instead when the primary reader fails (some
//! containers carry metadata only the decoder can see).

use crate::DiscographerSystem;
use async_trait::async_trait;
use discographer_library::{EntryId, LibraryError, MediaEntry, Result};
use tracing::debug;

/// Reads a [`MediaEntry`] worth of metadata from a file path.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn read_metadata(&self, path: &str) -> Result<MediaEntry>;
}

/// Probes a path through the playback engine as a metadata fallback.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlayerMetadata: Send + Sync {
    async fn probe_metadata(&self, path: &str) -> Result<MediaEntry>;
}

impl DiscographerSystem {
    /// Import one file: read its metadata, falling back to the player
    /// probe when one is supplied, and add the result to the library.
    /// Returns the stored entry's id.
    pub async fn import_path(
        &self,
        path: &str,
        source: &dyn MetadataSource,
        player: Option<&dyn PlayerMetadata>,
        update_if_exists: bool,
    ) -> Result<EntryId> {
        let entry = match source.read_metadata(path).await {
            Ok(entry) => entry,
            Err(error) => match player {
                Some(player) => {
                    debug!(path, %error, "tag read failed, probing via player");
                    player.probe_metadata(path).await?
                }
                None => return Err(error),
            },
        };

        let ids = self.library().add_media(vec![entry], update_if_exists).await?;
        ids.into_iter()
            .next()
            .ok_or_else(|| LibraryError::not_found("MediaEntry", 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use discographer_library::db::create_test_pool;
    use discographer_library::{Library, MetaField, SqliteStore};
    use std::sync::Arc;

    async fn system() -> DiscographerSystem {
        let store = SqliteStore::new(create_test_pool().await.unwrap());
        let library = Library::open(Box::new(store)).await.unwrap();
        DiscographerSystem::new(Arc::new(library))
    }

    fn tagged(path: &str, title: &str) -> MediaEntry {
        let mut e = MediaEntry::new(path);
        e.length_ms = 180_000;
        e.set_field(MetaField::Title, title);
        e
    }

    #[tokio::test]
    async fn import_uses_the_primary_source() {
        let system = system().await;
        let mut source = MockMetadataSource::new();
        source
            .expect_read_metadata()
            .returning(|path| Ok(tagged(path, "Friction")));

        let id = system
            .import_path("/m/friction.flac", &source, None, false)
            .await
            .unwrap();
        let entry = system.library().entry(id).await.unwrap();
        assert_eq!(entry.field(MetaField::Title), "Friction");
    }

    #[tokio::test]
    async fn import_falls_back_to_the_player_probe() {
        let system = system().await;
        let mut source = MockMetadataSource::new();
        source
            .expect_read_metadata()
            .returning(|_| Err(LibraryError::invalid_input("tags", "unreadable header")));
        let mut player = MockPlayerMetadata::new();
        player
            .expect_probe_metadata()
            .returning(|path| Ok(tagged(path, "Decoded Title")));

        let id = system
            .import_path("/m/odd.container", &source, Some(&player), false)
            .await
            .unwrap();
        let entry = system.library().entry(id).await.unwrap();
        assert_eq!(entry.field(MetaField::Title), "Decoded Title");
    }

    #[tokio::test]
    async fn import_without_a_probe_surfaces_the_read_error() {
        let system = system().await;
        let mut source = MockMetadataSource::new();
        source
            .expect_read_metadata()
            .returning(|_| Err(LibraryError::invalid_input("tags", "unreadable header")));

        let result = system.import_path("/m/odd.container", &source, None, false).await;
        assert!(matches!(result, Err(LibraryError::InvalidInput { .. })));
        assert_eq!(system.library().entry_count().await, 0);
    }

    #[tokio::test]
    async fn reimport_without_update_flag_keeps_existing_tags() {
        let system = system().await;
        let mut source = MockMetadataSource::new();
        source
            .expect_read_metadata()
            .times(1)
            .returning(|path| Ok(tagged(path, "First Pass")));

        let id = system
            .import_path("/m/track.mp3", &source, None, false)
            .await
            .unwrap();

        let mut retag = MockMetadataSource::new();
        retag
            .expect_read_metadata()
            .times(1)
            .returning(|path| Ok(tagged(path, "Second Pass")));
        let again = system
            .import_path("/m/track.mp3", &retag, None, false)
            .await
            .unwrap();

        assert_eq!(again, id);
        let entry = system.library().entry(id).await.unwrap();
        assert_eq!(entry.field(MetaField::Title), "First Pass");
    }
}
