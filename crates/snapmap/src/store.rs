//! Local development implementations of the ingestion collaborators.
//!
//! Production deployments put an object store and a relational database
//! behind the `PhotoStore`/`PhotoRepository` seams; for development the CLI
//! uses a content-addressed media directory and a JSONL index instead.

use async_trait::async_trait;
use snapmap_core::{ImagePayload, IngestError, NewPhoto, PhotoRecord, PhotoRepository, PhotoStore};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::io::AsyncWriteExt;

/// Filesystem-backed photo store.
///
/// Files are named by a truncated BLAKE3 content hash, so re-ingesting the
/// same bytes overwrites the same file instead of accumulating copies.
pub struct FsPhotoStore {
    media_dir: PathBuf,
}

impl FsPhotoStore {
    pub fn new(media_dir: PathBuf) -> Self {
        Self { media_dir }
    }
}

fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "bin",
    }
}

#[async_trait]
impl PhotoStore for FsPhotoStore {
    async fn upload(&self, image: &ImagePayload, user_id: &str) -> Result<String, IngestError> {
        let hash = blake3::hash(&image.bytes).to_hex();
        let file_name = format!("{}.{}", &hash.as_str()[..16], extension_for(&image.mime_type));

        let dir = self.media_dir.join(user_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| IngestError::Storage(format!("Failed to create media dir: {e}")))?;

        let path = dir.join(file_name);
        tokio::fs::write(&path, &image.bytes)
            .await
            .map_err(|e| IngestError::Storage(format!("Failed to write media file: {e}")))?;

        Ok(format!("file://{}", path.display()))
    }
}

/// Append-only JSONL photo index, one record per line.
pub struct JsonlPhotoRepository {
    index_path: PathBuf,
}

impl JsonlPhotoRepository {
    pub fn new(index_path: PathBuf) -> Self {
        Self { index_path }
    }
}

#[async_trait]
impl PhotoRepository for JsonlPhotoRepository {
    async fn save(&self, photo: NewPhoto) -> Result<PhotoRecord, IngestError> {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let id = blake3::hash(photo.image_url.as_bytes()).to_hex().as_str()[..16].to_string();

        let record = PhotoRecord {
            id,
            title: photo.title,
            latitude: photo.latitude,
            longitude: photo.longitude,
            image_url: photo.image_url,
            user_id: photo.user_id,
            description: photo.description,
            created_at,
        };

        let mut line = serde_json::to_string(&record)
            .map_err(|e| IngestError::Persistence(format!("Failed to serialize record: {e}")))?;
        line.push('\n');

        if let Some(parent) = self.index_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| IngestError::Persistence(format!("Failed to create index dir: {e}")))?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.index_path)
            .await
            .map_err(|e| IngestError::Persistence(format!("Failed to open index: {e}")))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| IngestError::Persistence(format!("Failed to append record: {e}")))?;

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> ImagePayload {
        ImagePayload::new(vec![0xFF, 0xD8, 0xFF, 0xE0], "image/jpeg")
    }

    fn photo(url: &str) -> NewPhoto {
        NewPhoto {
            title: "Retaining wall".to_string(),
            latitude: 47.37,
            longitude: 8.54,
            image_url: url.to_string(),
            user_id: "user-1".to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_fs_store_writes_content_addressed_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsPhotoStore::new(dir.path().to_path_buf());

        let url = store.upload(&image(), "user-1").await.unwrap();

        assert!(url.starts_with("file://"));
        assert!(url.contains("user-1"));
        assert!(url.ends_with(".jpg"));
        let path = PathBuf::from(url.trim_start_matches("file://"));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), image().bytes);
    }

    #[tokio::test]
    async fn test_fs_store_same_bytes_same_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsPhotoStore::new(dir.path().to_path_buf());

        let first = store.upload(&image(), "user-1").await.unwrap();
        let second = store.upload(&image(), "user-1").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_jsonl_repo_appends_records() {
        let dir = tempfile::tempdir().unwrap();
        let index = dir.path().join("photos.jsonl");
        let repo = JsonlPhotoRepository::new(index.clone());

        repo.save(photo("file:///a.jpg")).await.unwrap();
        repo.save(photo("file:///b.jpg")).await.unwrap();

        let content = tokio::fs::read_to_string(&index).await.unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: PhotoRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.title, "Retaining wall");
        assert_eq!(first.description, None);
        assert_eq!(first.image_url, "file:///a.jpg");
    }

    #[tokio::test]
    async fn test_jsonl_repo_id_derived_from_url() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonlPhotoRepository::new(dir.path().join("photos.jsonl"));

        let a = repo.save(photo("file:///a.jpg")).await.unwrap();
        let b = repo.save(photo("file:///b.jpg")).await.unwrap();
        let a_again = repo.save(photo("file:///a.jpg")).await.unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(a.id, a_again.id);
    }
}
