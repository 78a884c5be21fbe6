//! Photo ingestion pipeline: upload, describe, persist.
//!
//! Storage and persistence are load-bearing collaborators behind trait
//! seams — their failures abort the operation. The AI description is
//! advisory: whatever the describer returns (text or nothing) is saved
//! as-is, and step order guarantees the record is always written when
//! storage succeeded.

use crate::ai::{Describer, ImagePayload};
use crate::error::IngestError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Object storage collaborator. Returns a public reference URL.
#[async_trait]
pub trait PhotoStore: Send + Sync {
    async fn upload(&self, image: &ImagePayload, user_id: &str) -> Result<String, IngestError>;
}

/// Metadata persistence collaborator.
#[async_trait]
pub trait PhotoRepository: Send + Sync {
    async fn save(&self, photo: NewPhoto) -> Result<PhotoRecord, IngestError>;
}

/// Caller-supplied photo metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoMetadata {
    pub title: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// A photo ready to persist. `description` stays optional by design.
#[derive(Debug, Clone, Serialize)]
pub struct NewPhoto {
    pub title: String,
    pub latitude: f64,
    pub longitude: f64,
    pub image_url: String,
    pub user_id: String,
    pub description: Option<String>,
}

/// A persisted photo record as returned by the repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoRecord {
    pub id: String,
    pub title: String,
    pub latitude: f64,
    pub longitude: f64,
    pub image_url: String,
    pub user_id: String,
    pub description: Option<String>,
    /// Unix epoch seconds, stamped by the repository
    pub created_at: u64,
}

/// Sequences one photo's ingestion: upload → describe → persist.
pub struct Ingestor {
    store: Arc<dyn PhotoStore>,
    repo: Arc<dyn PhotoRepository>,
    describer: Describer,
}

impl Ingestor {
    pub fn new(
        store: Arc<dyn PhotoStore>,
        repo: Arc<dyn PhotoRepository>,
        describer: Describer,
    ) -> Self {
        Self {
            store,
            repo,
            describer,
        }
    }

    /// Ingest one photo.
    ///
    /// Storage failure aborts the operation — no image reference, no
    /// record. The description step can never fail the operation; a
    /// missing description is persisted as `None`.
    pub async fn ingest(
        &self,
        image: &ImagePayload,
        metadata: PhotoMetadata,
        user_id: &str,
    ) -> Result<PhotoRecord, IngestError> {
        let image_url = self.store.upload(image, user_id).await?;
        tracing::debug!(%image_url, "Photo uploaded to storage");

        let description = self.describer.describe(image).await;
        if description.is_none() {
            tracing::warn!("Saving photo without an AI description");
        }

        self.repo
            .save(NewPhoto {
                title: metadata.title,
                latitude: metadata.latitude,
                longitude: metadata.longitude,
                image_url,
                user_id: user_id.to_string(),
                description,
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{ClientManager, RetryPolicy, VisionProvider};
    use crate::error::AiError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    struct FakeStore {
        fail: bool,
        uploads: AtomicU32,
    }

    #[async_trait]
    impl PhotoStore for FakeStore {
        async fn upload(
            &self,
            _image: &ImagePayload,
            user_id: &str,
        ) -> Result<String, IngestError> {
            self.uploads.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(IngestError::Storage("bucket unreachable".to_string()));
            }
            Ok(format!("https://storage.example/photos/{user_id}/abc123.jpg"))
        }
    }

    struct FakeRepo {
        saved: Mutex<Vec<NewPhoto>>,
    }

    #[async_trait]
    impl PhotoRepository for FakeRepo {
        async fn save(&self, photo: NewPhoto) -> Result<PhotoRecord, IngestError> {
            let record = PhotoRecord {
                id: "photo-1".to_string(),
                title: photo.title.clone(),
                latitude: photo.latitude,
                longitude: photo.longitude,
                image_url: photo.image_url.clone(),
                user_id: photo.user_id.clone(),
                description: photo.description.clone(),
                created_at: 1_700_000_000,
            };
            self.saved.lock().unwrap().push(photo);
            Ok(record)
        }
    }

    struct FixedProvider {
        response: Result<String, (Option<u16>, String)>,
    }

    #[async_trait]
    impl VisionProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn generate(&self, _image: &ImagePayload) -> Result<String, AiError> {
            match &self.response {
                Ok(text) => Ok(text.clone()),
                Err((status_code, message)) => Err(AiError::Provider {
                    message: message.clone(),
                    status_code: *status_code,
                }),
            }
        }

        async fn generate_stream(
            &self,
            _image: &ImagePayload,
        ) -> Result<crate::ai::ChunkStream, AiError> {
            Ok(Box::pin(futures_util::stream::empty()))
        }
    }

    fn describer_with(provider: FixedProvider) -> Describer {
        let provider = Arc::new(provider);
        let clients = Arc::new(ClientManager::with_factory(Box::new(move || {
            Ok(provider.clone() as Arc<dyn VisionProvider>)
        })));
        Describer::new(clients, RetryPolicy::default(), Duration::from_secs(60))
    }

    fn metadata() -> PhotoMetadata {
        PhotoMetadata {
            title: "Culvert outlet".to_string(),
            latitude: 52.52,
            longitude: 13.405,
        }
    }

    fn image() -> ImagePayload {
        ImagePayload::new(vec![0xFF, 0xD8], "image/jpeg")
    }

    #[tokio::test(start_paused = true)]
    async fn test_ingest_with_description() {
        let store = Arc::new(FakeStore {
            fail: false,
            uploads: AtomicU32::new(0),
        });
        let repo = Arc::new(FakeRepo {
            saved: Mutex::new(Vec::new()),
        });
        let describer = describer_with(FixedProvider {
            response: Ok("A corroded culvert outlet.".to_string()),
        });
        let ingestor = Ingestor::new(store, repo.clone(), describer);

        let record = ingestor.ingest(&image(), metadata(), "user-7").await.unwrap();

        assert_eq!(record.title, "Culvert outlet");
        assert!(record.image_url.contains("user-7"));
        assert_eq!(record.description.as_deref(), Some("A corroded culvert outlet."));
        assert_eq!(repo.saved.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ai_exhaustion_still_persists_record() {
        let store = Arc::new(FakeStore {
            fail: false,
            uploads: AtomicU32::new(0),
        });
        let repo = Arc::new(FakeRepo {
            saved: Mutex::new(Vec::new()),
        });
        // Always overloaded: the describer exhausts retries and yields None
        let describer = describer_with(FixedProvider {
            response: Err((Some(503), "The model is overloaded".to_string())),
        });
        let ingestor = Ingestor::new(store, repo.clone(), describer);

        let record = ingestor.ingest(&image(), metadata(), "user-7").await.unwrap();

        assert!(record.image_url.starts_with("https://"));
        assert_eq!(record.description, None);
        let saved = repo.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].description, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_storage_failure_aborts_without_persisting() {
        let store = Arc::new(FakeStore {
            fail: true,
            uploads: AtomicU32::new(0),
        });
        let repo = Arc::new(FakeRepo {
            saved: Mutex::new(Vec::new()),
        });
        let describer = describer_with(FixedProvider {
            response: Ok("never used".to_string()),
        });
        let ingestor = Ingestor::new(store.clone(), repo.clone(), describer);

        let result = ingestor.ingest(&image(), metadata(), "user-7").await;

        assert!(matches!(result, Err(IngestError::Storage(_))));
        assert_eq!(store.uploads.load(Ordering::SeqCst), 1);
        assert!(repo.saved.lock().unwrap().is_empty());
    }
}
