//! Streaming description path.
//!
//! A producer task drains the provider's chunk stream into a bounded
//! channel; completion and error are terminal values pushed onto the same
//! channel, so the consumer sees a single linear protocol: zero or more
//! fragments, then exactly one `Completed` or `Errored`. There is no retry
//! on this path.

use super::client::ClientManager;
use super::provider::ImagePayload;
use crate::config::Config;
use futures_util::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;

/// One consumer-facing event of a description stream.
///
/// This is the contract the push-protocol bridge maps onto its wire
/// encoding: a data event per fragment, a payload-less completion, and an
/// error terminal carrying a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// One non-empty text fragment, in provider emission order
    Fragment(String),
    /// The provider stream ended normally; no further events follow
    Completed,
    /// The provider failed; no further events follow
    Errored(String),
}

/// Single-consumer, forward-only sequence of `StreamEvent`s.
///
/// Reconsuming requires a fresh `StreamAdapter::stream` call. Dropping the
/// stream before a terminal event stops the producer and abandons the
/// provider connection.
pub struct DescriptionStream {
    rx: mpsc::Receiver<StreamEvent>,
}

impl DescriptionStream {
    /// Receive the next event, or `None` once a terminal event has been
    /// consumed and the producer has gone away.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        self.rx.recv().await
    }
}

impl futures_util::Stream for DescriptionStream {
    type Item = StreamEvent;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<StreamEvent>> {
        self.rx.poll_recv(cx)
    }
}

/// Issues streaming generation requests and republishes provider chunks as
/// an ordered fragment sequence.
pub struct StreamAdapter {
    clients: Arc<ClientManager>,
    buffer_size: usize,
}

impl StreamAdapter {
    pub fn new(clients: Arc<ClientManager>, buffer_size: usize) -> Self {
        Self {
            clients,
            buffer_size,
        }
    }

    /// Adapter sharing the given client manager, buffer size from config.
    pub fn from_config(clients: Arc<ClientManager>, config: &Config) -> Self {
        Self::new(clients, config.stream.buffer_size)
    }

    /// Start one streaming description request.
    ///
    /// Failures before the first chunk (missing credential, rejected
    /// request) surface as a single `Errored` event on the returned stream,
    /// keeping the consumer protocol uniform.
    pub async fn stream(&self, image: &ImagePayload) -> DescriptionStream {
        tracing::debug!(mime_type = %image.mime_type, "Starting streaming description");

        let (tx, rx) = mpsc::channel(self.buffer_size);

        let upstream = match self.clients.get().await {
            Ok(client) => client.generate_stream(image).await,
            Err(e) => Err(e),
        };

        tokio::spawn(async move {
            let mut chunks = match upstream {
                Ok(chunks) => chunks,
                Err(e) => {
                    tracing::error!(error = %e, "Streaming request failed");
                    let _ = tx.send(StreamEvent::Errored(e.to_string())).await;
                    return;
                }
            };

            while let Some(item) = chunks.next().await {
                match item {
                    Ok(text) => {
                        if text.is_empty() {
                            continue;
                        }
                        if tx.send(StreamEvent::Fragment(text)).await.is_err() {
                            // Consumer detached; dropping the chunk stream
                            // abandons the provider connection.
                            tracing::debug!("Stream consumer detached before completion");
                            return;
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Provider stream failed mid-flight");
                        let _ = tx.send(StreamEvent::Errored(e.to_string())).await;
                        return;
                    }
                }
            }

            let _ = tx.send(StreamEvent::Completed).await;
        });

        DescriptionStream { rx }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::{ChunkStream, VisionProvider};
    use crate::error::AiError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Hands out a pre-built chunk stream exactly once.
    struct StreamOnceProvider {
        stream: Mutex<Option<ChunkStream>>,
    }

    impl StreamOnceProvider {
        fn new(stream: ChunkStream) -> Self {
            Self {
                stream: Mutex::new(Some(stream)),
            }
        }

        fn from_chunks(chunks: Vec<Result<String, AiError>>) -> Self {
            Self::new(Box::pin(futures_util::stream::iter(chunks)))
        }
    }

    #[async_trait]
    impl VisionProvider for StreamOnceProvider {
        fn name(&self) -> &str {
            "mock"
        }

        async fn generate(&self, _image: &ImagePayload) -> Result<String, AiError> {
            unreachable!("stream tests never call the sync path")
        }

        async fn generate_stream(&self, _image: &ImagePayload) -> Result<ChunkStream, AiError> {
            Ok(self
                .stream
                .lock()
                .unwrap()
                .take()
                .expect("stream already consumed"))
        }
    }

    fn adapter_for(provider: StreamOnceProvider) -> StreamAdapter {
        let provider = Arc::new(provider);
        let clients = Arc::new(ClientManager::with_factory(Box::new(move || {
            Ok(provider.clone() as Arc<dyn VisionProvider>)
        })));
        StreamAdapter::new(clients, 8)
    }

    fn image() -> ImagePayload {
        ImagePayload::new(vec![0xFF, 0xD8], "image/jpeg")
    }

    async fn collect(mut stream: DescriptionStream) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        while let Some(event) = stream.next_event().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_fragments_in_order_then_completed() {
        let provider = StreamOnceProvider::from_chunks(vec![
            Ok("A".to_string()),
            Ok("B".to_string()),
            Ok("C".to_string()),
        ]);
        let adapter = adapter_for(provider);

        let events = collect(adapter.stream(&image()).await).await;

        assert_eq!(
            events,
            vec![
                StreamEvent::Fragment("A".to_string()),
                StreamEvent::Fragment("B".to_string()),
                StreamEvent::Fragment("C".to_string()),
                StreamEvent::Completed,
            ]
        );
    }

    #[tokio::test]
    async fn test_mid_stream_error_terminates_without_completed() {
        let provider = StreamOnceProvider::from_chunks(vec![
            Ok("A".to_string()),
            Err(AiError::Provider {
                message: "connection reset".to_string(),
                status_code: None,
            }),
            Ok("never delivered".to_string()),
        ]);
        let adapter = adapter_for(provider);

        let events = collect(adapter.stream(&image()).await).await;

        assert_eq!(events.len(), 2);
        assert_eq!(events[0], StreamEvent::Fragment("A".to_string()));
        assert!(matches!(events[1], StreamEvent::Errored(_)));
    }

    #[tokio::test]
    async fn test_empty_chunks_are_filtered() {
        let provider = StreamOnceProvider::from_chunks(vec![
            Ok(String::new()),
            Ok("only".to_string()),
            Ok(String::new()),
        ]);
        let adapter = adapter_for(provider);

        let events = collect(adapter.stream(&image()).await).await;

        assert_eq!(
            events,
            vec![
                StreamEvent::Fragment("only".to_string()),
                StreamEvent::Completed,
            ]
        );
    }

    #[tokio::test]
    async fn test_textless_stream_completes_with_zero_fragments() {
        let provider = StreamOnceProvider::from_chunks(vec![]);
        let adapter = adapter_for(provider);

        let events = collect(adapter.stream(&image()).await).await;

        assert_eq!(events, vec![StreamEvent::Completed]);
    }

    #[tokio::test]
    async fn test_request_failure_surfaces_as_single_errored_event() {
        let clients = Arc::new(ClientManager::with_factory(Box::new(|| {
            Err(AiError::Config("API key not set".to_string()))
        })));
        let adapter = StreamAdapter::new(clients, 8);

        let events = collect(adapter.stream(&image()).await).await;

        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], StreamEvent::Errored(_)));
    }

    #[tokio::test]
    async fn test_consumer_drop_stops_producer() {
        let (chunk_tx, chunk_rx) = mpsc::channel::<Result<String, AiError>>(1);
        let upstream: ChunkStream = Box::pin(futures_util::stream::unfold(
            chunk_rx,
            |mut rx| async move { rx.recv().await.map(|item| (item, rx)) },
        ));
        let adapter = adapter_for(StreamOnceProvider::new(upstream));

        let mut stream = adapter.stream(&image()).await;
        chunk_tx.send(Ok("A".to_string())).await.unwrap();
        assert_eq!(
            stream.next_event().await,
            Some(StreamEvent::Fragment("A".to_string()))
        );

        // Consumer walks away mid-stream
        drop(stream);

        // The producer's next forward fails, so it drops the upstream
        // receiver and our sender observes the closed channel.
        chunk_tx.send(Ok("B".to_string())).await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), chunk_tx.closed())
            .await
            .expect("producer kept the upstream alive after consumer detached");
    }
}
