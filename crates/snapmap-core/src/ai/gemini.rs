//! Gemini vision provider using the Generative Language API.
//!
//! Sends image + prompt as inline base64 content parts. The single-shot
//! path calls `generateContent`; the streaming path calls
//! `streamGenerateContent?alt=sse` and republishes each SSE data event's
//! text as one chunk.

use super::provider::{ChunkStream, ImagePayload, VisionProvider, DESCRIPTION_PROMPT};
use crate::error::AiError;
use async_trait::async_trait;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};

/// Gemini provider over the Generative Language REST API.
pub struct GeminiProvider {
    api_key: String,
    model: String,
    endpoint: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(api_key: &str, model: &str, endpoint: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

// --- Request types ---

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

impl GenerateRequest {
    /// One user turn: the inline image followed by the fixed prompt.
    fn for_image(image: &ImagePayload) -> Self {
        Self {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: image.mime_type.clone(),
                            data: image.to_base64(),
                        },
                    },
                    Part::Text {
                        text: DESCRIPTION_PROMPT.to_string(),
                    },
                ],
            }],
        }
    }
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

// --- Response types ---

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Concatenate all candidate text parts. Empty when the response carried
/// no text — the callers distinguish that case, not the provider.
fn extract_text(response: GenerateResponse) -> String {
    response
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .filter_map(|p| p.text)
        .collect::<Vec<_>>()
        .join("")
}

/// Drain complete lines from the byte buffer and parse the SSE data events
/// among them. Incomplete trailing bytes stay buffered for the next read.
fn drain_data_lines(buf: &mut Vec<u8>) -> Vec<Result<String, AiError>> {
    let mut out = Vec::new();
    while let Some(pos) = buf.iter().position(|&b| b == b'\n') {
        let line: Vec<u8> = buf.drain(..=pos).collect();
        match std::str::from_utf8(&line) {
            Ok(line) => {
                if let Some(parsed) = parse_data_line(line) {
                    out.push(parsed);
                }
            }
            Err(e) => out.push(Err(AiError::Provider {
                message: format!("Invalid UTF-8 in stream: {e}"),
                status_code: None,
            })),
        }
    }
    out
}

/// Parse one SSE line. Non-data lines (blank separators, comments, event
/// fields) are skipped.
fn parse_data_line(line: &str) -> Option<Result<String, AiError>> {
    let line = line.trim_end_matches(['\r', '\n']);
    let payload = line.strip_prefix("data:")?.trim();
    if payload.is_empty() {
        return None;
    }

    tracing::trace!(payload = %payload, "Parsing stream event");

    Some(
        serde_json::from_str::<GenerateResponse>(payload)
            .map(extract_text)
            .map_err(|e| AiError::Provider {
                message: format!("Failed to parse stream event: {e}"),
                status_code: None,
            }),
    )
}

#[async_trait]
impl VisionProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, image: &ImagePayload) -> Result<String, AiError> {
        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        let body = GenerateRequest::for_image(image);

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::Provider {
                message: format!("Gemini request failed: {e}"),
                status_code: None,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(AiError::Provider {
                message: format!("Gemini HTTP {status}: {text}"),
                status_code: Some(status.as_u16()),
            });
        }

        let parsed: GenerateResponse = resp.json().await.map_err(|e| AiError::Provider {
            message: format!("Failed to parse Gemini response: {e}"),
            status_code: None,
        })?;

        Ok(extract_text(parsed))
    }

    async fn generate_stream(&self, image: &ImagePayload) -> Result<ChunkStream, AiError> {
        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.endpoint, self.model
        );
        let body = GenerateRequest::for_image(image);

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::Provider {
                message: format!("Gemini stream request failed: {e}"),
                status_code: None,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(AiError::Provider {
                message: format!("Gemini HTTP {status}: {text}"),
                status_code: Some(status.as_u16()),
            });
        }

        let chunks = resp
            .bytes_stream()
            .scan(Vec::new(), |buf, result| {
                let out = match result {
                    Ok(bytes) => {
                        buf.extend_from_slice(&bytes);
                        drain_data_lines(buf)
                    }
                    Err(e) => vec![Err(AiError::Provider {
                        message: format!("Stream read failed: {e}"),
                        status_code: None,
                    })],
                };
                futures_util::future::ready(Some(out))
            })
            .flat_map(futures_util::stream::iter);

        Ok(Box::pin(chunks))
    }
}
