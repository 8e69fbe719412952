use crate::config::Config;
use anyhow::Context;
use domain::errors::UpstreamError;
use domain::ports::{EmbeddingProvider, LanguageModel};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::types::Result;
use std::sync::Arc;

#[derive(Serialize, Deserialize, Debug, Clone)]
struct Part {
    text: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn text(text: &str, role: Option<&str>) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest {
    model: String,
    content: Content,
    task_type: &'static str,
}

#[derive(Serialize, Debug)]
struct BatchEmbedRequest {
    requests: Vec<EmbedContentRequest>,
}

#[derive(Deserialize, Debug)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[derive(Deserialize, Debug)]
struct EmbedContentResponse {
    embedding: EmbeddingValues,
}

#[derive(Deserialize, Debug)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    fn into_text(self) -> std::result::Result<String, UpstreamError> {
        let block_reason = self.prompt_feedback.and_then(|f| f.block_reason);
        let Some(candidate) = self.candidates.into_iter().next() else {
            return Err(UpstreamError::Malformed(match block_reason {
                Some(reason) => format!("prompt blocked: {reason}"),
                None => "response has no candidates".to_string(),
            }));
        };
        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();
        if text.is_empty() {
            return Err(UpstreamError::Malformed(format!(
                "candidate has no text (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }
        Ok(text)
    }
}

/// Gemini REST client used both for embeddings and for answers.
#[derive(Clone)]
pub struct GeminiClient {
    client: Arc<Client>,
    base_url: String,
    api_key: String,
    chat_model: String,
    embedding_model: String,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .context("failed to build Gemini HTTP client")?;
        Ok(Self {
            client: Arc::new(client),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            chat_model: model_path(&config.chat_model),
            embedding_model: model_path(&config.embedding_model),
        })
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/v1beta/{}:{}", self.base_url, model, method)
    }

    async fn post<B, R>(&self, url: &str, body: &B) -> std::result::Result<R, UpstreamError>
    where
        B: Serialize + ?Sized,
        R: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        serde_json::from_str(&text).map_err(|e| UpstreamError::Malformed(e.to_string()))
    }

    fn embed_request(&self, text: &str, task_type: &'static str) -> EmbedContentRequest {
        EmbedContentRequest {
            model: self.embedding_model.clone(),
            content: Content::text(text, None),
            task_type,
        }
    }

    pub async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>> {
        let url = self.endpoint(&self.embedding_model, "embedContent");
        let request = self.embed_request(text, "RETRIEVAL_QUERY");
        let response: EmbedContentResponse = self
            .post(&url, &request)
            .await
            .context("Gemini embedContent call failed")?;
        Ok(response.embedding.values)
    }

    pub async fn generate_document_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let url = self.endpoint(&self.embedding_model, "batchEmbedContents");
        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|t| self.embed_request(t, "RETRIEVAL_DOCUMENT"))
                .collect(),
        };
        let response: BatchEmbedResponse = self
            .post(&url, &request)
            .await
            .context("Gemini batchEmbedContents call failed")?;
        if response.embeddings.len() != texts.len() {
            return Err(UpstreamError::Malformed(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                response.embeddings.len()
            ))
            .into());
        }
        Ok(response.embeddings.into_iter().map(|e| e.values).collect())
    }

    pub async fn generate_response(&self, prompt: &str, temperature: f32) -> Result<String> {
        let url = self.endpoint(&self.chat_model, "generateContent");
        let request = GenerateContentRequest {
            contents: vec![Content::text(prompt, Some("user"))],
            generation_config: GenerationConfig { temperature },
        };
        let response: GenerateContentResponse = self
            .post(&url, &request)
            .await
            .context("Gemini generateContent call failed")?;
        Ok(response.into_text()?)
    }
}

impl EmbeddingProvider for GeminiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.generate_embedding(text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.generate_document_embeddings(texts).await
    }
}

impl LanguageModel for GeminiClient {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        self.generate_response(prompt, temperature).await
    }
}

/// Accepts both `gemini-pro-latest` and `models/gemini-pro-latest`.
fn model_path(model: &str) -> String {
    let model = model.trim();
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}
