use crate::retriever::IndexRetriever;
use domain::errors::{is_retryable, ConfigError};
use domain::ports::{LanguageModel, Retriever};
use domain::prompt::{assemble_prompt, format_context};
use infrastructure::{
    config::Config, embedding_storage::EmbeddingStorage, gemini_client::GeminiClient,
    search::SearchEngine,
};
use shared::telemetry::Telemetry;
use shared::types::Result;

/// Sampling temperature for every answer.
pub const ANSWER_TEMPERATURE: f32 = 0.3;

/// Returned in place of an answer whenever any upstream call fails.
pub const FALLBACK_ANSWER: &str =
    "I encountered an error trying to find the answer. Please try rephrasing your question.";

#[derive(Debug, Clone, Copy)]
enum Stage {
    Retrieval,
    Generation,
}

impl Stage {
    fn as_str(self) -> &'static str {
        match self {
            Stage::Retrieval => "retrieval",
            Stage::Generation => "generation",
        }
    }
}

struct StageFailure {
    stage: Stage,
    error: anyhow::Error,
}

trait AtStage<T> {
    fn at(self, stage: Stage) -> std::result::Result<T, StageFailure>;
}

impl<T> AtStage<T> for Result<T> {
    fn at(self, stage: Stage) -> std::result::Result<T, StageFailure> {
        self.map_err(|error| StageFailure { stage, error })
    }
}

/// Answers questions about a user's agreement, grounded in retrieved statute text.
///
/// Build once and share: `answer` only reads from the retriever and model.
pub struct RagService<R, M> {
    retriever: R,
    model: M,
}

pub type GeminiRagService = RagService<IndexRetriever<GeminiClient, SearchEngine>, GeminiClient>;

impl GeminiRagService {
    /// Loads configuration from the environment and opens the on-disk index.
    pub fn from_env() -> Result<Self> {
        let config = Config::load()?;
        Self::from_config(&config)
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = GeminiClient::new(config)?;
        let storage = EmbeddingStorage::open(&config.vector_db_dir)?;
        if let Some(indexed_with) = storage.embedding_model()? {
            if indexed_with != client.embedding_model() {
                return Err(ConfigError::InvalidValue {
                    key: "GEMINI_EMBEDDING_MODEL",
                    value: format!(
                        "{} (index at {} was built with {indexed_with})",
                        client.embedding_model(),
                        storage.path().display()
                    ),
                }
                .into());
            }
        }
        let index = SearchEngine::load(&storage)?;
        tracing::info!(
            chat_model = %config.chat_model,
            index = %storage.path().display(),
            "rag service ready"
        );
        Ok(Self::new(IndexRetriever::new(client.clone(), index), client))
    }
}

impl<R: Retriever, M: LanguageModel> RagService<R, M> {
    pub fn new(retriever: R, model: M) -> Self {
        Self { retriever, model }
    }

    /// Never fails: upstream errors are logged and replaced by [`FALLBACK_ANSWER`].
    pub async fn answer(&self, document_text: &str, question: &str) -> String {
        let telemetry = Telemetry::new();
        match self.try_answer(document_text, question).await {
            Ok(answer) => {
                tracing::info!(
                    elapsed_ms = telemetry.elapsed_ms() as u64,
                    answer_chars = answer.len(),
                    "answered question"
                );
                answer
            }
            Err(StageFailure { stage, error }) => {
                tracing::error!(
                    stage = stage.as_str(),
                    retryable = is_retryable(&error),
                    elapsed_ms = telemetry.elapsed_ms() as u64,
                    error = %format!("{error:#}"),
                    "error in rag pipeline"
                );
                FALLBACK_ANSWER.to_string()
            }
        }
    }

    async fn try_answer(
        &self,
        document_text: &str,
        question: &str,
    ) -> std::result::Result<String, StageFailure> {
        // Retrieval is driven by the question alone.
        let chunks = self
            .retriever
            .retrieve(question)
            .await
            .at(Stage::Retrieval)?;
        let legal_context = format_context(&chunks);
        let prompt = assemble_prompt(document_text, &legal_context, question);
        tracing::debug!(
            chunks = chunks.len(),
            prompt_chars = prompt.len(),
            "prompt assembled"
        );
        self.model
            .complete(&prompt, ANSWER_TEMPERATURE)
            .await
            .at(Stage::Generation)
    }
}
