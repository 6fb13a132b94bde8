use crate::GenerationError;
use async_trait::async_trait;

/// Produces an answer to `question` grounded in the ranked context chunks.
#[async_trait]
pub trait AnswerGenerator {
    async fn generate(&self, question: &str, context: &[String]) -> Result<String, GenerationError>;
}
