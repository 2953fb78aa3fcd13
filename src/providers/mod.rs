//! Inference providers

pub mod huggingface;

// Re-export for convenience
pub use huggingface::HuggingFaceClient;

use crate::request::{InferenceResult, PromptRequest};

/// Seam between the submission flow and the remote model
///
/// Implementations make exactly one call per invocation and fold every
/// failure into [`InferenceResult::Failed`].
#[async_trait::async_trait]
pub trait Inference: Send + Sync
{   async fn infer(
      &self
    , request: &PromptRequest
    , auth_token: &str
    ) -> InferenceResult;
}
