//! Request and response types for a single inference call

use serde::{Deserialize, Serialize};
use serde_json::Value;
use log::trace;

/// Text used when the payload carries no generated text
pub const NO_RESPONSE_TEXT: &str = "Error: No response";

/// Prompt request as submitted by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRequest
{   /// The prompt text, non-empty
    pub prompt: String
  , /// Model identifier from the catalog
    pub model_id: String
}

/// Outcome of one inference call, produced once and never retried
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InferenceResult
{   Text(String)
  , Failed(String)
}

impl InferenceResult
{   pub fn is_failed(&self) -> bool
    {   matches!(self, InferenceResult::Failed(_))
    }
}

impl From<Result<String, crate::error::Error>> for InferenceResult
{   fn from(r: Result<String, crate::error::Error>) -> Self
    {   match r
        {   Ok(text) => InferenceResult::Text(text)
          , Err(e) => InferenceResult::Failed(e.to_string())
        }
    }
}

// ===== Wire Types =====

/// Body POSTed to the inference endpoint
#[derive(Debug, Clone, Serialize)]
pub struct InferenceRequest<'a>
{   pub inputs: &'a str
  , pub parameters: &'a crate::config::GenerationParameters
}

/// The two payload shapes the endpoint answers with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedPayload
{   /// `[{"generated_text": ...}, ...]`
    Batch(String)
  , /// `{"generated_text": ...}`
    Single(String)
  , /// Neither shape, or an empty `generated_text`
    Missing
}

impl GeneratedPayload
{   /// Classify a decoded JSON body
    pub fn parse(body: &Value) -> Self
    {   let payload = match body
        {   Value::Array(items) => items
              .first()
              .and_then(generated_text)
              .map(GeneratedPayload::Batch)
          , Value::Object(_) => generated_text(body)
              .map(GeneratedPayload::Single)
          , _ => None
        };
        let payload = payload.unwrap_or(GeneratedPayload::Missing);
        trace!("Classified payload as {:?}", payload);
        payload
    }

    /// Generated text, or the fixed no-response text
    pub fn into_text(self) -> String
    {   match self
        {   GeneratedPayload::Batch(text)
          | GeneratedPayload::Single(text) => text
          , GeneratedPayload::Missing => NO_RESPONSE_TEXT.to_string()
        }
    }
}

fn generated_text(item: &Value) -> Option<String>
{   item.get("generated_text")
      .and_then(Value::as_str)
      .filter(|s| !s.is_empty())
      .map(str::to_string)
}
