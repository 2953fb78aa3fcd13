//! Configuration for the inference endpoint and model catalog

use serde::{Deserialize, Serialize};
use log::debug;

/// Default Hugging Face Inference API base
pub const DEFAULT_API_BASE: &str
  = "https://api-inference.huggingface.co";

/// Sent when no token is configured; the endpoint rejects it
pub const PLACEHOLDER_TOKEN: &str
  = "your_hugging_face_token_here";

pub const TOKEN_ENV: &str = "HF_TOKEN";
pub const API_BASE_ENV: &str = "HF_API_BASE";

/// Fixed generation parameters sent with every prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParameters
{   pub max_new_tokens: usize
  , pub temperature: f32
}

impl Default for GenerationParameters
{   fn default() -> Self
    {   GenerationParameters
        {   max_new_tokens: 200
          , temperature: 0.7
        }
    }
}

/// One selectable model: display name and endpoint id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelEntry
{   /// Human-readable name shown in the selector
    pub name: String
  , /// Model identifier used in the endpoint path
    pub id: String
}

/// Enumerated mapping of model names to model identifiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCatalog
{   pub entries: Vec<ModelEntry>
}

impl ModelCatalog
{   /// Resolve a display name to its model id
    pub fn resolve(&self, name: &str)
      -> Result<&ModelEntry, crate::error::Error>
    {   self.entries
          .iter()
          .find(|e| e.name == name)
          .ok_or_else(|| {
            crate::error::Error::UnknownModel(name.to_string())
          })
    }

    /// Entry selected when nothing else is chosen
    pub fn default_entry(&self)
      -> Result<&ModelEntry, crate::error::Error>
    {   self.entries.first().ok_or_else(|| {
          crate::error::Error::InvalidConfiguration(
            "model catalog is empty".to_string()
          )
        })
    }

    pub fn names(&self) -> Vec<String>
    {   self.entries.iter().map(|e| e.name.clone()).collect()
    }
}

impl Default for ModelCatalog
{   fn default() -> Self
    {   ModelCatalog
        {   entries: vec![
              ModelEntry
              {   name: "Llama-2-7B-Chat".to_string()
                , id: "meta-llama/Llama-2-7b-chat-hf".to_string()
              }
            ]
        }
    }
}

/// lmprobe configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig
{   /// Inference API base URL
    pub api_base: String
  , /// Bearer token passed through untouched
    pub auth_token: String
  , /// Generation parameters
    pub parameters: GenerationParameters
  , /// Selectable models
    pub models: ModelCatalog
}

impl ProbeConfig
{   /// Build from `HF_TOKEN` and `HF_API_BASE`, falling back to defaults
    pub fn from_env() -> Self
    {   let auth_token = std::env::var(TOKEN_ENV)
          .ok()
          .filter(|t| !t.is_empty())
          .unwrap_or_else(|| {
            debug!("{} not set, using placeholder token", TOKEN_ENV);
            PLACEHOLDER_TOKEN.to_string()
          });
        let api_base = std::env::var(API_BASE_ENV)
          .ok()
          .filter(|b| !b.is_empty())
          .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        ProbeConfig
        {   api_base
          , auth_token
          , ..ProbeConfig::default()
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self
    {   self.api_base = api_base.into();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self
    {   self.auth_token = token.into();
        self
    }
}

impl Default for ProbeConfig
{   fn default() -> Self
    {   ProbeConfig
        {   api_base: DEFAULT_API_BASE.to_string()
          , auth_token: PLACEHOLDER_TOKEN.to_string()
          , parameters: GenerationParameters::default()
          , models: ModelCatalog::default()
        }
    }
}
