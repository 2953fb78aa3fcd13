use log::{debug, trace, error};

use crate::config::GenerationParameters;
use crate::request::{
  GeneratedPayload, InferenceRequest, InferenceResult, PromptRequest
};

/// Client for the Hugging Face Inference API
///
/// One POST per call; no retry, no caching, no timeout.
#[derive(Debug, Clone)]
pub struct HuggingFaceClient
{   api_base: String
  , parameters: GenerationParameters
  , http_client: reqwest::Client
}

impl HuggingFaceClient
{   pub fn new(
      api_base: impl Into<String>
    , parameters: GenerationParameters
    ) -> Self
    {   let api_base = api_base.into();
        debug!("Creating HuggingFaceClient for {}", api_base);
        HuggingFaceClient
        {   api_base: api_base.trim_end_matches('/').to_string()
          , parameters
          , http_client: reqwest::Client::new()
        }
    }

    pub fn from_config(config: &crate::config::ProbeConfig) -> Self
    {   Self::new(config.api_base.clone(), config.parameters.clone())
    }

    pub fn endpoint(&self, model_id: &str) -> String
    {   format!("{}/models/{}", self.api_base, model_id)
    }

    async fn handle_infer(
      &self
    , request: &PromptRequest
    , auth_token: &str
    ) -> Result<String, crate::error::Error>
    {   debug!("Handling infer for: {}", request.model_id);

        let body = InferenceRequest
        {   inputs: &request.prompt
          , parameters: &self.parameters
        };
        trace!("Inference request: {:?}", body);

        let response = self.http_client
          .post(self.endpoint(&request.model_id))
          .bearer_auth(auth_token)
          .json(&body)
          .send()
          .await
          .map_err(|e| {
            error!("HTTP error: {}", e);
            crate::error::Error::HttpError(e.to_string())
          })?;

        let status = response.status();
        trace!("Inference response status: {}", status);

        if !status.is_success()
        {   let error_text = response.text().await
              .unwrap_or_else(|_|
                "Unknown error".to_string()
              );
            error!("Inference API error {}: {}", status, error_text);
            return Err(crate::error::Error::ApiError
            {   status: status.as_u16()
              , body: error_text
            });
        }

        let raw = response.text().await.map_err(|e| {
          error!("Failed to read body: {}", e);
          crate::error::Error::HttpError(e.to_string())
        })?;
        let payload: serde_json::Value
          = serde_json::from_str(&raw).map_err(|e| {
            error!("Parse error: {}", e);
            crate::error::Error::ParseError(e.to_string())
          })?;

        Ok(GeneratedPayload::parse(&payload).into_text())
    }
}

#[async_trait::async_trait]
impl super::Inference for HuggingFaceClient
{   async fn infer(
      &self
    , request: &PromptRequest
    , auth_token: &str
    ) -> InferenceResult
    {   self.handle_infer(request, auth_token).await.into()
    }
}
