//! Submission state machine: Idle -> Loading -> Idle
//!
//! All transitions are plain methods on [`AppState`] so the flow can be
//! driven and inspected without any front end or network.

use log::{debug, info};
use crate::config::{ModelCatalog, ModelEntry};
use crate::evaluator::{self, EvaluationVerdict};
use crate::history::{History, HistoryEntry};
use crate::request::{InferenceResult, PromptRequest};

/// Verdict label recorded for a failed call
pub const ERROR_LABEL: &str = "Error";

#[derive(Debug, Clone, PartialEq)]
pub enum Phase
{   Idle
  , /// One call outstanding, for this request
    Loading { request: PromptRequest }
}

/// What the response/evaluation/score panels show after a call settles
#[derive(Debug, Clone, PartialEq)]
pub struct Submission
{   pub prompt: String
  , pub response: String
  , pub evaluation: String
  , pub score: f64
  , /// None when the call failed
    pub verdict: Option<EvaluationVerdict>
}

impl Submission
{   pub fn score_display(&self) -> String
    {   evaluator::format_score(self.score)
    }

    pub fn is_error(&self) -> bool
    {   self.verdict.is_none()
    }
}

/// Application state owned by the backend loop
#[derive(Debug, Clone, PartialEq)]
pub struct AppState
{   prompt: String
  , model: ModelEntry
  , last: Option<Submission>
  , history: History
  , phase: Phase
}

impl AppState
{   pub fn new(model: ModelEntry) -> Self
    {   AppState
        {   prompt: String::new()
          , model
          , last: None
          , history: History::new()
          , phase: Phase::Idle
        }
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>)
    {   self.prompt = prompt.into();
    }

    pub fn prompt(&self) -> &str
    {   &self.prompt
    }

    /// Select a model by its catalog display name
    pub fn select_model(
      &mut self
    , catalog: &ModelCatalog
    , name: &str
    ) -> Result<(), crate::error::Error>
    {   let entry = catalog.resolve(name)?;
        debug!("Selected model {} ({})", entry.name, entry.id);
        self.model = entry.clone();
        Ok(())
    }

    pub fn model(&self) -> &ModelEntry
    {   &self.model
    }

    pub fn phase(&self) -> &Phase
    {   &self.phase
    }

    pub fn is_loading(&self) -> bool
    {   matches!(self.phase, Phase::Loading { .. })
    }

    /// Submit is disabled while loading or when the prompt is empty
    pub fn can_submit(&self) -> bool
    {   !self.is_loading() && !self.prompt.is_empty()
    }

    pub fn submit_label(&self) -> &'static str
    {   if self.is_loading()
        {   "Loading..."
        } else
        {   "Submit"
        }
    }

    pub fn last(&self) -> Option<&Submission>
    {   self.last.as_ref()
    }

    pub fn history(&self) -> &History
    {   &self.history
    }

    /// Idle -> Loading. Returns the request to hand to the inference client.
    pub fn begin_submit(&mut self)
      -> Result<PromptRequest, crate::error::Error>
    {   if self.is_loading()
        {   return Err(crate::error::Error::Busy);
        }
        if self.prompt.is_empty()
        {   return Err(crate::error::Error::EmptyPrompt);
        }
        let request = PromptRequest
        {   prompt: self.prompt.clone()
          , model_id: self.model.id.clone()
        };
        debug!("Idle -> Loading for model {}", request.model_id);
        self.phase = Phase::Loading { request: request.clone() };
        Ok(request)
    }

    /// Loading -> Idle. Evaluates, updates the panels and prepends history.
    pub fn settle(&mut self, result: InferenceResult)
      -> Result<Submission, crate::error::Error>
    {   let request = match std::mem::replace(&mut self.phase, Phase::Idle)
        {   Phase::Loading { request } => request
          , Phase::Idle => {
              return Err(crate::error::Error::Other(
                "no submission in flight".to_string()
              ));
            }
        };

        let submission = match result
        {   InferenceResult::Text(text) => {
              let verdict = evaluator::evaluate(&request.prompt, &text);
              Submission
              {   prompt: request.prompt
                , response: text
                , evaluation: verdict.label().to_string()
                , score: verdict.keyword_score
                , verdict: Some(verdict)
              }
            }
          , InferenceResult::Failed(message) => {
              Submission
              {   prompt: request.prompt
                , response: format!("Error: {}", message)
                , evaluation: ERROR_LABEL.to_string()
                , score: 0.0
                , verdict: None
              }
            }
        };

        info!(
          "Loading -> Idle: {} (score {})",
          submission.evaluation,
          submission.score_display()
        );
        self.history.prepend(HistoryEntry::new(
          submission.prompt.clone(),
          submission.response.clone(),
          submission.evaluation.clone()
        ));
        self.last = Some(submission.clone());
        Ok(submission)
    }

    /// Independent of the phase
    pub fn clear_history(&mut self)
    {   self.history.clear();
    }
}
