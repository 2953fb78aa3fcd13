//! Understanding heuristic over a prompt and a generated response
//!
//! Tokens are lower-cased, whitespace-delimited words. Punctuation stays
//! attached, so `france?` and `france` are different tokens.

use std::collections::HashSet;
use serde::{Deserialize, Serialize};

/// Canned phrases that mark an incoherent or evasive answer
pub const FAILURE_PHRASES: [&str; 4]
  = ["i don't know", "sorry", "not sure", "cannot help"];

/// Overlap must be strictly greater than this
pub const KEYWORD_THRESHOLD: f64 = 0.3;

/// Response must have strictly more tokens than this
pub const MIN_RESPONSE_TOKENS: usize = 10;

pub const UNDERSTOOD_LABEL: &str = "Understood";
pub const NOT_UNDERSTOOD_LABEL: &str = "Not Understood";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationVerdict
{   pub understood: bool
  , /// Unrounded, in [0, 1]
    pub keyword_score: f64
  , pub length_ok: bool
  , pub coherence_ok: bool
}

impl EvaluationVerdict
{   pub fn label(&self) -> &'static str
    {   if self.understood
        {   UNDERSTOOD_LABEL
        } else
        {   NOT_UNDERSTOOD_LABEL
        }
    }
}

fn token_set(text: &str) -> HashSet<String>
{   text.to_lowercase()
      .split_whitespace()
      .map(str::to_string)
      .collect()
}

/// Fraction of unique prompt tokens also present in the response
pub fn keyword_score(prompt: &str, response: &str) -> f64
{   let prompt_tokens = token_set(prompt);
    if prompt_tokens.is_empty()
    {   return 0.0;
    }
    let response_tokens = token_set(response);
    let common = prompt_tokens
      .iter()
      .filter(|t| response_tokens.contains(*t))
      .count();
    common as f64 / prompt_tokens.len() as f64
}

pub fn is_coherent(response: &str) -> bool
{   let lowered = response.to_lowercase();
    !FAILURE_PHRASES.iter().any(|p| lowered.contains(p))
}

pub fn evaluate(prompt: &str, response: &str) -> EvaluationVerdict
{   let keyword_score = keyword_score(prompt, response);
    let length_ok
      = response.split_whitespace().count() > MIN_RESPONSE_TOKENS;
    let coherence_ok = is_coherent(response);
    EvaluationVerdict
    {   understood: keyword_score > KEYWORD_THRESHOLD
          && length_ok
          && coherence_ok
      , keyword_score
      , length_ok
      , coherence_ok
    }
}

/// Two-decimal rendering used by front ends
pub fn format_score(score: f64) -> String
{   format!("{:.2}", score)
}
