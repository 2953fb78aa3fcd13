use std::fmt;

/// Custom error type for lmprobe operations
/// Implements Clone for sending through channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error
{   /// HTTP transport error (connect, send, read body)
    HttpError(String)
  , /// Inference endpoint answered with a non-2xx status
    ApiError { status: u16, body: String }
  , /// Response body was not valid JSON
    ParseError(String)
  , /// Submit attempted with an empty prompt
    EmptyPrompt
  , /// Submit attempted while a call is outstanding
    Busy
  , /// Model display name not present in the catalog
    UnknownModel(String)
  , /// Invalid configuration
    InvalidConfiguration(String)
  , /// Timeout error
    Timeout
  , /// Generic error
    Other(String)
}

impl fmt::Display for Error
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   Error::HttpError(msg) => {
              write!(f, "HTTP error: {}", msg)
            }
          , Error::ApiError { status, body } => {
              write!(f,
                "Request failed with status code {}: {}",
                status, body
              )
            }
          , Error::ParseError(msg) => {
              write!(f, "Parse error: {}", msg)
            }
          , Error::EmptyPrompt => {
              write!(f, "Prompt is empty")
            }
          , Error::Busy => {
              write!(f, "A submission is already in flight")
            }
          , Error::UnknownModel(name) => {
              write!(f, "Unknown model: {}", name)
            }
          , Error::InvalidConfiguration(msg) => {
              write!(f, "Invalid configuration: {}", msg)
            }
          , Error::Timeout => {
              write!(f, "Request timed out")
            }
          , Error::Other(msg) => {
              write!(f, "{}", msg)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<String> for Error
{   fn from(s: String) -> Self
    {   Error::Other(s)
    }
}

impl From<&str> for Error
{   fn from(s: &str) -> Self
    {   Error::Other(s.to_string())
    }
}
