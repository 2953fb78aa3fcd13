//! Session history of past attempts, most recent first

use std::collections::VecDeque;
use serde::{Deserialize, Serialize};
use log::debug;

/// One prompt/response/verdict triple; immutable once created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry
{   prompt: String
  , response: String
  , verdict_label: String
}

impl HistoryEntry
{   pub fn new(
      prompt: impl Into<String>
    , response: impl Into<String>
    , verdict_label: impl Into<String>
    ) -> Self
    {   HistoryEntry
        {   prompt: prompt.into()
          , response: response.into()
          , verdict_label: verdict_label.into()
        }
    }

    pub fn prompt(&self) -> &str
    {   &self.prompt
    }

    pub fn response(&self) -> &str
    {   &self.response
    }

    pub fn verdict_label(&self) -> &str
    {   &self.verdict_label
    }
}

/// Unbounded, in-memory only. Entries are prepended and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct History
{   entries: VecDeque<HistoryEntry>
}

impl History
{   pub fn new() -> Self
    {   Self::default()
    }

    pub fn prepend(&mut self, entry: HistoryEntry)
    {   self.entries.push_front(entry);
    }

    pub fn clear(&mut self)
    {   debug!("Clearing {} history entries", self.entries.len());
        self.entries.clear();
    }

    pub fn len(&self) -> usize
    {   self.entries.len()
    }

    pub fn is_empty(&self) -> bool
    {   self.entries.is_empty()
    }

    /// Most recent first
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry>
    {   self.entries.iter()
    }

    pub fn latest(&self) -> Option<&HistoryEntry>
    {   self.entries.front()
    }
}
