pub mod error;
pub mod config;
pub mod providers;
pub mod request;
pub mod evaluator;
pub mod history;
pub mod state;
pub mod client;

pub use client::ProbeBackend;
pub use config::{ModelCatalog, ModelEntry, ProbeConfig};
pub use evaluator::{evaluate, EvaluationVerdict};
pub use history::{History, HistoryEntry};
pub use providers::{HuggingFaceClient, Inference};
pub use request::{InferenceResult, PromptRequest};
pub use state::{AppState, Phase, Submission};

/*

lmprobe: submit a prompt to a hosted language model, show what it
generated, and judge with a small heuristic whether it "understood".

lmprobe/
├── Cargo.toml
├── src/
│   ├── lib.rs          # Re-exports and the backend command interface
│   ├── main.rs         # Terminal front end
│   ├── error.rs        # Error type
│   ├── config.rs       # Endpoint, token, generation params, models
│   ├── client.rs       # Backend task owning the app state
│   ├── providers/      # Inference clients
│   │   ├── mod.rs      # Inference trait
│   │   └── huggingface.rs
│   ├── request.rs      # Prompt/result and wire payload types
│   ├── evaluator.rs    # Understanding heuristic
│   ├── history.rs      # Session history
│   └── state.rs        # Idle/Loading state machine
└── tests/

*/

/// LMPROBE BACKEND INTERFACE:

// ===== Submit =====

pub type SubmitReply = Result<crate::state::Submission, crate::error::Error>;
pub type SubmitReplySender
  = tokio::sync::mpsc::UnboundedSender<SubmitReply>;

pub struct SubmitArgs
{   pub prompt: String
  , /// Catalog display name
    pub model: String
  , pub reply: SubmitReplySender
}

// ===== ClearHistory =====

pub type ClearHistoryReply = Result<(), crate::error::Error>;
pub type ClearHistoryReplySender
  = tokio::sync::mpsc::UnboundedSender<ClearHistoryReply>;

pub struct ClearHistoryArgs
{   pub reply: ClearHistoryReplySender
}

// ===== SetAuthToken =====

pub type SetAuthTokenReply = Result<(), crate::error::Error>;
pub type SetAuthTokenReplySender
  = tokio::sync::mpsc::UnboundedSender<SetAuthTokenReply>;

pub struct SetAuthTokenArgs
{   pub token: String
  , pub reply: SetAuthTokenReplySender
}

// ===== GetModels =====

pub type GetModelsReply
  = Result<Vec<crate::config::ModelEntry>, crate::error::Error>;
pub type GetModelsReplySender
  = tokio::sync::mpsc::UnboundedSender<GetModelsReply>;

pub struct GetModelsArgs
{   pub reply: GetModelsReplySender
}

// ===== Snapshot =====

pub type SnapshotReply = Result<crate::state::AppState, crate::error::Error>;
pub type SnapshotReplySender
  = tokio::sync::mpsc::UnboundedSender<SnapshotReply>;

pub struct SnapshotArgs
{   pub reply: SnapshotReplySender
}

// ===== KillProcess =====

pub type KillProcessReply = Result<(), crate::error::Error>;
pub type KillProcessReplySender
  = tokio::sync::mpsc::UnboundedSender<KillProcessReply>;

pub struct KillProcessArgs
{   pub reply: KillProcessReplySender
}

// ===== ProbeHand (sender side) =====

pub struct ProbeHand
{   pub submit_tx
      : tokio::sync::mpsc::UnboundedSender<SubmitArgs>
  , pub clear_history_tx
      : tokio::sync::mpsc::UnboundedSender<ClearHistoryArgs>
  , pub set_auth_token_tx
      : tokio::sync::mpsc::UnboundedSender<SetAuthTokenArgs>
  , pub get_models_tx
      : tokio::sync::mpsc::UnboundedSender<GetModelsArgs>
  , pub snapshot_tx
      : tokio::sync::mpsc::UnboundedSender<SnapshotArgs>
  , pub kill_process_tx
      : tokio::sync::mpsc::UnboundedSender<KillProcessArgs>
}

// ===== ProbeFoot (receiver side) =====

pub struct ProbeFoot
{   pub submit_rx
      : tokio::sync::mpsc::UnboundedReceiver<SubmitArgs>
  , pub clear_history_rx
      : tokio::sync::mpsc::UnboundedReceiver<ClearHistoryArgs>
  , pub set_auth_token_rx
      : tokio::sync::mpsc::UnboundedReceiver<SetAuthTokenArgs>
  , pub get_models_rx
      : tokio::sync::mpsc::UnboundedReceiver<GetModelsArgs>
  , pub snapshot_rx
      : tokio::sync::mpsc::UnboundedReceiver<SnapshotArgs>
  , pub kill_process_rx
      : tokio::sync::mpsc::UnboundedReceiver<KillProcessArgs>
}
