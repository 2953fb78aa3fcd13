use std::sync::Arc;
use tokio::sync::mpsc;
use log::{debug, error, info};
use crate::ProbeFoot;
use crate::providers::Inference;
use crate::request::{InferenceResult, PromptRequest};

/// Backend state owned by the event loop
pub struct ProbeBackendState
{   pub app: crate::state::AppState
  , pub auth_token: String
  , pub models: crate::config::ModelCatalog
  , pub client: Arc<dyn Inference>
}

impl ProbeBackendState
{   /// Create a new backend state from configuration
    pub fn new(
      client: Arc<dyn Inference>
    , config: crate::config::ProbeConfig
    ) -> Result<Self, crate::error::Error>
    {   debug!("Initializing ProbeBackendState");
        let model = config.models.default_entry()?.clone();
        Ok(ProbeBackendState
        {   app: crate::state::AppState::new(model)
          , auth_token: config.auth_token
          , models: config.models
          , client
        })
    }

    fn begin_submit(
      &mut self
    , prompt: String
    , model: &str
    ) -> Result<PromptRequest, crate::error::Error>
    {   if self.app.is_loading()
        {   return Err(crate::error::Error::Busy);
        }
        self.models.resolve(model)?;
        if prompt.is_empty()
        {   return Err(crate::error::Error::EmptyPrompt);
        }
        self.app.select_model(&self.models, model)?;
        self.app.set_prompt(prompt);
        self.app.begin_submit()
    }
}

/// Result of a spawned inference call, fed back into the loop
struct Settled
{   result: InferenceResult
  , reply: crate::SubmitReplySender
}

/// Public API for the lmprobe backend - owns the task
pub struct ProbeBackend
{   hand: crate::ProbeHand
  , _task_handle: tokio::task::JoinHandle<()>
}

impl ProbeBackend
{   /// Create and spawn a new backend around an inference client
    /// Returns immediately - spawns background task
    pub fn new(
      client: Arc<dyn Inference>
    , config: crate::config::ProbeConfig
    ) -> Result<Self, crate::error::Error>
    {   debug!("Creating ProbeBackend with task ownership");
        let state = ProbeBackendState::new(client, config)?;

        let (submit_tx, submit_rx)
          = mpsc::unbounded_channel();
        let (clear_history_tx, clear_history_rx)
          = mpsc::unbounded_channel();
        let (set_auth_token_tx, set_auth_token_rx)
          = mpsc::unbounded_channel();
        let (get_models_tx, get_models_rx)
          = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx)
          = mpsc::unbounded_channel();
        let (kill_process_tx, kill_process_rx)
          = mpsc::unbounded_channel();

        let hand = crate::ProbeHand
        {   submit_tx
          , clear_history_tx
          , set_auth_token_tx
          , get_models_tx
          , snapshot_tx
          , kill_process_tx
        };

        let foot = crate::ProbeFoot
        {   submit_rx
          , clear_history_rx
          , set_auth_token_rx
          , get_models_rx
          , snapshot_rx
          , kill_process_rx
        };

        let _task_handle = tokio::spawn(async move {
          run_backend_loop(foot, state).await
        });

        Ok(ProbeBackend
        {   hand
          , _task_handle
        })
    }

    /// Backend talking to the Hugging Face Inference API
    pub fn huggingface(
      config: crate::config::ProbeConfig
    ) -> Result<Self, crate::error::Error>
    {   let client = crate::providers::HuggingFaceClient::from_config(&config);
        Self::new(Arc::new(client), config)
    }

    /// Submit a prompt - returns almost immediately
    /// The reply arrives once the inference call settles.
    pub async fn submit(
      &self
    , prompt: String
    , model: String
    ) -> Result<
        mpsc::UnboundedReceiver<crate::SubmitReply>,
        crate::error::Error
      >
    {   debug!("submit queuing command for model: {}", model);
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::SubmitArgs
        {   prompt
          , model
          , reply: reply_tx
        };

        self.hand.submit_tx
          .send(cmd)
          .map_err(|_| disconnected())?;

        Ok(reply_rx)
    }

    /// Clear history - allowed while a submission is loading
    pub async fn clear_history(
      &self
    ) -> Result<
        mpsc::UnboundedReceiver<crate::ClearHistoryReply>,
        crate::error::Error
      >
    {   debug!("clear_history queuing command");
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        self.hand.clear_history_tx
          .send(crate::ClearHistoryArgs { reply: reply_tx })
          .map_err(|_| disconnected())?;

        Ok(reply_rx)
    }

    /// Replace the bearer token used for later submissions
    pub async fn set_auth_token(
      &self
    , token: String
    ) -> Result<
        mpsc::UnboundedReceiver<crate::SetAuthTokenReply>,
        crate::error::Error
      >
    {   debug!("set_auth_token queuing command");
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::SetAuthTokenArgs
        {   token
          , reply: reply_tx
        };

        self.hand.set_auth_token_tx
          .send(cmd)
          .map_err(|_| disconnected())?;

        Ok(reply_rx)
    }

    /// Get the model catalog
    pub async fn get_models(
      &self
    ) -> Result<
        mpsc::UnboundedReceiver<crate::GetModelsReply>,
        crate::error::Error
      >
    {   debug!("get_models queuing command");
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        self.hand.get_models_tx
          .send(crate::GetModelsArgs { reply: reply_tx })
          .map_err(|_| disconnected())?;

        Ok(reply_rx)
    }

    /// Copy of the current application state
    pub async fn snapshot(
      &self
    ) -> Result<
        mpsc::UnboundedReceiver<crate::SnapshotReply>,
        crate::error::Error
      >
    {   debug!("snapshot queuing command");
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        self.hand.snapshot_tx
          .send(crate::SnapshotArgs { reply: reply_tx })
          .map_err(|_| disconnected())?;

        Ok(reply_rx)
    }

    /// Gracefully shutdown the backend
    pub async fn shutdown(self)
      -> Result<(), crate::error::Error>
    {   debug!("Shutting down ProbeBackend");
        let (reply_tx, mut reply_rx)
          = mpsc::unbounded_channel();

        self.hand.kill_process_tx
          .send(crate::KillProcessArgs { reply: reply_tx })
          .map_err(|_| {
            error!("Backend channel already closed");
            crate::error::Error::Other(
              "Backend already shutdown".to_string()
            )
          })?;

        // Wait for shutdown confirmation
        if let Some(result) = reply_rx.recv().await
        {   debug!("Backend shutdown confirmed");
            result
        } else
        {   error!("Backend shutdown timeout");
            Err(crate::error::Error::Timeout)
        }
    }
}

fn disconnected() -> crate::error::Error
{   error!("Backend channel closed");
    crate::error::Error::Other(
      "Backend disconnected".to_string()
    )
}

/// Main backend event loop
///
/// The inference call runs in its own task and reports back on the
/// settled channel, so every other command is served while it is pending.
/// The settled arm is only armed while loading; once the handle is dropped
/// and nothing is in flight every arm is disabled and the loop exits.
async fn run_backend_loop(
  foot: crate::ProbeFoot
, mut state: ProbeBackendState
)
{   debug!("Starting ProbeBackend event loop");
    let (settled_tx, mut settled_rx)
      = mpsc::unbounded_channel::<Settled>();
    let ProbeFoot
    {   mut submit_rx
      , mut clear_history_rx
      , mut set_auth_token_rx
      , mut get_models_rx
      , mut snapshot_rx
      , mut kill_process_rx
    } = foot;

    loop
    { tokio::select!
      { Some(cmd) = submit_rx.recv() => {
          debug!("Received Submit for model: {}", cmd.model);
          match state.begin_submit(cmd.prompt, &cmd.model)
          {   Ok(request) => {
                let client = state.client.clone();
                let token = state.auth_token.clone();
                let settled_tx = settled_tx.clone();
                let reply = cmd.reply;
                tokio::spawn(async move {
                  let result = client.infer(&request, &token).await;
                  let _ = settled_tx.send(Settled { result, reply });
                });
              }
            , Err(e) => {
                debug!("Submit rejected: {}", e);
                let _ = cmd.reply.send(Err(e));
              }
          }
        }
      , Some(settled) = settled_rx.recv()
          , if state.app.is_loading() => {
          debug!("Inference settled");
          let result = state.app.settle(settled.result);
          let _ = settled.reply.send(result);
        }
      , Some(cmd) = clear_history_rx.recv() => {
          debug!("Received ClearHistory");
          state.app.clear_history();
          let _ = cmd.reply.send(Ok(()));
        }
      , Some(cmd) = set_auth_token_rx.recv() => {
          debug!("Received SetAuthToken");
          state.auth_token = cmd.token;
          let _ = cmd.reply.send(Ok(()));
        }
      , Some(cmd) = get_models_rx.recv() => {
          debug!("Received GetModels");
          let _ = cmd.reply.send(Ok(state.models.entries.clone()));
        }
      , Some(cmd) = snapshot_rx.recv() => {
          debug!("Received Snapshot");
          let _ = cmd.reply.send(Ok(state.app.clone()));
        }
      , Some(cmd) = kill_process_rx.recv() => {
          debug!("Received KillProcess");
          let _ = cmd.reply.send(Ok(()));
          info!("ProbeBackend shutting down");
          break;
        }
      , else => {
          info!("ProbeBackend handle dropped, stopping loop");
          break;
        }
      }
    }
}
