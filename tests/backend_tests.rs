use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use lmprobe::config::ProbeConfig;
use lmprobe::error::Error;
use lmprobe::{AppState, Inference, InferenceResult, ProbeBackend, PromptRequest};
use serde_json::json;
use tokio::sync::{mpsc, Semaphore};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "Llama-2-7B-Chat";

const ANSWER: &str
  = "The capital of France is Paris, a historic city known for culture.";

/// Fake model: answers once a permit is available, counting calls
struct GatedInference
{   gate: Arc<Semaphore>
  , calls: AtomicUsize
  , result: InferenceResult
}

impl GatedInference
{   fn open(result: InferenceResult) -> Arc<Self>
    {   Arc::new(GatedInference
        {   gate: Arc::new(Semaphore::new(Semaphore::MAX_PERMITS))
          , calls: AtomicUsize::new(0)
          , result
        })
    }

    fn closed(result: InferenceResult) -> Arc<Self>
    {   Arc::new(GatedInference
        {   gate: Arc::new(Semaphore::new(0))
          , calls: AtomicUsize::new(0)
          , result
        })
    }
}

#[async_trait::async_trait]
impl Inference for GatedInference
{   async fn infer(
      &self
    , _request: &PromptRequest
    , _auth_token: &str
    ) -> InferenceResult
    {   self.calls.fetch_add(1, Ordering::SeqCst);
        let permit = self.gate.acquire().await.unwrap();
        permit.forget();
        self.result.clone()
    }
}

async fn recv<T>(mut rx: mpsc::UnboundedReceiver<Result<T, Error>>)
  -> Result<T, Error>
{   rx.recv().await.expect("backend dropped reply")
}

async fn snapshot(backend: &ProbeBackend) -> AppState
{   recv(backend.snapshot().await.unwrap()).await.unwrap()
}

async fn wait_until_loading(backend: &ProbeBackend)
{   while !snapshot(backend).await.is_loading()
    {   tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_backend_initialization()
{   let backend = ProbeBackend::new(
      GatedInference::open(InferenceResult::Text(ANSWER.into())),
      ProbeConfig::default()
    ).unwrap();

    let state = snapshot(&backend).await;
    assert!(!state.is_loading());
    assert!(state.history().is_empty());
    assert_eq!(state.model().name, MODEL);

    assert!(backend.shutdown().await.is_ok());
}

#[tokio::test]
async fn test_empty_catalog_is_rejected()
{   let mut config = ProbeConfig::default();
    config.models.entries.clear();
    let result = ProbeBackend::new(
      GatedInference::open(InferenceResult::Text(ANSWER.into())),
      config
    );
    assert!(matches!(result, Err(Error::InvalidConfiguration(_))));
}

#[tokio::test]
async fn test_submit_evaluates_response()
{   let backend = ProbeBackend::new(
      GatedInference::open(InferenceResult::Text(ANSWER.into())),
      ProbeConfig::default()
    ).unwrap();

    let reply = backend
      .submit("What is the capital of France?".into(), MODEL.into())
      .await
      .unwrap();
    let submission = recv(reply).await.unwrap();

    assert_eq!(submission.response, ANSWER);
    assert_eq!(submission.evaluation, "Understood");
    assert_eq!(submission.score_display(), "0.67");

    let state = snapshot(&backend).await;
    assert_eq!(state.last(), Some(&submission));
    assert_eq!(state.history().len(), 1);

    let _ = backend.shutdown().await;
}

#[tokio::test]
async fn test_two_submissions_most_recent_first()
{   let backend = ProbeBackend::new(
      GatedInference::open(InferenceResult::Text(ANSWER.into())),
      ProbeConfig::default()
    ).unwrap();

    for prompt in ["first prompt", "second prompt"]
    {   let reply = backend
          .submit(prompt.into(), MODEL.into())
          .await
          .unwrap();
        recv(reply).await.unwrap();
    }

    let state = snapshot(&backend).await;
    let prompts: Vec<&str>
      = state.history().iter().map(|e| e.prompt()).collect();
    assert_eq!(prompts, vec!["second prompt", "first prompt"]);

    let _ = backend.shutdown().await;
}

#[tokio::test]
async fn test_failed_call_records_error_entry()
{   let backend = ProbeBackend::new(
      GatedInference::open(
        InferenceResult::Failed("HTTP error: connection refused".into())
      ),
      ProbeConfig::default()
    ).unwrap();

    let reply = backend
      .submit("hello".into(), MODEL.into())
      .await
      .unwrap();
    let submission = recv(reply).await.unwrap();

    assert_eq!(submission.response, "Error: HTTP error: connection refused");
    assert_eq!(submission.evaluation, "Error");
    assert_eq!(submission.score, 0.0);

    let state = snapshot(&backend).await;
    assert_eq!(state.history().len(), 1);
    assert_eq!(
      state.history().latest().unwrap().verdict_label(),
      "Error"
    );

    let _ = backend.shutdown().await;
}

#[tokio::test]
async fn test_invalid_submissions_are_rejected_without_calls()
{   let fake = GatedInference::open(InferenceResult::Text(ANSWER.into()));
    let backend = ProbeBackend::new(
      fake.clone(),
      ProbeConfig::default()
    ).unwrap();

    let reply = backend.submit(String::new(), MODEL.into()).await.unwrap();
    assert_eq!(recv(reply).await, Err(Error::EmptyPrompt));

    let reply = backend
      .submit("hello".into(), "Mistral-7B-Instruct".into())
      .await
      .unwrap();
    assert_eq!(
      recv(reply).await,
      Err(Error::UnknownModel("Mistral-7B-Instruct".into()))
    );

    assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
    assert!(snapshot(&backend).await.history().is_empty());

    let _ = backend.shutdown().await;
}

#[tokio::test]
async fn test_submit_while_loading_is_busy()
{   let fake = GatedInference::closed(InferenceResult::Text(ANSWER.into()));
    let backend = ProbeBackend::new(
      fake.clone(),
      ProbeConfig::default()
    ).unwrap();

    let first = backend
      .submit("first".into(), MODEL.into())
      .await
      .unwrap();
    wait_until_loading(&backend).await;

    let second = backend
      .submit("second".into(), MODEL.into())
      .await
      .unwrap();
    assert_eq!(recv(second).await, Err(Error::Busy));

    fake.gate.add_permits(1);
    let submission = recv(first).await.unwrap();
    assert_eq!(submission.prompt, "first");
    assert_eq!(fake.calls.load(Ordering::SeqCst), 1);
    assert_eq!(snapshot(&backend).await.history().len(), 1);

    let _ = backend.shutdown().await;
}

#[tokio::test]
async fn test_clear_while_loading_then_settle_repopulates()
{   let fake = GatedInference::closed(InferenceResult::Text(ANSWER.into()));
    let backend = ProbeBackend::new(
      fake.clone(),
      ProbeConfig::default()
    ).unwrap();

    fake.gate.add_permits(1);
    let first = backend
      .submit("first".into(), MODEL.into())
      .await
      .unwrap();
    recv(first).await.unwrap();

    let second = backend
      .submit("second".into(), MODEL.into())
      .await
      .unwrap();
    wait_until_loading(&backend).await;

    recv(backend.clear_history().await.unwrap()).await.unwrap();
    let state = snapshot(&backend).await;
    assert!(state.history().is_empty());
    assert!(state.is_loading());

    fake.gate.add_permits(1);
    recv(second).await.unwrap();

    let state = snapshot(&backend).await;
    assert!(!state.is_loading());
    assert_eq!(state.history().len(), 1);
    assert_eq!(state.history().latest().unwrap().prompt(), "second");

    let _ = backend.shutdown().await;
}

#[tokio::test]
async fn test_get_models_lists_catalog()
{   let backend = ProbeBackend::new(
      GatedInference::open(InferenceResult::Text(ANSWER.into())),
      ProbeConfig::default()
    ).unwrap();

    let models = recv(backend.get_models().await.unwrap()).await.unwrap();
    assert_eq!(models.len(), 1);
    assert_eq!(models[0].name, MODEL);
    assert_eq!(models[0].id, "meta-llama/Llama-2-7b-chat-hf");

    let _ = backend.shutdown().await;
}

#[tokio::test]
async fn test_set_auth_token_is_used_for_next_call()
{   let server = MockServer::start().await;

    Mock::given(method("POST"))
      .and(path("/models/meta-llama/Llama-2-7b-chat-hf"))
      .and(header("authorization", "Bearer hf_rotated"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(json!([{ "generated_text": ANSWER }]))
      )
      .expect(1)
      .mount(&server)
      .await;

    let config = ProbeConfig::default()
      .with_api_base(server.uri())
      .with_token("hf_stale");
    let backend = ProbeBackend::huggingface(config).unwrap();

    recv(backend.set_auth_token("hf_rotated".into()).await.unwrap())
      .await
      .unwrap();

    let reply = backend
      .submit("What is the capital of France?".into(), MODEL.into())
      .await
      .unwrap();
    let submission = recv(reply).await.unwrap();
    assert_eq!(submission.response, ANSWER);
    assert_eq!(submission.evaluation, "Understood");

    let _ = backend.shutdown().await;
}

#[tokio::test]
async fn test_rejected_token_surfaces_as_error_entry()
{   let server = MockServer::start().await;

    Mock::given(method("POST"))
      .respond_with(
        ResponseTemplate::new(401).set_body_string("Authorization header is invalid")
      )
      .mount(&server)
      .await;

    let config = ProbeConfig::default().with_api_base(server.uri());
    let backend = ProbeBackend::huggingface(config).unwrap();

    let reply = backend
      .submit("hello".into(), MODEL.into())
      .await
      .unwrap();
    let submission = recv(reply).await.unwrap();
    assert_eq!(submission.evaluation, "Error");
    assert!(submission.response.starts_with("Error: "));
    assert!(submission.response.contains("401"));

    let _ = backend.shutdown().await;
}

#[tokio::test]
async fn test_dropped_backend_releases_client()
{   let fake = GatedInference::open(InferenceResult::Text(ANSWER.into()));
    let backend = ProbeBackend::new(
      fake.clone(),
      ProbeConfig::default()
    ).unwrap();
    assert_eq!(snapshot(&backend).await.history().len(), 0);

    drop(backend);
    for _ in 0..100
    {   if Arc::strong_count(&fake) == 1
        {   break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(Arc::strong_count(&fake), 1, "backend loop still holds the client");
}

#[tokio::test]
async fn test_dropped_backend_exits_after_in_flight_call_settles()
{   let fake = GatedInference::closed(InferenceResult::Text(ANSWER.into()));
    let backend = ProbeBackend::new(
      fake.clone(),
      ProbeConfig::default()
    ).unwrap();

    let reply = backend
      .submit("first".into(), MODEL.into())
      .await
      .unwrap();
    wait_until_loading(&backend).await;
    drop(backend);

    fake.gate.add_permits(1);
    let submission = recv(reply).await.unwrap();
    assert_eq!(submission.prompt, "first");

    for _ in 0..100
    {   if Arc::strong_count(&fake) == 1
        {   break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(Arc::strong_count(&fake), 1, "backend loop still holds the client");
}

#[tokio::test]
async fn test_rejected_submit_keeps_previous_prompt()
{   let backend = ProbeBackend::new(
      GatedInference::open(InferenceResult::Text(ANSWER.into())),
      ProbeConfig::default()
    ).unwrap();

    let reply = backend
      .submit("first".into(), MODEL.into())
      .await
      .unwrap();
    recv(reply).await.unwrap();

    let reply = backend.submit(String::new(), MODEL.into()).await.unwrap();
    assert_eq!(recv(reply).await, Err(Error::EmptyPrompt));

    let reply = backend
      .submit("second".into(), "Mistral-7B-Instruct".into())
      .await
      .unwrap();
    assert!(recv(reply).await.is_err());

    let state = snapshot(&backend).await;
    assert_eq!(state.prompt(), "first");
    assert_eq!(state.model().name, MODEL);
    assert_eq!(state.history().len(), 1);

    let _ = backend.shutdown().await;
}
