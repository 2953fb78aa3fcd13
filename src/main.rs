//! Terminal front end: one prompt per line, `:`-prefixed commands.

use clap::Parser;
use log::{debug, error};
use tokio::io::{AsyncBufReadExt, BufReader};

use lmprobe::config::{self, ProbeConfig};
use lmprobe::{AppState, ProbeBackend, Submission};

#[derive(Debug, Parser)]
#[command(name = "lmprobe", about = "Test how well a language model understands your prompts")]
struct Args
{   /// Model display name from the catalog
    #[arg(long, short)]
    model: Option<String>
  , /// Hugging Face API token
    #[arg(long, env = config::TOKEN_ENV, hide_env_values = true)]
    token: Option<String>
  , /// Inference API base URL
    #[arg(long, env = config::API_BASE_ENV)]
    api_base: Option<String>
}

const HELP: &str = "\
Enter a prompt to test how well the language model understands it.
  :history   show prompt history
  :clear     clear prompt history
  :models    list models
  :quit      exit";

#[tokio::main]
async fn main()
{   env_logger::init();
    if let Err(e) = run(Args::parse()).await
    {   error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), lmprobe::error::Error>
{   let mut config = ProbeConfig::from_env();
    if let Some(token) = args.token.filter(|t| !t.is_empty())
    {   config = config.with_token(token);
    }
    if let Some(api_base) = args.api_base.filter(|b| !b.is_empty())
    {   config = config.with_api_base(api_base);
    }
    let model = match args.model
    {   Some(name) => config.models.resolve(&name)?.name.clone()
      , None => config.models.default_entry()?.name.clone()
    };
    debug!("Using model {}", model);

    let backend = ProbeBackend::huggingface(config)?;
    println!("Language Model Understanding Tester");
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await
      .map_err(|e| lmprobe::error::Error::Other(e.to_string()))?
    {   match line.trim_end()
        {   "" => continue
          , ":quit" | ":q" => break
          , ":help" => println!("{}", HELP)
          , ":clear" => {
              recv(backend.clear_history().await?).await?;
              println!("History cleared.");
            }
          , ":history" => {
              let state = recv(backend.snapshot().await?).await?;
              print_history(&state);
            }
          , ":models" => {
              for entry in recv(backend.get_models().await?).await?
              {   let mark = if entry.name == model { "*" } else { " " };
                  println!("{} {} ({})", mark, entry.name, entry.id);
              }
            }
          , prompt => {
              println!("Loading...");
              let reply = backend
                .submit(prompt.to_string(), model.clone())
                .await?;
              match recv(reply).await
              {   Ok(submission) => print_submission(&submission)
                , Err(e) => println!("{}", e)
              }
            }
        }
    }

    backend.shutdown().await
}

async fn recv<T>(
  mut rx: tokio::sync::mpsc::UnboundedReceiver<
    Result<T, lmprobe::error::Error>
  >
) -> Result<T, lmprobe::error::Error>
{   rx.recv().await.unwrap_or_else(|| {
      Err(lmprobe::error::Error::Other(
        "Backend dropped the reply".to_string()
      ))
    })
}

fn print_submission(s: &Submission)
{   println!("\nModel Response\n  {}", s.response);
    println!("Evaluation\n  {}", s.evaluation);
    println!("Keyword Overlap Score: {}\n", s.score_display());
}

fn print_history(state: &AppState)
{   if state.history().is_empty()
    {   println!("No history.");
        return;
    }
    println!("Prompt History");
    for entry in state.history().iter()
    {   println!("  Prompt: {}", entry.prompt());
        println!("  Response: {}", entry.response());
        println!("  Evaluation: {}\n", entry.verdict_label());
    }
}
