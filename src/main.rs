use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use parley_api::{HttpBackend, default_client};
use parley_core::persistence::{FilePersistence, Persistence};
use parley_core::{ChatEngine, Config, EngineCommand, Response, UiEvent};
use parley_speech::{HttpRecognizer, SpeechRecognizer};
use parley_tui::{App, AppEvent, EventReader, SpeechEvent, run_tui};
use tokio::sync::mpsc;

mod init;

#[derive(Parser, Debug)]
#[command(name = "parley", version, about = "Chat with your documents from the terminal")]
struct Cli {
    /// Path to the config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ask one question without the interactive interface
    Ask {
        /// The question to submit
        question: String,

        /// Document(s) to upload first; repeatable
        #[arg(long = "file")]
        files: Vec<PathBuf>,

        /// Also print the session's extracted data as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let tui_active = cli.command.is_none();
    init::init_subscriber(tui_active, std::path::Path::new("parley.log"));

    let config_path = init::resolve_config_path(cli.config);
    let config = Config::load(&config_path)?;
    tracing::info!(base_url = %config.backend.base_url, "starting parley");

    let backend = HttpBackend::new(default_client(), &config.backend.base_url);

    match cli.command {
        Some(Command::Ask {
            question,
            files,
            json,
        }) => run_ask(backend, &question, files, json).await,
        None => run_interactive(backend, &config).await,
    }
}

async fn run_interactive(backend: HttpBackend, config: &Config) -> anyhow::Result<()> {
    let registry = Arc::new(std::sync::Mutex::new(parley_core::SessionRegistry::new()));
    let (engine_tx, mut engine_rx) = mpsc::unbounded_channel();
    let engine = Arc::new(ChatEngine::new(backend, Arc::clone(&registry), engine_tx));

    engine.start_session().await;
    engine.refresh_sessions().await;

    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(256);

    // Crossterm reads block, so they get their own thread.
    let reader = EventReader::new(event_tx.clone(), Duration::from_millis(100));
    std::thread::spawn(move || reader.run());

    // Engine events feed the same queue the key events arrive on.
    let forward_tx = event_tx.clone();
    tokio::spawn(async move {
        while let Some(event) = engine_rx.recv().await {
            if forward_tx.send(AppEvent::Engine(event)).await.is_err() {
                break;
            }
        }
    });

    let (commands_tx, mut commands_rx) = mpsc::unbounded_channel::<EngineCommand>();
    let command_engine = Arc::clone(&engine);
    tokio::spawn(async move {
        while let Some(command) = commands_rx.recv().await {
            match command {
                EngineCommand::Submit { text, files } => {
                    command_engine.submit(&text, &files).await;
                }
                EngineCommand::NewChat => {
                    command_engine.start_session().await;
                }
            }
        }
    });

    let speech_tx = config
        .speech
        .endpoint
        .clone()
        .map(|endpoint| spawn_transcriber(endpoint, event_tx.clone()));

    let persistence: Arc<dyn Persistence> =
        Arc::new(FilePersistence::new(init::ui_state_path()));
    let app = App::new(
        registry,
        commands_tx,
        speech_tx,
        persistence,
        config.ui.side_panels,
    );

    run_tui(app, event_rx).await?;
    Ok(())
}

/// Reads audio files off the channel, transcribes them, and feeds the results
/// back into the UI event queue.
fn spawn_transcriber(
    endpoint: String,
    event_tx: mpsc::Sender<AppEvent>,
) -> mpsc::UnboundedSender<PathBuf> {
    let (tx, mut rx) = mpsc::unbounded_channel::<PathBuf>();
    tokio::spawn(async move {
        let recognizer = HttpRecognizer::new(default_client(), endpoint);
        while let Some(path) = rx.recv().await {
            let event = match transcribe_file(&recognizer, &path).await {
                Ok(text) => SpeechEvent::Transcript(text),
                Err(e) => {
                    tracing::warn!(error = %e, path = %path.display(), "transcription failed");
                    SpeechEvent::Failed(e.to_string())
                }
            };
            let terminal = matches!(event, SpeechEvent::Transcript(_));
            if event_tx.send(AppEvent::Speech(event)).await.is_err() {
                break;
            }
            if terminal
                && event_tx
                    .send(AppEvent::Speech(SpeechEvent::Ended))
                    .await
                    .is_err()
            {
                break;
            }
        }
    });
    tx
}

async fn transcribe_file(
    recognizer: &HttpRecognizer,
    path: &std::path::Path,
) -> anyhow::Result<String> {
    let audio = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file_name = path.file_name().and_then(|n| n.to_str());
    let transcription = recognizer.transcribe(&audio, file_name).await?;
    Ok(transcription.text)
}

async fn run_ask(
    backend: HttpBackend,
    question: &str,
    files: Vec<PathBuf>,
    json: bool,
) -> anyhow::Result<()> {
    let registry = Arc::new(std::sync::Mutex::new(parley_core::SessionRegistry::new()));
    let (engine_tx, mut engine_rx) = mpsc::unbounded_channel();
    let engine = ChatEngine::new(backend, Arc::clone(&registry), engine_tx);

    engine.start_session().await;

    tokio::select! {
        () = async {
            if files.is_empty() {
                engine.ask(question).await;
            } else {
                engine.submit(question, &files).await;
            }
        } => {}
        _ = tokio::signal::ctrl_c() => {
            anyhow::bail!("interrupted");
        }
    }

    while let Ok(event) = engine_rx.try_recv() {
        if let UiEvent::Notice(notice) = event {
            eprintln!("{}", notice.text);
        }
    }

    let registry = registry.lock().unwrap();
    let session = registry.active().context("no active session")?;
    for message in &session.messages {
        match &message.response {
            Response::Text(text) => println!("{text}"),
            Response::Structured(answer) => {
                println!("{}", answer.answer);
                if let Some(confidence) = answer.confidence {
                    println!("confidence: {:.0}%", confidence.score * 100.0);
                }
                for citation in &answer.citations {
                    println!("  - {}: {}", citation.document_name, citation.text_snippet);
                }
            }
            Response::Progress(progress) => {
                for line in progress.lines() {
                    eprintln!("{}", line.text);
                }
            }
        }
    }
    if json && let Some(data) = &session.structured_data {
        println!("{}", serde_json::to_string_pretty(data)?);
    }
    Ok(())
}
