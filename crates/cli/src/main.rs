mod play;
mod progress;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{bail, Result};
use colored::Colorize;
use sp_core::client::HttpBackend;
use sp_core::config::loader::load_config;
use sp_core::pipeline::{PipelineReconciler, RunOutcome};
use sp_core::store::{ScratchKey, SessionStore};
use sp_protocol::config_models::ClientConfig;
use sp_protocol::pipeline_models::RunId;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "storyplay", version, about = "Turn a problem into a game and play it")]
struct Cli {
    /// Directory containing `.storyplay/config.toml`
    #[arg(long, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a pipeline run for uploaded content, watch it, then play
    Start { content_id: String },
    /// Watch an existing run, then play
    Watch { run_id: String },
    /// Ask the backend to re-run one step
    Retry { step_id: String },
    /// Play a finished visualization
    Play { visualization_id: String },
}

struct App {
    config: ClientConfig,
    backend: Arc<HttpBackend>,
    store: Arc<SessionStore>,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(&cli.root).await?;
    let app = App {
        backend: Arc::new(HttpBackend::from_config(&config)?),
        store: Arc::new(SessionStore::from_config(&config)),
        config,
    };

    let store = Arc::clone(&app.store);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            store.teardown();
        }
    });

    let result = match cli.command {
        Command::Start { content_id } => {
            let run_id = app.reconciler().start_run(&content_id).await?;
            println!("{} run {}", "Started".green().bold(), run_id);
            watch_then_play(&app, run_id).await
        }
        Command::Watch { run_id } => watch_then_play(&app, RunId::new(run_id)).await,
        Command::Retry { step_id } => {
            app.reconciler().retry_step(&step_id).await?;
            println!("{} retry of step {}", "Requested".green().bold(), step_id);
            Ok(())
        }
        Command::Play { visualization_id } => {
            app.store
                .scratch()
                .set(ScratchKey::VisualizationId, visualization_id);
            play::run(&app.config, Arc::clone(&app.backend), Arc::clone(&app.store)).await
        }
    };

    app.store.teardown();
    result
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

impl App {
    fn reconciler(&self) -> PipelineReconciler {
        // Events are not needed here; progress is read from the store.
        let (events_tx, _) = mpsc::channel(1);
        PipelineReconciler::new(
            self.backend.clone(),
            Arc::clone(&self.store),
            self.config.poll,
            events_tx,
        )
    }
}

async fn watch_then_play(app: &App, run_id: RunId) -> Result<()> {
    let printer = tokio::spawn(progress::print_updates(
        app.store.updates(),
        app.store.cancellation_token(),
    ));

    let outcome = app
        .reconciler()
        .start_with_animation(run_id, &app.config.simulator)
        .await?;
    printer.abort();

    match outcome {
        RunOutcome::Completed { visualization_id } => {
            println!(
                "\n{} visualization {}",
                "Ready:".green().bold(),
                visualization_id
            );
            play::run(&app.config, Arc::clone(&app.backend), Arc::clone(&app.store)).await
        }
        RunOutcome::Failed { message } => bail!("pipeline run failed: {message}"),
        RunOutcome::Cancelled => bail!("cancelled"),
    }
}
