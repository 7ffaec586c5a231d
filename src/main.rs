use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use opschat::app::{AppConfig, AppPaths, AppState};
use opschat::chat::{ChatBackend, ChatController, PollOutcome, SubmitOutcome, UiState};
use opschat::error::{Error, Result};

mod cli;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Chat);

    let paths = AppPaths::new()?;
    paths.ensure_dirs_exist()?;

    // The interactive mode owns the terminal, so its logs go to a file; the
    // one-shot commands log to stderr.
    let log_to_file = matches!(command, Commands::Chat);
    let _guard = init_tracing(&paths, cli.debug, log_to_file);

    info!("Starting opschat");

    let mut config = match cli.config {
        Some(path) => AppConfig::load_from_path(Path::new(&path)).await?,
        None => AppConfig::load(&paths).await?,
    };

    if let Some(url) = cli.url {
        config.backend.base_url = url;
        config.validate()?;
    }

    let state = Arc::new(AppState::new(config)?);

    match command {
        Commands::Chat => opschat::tui::run(state).await,
        Commands::Ask { text } => run_ask(state, &text).await,
        Commands::Health => run_health(state).await,
    }
}

fn init_tracing(paths: &AppPaths, debug: bool, to_file: bool) -> Option<WorkerGuard> {
    let directive = if debug { "opschat=debug" } else { "opschat=info" };
    let filter = EnvFilter::from_default_env().add_directive(directive.parse().unwrap());

    if to_file {
        let file_appender = tracing_appender::rolling::daily(paths.logs_dir(), "opschat.log");
        let (writer, guard) = tracing_appender::non_blocking(file_appender);
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .init();
        Some(guard)
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        None
    }
}

/// One-shot mode: submit the text, poll on the configured interval until the
/// backend reports completion, streaming the response to stdout.
async fn run_ask(state: Arc<AppState>, text: &str) -> Result<()> {
    let mut controller = ChatController::new(state.backend(), state.widget_options());

    let generation = match controller.submit(text).await {
        SubmitOutcome::Started(generation) => generation,
        SubmitOutcome::Rejected => {
            return Err(Error::chat("Nothing to send: message text is empty"));
        }
        SubmitOutcome::Failed => {
            return Err(Error::chat(controller.view().status.clone()));
        }
    };

    eprintln!("{}", controller.view().status);

    let mut printed = String::new();
    let mut interval = tokio::time::interval(state.poll_interval());
    interval.tick().await; // first tick completes immediately

    loop {
        interval.tick().await;
        match controller.poll_once(generation).await {
            PollOutcome::Continue | PollOutcome::Completed => {
                let response = &controller.view().response;
                if response.starts_with(&printed) {
                    print!("{}", &response[printed.len()..]);
                } else {
                    print!("{}", response);
                }
                std::io::stdout().flush()?;
                printed = response.clone();

                if controller.state() == UiState::Idle {
                    break;
                }
            }
            PollOutcome::Failed => {
                println!();
                return Err(Error::chat(controller.view().status.clone()));
            }
            PollOutcome::Stale => break,
        }
    }

    println!();
    if state.widget_options().include_final_answer_box {
        println!("Final answer: {}", controller.view().final_answer);
    }
    Ok(())
}

async fn run_health(state: Arc<AppState>) -> Result<()> {
    let backend = state.backend();
    backend.health().await?;
    println!("Backend at {} is healthy", state.config().backend.base_url);
    Ok(())
}
