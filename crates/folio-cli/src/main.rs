use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use folio_core::*;
use folio_provider::{create_backend, GenerationBackend};
use folio_schema::{AnswerSource, PortfolioProfile};
use folio_server::state::AppState;

#[derive(Parser)]
#[command(name = "folio", version, about = "Portfolio chat assistant")]
struct Cli {
    #[arg(
        long,
        default_value = "~/.folio",
        help = "Config root directory (contains config/ and logs/)"
    )]
    config_root: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Interactive chat in the terminal")]
    Chat,
    #[command(about = "Ask a single question and print the answer")]
    Ask {
        #[arg(help = "Question to ask")]
        question: String,
    },
    #[command(about = "Print the compiled system context")]
    Context,
    #[command(about = "Validate config and profile, and check the generation backend")]
    Validate,
    #[command(about = "Start the HTTP API server")]
    Serve {
        #[arg(long, help = "Port to bind (overrides server.bind)")]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();
    cli.config_root = expand_tilde(&cli.config_root);

    let log_dir = cli.config_root.join("logs");
    std::fs::create_dir_all(&log_dir)?;
    let file_appender = tracing_appender::rolling::daily(&log_dir, "folio.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking),
        )
        .init();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    match command {
        Commands::Chat => {
            let (_config, widget) = bootstrap(&cli.config_root)?;
            run_repl(&widget).await?;
        }
        Commands::Ask { question } => {
            let (_config, widget) = bootstrap(&cli.config_root)?;
            match widget.submit(&question).await {
                SubmitOutcome::Answered { source, message } => {
                    if source == AnswerSource::Fallback {
                        eprintln!("{GENERATION_UNAVAILABLE_NOTICE}");
                    }
                    println!("{}", message.text);
                }
                SubmitOutcome::Ignored { reason } => {
                    anyhow::bail!("question ignored: {reason:?}");
                }
            }
        }
        Commands::Context => {
            let config = load_config(&cli.config_root.join("config"))?;
            let profile = load_profile(&config, &cli.config_root)?;
            println!("{}", compile_context(&profile));
        }
        Commands::Validate => {
            let config = load_config(&cli.config_root.join("config"))?;
            let profile = load_profile(&config, &cli.config_root)?;
            println!(
                "Profile valid. {} skill categories, {} projects, {} publications, {} expertise domains.",
                profile.skill_categories.len(),
                profile.projects.len(),
                profile.publications.len(),
                profile.knowledge.expertise_domains.len()
            );
            let backend = create_backend(&config.generation);
            match backend.health().await {
                Ok(()) => println!("Generation backend ready ({}).", backend.model()),
                Err(err) => println!("Generation backend unavailable: {err:#}. Answers will use the fallback."),
            }
        }
        Commands::Serve { port } => {
            let config = load_config(&cli.config_root.join("config"))?;
            let profile = Arc::new(load_profile(&config, &cli.config_root)?);
            let backend = create_backend(&config.generation);
            let addr = bind_address(&config.server.bind, port);
            let state = AppState::new(profile, backend, &config);
            folio_server::serve(state, &addr).await?;
        }
    }

    Ok(())
}

fn expand_tilde(path: &Path) -> PathBuf {
    if path.starts_with("~") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(path.strip_prefix("~").unwrap_or(path));
        }
    }
    path.to_path_buf()
}

/// Replaces the port of `bind` when one is given on the command line.
fn bind_address(bind: &str, port: Option<u16>) -> String {
    match port {
        Some(port) => {
            let host = bind.rsplit_once(':').map(|(host, _)| host).unwrap_or(bind);
            format!("{host}:{port}")
        }
        None => bind.to_string(),
    }
}

fn bootstrap(root: &Path) -> Result<(FolioConfig, ChatWidget)> {
    let config = load_config(&root.join("config"))
        .with_context(|| format!("loading config from {}", root.display()))?;
    let profile: Arc<PortfolioProfile> = Arc::new(load_profile(&config, root)?);
    let backend: Arc<dyn GenerationBackend> = create_backend(&config.generation);
    tracing::debug!(owner = %profile.identity.name, "profile loaded");
    let widget = match &config.greeting {
        Some(greeting) => ChatWidget::new(profile, backend, greeting),
        None => ChatWidget::with_default_greeting(profile, backend),
    };
    Ok((config, widget))
}

async fn run_repl(widget: &ChatWidget) -> Result<()> {
    widget.open();
    let snapshot = widget.snapshot();
    for message in &snapshot.messages {
        println!("assistant: {}", message.text);
    }
    println!("Try one of:");
    for action in &snapshot.quick_actions {
        println!("  /{}  {}", action.name(), action.question());
    }
    println!("Type 'quit' to exit.");
    println!("---");

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let mut input = String::new();
        if stdin.read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim_end_matches(['\r', '\n']);
        if input == "quit" || input == "exit" {
            break;
        }

        let outcome = match input.strip_prefix('/').and_then(QuickAction::from_label) {
            Some(action) => widget.submit_quick_action(action).await,
            None => widget.submit(input).await,
        };

        match outcome {
            SubmitOutcome::Answered { message, .. } => {
                if let Some(err) = widget.snapshot().last_error {
                    eprintln!("[{err}]");
                }
                println!("assistant: {}", message.text);
            }
            SubmitOutcome::Ignored { reason } => {
                if reason == IgnoreReason::QuickActionsExpired {
                    println!("(quick actions are only offered before your first question)");
                }
            }
        }
    }

    widget.close();
    Ok(())
}
