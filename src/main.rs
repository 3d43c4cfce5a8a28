use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use clap::{Parser, Subcommand};
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use smartbot::attachments::Attachment;
use smartbot::bot::UNKNOWN_REPLY;
use smartbot::credentials::CredentialRing;
use smartbot::llm::{GeminiClient, ModelClient, resolve_model};
use smartbot::{ChatBot, Config, Console, KnowledgeStore};

/// Smartbot - a chat bot that learns answers and asks Gemini for the rest
#[derive(Parser)]
#[command(name = "smartbot", version, about)]
struct Cli {
    /// Persona for new conversations (e.g. "Pirate")
    #[arg(short, long, global = true, env = "SMARTBOT_PERSONA")]
    persona: Option<String>,

    /// Knowledge file path
    #[arg(long, global = true, env = "SMARTBOT_KNOWLEDGE")]
    knowledge: Option<PathBuf>,

    /// Also write debug logs to this file
    #[arg(long, global = true, env = "SMARTBOT_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive chat (default)
    Chat,
    /// Answer one message and exit
    Ask {
        /// Message text
        text: String,
        /// Image (PNG/JPG) or table (CSV/XLS/XLSX) sent with the message
        #[arg(short, long)]
        attach: Option<PathBuf>,
        /// Print the plain answer instead of HTML
        #[arg(long)]
        raw: bool,
    },
    /// Teach an answer for a message
    Teach {
        /// Message to answer
        question: String,
        /// Answer to give
        answer: String,
    },
    /// List available personas
    Personas,
    /// List remote models and the one that would be used
    Models,
    /// Interactive first-run setup
    Setup,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = Config::load();
    if let Some(persona) = &cli.persona {
        config.default_persona = Some(persona.clone());
    }
    if let Some(path) = &cli.knowledge {
        config.knowledge_path.clone_from(path);
    }
    if cli.log_file.is_some() {
        config.log_file.clone_from(&cli.log_file);
    }

    init_logging(cli.verbose, config.log_file.as_deref());
    tracing::debug!(
        credentials = config.api_keys.len(),
        knowledge = %config.knowledge_path.display(),
        persona = ?config.default_persona,
        model = %config.models.default_model,
        "loaded configuration"
    );

    match run(cli.command.unwrap_or(Command::Chat), config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Console logging by verbosity, plus an optional debug-level file
fn init_logging(verbose: u8, log_file: Option<&Path>) {
    let filter = match verbose {
        0 => "warn,smartbot=info",
        1 => "warn,smartbot=debug",
        2 => "debug",
        _ => "trace",
    };
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    let console = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(console_filter);

    let mut file_error = None;
    let file_layer = log_file.and_then(|path| {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(EnvFilter::new("info,smartbot=debug")),
            ),
            Err(e) => {
                file_error = Some((path.to_path_buf(), e));
                None
            }
        }
    });

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .init();

    if let Some((path, e)) = file_error {
        tracing::warn!(path = %path.display(), error = %e, "cannot open log file");
    }
}

async fn run(command: Command, config: Config) -> anyhow::Result<()> {
    match command {
        Command::Chat => chat(&config).await,
        Command::Ask { text, attach, raw } => ask(&config, &text, attach.as_deref(), raw).await,
        Command::Teach { question, answer } => {
            teach(&config, &question, &answer);
            Ok(())
        }
        Command::Personas => personas(&config),
        Command::Models => models(&config).await,
        Command::Setup => smartbot::setup::run_setup(),
    }
}

/// Interactive console on stdin/stdout
async fn chat(config: &Config) -> anyhow::Result<()> {
    let mut bot = ChatBot::from_config(config)?;
    let mut console = Console::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout());
    console.run(&mut bot).await?;
    Ok(())
}

/// One-shot question through the full pipeline
async fn ask(
    config: &Config,
    text: &str,
    attach: Option<&Path>,
    raw: bool,
) -> anyhow::Result<()> {
    let bot = ChatBot::from_config(config)?;
    let attachment = attach.map(Attachment::from_path).transpose()?;
    let mut session = bot.new_session();

    if raw {
        let resolution = bot.resolve(&mut session, text, attachment).await;
        println!("{}", resolution.text().unwrap_or(UNKNOWN_REPLY));
    } else {
        let reply = bot.respond(&mut session, text, attachment).await;
        println!("{}", reply.html);
    }

    Ok(())
}

/// Add an answer to the knowledge file
fn teach(config: &Config, question: &str, answer: &str) {
    let mut store = KnowledgeStore::open(config.knowledge_path.clone());
    store.teach(question, answer);
    println!(
        "Learned an answer for \"{question}\" ({})",
        config.knowledge_path.display()
    );
}

/// List personas, marking the one new conversations use
fn personas(config: &Config) -> anyhow::Result<()> {
    let registry = config.persona_registry()?;
    let current = config
        .default_persona
        .as_deref()
        .and_then(|name| registry.get(name))
        .unwrap_or_else(|| registry.default_persona());

    for persona in registry.iter() {
        let marker = if persona.name == current.name { "*" } else { " " };
        println!("{marker} {:<20} {}", persona.name, persona.system_prompt);
    }

    Ok(())
}

/// Show models visible to the first working credential
async fn models(config: &Config) -> anyhow::Result<()> {
    let client = GeminiClient::new(&config.api_base_url, config.request_timeout)?;
    let credentials = CredentialRing::new(config.api_keys.iter().cloned());

    for credential in credentials.usable() {
        match client.list_models(credential).await {
            Ok(available) => {
                for model in &available {
                    println!("{model}");
                }
                let selected = resolve_model(
                    &available,
                    &config.models.priority,
                    &config.models.default_model,
                );
                println!("\nSelected: {selected} (credential {})", credential.slot());
                return Ok(());
            }
            Err(e) => {
                tracing::warn!(credential = credential.slot(), error = %e, "cannot list models");
            }
        }
    }

    anyhow::bail!("no working API credential; run `smartbot setup` or set SMARTBOT_API_KEYS")
}
