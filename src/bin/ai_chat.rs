//! ai-chat — 命令行对话中继：发送消息、查看历史、管理配置
//!
//! Usage:
//!   ai-chat chat [--session <id>] <text...>  Start a session, or continue one
//!   ai-chat history                        List saved sessions, newest first
//!   ai-chat config show                    Show settings (API key hidden)
//!   ai-chat models                         List known models per provider

use anyhow::{bail, Context};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use ai_chat_relay::config::check_api_key_format;
use ai_chat_relay::{ChatService, ProviderKind, Storage};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ai_chat_relay=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (data_dir, args) = split_data_dir(args);

    let Some(command) = args.first().cloned() else {
        print_usage();
        std::process::exit(1);
    };

    let result = match command.as_str() {
        "version" | "--version" | "-V" => {
            cmd_version();
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        "models" => {
            cmd_models();
            Ok(())
        }
        "chat" | "history" | "show" | "clear" | "config" => run_service_command(&data_dir, &args).await,
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"ai-chat — AI 对话中继命令行工具

USAGE:
    ai-chat [--data-dir <path>] <COMMAND> [ARGS]

COMMANDS:
    chat <text...>              Send a message in a new session
    chat --session <id> <text...>
                                Continue a saved session (ids from `history`)
    history                     List saved sessions, newest first
    show <session-id>           Print every message of a session
    clear                       Delete all saved sessions
    config show                 Show settings (API key hidden)
    config set <key> <value>    Change one setting (aiService, aiApiKey, aiModel, ...)
    config reset                Restore default settings
    config export [file]        Write settings, including the API key, as JSON
    config import <file>        Load settings from an exported JSON file
    models                      List known models per provider
    version                     Show version information
    help                        Show this help message

ENVIRONMENT:
    AI_CHAT_DATA_DIR            Data directory (default ./.ai-chat)
    AI_CHAT_<PROVIDER>_BASE_URL Endpoint override, e.g. AI_CHAT_DEEPSEEK_BASE_URL
    AI_CHAT_PROXY_URL           HTTP(S) proxy for provider calls
    RUST_LOG                    Log filter (default ai_chat_relay=info)"#
    );
}

fn cmd_version() {
    println!("ai-chat {}", env!("CARGO_PKG_VERSION"));
}

fn cmd_models() {
    for kind in ProviderKind::ALL {
        println!("{} ({})", kind.display_name(), kind.id());
        for model in kind.models() {
            let marker = if model.id == kind.default_model() { " [default]" } else { "" };
            println!("  {:<28} {}{}", model.id, model.name, marker);
        }
    }
}

/// Pull `--data-dir <path>` out of the argument list. Falls back to
/// `AI_CHAT_DATA_DIR`, then `./.ai-chat`.
fn split_data_dir(args: Vec<String>) -> (PathBuf, Vec<String>) {
    let mut dir = None;
    let mut rest = Vec::with_capacity(args.len());
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        if arg == "--data-dir" {
            dir = iter.next().map(PathBuf::from);
        } else {
            rest.push(arg);
        }
    }
    let dir = dir
        .or_else(|| std::env::var("AI_CHAT_DATA_DIR").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(".ai-chat"));
    (dir, rest)
}

async fn run_service_command(data_dir: &Path, args: &[String]) -> anyhow::Result<()> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("cannot create data directory {}", data_dir.display()))?;
    let service = ChatService::builder()
        .storage(Storage::in_dir(data_dir))
        .build()
        .context("cannot start chat service")?;

    match args[0].as_str() {
        "chat" => cmd_chat(&service, &args[1..]).await,
        "history" => cmd_history(&service).await,
        "show" => cmd_show(&service, &args[1..]).await,
        "clear" => {
            let removed = service.sessions().clear_all().await?;
            println!("Removed {removed} session(s).");
            Ok(())
        }
        _ => cmd_config(&service, &args[1..]).await,
    }
}

async fn cmd_chat(service: &ChatService, args: &[String]) -> anyhow::Result<()> {
    let args = match args {
        [flag, id, rest @ ..] if flag == "--session" => {
            if service.sessions().resume_session(id).await?.is_none() {
                bail!("session not found: {id}");
            }
            rest
        }
        [flag] if flag == "--session" => bail!("usage: ai-chat chat --session <id> <text...>"),
        rest => rest,
    };
    let text = args.join(" ");
    match service.chat(&text).await {
        Ok(reply) => {
            println!("{}", reply.content);
            eprintln!("[session {} · {}]", reply.session_id, ProviderKind::model_name(&reply.model));
            Ok(())
        }
        Err(e) => bail!(e.user_message()),
    }
}

async fn cmd_history(service: &ChatService) -> anyhow::Result<()> {
    let summaries = service.sessions().list_summaries().await?;
    if summaries.is_empty() {
        println!("No saved sessions.");
        return Ok(());
    }
    for s in summaries {
        println!(
            "{}  {}  {:>3} msg  {}",
            s.start_time.format("%Y-%m-%d %H:%M"),
            s.id,
            s.message_count,
            s.title.unwrap_or_default()
        );
    }
    Ok(())
}

async fn cmd_show(service: &ChatService, args: &[String]) -> anyhow::Result<()> {
    let Some(id) = args.first() else {
        bail!("usage: ai-chat show <session-id>");
    };
    let Some(session) = service.sessions().load_session(id).await? else {
        bail!("session not found: {id}");
    };
    for m in &session.messages {
        println!("[{}] {}: {}", m.timestamp.format("%H:%M:%S"), m.role, m.content);
    }
    Ok(())
}

async fn cmd_config(service: &ChatService, args: &[String]) -> anyhow::Result<()> {
    let config = service.config_manager();
    match args.first().map(String::as_str) {
        Some("show") | None => {
            let current = config.load().await?;
            println!("{}", serde_json::to_string_pretty(&current.public())?);
            println!("API key: {}", if current.has_api_key() { "set" } else { "not set" });
        }
        Some("set") => {
            let (Some(key), Some(raw)) = (args.get(1), args.get(2)) else {
                bail!("usage: ai-chat config set <key> <value>");
            };
            if key == "aiApiKey" {
                let provider = config.load().await?.provider;
                check_api_key_format(provider, raw).map_err(|e| anyhow::anyhow!(e.user_message()))?;
            }
            // Text fields stay text; numbers and booleans parse as JSON.
            let value = match key.as_str() {
                "aiService" | "aiApiKey" | "aiModel" => Value::String(raw.clone()),
                _ => serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.clone())),
            };
            let mut patch = serde_json::Map::new();
            patch.insert(key.clone(), value);
            let saved = config.update(&Value::Object(patch)).await?;
            println!("{}", serde_json::to_string_pretty(&saved.public())?);
        }
        Some("reset") => {
            config.reset().await?;
            println!("Settings restored to defaults.");
        }
        Some("export") => {
            let text = config.export_json().await?;
            match args.get(1) {
                Some(path) => {
                    std::fs::write(path, text).with_context(|| format!("cannot write {path}"))?;
                    println!("Settings exported to {path}.");
                }
                None => println!("{text}"),
            }
        }
        Some("import") => {
            let Some(path) = args.get(1) else {
                bail!("usage: ai-chat config import <file>");
            };
            let text = std::fs::read_to_string(path).with_context(|| format!("cannot read {path}"))?;
            let saved = config.import_json(&text).await.map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!("Imported settings for {}.", saved.provider.display_name());
        }
        Some(other) => bail!("unknown config command: {other}"),
    }
    Ok(())
}
