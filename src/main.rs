//! sitecache CLI - drives the offline caching agent.
//!
//! `register` plays the part of the hosting page's registration call:
//! it installs the current cache generation and activates it, logging the
//! outcome. `get` routes a single request through the interceptor, which
//! is also handy for warming the cache of the page you are on.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use url::Url;

use sitecache::auth::ManifestCredentials;
use sitecache::{Agent, AgentConfig, PageRequest};

/// Initialize the tracing subscriber for logging.
/// Use RUST_LOG to control the level (e.g. RUST_LOG=debug); the long-lived
/// register path also writes a daily rolling file under the cache root.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let stderr_layer = fmt::layer().with_writer(io::stderr);

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "sitecache.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(stderr_layer)
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(stderr_layer)
                .with(filter)
                .init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("register") => register().await,
        Some("status") => status(),
        Some("get") => get(&args[2..]).await,
        Some("init") => init_config(),
        Some("set-password") => set_password(),
        Some("forget-password") => forget_password(),
        _ => {
            usage();
            Ok(())
        }
    }
}

fn usage() {
    eprintln!("sitecache - offline caching agent for a small personal website");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  sitecache register             install the current cache version and activate it");
    eprintln!("  sitecache status               show cache stores and storage usage");
    eprintln!("  sitecache get <url> [--navigate]  route one request through the agent");
    eprintln!("  sitecache init                 write the default config file");
    eprintln!("  sitecache set-password         store the manifest password in the OS keychain");
    eprintln!("  sitecache forget-password      remove the stored manifest password");
}

async fn register() -> Result<()> {
    let config = AgentConfig::load()?;
    let log_dir = config.cache_root().unwrap_or_else(|_| PathBuf::from("."));
    let _guard = init_tracing(Some(&log_dir));
    info!("sitecache starting");

    let mut agent = Agent::new(config)?;
    match agent.register().await {
        Ok(()) => {
            eprintln!(
                "Registered cache version {}.",
                agent.stores().current_tag()
            );
            Ok(())
        }
        Err(error) => {
            eprintln!("Registration failed: {}", error);
            Err(error.into())
        }
    }
}

fn status() -> Result<()> {
    let _ = init_tracing(None);
    let config = AgentConfig::load()?;
    let agent = Agent::new(config)?;
    let report = agent.stores().storage_report()?;

    if report.stores.is_empty() {
        println!("No cache stores. Run `sitecache register` first.");
        return Ok(());
    }
    for store in &report.stores {
        let marker = if store.current { "*" } else { " " };
        println!(
            "{} {}  {} entries, {} bytes",
            marker, store.name, store.entries, store.bytes
        );
    }
    println!("Using {} bytes total.", report.total_bytes());
    Ok(())
}

async fn get(args: &[String]) -> Result<()> {
    let _ = init_tracing(None);
    let raw = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .context("Usage: sitecache get <url> [--navigate]")?;
    let navigate = args.iter().any(|a| a == "--navigate");

    let config = AgentConfig::load()?;
    let agent = Agent::new(config)?;
    let interceptor = agent.interceptor()?;

    let url = Url::parse(raw).with_context(|| format!("Invalid URL: {}", raw))?;
    let request = if navigate {
        PageRequest::navigation(url)
    } else {
        PageRequest::new(url)
    };

    match interceptor.intercept(&request).await {
        Ok(response) => {
            eprintln!(
                "{} via {:?} ({} bytes)",
                response.status,
                response.served_from,
                response.body.len()
            );
            io::stdout().write_all(&response.body)?;
            Ok(())
        }
        Err(error) => {
            eprintln!("No response: {}", error);
            Err(error.into())
        }
    }
}

fn init_config() -> Result<()> {
    let config = AgentConfig::load()?;
    config.save()?;
    eprintln!("Wrote config for origin {}.", config.origin);
    Ok(())
}

fn set_password() -> Result<()> {
    let config = AgentConfig::load()?;
    eprint!("Manifest password for {}: ", config.manifest_username);
    let mut password = String::new();
    io::stdin().read_line(&mut password)?;
    let password = password.trim_end();
    if password.is_empty() {
        anyhow::bail!("Empty password, nothing stored");
    }
    ManifestCredentials::store(&config.manifest_username, password)?;
    eprintln!(
        "Stored manifest password for {} in the OS keychain.",
        config.manifest_username
    );
    Ok(())
}

fn forget_password() -> Result<()> {
    let config = AgentConfig::load()?;
    ManifestCredentials::forget(&config.manifest_username)?;
    eprintln!("Removed stored manifest password.");
    Ok(())
}
