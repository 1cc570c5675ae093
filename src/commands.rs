// src/commands.rs
//! Command handlers for the extcat CLI

use anyhow::{Context, Result};
use extcat::{
    CatalogClient, ExtcatConfig, LogProgress, Package, ServerConfig, SyncController, SyncEvent,
    SyncHandle,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use url::Url;

/// Run the catalogue server until interrupted
pub async fn cmd_serve(
    config: &ExtcatConfig,
    bind: Option<SocketAddr>,
    catalogue: Option<PathBuf>,
) -> Result<()> {
    let mut server_config: ServerConfig = config.server_config()?;
    if let Some(bind) = bind {
        server_config.bind_addr = bind;
    }
    if catalogue.is_some() {
        server_config.catalogue_path = catalogue;
    }

    extcat::run_server(server_config).await
}

/// One-shot search
pub async fn cmd_search(config: &ExtcatConfig, keyword: &str, endpoint: Option<&str>) -> Result<()> {
    let endpoint = resolve_endpoint(config, endpoint)?;
    let client = CatalogClient::with_timeout(config.timeout())?;

    let packages = client.search(keyword, &endpoint).await?;
    if packages.is_empty() {
        println!("No extensions found.");
        return Ok(());
    }

    println!("{:<34} {:<10} {:>6} {:>9}  NAME", "ID", "VERSION", "RATING", "INSTALLS");
    for pkg in &packages {
        println!(
            "{:<34} {:<10} {:>6.1} {:>9}  {}",
            pkg.id,
            pkg.version,
            pkg.display_rating(),
            pkg.installs,
            pkg.name
        );
    }
    println!("\n{} result(s)", packages.len());
    Ok(())
}

/// One-shot install with a progress bar (or progress log lines when
/// stderr is not a terminal)
pub async fn cmd_install(config: &ExtcatConfig, id: &str, endpoint: Option<&str>) -> Result<()> {
    let endpoint = resolve_endpoint(config, endpoint)?;
    let client = CatalogClient::with_timeout(config.timeout())?;
    let package = find_package(&client, id, &endpoint).await?;

    if package.installed {
        println!("{} is already installed", package.name);
        return Ok(());
    }

    if !std::io::stderr().is_terminal() {
        let mut progress = LogProgress::new(package.id.as_str());
        client.install(&package, &endpoint, &mut progress).await?;
        println!("Installed {}", package.name);
        return Ok(());
    }

    let mut bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{msg} [{bar:30}] {pos:>3}%")
            .context("Invalid progress template")?
            .progress_chars("=> "),
    );
    bar.set_message(format!("Installing {}", package.name));

    match client.install(&package, &endpoint, &mut bar).await {
        Ok(()) => {
            bar.set_position(100);
            bar.finish_with_message(format!("Installed {}", package.name));
            Ok(())
        }
        Err(e) => {
            bar.abandon_with_message(format!("Installation of {} failed", package.name));
            Err(e.into())
        }
    }
}

/// One-shot uninstall
pub async fn cmd_uninstall(config: &ExtcatConfig, id: &str, endpoint: Option<&str>) -> Result<()> {
    let endpoint = resolve_endpoint(config, endpoint)?;
    let client = CatalogClient::with_timeout(config.timeout())?;
    let package = find_package(&client, id, &endpoint).await?;

    client.uninstall(&package, &endpoint).await?;
    println!("Uninstalled {}", package.name);
    Ok(())
}

/// Interactive session driven by the sync controller
///
/// Plain lines are search text; `:install ID`, `:uninstall ID` and `:quit`
/// are commands. Every controller event is printed as it arrives.
pub async fn cmd_browse(config: &ExtcatConfig, endpoint: Option<&str>) -> Result<()> {
    let mut sync_config = config.sync_config()?;
    if let Some(endpoint) = endpoint {
        sync_config.endpoint = parse_endpoint(endpoint)?;
    }
    info!("Browsing catalogue at {}", sync_config.endpoint);

    let client = Arc::new(CatalogClient::with_timeout(config.timeout())?);
    let (handle, mut events, task) = SyncController::spawn(client, sync_config);

    println!("Type to search. Commands: :install ID, :uninstall ID, :quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    break;
                };
                if !dispatch(&handle, line.trim())? {
                    break;
                }
            }
            Some(event) = events.recv() => print_event(&event),
        }
    }

    drop(handle);
    task.await.context("Sync controller panicked")?;
    Ok(())
}

/// Route one input line; returns false when the session should end
fn dispatch(handle: &SyncHandle, line: &str) -> Result<bool> {
    if let Some(command) = line.strip_prefix(':') {
        let mut parts = command.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("quit" | "q"), _) => return Ok(false),
            (Some("install"), Some(id)) => handle.request_install(id)?,
            (Some("uninstall"), Some(id)) => handle.request_uninstall(id)?,
            _ => println!("Commands: :install ID, :uninstall ID, :quit"),
        }
        return Ok(true);
    }

    handle.request_search(line)?;
    Ok(true)
}

fn print_event(event: &SyncEvent) {
    match event {
        SyncEvent::RegistryChanged {
            installed,
            recommended,
        } => {
            println!("INSTALLED ({})", installed.len());
            for pkg in installed {
                println!("  {}", format_package(pkg));
            }
            println!("RECOMMENDED ({})", recommended.len());
            for pkg in recommended {
                println!("  {}", format_package(pkg));
            }
        }
        SyncEvent::StatusMessage { text, is_error } => {
            if *is_error {
                eprintln!("! {text}");
            } else {
                println!("> {text}");
            }
        }
        SyncEvent::InstallProgress { id, percent } => println!("  {id}: {percent}%"),
    }
}

fn format_package(pkg: &Package) -> String {
    format!(
        "{} {} [{}] by {} ({:.1}, {} installs)",
        pkg.name,
        pkg.version,
        pkg.id,
        pkg.author,
        pkg.display_rating(),
        pkg.installs
    )
}

async fn find_package(client: &CatalogClient, id: &str, endpoint: &Url) -> Result<Package> {
    client
        .search("", endpoint)
        .await?
        .into_iter()
        .find(|pkg| pkg.id == id)
        .with_context(|| format!("Extension '{id}' not found in catalogue"))
}

fn resolve_endpoint(config: &ExtcatConfig, endpoint: Option<&str>) -> Result<Url> {
    match endpoint {
        Some(endpoint) => parse_endpoint(endpoint),
        None => config.endpoint(),
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Url> {
    Url::parse(endpoint).with_context(|| format!("Invalid catalogue endpoint: {endpoint}"))
}
