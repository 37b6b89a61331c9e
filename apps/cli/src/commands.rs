//! Subcommand implementations.

use std::path::Path;

use anyhow::{Context, bail};

use tableau_send_deploy::{SendEvent, SendOrchestrator};
use tableau_send_extract::ExtractKind;
use tableau_send_rest::Client;

use crate::config::Config;

pub fn init_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to replace it)",
            path.display()
        );
    }
    Config::default().save(path)?;
    println!("wrote {}", path.display());
    Ok(())
}

pub async fn publish(config: &Config, file: &Path) -> anyhow::Result<()> {
    let kind = ExtractKind::from_path(file)
        .with_context(|| format!("{} is not a .hyper or .tde file", file.display()))?;
    let settings = config.send_settings(&datasource_name(config, file));
    settings.validate()?;

    let client = Client::with_config(&settings.host, config.client_config())?;
    let mut orchestrator = SendOrchestrator::new();
    let mut events = orchestrator
        .take_events()
        .context("event receiver already taken")?;

    let cancel = orchestrator.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling");
            cancel.cancel();
        }
    });

    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if let SendEvent::Progress { progress, status } = event {
                eprintln!("[{:>3.0}%] {status}", progress * 100.0);
            }
        }
    });

    let result = orchestrator.send_file(&client, &settings, file, kind).await;
    // Closes the event channel so the printer drains and exits.
    drop(orchestrator);
    let _ = printer.await;

    let sent = result?;
    println!(
        "published {:?} (id {}) to project {}",
        sent.datasource.name, sent.datasource.id, sent.project_id
    );
    Ok(())
}

pub async fn projects(config: &Config) -> anyhow::Result<()> {
    let client = connect(config).await?;
    let tree = client.query_project_tree().await?;
    for (depth, project) in tree.walk() {
        println!("{}{}  ({})", "  ".repeat(depth), project.name, project.id);
    }
    Ok(())
}

pub async fn datasources(config: &Config) -> anyhow::Result<()> {
    let client = connect(config).await?;
    let tree = client.query_project_tree().await?;
    for ds in client.query_all_datasources(&[]).await? {
        let project = ds
            .project_id()
            .and_then(|id| tree.display_path(id))
            .unwrap_or_default();
        println!("{}\t{}\t{}", ds.name, project, ds.id);
    }
    Ok(())
}

async fn connect(config: &Config) -> anyhow::Result<Client> {
    if config.host.trim().is_empty() {
        bail!("no server configured; set `host` in the configuration file");
    }
    let client = Client::with_config(&config.host, config.client_config())?;
    client
        .sign_in(&config.username, &config.password, &config.site_content_url)
        .await
        .context("sign-in failed")?;
    Ok(client)
}

/// The configured datasource name, or the file stem.
fn datasource_name(config: &Config, file: &Path) -> String {
    config
        .datasource_name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .or_else(|| file.file_stem().and_then(|s| s.to_str()).map(str::to_string))
        .unwrap_or_default()
}
