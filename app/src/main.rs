mod cli;
mod engine;
mod store;
mod tunnel;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tk_conn::{ConnectError, ConnectionManager, ConnectionState, ManagerConfig};
use tk_types::{ServerRecord, ServerStore};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use engine::ProcessEngine;
use store::JsonFileStore;
use tunnel::{UnavailableSsh, UnavailableUdp};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store = JsonFileStore::open(store_path(&cli)).context("open server store")?;

    match cli.command {
        Command::Import { uris, url, file } => import(&store, uris, url, file).await,
        Command::List => list(&store),
        Command::Export { id } => export(&store, &id),
        Command::Remove { id } => remove(&store, &id),
        Command::Generate { id, compact } => generate(&store, &id, compact),
        Command::Probe { id } => probe(&store, id).await,
        Command::Connect { id, engine_bin } => connect(&store, &id, engine_bin).await,
    }
}

fn store_path(cli: &Cli) -> PathBuf {
    if let Some(path) = &cli.store {
        return path.clone();
    }
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".config/tunkit/servers.json"),
        None => PathBuf::from("tunkit-servers.json"),
    }
}

fn fetch_record(store: &JsonFileStore, id: &str) -> Result<ServerRecord> {
    store
        .get(id)?
        .with_context(|| format!("no server with id {id}"))
}

async fn import(
    store: &JsonFileStore,
    uris: Vec<String>,
    url: Option<String>,
    file: Option<PathBuf>,
) -> Result<()> {
    let mut imported = 0usize;

    for uri in &uris {
        match tk_links::parse_uri(uri) {
            Ok(record) => {
                println!("+ {} ({})", record.display_name(), record.protocol);
                store.put(record)?;
                imported += 1;
            }
            Err(e) => warn!(uri, error = %e, "skipping link"),
        }
    }

    let mut reports = Vec::new();
    if let Some(url) = url {
        reports.push(tk_links::http::fetch_subscription(&url).await?);
    }
    if let Some(path) = file {
        let payload = std::fs::read_to_string(&path)
            .with_context(|| format!("read {}", path.display()))?;
        reports.push(tk_links::subscription::import(&payload));
    }
    for report in reports {
        for (line, err) in &report.failures {
            warn!(line, error = %err, "subscription line skipped");
        }
        for record in report.records {
            println!("+ {} ({})", record.display_name(), record.protocol);
            store.put(record)?;
            imported += 1;
        }
    }

    println!("imported {imported} server(s)");
    Ok(())
}

fn list(store: &JsonFileStore) -> Result<()> {
    let records = store.list()?;
    if records.is_empty() {
        println!("store is empty");
        return Ok(());
    }
    for r in records {
        let latency = if r.latency_ms < 0 {
            "-".to_string()
        } else {
            format!("{}ms", r.latency_ms)
        };
        println!(
            "{}  {:12} {:>5}  [{}] {}:{}  {}",
            r.id,
            r.protocol.to_string(),
            latency,
            r.country_code,
            r.address,
            r.port,
            r.display_name(),
        );
    }
    Ok(())
}

fn export(store: &JsonFileStore, id: &str) -> Result<()> {
    let record = fetch_record(store, id)?;
    let uri = tk_links::serialize_record(&record);
    if uri.is_empty() {
        bail!("{} records have no share-link form", record.protocol);
    }
    println!("{uri}");
    Ok(())
}

fn remove(store: &JsonFileStore, id: &str) -> Result<()> {
    if store.delete(id)? {
        println!("removed {id}");
        Ok(())
    } else {
        bail!("no server with id {id}")
    }
}

fn generate(store: &JsonFileStore, id: &str, compact: bool) -> Result<()> {
    let record = fetch_record(store, id)?;
    let problems = tk_config::validate(&record);
    if !problems.is_empty() {
        bail!("record is not connectable: {}", problems.join("; "));
    }
    let config = tk_config::generate(&record, &Default::default());
    if compact {
        println!("{}", config.to_json());
    } else {
        println!("{}", config.to_json_pretty());
    }
    Ok(())
}

async fn probe(store: &JsonFileStore, id: Option<String>) -> Result<()> {
    let records = match id {
        Some(id) => vec![fetch_record(store, &id)?],
        None => store.list()?,
    };
    if records.is_empty() {
        println!("nothing to probe");
        return Ok(());
    }

    let results = tk_conn::measure_batch(&records, |done, total| {
        eprint!("\rprobing {done}/{total}");
    })
    .await;
    eprintln!();

    for (id, result) in results {
        // Re-fetch before write: the store copy may have moved on.
        if let Some(mut record) = store.get(&id)? {
            record.latency_ms = result.latency_ms;
            let name = record.display_name();
            store.put(record)?;
            println!("{name}: {:?} ({}ms)", result.status, result.latency_ms);
        }
    }
    Ok(())
}

async fn connect(store: &JsonFileStore, id: &str, engine_bin: PathBuf) -> Result<()> {
    let mut record = fetch_record(store, id)?;
    record.touch_last_used();
    store.put(record.clone())?;

    let handle = ConnectionManager::spawn(
        Arc::new(ProcessEngine::new(engine_bin)),
        Arc::new(UnavailableSsh),
        Arc::new(UnavailableUdp),
        ManagerConfig::default(),
    );
    match handle.connect(record).await {
        Ok(()) => println!("connected; Ctrl-C to disconnect"),
        Err(e @ ConnectError::Validation(_)) => return Err(e.into()),
        // Dial failures keep retrying inside the manager; follow the watch.
        Err(e) => warn!(error = %e, "first attempt failed, retrying"),
    }

    let mut watch = handle.watch();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                handle.disconnect().await;
                println!("disconnected");
                break;
            }
            changed = watch.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = watch.borrow().clone();
                println!("state: {state}");
                if let ConnectionState::Error(msg) = state {
                    bail!("connection failed: {msg}");
                }
            }
        }
    }
    Ok(())
}
