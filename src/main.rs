// src/main.rs

use clap::Parser;
use futures::future::join_all;
use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use pinscan::{
    deliver_all, ingest_file, plan_export, progress_line, retry_item, start_discovery, AppConfig,
    AppError, CollectionManager, CollectionStore, Command, CommandLineInput, DeliveryTarget,
    DiscoverySession, Extractor, GeminiExtractor, Group, GroupName, GroupStatus, JsonFileStore,
    MemoryStore, Orchestrator, ParentLabel, PostalCode, StoreLocation,
};
use std::fs;
use std::sync::Arc;

/// Sets up logging configuration.
fn setup_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let log_file_path = std::env::temp_dir().join("pinscan.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    // Logs go to stderr so `export` output on stdout stays clean JSON.
    let console_appender = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] {t} - {m}{n}",
        )))
        .build(&log_file_path)?;

    let config = Config::builder()
        .appender(Appender::builder().build("console", Box::new(console_appender)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("console")
                .appender("file")
                .build(log_level),
        )?;

    log4rs::init_config(config)?;
    log::info!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

/// Runs one validated command against the collection.
async fn execute(config: AppConfig) -> Result<(), AppError> {
    let store: Arc<dyn CollectionStore> = match &config.store {
        StoreLocation::File(path) => {
            log::info!("Using collection snapshot {}", path.display());
            Arc::new(JsonFileStore::new(path.clone()))
        }
        StoreLocation::Memory => Arc::new(MemoryStore::new()),
    };
    let manager = CollectionManager::open(store).await;

    match config.command.clone() {
        Command::Import { file } => {
            let groups = ingest_file(&file).await?;
            let report = manager.import(groups).await;
            println!("✓ Imported {}: {}", file.display(), report);
        }
        Command::List => list(&manager).await,
        Command::Run { label, group } => {
            let orchestrator = orchestrator(&config)?;
            run(&manager, &orchestrator, &label, group.as_ref()).await?;
        }
        Command::Retry { label, group, code } => {
            let orchestrator = orchestrator(&config)?;
            retry(&manager, &orchestrator, &label, &group, &code).await?;
        }
        Command::Export {
            label,
            group,
            output,
        } => {
            let group = manager.group(&label, &group).await?;
            let report = deliver_all(plan_export(&group, output)?)?;
            for completed in &report.completed {
                if let DeliveryTarget::WriteFile { path, .. } = &completed.operation {
                    println!(
                        "✓ Exported {} records to {}",
                        group.result_count(),
                        path.display()
                    );
                }
            }
        }
        Command::Reset => {
            manager.reset().await;
            println!("✓ Collection cleared");
        }
    }

    Ok(())
}

fn orchestrator(config: &AppConfig) -> Result<Orchestrator, AppError> {
    let extraction = config.extraction.as_ref().ok_or_else(|| {
        AppError::MissingConfiguration("extraction service is not configured".to_string())
    })?;
    let extractor: Arc<dyn Extractor> = Arc::new(GeminiExtractor::new(
        &extraction.api_key,
        &extraction.base_url,
        &extraction.model,
    )?);
    Ok(Orchestrator::new(extractor).with_policy(config.policy))
}

async fn list(manager: &CollectionManager) {
    let groups = manager.groups().await;
    if groups.is_empty() {
        println!("No groups yet. Import a location file first.");
        return;
    }
    for group in &groups {
        println!("{}", progress_line(group));
        if let Some(error) = group.last_error() {
            println!("    last error: {}", error);
        }
    }
}

async fn run(
    manager: &CollectionManager,
    orchestrator: &Orchestrator,
    label: &ParentLabel,
    group: Option<&GroupName>,
) -> Result<(), AppError> {
    let targets: Vec<GroupName> = match group {
        Some(name) => vec![name.clone()],
        None => manager
            .groups_under(label)
            .await?
            .iter()
            .map(|g| g.name().clone())
            .collect(),
    };

    let mut sessions = Vec::with_capacity(targets.len());
    for name in &targets {
        let running = manager.update_group(label, name, start_discovery).await?;
        sessions.push(orchestrator.spawn(running));
    }

    follow(manager, sessions).await
}

async fn retry(
    manager: &CollectionManager,
    orchestrator: &Orchestrator,
    label: &ParentLabel,
    name: &GroupName,
    code: &PostalCode,
) -> Result<(), AppError> {
    let group = manager
        .update_group(label, name, |group| retry_item(group, code))
        .await?;
    if group.status() != GroupStatus::Running {
        println!("{} is not a failed item of {} / {}", code, label, name);
        return Ok(());
    }
    follow(manager, vec![orchestrator.spawn(group)]).await
}

/// Commits session updates until every session finishes. Ctrl-C stops all
/// of them; their progress is saved before exit.
async fn follow(manager: &CollectionManager, sessions: Vec<DiscoverySession>) -> Result<(), AppError> {
    let stoppers: Vec<_> = sessions.iter().map(|s| s.stopper()).collect();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Stopping discovery...");
            for stopper in &stoppers {
                stopper.stop();
            }
        }
    });

    let results = join_all(sessions.into_iter().map(|session| {
        let mut last_line = String::new();
        manager.track(session, move |group: &Group| {
            let line = progress_line(group);
            if line != last_line {
                eprintln!("{}", line);
                last_line = line;
            }
        })
    }))
    .await;
    interrupt.abort();

    for result in results {
        let group = result?;
        println!("{}", progress_line(&group));
        if let Some(error) = group.last_error() {
            println!("    last error: {}", error);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CommandLineInput::parse();

    setup_logging(cli.verbose)?;

    let config = AppConfig::resolve(cli)?;

    execute(config).await?;

    Ok(())
}
