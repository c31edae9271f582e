mod config;

use std::fmt;

use batchline_core::impls::ListItemSource;
use batchline_core::{
    CountingItemReader, DelegatingItemReader, ExecutionContext, ItemReader, ItemStream,
    ItemStreamReader, ReaderError, shared,
};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::{CliConfig, ConfigError};

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Reader(#[from] ReaderError),

    #[error("checkpoint file: {0}")]
    Io(#[from] std::io::Error),

    #[error("checkpoint encoding: {0}")]
    Json(#[from] serde_json::Error),
}

type DemoReader = DelegatingItemReader<CountingItemReader<ListItemSource<String>>>;

/// How the chunk loop ended when nothing failed.
enum Outcome {
    Complete(usize),
    Interrupted(usize),
}

/// Stands in for the configuration layer: builds and validates the reader.
fn assemble(config: &CliConfig) -> Result<DemoReader, ReaderError> {
    let items = (1..=config.items).map(|n| format!("item-{n:03}")).collect();
    let inner = CountingItemReader::new(ListItemSource::new(items)).with_name("demo");
    DelegatingItemReader::builder().delegate(shared(inner)).build()
}

async fn load_checkpoint(config: &CliConfig) -> Result<ExecutionContext, CliError> {
    match tokio::fs::read_to_string(&config.checkpoint_path).await {
        Ok(json) => {
            let ctx = ExecutionContext::from_json(&json)?;
            tracing::info!(path = %config.checkpoint_path.display(), keys = ctx.len(), "restarting from checkpoint");
            for (key, value) in ctx.iter() {
                tracing::debug!(key, %value, "checkpoint entry");
            }
            Ok(ctx)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("no checkpoint found, starting fresh");
            Ok(ExecutionContext::new())
        }
        Err(e) => Err(e.into()),
    }
}

async fn persist(config: &CliConfig, ctx: &mut ExecutionContext) -> Result<(), CliError> {
    if !ctx.is_dirty() {
        return Ok(());
    }
    tokio::fs::write(&config.checkpoint_path, ctx.to_json()?).await?;
    ctx.clear_dirty();
    tracing::debug!(path = %config.checkpoint_path.display(), "checkpoint persisted");
    Ok(())
}

async fn remove_checkpoint(config: &CliConfig) {
    match tokio::fs::remove_file(&config.checkpoint_path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %config.checkpoint_path.display(), error = %e, "could not remove checkpoint");
        }
    }
}

/// Open the reader, then read a chunk and checkpoint until exhausted or interrupted.
async fn read_chunks<R>(
    config: &CliConfig,
    reader: &mut DelegatingItemReader<R>,
    ctx: &mut ExecutionContext,
) -> Result<Outcome, CliError>
where
    R: ItemStreamReader,
    R::Item: fmt::Debug,
{
    reader.open(ctx).await?;

    let mut processed = 0usize;
    loop {
        let mut chunk = Vec::with_capacity(config.commit_interval);
        while chunk.len() < config.commit_interval {
            match reader.read().await? {
                Some(item) => chunk.push(item),
                None => break,
            }
        }
        let exhausted = chunk.len() < config.commit_interval;
        processed += chunk.len();
        if !chunk.is_empty() {
            tracing::info!(items = ?chunk, "processed chunk");
        }

        reader.update(ctx).await?;
        persist(config, ctx).await?;

        if config.fail_after.is_some_and(|n| processed >= n) && !exhausted {
            return Ok(Outcome::Interrupted(processed));
        }
        if exhausted {
            return Ok(Outcome::Complete(processed));
        }
    }
}

/// Orchestration: drive the reader and close it at the end or on failure.
async fn process<R>(
    config: &CliConfig,
    reader: &mut DelegatingItemReader<R>,
) -> Result<(), CliError>
where
    R: ItemStreamReader,
    R::Item: fmt::Debug,
{
    let mut ctx = load_checkpoint(config).await?;
    match read_chunks(config, reader, &mut ctx).await {
        Ok(Outcome::Complete(processed)) => {
            reader.close(&mut ctx).await?;
            remove_checkpoint(config).await;
            tracing::info!(processed, "stream complete, checkpoint removed");
            Ok(())
        }
        Ok(Outcome::Interrupted(processed)) => {
            // a killed process never gets to close
            tracing::warn!(processed, "simulated crash; run again to resume");
            Ok(())
        }
        Err(err) => {
            if let Err(close_err) = reader.close(&mut ctx).await {
                tracing::warn!(error = %close_err, "close after failure also failed");
            }
            Err(err)
        }
    }
}

async fn run(config: &CliConfig) -> Result<(), CliError> {
    let mut reader = assemble(config)?;
    process(config, &mut reader).await
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = CliConfig::from_env()?;
    tracing::info!(?config, "starting batchline demo");
    run(&config).await
}
