//! TaskHub daemon — background worker and task scheduler process.
//!
//! Thin entry point that wires configuration, logging, the queue backend,
//! the worker, and the scheduler together, and maps process signals onto
//! the cooperative stop hooks.

use std::sync::Arc;

use tokio::sync::watch;
use tracing;
use tracing_subscriber::{EnvFilter, fmt};

use taskhub_core::config::AppConfig;
use taskhub_core::error::AppError;
use taskhub_queue::backend::memory::MemoryQueueBackend;
use taskhub_queue::manager::QueueManager;
use taskhub_worker::executor::JobExecutor;
use taskhub_worker::jobs::EchoJobHandler;
use taskhub_worker::runner::Worker;
use taskhub_worker::scheduler::TaskScheduler;

#[tokio::main]
async fn main() {
    let env = std::env::var("TASKHUB_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Daemon error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main daemon run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting TaskHub v{}", env!("CARGO_PKG_VERSION"));

    if config.queue.backend != "memory" {
        return Err(AppError::configuration(format!(
            "Unknown queue backend '{}' (the daemon ships 'memory'; durable \
             backends are provided by the embedding application)",
            config.queue.backend
        )));
    }

    let backend = Arc::new(MemoryQueueBackend::new());
    let manager = Arc::new(QueueManager::new(backend));

    let mut executor = JobExecutor::new();
    executor.register(Arc::new(EchoJobHandler::new()));
    let executor = Arc::new(executor);

    let worker_id = format!("taskhub-{}", std::process::id());
    let worker = Arc::new(Worker::new(
        Arc::clone(&manager),
        Arc::clone(&executor),
        config.worker.clone(),
        worker_id,
    ));

    let (scheduler_stop, scheduler_cancel) = watch::channel(false);
    let sweep_interval = std::time::Duration::from_secs(config.scheduler.sweep_interval_seconds);

    let worker_handle = if config.worker.enabled {
        let worker = Arc::clone(&worker);
        Some(tokio::spawn(async move { worker.run().await }))
    } else {
        tracing::info!("Worker disabled by configuration");
        None
    };

    let scheduler_handle = if config.scheduler.enabled {
        // Recurring tasks are registered here by the embedding application.
        let mut scheduler = TaskScheduler::new();
        Some(tokio::spawn(async move {
            scheduler.run(scheduler_cancel, sweep_interval).await;
        }))
    } else {
        tracing::info!("Scheduler disabled by configuration");
        None
    };

    tracing::info!("TaskHub daemon running; press Ctrl-C to stop");
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| AppError::internal(format!("Failed to listen for shutdown signal: {e}")))?;

    tracing::info!("Shutdown signal received, stopping...");
    worker.stop();
    let _ = scheduler_stop.send(true);

    if let Some(handle) = worker_handle {
        let _ = handle.await;
    }
    if let Some(handle) = scheduler_handle {
        let _ = handle.await;
    }

    tracing::info!("TaskHub daemon stopped cleanly");
    Ok(())
}
