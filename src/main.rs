use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use std::time::Duration;
use tokio::signal;

use backup_shipper::cli::Args;
use backup_shipper::constants::{INVENTORY_TOKEN_ENV, RETRY_DELAY_SECS};
use backup_shipper::models::{Credentials, DiscoverySource};
use backup_shipper::queue::upload_queue;
use backup_shipper::reconcile::ReconcilePoller;
use backup_shipper::remote::drive::DriveClient;
use backup_shipper::remote::http::HttpDriveClient;
use backup_shipper::server::{self, AppState};
use backup_shipper::status::AuthStatus;
use backup_shipper::store::BackupStore;
use backup_shipper::watch;
use backup_shipper::worker::{RetryPolicy, UploadWorker};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    initialize_logging(args.verbose)?;

    info!("Backup shipper starting");
    info!("Remote folder: {}", args.folder);
    info!("Delete after upload: {}", args.delete_after_upload);
    info!("Backup directory: {}", args.backup_dir.display());

    let status = Arc::new(AuthStatus::new());

    // Control surface first so health checks come up before the slower
    // pipeline wiring
    let server_state = AppState {
        status: Arc::clone(&status),
    };
    let mut server_task = tokio::spawn(server::serve(
        server_state,
        args.port,
        shutdown_signal(),
    ));

    let store = BackupStore::new(&args.backup_dir, &args.extension);
    let (queue, queue_rx) = upload_queue();

    let credentials = Credentials {
        account: args.account.clone(),
        secret: args.secret.clone(),
    };
    let client: Arc<dyn DriveClient> =
        Arc::new(HttpDriveClient::new(&args.drive_url).context("Failed to create drive client")?);

    let worker = UploadWorker::new(
        client,
        store.clone(),
        credentials,
        args.folder.clone(),
        args.delete_after_upload,
        Arc::clone(&status),
        RetryPolicy::default(),
        queue.clone(),
        queue_rx,
    );
    let mut worker_task = tokio::spawn(worker.run());

    // Keep the watcher handle alive; dropping it stops event delivery
    let _watcher = watch::spawn_watcher(&store, queue.clone())
        .context("Failed to start filesystem monitoring")?;

    match env::var(INVENTORY_TOKEN_ENV) {
        Ok(token) if !token.is_empty() => {
            let poller = ReconcilePoller::new(
                &args.inventory_url,
                token,
                store.clone(),
                queue.clone(),
                Duration::from_secs(args.poll_interval),
                Duration::from_secs(RETRY_DELAY_SECS),
            )
            .context("Failed to create reconciliation poller")?;
            tokio::spawn(poller.run());
        }
        _ => info!(
            "{} not set; inventory reconciliation disabled",
            INVENTORY_TOKEN_ENV
        ),
    }

    // Startup scan: everything already on disk goes through the queue once
    let existing = store.list_backups();
    if !existing.is_empty() {
        info!("Found {} existing backup(s)", existing.len());
        for filename in existing {
            queue.enqueue(filename, DiscoverySource::StartupScan);
        }
    }

    info!("All systems operational - monitoring for backups...");

    tokio::select! {
        result = &mut worker_task => {
            match result {
                Ok(Ok(())) => {
                    error!("Upload worker stopped unexpectedly");
                }
                Ok(Err(e)) => {
                    error!("Fatal: {:#}", e);
                    return Err(e);
                }
                Err(e) => {
                    error!("Upload worker panicked: {}", e);
                }
            }
        }
        result = &mut server_task => {
            // The server only returns once the shutdown signal fires (or
            // on a bind failure at startup)
            match result {
                Ok(Ok(())) => info!("Shutdown requested"),
                Ok(Err(e)) => {
                    error!("Control surface error: {:#}", e);
                    return Err(e);
                }
                Err(e) => error!("Control surface panicked: {}", e),
            }
        }
    }

    info!("Backup shipper stopped");
    Ok(())
}

/// Initialize logging with the specified verbosity level
fn initialize_logging(verbose: bool) -> Result<()> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    TermLogger::init(
        log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .context("Failed to initialize logger")?;
    Ok(())
}

/// Resolve on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
